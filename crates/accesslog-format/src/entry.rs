//! Envoy 구조화 access log 엔트리
//!
//! Envoy `envoy.data.accesslog.v3` 메시지를 그대로 옮긴 읽기 전용 모델입니다.
//! 렌더러는 이 값을 읽기만 하며 절대 수정하지 않습니다.
//! 선택적 메시지 필드는 `Option`, 스칼라 필드는 기본값(0, 빈 문자열)으로 표현합니다.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ─── 공통 속성 ───────────────────────────────────────────────────────

/// HTTP/TCP 엔트리가 공유하는 속성
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessLogCommon {
    /// 다운스트림 연결/요청 시작 시각
    pub start_time: Option<DateTime<Utc>>,
    /// 시작부터 다운스트림 요청 마지막 바이트 수신까지
    pub time_to_last_rx_byte: Option<Duration>,
    /// 시작부터 업스트림 응답 첫 바이트 수신까지
    pub time_to_first_upstream_rx_byte: Option<Duration>,
    /// 시작부터 다운스트림 응답 마지막 바이트 송신까지
    pub time_to_last_downstream_tx_byte: Option<Duration>,
    pub response_flags: Option<ResponseFlags>,
    pub downstream_local_address: Option<Address>,
    pub downstream_remote_address: Option<Address>,
    pub downstream_direct_remote_address: Option<Address>,
    pub upstream_remote_address: Option<Address>,
    pub upstream_local_address: Option<Address>,
    pub upstream_cluster: String,
    pub upstream_transport_failure_reason: String,
    pub route_name: String,
    pub tls_properties: Option<TlsProperties>,
}

/// 소켓 또는 Unix 파이프 주소
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Address {
    Socket { address: String, port: u32 },
    Pipe { path: String },
}

impl Address {
    /// 소켓 주소를 생성합니다.
    pub fn socket(address: impl Into<String>, port: u32) -> Self {
        Self::Socket {
            address: address.into(),
            port,
        }
    }

    /// 파이프 주소를 생성합니다.
    pub fn pipe(path: impl Into<String>) -> Self {
        Self::Pipe { path: path.into() }
    }
}

/// 응답 플래그
///
/// 각 플래그는 Envoy 짧은 코드(`UF`, `URX` 등)에 대응합니다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseFlags {
    pub failed_local_healthcheck: bool,
    pub no_healthy_upstream: bool,
    pub upstream_request_timeout: bool,
    pub local_reset: bool,
    pub upstream_remote_reset: bool,
    pub upstream_connection_failure: bool,
    pub upstream_connection_termination: bool,
    pub upstream_overflow: bool,
    pub no_route_found: bool,
    pub delay_injected: bool,
    pub fault_injected: bool,
    pub rate_limited: bool,
    pub unauthorized_details: Option<UnauthorizedReason>,
    pub rate_limit_service_error: bool,
    pub downstream_connection_termination: bool,
    pub upstream_retry_limit_exceeded: bool,
    pub stream_idle_timeout: bool,
    pub invalid_envoy_request_headers: bool,
    pub downstream_protocol_error: bool,
}

/// 인가 실패 사유
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnauthorizedReason {
    #[default]
    ReasonUnspecified,
    /// 외부 인가 서비스가 요청을 거부함
    ExternalService,
}

// ─── TLS ─────────────────────────────────────────────────────────────

/// 다운스트림 TLS 연결 속성
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TlsProperties {
    pub tls_version: TlsVersion,
    /// IANA cipher suite 코드. `0xFFFF`는 "알 수 없음"
    pub tls_cipher_suite: Option<u32>,
    pub tls_sni_hostname: String,
    pub local_certificate_properties: Option<CertificateProperties>,
    pub peer_certificate_properties: Option<CertificateProperties>,
    pub tls_session_id: String,
}

/// TLS 프로토콜 버전
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TlsVersion {
    #[default]
    VersionUnspecified,
    TlsV1,
    TlsV1_1,
    TlsV1_2,
    TlsV1_3,
    /// 모델이 모르는 enum 값
    Unrecognized(i32),
}

/// 인증서 속성
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CertificateProperties {
    pub subject_alt_name: Vec<SubjectAltName>,
    pub subject: String,
}

/// Subject Alternative Name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectAltName {
    Uri(String),
    Dns(String),
}

// ─── HTTP ────────────────────────────────────────────────────────────

/// HTTP access log 엔트리
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpAccessLogEntry {
    pub common_properties: Option<AccessLogCommon>,
    pub protocol_version: HttpVersion,
    pub request: Option<HttpRequestProperties>,
    pub response: Option<HttpResponseProperties>,
}

/// HTTP 프로토콜 버전
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum HttpVersion {
    #[default]
    ProtocolUnspecified,
    Http10,
    Http11,
    Http2,
    Http3,
    /// 모델이 모르는 enum 값
    Unrecognized(i32),
}

/// HTTP 요청 메서드
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestMethod {
    #[default]
    MethodUnspecified,
    Get,
    Head,
    Post,
    Put,
    Delete,
    Connect,
    Options,
    Trace,
    Patch,
}

impl RequestMethod {
    /// 메서드 이름을 반환합니다. 지정되지 않은 경우 빈 문자열입니다.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MethodUnspecified => "",
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Connect => "CONNECT",
            Self::Options => "OPTIONS",
            Self::Trace => "TRACE",
            Self::Patch => "PATCH",
        }
    }
}

/// HTTP 요청 속성
///
/// 기본 캡처 대상 헤더는 전용 필드에, 나머지는 `request_headers`에 들어갑니다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpRequestProperties {
    pub request_method: RequestMethod,
    pub scheme: String,
    pub authority: String,
    pub port: Option<u32>,
    pub path: String,
    pub user_agent: String,
    pub referer: String,
    pub forwarded_for: String,
    pub request_id: String,
    pub original_path: String,
    pub request_headers_bytes: u64,
    pub request_body_bytes: u64,
    /// 소문자 헤더 이름 -> 값
    pub request_headers: HashMap<String, String>,
}

/// HTTP 응답 속성
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpResponseProperties {
    pub response_code: Option<u32>,
    pub response_headers_bytes: u64,
    pub response_body_bytes: u64,
    pub response_headers: HashMap<String, String>,
    pub response_trailers: HashMap<String, String>,
    pub response_code_details: String,
}

// ─── TCP ─────────────────────────────────────────────────────────────

/// TCP access log 엔트리
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TcpAccessLogEntry {
    pub common_properties: Option<AccessLogCommon>,
    pub connection_properties: Option<ConnectionProperties>,
}

/// TCP 연결 속성
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionProperties {
    pub received_bytes: u64,
    pub sent_bytes: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_method_names() {
        assert_eq!(RequestMethod::Post.as_str(), "POST");
        assert_eq!(RequestMethod::MethodUnspecified.as_str(), "");
    }

    #[test]
    fn http_entry_deserializes_from_partial_json() {
        let entry: HttpAccessLogEntry = serde_json::from_str(
            r#"{"protocol_version":"Http11","request":{"request_method":"Get","path":"/api"}}"#,
        )
        .expect("valid entry");

        assert_eq!(entry.protocol_version, HttpVersion::Http11);
        let request = entry.request.expect("request");
        assert_eq!(request.request_method, RequestMethod::Get);
        assert_eq!(request.path, "/api");
        assert!(request.request_headers.is_empty());
        assert!(entry.common_properties.is_none());
    }

    #[test]
    fn tcp_entry_defaults_are_empty() {
        let entry = TcpAccessLogEntry::default();
        assert!(entry.common_properties.is_none());
        assert!(entry.connection_properties.is_none());
    }

    #[test]
    fn address_serializes_with_kind_tag() {
        let json = serde_json::to_string(&Address::socket("10.0.0.1", 80)).expect("serialize");
        assert_eq!(json, r#"{"socket":{"address":"10.0.0.1","port":80}}"#);
    }
}
