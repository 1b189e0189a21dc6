//! 필드 operator
//!
//! 인자 없이 이름만으로 엔트리의 값 하나를 읽는 command operator입니다.
//! 데이터 출처가 없는 이름은 [`Fragment::Unsupported`](super::Fragment::Unsupported)로
//! 파싱되며 여기에 속하지 않습니다.

use std::fmt;
use std::time::Duration;

use crate::entry::{
    AccessLogCommon, Address, CertificateProperties, HttpAccessLogEntry, HttpVersion, ResponseFlags, SubjectAltName,
    TcpAccessLogEntry, TlsProperties, UnauthorizedReason,
};
use crate::tls::{UNKNOWN_CIPHER_SUITE, cipher_suite_name, tls_version_name};

/// 값을 렌더링할 수 있는 필드 이름
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    BytesReceived,
    BytesSent,
    Protocol,
    ResponseCode,
    ResponseCodeDetails,
    RequestDuration,
    ResponseDuration,
    ResponseTxDuration,
    Duration,
    ResponseFlags,
    UpstreamTransportFailureReason,
    UpstreamHost,
    UpstreamCluster,
    UpstreamLocalAddress,
    DownstreamLocalAddress,
    DownstreamLocalAddressWithoutPort,
    DownstreamRemoteAddress,
    DownstreamRemoteAddressWithoutPort,
    DownstreamDirectRemoteAddress,
    DownstreamDirectRemoteAddressWithoutPort,
    RequestedServerName,
    RouteName,
    DownstreamPeerUriSan,
    DownstreamLocalUriSan,
    DownstreamPeerSubject,
    DownstreamLocalSubject,
    DownstreamTlsSessionId,
    DownstreamTlsCipher,
    DownstreamTlsVersion,
    GrpcStatus,
}

/// (command 이름, 필드)
const FIELDS: &[(&str, Field)] = &[
    ("BYTES_RECEIVED", Field::BytesReceived),
    ("BYTES_SENT", Field::BytesSent),
    ("PROTOCOL", Field::Protocol),
    ("RESPONSE_CODE", Field::ResponseCode),
    ("RESPONSE_CODE_DETAILS", Field::ResponseCodeDetails),
    ("REQUEST_DURATION", Field::RequestDuration),
    ("RESPONSE_DURATION", Field::ResponseDuration),
    ("RESPONSE_TX_DURATION", Field::ResponseTxDuration),
    ("DURATION", Field::Duration),
    ("RESPONSE_FLAGS", Field::ResponseFlags),
    (
        "UPSTREAM_TRANSPORT_FAILURE_REASON",
        Field::UpstreamTransportFailureReason,
    ),
    ("UPSTREAM_HOST", Field::UpstreamHost),
    ("UPSTREAM_CLUSTER", Field::UpstreamCluster),
    ("UPSTREAM_LOCAL_ADDRESS", Field::UpstreamLocalAddress),
    ("DOWNSTREAM_LOCAL_ADDRESS", Field::DownstreamLocalAddress),
    (
        "DOWNSTREAM_LOCAL_ADDRESS_WITHOUT_PORT",
        Field::DownstreamLocalAddressWithoutPort,
    ),
    ("DOWNSTREAM_REMOTE_ADDRESS", Field::DownstreamRemoteAddress),
    (
        "DOWNSTREAM_REMOTE_ADDRESS_WITHOUT_PORT",
        Field::DownstreamRemoteAddressWithoutPort,
    ),
    (
        "DOWNSTREAM_DIRECT_REMOTE_ADDRESS",
        Field::DownstreamDirectRemoteAddress,
    ),
    (
        "DOWNSTREAM_DIRECT_REMOTE_ADDRESS_WITHOUT_PORT",
        Field::DownstreamDirectRemoteAddressWithoutPort,
    ),
    ("REQUESTED_SERVER_NAME", Field::RequestedServerName),
    ("ROUTE_NAME", Field::RouteName),
    ("DOWNSTREAM_PEER_URI_SAN", Field::DownstreamPeerUriSan),
    ("DOWNSTREAM_LOCAL_URI_SAN", Field::DownstreamLocalUriSan),
    ("DOWNSTREAM_PEER_SUBJECT", Field::DownstreamPeerSubject),
    ("DOWNSTREAM_LOCAL_SUBJECT", Field::DownstreamLocalSubject),
    ("DOWNSTREAM_TLS_SESSION_ID", Field::DownstreamTlsSessionId),
    ("DOWNSTREAM_TLS_CIPHER", Field::DownstreamTlsCipher),
    ("DOWNSTREAM_TLS_VERSION", Field::DownstreamTlsVersion),
    ("GRPC_STATUS", Field::GrpcStatus),
];

/// gRPC 상태 코드 이름 (인덱스 = 코드)
const GRPC_STATUS_NAMES: &[&str] = &[
    "OK",
    "CANCELLED",
    "UNKNOWN",
    "INVALID_ARGUMENT",
    "DEADLINE_EXCEEDED",
    "NOT_FOUND",
    "ALREADY_EXISTS",
    "PERMISSION_DENIED",
    "RESOURCE_EXHAUSTED",
    "FAILED_PRECONDITION",
    "ABORTED",
    "OUT_OF_RANGE",
    "UNIMPLEMENTED",
    "INTERNAL",
    "UNAVAILABLE",
    "DATA_LOSS",
    "UNAUTHENTICATED",
];

impl Field {
    /// command 이름으로 필드를 찾습니다.
    pub fn from_name(name: &str) -> Option<Self> {
        FIELDS.iter().find(|(n, _)| *n == name).map(|(_, f)| *f)
    }

    /// command 이름 (`BYTES_RECEIVED` 등)
    pub fn name(self) -> &'static str {
        FIELDS
            .iter()
            .find(|(_, f)| *f == self)
            .map(|(n, _)| *n)
            .unwrap_or_default()
    }

    /// HTTP 엔트리에서 값을 렌더링합니다.
    pub fn format_http_log_entry(self, entry: &HttpAccessLogEntry) -> String {
        let request = entry.request.as_ref();
        let response = entry.response.as_ref();
        let common = entry.common_properties.as_ref();

        match self {
            Self::BytesReceived => request.map_or(0, |r| r.request_body_bytes).to_string(),
            Self::BytesSent => response.map_or(0, |r| r.response_body_bytes).to_string(),
            Self::Protocol => http_version_name(entry.protocol_version),
            Self::ResponseCode => response
                .and_then(|r| r.response_code)
                .unwrap_or(0)
                .to_string(),
            Self::ResponseCodeDetails => response
                .map(|r| r.response_code_details.clone())
                .unwrap_or_default(),
            Self::RequestDuration => format_duration(common.and_then(|c| c.time_to_last_rx_byte)),
            Self::ResponseDuration => {
                format_duration(common.and_then(|c| c.time_to_first_upstream_rx_byte))
            }
            Self::ResponseTxDuration => format_duration_delta(
                common.and_then(|c| c.time_to_last_downstream_tx_byte),
                common.and_then(|c| c.time_to_first_upstream_rx_byte),
            ),
            Self::GrpcStatus => format_grpc_status(
                response.and_then(|r| r.response_trailers.get("grpc-status")),
            ),
            _ => self.format_common(common),
        }
    }

    /// TCP 엔트리에서 값을 렌더링합니다.
    ///
    /// HTTP 전용 필드는 Envoy와 같은 고정값(`RESPONSE_CODE`는 `0`, 나머지는 빈 문자열)입니다.
    pub fn format_tcp_log_entry(self, entry: &TcpAccessLogEntry) -> String {
        let connection = entry.connection_properties.as_ref();

        match self {
            Self::BytesReceived => connection.map_or(0, |c| c.received_bytes).to_string(),
            Self::BytesSent => connection.map_or(0, |c| c.sent_bytes).to_string(),
            Self::ResponseCode => "0".to_owned(),
            Self::Protocol
            | Self::ResponseCodeDetails
            | Self::RequestDuration
            | Self::ResponseDuration
            | Self::ResponseTxDuration
            | Self::GrpcStatus => String::new(),
            _ => self.format_common(entry.common_properties.as_ref()),
        }
    }

    fn format_common(self, common: Option<&AccessLogCommon>) -> String {
        let Some(common) = common else {
            return String::new();
        };
        let tls = common.tls_properties.as_ref();

        match self {
            Self::UpstreamTransportFailureReason => {
                common.upstream_transport_failure_reason.clone()
            }
            Self::Duration => format_duration(common.time_to_last_downstream_tx_byte),
            Self::ResponseFlags => format_response_flags(common.response_flags.as_ref()),
            Self::UpstreamHost => format_address(common.upstream_remote_address.as_ref(), true),
            Self::UpstreamCluster => common.upstream_cluster.clone(),
            Self::UpstreamLocalAddress => {
                format_address(common.upstream_local_address.as_ref(), true)
            }
            Self::DownstreamLocalAddress => {
                format_address(common.downstream_local_address.as_ref(), true)
            }
            Self::DownstreamLocalAddressWithoutPort => {
                format_address(common.downstream_local_address.as_ref(), false)
            }
            Self::DownstreamRemoteAddress => {
                format_address(common.downstream_remote_address.as_ref(), true)
            }
            Self::DownstreamRemoteAddressWithoutPort => {
                format_address(common.downstream_remote_address.as_ref(), false)
            }
            Self::DownstreamDirectRemoteAddress => {
                format_address(common.downstream_direct_remote_address.as_ref(), true)
            }
            Self::DownstreamDirectRemoteAddressWithoutPort => {
                format_address(common.downstream_direct_remote_address.as_ref(), false)
            }
            Self::RequestedServerName => tls.map(|t| t.tls_sni_hostname.clone()).unwrap_or_default(),
            Self::RouteName => common.route_name.clone(),
            Self::DownstreamPeerUriSan => {
                format_uri_sans(tls.and_then(|t| t.peer_certificate_properties.as_ref()))
            }
            Self::DownstreamLocalUriSan => {
                format_uri_sans(tls.and_then(|t| t.local_certificate_properties.as_ref()))
            }
            Self::DownstreamPeerSubject => tls
                .and_then(|t| t.peer_certificate_properties.as_ref())
                .map(|c| c.subject.clone())
                .unwrap_or_default(),
            Self::DownstreamLocalSubject => tls
                .and_then(|t| t.local_certificate_properties.as_ref())
                .map(|c| c.subject.clone())
                .unwrap_or_default(),
            Self::DownstreamTlsSessionId => tls.map(|t| t.tls_session_id.clone()).unwrap_or_default(),
            Self::DownstreamTlsCipher => format_cipher_suite(tls),
            Self::DownstreamTlsVersion => tls
                .map(|t| tls_version_name(t.tls_version))
                .unwrap_or_default(),
            // 엔트리 종류별 필드는 호출자가 이미 처리함
            Self::BytesReceived
            | Self::BytesSent
            | Self::Protocol
            | Self::ResponseCode
            | Self::ResponseCodeDetails
            | Self::RequestDuration
            | Self::ResponseDuration
            | Self::ResponseTxDuration
            | Self::GrpcStatus => String::new(),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}%", self.name())
    }
}

// ─── 값 변환 ─────────────────────────────────────────────────────────

/// 밀리초 단위로 버림합니다.
fn format_duration(duration: Option<Duration>) -> String {
    duration
        .map(|d| d.as_millis().to_string())
        .unwrap_or_default()
}

/// `outer - inner`를 밀리초로 버림합니다. 결과는 음수일 수 있습니다.
fn format_duration_delta(outer: Option<Duration>, inner: Option<Duration>) -> String {
    match (outer, inner) {
        (Some(outer), Some(inner)) => {
            let nanos = outer.as_nanos() as i128 - inner.as_nanos() as i128;
            (nanos / 1_000_000).to_string()
        }
        _ => String::new(),
    }
}

fn http_version_name(version: HttpVersion) -> String {
    match version {
        HttpVersion::ProtocolUnspecified => String::new(),
        HttpVersion::Http10 => "HTTP/1.0".to_owned(),
        HttpVersion::Http11 => "HTTP/1.1".to_owned(),
        HttpVersion::Http2 => "HTTP/2".to_owned(),
        HttpVersion::Http3 => "HTTP/3".to_owned(),
        HttpVersion::Unrecognized(value) => value.to_string(),
    }
}

fn format_response_flags(flags: Option<&ResponseFlags>) -> String {
    let Some(flags) = flags else {
        return String::new();
    };

    let unauthorized_external =
        flags.unauthorized_details == Some(UnauthorizedReason::ExternalService);

    // 순서가 출력 순서
    let codes = [
        (flags.failed_local_healthcheck, "LH"),
        (flags.no_healthy_upstream, "UH"),
        (flags.upstream_request_timeout, "UT"),
        (flags.local_reset, "LR"),
        (flags.upstream_remote_reset, "UR"),
        (flags.upstream_connection_failure, "UF"),
        (flags.upstream_connection_termination, "UC"),
        (flags.upstream_overflow, "UO"),
        (flags.no_route_found, "NR"),
        (flags.delay_injected, "DI"),
        (flags.fault_injected, "FI"),
        (flags.rate_limited, "RL"),
        (unauthorized_external, "UAEX"),
        (flags.rate_limit_service_error, "RLSE"),
        (flags.downstream_connection_termination, "DC"),
        (flags.upstream_retry_limit_exceeded, "URX"),
        (flags.stream_idle_timeout, "SI"),
        (flags.invalid_envoy_request_headers, "IH"),
        (flags.downstream_protocol_error, "DPE"),
    ];

    codes
        .iter()
        .filter(|(set, _)| *set)
        .map(|(_, code)| *code)
        .collect::<Vec<_>>()
        .join(",")
}

/// IPv6 호스트는 대괄호로 감쌉니다.
fn format_address(address: Option<&Address>, include_port: bool) -> String {
    match address {
        Some(Address::Socket { address, port }) if include_port => {
            if address.contains(':') {
                format!("[{address}]:{port}")
            } else {
                format!("{address}:{port}")
            }
        }
        Some(Address::Socket { address, .. }) => address.clone(),
        Some(Address::Pipe { path }) => path.clone(),
        None => String::new(),
    }
}

fn format_uri_sans(certificate: Option<&CertificateProperties>) -> String {
    let Some(certificate) = certificate else {
        return String::new();
    };
    certificate
        .subject_alt_name
        .iter()
        .filter_map(|san| match san {
            SubjectAltName::Uri(uri) => Some(uri.as_str()),
            SubjectAltName::Dns(_) => None,
        })
        .collect::<Vec<_>>()
        .join(",")
}

fn format_cipher_suite(tls: Option<&TlsProperties>) -> String {
    match tls.and_then(|t| t.tls_cipher_suite) {
        None | Some(UNKNOWN_CIPHER_SUITE) => String::new(),
        Some(code) => cipher_suite_name(code),
    }
}

fn format_grpc_status(value: Option<&String>) -> String {
    let Some(value) = value else {
        return String::new();
    };
    match value.trim().parse::<u32>() {
        Ok(code) => GRPC_STATUS_NAMES
            .get(code as usize)
            .map(|name| (*name).to_owned())
            .unwrap_or_else(|| code.to_string()),
        Err(_) => "InvalidCode".to_owned(),
    }
}
