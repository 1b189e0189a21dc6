//! Envoy gRPC access log 캡처 설정
//!
//! Envoy는 명시적으로 요청한 헤더, 트레일러, filter state만 엔트리에 담습니다.
//! 포맷이 참조하는 이름을 미리 등록해 두면 렌더러가 값을 받을 수 있습니다.

use serde::{Deserialize, Serialize};

/// HTTP/TCP 공통 설정
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommonGrpcAccessLogConfig {
    /// `address;format` 형태의 스트림 식별자
    pub log_name: String,
    pub filter_state_objects_to_log: Vec<String>,
}

/// HTTP gRPC access log 설정
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpGrpcAccessLogConfig {
    /// 추가할 항목이 있을 때만 생성됩니다.
    pub common_config: Option<CommonGrpcAccessLogConfig>,
    pub additional_request_headers_to_log: Vec<String>,
    pub additional_response_headers_to_log: Vec<String>,
    pub additional_response_trailers_to_log: Vec<String>,
}

/// TCP gRPC access log 설정
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TcpGrpcAccessLogConfig {
    pub common_config: Option<CommonGrpcAccessLogConfig>,
}

/// 처음 등장한 순서를 유지하며 중복 없이 추가합니다.
pub(crate) fn append_unique<I, S>(list: &mut Vec<String>, names: I)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    for name in names {
        let name = name.as_ref();
        if !list.iter().any(|existing| existing == name) {
            list.push(name.to_owned());
        }
    }
}
