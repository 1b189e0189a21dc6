//! 헤더/트레일러 operator (`%REQ(X?Y):Z%`, `%RESP(X?Y):Z%`, `%TRAILER(X?Y):Z%`)

use std::collections::HashMap;
use std::fmt;

use crate::capture::{HttpGrpcAccessLogConfig, append_unique};
use crate::entry::{HttpAccessLogEntry, HttpRequestProperties};

/// Envoy가 전용 필드로 항상 캡처하는 요청 헤더
pub const DEFAULT_CAPTURED_REQUEST_HEADERS: &[&str] = &[
    ":method",
    ":scheme",
    ":authority",
    ":path",
    "user-agent",
    "referer",
    "x-forwarded-for",
    "x-request-id",
    "x-envoy-original-path",
];

/// 헤더를 읽어올 위치
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeaderKind {
    /// `REQ`
    Request,
    /// `RESP`
    Response,
    /// `TRAILER`
    Trailer,
}

impl HeaderKind {
    /// command 이름
    pub fn command(self) -> &'static str {
        match self {
            Self::Request => "REQ",
            Self::Response => "RESP",
            Self::Trailer => "TRAILER",
        }
    }

    /// command 이름으로 종류를 찾습니다.
    pub fn from_command(command: &str) -> Option<Self> {
        match command {
            "REQ" => Some(Self::Request),
            "RESP" => Some(Self::Response),
            "TRAILER" => Some(Self::Trailer),
            _ => None,
        }
    }
}

/// 헤더 operator
///
/// `header`를 먼저 조회하고, 값이 비어 있으면 `alt_header`로 대체합니다.
/// `max_length`가 0보다 크면 결과를 그 바이트 수로 자릅니다.
/// 두 이름 모두 비어 있을 수 있으며 이 경우 항상 빈 값을 렌더링합니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderOperator {
    pub kind: HeaderKind,
    /// 소문자 헤더 이름
    pub header: String,
    /// 소문자 대체 헤더 이름
    pub alt_header: String,
    pub max_length: usize,
}

impl HeaderOperator {
    /// 헤더 operator를 생성합니다. 이름은 소문자로 정규화됩니다.
    pub fn new(
        kind: HeaderKind,
        header: impl AsRef<str>,
        alt_header: impl AsRef<str>,
        max_length: usize,
    ) -> Self {
        Self {
            kind,
            header: header.as_ref().to_lowercase(),
            alt_header: alt_header.as_ref().to_lowercase(),
            max_length,
        }
    }

    /// HTTP 엔트리에서 헤더 값을 렌더링합니다.
    pub fn format_http_log_entry(&self, entry: &HttpAccessLogEntry) -> String {
        let mut value = self.lookup(entry, &self.header);
        if value.is_empty() && !self.alt_header.is_empty() {
            value = self.lookup(entry, &self.alt_header);
        }
        truncate(value, self.max_length)
    }

    /// TCP 엔트리에는 헤더가 없으므로 항상 빈 값입니다.
    pub fn format_tcp_log_entry(&self) -> String {
        String::new()
    }

    /// 참조하는 헤더 이름을 캡처 설정에 등록합니다.
    pub fn configure_http_log(&self, config: &mut HttpGrpcAccessLogConfig) {
        let names = [&self.header, &self.alt_header]
            .into_iter()
            .filter(|name| !name.is_empty());

        match self.kind {
            HeaderKind::Request => {
                let names = names.filter(|name| {
                    !DEFAULT_CAPTURED_REQUEST_HEADERS.contains(&name.as_str())
                });
                append_unique(&mut config.additional_request_headers_to_log, names);
            }
            HeaderKind::Response => {
                append_unique(&mut config.additional_response_headers_to_log, names);
            }
            HeaderKind::Trailer => {
                append_unique(&mut config.additional_response_trailers_to_log, names);
            }
        }
    }

    fn lookup(&self, entry: &HttpAccessLogEntry, name: &str) -> String {
        if name.is_empty() {
            return String::new();
        }
        match self.kind {
            HeaderKind::Request => entry
                .request
                .as_ref()
                .map(|request| request_header(request, name))
                .unwrap_or_default(),
            HeaderKind::Response => entry
                .response
                .as_ref()
                .map(|response| header_value(&response.response_headers, name))
                .unwrap_or_default(),
            HeaderKind::Trailer => entry
                .response
                .as_ref()
                .map(|response| header_value(&response.response_trailers, name))
                .unwrap_or_default(),
        }
    }
}

impl fmt::Display for HeaderOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}({}", self.kind.command(), self.header)?;
        if !self.alt_header.is_empty() {
            write!(f, "?{}", self.alt_header)?;
        }
        f.write_str(")")?;
        if self.max_length > 0 {
            write!(f, ":{}", self.max_length)?;
        }
        f.write_str("%")
    }
}

/// 기본 캡처 헤더는 전용 필드에서, 나머지는 헤더 테이블에서 읽습니다.
fn request_header(request: &HttpRequestProperties, name: &str) -> String {
    match name {
        ":method" => request.request_method.as_str().to_owned(),
        ":scheme" => request.scheme.clone(),
        ":authority" => request.authority.clone(),
        ":path" => request.path.clone(),
        "user-agent" => request.user_agent.clone(),
        "referer" => request.referer.clone(),
        "x-forwarded-for" => request.forwarded_for.clone(),
        "x-request-id" => request.request_id.clone(),
        "x-envoy-original-path" => request.original_path.clone(),
        _ => header_value(&request.request_headers, name),
    }
}

fn header_value(headers: &HashMap<String, String>, name: &str) -> String {
    headers.get(name).cloned().unwrap_or_default()
}

/// 바이트 단위로 자릅니다. 멀티바이트 문자가 잘리면 U+FFFD로 대체됩니다.
fn truncate(value: String, max_length: usize) -> String {
    if max_length == 0 || value.len() <= max_length {
        return value;
    }
    String::from_utf8_lossy(&value.as_bytes()[..max_length]).into_owned()
}
