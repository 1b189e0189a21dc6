//! 포맷 fragment
//!
//! 파싱된 포맷 문자열의 한 조각입니다. 닫힌 enum으로 표현되어 렌더링과 캡처 설정이
//! 한 곳에서 모든 경우를 다룹니다.

mod field;
mod header;
mod placeholder;
mod start_time;
mod stub;

pub use field::Field;
pub use header::{DEFAULT_CAPTURED_REQUEST_HEADERS, HeaderKind, HeaderOperator};
pub use placeholder::Placeholder;
pub use start_time::StartTimeOperator;
pub use stub::{
    DYNAMIC_METADATA_MARKER, DynamicMetadataOperator, FILTER_STATE_MARKER, FilterStateOperator,
};

use std::fmt;

use crate::capture::{HttpGrpcAccessLogConfig, TcpGrpcAccessLogConfig};
use crate::entry::{HttpAccessLogEntry, TcpAccessLogEntry};

/// 포맷 문자열의 한 조각
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    /// 그대로 출력되는 텍스트
    Text(String),
    /// 이름으로 식별되는 필드
    Field(Field),
    /// 데이터 출처가 없는 command. `UNSUPPORTED_FIELD(NAME)`을 렌더링합니다.
    Unsupported(String),
    /// `REQ`/`RESP`/`TRAILER`
    Header(HeaderOperator),
    StartTime(StartTimeOperator),
    DynamicMetadata(DynamicMetadataOperator),
    FilterState(FilterStateOperator),
    Placeholder(Placeholder),
}

impl Fragment {
    /// HTTP 엔트리에 대해 렌더링합니다. 빈 값의 `-` 치환은 합성 단계에서 합니다.
    pub fn format_http_log_entry(&self, entry: &HttpAccessLogEntry) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Field(field) => field.format_http_log_entry(entry),
            Self::Unsupported(name) => unsupported(name),
            Self::Header(header) => header.format_http_log_entry(entry),
            Self::StartTime(op) => op.format_common(entry.common_properties.as_ref()),
            Self::DynamicMetadata(op) => op.render(),
            Self::FilterState(op) => op.render(),
            Self::Placeholder(placeholder) => placeholder.to_string(),
        }
    }

    /// TCP 엔트리에 대해 렌더링합니다.
    pub fn format_tcp_log_entry(&self, entry: &TcpAccessLogEntry) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Field(field) => field.format_tcp_log_entry(entry),
            Self::Unsupported(name) => unsupported(name),
            Self::Header(header) => header.format_tcp_log_entry(),
            Self::StartTime(op) => op.format_common(entry.common_properties.as_ref()),
            Self::DynamicMetadata(op) => op.render(),
            Self::FilterState(op) => op.render(),
            Self::Placeholder(placeholder) => placeholder.to_string(),
        }
    }

    /// HTTP 캡처 설정에 필요한 헤더/트레일러/filter state 키를 등록합니다.
    pub fn configure_http_log(&self, config: &mut HttpGrpcAccessLogConfig) {
        match self {
            Self::Header(header) => header.configure_http_log(config),
            Self::FilterState(op) => op.configure_common(&mut config.common_config),
            _ => {}
        }
    }

    /// TCP 캡처 설정에 filter state 키를 등록합니다.
    pub fn configure_tcp_log(&self, config: &mut TcpGrpcAccessLogConfig) {
        if let Self::FilterState(op) = self {
            op.configure_common(&mut config.common_config);
        }
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Field(field) => fmt::Display::fmt(field, f),
            Self::Unsupported(name) => write!(f, "%{name}%"),
            Self::Header(header) => fmt::Display::fmt(header, f),
            Self::StartTime(op) => fmt::Display::fmt(op, f),
            Self::DynamicMetadata(op) => fmt::Display::fmt(op, f),
            Self::FilterState(op) => fmt::Display::fmt(op, f),
            Self::Placeholder(placeholder) => fmt::Display::fmt(placeholder, f),
        }
    }
}

fn unsupported(name: &str) -> String {
    format!("UNSUPPORTED_FIELD({name})")
}
