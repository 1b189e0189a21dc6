//! 합성 포맷
//!
//! fragment를 순서대로 렌더링해 구분자 없이 이어 붙입니다. 빈 값을 렌더링한
//! fragment는 `-`로 치환됩니다.

use std::collections::HashMap;
use std::fmt;

use crate::capture::{HttpGrpcAccessLogConfig, TcpGrpcAccessLogConfig};
use crate::entry::{HttpAccessLogEntry, TcpAccessLogEntry};
use crate::fragment::Fragment;

/// 빈 값 대신 출력되는 문자
const EMPTY_VALUE: &str = "-";

/// 파싱된 access log 포맷
///
/// 한 번 파싱된 뒤에는 변경되지 않으며 여러 엔트리 렌더링에 재사용됩니다.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessLogFormat {
    fragments: Vec<Fragment>,
}

impl AccessLogFormat {
    pub fn new(fragments: Vec<Fragment>) -> Self {
        Self { fragments }
    }

    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// HTTP 엔트리를 한 줄로 렌더링합니다.
    pub fn format_http_log_entry(&self, entry: &HttpAccessLogEntry) -> String {
        self.render(|fragment| fragment.format_http_log_entry(entry))
    }

    /// TCP 엔트리를 한 줄로 렌더링합니다.
    pub fn format_tcp_log_entry(&self, entry: &TcpAccessLogEntry) -> String {
        self.render(|fragment| fragment.format_tcp_log_entry(entry))
    }

    fn render(&self, mut format_fragment: impl FnMut(&Fragment) -> String) -> String {
        let mut out = String::new();
        for fragment in &self.fragments {
            let value = format_fragment(fragment);
            if value.is_empty() {
                out.push_str(EMPTY_VALUE);
            } else {
                out.push_str(&value);
            }
        }
        out
    }

    /// 포맷이 참조하는 헤더, 트레일러, filter state 키를 HTTP 설정에 등록합니다.
    ///
    /// 기존 값은 유지되며 중복은 추가되지 않습니다.
    pub fn configure_http_log(&self, config: &mut HttpGrpcAccessLogConfig) {
        for fragment in &self.fragments {
            fragment.configure_http_log(config);
        }
    }

    /// 포맷이 참조하는 filter state 키를 TCP 설정에 등록합니다.
    pub fn configure_tcp_log(&self, config: &mut TcpGrpcAccessLogConfig) {
        for fragment in &self.fragments {
            fragment.configure_tcp_log(config);
        }
    }

    /// placeholder를 변수 값의 텍스트 리터럴로 바꾼 새 포맷을 반환합니다.
    ///
    /// 값이 없는 변수는 빈 문자열이 됩니다.
    pub fn interpolate(&self, variables: &InterpolationVariables) -> AccessLogFormat {
        let fragments = self
            .fragments
            .iter()
            .map(|fragment| match fragment {
                Fragment::Placeholder(placeholder) => {
                    Fragment::Text(variables.get(placeholder.name()).to_owned())
                }
                other => other.clone(),
            })
            .collect();
        AccessLogFormat::new(fragments)
    }
}

impl fmt::Display for AccessLogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for fragment in &self.fragments {
            fmt::Display::fmt(fragment, f)?;
        }
        Ok(())
    }
}

// ─── 치환 변수 ───────────────────────────────────────────────────────

/// placeholder 이름 -> 값
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterpolationVariables(HashMap<String, String>);

impl InterpolationVariables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    /// 변수 값. 없으면 빈 문자열입니다.
    pub fn get(&self, name: &str) -> &str {
        self.0.get(name).map(String::as_str).unwrap_or_default()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for InterpolationVariables {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}
