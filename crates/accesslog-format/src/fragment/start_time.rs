//! `%START_TIME%` / `%START_TIME(FORMAT)%`

use std::fmt;

use chrono::{DateTime, Utc};

use crate::entry::AccessLogCommon;

/// 사용자 지정 포맷은 보존만 하고 해석하지 않습니다.
/// 렌더링은 항상 `2020-02-18T21:52:17.987Z` 형태입니다.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StartTimeOperator {
    pub format: String,
}

impl StartTimeOperator {
    pub fn new(format: impl Into<String>) -> Self {
        Self {
            format: format.into(),
        }
    }

    /// 공통 속성의 시작 시각을 렌더링합니다. 없으면 빈 값입니다.
    pub fn format_common(&self, common: Option<&AccessLogCommon>) -> String {
        common
            .and_then(|c| c.start_time)
            .map(format_start_time)
            .unwrap_or_default()
    }
}

impl fmt::Display for StartTimeOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.format.is_empty() {
            f.write_str("%START_TIME%")
        } else {
            write!(f, "%START_TIME({})%", self.format)
        }
    }
}

/// UTC 밀리초 정밀도 (버림)
fn format_start_time(time: DateTime<Utc>) -> String {
    time.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}
