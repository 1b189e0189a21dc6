//! `DYNAMIC_METADATA` / `FILTER_STATE` operator
//!
//! 렌더러가 받는 엔트리에는 이 값들이 없으므로 고정된
//! `UNSUPPORTED_COMMAND(...)` 마커를 렌더링합니다. `FILTER_STATE` 키는
//! 캡처 설정에는 등록됩니다.

use std::fmt;

use crate::capture::{CommonGrpcAccessLogConfig, append_unique};

pub const DYNAMIC_METADATA_MARKER: &str =
    "UNSUPPORTED_COMMAND(%DYNAMIC_METADATA(NAMESPACE:KEY*):Z%)";

pub const FILTER_STATE_MARKER: &str = "UNSUPPORTED_COMMAND(%FILTER_STATE(KEY):Z%)";

/// `%DYNAMIC_METADATA(NAMESPACE:KEY*):Z%`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DynamicMetadataOperator {
    pub filter_namespace: String,
    pub path: Vec<String>,
    pub max_length: usize,
}

impl DynamicMetadataOperator {
    /// `ns:key1:key2` 형태의 인자를 분리합니다.
    pub fn from_args(args: &str, max_length: usize) -> Self {
        let mut segments = args.split(':').map(str::to_owned);
        let filter_namespace = segments.next().unwrap_or_default();
        Self {
            filter_namespace,
            path: segments.collect(),
            max_length,
        }
    }

    pub fn render(&self) -> String {
        DYNAMIC_METADATA_MARKER.to_owned()
    }
}

impl fmt::Display for DynamicMetadataOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%DYNAMIC_METADATA({}", self.filter_namespace)?;
        for segment in &self.path {
            write!(f, ":{segment}")?;
        }
        f.write_str(")")?;
        if self.max_length > 0 {
            write!(f, ":{}", self.max_length)?;
        }
        f.write_str("%")
    }
}

/// `%FILTER_STATE(KEY):Z%`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterStateOperator {
    pub key: String,
    pub max_length: usize,
}

impl FilterStateOperator {
    pub fn new(key: impl Into<String>, max_length: usize) -> Self {
        Self {
            key: key.into(),
            max_length,
        }
    }

    pub fn render(&self) -> String {
        FILTER_STATE_MARKER.to_owned()
    }

    /// 키를 `filter_state_objects_to_log`에 등록합니다.
    pub fn configure_common(&self, common_config: &mut Option<CommonGrpcAccessLogConfig>) {
        let config = common_config.get_or_insert_with(Default::default);
        append_unique(&mut config.filter_state_objects_to_log, [&self.key]);
    }
}

impl fmt::Display for FilterStateOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%FILTER_STATE({})", self.key)?;
        if self.max_length > 0 {
            write!(f, ":{}", self.max_length)?;
        }
        f.write_str("%")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dynamic_metadata_splits_namespace_and_path() {
        let op = DynamicMetadataOperator::from_args("com.test.my_filter:test_object:inner_key", 10);
        assert_eq!(op.filter_namespace, "com.test.my_filter");
        assert_eq!(op.path, vec!["test_object", "inner_key"]);
        assert_eq!(
            op.to_string(),
            "%DYNAMIC_METADATA(com.test.my_filter:test_object:inner_key):10%"
        );
    }

    #[test]
    fn dynamic_metadata_allows_empty_args() {
        let op = DynamicMetadataOperator::from_args("", 0);
        assert_eq!(op.filter_namespace, "");
        assert!(op.path.is_empty());
        assert_eq!(op.to_string(), "%DYNAMIC_METADATA()%");
    }

    #[test]
    fn stubs_render_markers() {
        assert_eq!(
            DynamicMetadataOperator::from_args("ns", 0).render(),
            "UNSUPPORTED_COMMAND(%DYNAMIC_METADATA(NAMESPACE:KEY*):Z%)"
        );
        assert_eq!(
            FilterStateOperator::new("key", 10).render(),
            "UNSUPPORTED_COMMAND(%FILTER_STATE(KEY):Z%)"
        );
    }

    #[test]
    fn filter_state_display() {
        assert_eq!(
            FilterStateOperator::new("filter.state.key", 10).to_string(),
            "%FILTER_STATE(filter.state.key):10%"
        );
        assert_eq!(
            FilterStateOperator::new("key", 0).to_string(),
            "%FILTER_STATE(key)%"
        );
    }

    #[test]
    fn filter_state_creates_common_config_once() {
        let mut common = None;
        FilterStateOperator::new("a", 0).configure_common(&mut common);
        FilterStateOperator::new("b", 0).configure_common(&mut common);
        FilterStateOperator::new("a", 5).configure_common(&mut common);

        let common = common.expect("created");
        assert_eq!(common.filter_state_objects_to_log, vec!["a", "b"]);
    }
}
