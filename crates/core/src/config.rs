//! 설정 관리: kuma-dp.toml 파싱 및 런타임 설정
//!
//! [`KumaDpConfig`]는 모든 컴포넌트의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`KUMA_DP_ACCESS_LOGS_PIPE_PATH=/tmp/x` 형식)
//! 3. 설정 파일 (`kuma-dp.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), kuma_dp_core::error::KumaDpError> {
//! use kuma_dp_core::config::KumaDpConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = KumaDpConfig::load("kuma-dp.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = KumaDpConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, KumaDpError};

/// kuma-dp 통합 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KumaDpConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 접근 로그 스트리밍 설정
    #[serde(default)]
    pub access_logs: AccessLogsConfig,
    /// Prometheus 메트릭 설정
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl KumaDpConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, KumaDpError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, KumaDpError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                KumaDpError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                KumaDpError::Io(e)
            }
        })?;
        Self::parse(&content)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, KumaDpError> {
        toml::from_str(toml_str).map_err(|e| {
            KumaDpError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `KUMA_DP_{SECTION}_{FIELD}`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "KUMA_DP_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "KUMA_DP_GENERAL_LOG_FORMAT");
        override_string(&mut self.general.pid_file, "KUMA_DP_GENERAL_PID_FILE");

        // Access logs
        override_bool(&mut self.access_logs.enabled, "KUMA_DP_ACCESS_LOGS_ENABLED");
        override_string(
            &mut self.access_logs.pipe_path,
            "KUMA_DP_ACCESS_LOGS_PIPE_PATH",
        );
        override_u64(
            &mut self.access_logs.connect_timeout_secs,
            "KUMA_DP_ACCESS_LOGS_CONNECT_TIMEOUT_SECS",
        );
        override_usize(
            &mut self.access_logs.max_record_size,
            "KUMA_DP_ACCESS_LOGS_MAX_RECORD_SIZE",
        );

        // Metrics
        override_bool(&mut self.metrics.enabled, "KUMA_DP_METRICS_ENABLED");
        override_string(&mut self.metrics.listen_addr, "KUMA_DP_METRICS_LISTEN_ADDR");
        override_u16(&mut self.metrics.port, "KUMA_DP_METRICS_PORT");
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), KumaDpError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(invalid(
                "general.log_level",
                format!("must be one of: {}", valid_levels.join(", ")),
            ));
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(invalid(
                "general.log_format",
                format!("must be one of: {}", valid_formats.join(", ")),
            ));
        }

        if self.access_logs.enabled {
            if self.access_logs.pipe_path.is_empty() {
                return Err(invalid(
                    "access_logs.pipe_path",
                    "pipe path must not be empty when access logs are enabled".to_owned(),
                ));
            }
            if self.access_logs.connect_timeout_secs == 0 {
                return Err(invalid(
                    "access_logs.connect_timeout_secs",
                    "must be greater than 0".to_owned(),
                ));
            }
            if self.access_logs.max_record_size == 0 {
                return Err(invalid(
                    "access_logs.max_record_size",
                    "must be greater than 0".to_owned(),
                ));
            }
        }

        if self.metrics.enabled && self.metrics.port == 0 {
            return Err(invalid("metrics.port", "must be greater than 0".to_owned()));
        }

        Ok(())
    }
}

fn invalid(field: &str, reason: String) -> KumaDpError {
    ConfigError::InvalidValue {
        field: field.to_owned(),
        reason,
    }
    .into()
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
    /// PID 파일 경로 (빈 문자열이면 사용하지 않음)
    pub pid_file: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
            pid_file: String::new(),
        }
    }
}

/// 접근 로그 스트리밍 설정
///
/// Envoy는 파일 접근 로그를 named pipe에 `address;message` 형식으로 기록하고,
/// 스트리머가 이를 읽어 목적지 TCP 주소로 전달합니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessLogsConfig {
    /// 활성화 여부
    pub enabled: bool,
    /// Envoy가 기록할 named pipe 경로
    pub pipe_path: String,
    /// 목적지 TCP 연결 타임아웃 (초)
    pub connect_timeout_secs: u64,
    /// 레코드 최대 크기 (바이트), 초과 시 드롭
    pub max_record_size: usize,
}

impl Default for AccessLogsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            pipe_path: "/tmp/kuma-al-dataplane-default.sock".to_owned(),
            connect_timeout_secs: 5,
            max_record_size: 64 * 1024, // 64KB
        }
    }
}

/// Prometheus 메트릭 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// 활성화 여부
    pub enabled: bool,
    /// 리슨 주소
    pub listen_addr: String,
    /// 리슨 포트
    pub port: u16,
    /// 스크레이프 경로
    pub endpoint: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_addr: "127.0.0.1".to_owned(),
            port: 9902,
            endpoint: "/metrics".to_owned(),
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse usize from env var, ignoring"
            ),
        }
    }
}

fn override_u16(target: &mut u16, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u16>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u16 from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn default_config_has_sane_values() {
        let config = KumaDpConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.general.log_format, "json");
        assert!(config.access_logs.enabled);
        assert_eq!(config.access_logs.connect_timeout_secs, 5);
        assert!(!config.metrics.enabled);
    }

    #[test]
    fn default_config_passes_validation() {
        KumaDpConfig::default().validate().unwrap();
    }

    #[test]
    fn parse_empty_toml_uses_defaults() {
        let config = KumaDpConfig::parse("").unwrap();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.access_logs.max_record_size, 64 * 1024);
    }

    #[test]
    fn parse_partial_toml_merges_with_defaults() {
        let toml = r#"
[general]
log_level = "debug"

[access_logs]
pipe_path = "/run/kuma/access.sock"
"#;
        let config = KumaDpConfig::parse(toml).unwrap();
        assert_eq!(config.general.log_level, "debug");
        // log_format은 기본값 유지
        assert_eq!(config.general.log_format, "json");
        assert_eq!(config.access_logs.pipe_path, "/run/kuma/access.sock");
        assert_eq!(config.access_logs.connect_timeout_secs, 5);
    }

    #[test]
    fn parse_full_toml() {
        let toml = r#"
[general]
log_level = "warn"
log_format = "pretty"
pid_file = "/run/kuma-dp.pid"

[access_logs]
enabled = true
pipe_path = "/tmp/kuma-al-backend-default.sock"
connect_timeout_secs = 2
max_record_size = 4096

[metrics]
enabled = true
listen_addr = "0.0.0.0"
port = 9100
endpoint = "/metrics"
"#;
        let config = KumaDpConfig::parse(toml).unwrap();
        assert_eq!(config.general.log_format, "pretty");
        assert_eq!(config.general.pid_file, "/run/kuma-dp.pid");
        assert_eq!(config.access_logs.connect_timeout_secs, 2);
        assert_eq!(config.access_logs.max_record_size, 4096);
        assert!(config.metrics.enabled);
        assert_eq!(config.metrics.port, 9100);
        config.validate().unwrap();
    }

    #[test]
    fn parse_invalid_toml_returns_error() {
        let err = KumaDpConfig::parse("invalid = [[[toml").unwrap_err();
        assert!(matches!(
            err,
            KumaDpError::Config(ConfigError::ParseFailed { .. })
        ));
    }

    #[test]
    fn validate_rejects_invalid_log_level() {
        let mut config = KumaDpConfig::default();
        config.general.log_level = "verbose".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("log_level"));
    }

    #[test]
    fn validate_rejects_invalid_log_format() {
        let mut config = KumaDpConfig::default();
        config.general.log_format = "xml".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("log_format"));
    }

    #[test]
    fn validate_rejects_empty_pipe_path_when_enabled() {
        let mut config = KumaDpConfig::default();
        config.access_logs.pipe_path = String::new();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("pipe_path"));
    }

    #[test]
    fn validate_accepts_empty_pipe_path_when_disabled() {
        let mut config = KumaDpConfig::default();
        config.access_logs.enabled = false;
        config.access_logs.pipe_path = String::new();
        config.validate().unwrap();
    }

    #[test]
    fn validate_rejects_zero_connect_timeout() {
        let mut config = KumaDpConfig::default();
        config.access_logs.connect_timeout_secs = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("connect_timeout_secs"));
    }

    #[test]
    fn validate_rejects_zero_metrics_port_when_enabled() {
        let mut config = KumaDpConfig::default();
        config.metrics.enabled = true;
        config.metrics.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    #[serial]
    fn env_override_string() {
        let mut val = "original".to_owned();
        // SAFETY: serial 테스트로 환경변수 동시 접근이 없습니다.
        unsafe { std::env::set_var("TEST_KUMA_DP_STR", "overridden") };
        override_string(&mut val, "TEST_KUMA_DP_STR");
        assert_eq!(val, "overridden");
        unsafe { std::env::remove_var("TEST_KUMA_DP_STR") };
    }

    #[test]
    #[serial]
    fn env_override_bool_invalid_keeps_original() {
        let mut val = false;
        // SAFETY: serial 테스트로 환경변수 동시 접근이 없습니다.
        unsafe { std::env::set_var("TEST_KUMA_DP_BOOL_BAD", "not-a-bool") };
        override_bool(&mut val, "TEST_KUMA_DP_BOOL_BAD");
        assert!(!val); // 원래 값 유지
        unsafe { std::env::remove_var("TEST_KUMA_DP_BOOL_BAD") };
    }

    #[test]
    #[serial]
    fn env_override_u64_valid() {
        let mut val = 5u64;
        // SAFETY: serial 테스트로 환경변수 동시 접근이 없습니다.
        unsafe { std::env::set_var("TEST_KUMA_DP_U64", "12") };
        override_u64(&mut val, "TEST_KUMA_DP_U64");
        assert_eq!(val, 12);
        unsafe { std::env::remove_var("TEST_KUMA_DP_U64") };
    }

    #[test]
    #[serial]
    fn apply_env_overrides_reads_section_keys() {
        let mut config = KumaDpConfig::default();
        // SAFETY: serial 테스트로 환경변수 동시 접근이 없습니다.
        unsafe {
            std::env::set_var("KUMA_DP_ACCESS_LOGS_PIPE_PATH", "/tmp/override.sock");
            std::env::set_var("KUMA_DP_METRICS_PORT", "9300");
        }
        config.apply_env_overrides();
        unsafe {
            std::env::remove_var("KUMA_DP_ACCESS_LOGS_PIPE_PATH");
            std::env::remove_var("KUMA_DP_METRICS_PORT");
        }
        assert_eq!(config.access_logs.pipe_path, "/tmp/override.sock");
        assert_eq!(config.metrics.port, 9300);
    }

    #[test]
    fn config_serialize_roundtrip() {
        let config = KumaDpConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed = KumaDpConfig::parse(&toml_str).unwrap();
        assert_eq!(config.access_logs.pipe_path, parsed.access_logs.pipe_path);
        assert_eq!(config.metrics.port, parsed.metrics.port);
    }

    #[tokio::test]
    async fn from_file_not_found() {
        let err = KumaDpConfig::from_file("/nonexistent/path/kuma-dp.toml")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            KumaDpError::Config(ConfigError::FileNotFound { .. })
        ));
    }
}
