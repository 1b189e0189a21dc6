//! 스트리머 설정
//!
//! [`StreamerConfig`]는 core의 [`AccessLogsConfig`](kuma_dp_core::config::AccessLogsConfig)에서
//! 파생됩니다.
//!
//! # 사용 예시
//! ```ignore
//! use kuma_dp_core::config::KumaDpConfig;
//! use kuma_accesslog_streamer::config::StreamerConfig;
//!
//! let core_config = KumaDpConfig::default();
//! let config = StreamerConfig::from_core(&core_config.access_logs);
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::StreamerError;

/// 기본 목적지 연결 타임아웃 (초)
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

/// 기본 레코드 최대 크기 (바이트)
pub const DEFAULT_MAX_RECORD_SIZE: usize = 64 * 1024;

/// 접근 로그 스트리머 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamerConfig {
    /// Envoy가 기록할 named pipe 경로
    pub pipe_path: PathBuf,
    /// 목적지 TCP 연결 및 레코드 하나의 전송 타임아웃 (초)
    pub connect_timeout_secs: u64,
    /// 레코드 최대 크기 (바이트, 줄 끝 `\n` 제외)
    pub max_record_size: usize,
}

impl Default for StreamerConfig {
    fn default() -> Self {
        Self {
            pipe_path: PathBuf::from("/tmp/kuma-al-dataplane-default.sock"),
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            max_record_size: DEFAULT_MAX_RECORD_SIZE,
        }
    }
}

impl StreamerConfig {
    /// core의 `AccessLogsConfig`에서 스트리머 설정을 생성합니다.
    pub fn from_core(core: &kuma_dp_core::config::AccessLogsConfig) -> Self {
        Self {
            pipe_path: PathBuf::from(&core.pipe_path),
            connect_timeout_secs: core.connect_timeout_secs,
            max_record_size: core.max_record_size,
        }
    }

    /// 연결 타임아웃을 `Duration`으로 반환합니다.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), StreamerError> {
        const MAX_CONNECT_TIMEOUT_SECS: u64 = 300;
        const MAX_RECORD_SIZE: usize = 16 * 1024 * 1024;

        if self.pipe_path.as_os_str().is_empty() {
            return Err(StreamerError::Config {
                field: "pipe_path".to_owned(),
                reason: "must not be empty".to_owned(),
            });
        }

        if self.connect_timeout_secs == 0 || self.connect_timeout_secs > MAX_CONNECT_TIMEOUT_SECS {
            return Err(StreamerError::Config {
                field: "connect_timeout_secs".to_owned(),
                reason: format!("must be 1-{}", MAX_CONNECT_TIMEOUT_SECS),
            });
        }

        if self.max_record_size == 0 || self.max_record_size > MAX_RECORD_SIZE {
            return Err(StreamerError::Config {
                field: "max_record_size".to_owned(),
                reason: format!("must be 1-{}", MAX_RECORD_SIZE),
            });
        }

        Ok(())
    }
}

/// 스트리머 설정 빌더
#[derive(Default)]
pub struct StreamerConfigBuilder {
    config: StreamerConfig,
}

impl StreamerConfigBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// named pipe 경로를 설정합니다.
    pub fn pipe_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pipe_path = path.into();
        self
    }

    /// 연결 타임아웃(초)을 설정합니다.
    pub fn connect_timeout_secs(mut self, secs: u64) -> Self {
        self.config.connect_timeout_secs = secs;
        self
    }

    /// 레코드 최대 크기를 설정합니다.
    pub fn max_record_size(mut self, size: usize) -> Self {
        self.config.max_record_size = size;
        self
    }

    /// 설정을 검증하고 반환합니다.
    pub fn build(self) -> Result<StreamerConfig, StreamerError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
