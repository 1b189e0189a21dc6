//! 접근 로그 스트리머 에러 타입
//!
//! [`StreamerError`]는 목적지 연결, 전송, named pipe 준비, 구조화 스트림
//! 프로토콜 위반을 표현합니다. `From<StreamerError> for KumaDpError` 변환이
//! 구현되어 있어 `Pipeline` 구현에서 `?`로 전파할 수 있습니다.

use kuma_accesslog_format::AccessLogError;
use kuma_dp_core::error::{ConfigError, KumaDpError, PipelineError};

/// 스트리머 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum StreamerError {
    /// 목적지 TCP 연결 실패 (타임아웃 포함)
    #[error("failed to connect to access log address {address}: {reason}")]
    Connect {
        /// 목적지 주소 (host:port)
        address: String,
        /// 실패 사유
        reason: String,
    },

    /// 레코드 전송 실패
    #[error("failed to send access log to {address}: {reason}")]
    Send {
        /// 목적지 주소
        address: String,
        /// 실패 사유
        reason: String,
    },

    /// 연결되지 않은 sender로 전송 시도
    #[error("access log sender for {address} is not connected")]
    NotConnected {
        /// 목적지 주소
        address: String,
    },

    /// 이미 닫힌 sender 사용
    #[error("access log sender for {address} is closed")]
    Closed {
        /// 목적지 주소
        address: String,
    },

    /// named pipe 생성/열기 실패
    #[error("failed to set up access log pipe {path}: {reason}")]
    PipeSetup {
        /// pipe 경로
        path: String,
        /// 실패 사유
        reason: String,
    },

    /// 구조화 스트림 프로토콜 위반 (identifier 누락 등)
    #[error("access log stream protocol error: {0}")]
    Protocol(String),

    /// 스트림 identifier에 담긴 포맷 문자열이 유효하지 않음
    #[error("invalid access log format: {0}")]
    Format(#[from] AccessLogError),

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// 상위 전송 계층이 보고한 스트림 에러
    #[error("access log stream failed: {0}")]
    Stream(String),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl StreamerError {
    /// 레코드 드롭 사유 라벨을 반환합니다.
    pub fn drop_reason(&self) -> &'static str {
        use kuma_dp_core::metrics as m;
        match self {
            Self::Connect { .. } | Self::Closed { .. } => m::DROP_REASON_CONNECT,
            _ => m::DROP_REASON_SEND,
        }
    }
}

impl From<StreamerError> for KumaDpError {
    fn from(err: StreamerError) -> Self {
        match err {
            StreamerError::Config { field, reason } => {
                KumaDpError::Config(ConfigError::InvalidValue { field, reason })
            }
            StreamerError::PipeSetup { .. } => {
                KumaDpError::Pipeline(PipelineError::InitFailed(err.to_string()))
            }
            other => KumaDpError::Pipeline(PipelineError::Failed(other.to_string())),
        }
    }
}
