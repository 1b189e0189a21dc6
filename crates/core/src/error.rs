//! 에러 타입: 도메인별 에러 정의

/// kuma-dp 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum KumaDpError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 파이프라인 처리 에러
    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// 컴포넌트 관리 에러
    #[error("component error: {0}")]
    Component(#[from] ComponentError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 파이프라인 처리 에러
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// 파이프라인 초기화 실패
    #[error("pipeline init failed: {0}")]
    InitFailed(String),

    /// 이미 실행 중
    #[error("pipeline is already running")]
    AlreadyRunning,

    /// 실행 중이 아님
    #[error("pipeline is not running")]
    NotRunning,

    /// 실행 중 발생한 복구 불가능한 에러
    #[error("pipeline failed: {0}")]
    Failed(String),
}

/// 컴포넌트 레지스트리 에러
#[derive(Debug, thiserror::Error)]
pub enum ComponentError {
    /// 같은 이름의 컴포넌트가 이미 등록됨
    #[error("component already registered: {name}")]
    AlreadyRegistered { name: String },

    /// 컴포넌트를 찾을 수 없음
    #[error("component not found: {name}")]
    NotFound { name: String },

    /// 하나 이상의 컴포넌트 정지 실패
    #[error("failed to stop components: {0}")]
    StopFailed(String),
}
