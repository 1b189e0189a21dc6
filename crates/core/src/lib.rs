#![doc = include_str!("../README.md")]

pub mod component;
pub mod config;
pub mod error;
pub mod metrics;
pub mod pipeline;

// --- 주요 타입 re-export ---

// 에러
pub use error::{ComponentError, ConfigError, KumaDpError, PipelineError};

// 설정
pub use config::KumaDpConfig;

// 생명주기
pub use component::{ComponentInfo, ComponentRegistry, ComponentState};
pub use pipeline::{BoxFuture, DynPipeline, HealthStatus, Pipeline};
