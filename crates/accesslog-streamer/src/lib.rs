#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`sender`]: 목적지 하나에 대한 TCP 전송기
//! - [`registry`]: 주소별 전송기 레지스트리
//! - [`record`]: named pipe 레코드 파싱
//! - [`pipe`]: FIFO 생성/열기/제거
//! - [`streamer`]: named pipe 리더 루프와 `Pipeline` 구현
//! - [`server`]: 구조화 스트림 처리
//! - [`config`]: 스트리머 설정
//! - [`error`]: 도메인 에러 타입

pub mod config;
pub mod error;
pub mod pipe;
pub mod record;
pub mod registry;
pub mod sender;
pub mod server;
pub mod streamer;

// --- 주요 타입 re-export ---

// 설정
pub use config::{StreamerConfig, StreamerConfigBuilder};

// 전송
pub use registry::SenderRegistry;
pub use sender::{LogSender, SenderState};

// 입력 경로
pub use record::PipeRecord;
pub use server::{AccessLogServer, Identifier, LogEntries, StreamAccessLogsMessage};
pub use streamer::{AccessLogStreamer, AccessLogStreamerBuilder, RecordDispatcher, run_reader};

// 에러
pub use error::StreamerError;
