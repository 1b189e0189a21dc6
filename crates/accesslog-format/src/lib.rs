#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`parser`]: 포맷 문자열 -> [`AccessLogFormat`] 컴파일
//! - [`fragment`]: 텍스트 리터럴과 command operator 렌더러
//! - [`format`]: fragment 합성, 캡처 설정, placeholder 치환
//! - [`entry`]: Envoy 구조화 access log 엔트리 (HTTP/TCP)
//! - [`capture`]: Envoy gRPC access log 캡처 설정
//! - [`tls`]: TLS cipher suite 이름 테이블
//! - [`error`]: 도메인 에러 타입

pub mod capture;
pub mod entry;
pub mod error;
pub mod format;
pub mod fragment;
pub mod parser;
pub mod tls;

// --- 주요 타입 re-export ---

// 파서
pub use parser::parse_format;

// 포맷
pub use format::{AccessLogFormat, InterpolationVariables};
pub use fragment::Fragment;

// 엔트리
pub use entry::{AccessLogCommon, HttpAccessLogEntry, TcpAccessLogEntry};

// 캡처 설정
pub use capture::{CommonGrpcAccessLogConfig, HttpGrpcAccessLogConfig, TcpGrpcAccessLogConfig};

// 에러
pub use error::AccessLogError;
