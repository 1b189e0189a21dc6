//! 구조화 접근 로그 스트림 서버
//!
//! Envoy의 gRPC 접근 로그 서비스는 스트림마다 첫 메시지의 identifier에
//! `address;format` 형태의 log name을 담아 보냅니다. 서버는 첫 메시지에서
//! 포맷을 파싱하고, 이후 스트림이 끝날 때까지 모든 엔트리를 그 포맷으로 렌더링해
//! 같은 목적지로 전송합니다.
//!
//! 전송 계층(tonic 바인딩과 protobuf 디코딩)은 이 모듈 밖에 있습니다.
//! 디코딩된 메시지 스트림을 [`AccessLogServer::stream_access_logs`]에 넘기면 됩니다.
//!
//! named pipe 경로와 달리, 이 경로에서는 포맷 에러와 전송 에러가 스트림 전체를
//! 실패시킵니다. 스트림 하나는 수명 동안 하나의 목적지와 포맷에 묶여 있습니다.

use std::fmt;
use std::pin::pin;
use std::sync::Arc;

use futures::{Stream, StreamExt};
use kuma_accesslog_format::{
    AccessLogFormat, HttpAccessLogEntry, TcpAccessLogEntry, parse_format,
};
use kuma_dp_core::metrics as m;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::StreamerError;
use crate::registry::SenderRegistry;

// ─── Messages ────────────────────────────────────────────────────────

/// 스트림 식별자
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Identifier {
    /// `address;format` 형태의 log name
    pub log_name: String,
}

impl Identifier {
    /// log name으로 식별자를 생성합니다.
    pub fn new(log_name: impl Into<String>) -> Self {
        Self {
            log_name: log_name.into(),
        }
    }
}

/// 한 메시지에 담긴 엔트리 묶음
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogEntries {
    /// HTTP 엔트리
    Http(Vec<HttpAccessLogEntry>),
    /// TCP 엔트리
    Tcp(Vec<TcpAccessLogEntry>),
}

impl LogEntries {
    /// 엔트리 수를 반환합니다.
    pub fn len(&self) -> usize {
        match self {
            Self::Http(entries) => entries.len(),
            Self::Tcp(entries) => entries.len(),
        }
    }

    /// 엔트리가 없는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// 디코딩된 스트림 메시지
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamAccessLogsMessage {
    /// 첫 메시지에만 필수
    pub identifier: Option<Identifier>,
    /// 엔트리 묶음
    pub log_entries: LogEntries,
}

// ─── Stream handler ──────────────────────────────────────────────────

/// 스트림 하나의 목적지와 포맷
#[derive(Debug)]
struct StreamHandler {
    address: String,
    format: AccessLogFormat,
}

impl StreamHandler {
    fn from_log_name(log_name: &str) -> Result<Self, StreamerError> {
        let (address, format) = log_name.split_once(';').ok_or_else(|| {
            StreamerError::Protocol(format!(
                "log name {:?} is not in the form \"address;format\"",
                log_name
            ))
        })?;

        let address = address.trim();
        if address.is_empty() {
            return Err(StreamerError::Protocol(format!(
                "log name {:?} has an empty address",
                log_name
            )));
        }

        Ok(Self {
            address: address.to_owned(),
            format: parse_format(format)?,
        })
    }

    async fn handle(
        &self,
        registry: &SenderRegistry,
        entries: &LogEntries,
    ) -> Result<(), StreamerError> {
        match entries {
            LogEntries::Http(entries) => {
                for entry in entries {
                    self.forward(registry, "http", self.format.format_http_log_entry(entry))
                        .await?;
                }
            }
            LogEntries::Tcp(entries) => {
                for entry in entries {
                    self.forward(registry, "tcp", self.format.format_tcp_log_entry(entry))
                        .await?;
                }
            }
        }
        Ok(())
    }

    async fn forward(
        &self,
        registry: &SenderRegistry,
        kind: &'static str,
        line: String,
    ) -> Result<(), StreamerError> {
        metrics::counter!(m::ACCESS_LOG_RECORDS_RECEIVED_TOTAL).increment(1);
        match registry.send(&self.address, line.as_bytes()).await {
            Ok(()) => {
                metrics::counter!(m::ACCESS_LOG_RECORDS_FORWARDED_TOTAL, m::LABEL_ENTRY_KIND => kind)
                    .increment(1);
                Ok(())
            }
            Err(e) => {
                metrics::counter!(m::ACCESS_LOG_RECORDS_DROPPED_TOTAL, m::LABEL_REASON => e.drop_reason())
                    .increment(1);
                Err(e)
            }
        }
    }
}

// ─── Server ──────────────────────────────────────────────────────────

/// 구조화 접근 로그 스트림 서버
///
/// 동시에 여러 스트림을 처리할 수 있으며, 모든 스트림이 하나의
/// [`SenderRegistry`]를 공유합니다.
#[derive(Clone)]
pub struct AccessLogServer {
    registry: Arc<SenderRegistry>,
}

impl AccessLogServer {
    /// 전송기 레지스트리를 공유하는 서버를 생성합니다.
    pub fn new(registry: Arc<SenderRegistry>) -> Self {
        Self { registry }
    }

    /// 공유 전송기 레지스트리를 반환합니다.
    pub fn registry(&self) -> Arc<SenderRegistry> {
        Arc::clone(&self.registry)
    }

    /// 스트림 하나를 끝까지 처리합니다.
    ///
    /// 상대가 스트림을 정상 종료하면 `Ok(())`를 반환합니다. 첫 메시지에
    /// identifier가 없거나, log name이 잘못되었거나, 전송이 실패하면 에러를 반환합니다.
    /// 한 스트림의 실패는 다른 스트림에 영향을 주지 않습니다.
    pub async fn stream_access_logs<S, E>(&self, stream: S) -> Result<(), StreamerError>
    where
        S: Stream<Item = Result<StreamAccessLogsMessage, E>>,
        E: fmt::Display,
    {
        metrics::counter!(m::ACCESS_LOG_STREAMS_TOTAL).increment(1);
        debug!("access log stream opened");

        match self.consume(stream).await {
            Ok(()) => {
                debug!("access log stream closed");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "access log stream failed");
                metrics::counter!(m::ACCESS_LOG_STREAM_ERRORS_TOTAL).increment(1);
                Err(e)
            }
        }
    }

    async fn consume<S, E>(&self, stream: S) -> Result<(), StreamerError>
    where
        S: Stream<Item = Result<StreamAccessLogsMessage, E>>,
        E: fmt::Display,
    {
        let mut stream = pin!(stream);
        let mut handler: Option<StreamHandler> = None;

        while let Some(item) = stream.next().await {
            let message = item.map_err(|e| StreamerError::Stream(e.to_string()))?;

            if handler.is_none() {
                let identifier = message.identifier.as_ref().ok_or_else(|| {
                    StreamerError::Protocol("first message has no identifier".to_owned())
                })?;
                let created = StreamHandler::from_log_name(&identifier.log_name)?;
                info!(address = %created.address, "access log stream bound to address");
                handler = Some(created);
            }

            if let Some(active) = &handler {
                active.handle(&self.registry, &message.log_entries).await?;
            }
        }

        Ok(())
    }
}
