//! 목적지별 TCP 전송기
//!
//! [`LogSender`]는 하나의 목적지 주소에 대한 TCP 연결을 소유합니다.
//! 연결 실패나 전송 실패 시 재시도하지 않으며, 재연결 여부는 호출자가 결정합니다.
//! 연결과 레코드 하나의 전송은 각각 같은 타임아웃으로 제한됩니다. 레코드 전송이
//! 타임아웃되면 일부만 쓰였을 수 있으므로 호출자는 전송기를 닫아야 합니다.

use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

use crate::config::DEFAULT_CONNECT_TIMEOUT_SECS;
use crate::error::StreamerError;

/// 전송기 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SenderState {
    /// 아직 연결하지 않음
    Disconnected,
    /// 연결됨
    Connected,
    /// 닫힘 (재사용 불가)
    Closed,
}

/// 하나의 목적지로 레코드 바이트를 그대로 전송하는 TCP 클라이언트
#[derive(Debug)]
pub struct LogSender {
    address: String,
    timeout: Duration,
    stream: Option<TcpStream>,
    state: SenderState,
}

impl LogSender {
    /// 기본 연결 타임아웃(5초)으로 전송기를 생성합니다. 연결은 하지 않습니다.
    pub fn new(address: impl Into<String>) -> Self {
        Self::with_timeout(address, Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS))
    }

    /// 연결 및 전송 타임아웃을 지정하여 전송기를 생성합니다.
    pub fn with_timeout(address: impl Into<String>, timeout: Duration) -> Self {
        Self {
            address: address.into(),
            timeout,
            stream: None,
            state: SenderState::Disconnected,
        }
    }

    /// 목적지 주소를 반환합니다.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// 현재 상태를 반환합니다.
    pub fn state(&self) -> SenderState {
        self.state
    }

    /// 연결되어 있는지 확인합니다.
    pub fn is_connected(&self) -> bool {
        self.state == SenderState::Connected
    }

    /// 목적지에 TCP 연결을 엽니다.
    ///
    /// 이미 연결되어 있으면 아무것도 하지 않습니다.
    /// 닫힌 전송기는 다시 연결할 수 없습니다.
    pub async fn connect(&mut self) -> Result<(), StreamerError> {
        match self.state {
            SenderState::Connected => return Ok(()),
            SenderState::Closed => {
                return Err(StreamerError::Closed {
                    address: self.address.clone(),
                });
            }
            SenderState::Disconnected => {}
        }

        let stream = match timeout(self.timeout, TcpStream::connect(&self.address)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                return Err(StreamerError::Connect {
                    address: self.address.clone(),
                    reason: e.to_string(),
                });
            }
            Err(_) => {
                return Err(StreamerError::Connect {
                    address: self.address.clone(),
                    reason: format!("timed out after {:?}", self.timeout),
                });
            }
        };

        if let Err(e) = stream.set_nodelay(true) {
            debug!(address = %self.address, error = %e, "failed to set TCP_NODELAY");
        }

        debug!(address = %self.address, "connected to access log address");
        self.stream = Some(stream);
        self.state = SenderState::Connected;
        Ok(())
    }

    /// 레코드 바이트를 프레이밍 없이 그대로 전송합니다.
    ///
    /// 타임아웃 안에 다 쓰지 못하면 [`StreamerError::Send`]를 반환합니다.
    pub async fn send(&mut self, record: &[u8]) -> Result<(), StreamerError> {
        let Some(stream) = self.stream.as_mut() else {
            return Err(match self.state {
                SenderState::Closed => StreamerError::Closed {
                    address: self.address.clone(),
                },
                _ => StreamerError::NotConnected {
                    address: self.address.clone(),
                },
            });
        };

        let write = async {
            stream.write_all(record).await?;
            stream.flush().await
        };

        match timeout(self.timeout, write).await {
            Ok(result) => result.map_err(|e| StreamerError::Send {
                address: self.address.clone(),
                reason: e.to_string(),
            }),
            Err(_) => Err(StreamerError::Send {
                address: self.address.clone(),
                reason: format!("write timed out after {:?}", self.timeout),
            }),
        }
    }

    /// 연결을 닫습니다. 여러 번 호출해도 안전합니다.
    pub async fn close(&mut self) -> Result<(), StreamerError> {
        self.state = SenderState::Closed;
        let Some(mut stream) = self.stream.take() else {
            return Ok(());
        };

        // 상대가 먼저 끊은 경우 shutdown 실패는 무시한다
        if let Err(e) = stream.shutdown().await {
            debug!(address = %self.address, error = %e, "shutdown on close failed");
        }
        debug!(address = %self.address, "closed access log sender");
        Ok(())
    }
}
