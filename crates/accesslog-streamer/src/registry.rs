//! 목적지 주소별 전송기 레지스트리
//!
//! 주소 하나당 [`LogSender`]는 최대 하나만 존재합니다. 조회는 읽기 잠금으로
//! 동시에 진행되고, 삽입과 제거는 쓰기 잠금으로 배타적입니다.
//! 같은 주소로 향하는 동시 전송은 전송기 단위 mutex에서 직렬화되므로
//! 연결이 두 번 열리지 않습니다.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use kuma_dp_core::metrics as m;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::config::DEFAULT_CONNECT_TIMEOUT_SECS;
use crate::error::StreamerError;
use crate::sender::{LogSender, SenderState};

/// 레지스트리가 보관하는 공유 전송기
pub type SharedSender = Arc<Mutex<LogSender>>;

/// 주소 → 전송기 맵
pub struct SenderRegistry {
    senders: RwLock<HashMap<String, SharedSender>>,
    connect_timeout: Duration,
}

impl SenderRegistry {
    /// 새 전송기가 사용할 연결 타임아웃을 지정하여 레지스트리를 생성합니다.
    pub fn new(connect_timeout: Duration) -> Self {
        Self {
            senders: RwLock::new(HashMap::new()),
            connect_timeout,
        }
    }

    /// 주소에 해당하는 전송기를 반환하고, 없으면 연결하지 않은 전송기를 등록합니다.
    pub async fn get_or_create(&self, address: &str) -> SharedSender {
        if let Some(sender) = self.senders.read().await.get(address) {
            return Arc::clone(sender);
        }

        let mut senders = self.senders.write().await;
        let sender = senders
            .entry(address.to_owned())
            .or_insert_with(|| {
                debug!(address, "registering access log sender");
                Arc::new(Mutex::new(LogSender::with_timeout(
                    address,
                    self.connect_timeout,
                )))
            })
            .clone();
        metrics::gauge!(m::ACCESS_LOG_ACTIVE_SENDERS).set(senders.len() as f64);
        sender
    }

    /// 레코드를 주소의 전송기로 보냅니다.
    ///
    /// 필요하면 먼저 연결합니다. 연결 또는 전송이 실패하면 전송기를 닫고
    /// 레지스트리에서 제거한 뒤 에러를 반환합니다. 다음 레코드는 새 연결을 시도합니다.
    /// 재시도는 하지 않으므로 실패한 레코드는 호출자가 드롭합니다.
    pub async fn send(&self, address: &str, record: &[u8]) -> Result<(), StreamerError> {
        let shared = self.get_or_create(address).await;
        let mut sender = shared.lock().await;

        // 앞선 호출이 실패해서 닫은 전송기를 기다린 경우
        if sender.state() == SenderState::Closed {
            return Err(StreamerError::Closed {
                address: address.to_owned(),
            });
        }

        if !sender.is_connected() {
            if let Err(e) = sender.connect().await {
                metrics::counter!(m::ACCESS_LOG_CONNECT_FAILURES_TOTAL).increment(1);
                Self::close_sender(&mut sender).await;
                drop(sender);
                self.remove_if_same(address, &shared).await;
                return Err(e);
            }
        }

        if let Err(e) = sender.send(record).await {
            Self::close_sender(&mut sender).await;
            drop(sender);
            self.remove_if_same(address, &shared).await;
            return Err(e);
        }

        Ok(())
    }

    /// 주소의 전송기를 제거하고 닫습니다. 제거했으면 `true`를 반환합니다.
    pub async fn evict(&self, address: &str) -> bool {
        let removed = {
            let mut senders = self.senders.write().await;
            let removed = senders.remove(address);
            metrics::gauge!(m::ACCESS_LOG_ACTIVE_SENDERS).set(senders.len() as f64);
            removed
        };

        match removed {
            Some(shared) => {
                Self::close_sender(&mut *shared.lock().await).await;
                true
            }
            None => false,
        }
    }

    /// 모든 전송기를 닫고 레지스트리를 비웁니다.
    pub async fn close_all(&self) {
        let drained: Vec<(String, SharedSender)> = {
            let mut senders = self.senders.write().await;
            metrics::gauge!(m::ACCESS_LOG_ACTIVE_SENDERS).set(0.0);
            senders.drain().collect()
        };

        let count = drained.len();
        for (_, shared) in drained {
            Self::close_sender(&mut *shared.lock().await).await;
        }
        debug!(count, "closed all access log senders");
    }

    /// 등록된 전송기 수를 반환합니다.
    pub async fn len(&self) -> usize {
        self.senders.read().await.len()
    }

    /// 등록된 전송기가 없는지 확인합니다.
    pub async fn is_empty(&self) -> bool {
        self.senders.read().await.is_empty()
    }

    /// 주소에 전송기가 등록되어 있는지 확인합니다.
    pub async fn contains(&self, address: &str) -> bool {
        self.senders.read().await.contains_key(address)
    }

    /// 다른 호출이 이미 새 전송기로 바꿔 넣었다면 건드리지 않는다.
    async fn remove_if_same(&self, address: &str, shared: &SharedSender) {
        let mut senders = self.senders.write().await;
        if senders
            .get(address)
            .is_some_and(|current| Arc::ptr_eq(current, shared))
        {
            senders.remove(address);
            debug!(address, "evicted access log sender");
        }
        metrics::gauge!(m::ACCESS_LOG_ACTIVE_SENDERS).set(senders.len() as f64);
    }

    async fn close_sender(sender: &mut LogSender) {
        if let Err(e) = sender.close().await {
            debug!(address = sender.address(), error = %e, "failed to close access log sender");
        }
    }
}

impl Default for SenderRegistry {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS))
    }
}
