//! 생명주기 trait: 장기 실행 컴포넌트의 시작/정지/상태 확인

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::error::KumaDpError;

/// `dyn` 호환 trait에서 사용하는 boxed future
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// 컴포넌트 건강 상태
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthStatus {
    /// 정상
    Healthy,
    /// 동작은 하지만 일부 기능 저하
    Degraded(String),
    /// 비정상
    Unhealthy(String),
}

impl HealthStatus {
    /// 정상 상태인지 확인합니다.
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }

    /// 비정상 상태인지 확인합니다.
    pub fn is_unhealthy(&self) -> bool {
        matches!(self, Self::Unhealthy(_))
    }
}

/// 장기 실행 컴포넌트가 구현하는 생명주기 trait
///
/// `start()`는 백그라운드 태스크를 스폰한 뒤 즉시 반환해야 합니다.
/// `stop()`은 태스크를 정리하고 보유한 리소스(파일, 소켓)를 닫습니다.
pub trait Pipeline: Send + Sync {
    /// 컴포넌트를 시작합니다.
    fn start(&mut self) -> impl Future<Output = Result<(), KumaDpError>> + Send;

    /// 컴포넌트를 정지합니다.
    fn stop(&mut self) -> impl Future<Output = Result<(), KumaDpError>> + Send;

    /// 현재 건강 상태를 반환합니다.
    fn health_check(&self) -> impl Future<Output = HealthStatus> + Send;
}

/// dyn-compatible 생명주기 trait
///
/// `Pipeline`은 RPITIT를 사용하므로 `dyn Pipeline`이 불가합니다.
/// [`ComponentRegistry`](crate::component::ComponentRegistry)는 이 trait으로
/// 서로 다른 컴포넌트를 한 목록에서 관리합니다.
pub trait DynPipeline: Send + Sync {
    /// 컴포넌트를 시작합니다.
    fn start(&mut self) -> BoxFuture<'_, Result<(), KumaDpError>>;

    /// 컴포넌트를 정지합니다.
    fn stop(&mut self) -> BoxFuture<'_, Result<(), KumaDpError>>;

    /// 현재 건강 상태를 반환합니다.
    fn health_check(&self) -> BoxFuture<'_, HealthStatus>;
}

impl<T: Pipeline> DynPipeline for T {
    fn start(&mut self) -> BoxFuture<'_, Result<(), KumaDpError>> {
        Box::pin(Pipeline::start(self))
    }

    fn stop(&mut self) -> BoxFuture<'_, Result<(), KumaDpError>> {
        Box::pin(Pipeline::stop(self))
    }

    fn health_check(&self) -> BoxFuture<'_, HealthStatus> {
        Box::pin(Pipeline::health_check(self))
    }
}
