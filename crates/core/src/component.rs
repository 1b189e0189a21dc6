//! 컴포넌트 레지스트리: 등록 순서대로 시작하고 정지합니다.
//!
//! kuma-dp는 몇 개의 장기 실행 컴포넌트(접근 로그 스트리머 등)로 구성됩니다.
//! [`ComponentRegistry`]는 이들을 등록 순서대로 시작하고, 종료 시
//! 실행 중인 컴포넌트만 정지하며 정지 에러를 모아서 보고합니다.
//!
//! # 상태 전환
//! ```text
//! Created → start() → Running → stop() → Stopped
//!              └─ 에러 → Failed
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ComponentError, KumaDpError};
use crate::pipeline::{DynPipeline, HealthStatus};

// ─── ComponentInfo ───────────────────────────────────────────────────

/// 컴포넌트 메타데이터
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentInfo {
    /// 고유 이름 (예: `"access-log-streamer"`)
    pub name: String,
    /// 설명
    pub description: String,
}

impl ComponentInfo {
    /// 새 메타데이터를 생성합니다.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

// ─── ComponentState ──────────────────────────────────────────────────

/// 컴포넌트 생명주기 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComponentState {
    /// 등록됨 (시작 전)
    Created,
    /// 실행 중
    Running,
    /// 정지됨
    Stopped,
    /// 시작 또는 정지 실패
    Failed,
}

impl fmt::Display for ComponentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Running => write!(f, "running"),
            Self::Stopped => write!(f, "stopped"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

// ─── ComponentRegistry ───────────────────────────────────────────────

struct Registered {
    info: ComponentInfo,
    state: ComponentState,
    component: Box<dyn DynPipeline>,
}

/// 컴포넌트 레지스트리
///
/// # 사용 예시
/// ```ignore
/// let mut registry = ComponentRegistry::new();
/// registry.register(ComponentInfo::new("access-log-streamer", "..."), Box::new(streamer))?;
///
/// registry.start_all().await?;
/// // ... 실행 중 ...
/// registry.stop_all().await?;
/// ```
pub struct ComponentRegistry {
    components: Vec<Registered>,
}

impl ComponentRegistry {
    /// 빈 레지스트리를 생성합니다.
    pub fn new() -> Self {
        Self {
            components: Vec::new(),
        }
    }

    /// 컴포넌트를 등록합니다.
    ///
    /// 같은 이름이 이미 있으면 에러를 반환합니다.
    pub fn register(
        &mut self,
        info: ComponentInfo,
        component: Box<dyn DynPipeline>,
    ) -> Result<(), KumaDpError> {
        if self.components.iter().any(|c| c.info.name == info.name) {
            return Err(ComponentError::AlreadyRegistered { name: info.name }.into());
        }
        self.components.push(Registered {
            info,
            state: ComponentState::Created,
            component,
        });
        Ok(())
    }

    /// 이름으로 컴포넌트 상태를 조회합니다.
    pub fn state(&self, name: &str) -> Result<ComponentState, KumaDpError> {
        self.components
            .iter()
            .find(|c| c.info.name == name)
            .map(|c| c.state)
            .ok_or_else(|| {
                ComponentError::NotFound {
                    name: name.to_owned(),
                }
                .into()
            })
    }

    /// 모든 컴포넌트를 등록 순서대로 시작합니다.
    ///
    /// 첫 번째 실패 시 즉시 반환합니다. 이미 시작된 컴포넌트는 그대로
    /// 남으므로 호출자가 `stop_all`로 롤백해야 합니다.
    pub async fn start_all(&mut self) -> Result<(), KumaDpError> {
        for entry in &mut self.components {
            tracing::debug!(component = %entry.info.name, "starting component");
            match entry.component.start().await {
                Ok(()) => entry.state = ComponentState::Running,
                Err(e) => {
                    entry.state = ComponentState::Failed;
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    /// 실행 중인 컴포넌트를 등록 순서대로 정지합니다.
    ///
    /// 개별 정지 실패 시에도 나머지를 계속 정지하고, 에러를 모아 반환합니다.
    pub async fn stop_all(&mut self) -> Result<(), KumaDpError> {
        let mut errors = Vec::new();
        for entry in &mut self.components {
            if entry.state != ComponentState::Running {
                continue;
            }
            tracing::debug!(component = %entry.info.name, "stopping component");
            match entry.component.stop().await {
                Ok(()) => entry.state = ComponentState::Stopped,
                Err(e) => {
                    entry.state = ComponentState::Failed;
                    errors.push(format!("{}: {}", entry.info.name, e));
                }
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ComponentError::StopFailed(errors.join("; ")).into())
        }
    }

    /// 등록된 컴포넌트 수를 반환합니다.
    pub fn count(&self) -> usize {
        self.components.len()
    }

    /// 등록된 모든 컴포넌트의 메타데이터를 반환합니다.
    pub fn list(&self) -> Vec<&ComponentInfo> {
        self.components.iter().map(|c| &c.info).collect()
    }

    /// 모든 컴포넌트의 건강 상태를 조회합니다.
    pub async fn health_check_all(&self) -> Vec<(String, ComponentState, HealthStatus)> {
        let mut statuses = Vec::with_capacity(self.components.len());
        for entry in &self.components {
            let health = entry.component.health_check().await;
            statuses.push((entry.info.name.clone(), entry.state, health));
        }
        statuses
    }
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
