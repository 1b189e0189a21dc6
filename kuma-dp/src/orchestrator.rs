//! Component orchestration -- assembly and lifecycle management.
//!
//! The [`Orchestrator`] is the central coordinator of `kuma-dp`.
//! It validates configuration, builds the enabled components, starts them,
//! waits for a shutdown signal, and stops them again.
//!
//! # Shared sender registry
//!
//! The named-pipe streamer and the structured-stream server share one
//! [`SenderRegistry`], so each collector address has at most one TCP
//! connection across the whole daemon.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use tokio::sync::broadcast;

use kuma_accesslog_streamer::{AccessLogServer, AccessLogStreamer, SenderRegistry, StreamerConfig};
use kuma_dp_core::component::{ComponentInfo, ComponentRegistry};
use kuma_dp_core::config::KumaDpConfig;

use crate::health::{ComponentHealth, DaemonHealth, aggregate_status};
use crate::metrics_server;
use crate::pid_file::{remove_pid_file, write_pid_file};

/// Registered name of the named-pipe access log streamer.
pub const ACCESS_LOG_STREAMER: &str = "access-log-streamer";

/// Interval between uptime gauge updates.
const UPTIME_UPDATE_INTERVAL: Duration = Duration::from_secs(10);

/// The main daemon orchestrator.
pub struct Orchestrator {
    /// Loaded and validated configuration.
    config: KumaDpConfig,
    /// Registered components (started and stopped in order).
    components: ComponentRegistry,
    /// Destination senders shared by every access log path.
    senders: Arc<SenderRegistry>,
    /// Shutdown broadcast sender (signals background tasks).
    shutdown_tx: broadcast::Sender<()>,
    /// Daemon start time (for uptime reporting).
    start_time: Instant,
}

impl Orchestrator {
    /// Load `kuma-dp.toml`, apply environment overrides, and build the orchestrator.
    pub async fn build(config_path: &Path) -> Result<Self> {
        let config = KumaDpConfig::load(config_path)
            .await
            .map_err(|e| anyhow::anyhow!("failed to load config: {}", e))?;
        Self::build_from_config(config).await
    }

    /// Build from an already-loaded configuration.
    pub async fn build_from_config(config: KumaDpConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("config validation failed: {}", e))?;

        if config.metrics.enabled {
            metrics_server::install_metrics_recorder(&config.metrics)?;
        }

        let streamer_config = StreamerConfig::from_core(&config.access_logs);
        let senders = Arc::new(SenderRegistry::new(streamer_config.connect_timeout()));
        let (shutdown_tx, _) = broadcast::channel(4);
        let mut components = ComponentRegistry::new();

        if config.access_logs.enabled {
            tracing::info!(
                pipe_path = %config.access_logs.pipe_path,
                "initializing access log streamer"
            );
            let streamer = AccessLogStreamer::builder()
                .config(streamer_config)
                .registry(Arc::clone(&senders))
                .build()
                .map_err(|e| anyhow::anyhow!("failed to build access log streamer: {}", e))?;
            components.register(
                ComponentInfo::new(
                    ACCESS_LOG_STREAMER,
                    "forwards Envoy access log records from a named pipe to TCP collectors",
                ),
                Box::new(streamer),
            )?;
        }

        tracing::info!(total_components = components.count(), "orchestrator initialized");

        if config.metrics.enabled {
            record_daemon_metrics(components.count());
        }

        Ok(Self {
            config,
            components,
            senders,
            shutdown_tx,
            start_time: Instant::now(),
        })
    }

    /// A structured-stream server sharing this daemon's sender registry.
    ///
    /// The transport layer hands each decoded stream to
    /// [`AccessLogServer::stream_access_logs`].
    pub fn access_log_server(&self) -> AccessLogServer {
        AccessLogServer::new(Arc::clone(&self.senders))
    }

    /// Start all components and block until SIGTERM or SIGINT.
    pub async fn run(&mut self) -> Result<()> {
        self.run_until(wait_for_shutdown_signal()).await
    }

    /// Start all components and block until `shutdown` resolves.
    ///
    /// Components are stopped and the PID file is removed even when
    /// `shutdown` resolves to an error.
    pub async fn run_until<F>(&mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = Result<&'static str>>,
    {
        let pid_path = (!self.config.general.pid_file.is_empty())
            .then(|| PathBuf::from(&self.config.general.pid_file));
        if let Some(path) = &pid_path {
            write_pid_file(path)?;
        }

        tracing::info!("starting all components");
        if let Err(e) = self.components.start_all().await {
            tracing::warn!("startup failed, rolling back already-started components");
            if let Err(stop_err) = self.components.stop_all().await {
                tracing::error!(
                    startup_error = %e,
                    rollback_error = %stop_err,
                    "rollback also failed during startup failure cleanup"
                );
            }
            if let Some(path) = &pid_path {
                remove_pid_file(path);
            }
            return Err(e.into());
        }

        let uptime_task = self
            .config
            .metrics
            .enabled
            .then(|| spawn_uptime_updater(self.start_time, self.shutdown_tx.subscribe()));

        tracing::info!("kuma-dp running");
        let signal = shutdown.await;
        match &signal {
            Ok(name) => tracing::info!(signal = name, "shutdown signal received"),
            Err(e) => tracing::error!(error = %e, "shutdown signal handling failed"),
        }

        let _ = self.shutdown_tx.send(());
        if let Some(task) = uptime_task {
            let _ = task.await;
        }

        let stopped = self.shutdown().await;
        // components leave the shared registry open
        self.senders.close_all().await;

        if let Some(path) = &pid_path {
            remove_pid_file(path);
        }

        stopped?;
        signal.map(|_| ())
    }

    /// Stop every running component in registration order.
    async fn shutdown(&mut self) -> Result<()> {
        tracing::info!("stopping all components");
        self.components.stop_all().await.map_err(|e| e.into())
    }

    /// Get the current aggregated health status.
    pub async fn health(&self) -> DaemonHealth {
        let components: Vec<ComponentHealth> = self
            .components
            .health_check_all()
            .await
            .into_iter()
            .map(|(name, state, status)| ComponentHealth {
                name,
                state,
                status,
            })
            .collect();

        DaemonHealth {
            status: aggregate_status(&components),
            uptime_secs: self.start_time.elapsed().as_secs(),
            components,
        }
    }

    /// Get a reference to the loaded configuration.
    pub fn config(&self) -> &KumaDpConfig {
        &self.config
    }
}

/// Wait for a shutdown signal (SIGTERM or SIGINT).
///
/// Returns the name of the signal that triggered the shutdown.
pub async fn wait_for_shutdown_signal() -> Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("failed to install SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("failed to install SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Record daemon-level metrics (build info, registered components).
fn record_daemon_metrics(component_count: usize) {
    use kuma_dp_core::metrics as m;

    metrics::gauge!(m::DAEMON_BUILD_INFO, "version" => env!("CARGO_PKG_VERSION")).set(1.0);
    #[allow(clippy::cast_precision_loss)]
    metrics::gauge!(m::DAEMON_COMPONENTS_REGISTERED).set(component_count as f64);
}

/// Spawn a background task that periodically updates the uptime gauge.
fn spawn_uptime_updater(
    start_time: Instant,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> tokio::task::JoinHandle<()> {
    use kuma_dp_core::metrics as m;

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(UPTIME_UPDATE_INTERVAL);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    #[allow(clippy::cast_precision_loss)]
                    metrics::gauge!(m::DAEMON_UPTIME_SECONDS).set(start_time.elapsed().as_secs() as f64);
                }
                _ = shutdown_rx.recv() => {
                    tracing::debug!("uptime updater shutting down");
                    break;
                }
            }
        }
    })
}
