//! Tracing setup for kuma-dp.
//!
//! `general.log_level` applies to the kuma-dp crates only. Everything else
//! (tokio, the Prometheus exporter) stays at `warn` unless `RUST_LOG` says
//! otherwise. A valid `RUST_LOG` replaces the configured filter entirely.

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use kuma_dp_core::config::GeneralConfig;

/// Crates whose level follows `general.log_level`.
const KUMA_DP_TARGETS: &[&str] = &[
    "kuma_dp",
    "kuma_dp_core",
    "kuma_accesslog_streamer",
    "kuma_accesslog_format",
];

/// Level for every target not listed in [`KUMA_DP_TARGETS`].
const DEPENDENCY_LEVEL: &str = "warn";

/// Output encoding of the fmt layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per line.
    Json,
    /// Multi-line human-readable output.
    Pretty,
}

impl LogFormat {
    /// Parse `general.log_format`.
    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            other => anyhow::bail!("unknown log format '{other}', expected 'json' or 'pretty'"),
        }
    }
}

/// Filter directives derived from the config, e.g.
/// `warn,kuma_dp=info,kuma_dp_core=info,...`.
pub fn default_directives(log_level: &str) -> String {
    let mut directives = DEPENDENCY_LEVEL.to_owned();
    for target in KUMA_DP_TARGETS {
        directives.push_str(&format!(",{target}={log_level}"));
    }
    directives
}

/// Build the filter. `rust_log` wins when it is set and parses.
pub fn build_filter(config: &GeneralConfig, rust_log: Option<&str>) -> Result<EnvFilter> {
    if let Some(filter) = rust_log
        .filter(|value| !value.trim().is_empty())
        .and_then(|value| EnvFilter::try_new(value).ok())
    {
        return Ok(filter);
    }

    EnvFilter::try_new(default_directives(&config.log_level))
        .with_context(|| format!("invalid log level '{}'", config.log_level))
}

/// Install the global tracing subscriber. Call once, before any spans are entered.
pub fn init_tracing(config: &GeneralConfig) -> Result<()> {
    let format = LogFormat::parse(&config.log_format)?;
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = build_filter(config, rust_log.as_deref())?;

    // exactly one of the two layers is present
    let json = (format == LogFormat::Json).then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(false)
    });
    let pretty =
        (format == LogFormat::Pretty).then(|| tracing_subscriber::fmt::layer().pretty());

    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(pretty)
        .try_init()
        .context("failed to install tracing subscriber")
}
