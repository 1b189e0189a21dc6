//! CLI argument definitions for kuma-dp.
//!
//! Uses `clap` v4 derive macros to parse command-line arguments.

use std::path::PathBuf;

use clap::Parser;
use kuma_dp_core::config::KumaDpConfig;

/// Kuma data-plane companion daemon.
///
/// Receives Envoy access logs on a named pipe and forwards each record
/// to the TCP log collector named in the record.
#[derive(Parser, Debug)]
#[command(name = "kuma-dp")]
#[command(version, about, long_about = None)]
pub struct DaemonCli {
    /// Path to kuma-dp.toml configuration file.
    #[arg(short, long, default_value = "/etc/kuma-dp/kuma-dp.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Override log format (json, pretty).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_format: Option<String>,

    /// Override the access log named pipe path.
    #[arg(long)]
    pub pipe_path: Option<String>,

    /// Override PID file path (takes precedence over config file).
    #[arg(long)]
    pub pid_file: Option<String>,

    /// Validate configuration file and exit without starting the daemon.
    #[arg(long)]
    pub validate: bool,
}

impl DaemonCli {
    /// Apply CLI overrides on top of a loaded configuration.
    pub fn apply_overrides(&self, config: &mut KumaDpConfig) {
        if let Some(level) = &self.log_level {
            config.general.log_level = level.clone();
        }
        if let Some(format) = &self.log_format {
            config.general.log_format = format.clone();
        }
        if let Some(path) = &self.pipe_path {
            config.access_logs.pipe_path = path.clone();
        }
        if let Some(path) = &self.pid_file {
            config.general.pid_file = path.clone();
        }
    }
}
