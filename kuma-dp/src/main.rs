use anyhow::Result;
use clap::Parser;

use kuma_dp::cli::DaemonCli;
use kuma_dp::logging::init_tracing;
use kuma_dp::orchestrator::Orchestrator;
use kuma_dp_core::config::KumaDpConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = DaemonCli::parse();

    // file -> env overrides -> CLI overrides -> validate
    let mut config = KumaDpConfig::from_file(&cli.config)
        .await
        .map_err(|e| anyhow::anyhow!("failed to load config {}: {}", cli.config.display(), e))?;
    config.apply_env_overrides();
    cli.apply_overrides(&mut config);
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("config validation failed: {}", e))?;

    if cli.validate {
        println!("configuration OK: {}", cli.config.display());
        return Ok(());
    }

    init_tracing(&config.general)?;
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %cli.config.display(),
        "kuma-dp starting"
    );

    let mut orchestrator = Orchestrator::build_from_config(config).await?;
    orchestrator.run().await?;

    tracing::info!("kuma-dp shut down");
    Ok(())
}
