use anyhow::Result;
use clap::Parser;
use octelium_idp_sync::{
    cli::Cli,
    config::Config,
    provider::create_provider,
    sync::{reporter::TracingReporter, SyncService},
    telemetry,
};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env_with_overrides(&cli.overrides())?;

    telemetry::init(&config.telemetry);
    config.validate()?;

    info!(provider = %config.provider, dry_run = config.sync.dry_run, "Starting IdP sync");

    let provider = create_provider(&config)?;
    let service = SyncService::from_config(&config.sync, Arc::new(TracingReporter))?;

    service.run(provider.as_ref()).await?;

    Ok(())
}
