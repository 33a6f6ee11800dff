use anyhow::{Context, Result};
use clap::Parser;
use datahub::cli::{Cli, Command};
use datahub::config::Settings;
use datahub_store::{StorageKey, StoreManager};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load(&cli.config, &cli.overrides)
        .with_context(|| format!("loading configuration from {}", cli.config.display()))?;

    match cli.command {
        Command::Key { did } => {
            println!("{}", StorageKey::from_did(&did, settings.key_digest));
            Ok(())
        }
        Command::Serve => serve(settings).await,
    }
}

async fn serve(settings: Settings) -> Result<()> {
    let config = settings.validate()?;

    let env_filter = EnvFilter::builder()
        .with_default_directive(config.log_level.into())
        .from_env_lossy();
    let stderr_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_writer(std::io::stderr)
        .with_filter(env_filter);
    tracing_subscriber::registry().with(stderr_layer).init();

    tracing::info!(
        root = %config.store.storage_root.display(),
        digest = ?config.store.key_digest,
        "starting datahub"
    );

    let store = StoreManager::new(config.store.clone()).context("opening storage root")?;
    datahub::http::run(config, store).await?;

    tracing::info!("datahub stopped");
    Ok(())
}
