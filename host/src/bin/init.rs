use anyhow::Context as _;
use clap::Parser;
use eas_host::cli::InitArgs;
use eas_lib::config::EngineConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = InitArgs::parse();
    let _log_guard = eas_host::logging::init(&args.log_level, "logs");

    let config = EngineConfig::from_file(&args.config).context("failed to load engine configuration")?;
    let store = eas_store::MetadataStore::connect(&config.store_dsn, &config.archive_root)
        .await
        .context("failed to connect to the metadata store")?;

    store
        .ensure_schema(args.refresh)
        .await
        .context("failed to ensure metadata store schema")?;

    tracing::info!(refreshed = args.refresh, "metadata store schema ready");
    Ok(())
}
