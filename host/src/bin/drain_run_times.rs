use anyhow::Context as _;
use clap::Parser;
use eas_broker::drain;
use eas_host::cli::DrainArgs;
use eas_host::Context;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = DrainArgs::parse();
    let _log_guard = eas_host::logging::init(&args.log_level, "logs");

    let context = Context::load(&args.config)
        .await
        .context("failed to load engine configuration / connect to store")?;

    tracing::info!("starting run_times telemetry drain");
    drain::run_run_times_drain(&context.config.broker_url, &context.store).await;
}
