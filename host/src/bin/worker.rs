//! Worker Loop entry point (spec.md §4.9): pulls one task list at a time
//! from the `tasks` queue, runs it, and returns to the pool. Runs until
//! SIGINT.

use anyhow::Context as _;
use clap::Parser;
use eas_engine::worker::WorkerLoop;
use eas_host::cli::DrainArgs;
use eas_host::Context;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = DrainArgs::parse();
    let _log_guard = eas_host::logging::init(&args.log_level, "logs");

    let context = Context::load(&args.config)
        .await
        .context("failed to load engine configuration / connect to store")?;

    let (run_time_sink, result_sink) = context.broker_sinks();
    let runner = context.task_runner(run_time_sink, result_sink);
    let mut worker = WorkerLoop::new(context.config.broker_url.clone(), runner);

    tokio::select! {
        result = worker.run() => result.context("worker loop exited with an error")?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("received SIGINT, shutting down worker");
        }
    }

    Ok(())
}
