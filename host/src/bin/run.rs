use anyhow::Context as _;
use clap::Parser;
use eas_engine::dispatch::{self, DispatchMode};
use eas_host::cli::{Mode, RunArgs};
use eas_host::descriptor;
use eas_host::Context;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = RunArgs::parse();
    let _log_guard = eas_host::logging::init(&args.log_level, "logs");

    let context = Context::load(&args.config)
        .await
        .context("failed to load engine configuration / connect to store")?;

    let task_lists = descriptor::expand_from_file(&args.tasks).context("failed to expand job descriptor")?;
    tracing::info!(count = task_lists.len(), "expanded job descriptor into task lists");

    match args.mode {
        Mode::Local => {
            let (run_time_sink, result_sink) = context.log_sinks();
            let mut runner = Some(context.task_runner(run_time_sink, result_sink));
            dispatch::dispatch(&DispatchMode::Local, task_lists, &mut runner).await?;
        }
        Mode::Cluster => {
            let mode = DispatchMode::Cluster {
                broker_url: context.config.broker_url.clone(),
            };
            dispatch::dispatch(&mode, task_lists, &mut None).await?;
        }
    }

    Ok(())
}
