pub mod cli;
pub mod descriptor;
pub mod error;
pub mod logging;

pub use error::{HostError, HostResult};

use eas_broker::sinks::{BrokerResultSink, BrokerRunTimeSink, LogResultSink, LogRunTimeSink, ResultSink, RunTimeSink};
use eas_engine::runner::TaskRunner;
use eas_engine::synth::Deterministic;
use eas_lib::config::EngineConfig;
use eas_store::MetadataStore;
use std::sync::Arc;

/// Process-wide, immutable once built (spec.md §5 shared-resource policy).
pub struct Context {
    pub config: EngineConfig,
    pub store: MetadataStore,
}

impl Context {
    pub async fn load(config_path: &str) -> HostResult<Self> {
        let config = EngineConfig::from_file(config_path)?;
        let store = MetadataStore::connect(&config.store_dsn, &config.archive_root).await?;
        Ok(Context { config, store })
    }

    /// Telemetry sinks for local-mode dispatch: `log`, per spec.md §4.8.
    pub fn log_sinks(&self) -> (Arc<dyn RunTimeSink>, Arc<dyn ResultSink>) {
        (Arc::new(LogRunTimeSink), Arc::new(LogResultSink))
    }

    /// Telemetry sinks for cluster-mode dispatch: `broker`.
    pub fn broker_sinks(&self) -> (Arc<dyn RunTimeSink>, Arc<dyn ResultSink>) {
        (
            Arc::new(BrokerRunTimeSink::new(self.config.broker_url.clone())),
            Arc::new(BrokerResultSink::new(self.config.broker_url.clone())),
        )
    }

    pub fn task_runner(&self, run_time_sink: Arc<dyn RunTimeSink>, result_sink: Arc<dyn ResultSink>) -> TaskRunner {
        TaskRunner::new(
            self.config.archive_root.clone(),
            run_time_sink,
            result_sink,
            Arc::new(Deterministic),
        )
    }
}
