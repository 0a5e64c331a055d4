//! Shared fixtures for the scenario tests in `host/tests/` (spec.md §8,
//! S1-S6). In-process only: no broker, no Postgres — the Task Runner and
//! Iteration Expander are exercised directly against recording sinks.

#![allow(dead_code)]

use eas_broker::error::BrokerResult;
use eas_broker::sinks::{ResultSink, RunTimeSink};
use eas_engine::runner::TaskRunner;
use eas_engine::synth::Deterministic;
use eas_lib::telemetry::{ResultRecord, RunTimeRecord};
use std::sync::{Arc, Mutex};

pub struct NullRunTimeSink;

#[async_trait::async_trait]
impl RunTimeSink for NullRunTimeSink {
    async fn record(&self, _record: &RunTimeRecord) -> BrokerResult<()> {
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingResultSink {
    pub records: Mutex<Vec<ResultRecord>>,
}

#[async_trait::async_trait]
impl ResultSink for RecordingResultSink {
    async fn record(&self, record: &ResultRecord) -> BrokerResult<()> {
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}

/// A runner over a fresh archive root, with a recording result sink the
/// test can inspect afterwards.
pub fn runner_with_recorder(archive_root: impl Into<std::path::PathBuf>) -> (TaskRunner, Arc<RecordingResultSink>) {
    let result_sink = Arc::new(RecordingResultSink::default());
    let runner = TaskRunner::new(
        archive_root,
        Arc::new(NullRunTimeSink),
        result_sink.clone(),
        Arc::new(Deterministic),
    );
    (runner, result_sink)
}
