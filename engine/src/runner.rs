//! Task Runner (spec.md §4.6): executes one `TaskList` sequentially inside a
//! worker, dispatching each `ConcreteTask` by its verb. A failure anywhere
//! in the list is caught at the list scope, restores the working directory,
//! emits one error `ResultRecord`, and aborts the remaining tasks — other
//! task lists are unaffected (spec.md §8 property 7).

use crate::cwd::CwdGuard;
use crate::error::{EngineError, EngineResult};
use crate::synth::Synthesiser;
use crate::tda;
use crate::timer::TaskTimer;
use eas_broker::sinks::{ResultSink, RunTimeSink};
use eas_lib::arena::Arena;
use eas_lib::lightcurve::LightCurveProduct;
use eas_lib::model::{ArtifactHandle, ArtifactSource, ConcreteTask, TaskList};
use eas_lib::resample;
use eas_lib::telemetry::ResultRecord;
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

pub struct TaskRunner {
    arena: Arena,
    run_time_sink: Arc<dyn RunTimeSink>,
    result_sink: Arc<dyn ResultSink>,
    synthesiser: Arc<dyn Synthesiser>,
    /// Archive handles written during the TaskList currently executing;
    /// swept on successful completion when `clean_up` is set (spec.md
    /// §4.6).
    archive_writes: Vec<ArtifactHandle>,
}

impl TaskRunner {
    pub fn new(
        archive_root: impl Into<std::path::PathBuf>,
        run_time_sink: Arc<dyn RunTimeSink>,
        result_sink: Arc<dyn ResultSink>,
        synthesiser: Arc<dyn Synthesiser>,
    ) -> Self {
        TaskRunner {
            arena: Arena::new(archive_root),
            run_time_sink,
            result_sink,
            synthesiser,
            archive_writes: Vec::new(),
        }
    }

    fn track_write(&mut self, handle: &ArtifactHandle) {
        if handle.source == ArtifactSource::Archive {
            self.archive_writes.push(handle.clone());
        }
    }

    /// Runs every task in `list`. On task failure, returns `Ok(())` (the
    /// failure was fully handled as a result record) unless the list itself
    /// could not be set up (e.g. the working directory could not be saved).
    pub async fn run_task_list(&mut self, list: TaskList) -> EngineResult<()> {
        let guard = CwdGuard::enter().map_err(eas_lib::EasError::from)?;
        self.archive_writes.clear();

        for task in &list.task_list {
            if let Err(err) = self.run_one(&list, task).await {
                let record = ResultRecord {
                    job_name: list.job_name.clone(),
                    tda_code: String::new(),
                    target_name: String::new(),
                    task_name: "error_message".to_string(),
                    parameters: list.job_parameters.clone(),
                    timestamp: chrono::Utc::now().timestamp() as f64,
                    result_summary_json: serde_json::json!({ "message": err.to_string() }),
                    extended_artifact_name: None,
                };
                if let Err(send_err) = self.result_sink.record(&record).await {
                    tracing::error!(error = %send_err, "failed to submit error result record");
                }
                self.sweep_archive_writes(&list);
                drop(guard);
                return Ok(());
            }
        }

        self.sweep_archive_writes(&list);
        drop(guard);
        Ok(())
    }

    /// Removes every `archive`-sourced handle written so far this list when
    /// `clean_up` is set (spec.md §4.6 / §8 S4) — run on both the
    /// successful-completion and the per-task-error exit path.
    fn sweep_archive_writes(&mut self, list: &TaskList) {
        if !list.clean_up {
            return;
        }
        for handle in self.archive_writes.drain(..) {
            if let Err(err) = self.arena.remove(&handle) {
                tracing::warn!(error = %err, directory = %handle.directory, filename = %handle.filename, "failed to clean up archive artifact");
            }
        }
    }

    async fn run_one(&mut self, list: &TaskList, task: &ConcreteTask) -> EngineResult<()> {
        let _timer = TaskTimer::start(
            self.run_time_sink.clone(),
            list.job_name.clone(),
            String::new(),
            String::new(),
            task.verb(),
            list.job_parameters.clone(),
        );

        match task {
            ConcreteTask::Null => Ok(()),
            ConcreteTask::Error => Err(EngineError::TaskFailed("forced error task".to_string())),
            ConcreteTask::PslsSynthesise { target, specs } | ConcreteTask::BatmanSynthesise { target, specs } => {
                let raster = self.synthesiser.synthesise(specs)?;
                self.arena.put(target, LightCurveProduct::ArbitraryRaster(raster))?;
                self.track_write(target);
                Ok(())
            }
            ConcreteTask::Multiplication {
                input_1,
                input_2,
                output,
            } => {
                let left = self.arena.get(input_1)?.as_arbitrary_raster()?.clone();
                let right = self.arena.get(input_2)?.as_arbitrary_raster()?.clone();
                let result = resample::multiply(&left, &right)?;
                self.arena.put(output, LightCurveProduct::ArbitraryRaster(result))?;
                self.track_write(output);
                Ok(())
            }
            ConcreteTask::Binning {
                source,
                target,
                cadence,
            } => {
                let raster = self.arena.get(source)?.as_arbitrary_raster()?.clone();
                let rebinned = resample::rebin_to_cadence(&raster, cadence / 86_400.0)?;
                self.arena.put(target, LightCurveProduct::ArbitraryRaster(rebinned))?;
                self.track_write(target);
                Ok(())
            }
            ConcreteTask::Verify { source } => {
                let raster = self.arena.get(source)?.as_arbitrary_raster()?.clone();
                let errors = raster.check_fixed_step();
                tracing::info!(error_count = errors.len(), "verify: fixed-step check complete");
                Ok(())
            }
            ConcreteTask::TransitSearch {
                source,
                lc_duration,
                tda_name,
                search_settings,
            } => {
                let raster = self.arena.get(source)?.as_arbitrary_raster()?.clone();
                let backend = tda::lookup(tda_name).ok_or_else(|| EngineError::UnknownTda(tda_name.clone()))?;
                let truncated = truncate_to_duration(&raster, *lc_duration);
                let (summary, extended) = backend.search(&truncated)?;

                let expected_period: f64 = raster
                    .metadata
                    .get("orbital_period")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(summary.period);
                let within_bounds = search_settings
                    .period_min
                    .map(|min| summary.period >= min)
                    .unwrap_or(true)
                    && search_settings
                        .period_max
                        .map(|max| summary.period <= max)
                        .unwrap_or(true);
                let outcome = if within_bounds
                    && (summary.period - expected_period).abs() <= 0.1 * expected_period
                {
                    "PASS"
                } else {
                    "FAIL"
                };

                let extended_artifact_name = if extended.is_empty() {
                    None
                } else {
                    let filename = result_filename(&list.job_name, "transit_search", tda_name, &source.filename);
                    write_extended_payload(self.arena.archive_root(), &filename, &extended)?;
                    Some(filename)
                };

                let record = ResultRecord {
                    job_name: list.job_name.clone(),
                    tda_code: tda_name.clone(),
                    target_name: String::new(),
                    task_name: "transit_search".to_string(),
                    parameters: list.job_parameters.clone(),
                    timestamp: chrono::Utc::now().timestamp() as f64,
                    result_summary_json: serde_json::json!({
                        "period": summary.period,
                        "depth": summary.depth,
                        "snr": summary.snr,
                        "outcome": outcome,
                    }),
                    extended_artifact_name,
                };
                self.result_sink.record(&record).await?;
                Ok(())
            }
            ConcreteTask::Delete { source } => {
                self.arena.remove(source)?;
                Ok(())
            }
            ConcreteTask::Unknown => Err(EngineError::TaskFailed("unknown task verb".to_string())),
        }
    }
}

/// The deterministic result-JSON filename (spec.md §6): `<job>_<task>_<tda>_
/// <leaf(target)>.json.gz`, used as the stable key a Metadata Store insert
/// relocates the extended payload to.
fn result_filename(job_name: &str, task_name: &str, tda_name: &str, target: &str) -> String {
    format!("{job_name}_{task_name}_{tda_name}_{}.json.gz", leaf_name(target))
}

fn leaf_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Stages the extended payload under `archive_root/scratch`; a Metadata
/// Store insert later moves it into the output directory (spec.md §4.1).
fn write_extended_payload(
    archive_root: &Path,
    filename: &str,
    extended: &HashMap<String, String>,
) -> EngineResult<()> {
    let dir = archive_root.join("scratch");
    std::fs::create_dir_all(&dir).map_err(eas_lib::EasError::from)?;

    let body = serde_json::to_vec(extended).map_err(eas_lib::EasError::from)?;
    let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(&body).map_err(eas_lib::EasError::from)?;
    let gzipped = encoder.finish().map_err(eas_lib::EasError::from)?;

    std::fs::write(dir.join(filename), gzipped).map_err(eas_lib::EasError::from)?;
    Ok(())
}

fn truncate_to_duration(
    raster: &eas_lib::lightcurve::ArbitraryRaster,
    lc_duration: f64,
) -> eas_lib::lightcurve::ArbitraryRaster {
    let t0 = raster.times[0];
    let cutoff = t0 + lc_duration;
    let keep = raster.times.iter().take_while(|&&t| t <= cutoff).count().max(3);
    eas_lib::lightcurve::ArbitraryRaster::with_fields(
        raster.times[..keep].to_vec(),
        raster.fluxes[..keep].to_vec(),
        raster.uncertainties[..keep].to_vec(),
        raster.flags[..keep].to_vec(),
        raster.metadata.clone(),
    )
    .unwrap_or_else(|_| raster.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use eas_broker::error::BrokerResult;
    use async_trait::async_trait;
    use eas_lib::telemetry::RunTimeRecord;
    use std::collections::HashMap as StdHashMap;
    use std::sync::Mutex;

    struct NullRunTimeSink;

    #[async_trait]
    impl RunTimeSink for NullRunTimeSink {
        async fn record(&self, _record: &RunTimeRecord) -> BrokerResult<()> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingResultSink {
        records: Mutex<Vec<ResultRecord>>,
    }

    #[async_trait]
    impl ResultSink for RecordingResultSink {
        async fn record(&self, record: &ResultRecord) -> BrokerResult<()> {
            self.records.lock().unwrap().push(record.clone());
            Ok(())
        }
    }

    fn list(tasks: Vec<ConcreteTask>) -> TaskList {
        TaskList {
            job_name: "job".to_string(),
            job_parameters: StdHashMap::new(),
            clean_up: true,
            task_list: tasks,
        }
    }

    #[tokio::test]
    async fn null_task_list_completes_without_result_records() {
        let result_sink = Arc::new(RecordingResultSink::default());
        let mut runner = TaskRunner::new(
            "/tmp/eas-runner-test-null",
            Arc::new(NullRunTimeSink),
            result_sink.clone(),
            Arc::new(crate::synth::Deterministic),
        );
        runner.run_task_list(list(vec![ConcreteTask::Null])).await.unwrap();
        assert!(result_sink.records.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn error_task_emits_single_error_result_record() {
        let result_sink = Arc::new(RecordingResultSink::default());
        let mut runner = TaskRunner::new(
            "/tmp/eas-runner-test-error",
            Arc::new(NullRunTimeSink),
            result_sink.clone(),
            Arc::new(crate::synth::Deterministic),
        );
        runner
            .run_task_list(list(vec![ConcreteTask::Error, ConcreteTask::Null]))
            .await
            .unwrap();
        let records = result_sink.records.lock().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].task_name, "error_message");
    }

    #[tokio::test]
    async fn unknown_artifact_read_fails_the_task() {
        let result_sink = Arc::new(RecordingResultSink::default());
        let mut runner = TaskRunner::new(
            "/tmp/eas-runner-test-unknown",
            Arc::new(NullRunTimeSink),
            result_sink.clone(),
            Arc::new(crate::synth::Deterministic),
        );
        let source = eas_lib::model::ArtifactHandle {
            source: eas_lib::model::ArtifactSource::Memory,
            directory: "d".to_string(),
            filename: "never-written.lc".to_string(),
        };
        runner
            .run_task_list(list(vec![ConcreteTask::Verify { source }]))
            .await
            .unwrap();
        let records = result_sink.records.lock().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].task_name, "error_message");
    }
}
