//! Task Timer (spec.md §4.4): a scoped guard that submits a `RunTimeRecord`
//! on every exit path, mirroring `task_timer.py`'s context-manager
//! `__exit__`, which always fires including on exception. Self-CPU and
//! self+children-CPU come from `getrusage`, matching the "cpu_with_children"
//! naming the original uses for subprocess-launching TDAs like QATS.

use eas_broker::sinks::RunTimeSink;
use eas_lib::telemetry::RunTimeRecord;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

fn cpu_seconds(who: libc::c_int) -> f64 {
    unsafe {
        let mut usage: libc::rusage = std::mem::zeroed();
        libc::getrusage(who, &mut usage);
        usage.ru_utime.tv_sec as f64
            + usage.ru_utime.tv_usec as f64 / 1e6
            + usage.ru_stime.tv_sec as f64
            + usage.ru_stime.tv_usec as f64 / 1e6
    }
}

pub struct TaskTimer {
    sink: Arc<dyn RunTimeSink>,
    job_name: String,
    tda_code: String,
    target_name: String,
    task_name: String,
    parameters: HashMap<String, String>,
    wall_start: Instant,
    cpu_self_start: f64,
    cpu_children_start: f64,
}

impl TaskTimer {
    pub fn start(
        sink: Arc<dyn RunTimeSink>,
        job_name: impl Into<String>,
        tda_code: impl Into<String>,
        target_name: impl Into<String>,
        task_name: impl Into<String>,
        parameters: HashMap<String, String>,
    ) -> Self {
        TaskTimer {
            sink,
            job_name: job_name.into(),
            tda_code: tda_code.into(),
            target_name: target_name.into(),
            task_name: task_name.into(),
            parameters,
            wall_start: Instant::now(),
            cpu_self_start: cpu_seconds(libc::RUSAGE_SELF),
            cpu_children_start: cpu_seconds(libc::RUSAGE_CHILDREN),
        }
    }
}

impl Drop for TaskTimer {
    fn drop(&mut self) {
        let wall = self.wall_start.elapsed().as_secs_f64();
        let cpu_self = cpu_seconds(libc::RUSAGE_SELF) - self.cpu_self_start;
        let cpu_with_children =
            cpu_self + (cpu_seconds(libc::RUSAGE_CHILDREN) - self.cpu_children_start);

        let record = RunTimeRecord {
            job_name: self.job_name.clone(),
            tda_code: self.tda_code.clone(),
            target_name: self.target_name.clone(),
            task_name: self.task_name.clone(),
            parameters: std::mem::take(&mut self.parameters),
            timestamp: chrono::Utc::now().timestamp() as f64,
            wall,
            cpu_self,
            cpu_with_children,
        };
        let sink = self.sink.clone();

        // record() is async; dropping a TaskTimer never blocks the caller
        // (spec.md §4.2 "no sink blocks"), so we hand the submission to the
        // runtime rather than awaiting it here.
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                if let Err(err) = sink.record(&record).await {
                    tracing::warn!(error = %err, "failed to submit run_time record");
                }
            });
        } else {
            tracing::warn!("TaskTimer dropped outside a tokio runtime, dropping run_time record");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eas_broker::error::BrokerResult;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSink(Arc<AtomicUsize>);

    #[async_trait]
    impl RunTimeSink for CountingSink {
        async fn record(&self, _record: &RunTimeRecord) -> BrokerResult<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn drop_submits_exactly_one_record() {
        let count = Arc::new(AtomicUsize::new(0));
        let sink = Arc::new(CountingSink(count.clone()));
        {
            let _timer = TaskTimer::start(sink, "job", "tda", "target", "task", HashMap::new());
        }
        tokio::task::yield_now().await;
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
