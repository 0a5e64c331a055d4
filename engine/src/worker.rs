//! Worker Loop (spec.md §4.9): `Idle -> Fetching -> Working -> Acknowledging
//! -> Idle`, with `* -> Backoff -> Fetching` on broker error. Each iteration
//! opens its own broker connection for a single `basic_get`, acknowledges
//! immediately, and closes the connection before running the task list, so
//! long-running tasks never hold a broker connection open.

use crate::error::EngineResult;
use crate::runner::TaskRunner;
use eas_broker::client::{self, QUEUE_TASKS};
use eas_broker::error::BrokerError;
use eas_lib::model::TaskList;
use std::time::Duration;

const BROKER_BACKOFF: Duration = Duration::from_secs(30);
const EMPTY_QUEUE_SLEEP: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    Fetching,
    Working,
    Acknowledging,
    Backoff,
}

pub struct WorkerLoop {
    broker_url: String,
    runner: TaskRunner,
    state: WorkerState,
}

impl WorkerLoop {
    pub fn new(broker_url: impl Into<String>, runner: TaskRunner) -> Self {
        WorkerLoop {
            broker_url: broker_url.into(),
            runner,
            state: WorkerState::Idle,
        }
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    /// Runs indefinitely until the process receives SIGINT (spec.md §4.9
    /// "terminal only on SIGINT" — handled by the host binary wrapping this
    /// in a `tokio::select!` against a signal future).
    pub async fn run(&mut self) -> EngineResult<()> {
        loop {
            self.step().await?;
        }
    }

    /// One iteration of the state machine; exposed separately so the host
    /// binary can interleave it with a shutdown signal.
    pub async fn step(&mut self) -> EngineResult<()> {
        self.state = WorkerState::Fetching;
        match client::fetch_one(&self.broker_url, QUEUE_TASKS).await {
            Ok(body) => {
                // fetch_one already acked on receipt (spec.md §4.9
                // "acknowledge immediately upon receipt").
                self.state = WorkerState::Acknowledging;
                match serde_json::from_slice::<TaskList>(&body) {
                    Ok(list) => {
                        self.state = WorkerState::Working;
                        self.runner.run_task_list(list).await?;
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "bad message: not a decodable TaskList");
                    }
                }
                self.state = WorkerState::Idle;
            }
            Err(BrokerError::Empty) => {
                self.state = WorkerState::Idle;
                tokio::time::sleep(EMPTY_QUEUE_SLEEP).await;
            }
            Err(err) => {
                self.state = WorkerState::Backoff;
                tracing::warn!(error = %err, "broker unavailable, backing off");
                tokio::time::sleep(BROKER_BACKOFF).await;
            }
        }
        Ok(())
    }
}

/// Run `task_lists` through a Task Runner in-process, used by
/// [`crate::dispatch::DispatchMode::Local`].
pub async fn run_local(runner: &mut TaskRunner, task_lists: Vec<TaskList>) -> EngineResult<()> {
    for list in task_lists {
        runner.run_task_list(list).await?;
    }
    Ok(())
}
