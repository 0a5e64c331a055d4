//! Dispatcher (spec.md §4.8): `local` runs every expanded `TaskList` through
//! the Task Runner in-process; `cluster` publishes each list onto the
//! broker's `tasks` queue for a pool of workers to pick up.

use crate::error::EngineResult;
use crate::runner::TaskRunner;
use crate::worker;
use eas_broker::client::{self, QUEUE_TASKS};
use eas_lib::model::TaskList;

pub enum DispatchMode {
    Local,
    Cluster { broker_url: String },
}

pub async fn dispatch(
    mode: &DispatchMode,
    task_lists: Vec<TaskList>,
    runner: &mut Option<TaskRunner>,
) -> EngineResult<()> {
    match mode {
        DispatchMode::Local => {
            let runner = runner
                .as_mut()
                .expect("local dispatch requires a TaskRunner");
            worker::run_local(runner, task_lists).await
        }
        DispatchMode::Cluster { broker_url } => {
            for list in task_lists {
                client::publish_json(broker_url, QUEUE_TASKS, &list).await?;
            }
            Ok(())
        }
    }
}
