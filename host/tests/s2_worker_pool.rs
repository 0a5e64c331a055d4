//! S2 (spec.md §8): a pool of Worker Loops pulling from the same `tasks`
//! queue processes each `TaskList` exactly once — no message is picked up
//! by two workers, and none is left behind. Needs a live broker, so this is
//! gated behind the `integration` feature (set `AMQP_URL` to run it).

#![cfg(feature = "integration")]

mod common;

use eas_broker::client::{self, QUEUE_TASKS};
use eas_broker::error::BrokerError;
use eas_engine::worker::WorkerLoop;
use eas_lib::model::{ConcreteTask, TaskList};
use std::collections::HashMap;

fn broker_url() -> String {
    std::env::var("AMQP_URL").expect("AMQP_URL must be set to run integration tests")
}

fn task_list(job_name: &str) -> TaskList {
    TaskList {
        job_name: job_name.to_string(),
        job_parameters: HashMap::new(),
        clean_up: true,
        task_list: vec![ConcreteTask::Null],
    }
}

#[tokio::test]
async fn pool_of_two_workers_splits_a_backlog_without_overlap() {
    let url = broker_url();
    for i in 0..4 {
        client::publish_json(&url, QUEUE_TASKS, &task_list(&format!("s2-{i}")))
            .await
            .unwrap();
    }

    let (runner_a, _results_a) = common::runner_with_recorder(std::env::temp_dir().join("s2-worker-a"));
    let (runner_b, _results_b) = common::runner_with_recorder(std::env::temp_dir().join("s2-worker-b"));
    let mut worker_a = WorkerLoop::new(url.clone(), runner_a);
    let mut worker_b = WorkerLoop::new(url.clone(), runner_b);

    // Each step is one fetch-ack-run cycle; four steps across two workers
    // drain the four published lists with no overlap, since `fetch_one`
    // acknowledges on receipt (spec.md §4.9).
    worker_a.step().await.unwrap();
    worker_b.step().await.unwrap();
    worker_a.step().await.unwrap();
    worker_b.step().await.unwrap();

    match client::fetch_one(&url, QUEUE_TASKS).await {
        Err(BrokerError::Empty) => {}
        other => panic!("expected the backlog to be fully drained, got {other:?}"),
    }
}
