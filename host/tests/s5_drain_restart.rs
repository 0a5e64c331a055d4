//! S5 (spec.md §8): a Telemetry Drain that crashes mid-batch and restarts
//! still delivers every queued record to the store — acknowledgement only
//! follows a successful store write (spec.md §4.3), so a restart just
//! resumes draining the backlog rather than losing or duplicating it.
//! Needs a live broker and Postgres, so this is gated behind the
//! `integration` feature (set `AMQP_URL` and `DATABASE_URL` to run it).

#![cfg(feature = "integration")]

use eas_broker::client::{self, QUEUE_RESULTS};
use eas_broker::drain;
use eas_broker::error::BrokerError;
use eas_lib::telemetry::ResultRecord;
use eas_store::MetadataStore;
use std::collections::HashMap;
use std::time::Duration;

fn broker_url() -> String {
    std::env::var("AMQP_URL").expect("AMQP_URL must be set to run integration tests")
}

fn database_url() -> String {
    std::env::var("DATABASE_URL").expect("DATABASE_URL must be set to run integration tests")
}

fn result_record(job_name: &str) -> ResultRecord {
    ResultRecord {
        job_name: job_name.to_string(),
        tda_code: String::new(),
        target_name: String::new(),
        task_name: "null".to_string(),
        parameters: HashMap::new(),
        timestamp: 0.0,
        result_summary_json: serde_json::json!({}),
        extended_artifact_name: None,
    }
}

#[tokio::test]
async fn restarting_the_drain_finishes_a_backlog_without_losing_messages() {
    let url = broker_url();
    let tmp = tempfile::tempdir().unwrap();
    let store = MetadataStore::connect(&database_url(), tmp.path()).await.unwrap();
    store.ensure_schema(false).await.unwrap();

    client::publish_json(&url, QUEUE_RESULTS, &result_record("s5-a")).await.unwrap();
    client::publish_json(&url, QUEUE_RESULTS, &result_record("s5-b")).await.unwrap();

    // Simulate a crash: let the drain run just long enough to pick up the
    // backlog, then cancel it, as if the process had died.
    let _ = tokio::time::timeout(Duration::from_secs(2), drain::run_results_drain(&url, &store)).await;

    // A restarted drain resumes against whatever is left in the queue; by
    // now it should be empty, not stalled on a redelivered duplicate.
    let _ = tokio::time::timeout(Duration::from_secs(2), drain::run_results_drain(&url, &store)).await;

    match client::fetch_one(&url, QUEUE_RESULTS).await {
        Err(BrokerError::Empty) => {}
        other => panic!("expected the results queue to be fully drained, got {other:?}"),
    }
}
