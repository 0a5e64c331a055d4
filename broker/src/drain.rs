//! Telemetry Drain (spec.md §4.3): one long-running loop per telemetry
//! queue. Acknowledges a message only after the corresponding store write
//! succeeds, so a drain crash before that write redelivers rather than
//! silently drops (at-least-once, per spec.md §5).

use crate::client;
use crate::error::BrokerError;
use eas_lib::telemetry::{ResultRecord, RunTimeRecord};
use eas_store::MetadataStore;
use std::time::Duration;

const BACKOFF: Duration = Duration::from_secs(30);
const IDLE_SLEEP: Duration = Duration::from_secs(10);

pub async fn run_run_times_drain(broker_url: &str, store: &MetadataStore) -> ! {
    loop {
        match client::fetch_one(broker_url, client::QUEUE_RUN_TIMES).await {
            Ok(body) => match serde_json::from_slice::<RunTimeRecord>(&body) {
                Ok(record) => loop {
                    match store.insert_run_time(&record).await {
                        Ok(()) => break,
                        Err(err) => {
                            tracing::warn!(error = %err, "store outage, retrying run_time insert");
                            tokio::time::sleep(BACKOFF).await;
                        }
                    }
                },
                Err(err) => tracing::warn!(error = %err, "dropping malformed run_time envelope"),
            },
            Err(BrokerError::Empty) => tokio::time::sleep(IDLE_SLEEP).await,
            Err(err) => {
                tracing::warn!(error = %err, "broker unavailable, backing off");
                tokio::time::sleep(BACKOFF).await;
            }
        }
    }
}

pub async fn run_results_drain(broker_url: &str, store: &MetadataStore) -> ! {
    loop {
        match client::fetch_one(broker_url, client::QUEUE_RESULTS).await {
            Ok(body) => match serde_json::from_slice::<ResultRecord>(&body) {
                Ok(record) => loop {
                    match store.insert_result(&record, None).await {
                        Ok(()) => break,
                        Err(err) => {
                            tracing::warn!(error = %err, "store outage, retrying result insert");
                            tokio::time::sleep(BACKOFF).await;
                        }
                    }
                },
                Err(err) => tracing::warn!(error = %err, "dropping malformed result envelope"),
            },
            Err(BrokerError::Empty) => tokio::time::sleep(IDLE_SLEEP).await,
            Err(err) => {
                tracing::warn!(error = %err, "broker unavailable, backing off");
                tokio::time::sleep(BACKOFF).await;
            }
        }
    }
}
