//! Telemetry sinks (spec.md §4.2): each exposes a single `record` method,
//! backed either by the broker (publish a JSON envelope) or by structured
//! logging, built on the same `tracing` ambient stack used elsewhere.

use crate::client::{self, QUEUE_RESULTS, QUEUE_RUN_TIMES};
use crate::error::BrokerResult;
use async_trait::async_trait;
use eas_lib::telemetry::{ResultRecord, RunTimeRecord};

#[async_trait]
pub trait RunTimeSink: Send + Sync {
    async fn record(&self, record: &RunTimeRecord) -> BrokerResult<()>;
}

#[async_trait]
pub trait ResultSink: Send + Sync {
    async fn record(&self, record: &ResultRecord) -> BrokerResult<()>;
}

pub struct BrokerRunTimeSink {
    broker_url: String,
}

impl BrokerRunTimeSink {
    pub fn new(broker_url: impl Into<String>) -> Self {
        BrokerRunTimeSink {
            broker_url: broker_url.into(),
        }
    }
}

#[async_trait]
impl RunTimeSink for BrokerRunTimeSink {
    async fn record(&self, record: &RunTimeRecord) -> BrokerResult<()> {
        client::publish_json(&self.broker_url, QUEUE_RUN_TIMES, record).await
    }
}

pub struct BrokerResultSink {
    broker_url: String,
}

impl BrokerResultSink {
    pub fn new(broker_url: impl Into<String>) -> Self {
        BrokerResultSink {
            broker_url: broker_url.into(),
        }
    }
}

#[async_trait]
impl ResultSink for BrokerResultSink {
    async fn record(&self, record: &ResultRecord) -> BrokerResult<()> {
        client::publish_json(&self.broker_url, QUEUE_RESULTS, record).await
    }
}

pub struct LogRunTimeSink;

#[async_trait]
impl RunTimeSink for LogRunTimeSink {
    async fn record(&self, record: &RunTimeRecord) -> BrokerResult<()> {
        tracing::info!(
            job_name = %record.job_name,
            task_name = %record.task_name,
            target_name = %record.target_name,
            wall = record.wall,
            cpu_self = record.cpu_self,
            cpu_with_children = record.cpu_with_children,
            "run_time"
        );
        Ok(())
    }
}

pub struct LogResultSink;

#[async_trait]
impl ResultSink for LogResultSink {
    async fn record(&self, record: &ResultRecord) -> BrokerResult<()> {
        tracing::info!(
            job_name = %record.job_name,
            task_name = %record.task_name,
            target_name = %record.target_name,
            result = %record.result_summary_json,
            "result"
        );
        Ok(())
    }
}
