//! Short-lived AMQP connections (spec.md §4.9): one connection per publish
//! or per single-message fetch, never held open across task execution so a
//! multi-hour task can't be killed by a broker heartbeat timeout.

use crate::error::{BrokerError, BrokerResult};
use lapin::options::{
    BasicAckOptions, BasicGetOptions, BasicPublishOptions, QueueDeclareOptions,
};
use lapin::types::FieldTable;
use lapin::{BasicProperties, Connection, ConnectionProperties};
use serde::Serialize;

pub const QUEUE_TASKS: &str = "tasks";
pub const QUEUE_RUN_TIMES: &str = "run_times";
pub const QUEUE_RESULTS: &str = "results";

/// Publish one JSON-encoded message to `queue`, opening and closing its own
/// connection (spec.md §4.2 "short-lived connection per batch").
pub async fn publish_json<T: Serialize>(url: &str, queue: &str, payload: &T) -> BrokerResult<()> {
    let connection = Connection::connect(url, ConnectionProperties::default()).await?;
    let channel = connection.create_channel().await?;
    channel
        .queue_declare(queue, QueueDeclareOptions::default(), FieldTable::default())
        .await?;

    let body = serde_json::to_vec(payload)?;
    channel
        .basic_publish(
            "",
            queue,
            BasicPublishOptions::default(),
            &body,
            BasicProperties::default(),
        )
        .await?
        .await?;

    connection.close(200, "publish complete").await?;
    Ok(())
}

/// `basic_get` exactly one message from `queue`, acknowledging immediately
/// on receipt (spec.md §4.9's "single-message pull per broker connection").
/// Returns `Err(BrokerError::Empty)` if the queue had nothing waiting.
pub async fn fetch_one(url: &str, queue: &str) -> BrokerResult<Vec<u8>> {
    let connection = Connection::connect(url, ConnectionProperties::default()).await?;
    let channel = connection.create_channel().await?;
    channel
        .queue_declare(queue, QueueDeclareOptions::default(), FieldTable::default())
        .await?;

    let delivery = channel
        .basic_get(queue, BasicGetOptions::default())
        .await?;

    let result = match delivery {
        Some(message) => {
            let data = message.data.clone();
            channel.basic_ack(message.delivery_tag, BasicAckOptions::default()).await?;
            Ok(data)
        }
        None => Err(BrokerError::Empty),
    };

    connection.close(200, "fetch complete").await?;
    result
}
