use thiserror::Error;

#[derive(Error, Debug)]
pub enum BrokerError {
    #[error("amqp error: {0}")]
    Amqp(#[from] lapin::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no message available")]
    Empty,

    #[error("bad message envelope: {0}")]
    BadMessage(String),
}

pub type BrokerResult<T> = Result<T, BrokerError>;
