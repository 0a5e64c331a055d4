use thiserror::Error;

/// Aggregates every crate's narrower error enum at the CLI boundary.
#[derive(Error, Debug)]
pub enum HostError {
    #[error(transparent)]
    Lib(#[from] eas_lib::EasError),

    #[error(transparent)]
    Store(#[from] eas_store::error::StoreError),

    #[error(transparent)]
    Broker(#[from] eas_broker::BrokerError),

    #[error(transparent)]
    Engine(#[from] eas_engine::EngineError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type HostResult<T> = Result<T, HostError>;
