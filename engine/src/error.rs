use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Lib(#[from] eas_lib::EasError),

    #[error(transparent)]
    Broker(#[from] eas_broker::BrokerError),

    #[error("unknown tda '{0}'")]
    UnknownTda(String),

    #[error("quality control failed: recovered period {recovered} outside ±10% of {expected}")]
    QualityControl { recovered: f64, expected: f64 },

    #[error("{0}")]
    TaskFailed(String),
}

pub type EngineResult<T> = Result<T, EngineError>;
