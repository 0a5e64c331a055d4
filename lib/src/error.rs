use thiserror::Error;

/// Top-level error type shared by every `eas-*` crate that doesn't need a
/// narrower, domain-specific enum of its own.
#[derive(Error, Debug)]
pub enum EasError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown artifact: {directory}/{filename}")]
    UnknownArtifact { directory: String, filename: String },

    #[error("invalid light curve: {0}")]
    InvalidLightCurve(String),

    #[error("expression error: {0}")]
    Expr(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("task failed: {0}")]
    TaskFailed(String),

    #[error("{0}")]
    Other(String),
}

pub type EasResult<T> = Result<T, EasError>;
