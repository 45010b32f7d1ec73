use thiserror::Error;

/// Why a text submission was refused before it touched the state
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("input is empty")]
    Empty,

    #[error("input too long ({len}/{max} characters)")]
    TooLong { len: usize, max: usize },

    #[error("a previous submission is still being analyzed")]
    Busy,
}

#[derive(Error, Debug)]
pub enum AotaError {
    #[error("Submission rejected: {0}")]
    Rejected(#[from] Rejection),

    #[error("LLM error: {0}")]
    LlmError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AotaError>;
