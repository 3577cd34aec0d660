use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Validation failed: {}", errors.join("; "))]
    Validation { errors: Vec<String> },

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Baseline data unavailable: {0}")]
    DataUnavailable(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SimError {
    /// Shorthand for a single-message validation failure.
    pub fn validation(message: impl Into<String>) -> Self {
        SimError::Validation { errors: vec![message.into()] }
    }
}

pub type SimResult<T> = Result<T, SimError>;
