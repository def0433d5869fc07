//! Error types for the rugby simulation

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Entity not found: {0}")]
    EntityNotFound(u32),

    #[error("Invalid period transition: {0}")]
    InvalidPeriod(String),

    #[error("Squad selection failed: {0}")]
    Selection(String),

    #[error("Invalid engine state: {0}")]
    InvalidState(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for SimError {
    fn from(err: serde_json::Error) -> Self {
        SimError::SerializationError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SimError>;
