//! Error types shared by the sipkit binaries.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Logging error: {0}")]
    Logging(String),
}

pub type Result<T> = std::result::Result<T, InfraError>;
