//! Error types for dialog-core
//!
//! [`RefreshError`] covers everything the refresh manager reports to its
//! caller. Failures of a request on the wire arrive as [`TransportError`]
//! from the [`RequestSender`](crate::transport::RequestSender).

use thiserror::Error;

use crate::refresh::RefreshId;

/// Failure to deliver a request or receive its final response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("Request timed out")]
    Timeout,

    #[error("Transport unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum RefreshError {
    /// The task's connection does not permit this operation right now
    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Unknown refresh id: {0}")]
    UnknownRefreshId(RefreshId),

    #[error("Protocol error: {0}")]
    Protocol(#[from] sipkit_sip_core::Error),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type RefreshResult<T> = std::result::Result<T, RefreshError>;
