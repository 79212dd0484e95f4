//! Collaborators of the refresh manager: the request sender below it and
//! the listener above it.

use async_trait::async_trait;
use sipkit_sip_core::types::{Request, Response};

use crate::errors::TransportError;
use crate::refresh::RefreshId;

/// Sends a request and resolves to its final response.
#[async_trait]
pub trait RequestSender: Send + Sync {
    async fn send(&self, request: Request) -> Result<Response, TransportError>;
}

/// Receives the outcome of every refresh.
///
/// `status_code` is the final response status, the configured transport
/// failure status, or 0 once the task has been stopped.
pub trait RefreshListener: Send + Sync {
    fn refresh_event(&self, refresh_id: RefreshId, status_code: u16, reason_phrase: &str);
}
