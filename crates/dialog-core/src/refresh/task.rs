//! Per-id refresh state.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sipkit_sip_core::types::{Request, Response, SipMessage};
use tokio_util::sync::CancellationToken;

use crate::transport::RefreshListener;

use super::RefreshId;

/// Where a refresh task's connection is in its send cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectionState {
    /// Between sends; the task may be updated or stopped
    Idle,
    /// A request is in flight
    Proceeding,
    /// Update content is being written
    StreamOpen,
    /// Stopped, or ended by its last response
    Terminated,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionState::Idle => "idle",
            ConnectionState::Proceeding => "proceeding",
            ConnectionState::StreamOpen => "stream-open",
            ConnectionState::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

pub(crate) struct TaskState {
    pub connection: ConnectionState,
    /// Bumped on every send and on stop; timers and responses carrying an
    /// older value are stale.
    pub generation: u64,
    pub last_request: Request,
    /// Last expiry granted by the peer
    pub expires: u32,
    pub timer: CancellationToken,
}

pub(crate) struct RefreshTask {
    pub id: RefreshId,
    pub state: Mutex<TaskState>,
    /// Held for the duration of a send and its response handling.
    pub send_gate: tokio::sync::Mutex<()>,
    pub listener: Arc<dyn RefreshListener>,
}

impl RefreshTask {
    pub fn new(
        id: RefreshId,
        request: Request,
        expires: u32,
        listener: Arc<dyn RefreshListener>,
    ) -> Self {
        RefreshTask {
            id,
            state: Mutex::new(TaskState {
                connection: ConnectionState::Idle,
                generation: 0,
                last_request: request,
                expires,
                timer: CancellationToken::new(),
            }),
            send_gate: tokio::sync::Mutex::new(()),
            listener,
        }
    }

    pub fn connection(&self) -> ConnectionState {
        self.state.lock().connection
    }

    pub fn notify(&self, status_code: u16, reason_phrase: &str) {
        self.listener.refresh_event(self.id, status_code, reason_phrase);
    }
}

/// Expiry granted by a 2xx: the response's `Expires`, else the `expires`
/// parameter of the response contact matching one we sent, else the
/// request's own `Expires`, else `default`.
pub(crate) fn granted_expiry(request: &Request, response: &Response, default: u32) -> u32 {
    if let Some(expires) = response.expires() {
        return expires;
    }
    if let (Ok(sent), Ok(granted)) = (request.contacts(), response.contacts()) {
        let matching = granted.iter().find(|g| {
            sent.iter()
                .any(|s| s.address.uri().is_some() && s.address.uri() == g.address.uri())
        });
        if let Some(expires) = matching.and_then(|c| c.expires()) {
            return expires;
        }
    }
    request.expires().unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sipkit_sip_core::types::{Method, Uri};

    fn register(extra: &[(&str, &str)]) -> Request {
        let mut request = Request::new(Method::Register, Uri::parse("sip:example.com").unwrap());
        for (name, value) in extra {
            request.add_header(name, value).unwrap();
        }
        request
    }

    fn ok(extra: &[(&str, &str)]) -> Response {
        let mut response = Response::new(200);
        for (name, value) in extra {
            response.add_header(name, value).unwrap();
        }
        response
    }

    #[test]
    fn test_granted_expiry_precedence() {
        let request = register(&[("Contact", "<sip:alice@10.0.0.1>"), ("Expires", "600")]);
        assert_eq!(granted_expiry(&request, &ok(&[("Expires", "120")]), 3600), 120);
        assert_eq!(
            granted_expiry(
                &request,
                &ok(&[("Contact", "<sip:bob@10.0.0.2>;expires=10, <sip:alice@10.0.0.1>;expires=300")]),
                3600
            ),
            300
        );
        assert_eq!(granted_expiry(&request, &ok(&[]), 3600), 600);
        assert_eq!(granted_expiry(&register(&[]), &ok(&[]), 3600), 3600);
    }
}
