//! Test doubles for the refresh manager's collaborators.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::Duration;

use sipkit_dialog_core::{RefreshId, RefreshListener, RequestSender, TransportError};
use sipkit_sip_core::types::{Method, Request, Response, SipMessage, Uri};

/// Records every request. Replies from the script first, then with a 200
/// echoing the request's `Expires`.
#[derive(Default)]
pub struct MockSender {
    pub sent: Mutex<Vec<Request>>,
    script: Mutex<VecDeque<Result<Response, TransportError>>>,
    latency: Option<Duration>,
}

impl MockSender {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_latency(latency: Duration) -> Arc<Self> {
        Arc::new(MockSender {
            latency: Some(latency),
            ..Default::default()
        })
    }

    pub fn push_reply(&self, reply: Result<Response, TransportError>) {
        self.script.lock().push_back(reply);
    }

    pub fn sent(&self) -> Vec<Request> {
        self.sent.lock().clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().len()
    }
}

#[async_trait]
impl RequestSender for MockSender {
    async fn send(&self, request: Request) -> Result<Response, TransportError> {
        self.sent.lock().push(request.clone());
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if let Some(reply) = self.script.lock().pop_front() {
            return reply;
        }
        let mut response = Response::new(200);
        if let Some(expires) = request.expires() {
            response.set_expires(expires);
        }
        Ok(response)
    }
}

#[derive(Default)]
pub struct RecordingListener {
    events: Mutex<Vec<(RefreshId, u16, String)>>,
}

impl RecordingListener {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<(RefreshId, u16, String)> {
        self.events.lock().clone()
    }

    pub fn statuses(&self) -> Vec<u16> {
        self.events.lock().iter().map(|(_, status, _)| *status).collect()
    }
}

impl RefreshListener for RecordingListener {
    fn refresh_event(&self, refresh_id: RefreshId, status_code: u16, reason_phrase: &str) {
        self.events
            .lock()
            .push((refresh_id, status_code, reason_phrase.to_string()));
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("sipkit_dialog_core=trace")
        .with_test_writer()
        .try_init();
}

pub fn register(expires: u32) -> Request {
    register_with_call_id(expires, "a84b4c76e66710@pc33.example.com")
}

pub fn register_with_call_id(expires: u32, call_id: &str) -> Request {
    Request::new(Method::Register, Uri::parse("sip:registrar.example.com").unwrap())
        .with_header("Call-ID", call_id)
        .unwrap()
        .with_header("CSeq", "1 REGISTER")
        .unwrap()
        .with_header("Contact", "<sip:alice@192.0.2.4>")
        .unwrap()
        .with_header("Expires", &expires.to_string())
        .unwrap()
}
