//! # Refresh manager
//!
//! Keeps REGISTER and SUBSCRIBE style requests alive. Each started request
//! becomes a task identified by a [`RefreshId`]. The task resends its last
//! request, with a fresh CSeq, shortly before the expiry the peer granted,
//! and reports every final response to its [`RefreshListener`].
//!
//! ```text
//!   start ──▶ Proceeding ──2xx──▶ Idle ──timer──▶ Proceeding ──▶ ...
//!                 │                 │  ╲
//!            non-2xx/failure     update  stop
//!                 ▼                 │      ▼
//!             Terminated ◀──────────┴── Terminated (Expires: 0 sent)
//! ```
//!
//! Each task owns a send gate. Timers, `update` and `stop` all take the gate
//! before touching the wire, so at most one request per id is in flight.
//! A timer or response that loses a race against `stop` is dropped and the
//! listener hears about the stop exactly once.
//!
//! ```no_run
//! use std::sync::Arc;
//! use sipkit_dialog_core::config::RefreshConfig;
//! use sipkit_dialog_core::refresh::RefreshManager;
//! use sipkit_dialog_core::transport::{RefreshListener, RequestSender};
//! use sipkit_sip_core::types::Request;
//!
//! # async fn example(
//! #     sender: Arc<dyn RequestSender>,
//! #     listener: Arc<dyn RefreshListener>,
//! #     register: Request,
//! # ) -> Result<(), Box<dyn std::error::Error>> {
//! let manager = RefreshManager::new(sender, RefreshConfig::default())?;
//! let id = manager.start(register, listener).await?;
//! // ... later, remove the binding
//! manager.stop(id).await?;
//! # Ok(())
//! # }
//! ```

mod task;
mod writer;

pub use task::ConnectionState;
pub use writer::RefreshContentWriter;

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use sipkit_sip_core::types::{reason_phrase, ContactHeader, Request, Response, SipMessage};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::config::RefreshConfig;
use crate::errors::{RefreshError, RefreshResult, TransportError};
use crate::transport::{RefreshListener, RequestSender};

use self::task::{granted_expiry, RefreshTask};

/// Reason reported to the listener when a task is stopped.
pub const STOPPED_REASON: &str = "refresh task stopped";

/// Identifies one refresh task within its manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RefreshId(u32);

impl RefreshId {
    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for RefreshId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "refresh-{}", self.0)
    }
}

struct ManagerInner {
    sender: Arc<dyn RequestSender>,
    config: RefreshConfig,
    tasks: DashMap<RefreshId, Arc<RefreshTask>>,
    next_id: AtomicU32,
}

// Condition the task state must meet, at the moment a send is marked in
// flight, for the send to go ahead.
#[derive(Debug, Clone, Copy)]
enum Admission {
    /// Anything but a stopped task
    Live,
    /// Idle and still at this generation
    Timer(u64),
    /// Update content is being written
    Stream,
}

impl Admission {
    fn admits(self, connection: ConnectionState, generation: u64) -> bool {
        match self {
            Admission::Live => connection != ConnectionState::Terminated,
            Admission::Timer(expected) => {
                connection == ConnectionState::Idle && generation == expected
            }
            Admission::Stream => connection == ConnectionState::StreamOpen,
        }
    }
}

// What a finished send leaves behind, decided under the state lock and
// acted on after it is released.
enum Outcome {
    Stale,
    Refresh { status: u16, reason: String },
    Ended { status: u16, reason: String },
}

/// Schedules and tracks refresh tasks. Cloning shares the same tasks.
#[derive(Clone)]
pub struct RefreshManager {
    inner: Arc<ManagerInner>,
}

impl RefreshManager {
    pub fn new(sender: Arc<dyn RequestSender>, config: RefreshConfig) -> RefreshResult<Self> {
        config.validate()?;
        Ok(RefreshManager {
            inner: Arc::new(ManagerInner {
                sender,
                config,
                tasks: DashMap::new(),
                next_id: AtomicU32::new(1),
            }),
        })
    }

    pub fn config(&self) -> &RefreshConfig {
        &self.inner.config
    }

    /// Creates a task for `request` and sends it right away.
    ///
    /// The request must carry a CSeq; later refreshes increment it.
    pub async fn start(
        &self,
        request: Request,
        listener: Arc<dyn RefreshListener>,
    ) -> RefreshResult<RefreshId> {
        if request.cseq().is_none() {
            let missing = sipkit_sip_core::Error::IllegalState("refresh request has no CSeq".into());
            return Err(missing.into());
        }
        let id = RefreshId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let expires = request.expires().unwrap_or(self.inner.config.default_expires);
        let task = Arc::new(RefreshTask::new(id, request.clone(), expires, listener));
        self.inner.tasks.insert(id, task.clone());
        info!(refresh_id = %id, method = %request.method, "starting refresh task");

        let _gate = task.send_gate.lock().await;
        if !self.transmit(&task, request, Admission::Live).await {
            debug!(refresh_id = %id, "refresh task stopped before its first send");
        }
        Ok(id)
    }

    /// Stops the task, removing its binding with `Expires: 0`.
    ///
    /// Unknown or already stopped ids are a no-op. A send in flight is
    /// waited for and its response dropped.
    pub async fn stop(&self, id: RefreshId) -> RefreshResult<()> {
        let task = match self.task(id) {
            Some(task) => task,
            None => return Ok(()),
        };

        let mut removal = {
            let mut state = task.state.lock();
            match state.connection {
                ConnectionState::Terminated => return Ok(()),
                ConnectionState::StreamOpen => {
                    return Err(RefreshError::InvalidState(format!(
                        "{} is writing update content",
                        id
                    )))
                }
                _ => {}
            }
            let removal = state.last_request.clone();
            state.connection = ConnectionState::Terminated;
            state.generation += 1;
            state.timer.cancel();
            removal
        };

        removal.set_expires(0);
        removal.clear_body();
        if let Ok(mut contacts) = removal.contacts() {
            for contact in contacts.iter_mut().filter(|c| c.expires().is_some()) {
                contact.set_expires(Some(0));
            }
            removal.set_contacts(&contacts);
        }

        let _gate = task.send_gate.lock().await;
        if let Err(e) = removal.increment_cseq() {
            warn!(refresh_id = %id, error = %e, "cannot advance CSeq for binding removal");
        }
        debug!(refresh_id = %id, "sending binding removal");
        match self.inner.sender.send(removal).await {
            Ok(response) => debug!(refresh_id = %id, status = response.status_code, "binding removal answered"),
            Err(e) => warn!(refresh_id = %id, error = %e, "binding removal failed"),
        }

        self.inner.tasks.remove(&id);
        info!(refresh_id = %id, "refresh task stopped");
        task.notify(0, STOPPED_REASON);
        Ok(())
    }

    /// Edits a task's request and resends it.
    ///
    /// `expires` of `Some(0)` stops the task and always yields `None`. With a
    /// content type and a positive `content_length` the returned writer
    /// collects the new body and the send happens when it is closed.
    /// Otherwise any body is dropped and the request goes out now.
    pub async fn update(
        &self,
        id: RefreshId,
        contacts: Option<Vec<ContactHeader>>,
        content_type: Option<&str>,
        content_length: usize,
        expires: Option<u32>,
    ) -> RefreshResult<Option<RefreshContentWriter>> {
        if expires == Some(0) {
            self.stop(id).await?;
            return Ok(None);
        }
        let task = self.task(id).ok_or(RefreshError::UnknownRefreshId(id))?;

        let gate = task.send_gate.lock().await;
        let mut request = {
            let state = task.state.lock();
            match state.connection {
                ConnectionState::Terminated | ConnectionState::StreamOpen => {
                    return Err(RefreshError::InvalidState(format!(
                        "{} cannot be updated while {}",
                        id, state.connection
                    )))
                }
                _ => state.last_request.clone(),
            }
        };

        if let Some(contacts) = contacts {
            request.set_contacts(&contacts);
        }
        if let Some(expires) = expires {
            request.set_expires(expires);
        }
        request.increment_cseq()?;

        match content_type.filter(|t| !t.is_empty()) {
            Some(content_type) if content_length > 0 => {
                {
                    let mut state = task.state.lock();
                    if state.connection == ConnectionState::Terminated {
                        return Err(RefreshError::InvalidState(format!(
                            "{} was stopped during the update",
                            id
                        )));
                    }
                    state.connection = ConnectionState::StreamOpen;
                    state.timer.cancel();
                }
                debug!(refresh_id = %id, content_type, content_length, "update content stream opened");
                Ok(Some(RefreshContentWriter::new(
                    self.clone(),
                    task.clone(),
                    request,
                    content_type,
                    content_length,
                )))
            }
            _ => {
                request.clear_body();
                debug!(refresh_id = %id, "sending updated request");
                let sent = self.transmit(&task, request, Admission::Live).await;
                drop(gate);
                if !sent {
                    return Err(RefreshError::InvalidState(format!(
                        "{} was stopped during the update",
                        id
                    )));
                }
                Ok(None)
            }
        }
    }

    /// Stops every task.
    pub async fn stop_all(&self) {
        let ids: Vec<RefreshId> = self.inner.tasks.iter().map(|e| *e.key()).collect();
        for id in ids {
            if let Err(e) = self.stop(id).await {
                warn!(refresh_id = %id, error = %e, "could not stop refresh task");
            }
        }
    }

    pub fn is_active(&self, id: RefreshId) -> bool {
        self.state(id)
            .map(|s| s != ConnectionState::Terminated)
            .unwrap_or(false)
    }

    pub fn active_count(&self) -> usize {
        self.inner
            .tasks
            .iter()
            .filter(|e| e.value().connection() != ConnectionState::Terminated)
            .count()
    }

    pub fn state(&self, id: RefreshId) -> Option<ConnectionState> {
        self.task(id).map(|t| t.connection())
    }

    /// The request the task last put on the wire.
    pub fn last_request(&self, id: RefreshId) -> Option<Request> {
        self.task(id).map(|t| t.state.lock().last_request.clone())
    }

    fn task(&self, id: RefreshId) -> Option<Arc<RefreshTask>> {
        self.inner.tasks.get(&id).map(|e| e.value().clone())
    }

    // Sends `request` and files the outcome. The caller holds the send gate.
    // Returns false without sending when the state no longer meets
    // `admission`; `stop` marks a task without holding the gate, so the
    // check has to sit under the same lock that marks the send in flight.
    async fn transmit(
        &self,
        task: &Arc<RefreshTask>,
        request: Request,
        admission: Admission,
    ) -> bool {
        let generation = {
            let mut state = task.state.lock();
            if !admission.admits(state.connection, state.generation) {
                debug!(
                    refresh_id = %task.id,
                    connection = %state.connection,
                    ?admission,
                    "send no longer admitted"
                );
                return false;
            }
            state.connection = ConnectionState::Proceeding;
            state.generation += 1;
            state.timer.cancel();
            state.last_request = request.clone();
            state.generation
        };
        trace!(refresh_id = %task.id, generation, "sending refresh");
        let result = self.inner.sender.send(request.clone()).await;
        self.complete(task, generation, &request, result);
        true
    }

    fn complete(
        &self,
        task: &Arc<RefreshTask>,
        generation: u64,
        request: &Request,
        result: Result<Response, TransportError>,
    ) {
        let outcome = {
            let mut state = task.state.lock();
            if state.connection == ConnectionState::Terminated || state.generation != generation {
                Outcome::Stale
            } else {
                match result {
                    Ok(response) if response.is_success() => {
                        let expires =
                            granted_expiry(request, &response, self.inner.config.default_expires);
                        let outcome = if expires == 0 {
                            state.connection = ConnectionState::Terminated;
                            Outcome::Ended {
                                status: response.status_code,
                                reason: response.reason_phrase,
                            }
                        } else {
                            state.connection = ConnectionState::Idle;
                            state.expires = expires;
                            Outcome::Refresh {
                                status: response.status_code,
                                reason: response.reason_phrase,
                            }
                        };
                        if expires > 0 {
                            self.schedule(task, &mut state.timer, generation, expires);
                        }
                        outcome
                    }
                    Ok(response) => {
                        state.connection = ConnectionState::Terminated;
                        Outcome::Ended {
                            status: response.status_code,
                            reason: response.reason_phrase,
                        }
                    }
                    Err(e) => {
                        warn!(refresh_id = %task.id, error = %e, "refresh request failed");
                        state.connection = ConnectionState::Terminated;
                        let status = self.inner.config.transport_failure_status;
                        Outcome::Ended {
                            status,
                            reason: reason_phrase(status).to_string(),
                        }
                    }
                }
            }
        };

        match outcome {
            Outcome::Stale => {
                warn!(refresh_id = %task.id, generation, "dropping response to a superseded send");
            }
            Outcome::Refresh { status, reason } => {
                debug!(refresh_id = %task.id, status, "refresh accepted");
                task.notify(status, &reason);
            }
            Outcome::Ended { status, reason } => {
                info!(refresh_id = %task.id, status, "refresh task ended");
                self.inner.tasks.remove(&task.id);
                task.notify(status, &reason);
            }
        }
    }

    // Arms the next refresh. Replaces and cancels any previous timer.
    fn schedule(
        &self,
        task: &Arc<RefreshTask>,
        timer: &mut CancellationToken,
        generation: u64,
        expires: u32,
    ) {
        let delay = self.inner.config.refresh_delay(expires);
        let token = CancellationToken::new();
        std::mem::replace(timer, token.clone()).cancel();
        trace!(refresh_id = %task.id, delay_secs = delay.as_secs(), "scheduling refresh");

        let manager = self.clone();
        let task = task.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    trace!(refresh_id = %task.id, "refresh timer cancelled");
                }
                _ = tokio::time::sleep(delay) => {
                    manager.fire(task, generation).await;
                }
            }
        });
    }

    async fn fire(&self, task: Arc<RefreshTask>, generation: u64) {
        let _gate = task.send_gate.lock().await;
        let mut request = {
            let state = task.state.lock();
            if state.connection != ConnectionState::Idle || state.generation != generation {
                warn!(refresh_id = %task.id, generation, "dropping superseded refresh timer");
                return;
            }
            state.last_request.clone()
        };
        if let Err(e) = request.increment_cseq() {
            warn!(refresh_id = %task.id, error = %e, "cannot advance CSeq, refresh skipped");
            return;
        }
        debug!(refresh_id = %task.id, "refreshing");
        if !self.transmit(&task, request, Admission::Timer(generation)).await {
            warn!(refresh_id = %task.id, generation, "refresh lost a race with stop");
        }
    }

    // Returns a task whose content writer was dropped unclosed to Idle and
    // re-arms its timer.
    pub(crate) fn abandon_stream(&self, task: &Arc<RefreshTask>) {
        let mut state = task.state.lock();
        if state.connection != ConnectionState::StreamOpen {
            return;
        }
        state.connection = ConnectionState::Idle;
        let (generation, expires) = (state.generation, state.expires);
        if tokio::runtime::Handle::try_current().is_ok() {
            self.schedule(task, &mut state.timer, generation, expires);
        }
        debug!(refresh_id = %task.id, "update content abandoned");
    }

    pub(crate) async fn send_streamed(
        &self,
        task: &Arc<RefreshTask>,
        request: Request,
    ) -> RefreshResult<()> {
        let _gate = task.send_gate.lock().await;
        debug!(refresh_id = %task.id, body = request.body.len(), "sending updated request with content");
        if !self.transmit(task, request, Admission::Stream).await {
            return Err(RefreshError::InvalidState(format!(
                "{} is no longer writing update content",
                task.id
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use sipkit_sip_core::types::{Method, Uri};

    struct Echo {
        sent: Mutex<Vec<Request>>,
    }

    #[async_trait]
    impl RequestSender for Echo {
        async fn send(&self, request: Request) -> Result<Response, TransportError> {
            self.sent.lock().push(request);
            Ok(Response::new(200))
        }
    }

    #[derive(Default)]
    struct Events(Mutex<Vec<(RefreshId, u16, String)>>);

    impl RefreshListener for Events {
        fn refresh_event(&self, refresh_id: RefreshId, status_code: u16, reason_phrase: &str) {
            self.0.lock().push((refresh_id, status_code, reason_phrase.to_string()));
        }
    }

    fn register() -> Request {
        Request::new(Method::Register, Uri::parse("sip:example.com").unwrap())
            .with_header("CSeq", "1 REGISTER")
            .unwrap()
            .with_header("Expires", "120")
            .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_ids_are_never_reused() {
        let sender = Arc::new(Echo { sent: Mutex::new(Vec::new()) });
        let manager = RefreshManager::new(sender, RefreshConfig::default()).unwrap();
        let events = Arc::new(Events::default());
        let a = manager.start(register(), events.clone()).await.unwrap();
        manager.stop(a).await.unwrap();
        let b = manager.start(register(), events.clone()).await.unwrap();
        assert_ne!(a, b);
        assert!(!manager.is_active(a));
        assert!(manager.is_active(b));
        assert_eq!(manager.active_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_requires_cseq() {
        let sender = Arc::new(Echo { sent: Mutex::new(Vec::new()) });
        let manager = RefreshManager::new(sender.clone(), RefreshConfig::default()).unwrap();
        let request = Request::new(Method::Register, Uri::parse("sip:example.com").unwrap());
        let result = manager.start(request, Arc::new(Events::default())).await;
        assert!(matches!(result, Err(RefreshError::Protocol(_))));
        assert!(sender.sent.lock().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stopped_task_is_not_resent() {
        let sender = Arc::new(Echo { sent: Mutex::new(Vec::new()) });
        let manager = RefreshManager::new(sender.clone(), RefreshConfig::default()).unwrap();
        let events = Arc::new(Events::default());
        let id = manager.start(register(), events.clone()).await.unwrap();
        let task = manager.task(id).unwrap();
        let (generation, request) = {
            let state = task.state.lock();
            (state.generation, state.last_request.clone())
        };

        // Stop lands between a timer's check and its send.
        manager.stop(id).await.unwrap();
        assert_eq!(sender.sent.lock().len(), 2);
        let _gate = task.send_gate.lock().await;
        for admission in [Admission::Timer(generation), Admission::Live, Admission::Stream] {
            assert!(!manager.transmit(&task, request.clone(), admission).await);
        }
        assert_eq!(sender.sent.lock().len(), 2);
        assert_eq!(sender.sent.lock()[1].expires(), Some(0));
        assert_eq!(task.connection(), ConnectionState::Terminated);
        assert_eq!(events.0.lock().len(), 2);
    }

    #[test]
    fn test_admission() {
        assert!(Admission::Live.admits(ConnectionState::Idle, 3));
        assert!(Admission::Live.admits(ConnectionState::Proceeding, 3));
        assert!(!Admission::Live.admits(ConnectionState::Terminated, 3));
        assert!(Admission::Timer(3).admits(ConnectionState::Idle, 3));
        assert!(!Admission::Timer(2).admits(ConnectionState::Idle, 3));
        assert!(!Admission::Timer(3).admits(ConnectionState::Proceeding, 3));
        assert!(Admission::Stream.admits(ConnectionState::StreamOpen, 3));
        assert!(!Admission::Stream.admits(ConnectionState::Terminated, 3));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let sender = Arc::new(Echo { sent: Mutex::new(Vec::new()) });
        let config = RefreshConfig::default().with_default_expires(0);
        assert!(matches!(RefreshManager::new(sender, config), Err(RefreshError::Config(_))));
    }
}
