use std::io;
use std::sync::Arc;

use bytes::Bytes;
use sipkit_sip_core::types::{Request, SipMessage};
use tracing::trace;

use super::task::RefreshTask;
use super::RefreshManager;
use crate::errors::RefreshResult;

/// Collects the body of an updated refresh request.
///
/// Accepts at most the announced content length; extra bytes are refused
/// with a zero-length write. [`close`](Self::close) sends the request.
/// Dropping the writer unclosed abandons the update and the task resumes
/// refreshing its previous request.
pub struct RefreshContentWriter {
    manager: RefreshManager,
    task: Arc<RefreshTask>,
    request: Option<Request>,
    content_type: String,
    buffer: Vec<u8>,
    expected: usize,
}

impl RefreshContentWriter {
    pub(crate) fn new(
        manager: RefreshManager,
        task: Arc<RefreshTask>,
        request: Request,
        content_type: &str,
        expected: usize,
    ) -> Self {
        RefreshContentWriter {
            manager,
            task,
            request: Some(request),
            content_type: content_type.to_string(),
            buffer: Vec::with_capacity(expected),
            expected,
        }
    }

    pub fn remaining(&self) -> usize {
        self.expected - self.buffer.len()
    }

    /// Attaches the collected content and sends the request.
    pub async fn close(mut self) -> RefreshResult<()> {
        let Some(mut request) = self.request.take() else {
            return Ok(());
        };
        let body = Bytes::from(std::mem::take(&mut self.buffer));
        request.set_body(&self.content_type, body)?;
        self.manager.send_streamed(&self.task, request).await
    }
}

impl io::Write for RefreshContentWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let accepted = buf.len().min(self.remaining());
        self.buffer.extend_from_slice(&buf[..accepted]);
        trace!(refresh_id = %self.task.id, accepted, "update content written");
        Ok(accepted)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for RefreshContentWriter {
    fn drop(&mut self) {
        if self.request.is_some() {
            self.manager.abandon_stream(&self.task);
        }
    }
}
