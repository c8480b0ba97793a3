//! Resumable downloads.
//!
//! [`ResumableAsyncHandler`] decorates another [`AsyncHandler`]. It counts
//! the body bytes of a `200`/`206` response, records the count under the
//! response URL after every part, and forgets it when the transfer completes.
//! Before a retry, [`adjust_request_range`](ResumableAsyncHandler::adjust_request_range)
//! turns the recorded count into a `Range: bytes=N-` header.

use crate::base::neterror::NetError;
use crate::handler::asynchandler::{AsyncHandler, NoopHandler, ResponseStatus, State};
use crate::handler::listener::{CountingListener, ResumableListener};
use crate::handler::processor::{NullProcessor, ResumableProcessor, ResumableSession};
use crate::http::response::{HttpResponse, ResponseBuilder};
use crate::urlrequest::request::Request;
use http::header::{CONTENT_LENGTH, RANGE};
use http::{HeaderMap, StatusCode};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// When progress is written to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProgressPolicy {
    /// Count and persist every received part, even one the listener or the
    /// inner handler answered with [`State::Abort`].
    #[default]
    AlwaysPersist,
}

/// Lifecycle of one transfer attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Receiving,
    Completed,
    Aborted,
}

/// Handler that tracks download progress for resumption.
pub struct ResumableAsyncHandler {
    session: Arc<ResumableSession>,
    processor: Arc<dyn ResumableProcessor>,
    inner: Box<dyn AsyncHandler>,
    listener: Box<dyn ResumableListener>,
    byte_transferred: AtomicU64,
    url: Option<String>,
    accumulate_body: bool,
    policy: ProgressPolicy,
    response: ResponseBuilder,
    phase: Phase,
}

impl ResumableAsyncHandler {
    pub fn builder(session: Arc<ResumableSession>) -> ResumableHandlerBuilder {
        ResumableHandlerBuilder::new(session)
    }

    /// Bytes counted so far, including any resumed offset.
    pub fn byte_transferred(&self) -> u64 {
        self.byte_transferred.load(Ordering::SeqCst)
    }

    /// Resource key of the current attempt, once a usable status arrived.
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn policy(&self) -> ProgressPolicy {
        self.policy
    }

    /// Replace the byte sink.
    pub fn set_listener(&mut self, listener: Box<dyn ResumableListener>) {
        self.listener = listener;
    }

    /// Prepare `request` to resume where an earlier attempt stopped.
    ///
    /// The offset comes from the session index, overridden by the listener's
    /// length when that is known and different. A `Range` header is added
    /// unless the request has one or the offset is 0. `request` itself is
    /// left untouched.
    pub fn adjust_request_range(&self, request: &Request) -> Result<Request, NetError> {
        if let Some(offset) = self.session.offset(request.url().as_str()) {
            self.byte_transferred.store(offset, Ordering::SeqCst);
        }

        let known = self.listener.length();
        if known > 0 && known != self.byte_transferred.load(Ordering::SeqCst) {
            self.byte_transferred.store(known, Ordering::SeqCst);
        }

        let offset = self.byte_transferred.load(Ordering::SeqCst);
        let mut builder = request.to_builder();
        if !request.headers().contains(RANGE) && offset != 0 {
            builder = builder.header(RANGE.as_str(), &format!("bytes={}-", offset))?;
            tracing::debug!(url = %request.url(), offset, "resuming download");
        }
        Ok(builder.build())
    }

    fn abort(&mut self) -> State {
        self.phase = Phase::Aborted;
        State::Abort
    }

    fn adopt(&mut self, state: State) -> State {
        match state {
            State::Abort => self.abort(),
            State::Continue => State::Continue,
        }
    }

    fn persist_progress(&self, part_len: usize) {
        let Some(url) = self.url.as_deref() else {
            return;
        };
        match self.policy {
            ProgressPolicy::AlwaysPersist => {
                let offset = self
                    .byte_transferred
                    .fetch_add(part_len as u64, Ordering::SeqCst)
                    + part_len as u64;
                self.processor.put(url, offset);
                self.session.record(url, offset);
            }
        }
    }
}

impl AsyncHandler for ResumableAsyncHandler {
    fn on_status_received(&mut self, status: &ResponseStatus) -> Result<State, NetError> {
        self.response
            .accumulate_status(status.status(), status.version(), status.url());

        if status.status() != StatusCode::OK && status.status() != StatusCode::PARTIAL_CONTENT {
            tracing::debug!(status = %status.status(), url = %status.url(), "not resumable, aborting");
            return Ok(self.abort());
        }
        self.url = Some(status.url().to_string());
        self.phase = Phase::Receiving;

        let state = self.inner.on_status_received(status)?;
        Ok(self.adopt(state))
    }

    fn on_headers_received(&mut self, headers: &HeaderMap) -> Result<State, NetError> {
        if self.phase == Phase::Aborted {
            return Ok(State::Abort);
        }
        self.response.accumulate_headers(headers);

        if let Some(value) = headers.get(CONTENT_LENGTH) {
            let length = value.to_str().ok().and_then(|v| v.trim().parse::<i64>().ok());
            match length {
                Some(-1) | None => {
                    tracing::debug!(content_length = ?value, "unusable Content-Length, aborting");
                    return Ok(self.abort());
                }
                Some(_) => {}
            }
        }

        let state = self.inner.on_headers_received(headers)?;
        Ok(self.adopt(state))
    }

    fn on_body_part_received(&mut self, part: &[u8]) -> Result<State, NetError> {
        if self.phase == Phase::Aborted {
            return Ok(State::Abort);
        }
        if self.accumulate_body {
            self.response.accumulate_body_part(part);
        }

        let state = match self.listener.on_bytes_received(part) {
            Ok(()) => self.inner.on_body_part_received(part)?,
            Err(e) => {
                tracing::warn!(error = %e, "resumable listener failed");
                State::Abort
            }
        };

        self.persist_progress(part.len());
        Ok(self.adopt(state))
    }

    fn on_trailing_headers_received(&mut self, trailers: &HeaderMap) -> Result<State, NetError> {
        if self.phase == Phase::Aborted {
            return Ok(State::Abort);
        }
        self.response.accumulate_trailers(trailers);
        let state = self.inner.on_trailing_headers_received(trailers)?;
        Ok(self.adopt(state))
    }

    fn on_throwable(&mut self, error: &NetError) {
        tracing::debug!(error = %error, url = ?self.url, "resumable transfer failed");
        self.inner.on_throwable(error);
    }

    fn on_completed(&mut self) -> Result<Option<HttpResponse>, NetError> {
        if let Some(url) = self.url.as_deref() {
            self.processor.remove(url);
            self.session.forget(url);
        }
        self.listener.on_all_bytes_received();
        self.phase = Phase::Completed;

        self.inner.on_completed()?;
        Ok(self.response.build())
    }
}

impl std::fmt::Debug for ResumableAsyncHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResumableAsyncHandler")
            .field("url", &self.url)
            .field("byte_transferred", &self.byte_transferred())
            .field("phase", &self.phase)
            .field("accumulate_body", &self.accumulate_body)
            .field("policy", &self.policy)
            .finish()
    }
}

/// Builder for [`ResumableAsyncHandler`].
pub struct ResumableHandlerBuilder {
    session: Arc<ResumableSession>,
    processor: Option<Arc<dyn ResumableProcessor>>,
    inner: Option<Box<dyn AsyncHandler>>,
    listener: Option<Box<dyn ResumableListener>>,
    byte_transferred: u64,
    accumulate_body: bool,
    policy: ProgressPolicy,
}

impl ResumableHandlerBuilder {
    pub fn new(session: Arc<ResumableSession>) -> Self {
        Self {
            session,
            processor: None,
            inner: None,
            listener: None,
            byte_transferred: 0,
            accumulate_body: false,
            policy: ProgressPolicy::default(),
        }
    }

    /// Store for offsets. Defaults to [`NullProcessor`].
    pub fn processor(mut self, processor: Arc<dyn ResumableProcessor>) -> Self {
        self.processor = Some(processor);
        self
    }

    /// Handler to decorate. Defaults to [`NoopHandler`].
    pub fn inner(mut self, inner: Box<dyn AsyncHandler>) -> Self {
        self.inner = Some(inner);
        self
    }

    /// Byte sink. Defaults to [`CountingListener`].
    pub fn listener(mut self, listener: Box<dyn ResumableListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Starting offset.
    pub fn byte_transferred(mut self, offset: u64) -> Self {
        self.byte_transferred = offset;
        self
    }

    /// Keep body parts in the final response.
    pub fn accumulate_body(mut self, accumulate: bool) -> Self {
        self.accumulate_body = accumulate;
        self
    }

    pub fn policy(mut self, policy: ProgressPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Build the handler and register its processor with the session.
    ///
    /// Registration happens here, before any body part can be recorded.
    pub fn build(self) -> ResumableAsyncHandler {
        let processor = self
            .processor
            .unwrap_or_else(|| Arc::new(NullProcessor) as Arc<dyn ResumableProcessor>);
        self.session.register(processor.clone());

        ResumableAsyncHandler {
            session: self.session,
            processor,
            inner: self.inner.unwrap_or_else(|| Box::new(NoopHandler)),
            listener: self
                .listener
                .unwrap_or_else(|| Box::new(CountingListener::new())),
            byte_transferred: AtomicU64::new(self.byte_transferred),
            url: None,
            accumulate_body: self.accumulate_body,
            policy: self.policy,
            response: ResponseBuilder::new(),
            phase: Phase::Idle,
        }
    }
}
