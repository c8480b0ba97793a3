//! The response event handler interface.

use crate::base::neterror::NetError;
use crate::http::response::HttpResponse;
use http::{HeaderMap, StatusCode, Version};
use url::Url;

/// What the transport should do after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum State {
    /// Keep delivering events.
    #[default]
    Continue,
    /// Stop the transfer.
    Abort,
}

/// Status line of a response, with the URL it answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseStatus {
    status: StatusCode,
    version: Version,
    url: Url,
}

impl ResponseStatus {
    pub fn new(status: StatusCode, version: Version, url: Url) -> Self {
        Self {
            status,
            version,
            url,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

/// Receives the events of one response.
///
/// Events arrive in order: one status, one header block, any number of body
/// parts, optional trailers, then completion. `on_throwable` may replace
/// any of them when the transfer fails.
pub trait AsyncHandler: Send {
    fn on_status_received(&mut self, status: &ResponseStatus) -> Result<State, NetError>;

    fn on_headers_received(&mut self, headers: &HeaderMap) -> Result<State, NetError>;

    fn on_body_part_received(&mut self, part: &[u8]) -> Result<State, NetError>;

    fn on_trailing_headers_received(&mut self, _trailers: &HeaderMap) -> Result<State, NetError> {
        Ok(State::Continue)
    }

    fn on_throwable(&mut self, _error: &NetError) {}

    fn on_completed(&mut self) -> Result<Option<HttpResponse>, NetError>;
}

/// Handler that accepts every event and produces nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHandler;

impl AsyncHandler for NoopHandler {
    fn on_status_received(&mut self, _status: &ResponseStatus) -> Result<State, NetError> {
        Ok(State::Continue)
    }

    fn on_headers_received(&mut self, _headers: &HeaderMap) -> Result<State, NetError> {
        Ok(State::Continue)
    }

    fn on_body_part_received(&mut self, _part: &[u8]) -> Result<State, NetError> {
        Ok(State::Continue)
    }

    fn on_completed(&mut self) -> Result<Option<HttpResponse>, NetError> {
        Ok(None)
    }
}

impl<H: AsyncHandler + ?Sized> AsyncHandler for Box<H> {
    fn on_status_received(&mut self, status: &ResponseStatus) -> Result<State, NetError> {
        (**self).on_status_received(status)
    }

    fn on_headers_received(&mut self, headers: &HeaderMap) -> Result<State, NetError> {
        (**self).on_headers_received(headers)
    }

    fn on_body_part_received(&mut self, part: &[u8]) -> Result<State, NetError> {
        (**self).on_body_part_received(part)
    }

    fn on_trailing_headers_received(&mut self, trailers: &HeaderMap) -> Result<State, NetError> {
        (**self).on_trailing_headers_received(trailers)
    }

    fn on_throwable(&mut self, error: &NetError) {
        (**self).on_throwable(error)
    }

    fn on_completed(&mut self) -> Result<Option<HttpResponse>, NetError> {
        (**self).on_completed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_handler() {
        let mut handler: Box<dyn AsyncHandler> = Box::new(NoopHandler);
        let status = ResponseStatus::new(
            StatusCode::OK,
            Version::HTTP_11,
            Url::parse("http://example.com/").unwrap(),
        );
        assert_eq!(handler.on_status_received(&status).unwrap(), State::Continue);
        assert_eq!(handler.on_headers_received(&HeaderMap::new()).unwrap(), State::Continue);
        assert_eq!(handler.on_body_part_received(b"abc").unwrap(), State::Continue);
        assert_eq!(
            handler.on_trailing_headers_received(&HeaderMap::new()).unwrap(),
            State::Continue
        );
        assert!(handler.on_completed().unwrap().is_none());
    }
}
