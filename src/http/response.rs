//! HTTP response assembled from transport events.

use crate::base::neterror::NetError;
use bytes::{Bytes, BytesMut};
use http::{HeaderMap, StatusCode, Version};
use url::Url;

/// HTTP response with its body already in memory.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    status: StatusCode,
    version: Version,
    url: Url,
    headers: HeaderMap,
    trailers: HeaderMap,
    body: Bytes,
}

impl HttpResponse {
    /// Get the status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Get the HTTP version.
    pub fn version(&self) -> Version {
        self.version
    }

    /// URL the response was received for.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Get a reference to the headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Trailing headers of a chunked response.
    pub fn trailers(&self) -> &HeaderMap {
        &self.trailers
    }

    /// Accumulated body bytes. Empty unless body accumulation was enabled.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Body decoded as UTF-8, lossily.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Body parsed as JSON.
    #[cfg(feature = "json")]
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, NetError> {
        serde_json::from_slice(&self.body).map_err(|_| NetError::InvalidResponse)
    }
}

/// Collects status, headers and body parts into an [`HttpResponse`].
#[derive(Debug, Default)]
pub struct ResponseBuilder {
    status: Option<(StatusCode, Version, Url)>,
    headers: HeaderMap,
    trailers: HeaderMap,
    body: BytesMut,
}

impl ResponseBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accumulate_status(&mut self, status: StatusCode, version: Version, url: &Url) {
        self.status = Some((status, version, url.clone()));
    }

    pub fn accumulate_headers(&mut self, headers: &HeaderMap) {
        for (name, value) in headers {
            self.headers.append(name, value.clone());
        }
    }

    pub fn accumulate_trailers(&mut self, trailers: &HeaderMap) {
        for (name, value) in trailers {
            self.trailers.append(name, value.clone());
        }
    }

    pub fn accumulate_body_part(&mut self, chunk: &[u8]) {
        self.body.extend_from_slice(chunk);
    }

    /// Build the response, or `None` if no status was seen.
    pub fn build(&self) -> Option<HttpResponse> {
        let (status, version, url) = self.status.as_ref()?;
        Some(HttpResponse {
            status: *status,
            version: *version,
            url: url.clone(),
            headers: self.headers.clone(),
            trailers: self.trailers.clone(),
            body: Bytes::copy_from_slice(&self.body),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::{CONTENT_TYPE, HeaderValue};

    #[test]
    fn test_empty_builder() {
        assert!(ResponseBuilder::new().build().is_none());
    }

    #[test]
    fn test_accumulate() {
        let url = Url::parse("http://example.com/file").unwrap();
        let mut builder = ResponseBuilder::new();
        builder.accumulate_status(StatusCode::PARTIAL_CONTENT, Version::HTTP_11, &url);

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        builder.accumulate_headers(&headers);
        builder.accumulate_body_part(b"{\"ok\":");
        builder.accumulate_body_part(b"true}");

        let response = builder.build().unwrap();
        assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(response.url(), &url);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(response.text(), "{\"ok\":true}");

        let value: serde_json::Value = response.json().unwrap();
        assert_eq!(value["ok"], true);
    }
}
