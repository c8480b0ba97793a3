//! Declarative request description.
//!
//! A [`Request`] says *what* to send; [`RequestFactory`](crate::http::requestfactory::RequestFactory)
//! turns it into a [`WireRequest`](crate::http::requestfactory::WireRequest).
//! Several body sources may be set at once; assembly picks the first one in
//! the order the fields are declared here.

use crate::base::neterror::NetError;
use crate::http::charset::Charset;
use crate::http::multipart::Part;
use crate::http::orderedheaders::OrderedHeaderMap;
use crate::http::requestbody::{BodyGenerator, FileRegion, StreamSource};
use bytes::Bytes;
use cookie::Cookie;
use http::Method;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use url::Url;

/// Generator-backed body sources.
#[derive(Clone)]
pub enum BodyGeneratorSource {
    /// A file region produced on demand.
    FileRegion(FileRegion),
    /// A stream with an optional declared length.
    Stream(StreamSource),
    /// Any other lazily created body.
    Custom(Arc<dyn BodyGenerator>),
}

impl fmt::Debug for BodyGeneratorSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FileRegion(region) => f.debug_tuple("FileRegion").field(region).finish(),
            Self::Stream(stream) => f.debug_tuple("Stream").field(stream).finish(),
            Self::Custom(_) => f.write_str("Custom"),
        }
    }
}

/// An HTTP request as described by the caller.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    url: Url,
    headers: OrderedHeaderMap,
    cookies: Vec<Cookie<'static>>,
    virtual_host: Option<String>,
    charset: Option<Charset>,
    byte_data: Option<Bytes>,
    composite_byte_data: Option<Vec<Bytes>>,
    string_data: Option<String>,
    byte_buffer_data: Option<Bytes>,
    stream_data: Option<StreamSource>,
    form_params: Vec<(String, String)>,
    body_parts: Vec<Part>,
    file: Option<FileRegion>,
    body_generator: Option<BodyGeneratorSource>,
}

impl Request {
    /// Start a builder for `method` and `url`.
    pub fn builder(method: Method, url: &str) -> Result<RequestBuilder, NetError> {
        RequestBuilder::new(method, url)
    }

    /// Reopen this request for modification.
    pub fn to_builder(&self) -> RequestBuilder {
        RequestBuilder {
            inner: self.clone(),
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &OrderedHeaderMap {
        &self.headers
    }

    pub fn cookies(&self) -> &[Cookie<'static>] {
        &self.cookies
    }

    pub fn virtual_host(&self) -> Option<&str> {
        self.virtual_host.as_deref()
    }

    /// Body charset; UTF-8 unless set.
    pub fn charset(&self) -> Charset {
        self.charset.unwrap_or_default()
    }

    pub fn byte_data(&self) -> Option<&Bytes> {
        self.byte_data.as_ref()
    }

    pub fn composite_byte_data(&self) -> Option<&[Bytes]> {
        self.composite_byte_data.as_deref()
    }

    pub fn string_data(&self) -> Option<&str> {
        self.string_data.as_deref()
    }

    pub fn byte_buffer_data(&self) -> Option<&Bytes> {
        self.byte_buffer_data.as_ref()
    }

    pub fn stream_data(&self) -> Option<&StreamSource> {
        self.stream_data.as_ref()
    }

    pub fn form_params(&self) -> &[(String, String)] {
        &self.form_params
    }

    pub fn body_parts(&self) -> &[Part] {
        &self.body_parts
    }

    pub fn file(&self) -> Option<&FileRegion> {
        self.file.as_ref()
    }

    pub fn body_generator(&self) -> Option<&BodyGeneratorSource> {
        self.body_generator.as_ref()
    }
}

/// Builder for [`Request`].
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    inner: Request,
}

impl RequestBuilder {
    pub fn new(method: Method, url: &str) -> Result<Self, NetError> {
        let url = Url::parse(url).map_err(|_| NetError::InvalidUrl)?;
        Ok(Self {
            inner: Request {
                method,
                url,
                headers: OrderedHeaderMap::new(),
                cookies: Vec::new(),
                virtual_host: None,
                charset: None,
                byte_data: None,
                composite_byte_data: None,
                string_data: None,
                byte_buffer_data: None,
                stream_data: None,
                form_params: Vec::new(),
                body_parts: Vec::new(),
                file: None,
                body_generator: None,
            },
        })
    }

    /// Set a header, replacing existing values.
    pub fn header(mut self, name: &str, value: &str) -> Result<Self, NetError> {
        self.inner.headers.insert(name, value)?;
        Ok(self)
    }

    /// Add a header value, keeping existing ones.
    pub fn add_header(mut self, name: &str, value: &str) -> Result<Self, NetError> {
        self.inner.headers.append(name, value)?;
        Ok(self)
    }

    pub fn headers(mut self, headers: OrderedHeaderMap) -> Self {
        self.inner.headers = headers;
        self
    }

    pub fn cookie(mut self, cookie: Cookie<'static>) -> Self {
        self.inner.cookies.push(cookie);
        self
    }

    pub fn virtual_host(mut self, host: &str) -> Self {
        self.inner.virtual_host = Some(host.to_string());
        self
    }

    pub fn charset(mut self, charset: Charset) -> Self {
        self.inner.charset = Some(charset);
        self
    }

    pub fn body_bytes(mut self, data: impl Into<Bytes>) -> Self {
        self.inner.byte_data = Some(data.into());
        self
    }

    pub fn body_composite(mut self, parts: Vec<Bytes>) -> Self {
        self.inner.composite_byte_data = Some(parts);
        self
    }

    pub fn body_text(mut self, text: impl Into<String>) -> Self {
        self.inner.string_data = Some(text.into());
        self
    }

    pub fn body_buffer(mut self, data: impl Into<Bytes>) -> Self {
        self.inner.byte_buffer_data = Some(data.into());
        self
    }

    pub fn body_stream(mut self, stream: StreamSource) -> Self {
        self.inner.stream_data = Some(stream);
        self
    }

    pub fn form_param(mut self, name: &str, value: &str) -> Self {
        self.inner
            .form_params
            .push((name.to_string(), value.to_string()));
        self
    }

    pub fn body_part(mut self, part: Part) -> Self {
        self.inner.body_parts.push(part);
        self
    }

    /// Send the whole file at `path`.
    pub fn body_file(mut self, path: impl AsRef<Path>) -> Result<Self, NetError> {
        self.inner.file = Some(FileRegion::whole(path)?);
        Ok(self)
    }

    pub fn body_generator(mut self, generator: BodyGeneratorSource) -> Self {
        self.inner.body_generator = Some(generator);
        self
    }

    pub fn build(self) -> Request {
        self.inner
    }
}
