//! Request assembly.
//!
//! [`RequestFactory`] turns a declarative [`Request`] into a [`WireRequest`]:
//! the method, request-target, ordered headers and body that the transport
//! writes to the connection.
//!
//! Header composition mirrors how a browser-grade HTTP/1.1 client behaves:
//! caller headers are kept verbatim and defaults only fill gaps. The one
//! exception is `Authorization`, which is appended to rather than replaced.
//!
//! # Example
//! ```ignore
//! use asyncnet::http::requestfactory::RequestFactory;
//! use asyncnet::urlrequest::{ClientConfig, Request};
//!
//! let factory = RequestFactory::new(ClientConfig::default());
//! let request = Request::builder(http::Method::GET, "http://example.com/a?b=c")?.build();
//! let wire = factory.new_wire_request(&request, false, None, None, None)?;
//! assert_eq!(wire.uri(), "/a?b=c");
//! ```

use crate::base::neterror::NetError;
use crate::http::authutils::{per_request_authorization_header, per_request_proxy_authorization_header};
use crate::http::charset::{latin1_bytes, Charset};
use crate::http::multipart::Form;
use crate::http::orderedheaders::OrderedHeaderMap;
use crate::http::realm::Realm;
use crate::http::requestbody::{ByteStream, WireBody};
use crate::socket::proxy::ProxyServer;
use crate::urlrequest::context::ClientConfig;
use crate::urlrequest::request::{BodyGeneratorSource, Request};
use crate::ws::handshake;
use bytes::Bytes;
use cookie::Cookie;
use futures::StreamExt;
use http::header::{
    HeaderName, HeaderValue, ACCEPT, ACCEPT_ENCODING, AUTHORIZATION, CONNECTION, CONTENT_LENGTH,
    CONTENT_TYPE, COOKIE, HOST, ORIGIN, PROXY_AUTHORIZATION, SEC_WEBSOCKET_KEY,
    SEC_WEBSOCKET_VERSION, TRANSFER_ENCODING, UPGRADE, USER_AGENT,
};
use http::{Method, Version};
use std::borrow::Cow;
use url::{form_urlencoded, Url};

const ACCEPT_ALL: &str = "*/*";
const GZIP_DEFLATE: &str = "gzip, deflate";
const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// A request ready to be written to the wire.
#[derive(Debug)]
pub struct WireRequest {
    method: Method,
    uri: String,
    version: Version,
    headers: OrderedHeaderMap,
    body: Option<WireBody>,
}

impl WireRequest {
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Request-target: authority, absolute or origin form.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn headers(&self) -> &OrderedHeaderMap {
        &self.headers
    }

    pub fn body(&self) -> Option<&WireBody> {
        self.body.as_ref()
    }

    /// Take the body out, leaving the request bodiless.
    pub fn take_body(&mut self) -> Option<WireBody> {
        self.body.take()
    }

    /// Convert into an [`http::Request`] for transports built on the `http` crate.
    ///
    /// Header order is preserved.
    pub fn into_http_request(self) -> Result<http::Request<Option<WireBody>>, NetError> {
        let uri = http::Uri::try_from(self.uri.as_str()).map_err(|_| NetError::InvalidUrl)?;
        let mut request = http::Request::new(self.body);
        *request.method_mut() = self.method;
        *request.uri_mut() = uri;
        *request.version_mut() = self.version;
        // headers were validated when inserted; only the target can fail
        *request.headers_mut() = self.headers.to_header_map();
        Ok(request)
    }
}

/// Builds [`WireRequest`]s from [`Request`]s.
///
/// Holds only immutable configuration and may be shared between threads.
#[derive(Debug, Clone, Default)]
pub struct RequestFactory {
    config: ClientConfig,
}

impl RequestFactory {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Assemble the wire form of `request`.
    ///
    /// With `perform_connect` the result is the CONNECT request that opens a
    /// tunnel through `proxy`; it never carries a body. `realm` and
    /// `proxy_realm` produce `Authorization` and `Proxy-Authorization` values
    /// when they are preemptive.
    ///
    /// # Errors
    /// - [`NetError::InvalidHeader`] if a computed header value is not valid
    /// - digest errors from rebuilding a realm for this request
    pub fn new_wire_request(
        &self,
        request: &Request,
        perform_connect: bool,
        proxy: Option<&ProxyServer>,
        realm: Option<&Realm>,
        proxy_realm: Option<&Realm>,
    ) -> Result<WireRequest, NetError> {
        let url = request.url();
        let method = if perform_connect {
            Method::CONNECT
        } else {
            request.method().clone()
        };
        let connect = method == Method::CONNECT;

        let uri = request_target(url, proxy, connect);
        let body = if connect { None } else { select_body(request) };

        let mut headers = OrderedHeaderMap::new();

        if connect {
            // a tunnel only carries what the proxy needs to see
            copy_all(&mut headers, request.headers(), PROXY_AUTHORIZATION);
            copy_all(&mut headers, request.headers(), USER_AGENT);
        } else {
            headers = request.headers().clone();

            if !request.cookies().is_empty() {
                let encoded = encode_cookies(request.cookies(), self.config.use_lax_cookie_encoder);
                headers.set(COOKIE, header_value(&encoded)?);
            }

            match headers.get_str(ACCEPT_ENCODING).map(str::to_string) {
                Some(user_defined) => {
                    // Automatic decompression cannot handle brotli.
                    if self.config.enable_automatic_decompression {
                        let filtered = filter_out_brotli(&user_defined);
                        headers.set(ACCEPT_ENCODING, header_value(&filtered)?);
                    }
                }
                None if self.config.compression_enforced => {
                    headers.set(ACCEPT_ENCODING, HeaderValue::from_static(GZIP_DEFLATE));
                }
                None => {}
            }
        }

        // a caller-declared framing is left alone; never send both
        if !headers.contains(CONTENT_LENGTH) && !headers.contains(TRANSFER_ENCODING) {
            match &body {
                Some(body) => match body.content_length() {
                    Some(length) => headers.set(CONTENT_LENGTH, HeaderValue::from(length)),
                    None => headers.set(TRANSFER_ENCODING, HeaderValue::from_static("chunked")),
                },
                None if matches!(method, Method::POST | Method::PUT | Method::PATCH) => {
                    headers.set(CONTENT_LENGTH, HeaderValue::from_static("0"));
                }
                None => {}
            }
        }

        if let Some(content_type) = body.as_ref().and_then(WireBody::content_type_override) {
            headers.set(CONTENT_TYPE, header_value(content_type)?);
        }

        if !connect && handshake::is_websocket(url) {
            headers.set(UPGRADE, HeaderValue::from_static("websocket"));
            headers.set(CONNECTION, HeaderValue::from_static("Upgrade"));
            headers.set(SEC_WEBSOCKET_KEY, header_value(&handshake::websocket_key()?)?);
            headers.set(
                SEC_WEBSOCKET_VERSION,
                HeaderValue::from_static(handshake::WEBSOCKET_VERSION),
            );
            if !headers.contains(ORIGIN) {
                headers.set(ORIGIN, header_value(&handshake::origin_header(url))?);
            }
        } else if !headers.contains(CONNECTION) {
            if let Some(value) = connection_header(self.config.keep_alive, Version::HTTP_11) {
                headers.set(CONNECTION, HeaderValue::from_static(value));
            }
        }

        if !headers.contains(HOST) {
            let host = match request.virtual_host() {
                Some(virtual_host) => virtual_host.to_string(),
                None => host_header(url),
            };
            headers.set(HOST, header_value(&host)?);
        }

        // appended so caller-supplied credentials survive
        if let Some(value) = per_request_authorization_header(request, realm)? {
            headers.add(AUTHORIZATION, header_value(&value)?);
        }

        // an established TLS tunnel carries no further proxy credentials
        if !handshake::is_secured(url) || connect {
            if let Some(value) = per_request_proxy_authorization_header(request, proxy_realm)? {
                headers.set(PROXY_AUTHORIZATION, header_value(&value)?);
            }
        }

        if !headers.contains(ACCEPT) {
            headers.set(ACCEPT, HeaderValue::from_static(ACCEPT_ALL));
        }

        if !headers.contains(USER_AGENT) {
            if let Some(user_agent) = self.config.user_agent.as_deref() {
                headers.set(USER_AGENT, header_value(user_agent)?);
            }
        }

        tracing::debug!(
            method = %method,
            target = %uri,
            body = body.as_ref().map_or("none", WireBody::kind),
            headers = headers.len(),
            "assembled wire request"
        );

        Ok(WireRequest {
            method,
            uri,
            version: Version::HTTP_11,
            headers,
            body,
        })
    }
}

/// Request-target for `url`.
///
/// CONNECT uses `host:port`; a plain target behind an HTTP proxy needs the
/// absolute URL; everything else sends path and query only.
fn request_target(url: &Url, proxy: Option<&ProxyServer>, connect: bool) -> String {
    if connect {
        let port = url.port_or_known_default().unwrap_or(80);
        return format!("{}:{}", url.host_str().unwrap_or_default(), port);
    }

    let via_http_proxy = proxy.is_some_and(|p| p.proxy_type().is_http());
    if via_http_proxy && !handshake::is_secured(url) {
        let mut absolute = url.clone();
        absolute.set_fragment(None);
        return absolute.to_string();
    }

    match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    }
}

/// First available body source, in declaration order.
fn select_body(request: &Request) -> Option<WireBody> {
    let charset = request.charset();

    if let Some(data) = request.byte_data() {
        return Some(WireBody::Bytes(data.clone()));
    }
    if let Some(parts) = request.composite_byte_data() {
        return Some(WireBody::Composite(parts.to_vec()));
    }
    if let Some(text) = request.string_data() {
        return Some(WireBody::Buffer {
            data: Bytes::from(charset.encode(text)),
            content_type: None,
        });
    }
    if let Some(data) = request.byte_buffer_data() {
        return Some(WireBody::Buffer {
            data: data.clone(),
            content_type: None,
        });
    }
    if let Some(source) = request.stream_data() {
        return Some(WireBody::Stream {
            stream: take_stream(source.take()),
            content_length: source.content_length(),
        });
    }
    if !request.form_params().is_empty() {
        let content_type = if request.headers().contains(CONTENT_TYPE) {
            None
        } else {
            Some(FORM_URLENCODED.to_string())
        };
        return Some(WireBody::Buffer {
            data: Bytes::from(url_encode_form(request.form_params(), charset)),
            content_type,
        });
    }
    if !request.body_parts().is_empty() {
        let caller_type = request.headers().get_str(CONTENT_TYPE);
        let form = Form::for_content_type(request.body_parts().to_vec(), caller_type);
        let content_type = form.content_type_for(caller_type);
        return Some(WireBody::Multipart { form, content_type });
    }
    if let Some(region) = request.file() {
        return Some(WireBody::File(region.clone()));
    }
    match request.body_generator()? {
        BodyGeneratorSource::FileRegion(region) => Some(WireBody::File(region.clone())),
        BodyGeneratorSource::Stream(source) => Some(WireBody::Stream {
            stream: take_stream(source.take()),
            content_length: source.content_length(),
        }),
        BodyGeneratorSource::Custom(generator) => Some(WireBody::Generated(generator.create_body())),
    }
}

fn take_stream(stream: Option<ByteStream>) -> ByteStream {
    match stream {
        Some(stream) => stream,
        None => {
            tracing::warn!("request stream already consumed, sending an empty body");
            futures::stream::empty().boxed()
        }
    }
}

fn url_encode_form(params: &[(String, String)], charset: Charset) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    if charset == Charset::Latin1 {
        serializer.encoding_override(Some(&latin1_override));
    }
    serializer
        .extend_pairs(params.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .finish()
}

fn latin1_override(text: &str) -> Cow<'_, [u8]> {
    Cow::Owned(latin1_bytes(text))
}

/// `Cookie` header value.
///
/// The strict encoder percent-encodes and puts more specific paths first
/// (RFC 6265 section 5.4); the lax one writes pairs as given.
fn encode_cookies(cookies: &[Cookie<'static>], lax: bool) -> String {
    if lax {
        return cookies
            .iter()
            .map(|c| format!("{}={}", c.name(), c.value()))
            .collect::<Vec<_>>()
            .join("; ");
    }

    let mut sorted: Vec<&Cookie<'static>> = cookies.iter().collect();
    // stable sort keeps insertion order among equal paths
    sorted.sort_by_key(|c| std::cmp::Reverse(c.path().map_or(0, str::len)));
    sorted
        .iter()
        .map(|c| {
            let bare = Cookie::new(c.name().to_string(), c.value().to_string());
            bare.encoded().to_string()
        })
        .collect::<Vec<_>>()
        .join("; ")
}

fn filter_out_brotli(accept_encoding: &str) -> String {
    let is_brotli = |token: &str| {
        let coding = token.split(';').next().unwrap_or_default().trim();
        coding.eq_ignore_ascii_case("br")
    };
    if !accept_encoding.split(',').any(is_brotli) {
        return accept_encoding.to_string();
    }
    accept_encoding
        .split(',')
        .filter(|token| !is_brotli(*token))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

/// HTTP/1.1 defaults to keep-alive, HTTP/1.0 does not.
fn connection_header(keep_alive: bool, version: Version) -> Option<&'static str> {
    let keep_alive_default = version >= Version::HTTP_11;
    match (keep_alive_default, keep_alive) {
        (true, true) => None,
        (true, false) => Some("close"),
        (false, true) => Some("keep-alive"),
        (false, false) => None,
    }
}

/// `host` or `host:port` when the URL names a non-default port.
fn host_header(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    }
}

fn copy_all(target: &mut OrderedHeaderMap, source: &OrderedHeaderMap, name: HeaderName) {
    let values: Vec<HeaderValue> = source.get_all(name.as_str()).cloned().collect();
    target.set_all(name, values);
}

fn header_value(value: &str) -> Result<HeaderValue, NetError> {
    HeaderValue::from_str(value).map_err(|_| NetError::InvalidHeader)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_request_target_forms() {
        let proxy = ProxyServer::builder("proxy", 3128).build();
        let plain = url("http://example.com/a/b?c=d#frag");
        let secure = url("https://example.com/a");

        assert_eq!(request_target(&plain, None, false), "/a/b?c=d");
        assert_eq!(request_target(&plain, Some(&proxy), false), "http://example.com/a/b?c=d");
        assert_eq!(request_target(&secure, Some(&proxy), false), "/a");
        assert_eq!(request_target(&secure, Some(&proxy), true), "example.com:443");
        assert_eq!(request_target(&url("http://example.com"), None, false), "/");
    }

    #[test]
    fn test_socks_proxy_uses_relative_form() {
        let proxy = ProxyServer::from_url("socks5://127.0.0.1:1080").unwrap();
        assert_eq!(request_target(&url("http://example.com/x"), Some(&proxy), false), "/x");
    }

    #[test]
    fn test_filter_out_brotli() {
        assert_eq!(filter_out_brotli("gzip, deflate, br"), "gzip, deflate");
        assert_eq!(filter_out_brotli("br;q=1.0, gzip;q=0.8"), "gzip;q=0.8");
        assert_eq!(filter_out_brotli("gzip,deflate"), "gzip,deflate");
        assert_eq!(filter_out_brotli("brotli-ish"), "brotli-ish");
    }

    #[test]
    fn test_connection_header_matrix() {
        assert_eq!(connection_header(true, Version::HTTP_11), None);
        assert_eq!(connection_header(false, Version::HTTP_11), Some("close"));
        assert_eq!(connection_header(true, Version::HTTP_10), Some("keep-alive"));
        assert_eq!(connection_header(false, Version::HTTP_10), None);
    }

    #[test]
    fn test_host_header() {
        assert_eq!(host_header(&url("http://example.com:80/")), "example.com");
        assert_eq!(host_header(&url("http://example.com:8080/")), "example.com:8080");
        assert_eq!(host_header(&url("wss://example.com/")), "example.com");
    }

    #[test]
    fn test_cookie_encoders() {
        let root = Cookie::build(("a", "1")).path("/").build();
        let deep = Cookie::build(("b", "x y")).path("/account/settings").build();
        let cookies = vec![root, deep];

        assert_eq!(encode_cookies(&cookies, false), "b=x%20y; a=1");
        assert_eq!(encode_cookies(&cookies, true), "a=1; b=x y");
    }

    #[test]
    fn test_url_encode_form_latin1() {
        let params = vec![("name".to_string(), "caf\u{e9}".to_string())];
        assert_eq!(url_encode_form(&params, Charset::Utf8), "name=caf%C3%A9");
        assert_eq!(url_encode_form(&params, Charset::Latin1), "name=caf%E9");
    }
}
