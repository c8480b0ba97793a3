//! WebSocket opening handshake values (RFC 6455 section 4.1).

use crate::base::neterror::NetError;
use base64::{engine::general_purpose, Engine as _};
use url::Url;

/// Protocol version sent in `Sec-WebSocket-Version`.
pub const WEBSOCKET_VERSION: &str = "13";

/// Whether `url` uses a WebSocket scheme.
pub fn is_websocket(url: &Url) -> bool {
    matches!(url.scheme(), "ws" | "wss")
}

/// Whether `url` is carried over TLS.
pub fn is_secured(url: &Url) -> bool {
    matches!(url.scheme(), "https" | "wss")
}

/// Fresh `Sec-WebSocket-Key`: base64 of 16 random bytes.
pub fn websocket_key() -> Result<String, NetError> {
    let mut nonce = [0u8; 16];
    boring::rand::rand_bytes(&mut nonce).map_err(|_| NetError::HashFailed)?;
    Ok(general_purpose::STANDARD.encode(nonce))
}

/// Default `Origin` for a handshake to `url`.
///
/// `http://` for `ws`, `https://` for `wss`; the port is kept only when the
/// URL names a non-default one.
pub fn origin_header(url: &Url) -> String {
    let scheme = if is_secured(url) { "https" } else { "http" };
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{}://{}:{}", scheme, host, port),
        None => format!("{}://{}", scheme, host),
    }
}
