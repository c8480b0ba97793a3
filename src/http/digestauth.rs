//! HTTP Digest Authentication (RFC 2617).
//!
//! Computes the cryptographic fields of a Digest `Authorization` header:
//! the client nonce and the request-digest built from HA1 and HA2.
//!
//! ## Supported Features
//! - MD5 and MD5-sess algorithms
//! - qop=auth and qop=auth-int (entity body hashed as empty, see [`EMPTY_ENTITY_MD5`])
//! - A fixed nonce count of [`DEFAULT_NC`]
//!
//! The nonce count is never incremented when a server nonce is reused. Strict
//! RFC 2617 servers that track `nc` may reject a second request with the same
//! nonce; callers that need this must obtain a fresh challenge.

use crate::base::neterror::NetError;
use crate::http::charset::latin1_bytes;
use boring::hash::{hash, DigestBytes, MessageDigest};
use std::fmt::Write;

/// Nonce count sent with every digest response.
pub const DEFAULT_NC: &str = "00000001";

/// MD5 of the empty string, used as H(entity-body) for `auth-int`.
///
/// The request body is not available when credentials are computed, so
/// `auth-int` digests always cover an empty entity.
pub const EMPTY_ENTITY_MD5: &str = "d41d8cd98f00b204e9800998ecf8427e";

/// Digest authentication algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DigestAlgorithm {
    /// Unspecified - behaves as MD5
    #[default]
    Unspecified,
    /// MD5
    Md5,
    /// MD5-sess (session-based)
    Md5Sess,
}

impl DigestAlgorithm {
    /// Resolve the algorithm token carried by a realm.
    pub fn parse(algorithm: Option<&str>) -> Result<Self, NetError> {
        match algorithm {
            None => Ok(Self::Unspecified),
            Some("MD5") => Ok(Self::Md5),
            Some("MD5-sess") => Ok(Self::Md5Sess),
            Some(other) => Err(NetError::UnsupportedDigestAlgorithm(other.to_string())),
        }
    }

    /// Get the algorithm name for the Authorization header.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unspecified => "",
            Self::Md5 => "MD5",
            Self::Md5Sess => "MD5-sess",
        }
    }

    fn is_session(&self) -> bool {
        matches!(self, Self::Md5Sess)
    }
}

/// Quality of Protection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Qop {
    /// Unspecified
    #[default]
    Unspecified,
    /// Authentication only
    Auth,
    /// Authentication with integrity
    AuthInt,
}

impl Qop {
    pub fn parse(qop: Option<&str>) -> Result<Self, NetError> {
        match qop {
            None => Ok(Self::Unspecified),
            Some("auth") => Ok(Self::Auth),
            Some("auth-int") => Ok(Self::AuthInt),
            Some(other) => Err(NetError::UnsupportedDigestQop(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unspecified => "",
            Self::Auth => "auth",
            Self::AuthInt => "auth-int",
        }
    }
}

/// Reusable text buffer for the HA1 -> HA2 -> response pipeline.
///
/// Every hashing stage consumes the buffer and leaves it empty for the next
/// stage, so the stages must run strictly in order and the buffer must not be
/// shared between two digest computations. Not reentrant.
#[derive(Default)]
pub struct DigestScratch {
    buf: String,
}

// The buffer holds the password between stages.
impl std::fmt::Debug for DigestScratch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DigestScratch")
            .field("len", &self.buf.len())
            .finish()
    }
}

impl DigestScratch {
    pub fn new() -> Self {
        Self {
            buf: String::with_capacity(128),
        }
    }

    fn push(&mut self, s: &str) -> &mut Self {
        self.buf.push_str(s);
        self
    }

    fn push_char(&mut self, c: char) -> &mut Self {
        self.buf.push(c);
        self
    }

    fn push_hex(&mut self, bytes: &[u8]) -> &mut Self {
        for byte in bytes {
            let _ = write!(self.buf, "{:02x}", byte);
        }
        self
    }

    /// MD5 the buffer as ISO-8859-1 and clear it.
    fn digest_and_clear(&mut self) -> Result<DigestBytes, NetError> {
        let digest = md5(&latin1_bytes(&self.buf));
        self.buf.clear();
        digest
    }

    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

/// Inputs of a digest response computation.
#[derive(Debug, Clone, Copy)]
pub struct DigestParams<'a> {
    pub principal: &'a str,
    pub realm_name: &'a str,
    pub password: &'a str,
    pub nonce: &'a str,
    pub cnonce: &'a str,
    pub nc: &'a str,
    pub method: &'a str,
    pub digest_uri: &'a str,
    pub algorithm: Option<&'a str>,
    pub qop: Option<&'a str>,
}

fn md5(data: &[u8]) -> Result<DigestBytes, NetError> {
    hash(MessageDigest::md5(), data).map_err(|_| NetError::HashFailed)
}

/// Lowercase hex encoding.
pub fn to_hex(bytes: &[u8]) -> String {
    let mut hex = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(hex, "{:02x}", byte);
    }
    hex
}

/// Hex-encoded MD5 of `data`.
pub fn md5_hex(data: &[u8]) -> Result<String, NetError> {
    Ok(to_hex(&md5(data)?))
}

/// Generate a client nonce: MD5 of 8 random bytes, hex encoded.
pub fn generate_cnonce() -> Result<String, NetError> {
    let mut seed = [0u8; 8];
    boring::rand::rand_bytes(&mut seed).map_err(|_| NetError::HashFailed)?;
    md5_hex(&seed)
}

/// HA1 for MD5 / unspecified, or MD5-sess.
///
/// Leaves `scratch` empty.
pub fn ha1(scratch: &mut DigestScratch, params: &DigestParams<'_>) -> Result<DigestBytes, NetError> {
    scratch
        .push(params.principal)
        .push_char(':')
        .push(params.realm_name)
        .push_char(':')
        .push(params.password);
    let core = scratch.digest_and_clear()?;

    let algorithm = DigestAlgorithm::parse(params.algorithm)?;
    if !algorithm.is_session() {
        return Ok(core);
    }

    scratch
        .push_hex(&core)
        .push_char(':')
        .push(params.nonce)
        .push_char(':')
        .push(params.cnonce);
    scratch.digest_and_clear()
}

/// HA2 = MD5(method ":" digest-uri [":" H(entity)]).
///
/// Leaves `scratch` empty.
pub fn ha2(
    scratch: &mut DigestScratch,
    method: &str,
    digest_uri: &str,
    qop: Option<&str>,
) -> Result<DigestBytes, NetError> {
    scratch.push(method).push_char(':').push(digest_uri);
    if Qop::parse(qop)? == Qop::AuthInt {
        scratch.push_char(':').push(EMPTY_ENTITY_MD5);
    }
    scratch.digest_and_clear()
}

/// Compute the hex request-digest.
///
/// `scratch` must be empty on entry and is empty on return.
pub fn compute_response(
    scratch: &mut DigestScratch,
    params: &DigestParams<'_>,
) -> Result<String, NetError> {
    // HA1 and HA2 both consume the scratch buffer; order matters.
    let ha1 = ha1(scratch, params)?;
    let ha2 = ha2(scratch, params.method, params.digest_uri, params.qop)?;

    scratch.push_hex(&ha1).push_char(':').push(params.nonce).push_char(':');
    match Qop::parse(params.qop)? {
        Qop::Auth | Qop::AuthInt => {
            scratch
                .push(params.nc)
                .push_char(':')
                .push(params.cnonce)
                .push_char(':')
                .push(params.qop.unwrap_or_default())
                .push_char(':');
        }
        Qop::Unspecified => {}
    }
    scratch.push_hex(&ha2);

    Ok(to_hex(&scratch.digest_and_clear()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params<'a>() -> DigestParams<'a> {
        DigestParams {
            principal: "Mufasa",
            realm_name: "testrealm@host.com",
            password: "Circle Of Life",
            nonce: "dcd98b7102dd2f0e8b11d0f600bfb0c093",
            cnonce: "0a4f113b",
            nc: DEFAULT_NC,
            method: "GET",
            digest_uri: "/dir/index.html",
            algorithm: None,
            qop: Some("auth"),
        }
    }

    #[test]
    fn test_hex_hash_md5() {
        // MD5("test") = 098f6bcd4621d373cade4e832627b4f6
        assert_eq!(md5_hex(b"test").unwrap(), "098f6bcd4621d373cade4e832627b4f6");
    }

    #[test]
    fn test_empty_entity_constant() {
        assert_eq!(md5_hex(b"").unwrap(), EMPTY_ENTITY_MD5);
    }

    #[test]
    fn test_rfc2617_example() {
        // RFC 2617 section 3.5, with nc=00000001
        let mut scratch = DigestScratch::new();
        let response = compute_response(&mut scratch, &params()).unwrap();
        assert_eq!(response, "6629fae49393a05397450978507c4ef1");
        assert!(scratch.is_empty());
    }

    #[test]
    fn test_ha1_plain_matches_md5() {
        let mut scratch = DigestScratch::new();
        let ha1 = ha1(&mut scratch, &params()).unwrap();
        let expected = md5_hex(b"Mufasa:testrealm@host.com:Circle Of Life").unwrap();
        assert_eq!(to_hex(&ha1), expected);
    }

    #[test]
    fn test_ha1_explicit_md5_same_as_unspecified() {
        let mut scratch = DigestScratch::new();
        let unspecified = to_hex(&ha1(&mut scratch, &params()).unwrap());
        let md5 = to_hex(
            &ha1(
                &mut scratch,
                &DigestParams {
                    algorithm: Some("MD5"),
                    ..params()
                },
            )
            .unwrap(),
        );
        assert_eq!(unspecified, md5);
    }

    #[test]
    fn test_ha1_session() {
        let mut scratch = DigestScratch::new();
        let p = DigestParams {
            algorithm: Some("MD5-sess"),
            ..params()
        };
        let core = md5_hex(b"Mufasa:testrealm@host.com:Circle Of Life").unwrap();
        let expected = md5_hex(format!("{}:{}:{}", core, p.nonce, p.cnonce).as_bytes()).unwrap();
        assert_eq!(to_hex(&ha1(&mut scratch, &p).unwrap()), expected);
    }

    #[test]
    fn test_ha1_session_depends_on_nonces() {
        let mut scratch = DigestScratch::new();
        let base = DigestParams {
            algorithm: Some("MD5-sess"),
            ..params()
        };
        let a = to_hex(&ha1(&mut scratch, &base).unwrap());
        let same = to_hex(&ha1(&mut scratch, &base).unwrap());
        let other_nonce = to_hex(&ha1(&mut scratch, &DigestParams { nonce: "n2", ..base }).unwrap());
        let other_cnonce =
            to_hex(&ha1(&mut scratch, &DigestParams { cnonce: "c2", ..base }).unwrap());

        assert_eq!(a, same);
        assert_ne!(a, other_nonce);
        assert_ne!(a, other_cnonce);
    }

    #[test]
    fn test_unsupported_algorithm() {
        let mut scratch = DigestScratch::new();
        let p = DigestParams {
            algorithm: Some("SHA-256"),
            ..params()
        };
        let err = compute_response(&mut scratch, &p).unwrap_err();
        assert!(matches!(err, NetError::UnsupportedDigestAlgorithm(ref a) if a == "SHA-256"));
    }

    #[test]
    fn test_ha2_auth_int_uses_empty_entity() {
        let mut scratch = DigestScratch::new();
        let ha2 = ha2(&mut scratch, "POST", "/upload", Some("auth-int")).unwrap();
        let expected = md5_hex(format!("POST:/upload:{}", EMPTY_ENTITY_MD5).as_bytes()).unwrap();
        assert_eq!(to_hex(&ha2), expected);
    }

    #[test]
    fn test_unsupported_qop() {
        let mut scratch = DigestScratch::new();
        let err = ha2(&mut scratch, "GET", "/", Some("auth-conf")).unwrap_err();
        assert!(matches!(err, NetError::UnsupportedDigestQop(_)));
    }

    #[test]
    fn test_response_without_qop() {
        let mut scratch = DigestScratch::new();
        let p = DigestParams { qop: None, ..params() };
        let ha1 = md5_hex(b"Mufasa:testrealm@host.com:Circle Of Life").unwrap();
        let ha2 = md5_hex(b"GET:/dir/index.html").unwrap();
        let expected = md5_hex(format!("{}:{}:{}", ha1, p.nonce, ha2).as_bytes()).unwrap();
        assert_eq!(compute_response(&mut scratch, &p).unwrap(), expected);
    }

    #[test]
    fn test_cnonce_shape() {
        let a = generate_cnonce().unwrap();
        let b = generate_cnonce().unwrap();
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }
}
