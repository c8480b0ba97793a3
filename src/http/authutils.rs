//! Authorization header values.
//!
//! Turns a [`Realm`] into the value of an `Authorization` or
//! `Proxy-Authorization` header for a given request.

use crate::base::neterror::NetError;
use crate::http::realm::{AuthScheme, Realm, RealmBuilder};
use crate::urlrequest::request::Request;
use base64::{engine::general_purpose, Engine as _};
use url::Url;

/// `Basic base64(principal:password)`, encoded with the realm charset.
pub fn compute_basic_authentication(realm: &Realm) -> String {
    let creds = format!(
        "{}:{}",
        realm.principal().unwrap_or_default(),
        realm.password().unwrap_or_default()
    );
    let encoded = general_purpose::STANDARD.encode(realm.charset().encode(&creds));
    format!("Basic {}", encoded)
}

/// The digest-uri for `url`.
///
/// Absolute form keeps the full URL (dropping the query when `omit_query`);
/// otherwise the path (at least `/`) plus `?query` unless omitted.
pub fn compute_realm_uri(url: &Url, use_absolute_uri: bool, omit_query: bool) -> String {
    let query = url.query().filter(|q| !q.is_empty());

    if use_absolute_uri {
        if omit_query && query.is_some() {
            let mut stripped = url.clone();
            stripped.set_query(None);
            return stripped.to_string();
        }
        return url.to_string();
    }

    let path = match url.path() {
        "" => "/",
        p => p,
    };
    match query {
        Some(q) if !omit_query => format!("{}?{}", path, q),
        _ => path.to_string(),
    }
}

/// Serialize a digest realm for `url`.
pub fn compute_digest_authentication(realm: &Realm, url: &Url) -> String {
    let realm_uri = compute_realm_uri(url, realm.use_absolute_uri(), realm.omit_query());

    let mut fields: Vec<String> = vec![
        quoted("username", realm.principal().unwrap_or_default()),
        quoted("realm", realm.realm_name().unwrap_or_default()),
        quoted("nonce", realm.nonce().unwrap_or_default()),
        quoted("uri", &realm_uri),
    ];
    if let Some(algorithm) = realm.algorithm().filter(|a| !a.is_empty()) {
        fields.push(format!("algorithm={}", algorithm));
    }
    fields.push(quoted("response", realm.response().unwrap_or_default()));
    if let Some(opaque) = realm.opaque() {
        fields.push(quoted("opaque", opaque));
    }
    // nc and cnonce are only sent when the server asked for a qop
    if let Some(qop) = realm.qop() {
        fields.push(format!("qop={}", qop));
        fields.push(format!("nc={}", realm.nc()));
        fields.push(quoted("cnonce", realm.cnonce().unwrap_or_default()));
    }

    format!("Digest {}", fields.join(", "))
}

fn quoted(name: &str, value: &str) -> String {
    format!("{}=\"{}\"", name, value)
}

/// `Authorization` value for `request`, if `realm` is preemptive.
///
/// Digest realms are rebound to the request method and URL first, which
/// draws a fresh cnonce. NTLM, SPNEGO and Kerberos tokens belong to the first
/// request of a connection and are not produced here.
pub fn per_request_authorization_header(
    request: &Request,
    realm: Option<&Realm>,
) -> Result<Option<String>, NetError> {
    let Some(realm) = realm.filter(|r| r.use_preemptive_auth()) else {
        return Ok(None);
    };

    match realm.scheme() {
        AuthScheme::Basic => Ok(Some(compute_basic_authentication(realm))),
        AuthScheme::Digest if has_nonce(realm) => {
            let bound = RealmBuilder::from_realm(realm)
                .uri(Some(request.url().clone()))
                .method(request.method().clone())
                .build()?;
            Ok(Some(compute_digest_authentication(&bound, request.url())))
        }
        AuthScheme::Digest => Ok(None),
        AuthScheme::Ntlm | AuthScheme::Spnego | AuthScheme::Kerberos => Ok(None),
    }
}

/// `Proxy-Authorization` value for `request`, if `proxy_realm` is preemptive.
///
/// Digest realms are rebound to the request method and URL, so the response
/// covers the same `uri` the header advertises.
pub fn per_request_proxy_authorization_header(
    request: &Request,
    proxy_realm: Option<&Realm>,
) -> Result<Option<String>, NetError> {
    let Some(realm) = proxy_realm.filter(|r| r.use_preemptive_auth()) else {
        return Ok(None);
    };

    match realm.scheme() {
        AuthScheme::Basic => Ok(Some(compute_basic_authentication(realm))),
        AuthScheme::Digest if has_nonce(realm) => {
            let bound = RealmBuilder::from_realm(realm)
                .uri(Some(request.url().clone()))
                .method(request.method().clone())
                .build()?;
            Ok(Some(compute_digest_authentication(&bound, request.url())))
        }
        AuthScheme::Digest => Ok(None),
        AuthScheme::Ntlm | AuthScheme::Spnego | AuthScheme::Kerberos => Ok(None),
    }
}

fn has_nonce(realm: &Realm) -> bool {
    realm.nonce().is_some_and(|n| !n.is_empty())
}
