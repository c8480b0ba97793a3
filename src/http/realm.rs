//! Authentication realms.
//!
//! A [`Realm`] is an immutable, scheme-tagged bundle of credentials and
//! challenge parameters. It is produced by [`RealmBuilder`], which also parses
//! `WWW-Authenticate` / `Proxy-Authenticate` challenges and, when a server
//! nonce is known, computes the digest `cnonce` and `response` at build time.
//!
//! # Example
//! ```ignore
//! use asyncnet::http::realm::{AuthScheme, RealmBuilder};
//!
//! let realm = RealmBuilder::new(Some("user"), Some("secret"))
//!     .parse_www_authenticate_header(r#"Digest realm="api", nonce="abc", qop="auth""#)
//!     .uri(url)
//!     .method(http::Method::GET)
//!     .build()?;
//! assert_eq!(realm.scheme(), AuthScheme::Digest);
//! ```

use crate::base::neterror::NetError;
use crate::http::authutils::compute_realm_uri;
use crate::http::charset::Charset;
use crate::http::digestauth::{self, DigestParams, DigestScratch, DEFAULT_NC};
use http::Method;
use std::collections::HashMap;
use std::fmt;
use url::Url;
use zeroize::Zeroizing;

/// Authentication scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthScheme {
    /// Basic authentication (base64 encoded)
    Basic,
    /// Digest authentication (challenge-response)
    Digest,
    /// NTLM (Windows integrated auth)
    Ntlm,
    /// SPNEGO / Negotiate
    Spnego,
    /// Kerberos
    Kerberos,
}

impl AuthScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "Basic",
            Self::Digest => "Digest",
            Self::Ntlm => "NTLM",
            Self::Spnego => "Negotiate",
            Self::Kerberos => "Kerberos",
        }
    }
}

/// Immutable authentication realm.
#[derive(Clone)]
pub struct Realm {
    scheme: AuthScheme,
    principal: Option<String>,
    password: Option<Zeroizing<String>>,
    realm_name: Option<String>,
    nonce: Option<String>,
    algorithm: Option<String>,
    response: Option<String>,
    opaque: Option<String>,
    qop: Option<String>,
    nc: String,
    cnonce: Option<String>,
    uri: Option<Url>,
    use_preemptive_auth: bool,
    charset: Charset,
    ntlm_domain: Option<String>,
    ntlm_host: String,
    use_absolute_uri: bool,
    omit_query: bool,
    service_principal_name: Option<String>,
    use_canonical_hostname: bool,
    login_context_name: Option<String>,
    custom_login_config: Option<HashMap<String, String>>,
}

impl Realm {
    pub fn scheme(&self) -> AuthScheme {
        self.scheme
    }

    pub fn principal(&self) -> Option<&str> {
        self.principal.as_deref()
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_ref().map(|p| p.as_str())
    }

    pub fn realm_name(&self) -> Option<&str> {
        self.realm_name.as_deref()
    }

    pub fn nonce(&self) -> Option<&str> {
        self.nonce.as_deref()
    }

    pub fn algorithm(&self) -> Option<&str> {
        self.algorithm.as_deref()
    }

    /// Digest request-digest, present when a nonce and a URI were known at build time.
    pub fn response(&self) -> Option<&str> {
        self.response.as_deref()
    }

    pub fn opaque(&self) -> Option<&str> {
        self.opaque.as_deref()
    }

    pub fn qop(&self) -> Option<&str> {
        self.qop.as_deref()
    }

    /// Nonce count. Always [`DEFAULT_NC`] unless set explicitly.
    pub fn nc(&self) -> &str {
        &self.nc
    }

    pub fn cnonce(&self) -> Option<&str> {
        self.cnonce.as_deref()
    }

    pub fn uri(&self) -> Option<&Url> {
        self.uri.as_ref()
    }

    pub fn use_preemptive_auth(&self) -> bool {
        self.use_preemptive_auth
    }

    pub fn charset(&self) -> Charset {
        self.charset
    }

    pub fn ntlm_domain(&self) -> Option<&str> {
        self.ntlm_domain.as_deref()
    }

    pub fn ntlm_host(&self) -> &str {
        &self.ntlm_host
    }

    pub fn use_absolute_uri(&self) -> bool {
        self.use_absolute_uri
    }

    pub fn omit_query(&self) -> bool {
        self.omit_query
    }

    pub fn service_principal_name(&self) -> Option<&str> {
        self.service_principal_name.as_deref()
    }

    pub fn use_canonical_hostname(&self) -> bool {
        self.use_canonical_hostname
    }

    pub fn login_context_name(&self) -> Option<&str> {
        self.login_context_name.as_deref()
    }

    pub fn custom_login_config(&self) -> Option<&HashMap<String, String>> {
        self.custom_login_config.as_ref()
    }
}

impl fmt::Debug for Realm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Realm")
            .field("scheme", &self.scheme)
            .field("principal", &self.principal)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("realm_name", &self.realm_name)
            .field("nonce", &self.nonce)
            .field("algorithm", &self.algorithm)
            .field("response", &self.response)
            .field("opaque", &self.opaque)
            .field("qop", &self.qop)
            .field("nc", &self.nc)
            .field("cnonce", &self.cnonce)
            .field("uri", &self.uri.as_ref().map(Url::as_str))
            .field("use_preemptive_auth", &self.use_preemptive_auth)
            .field("charset", &self.charset)
            .field("ntlm_domain", &self.ntlm_domain)
            .field("ntlm_host", &self.ntlm_host)
            .field("use_absolute_uri", &self.use_absolute_uri)
            .field("omit_query", &self.omit_query)
            .field("service_principal_name", &self.service_principal_name)
            .field("use_canonical_hostname", &self.use_canonical_hostname)
            .field("login_context_name", &self.login_context_name)
            .finish()
    }
}

/// Builder for [`Realm`].
///
/// Consumed by [`RealmBuilder::build`]; create a new builder (or use
/// [`RealmBuilder::from_realm`]) for every realm.
pub struct RealmBuilder {
    principal: Option<String>,
    password: Option<Zeroizing<String>>,
    scheme: Option<AuthScheme>,
    realm_name: Option<String>,
    nonce: Option<String>,
    algorithm: Option<String>,
    response: Option<String>,
    opaque: Option<String>,
    qop: Option<String>,
    nc: String,
    cnonce: Option<String>,
    uri: Option<Url>,
    method: Method,
    use_preemptive_auth: bool,
    charset: Charset,
    ntlm_domain: Option<String>,
    ntlm_host: String,
    use_absolute_uri: bool,
    omit_query: bool,
    service_principal_name: Option<String>,
    use_canonical_hostname: bool,
    login_context_name: Option<String>,
    custom_login_config: Option<HashMap<String, String>>,
}

impl Default for RealmBuilder {
    fn default() -> Self {
        Self::new(None, None)
    }
}

impl RealmBuilder {
    /// Create a builder with optional credentials.
    pub fn new(principal: Option<&str>, password: Option<&str>) -> Self {
        Self {
            principal: principal.map(str::to_string),
            password: password.map(|p| Zeroizing::new(p.to_string())),
            scheme: None,
            realm_name: None,
            nonce: None,
            algorithm: None,
            response: None,
            opaque: None,
            qop: None,
            nc: DEFAULT_NC.to_string(),
            cnonce: None,
            uri: None,
            method: Method::GET,
            use_preemptive_auth: false,
            charset: Charset::Utf8,
            ntlm_domain: None,
            ntlm_host: "localhost".to_string(),
            use_absolute_uri: false,
            omit_query: false,
            service_principal_name: None,
            use_canonical_hostname: false,
            login_context_name: None,
            custom_login_config: None,
        }
    }

    /// Reopen a realm for update.
    ///
    /// Copies every setting except the computed `response` and `cnonce`, and
    /// resets the method to GET.
    pub fn from_realm(realm: &Realm) -> Self {
        Self {
            principal: realm.principal.clone(),
            password: realm.password.clone(),
            scheme: Some(realm.scheme),
            realm_name: realm.realm_name.clone(),
            nonce: realm.nonce.clone(),
            algorithm: realm.algorithm.clone(),
            response: None,
            opaque: realm.opaque.clone(),
            qop: realm.qop.clone(),
            nc: realm.nc.clone(),
            cnonce: None,
            uri: realm.uri.clone(),
            method: Method::GET,
            use_preemptive_auth: realm.use_preemptive_auth,
            charset: realm.charset,
            ntlm_domain: realm.ntlm_domain.clone(),
            ntlm_host: realm.ntlm_host.clone(),
            use_absolute_uri: realm.use_absolute_uri,
            omit_query: realm.omit_query,
            service_principal_name: realm.service_principal_name.clone(),
            use_canonical_hostname: realm.use_canonical_hostname,
            login_context_name: realm.login_context_name.clone(),
            custom_login_config: realm.custom_login_config.clone(),
        }
    }

    pub fn scheme(mut self, scheme: AuthScheme) -> Self {
        self.scheme = Some(scheme);
        self
    }

    pub fn realm_name(mut self, realm_name: Option<&str>) -> Self {
        self.realm_name = realm_name.map(str::to_string);
        self
    }

    pub fn nonce(mut self, nonce: Option<&str>) -> Self {
        self.nonce = nonce.map(str::to_string);
        self
    }

    pub fn algorithm(mut self, algorithm: Option<&str>) -> Self {
        self.algorithm = algorithm.map(str::to_string);
        self
    }

    pub fn response(mut self, response: &str) -> Self {
        self.response = Some(response.to_string());
        self
    }

    pub fn opaque(mut self, opaque: Option<&str>) -> Self {
        self.opaque = opaque.map(str::to_string);
        self
    }

    /// Set the quality of protection. Empty values are ignored.
    pub fn qop(mut self, qop: Option<&str>) -> Self {
        if let Some(qop) = qop.filter(|q| !q.is_empty()) {
            self.qop = Some(qop.to_string());
        }
        self
    }

    pub fn nc(mut self, nc: &str) -> Self {
        self.nc = nc.to_string();
        self
    }

    pub fn uri(mut self, uri: Option<Url>) -> Self {
        self.uri = uri;
        self
    }

    /// Request method used for HA2.
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn use_preemptive_auth(mut self, preemptive: bool) -> Self {
        self.use_preemptive_auth = preemptive;
        self
    }

    pub fn use_absolute_uri(mut self, absolute: bool) -> Self {
        self.use_absolute_uri = absolute;
        self
    }

    pub fn omit_query(mut self, omit: bool) -> Self {
        self.omit_query = omit;
        self
    }

    pub fn charset(mut self, charset: Charset) -> Self {
        self.charset = charset;
        self
    }

    pub fn ntlm_domain(mut self, domain: &str) -> Self {
        self.ntlm_domain = Some(domain.to_string());
        self
    }

    pub fn ntlm_host(mut self, host: &str) -> Self {
        self.ntlm_host = host.to_string();
        self
    }

    pub fn service_principal_name(mut self, spn: Option<&str>) -> Self {
        self.service_principal_name = spn.map(str::to_string);
        self
    }

    pub fn use_canonical_hostname(mut self, canonical: bool) -> Self {
        self.use_canonical_hostname = canonical;
        self
    }

    pub fn login_context_name(mut self, name: Option<&str>) -> Self {
        self.login_context_name = name.map(str::to_string);
        self
    }

    pub fn custom_login_config(mut self, config: Option<HashMap<String, String>>) -> Self {
        self.custom_login_config = config;
        self
    }

    /// Apply a `WWW-Authenticate` challenge.
    ///
    /// When the server offers several qop values, `auth` is preferred over
    /// `auth-int`; any other offer leaves qop unset.
    pub fn parse_www_authenticate_header(self, header_line: &str) -> Self {
        let raw_qop = match_token(header_line, "qop");
        let builder = self.apply_challenge(header_line);
        match raw_qop {
            Some(raw) => builder.qop(select_qop(raw)),
            None => builder,
        }
    }

    /// Apply a `Proxy-Authenticate` challenge.
    ///
    /// Unlike [`parse_www_authenticate_header`](Self::parse_www_authenticate_header),
    /// the qop offer is kept verbatim. A proxy offering `auth,auth-int` therefore
    /// fails at build time with [`NetError::UnsupportedDigestQop`].
    pub fn parse_proxy_authenticate_header(self, header_line: &str) -> Self {
        let raw_qop = match_token(header_line, "qop");
        self.apply_challenge(header_line).qop(raw_qop)
    }

    fn apply_challenge(self, header_line: &str) -> Self {
        let builder = self
            .realm_name(match_token(header_line, "realm"))
            .nonce(match_token(header_line, "nonce"))
            .opaque(match_token(header_line, "opaque"));

        let scheme = if builder.nonce.as_deref().is_some_and(|n| !n.is_empty()) {
            AuthScheme::Digest
        } else {
            AuthScheme::Basic
        };
        let builder = builder.scheme(scheme);

        match match_token(header_line, "algorithm").filter(|a| !a.is_empty()) {
            Some(algorithm) => builder.algorithm(Some(algorithm)),
            None => builder,
        }
    }

    /// Freeze the builder into a [`Realm`].
    ///
    /// With a non-empty nonce, a fresh `cnonce` is generated and, if a URI is
    /// set, the digest `response` is computed.
    ///
    /// # Errors
    /// - [`NetError::MissingAuthScheme`] if no scheme was set
    /// - [`NetError::UnsupportedDigestAlgorithm`] / [`NetError::UnsupportedDigestQop`]
    ///   if the digest parameters cannot be honoured
    pub fn build(mut self) -> Result<Realm, NetError> {
        let scheme = self.scheme.ok_or(NetError::MissingAuthScheme)?;

        if self.nonce.as_deref().is_some_and(|n| !n.is_empty()) {
            self.cnonce = Some(digestauth::generate_cnonce()?);
            self.new_response()?;
        }

        Ok(Realm {
            scheme,
            principal: self.principal,
            password: self.password,
            realm_name: self.realm_name,
            nonce: self.nonce,
            algorithm: self.algorithm,
            response: self.response,
            opaque: self.opaque,
            qop: self.qop,
            nc: self.nc,
            cnonce: self.cnonce,
            uri: self.uri,
            use_preemptive_auth: self.use_preemptive_auth,
            charset: self.charset,
            ntlm_domain: self.ntlm_domain,
            ntlm_host: self.ntlm_host,
            use_absolute_uri: self.use_absolute_uri,
            omit_query: self.omit_query,
            service_principal_name: self.service_principal_name,
            use_canonical_hostname: self.use_canonical_hostname,
            login_context_name: self.login_context_name,
            custom_login_config: self.custom_login_config,
        })
    }

    fn new_response(&mut self) -> Result<(), NetError> {
        // Preemptive realms may not know the target yet.
        let Some(uri) = self.uri.as_ref() else {
            return Ok(());
        };

        let digest_uri = compute_realm_uri(uri, self.use_absolute_uri, self.omit_query);
        let mut scratch = DigestScratch::new();
        let params = DigestParams {
            principal: self.principal.as_deref().unwrap_or_default(),
            realm_name: self.realm_name.as_deref().unwrap_or_default(),
            password: self.password.as_ref().map(|p| p.as_str()).unwrap_or_default(),
            nonce: self.nonce.as_deref().unwrap_or_default(),
            cnonce: self.cnonce.as_deref().unwrap_or_default(),
            nc: &self.nc,
            method: self.method.as_str(),
            digest_uri: &digest_uri,
            algorithm: self.algorithm.as_deref(),
            qop: self.qop.as_deref(),
        };

        let response = digestauth::compute_response(&mut scratch, &params)?;
        tracing::debug!(
            realm = params.realm_name,
            algorithm = params.algorithm.unwrap_or("MD5"),
            qop = params.qop.unwrap_or(""),
            "computed digest response"
        );
        self.response = Some(response);
        Ok(())
    }
}

/// Pick `auth` over `auth-int` from a comma-separated qop offer.
fn select_qop(raw: &str) -> Option<&str> {
    let offers: Vec<&str> = raw.split(',').map(str::trim).collect();
    ["auth", "auth-int"]
        .into_iter()
        .find(|preferred| offers.contains(preferred))
}

/// Find `token=value` in a challenge line and return the value.
///
/// The token must start a parameter (beginning of line, after whitespace or
/// a comma) outside any quoted string. A quoted value runs to its closing
/// quote; an unquoted one runs to the next comma. One layer of surrounding
/// quotes is stripped.
fn match_token<'a>(header_line: &'a str, token: &str) -> Option<&'a str> {
    let lower = header_line.to_ascii_lowercase();
    let needle = format!("{}=", token.to_ascii_lowercase());

    let mut search_from = 0;
    let start = loop {
        let pos = search_from + lower[search_from..].find(&needle)?;
        let at_boundary = header_line[..pos]
            .chars()
            .next_back()
            .map_or(true, |c| c == ',' || c.is_whitespace());
        if at_boundary && !inside_quotes(&header_line[..pos]) {
            break pos + needle.len();
        }
        search_from = pos + needle.len();
    };

    let rest = header_line[start..].trim_start();
    if let Some(quoted) = rest.strip_prefix('"') {
        let end = quoted.find('"').unwrap_or(quoted.len());
        return Some(&quoted[..end]);
    }

    let end = rest.find(',').unwrap_or(rest.len());
    Some(rest[..end].trim_end())
}

/// Whether the end of `prefix` sits inside an open quoted string.
fn inside_quotes(prefix: &str) -> bool {
    let mut open = false;
    let mut escaped = false;
    for c in prefix.chars() {
        match c {
            '\\' if open && !escaped => {
                escaped = true;
                continue;
            }
            '"' if !escaped => open = !open,
            _ => {}
        }
        escaped = false;
    }
    open
}
