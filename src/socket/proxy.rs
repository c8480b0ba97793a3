//! Proxy server descriptor.
//!
//! Describes the proxy a request is routed through. The assembler only needs
//! to know whether the proxy speaks HTTP (absolute-form targets) and which
//! realm authenticates against it. Choosing whether to use a proxy for a
//! given host happens before assembly.

use crate::http::realm::Realm;
use url::Url;

/// Proxy protocol type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyType {
    /// HTTP proxy (CONNECT for HTTPS)
    Http,
    /// HTTPS proxy (TLS to proxy)
    Https,
    /// SOCKS4 proxy
    Socks4,
    /// SOCKS5 proxy
    Socks5,
}

impl ProxyType {
    /// HTTP-speaking proxies receive absolute-form request targets.
    pub fn is_http(&self) -> bool {
        matches!(self, Self::Http | Self::Https)
    }

    fn default_port(&self) -> u16 {
        match self {
            Self::Http => 80,
            Self::Https => 443,
            Self::Socks4 | Self::Socks5 => 1080,
        }
    }
}

/// A proxy server.
#[derive(Debug, Clone)]
pub struct ProxyServer {
    host: String,
    port: u16,
    proxy_type: ProxyType,
    realm: Option<Realm>,
}

impl ProxyServer {
    /// Start building a proxy descriptor.
    pub fn builder(host: &str, port: u16) -> ProxyBuilder {
        ProxyBuilder::new(host, port)
    }

    /// Create proxy settings from URL string such as `http://proxy:8080`.
    pub fn from_url(url_str: &str) -> Option<Self> {
        let url = Url::parse(url_str).ok()?;
        let proxy_type = match url.scheme() {
            "http" => ProxyType::Http,
            "https" => ProxyType::Https,
            "socks4" | "socks4a" => ProxyType::Socks4,
            "socks5" | "socks5h" => ProxyType::Socks5,
            _ => return None,
        };
        let host = url.host_str()?;
        let port = url.port().unwrap_or(proxy_type.default_port());
        Some(ProxyBuilder::new(host, port).proxy_type(proxy_type).build())
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn proxy_type(&self) -> ProxyType {
        self.proxy_type
    }

    /// Realm used for `Proxy-Authorization`.
    pub fn realm(&self) -> Option<&Realm> {
        self.realm.as_ref()
    }
}

/// Builder for ProxyServer.
#[derive(Debug)]
pub struct ProxyBuilder {
    host: String,
    port: u16,
    proxy_type: ProxyType,
    realm: Option<Realm>,
}

impl ProxyBuilder {
    /// Create new builder for an HTTP proxy.
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            host: host.to_string(),
            port,
            proxy_type: ProxyType::Http,
            realm: None,
        }
    }

    pub fn proxy_type(mut self, proxy_type: ProxyType) -> Self {
        self.proxy_type = proxy_type;
        self
    }

    /// Set authentication.
    pub fn realm(mut self, realm: Realm) -> Self {
        self.realm = Some(realm);
        self
    }

    /// Build ProxyServer.
    pub fn build(self) -> ProxyServer {
        ProxyServer {
            host: self.host,
            port: self.port,
            proxy_type: self.proxy_type,
            realm: self.realm,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_url() {
        let proxy = ProxyServer::from_url("http://proxy.example.com:8080").unwrap();
        assert_eq!(proxy.host(), "proxy.example.com");
        assert_eq!(proxy.port(), 8080);
        assert!(proxy.proxy_type().is_http());
    }

    #[test]
    fn test_from_url_default_ports() {
        let socks = ProxyServer::from_url("socks5://socks.example.com").unwrap();
        assert_eq!(socks.port(), 1080);
        assert_eq!(socks.proxy_type(), ProxyType::Socks5);
        assert!(!socks.proxy_type().is_http());

        assert!(ProxyServer::from_url("ftp://proxy").is_none());
    }

    #[test]
    fn test_builder_realm() {
        let realm = crate::http::realm::RealmBuilder::new(Some("u"), Some("p"))
            .scheme(crate::http::realm::AuthScheme::Basic)
            .build()
            .unwrap();
        let proxy = ProxyServer::builder("proxy", 3128)
            .proxy_type(ProxyType::Https)
            .realm(realm)
            .build();
        assert_eq!(proxy.host(), "proxy");
        assert!(proxy.proxy_type().is_http());
        assert_eq!(proxy.realm().and_then(|r| r.principal()), Some("u"));
    }
}
