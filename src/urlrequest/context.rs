//! Request context configuration.
//!
//! Based on Chromium's net::URLRequestContext, provides a centralized
//! configuration point for the settings request assembly consults.

use serde::Deserialize;

/// Configuration options consulted when assembling requests.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Keep connections alive between requests.
    pub keep_alive: bool,

    /// Responses are decompressed by the client, so only supported codecs may
    /// be advertised in Accept-Encoding.
    pub enable_automatic_decompression: bool,

    /// Advertise `gzip, deflate` when the caller set no Accept-Encoding.
    pub compression_enforced: bool,

    /// User-Agent string to use for requests.
    pub user_agent: Option<String>,

    /// Encode cookies without validation or ordering.
    pub use_lax_cookie_encoder: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            keep_alive: true,
            enable_automatic_decompression: true,
            compression_enforced: false,
            user_agent: Some(concat!("asyncnet/", env!("CARGO_PKG_VERSION")).to_string()),
            use_lax_cookie_encoder: false,
        }
    }
}

impl ClientConfig {
    pub fn with_keep_alive(mut self, keep_alive: bool) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    pub fn with_automatic_decompression(mut self, enabled: bool) -> Self {
        self.enable_automatic_decompression = enabled;
        self
    }

    pub fn with_compression_enforced(mut self, enforced: bool) -> Self {
        self.compression_enforced = enforced;
        self
    }

    pub fn with_user_agent(mut self, user_agent: Option<&str>) -> Self {
        self.user_agent = user_agent.map(str::to_string);
        self
    }

    pub fn with_lax_cookie_encoder(mut self, lax: bool) -> Self {
        self.use_lax_cookie_encoder = lax;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert!(config.keep_alive);
        assert!(config.enable_automatic_decompression);
        assert!(!config.compression_enforced);
        assert!(config.user_agent.as_deref().unwrap().starts_with("asyncnet/"));
    }

    #[test]
    fn test_partial_deserialize_keeps_defaults() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"keep_alive": false, "user_agent": null}"#).unwrap();
        assert!(!config.keep_alive);
        assert!(config.user_agent.is_none());
        assert!(config.enable_automatic_decompression);
    }
}
