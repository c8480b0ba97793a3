//! Proxy descriptors.
//!
//! - [`proxy`]: HTTP/HTTPS/SOCKS proxy servers and their credentials

pub mod proxy;

pub use proxy::{ProxyBuilder, ProxyServer, ProxyType};
