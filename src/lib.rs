//! # asyncnet
//!
//! Request assembly and authentication core of an asynchronous HTTP client.
//!
//! `asyncnet` turns a declarative request into a wire-ready HTTP/1.1 request,
//! computes `Authorization` values (Basic and RFC 2617 Digest), and tracks
//! partial downloads so they can resume after an interruption. Network I/O
//! belongs to the transport that consumes these values.
//!
//! ## Features
//!
//! - **Request Assembly**: request-target forms for direct, proxied and
//!   tunnelled requests, ordered headers, body selection
//! - **Digest Authentication**: MD5 and MD5-sess, `auth` and `auth-int`
//! - **WebSocket Handshakes**: upgrade headers and fresh keys
//! - **Resumable Downloads**: offsets persisted per URL, `Range` on retry
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use asyncnet::http::{RealmBuilder, RequestFactory};
//! use asyncnet::urlrequest::{ClientConfig, Request};
//!
//! let realm = RealmBuilder::new(Some("user"), Some("secret"))
//!     .parse_www_authenticate_header(r#"Digest realm="api", nonce="abc", qop="auth""#)
//!     .use_preemptive_auth(true)
//!     .build()?;
//!
//! let factory = RequestFactory::new(ClientConfig::default());
//! let request = Request::builder(http::Method::GET, "http://example.com/data")?.build();
//! let wire = factory.new_wire_request(&request, false, None, Some(&realm), None)?;
//! println!("{} {}", wire.method(), wire.uri());
//! ```
//!
//! ## Modules
//!
//! - [`base`] - Core types and error definitions
//! - [`handler`] - Response event handlers and resumable downloads
//! - [`http`] - Credentials, bodies and request assembly
//! - [`socket`] - Proxy descriptors
//! - [`urlrequest`] - Request description and client configuration
//! - [`ws`] - WebSocket handshake values

pub mod base;
pub mod handler;
pub mod http;
pub mod socket;
pub mod urlrequest;
pub mod ws;
