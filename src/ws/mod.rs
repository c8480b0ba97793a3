//! WebSocket support.
//!
//! Only the opening handshake headers are produced here; framing is left to
//! the transport.
//!
//! # Example
//! ```ignore
//! use asyncnet::ws::handshake;
//!
//! let url = url::Url::parse("wss://echo.example.com/chat")?;
//! assert!(handshake::is_websocket(&url));
//! let key = handshake::websocket_key()?;
//! let origin = handshake::origin_header(&url);
//! ```

pub mod handshake;

pub use handshake::{is_secured, is_websocket, origin_header, websocket_key};
