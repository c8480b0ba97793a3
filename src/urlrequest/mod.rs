//! Caller-facing request description and client configuration.

pub mod context;
pub mod request;

pub use context::ClientConfig;
pub use request::{BodyGeneratorSource, Request, RequestBuilder};
