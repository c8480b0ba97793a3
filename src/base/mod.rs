//! Base types and error handling.
//!
//! Provides foundational types mirroring Chromium's `net/base/`:
//! - [`NetError`](neterror::NetError): error codes in the style of `net_error_list.h`
//! - [`context`]: extension traits for attaching context to I/O results

pub mod context;
pub mod neterror;
