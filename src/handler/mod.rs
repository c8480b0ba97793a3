//! Response event handlers.
//!
//! The transport reports each response as a sequence of events (status,
//! headers, body parts, trailers, completion). An [`AsyncHandler`] consumes
//! them and answers [`State::Continue`] or [`State::Abort`] after each one.
//!
//! [`ResumableAsyncHandler`] wraps another handler and records how many bytes
//! of a download have arrived, so an interrupted transfer can resume with a
//! `Range` request.
//!
//! # Example
//! ```ignore
//! use asyncnet::handler::{ResumableAsyncHandler, ResumableSession, FileResumableProcessor};
//! use std::sync::Arc;
//!
//! let session = Arc::new(ResumableSession::new());
//! let processor = Arc::new(FileResumableProcessor::new("/var/lib/app"));
//! let handler = ResumableAsyncHandler::builder(session.clone())
//!     .processor(processor)
//!     .build();
//!
//! let request = handler.adjust_request_range(&request)?;
//! // ... hand `request` and `handler` to the transport ...
//! session.flush();
//! ```

pub mod asynchandler;
pub mod listener;
pub mod processor;
pub mod resumable;

pub use asynchandler::{AsyncHandler, NoopHandler, ResponseStatus, State};
pub use listener::{CountingListener, FileResumableListener, ResumableListener};
pub use processor::{FileResumableProcessor, NullProcessor, ResumableProcessor, ResumableSession};
pub use resumable::{Phase, ProgressPolicy, ResumableAsyncHandler, ResumableHandlerBuilder};
