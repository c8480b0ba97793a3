//! Request bodies.
//!
//! [`WireBody`] is the body of an assembled request. The source types
//! ([`StreamSource`], [`FileRegion`], [`BodyGenerator`]) are what callers put
//! on a [`Request`](crate::urlrequest::request::Request).

use crate::http::multipart::Form;
use bytes::Bytes;
use futures::stream::{BoxStream, Stream, StreamExt};
use http_body::Body as _;
use http_body_util::combinators::UnsyncBoxBody;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Stream of body chunks.
pub type ByteStream = BoxStream<'static, Result<Bytes, io::Error>>;

/// Body produced on demand by a [`BodyGenerator`].
pub type GeneratedBody = UnsyncBoxBody<Bytes, io::Error>;

/// Lazily produces a body when a request is assembled.
pub trait BodyGenerator: Send + Sync {
    fn create_body(&self) -> GeneratedBody;
}

/// Single-use byte stream shared between clones of a request.
///
/// The first assembly takes the stream; later ones see it consumed.
#[derive(Clone)]
pub struct StreamSource {
    inner: Arc<Mutex<Option<ByteStream>>>,
    content_length: Option<u64>,
}

impl StreamSource {
    pub fn new<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes, io::Error>> + Send + 'static,
    {
        Self {
            inner: Arc::new(Mutex::new(Some(stream.boxed()))),
            content_length: None,
        }
    }

    /// Declare the total length of the stream.
    pub fn with_content_length(mut self, length: u64) -> Self {
        self.content_length = Some(length);
        self
    }

    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    /// Take the stream, leaving the source consumed.
    pub fn take(&self) -> Option<ByteStream> {
        match self.inner.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        }
    }

    pub fn is_consumed(&self) -> bool {
        match self.inner.lock() {
            Ok(guard) => guard.is_none(),
            Err(poisoned) => poisoned.into_inner().is_none(),
        }
    }
}

impl fmt::Debug for StreamSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamSource")
            .field("content_length", &self.content_length)
            .field("consumed", &self.is_consumed())
            .finish()
    }
}

/// A byte range of a file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRegion {
    path: PathBuf,
    position: u64,
    length: u64,
}

impl FileRegion {
    /// The whole file. Reads its length from the file system.
    pub fn whole(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let length = std::fs::metadata(&path)?.len();
        Ok(Self {
            path,
            position: 0,
            length,
        })
    }

    /// `length` bytes starting at `position`.
    pub fn new(path: impl Into<PathBuf>, position: u64, length: u64) -> Self {
        Self {
            path: path.into(),
            position,
            length,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn length(&self) -> u64 {
        self.length
    }
}

/// Body of an assembled request.
pub enum WireBody {
    /// A single byte sequence.
    Bytes(Bytes),
    /// Several byte sequences sent back to back.
    Composite(Vec<Bytes>),
    /// Encoded text, a byte buffer or a url-encoded form.
    Buffer {
        data: Bytes,
        content_type: Option<String>,
    },
    /// A byte stream; `None` length means unknown.
    Stream {
        stream: ByteStream,
        content_length: Option<u64>,
    },
    /// Multipart form with its final Content-Type.
    Multipart { form: Form, content_type: String },
    /// A region of a file.
    File(FileRegion),
    /// A body created by a [`BodyGenerator`].
    Generated(GeneratedBody),
}

impl WireBody {
    /// Declared length, `None` when unknown (sent chunked).
    pub fn content_length(&self) -> Option<u64> {
        match self {
            WireBody::Bytes(b) => Some(b.len() as u64),
            WireBody::Composite(parts) => Some(parts.iter().map(|p| p.len() as u64).sum()),
            WireBody::Buffer { data, .. } => Some(data.len() as u64),
            WireBody::Stream { content_length, .. } => *content_length,
            WireBody::Multipart { form, .. } => Some(form.content_length()),
            WireBody::File(region) => Some(region.length()),
            WireBody::Generated(body) => body.size_hint().exact(),
        }
    }

    /// Content-Type the body imposes on the request, if any.
    pub fn content_type_override(&self) -> Option<&str> {
        match self {
            WireBody::Buffer { content_type, .. } => content_type.as_deref(),
            WireBody::Multipart { content_type, .. } => Some(content_type),
            _ => None,
        }
    }

    /// Short name of the body representation, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            WireBody::Bytes(_) => "bytes",
            WireBody::Composite(_) => "composite",
            WireBody::Buffer { .. } => "buffer",
            WireBody::Stream { .. } => "stream",
            WireBody::Multipart { .. } => "multipart",
            WireBody::File(_) => "file",
            WireBody::Generated(_) => "generated",
        }
    }
}

impl fmt::Debug for WireBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WireBody")
            .field("kind", &self.kind())
            .field("content_length", &self.content_length())
            .field("content_type_override", &self.content_type_override())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::{BodyExt, Full};

    #[test]
    fn test_bytes_length() {
        let body = WireBody::Bytes(Bytes::from("hello"));
        assert_eq!(body.content_length(), Some(5));
        assert!(body.content_type_override().is_none());
    }

    #[test]
    fn test_composite_length() {
        let body = WireBody::Composite(vec![Bytes::from("ab"), Bytes::from("cde")]);
        assert_eq!(body.content_length(), Some(5));
    }

    #[test]
    fn test_stream_unknown_length() {
        let source = StreamSource::new(futures::stream::empty());
        let body = WireBody::Stream {
            stream: source.take().unwrap(),
            content_length: None,
        };
        assert_eq!(body.content_length(), None);
        assert!(source.is_consumed());
        assert!(source.take().is_none());
    }

    #[test]
    fn test_stream_source_shared_between_clones() {
        let source = StreamSource::new(futures::stream::empty()).with_content_length(12);
        let clone = source.clone();
        assert_eq!(clone.content_length(), Some(12));
        assert!(clone.take().is_some());
        assert!(source.is_consumed());
    }

    #[test]
    fn test_generated_exact_length() {
        let generated: GeneratedBody = Full::new(Bytes::from_static(b"0123456789"))
            .map_err(|never| match never {})
            .boxed_unsync();
        let body = WireBody::Generated(generated);
        assert_eq!(body.content_length(), Some(10));
        assert_eq!(body.kind(), "generated");
    }

    #[test]
    fn test_file_region_whole() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.bin");
        std::fs::write(&path, vec![0u8; 42]).unwrap();

        let region = FileRegion::whole(&path).unwrap();
        assert_eq!(region.position(), 0);
        assert_eq!(WireBody::File(region).content_length(), Some(42));
    }

    #[test]
    fn test_buffer_override() {
        let body = WireBody::Buffer {
            data: Bytes::from("a=b"),
            content_type: Some("application/x-www-form-urlencoded".into()),
        };
        assert_eq!(
            body.content_type_override(),
            Some("application/x-www-form-urlencoded")
        );
    }
}
