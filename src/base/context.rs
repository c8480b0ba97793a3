//! Ergonomic error context helpers.
//!
//! Provides extension traits for adding context to `Result` types,
//! converting IO errors into context-rich `NetError` variants.

use crate::base::neterror::NetError;
use std::io;
use std::path::Path;

/// Extension trait for adding context to IO Results.
pub trait IoResultExt<T> {
    /// Add the path of the file being read or written to an IO error.
    ///
    /// # Example
    /// ```ignore
    /// use asyncnet::base::context::IoResultExt;
    ///
    /// let json = fs::read_to_string(&path).path_context(&path)?;
    /// // Error: "I/O error: /var/lib/app/resume.json: permission denied"
    /// ```
    fn path_context(self, path: &Path) -> Result<T, NetError>;
}

impl<T> IoResultExt<T> for Result<T, io::Error> {
    fn path_context(self, path: &Path) -> Result<T, NetError> {
        self.map_err(|e| {
            NetError::Io(io::Error::new(
                e.kind(),
                format!("{}: {}", path.display(), e),
            ))
        })
    }
}
