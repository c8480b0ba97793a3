use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NetError {
    // Request construction
    #[error("Invalid URL")]
    InvalidUrl,
    #[error("Unknown URL scheme")]
    UnknownUrlScheme,
    #[error("Invalid header")]
    InvalidHeader,
    #[error("Method not supported")]
    MethodNotSupported,

    // Response handling
    #[error("Invalid response")]
    InvalidResponse,
    #[error("Content-Length mismatch")]
    ContentLengthMismatch,
    #[error("Request range not satisfiable")]
    RequestRangeNotSatisfiable,

    // Authentication
    #[error("Invalid auth credentials")]
    InvalidAuthCredentials,
    #[error("Unsupported auth scheme")]
    UnsupportedAuthScheme,
    #[error("Missing auth credentials")]
    MissingAuthCredentials,
    #[error("Authentication scheme not set")]
    MissingAuthScheme,
    #[error("Digest algorithm not supported: {0}")]
    UnsupportedDigestAlgorithm(String),
    #[error("Digest qop not supported: {0}")]
    UnsupportedDigestQop(String),
    #[error("Hash computation failed")]
    HashFailed,

    // Persistence and body sources
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Unknown error ({0})")]
    Unknown(i32),
}

impl NetError {
    pub fn as_i32(&self) -> i32 {
        match self {
            NetError::InvalidUrl => -300,
            NetError::UnknownUrlScheme => -302,
            NetError::InvalidResponse => -320,
            NetError::MethodNotSupported => -322,
            NetError::RequestRangeNotSatisfiable => -328,
            NetError::InvalidAuthCredentials => -338,
            NetError::UnsupportedAuthScheme => -339,
            NetError::MissingAuthCredentials => -341,
            NetError::ContentLengthMismatch => -354,

            // Custom errors (outside Chromium's range)
            NetError::InvalidHeader => -10001,
            NetError::MissingAuthScheme => -10002,
            NetError::UnsupportedDigestAlgorithm(_) => -10003,
            NetError::UnsupportedDigestQop(_) => -10004,
            NetError::HashFailed => -10005,
            NetError::Io(_) => -10006,

            NetError::Unknown(code) => *code,
        }
    }

    /// Fatal errors abort the request and are never retried.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            NetError::MissingAuthScheme
                | NetError::UnsupportedDigestAlgorithm(_)
                | NetError::UnsupportedDigestQop(_)
                | NetError::UnsupportedAuthScheme
        )
    }
}

/// Variants that carry data (`UnsupportedDigestAlgorithm`,
/// `UnsupportedDigestQop`, `Io`) cannot be rebuilt from their code alone and
/// come back as [`NetError::Unknown`].
impl From<i32> for NetError {
    fn from(code: i32) -> Self {
        match code {
            -300 => NetError::InvalidUrl,
            -302 => NetError::UnknownUrlScheme,
            -320 => NetError::InvalidResponse,
            -322 => NetError::MethodNotSupported,
            -328 => NetError::RequestRangeNotSatisfiable,
            -338 => NetError::InvalidAuthCredentials,
            -339 => NetError::UnsupportedAuthScheme,
            -341 => NetError::MissingAuthCredentials,
            -354 => NetError::ContentLengthMismatch,
            -10001 => NetError::InvalidHeader,
            -10002 => NetError::MissingAuthScheme,
            -10005 => NetError::HashFailed,
            _ => NetError::Unknown(code),
        }
    }
}
