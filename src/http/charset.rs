//! Character encodings used for request bodies and credentials.

use serde::Deserialize;

/// Text encoding applied when turning strings into wire bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum Charset {
    #[default]
    Utf8,
    /// ISO-8859-1. Characters outside Latin-1 are written as `?`.
    Latin1,
}

impl Charset {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Utf8 => "UTF-8",
            Self::Latin1 => "ISO-8859-1",
        }
    }

    pub fn encode(&self, text: &str) -> Vec<u8> {
        match self {
            Self::Utf8 => text.as_bytes().to_vec(),
            Self::Latin1 => latin1_bytes(text),
        }
    }
}

/// Encode as ISO-8859-1, replacing unmappable characters with `?`.
pub fn latin1_bytes(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| if (c as u32) <= 0xFF { c as u32 as u8 } else { b'?' })
        .collect()
}
