//! Multipart form data support.
//!
//! Provides RFC 2046 multipart/form-data encoding for in-memory parts.
//!
//! # Example
//! ```ignore
//! use asyncnet::http::multipart::{Form, Part};
//!
//! let form = Form::new(vec![
//!     Part::text("username", "user123"),
//!     Part::bytes("file", b"file content".as_slice()).file_name("doc.txt"),
//! ]);
//!
//! // Use form.into_body() to get the request body
//! ```

use crate::http::digestauth::to_hex;
use bytes::Bytes;
use std::borrow::Cow;

/// A multipart form.
#[derive(Debug, Clone)]
pub struct Form {
    boundary: String,
    parts: Vec<Part>,
}

impl Form {
    /// Create a form with a freshly generated boundary.
    pub fn new(parts: Vec<Part>) -> Self {
        Self::with_boundary(parts, generate_boundary())
    }

    /// Create a form with a caller-chosen boundary.
    pub fn with_boundary(parts: Vec<Part>, boundary: impl Into<String>) -> Self {
        Self {
            boundary: boundary.into(),
            parts,
        }
    }

    /// Build a form whose boundary matches the caller's Content-Type.
    ///
    /// A `boundary=` parameter already present in `content_type` is reused;
    /// otherwise a new boundary is generated.
    pub fn for_content_type(parts: Vec<Part>, content_type: Option<&str>) -> Self {
        match content_type.and_then(boundary_param) {
            Some(boundary) => Self::with_boundary(parts, boundary),
            None => Self::new(parts),
        }
    }

    /// Get the boundary string.
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Content-Type header value for this form.
    ///
    /// A caller-provided `multipart/*` type is kept, gaining a boundary
    /// parameter if it had none.
    pub fn content_type_for(&self, content_type: Option<&str>) -> String {
        match content_type {
            Some(ct) if ct.trim_start().to_ascii_lowercase().starts_with("multipart/") => {
                if boundary_param(ct).is_some() {
                    ct.to_string()
                } else {
                    format!("{}; boundary={}", ct.trim_end_matches([';', ' ']), self.boundary)
                }
            }
            _ => self.content_type(),
        }
    }

    /// Get the default Content-Type header value.
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// Compute the total content length.
    pub fn content_length(&self) -> u64 {
        if self.parts.is_empty() {
            return 0;
        }

        let mut length = 0usize;

        for part in &self.parts {
            // --boundary\r\n
            length += 2 + self.boundary.len() + 2;

            // Content-Disposition header
            length += part.format_headers().len();

            // \r\n\r\n
            length += 4;

            // Body
            length += part.data.len();

            // \r\n
            length += 2;
        }

        // Final boundary: --boundary--\r\n
        length += 2 + self.boundary.len() + 4;

        length as u64
    }

    /// Convert the form into body bytes.
    pub fn into_body(self) -> Bytes {
        if self.parts.is_empty() {
            return Bytes::new();
        }

        let mut output = Vec::with_capacity(self.content_length() as usize);

        for part in &self.parts {
            // --boundary\r\n
            output.extend_from_slice(b"--");
            output.extend_from_slice(self.boundary.as_bytes());
            output.extend_from_slice(b"\r\n");

            // Headers
            output.extend_from_slice(part.format_headers().as_bytes());
            output.extend_from_slice(b"\r\n\r\n");

            // Body
            output.extend_from_slice(&part.data);
            output.extend_from_slice(b"\r\n");
        }

        // Final boundary
        output.extend_from_slice(b"--");
        output.extend_from_slice(self.boundary.as_bytes());
        output.extend_from_slice(b"--\r\n");

        Bytes::from(output)
    }
}

/// A named part of a multipart form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    name: Cow<'static, str>,
    data: Bytes,
    content_type: Option<String>,
    file_name: Option<Cow<'static, str>>,
}

impl Part {
    /// Create a text part.
    pub fn text<N, V>(name: N, value: V) -> Self
    where
        N: Into<Cow<'static, str>>,
        V: Into<Cow<'static, str>>,
    {
        let s = value.into();
        Self {
            name: name.into(),
            data: Bytes::from(s.into_owned()),
            content_type: Some("text/plain; charset=utf-8".to_string()),
            file_name: None,
        }
    }

    /// Create a part from bytes.
    pub fn bytes<N, B>(name: N, data: B) -> Self
    where
        N: Into<Cow<'static, str>>,
        B: Into<Bytes>,
    {
        Self {
            name: name.into(),
            data: data.into(),
            content_type: None,
            file_name: None,
        }
    }

    /// Set the content type.
    pub fn content_type<S: Into<String>>(mut self, mime: S) -> Self {
        self.content_type = Some(mime.into());
        self
    }

    /// Set the file name.
    pub fn file_name<S>(mut self, name: S) -> Self
    where
        S: Into<Cow<'static, str>>,
    {
        self.file_name = Some(name.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Format the part headers.
    fn format_headers(&self) -> String {
        let mut header = format!(
            "Content-Disposition: form-data; name=\"{}\"",
            escape_quotes(&self.name)
        );

        if let Some(ref filename) = self.file_name {
            header.push_str(&format!("; filename=\"{}\"", escape_quotes(filename)));
        }

        if let Some(ref mime) = self.content_type {
            header.push_str(&format!("\r\nContent-Type: {}", mime));
        }

        header
    }

    /// Get the data length.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if part is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Extract the `boundary` parameter of a Content-Type value.
fn boundary_param(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        if key.trim().eq_ignore_ascii_case("boundary") {
            let value = value.trim().trim_matches('"');
            (!value.is_empty()).then_some(value)
        } else {
            None
        }
    })
}

/// Escape quotes and backslashes in a string.
fn escape_quotes(s: &str) -> Cow<'_, str> {
    if s.contains('"') || s.contains('\\') || s.contains('\r') || s.contains('\n') {
        Cow::Owned(
            s.replace('\\', "\\\\")
                .replace('"', "\\\"")
                .replace('\r', "\\r")
                .replace('\n', "\\n"),
        )
    } else {
        Cow::Borrowed(s)
    }
}

/// Generate a random boundary string.
fn generate_boundary() -> String {
    let mut seed = [0u8; 12];
    if boring::rand::rand_bytes(&mut seed).is_err() {
        // time-derived fallback seed
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        seed.copy_from_slice(&nanos.to_le_bytes()[..12]);
    }
    format!("----asyncnet-boundary-{}", to_hex(&seed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_form() {
        let form = Form::new(Vec::new());
        assert_eq!(form.content_length(), 0);
        assert!(form.into_body().is_empty());
    }

    #[test]
    fn test_text_field() {
        let form = Form::new(vec![Part::text("name", "value")]);
        let body = form.into_body();

        let body_str = String::from_utf8_lossy(&body);
        assert!(body_str.contains("name=\"name\""));
        assert!(body_str.contains("value"));
    }

    #[test]
    fn test_file_part() {
        let part = Part::bytes("upload", b"file data".as_slice())
            .file_name("test.txt")
            .content_type("text/plain");

        let body = Form::new(vec![part]).into_body();

        let body_str = String::from_utf8_lossy(&body);
        assert!(body_str.contains("filename=\"test.txt\""));
        assert!(body_str.contains("Content-Type: text/plain"));
        assert!(body_str.contains("file data"));
    }

    #[test]
    fn test_boundary_is_random() {
        let a = Form::new(Vec::new());
        let b = Form::new(Vec::new());
        assert!(a.boundary().starts_with("----asyncnet-boundary-"));
        assert_ne!(a.boundary(), b.boundary());
    }

    #[test]
    fn test_content_length_matches_body() {
        let form = Form::new(vec![Part::text("key", "value"), Part::bytes("b", vec![0u8; 7])]);

        let length = form.content_length();
        let body = form.into_body();
        assert_eq!(length, body.len() as u64);
    }

    #[test]
    fn test_reuses_caller_boundary() {
        let ct = "multipart/form-data; boundary=abc123";
        let form = Form::for_content_type(vec![Part::text("a", "b")], Some(ct));
        assert_eq!(form.boundary(), "abc123");
        assert_eq!(form.content_type_for(Some(ct)), ct);
    }

    #[test]
    fn test_adds_boundary_to_caller_type() {
        let form = Form::with_boundary(Vec::new(), "xyz");
        assert_eq!(
            form.content_type_for(Some("multipart/mixed")),
            "multipart/mixed; boundary=xyz"
        );
        assert_eq!(
            form.content_type_for(Some("application/json")),
            "multipart/form-data; boundary=xyz"
        );
    }

    #[test]
    fn test_escape_quotes() {
        assert_eq!(escape_quotes("normal"), "normal");
        assert_eq!(escape_quotes("with\"quote"), "with\\\"quote");
        assert_eq!(escape_quotes("with\\slash"), "with\\\\slash");
    }
}
