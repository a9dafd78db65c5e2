//! Display encoding: raw PDF bytes ⇄ `data:application/pdf;base64,…`.
//!
//! The preview renderer takes a self-contained data URL rather than a file
//! path, so the preview never needs a network round trip or a temp file.
//! Encoding runs once per selected file and is cached on the
//! [`crate::document::Document`].

use crate::error::AskPdfError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// MIME type stamped on every display encoding.
pub const PDF_MIME: &str = "application/pdf";

/// `data:[<mime>][;param=value]*;base64,<payload>`
static DATA_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^data:(?P<mime>[\w.+-]+/[\w.+-]+)?(?:;[\w-]+=[^;,]*)*;base64,(?P<payload>.*)$")
        .expect("valid data-url regex")
});

/// Encode raw bytes as a PDF data URL.
///
/// Zero bytes encode to `data:application/pdf;base64,` (an empty payload),
/// which renderers treat as "nothing to draw".
pub fn encode_data_url(bytes: &[u8]) -> String {
    let b64 = STANDARD.encode(bytes);
    debug!("Encoded {} bytes → {} bytes base64", bytes.len(), b64.len());
    format!("data:{PDF_MIME};base64,{b64}")
}

/// Decode a base64 data URL back to raw bytes.
pub fn decode_data_url(encoding: &str) -> Result<Vec<u8>, AskPdfError> {
    let caps = DATA_URL.captures(encoding).ok_or_else(|| {
        AskPdfError::MalformedEncoding(format!(
            "expected 'data:…;base64,…', got '{}'",
            encoding.chars().take(32).collect::<String>()
        ))
    })?;
    let payload = caps.name("payload").map_or("", |m| m.as_str());
    STANDARD
        .decode(payload)
        .map_err(|e| AskPdfError::MalformedEncoding(e.to_string()))
}

/// True when the encoding carries no payload bytes.
pub fn is_empty_payload(encoding: &str) -> bool {
    encoding.ends_with(";base64,")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_with_pdf_mime() {
        let url = encode_data_url(b"%PDF-1.7");
        assert_eq!(url, "data:application/pdf;base64,JVBERi0xLjc=");
    }

    #[test]
    fn empty_bytes_give_empty_payload() {
        let url = encode_data_url(b"");
        assert_eq!(url, "data:application/pdf;base64,");
        assert!(is_empty_payload(&url));
        assert!(decode_data_url(&url).unwrap().is_empty());
    }

    #[test]
    fn decodes_foreign_mime_and_params() {
        let bytes = decode_data_url("data:application/octet-stream;name=a.pdf;base64,YWJj").unwrap();
        assert_eq!(bytes, b"abc");
    }

    #[test]
    fn rejects_non_base64_data_url() {
        let err = decode_data_url("data:text/plain,hello").unwrap_err();
        assert!(matches!(err, AskPdfError::MalformedEncoding(_)));
    }

    #[test]
    fn rejects_bad_payload() {
        assert!(decode_data_url("data:application/pdf;base64,@@@").is_err());
    }
}
