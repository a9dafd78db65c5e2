//! Error types for the askyourpdf library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`AskPdfError`]: a step failed, for example the backend rejected a
//!   request or the PDF could not be opened. The
//!   [`crate::session::SessionController`] catches these, logs them and folds
//!   them into [`crate::state::UploadState::Failed`] or "prior state
//!   retained". Only configuration and file-reading errors ever reach the
//!   caller as `Err`.
//!
//! * [`RenderError`]: the preview collaborator could not paint page 1. It
//!   is purely cosmetic; the session continues with an empty preview.

use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the askyourpdf library.
#[derive(Debug, Error)]
pub enum AskPdfError {
    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Document errors ───────────────────────────────────────────────────
    /// The selected file could not be read from disk.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The display encoding is not a base64 `data:` URL.
    #[error("Malformed display encoding: {0}")]
    MalformedEncoding(String),

    // ── PDF errors ────────────────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium or install pdfium system-wide."
    )]
    PdfiumBindingFailed(String),

    /// The bytes could not be opened as a PDF document.
    #[error("Could not open document: {detail}")]
    UnreadablePdf { detail: String },

    // ── Backend errors ────────────────────────────────────────────────────
    /// The request never produced an HTTP response (DNS, refused, reset).
    #[error("Request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// The request exceeded the configured timeout.
    #[error("Request to {endpoint} timed out after {secs}s")]
    Timeout { endpoint: String, secs: u64 },

    /// The backend answered with a non-2xx status.
    #[error("{endpoint} returned HTTP {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// The backend answered 2xx but the body did not match the contract.
    #[error("Unexpected response from {endpoint}: {detail}")]
    Decode { endpoint: String, detail: String },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error (a background task panicked, …).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AskPdfError {
    /// Short, single-line reason suitable for [`crate::state::UploadState::Failed`].
    pub fn reason(&self) -> String {
        match self {
            AskPdfError::Status { status, body, .. } => match backend_error_message(body) {
                Some(message) => format!("HTTP {status}: {message}"),
                None => format!("HTTP {status}"),
            },
            AskPdfError::Timeout { secs, .. } => format!("timed out after {secs}s"),
            AskPdfError::Transport { source, .. } => source.to_string(),
            other => other.to_string(),
        }
    }
}

/// The backend reports rejections as `{"error": "..."}`.
fn backend_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("error")
        .and_then(serde_json::Value::as_str)
        .map(str::to_string)
}

/// A non-fatal preview failure.
///
/// Logged by the controller and otherwise ignored: the preview area simply
/// stays empty for the current document.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RenderError {
    /// The renderer was handed an encoding it cannot decode.
    #[error("preview input is not a PDF data URL: {0}")]
    BadEncoding(String),

    /// The PDF engine is unavailable.
    #[error("PDF engine unavailable: {0}")]
    EngineUnavailable(String),

    /// The document opened but the page could not be painted.
    #[error("page {page}: {detail}")]
    PageFailed { page: u16, detail: String },

    /// The background render task died.
    #[error("render task failed: {0}")]
    TaskFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_display_includes_endpoint_and_code() {
        let e = AskPdfError::Status {
            endpoint: "http://127.0.0.1:5000/upload".into(),
            status: 500,
            body: "boom".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("/upload"), "got: {msg}");
        assert!(msg.contains("500"), "got: {msg}");
    }

    #[test]
    fn status_reason_carries_backend_error_text() {
        let e = AskPdfError::Status {
            endpoint: "http://x/upload".into(),
            status: 400,
            body: "{\"error\": \"Invalid file format. Please upload a PDF.\"}".into(),
        };
        assert_eq!(e.reason(), "HTTP 400: Invalid file format. Please upload a PDF.");
    }

    #[test]
    fn status_reason_without_json_error_is_just_the_code() {
        let plain = AskPdfError::Status {
            endpoint: "http://x/upload".into(),
            status: 500,
            body: "index crashed".into(),
        };
        assert_eq!(plain.reason(), "HTTP 500");

        let other_shape = AskPdfError::Status {
            endpoint: "http://x/upload".into(),
            status: 502,
            body: "{\"detail\": \"bad gateway\"}".into(),
        };
        assert_eq!(other_shape.reason(), "HTTP 502");
    }

    #[test]
    fn timeout_reason_mentions_seconds() {
        let e = AskPdfError::Timeout {
            endpoint: "http://x/upload".into(),
            secs: 30,
        };
        assert_eq!(e.reason(), "timed out after 30s");
    }

    #[test]
    fn render_error_display() {
        let e = RenderError::PageFailed {
            page: 1,
            detail: "bad xref".into(),
        };
        assert_eq!(e.to_string(), "page 1: bad xref");
    }
}
