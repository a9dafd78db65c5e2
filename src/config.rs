//! Configuration for an askyourpdf session.
//!
//! Every knob lives in [`SessionConfig`], built via its
//! [`SessionConfigBuilder`]. The library itself never reads environment
//! variables; the `askpdf` binary maps its flags (and their `ASKPDF_*`
//! overrides) onto the builder.

use crate::error::AskPdfError;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Title shown for documents whose metadata carries no title.
pub const DEFAULT_FALLBACK_TITLE: &str = "Untitled PDF";

/// Default backend origin (the Flask development server).
pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:5000";

/// Configuration for a [`crate::session::SessionController`].
///
/// # Example
/// ```rust
/// use askyourpdf::SessionConfig;
///
/// let config = SessionConfig::builder()
///     .backend_url("http://localhost:8080")
///     .preview_width(240)
///     .build()
///     .unwrap();
/// assert_eq!(config.upload_url().unwrap().as_str(), "http://localhost:8080/upload");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Backend origin, e.g. `http://127.0.0.1:5000`.
    pub backend_url: String,

    /// Path of the ingestion endpoint. Default: `/upload`.
    pub upload_path: String,

    /// Path of the query endpoint. Default: `/chat`.
    pub chat_path: String,

    /// Multipart field carrying the PDF bytes. Default: `pdf_file`.
    pub upload_field: String,

    /// Whole-request timeout in seconds. Default: 120.
    ///
    /// Ingestion indexes the document server-side before answering, so this
    /// is deliberately generous.
    pub request_timeout_secs: u64,

    /// TCP connect timeout in seconds. Default: 10.
    pub connect_timeout_secs: u64,

    /// Pixel width of the page-1 preview. Default: 120.
    pub preview_width: u32,

    /// Title used when metadata yields none. Default: `"Untitled PDF"`.
    pub fallback_title: String,

    /// Explicit pdfium shared library. When `None` the system library is used.
    pub pdfium_library_path: Option<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            upload_path: "/upload".to_string(),
            chat_path: "/chat".to_string(),
            upload_field: "pdf_file".to_string(),
            request_timeout_secs: 120,
            connect_timeout_secs: 10,
            preview_width: 120,
            fallback_title: DEFAULT_FALLBACK_TITLE.to_string(),
            pdfium_library_path: None,
        }
    }
}

impl SessionConfig {
    /// Create a new builder for `SessionConfig`.
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Absolute URL of the ingestion endpoint.
    pub fn upload_url(&self) -> Result<Url, AskPdfError> {
        join_endpoint(&self.backend_url, &self.upload_path)
    }

    /// Absolute URL of the query endpoint.
    pub fn chat_url(&self) -> Result<Url, AskPdfError> {
        join_endpoint(&self.backend_url, &self.chat_path)
    }
}

/// Builder for [`SessionConfig`].
#[derive(Debug)]
pub struct SessionConfigBuilder {
    config: SessionConfig,
}

impl SessionConfigBuilder {
    pub fn backend_url(mut self, url: impl Into<String>) -> Self {
        self.config.backend_url = url.into();
        self
    }

    pub fn upload_path(mut self, path: impl Into<String>) -> Self {
        self.config.upload_path = path.into();
        self
    }

    pub fn chat_path(mut self, path: impl Into<String>) -> Self {
        self.config.chat_path = path.into();
        self
    }

    pub fn upload_field(mut self, field: impl Into<String>) -> Self {
        self.config.upload_field = field.into();
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs.max(1);
        self
    }

    pub fn connect_timeout_secs(mut self, secs: u64) -> Self {
        self.config.connect_timeout_secs = secs.max(1);
        self
    }

    pub fn preview_width(mut self, px: u32) -> Self {
        self.config.preview_width = px.clamp(16, 4096);
        self
    }

    pub fn fallback_title(mut self, title: impl Into<String>) -> Self {
        self.config.fallback_title = title.into();
        self
    }

    pub fn pdfium_library_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_library_path = Some(path.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<SessionConfig, AskPdfError> {
        let c = &self.config;
        let base = Url::parse(&c.backend_url).map_err(|e| {
            AskPdfError::InvalidConfig(format!("backend URL '{}': {e}", c.backend_url))
        })?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(AskPdfError::InvalidConfig(format!(
                "backend URL must be http or https, got '{}'",
                base.scheme()
            )));
        }
        if c.upload_field.trim().is_empty() {
            return Err(AskPdfError::InvalidConfig(
                "upload field name must not be empty".into(),
            ));
        }
        c.upload_url()?;
        c.chat_url()?;
        Ok(self.config)
    }
}

/// Join an endpoint path onto the backend origin, keeping any base path
/// prefix (`http://host/api` + `/chat` → `http://host/api/chat`).
fn join_endpoint(base: &str, path: &str) -> Result<Url, AskPdfError> {
    let joined = format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    Url::parse(&joined)
        .map_err(|e| AskPdfError::InvalidConfig(format!("endpoint URL '{joined}': {e}")))
}
