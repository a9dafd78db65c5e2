//! HTTP client for the two backend endpoints.
//!
//! | Call | Request | Success |
//! |------|---------|---------|
//! | [`BackendClient::upload`] | `POST /upload`, multipart field `pdf_file` | any 2xx |
//! | [`BackendClient::ask`]    | `POST /chat`, JSON `{"prompt": …}`        | `{"response": …}` |
//!
//! The client reports every failure as an [`AskPdfError`]; deciding what a
//! failure means for the session is the controller's job.

use crate::config::SessionConfig;
use crate::document::Document;
use crate::error::AskPdfError;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, Url};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// Body of `POST /chat`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatRequest {
    pub prompt: String,
}

/// Success body of `POST /chat`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatResponse {
    pub response: String,
}

/// What the backend said when it accepted a document.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UploadReceipt {
    pub status: u16,
    /// The `message` field of a JSON body, else the raw body text.
    pub message: String,
}

/// Thin reqwest wrapper bound to one backend.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: Client,
    upload_url: Url,
    chat_url: Url,
    upload_field: String,
    timeout_secs: u64,
}

impl BackendClient {
    pub fn new(config: &SessionConfig) -> Result<Self, AskPdfError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| AskPdfError::Internal(format!("HTTP client: {e}")))?;

        Ok(Self {
            http,
            upload_url: config.upload_url()?,
            chat_url: config.chat_url()?,
            upload_field: config.upload_field.clone(),
            timeout_secs: config.request_timeout_secs,
        })
    }

    /// Send the document's raw bytes to the ingestion endpoint.
    ///
    /// Zero-byte documents are sent as-is; the backend decides what to do.
    pub async fn upload(&self, document: &Document) -> Result<UploadReceipt, AskPdfError> {
        let endpoint = self.upload_url.as_str();
        info!(
            "Uploading '{}' ({} bytes) to {}",
            document.name(),
            document.bytes().len(),
            endpoint
        );

        let part = Part::bytes(document.bytes().to_vec())
            .file_name(document.name().to_string())
            .mime_str(crate::pipeline::encode::PDF_MIME)
            .map_err(|e| AskPdfError::Internal(format!("multipart part: {e}")))?;
        let form = Form::new().part(self.upload_field.clone(), part);

        let response = self
            .http
            .post(self.upload_url.clone())
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.send_error(endpoint, e))?;

        let response = check_status(endpoint, response).await?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| self.send_error(endpoint, e))?;

        let message = upload_message(&body);
        debug!("Upload accepted (HTTP {}): {}", status, message);
        Ok(UploadReceipt { status, message })
    }

    /// Send a prompt to the query endpoint and return the answer text.
    pub async fn ask(&self, prompt: &str) -> Result<String, AskPdfError> {
        let endpoint = self.chat_url.as_str();
        debug!("Asking {} ({} chars)", endpoint, prompt.len());

        let response = self
            .http
            .post(self.chat_url.clone())
            .json(&ChatRequest {
                prompt: prompt.to_string(),
            })
            .send()
            .await
            .map_err(|e| self.send_error(endpoint, e))?;

        let response = check_status(endpoint, response).await?;
        let body = response
            .text()
            .await
            .map_err(|e| self.send_error(endpoint, e))?;

        let parsed: ChatResponse =
            serde_json::from_str(&body).map_err(|e| AskPdfError::Decode {
                endpoint: endpoint.to_string(),
                detail: e.to_string(),
            })?;
        Ok(parsed.response)
    }

    fn send_error(&self, endpoint: &str, e: reqwest::Error) -> AskPdfError {
        if e.is_timeout() {
            AskPdfError::Timeout {
                endpoint: endpoint.to_string(),
                secs: self.timeout_secs,
            }
        } else {
            AskPdfError::Transport {
                endpoint: endpoint.to_string(),
                source: e,
            }
        }
    }
}

/// Turn any non-2xx response into [`AskPdfError::Status`].
async fn check_status(endpoint: &str, response: Response) -> Result<Response, AskPdfError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(AskPdfError::Status {
        endpoint: endpoint.to_string(),
        status: status.as_u16(),
        body: truncate(&body, 200),
    })
}

/// Pull `message` out of a JSON object body, else keep the text.
fn upload_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message")?.as_str().map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}\u{2026}", &s[..idx]),
        None => s.to_string(),
    }
}
