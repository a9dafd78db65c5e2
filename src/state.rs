//! Observable session state.
//!
//! [`SessionState`] is the single value presentation layers read. It is
//! owned by [`crate::session::SessionController`] and published through a
//! `tokio::sync::watch` channel; nothing else writes it.

use crate::document::{Document, TitleSource};
use crate::pipeline::render::PreviewSurface;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Lifecycle of the ingestion request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum UploadState {
    /// No upload requested since the current file was selected.
    #[default]
    Idle,
    /// Exactly one upload is outstanding.
    InFlight,
    /// The backend accepted the document.
    Succeeded,
    /// Transport or server failure; the user may retry.
    Failed(String),
}

impl UploadState {
    pub fn is_in_flight(&self) -> bool {
        matches!(self, UploadState::InFlight)
    }

    /// Idle and terminal states accept a new upload request.
    pub fn accepts_upload(&self) -> bool {
        !self.is_in_flight()
    }
}

impl fmt::Display for UploadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadState::Idle => f.write_str("idle"),
            UploadState::InFlight => f.write_str("uploading"),
            UploadState::Succeeded => f.write_str("uploaded"),
            UploadState::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

/// The single-slot chat exchange.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChatExchange {
    /// Most recently submitted prompt.
    pub prompt: String,
    /// Answer from the most recent successful request, if any.
    pub response: Option<String>,
    /// Requests sent but not yet settled.
    pub pending: usize,
}

/// Preview of the current document's first page.
#[derive(Debug, Clone)]
pub struct Preview {
    /// Generation of the document the surface was rendered from.
    pub generation: u64,
    pub surface: Arc<PreviewSurface>,
}

/// Everything presentation needs, in one value.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub document: Option<Document>,
    pub preview: Option<Preview>,
    pub upload: UploadState,
    pub chat: ChatExchange,
}

impl SessionState {
    /// Generation of the current document, if one is selected.
    pub fn generation(&self) -> Option<u64> {
        self.document.as_ref().map(Document::generation)
    }

    /// True when `generation` still names the current document.
    pub fn is_current(&self, generation: u64) -> bool {
        self.generation() == Some(generation)
    }

    /// Serializable summary, without bytes or pixels.
    pub fn summary(&self) -> StateSummary {
        StateSummary {
            document: self.document.as_ref().map(|d| DocumentSummary {
                name: d.name().to_string(),
                size_bytes: d.bytes().len(),
                title: d.title().to_string(),
                title_source: d.title_source(),
                encoded: d.display_encoding().is_some(),
            }),
            preview: self
                .preview
                .as_ref()
                .map(|p| (p.surface.width(), p.surface.height())),
            upload: self.upload.clone(),
            chat: self.chat.clone(),
        }
    }
}

/// JSON-friendly view of [`SessionState`].
#[derive(Debug, Clone, Serialize)]
pub struct StateSummary {
    pub document: Option<DocumentSummary>,
    /// `(width, height)` of the preview surface.
    pub preview: Option<(u32, u32)>,
    pub upload: UploadState,
    pub chat: ChatExchange,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentSummary {
    pub name: String,
    pub size_bytes: usize,
    pub title: String,
    pub title_source: TitleSource,
    pub encoded: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_in_flight_blocks_uploads() {
        assert!(UploadState::Idle.accepts_upload());
        assert!(UploadState::Succeeded.accepts_upload());
        assert!(UploadState::Failed("HTTP 500".into()).accepts_upload());
        assert!(!UploadState::InFlight.accepts_upload());
    }

    #[test]
    fn upload_state_serializes_tagged() {
        let json = serde_json::to_value(UploadState::Failed("HTTP 500".into())).unwrap();
        assert_eq!(json, serde_json::json!({"state": "failed", "reason": "HTTP 500"}));
        let json = serde_json::to_value(UploadState::Idle).unwrap();
        assert_eq!(json, serde_json::json!({"state": "idle"}));
    }

    #[test]
    fn empty_state_has_no_generation() {
        let s = SessionState::default();
        assert_eq!(s.generation(), None);
        assert!(!s.is_current(0));
        assert!(s.summary().document.is_none());
    }
}
