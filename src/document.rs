//! The user-selected file and the document derived from it.
//!
//! A [`DocumentSource`] is what the file picker hands over: a name and the
//! raw bytes, unvalidated. A [`Document`] is the controller's view of that
//! source once it has been selected: the same bytes plus the preview
//! encoding and title derived from them, stamped with the selection
//! generation that produced it.
//!
//! Documents are values. The controller never mutates one through a shared
//! reference; when a derived field resolves it swaps in a new value built
//! with [`Document::with_title`] / [`Document::with_display_encoding`].

use crate::error::AskPdfError;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Raw file as delivered by the file-selection surface.
#[derive(Clone)]
pub struct DocumentSource {
    name: String,
    bytes: Arc<[u8]>,
}

impl DocumentSource {
    /// Wrap in-memory bytes. No size or type validation is performed.
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        let bytes: Vec<u8> = bytes.into();
        Self {
            name: name.into(),
            bytes: Arc::from(bytes),
        }
    }

    /// Read a file from disk; the file name becomes the source name.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, AskPdfError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| AskPdfError::ReadFailed {
                path: path.to_path_buf(),
                source,
            })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document.pdf".to_string());
        debug!("Read {} ({} bytes)", path.display(), bytes.len());
        Ok(Self::new(name, bytes))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for DocumentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentSource")
            .field("name", &self.name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Where the current title came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TitleSource {
    /// Metadata extraction has not resolved yet; the title is the fallback.
    Pending,
    /// Read from the document's Info dictionary.
    Metadata,
    /// Extraction finished without a usable title, or failed.
    Fallback,
}

/// A selected document together with its derived preview encoding and title.
#[derive(Clone)]
pub struct Document {
    generation: u64,
    source: DocumentSource,
    display_encoding: Option<Arc<str>>,
    title: String,
    title_source: TitleSource,
}

impl Document {
    /// A freshly selected document: no encoding yet, fallback title pending.
    pub(crate) fn pending(generation: u64, source: DocumentSource, fallback_title: &str) -> Self {
        Self {
            generation,
            source,
            display_encoding: None,
            title: fallback_title.to_string(),
            title_source: TitleSource::Pending,
        }
    }

    pub(crate) fn with_display_encoding(self, encoding: Arc<str>) -> Self {
        Self {
            display_encoding: Some(encoding),
            ..self
        }
    }

    pub(crate) fn with_title(self, title: String, source: TitleSource) -> Self {
        Self {
            title,
            title_source: source,
            ..self
        }
    }

    /// Selection token; strictly increasing across `select_file` calls.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn name(&self) -> &str {
        self.source.name()
    }

    pub fn bytes(&self) -> &[u8] {
        self.source.bytes()
    }

    pub fn source(&self) -> &DocumentSource {
        &self.source
    }

    /// `data:application/pdf;base64,…` string, once the encode step resolved.
    pub fn display_encoding(&self) -> Option<&str> {
        self.display_encoding.as_deref()
    }

    /// Display title. Never empty-by-omission: the fallback until resolved.
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn title_source(&self) -> TitleSource {
        self.title_source
    }

    /// True once both background steps have landed for this document.
    pub fn is_resolved(&self) -> bool {
        self.display_encoding.is_some() && self.title_source != TitleSource::Pending
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("generation", &self.generation)
            .field("name", &self.source.name())
            .field("len", &self.source.len())
            .field(
                "display_encoding",
                &self.display_encoding.as_ref().map(|e| e.len()),
            )
            .field("title", &self.title)
            .field("title_source", &self.title_source)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn pending_document_uses_fallback_title() {
        let doc = Document::pending(1, DocumentSource::new("a.pdf", b"%PDF".to_vec()), "Untitled PDF");
        assert_eq!(doc.title(), "Untitled PDF");
        assert_eq!(doc.title_source(), TitleSource::Pending);
        assert!(doc.display_encoding().is_none());
        assert!(!doc.is_resolved());
    }

    #[test]
    fn derived_copies_keep_bytes_and_generation() {
        let doc = Document::pending(7, DocumentSource::new("a.pdf", b"abc".to_vec()), "Untitled PDF")
            .with_display_encoding(Arc::from("data:application/pdf;base64,YWJj"))
            .with_title("Report".into(), TitleSource::Metadata);
        assert_eq!(doc.generation(), 7);
        assert_eq!(doc.bytes(), b"abc");
        assert_eq!(doc.title(), "Report");
        assert!(doc.is_resolved());
    }

    #[test]
    fn debug_does_not_dump_bytes() {
        let src = DocumentSource::new("big.pdf", vec![0u8; 4096]);
        let dbg = format!("{src:?}");
        assert!(dbg.contains("4096"));
        assert!(dbg.len() < 100);
    }

    #[tokio::test]
    async fn from_path_reads_name_and_bytes() {
        let mut tmp = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
        tmp.write_all(b"%PDF-1.4 test").unwrap();

        let src = DocumentSource::from_path(tmp.path()).await.unwrap();
        assert_eq!(src.bytes(), b"%PDF-1.4 test");
        assert!(src.name().ends_with(".pdf"));
    }

    #[tokio::test]
    async fn from_path_missing_file_is_read_error() {
        let err = DocumentSource::from_path("/definitely/not/here.pdf")
            .await
            .unwrap_err();
        assert!(matches!(err, AskPdfError::ReadFailed { .. }));
    }
}
