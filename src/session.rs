//! The session controller: sequences file selection, upload and chat.
//!
//! ## State ownership
//!
//! The controller owns one [`SessionState`] held in a
//! `tokio::sync::watch::Sender`. Every mutation is a closure passed to
//! `send_modify` / `send_if_modified`, so each transition is atomic with
//! respect to the others and every committed change is published to
//! subscribers. Nothing outside this module writes the state.
//!
//! ## Generations
//!
//! Each [`SessionController::select_file`] stamps the new document with a
//! strictly increasing generation. The background steps it starts (encode →
//! preview, metadata) carry that number and apply their result only if it
//! still names the current document; otherwise the result is dropped.
//! Nothing is cancelled.
//!
//! ## Single-flight upload
//!
//! [`SessionController::upload`] claims `InFlight` inside one
//! `send_if_modified` closure, which checks and sets in the same critical
//! section. A second request while the first is outstanding is `Rejected`
//! without touching the network.
//!
//! Network calls run in spawned tasks so that dropping the caller's future
//! never leaves the state stuck in `InFlight` or with a dangling `pending`.

use crate::client::{BackendClient, UploadReceipt};
use crate::config::SessionConfig;
use crate::document::{Document, DocumentSource};
use crate::error::AskPdfError;
use crate::pipeline::encode;
use crate::pipeline::metadata::{resolve_title, InfoDictReader, MetadataReader};
use crate::pipeline::render::{PdfiumPreviewRenderer, PreviewRenderer};
use crate::state::{Preview, SessionState, UploadState};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle};
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, info, warn};

/// Page rendered for the preview pane.
const PREVIEW_PAGE: u16 = 1;

/// Result of [`SessionController::upload`].
#[derive(Debug)]
pub enum UploadOutcome {
    /// No document selected; nothing happened.
    Skipped,
    /// Another upload is in flight; nothing happened.
    Rejected,
    /// The backend accepted the document.
    Succeeded(UploadReceipt),
    /// The request failed; the state now reads `Failed`.
    Failed(AskPdfError),
}

/// Result of [`SessionController::ask`].
#[derive(Debug)]
pub enum ChatOutcome {
    /// The answer, now stored as the exchange's response.
    Answered(String),
    /// The request failed; the previous response was kept.
    Failed(AskPdfError),
}

/// Handle returned by [`SessionController::select_file`].
#[derive(Debug)]
pub struct FileSelection {
    document: Document,
    tasks: Vec<JoinHandle<()>>,
}

impl FileSelection {
    /// The document as it was published: fallback title, no encoding yet.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Wait for the encode, preview and metadata steps of this selection.
    ///
    /// Resolves even when the results were discarded as stale.
    pub async fn settled(self) {
        for joined in futures::future::join_all(self.tasks).await {
            if let Err(e) = joined {
                warn!("Background extraction task failed: {}", e);
            }
        }
    }
}

struct Inner {
    config: SessionConfig,
    client: BackendClient,
    metadata: Arc<dyn MetadataReader>,
    renderer: Arc<dyn PreviewRenderer>,
    state: watch::Sender<SessionState>,
    generation: AtomicU64,
}

impl Inner {
    /// Replace the current document with `derive(current)` if its generation
    /// still matches. Returns false when the result was stale.
    fn apply_to_current(&self, generation: u64, derive: impl FnOnce(Document) -> Document) -> bool {
        self.state.send_if_modified(|s| match s.document.take() {
            Some(doc) if doc.generation() == generation => {
                s.document = Some(derive(doc));
                true
            }
            other => {
                s.document = other;
                false
            }
        })
    }

    /// The upload task died before settling; release the in-flight guard.
    fn upload_task_lost(&self, e: JoinError) -> AskPdfError {
        let err = AskPdfError::Internal(format!("upload task failed: {e}"));
        warn!("{}", err);
        let reason = err.reason();
        self.state.send_if_modified(|s| {
            if !s.upload.is_in_flight() {
                return false;
            }
            s.upload = UploadState::Failed(reason);
            true
        });
        err
    }

    /// The chat task died before settling; it no longer counts as pending.
    fn chat_task_lost(&self, e: JoinError) -> AskPdfError {
        let err = AskPdfError::Internal(format!("chat task failed: {e}"));
        warn!("{}", err);
        self.state.send_if_modified(|s| {
            if s.chat.pending == 0 {
                return false;
            }
            s.chat.pending -= 1;
            true
        });
        err
    }
}

/// Orchestrates one long-lived chat-with-a-document session.
///
/// Cheap to clone; clones share the same state.
#[derive(Clone)]
pub struct SessionController {
    inner: Arc<Inner>,
}

impl SessionController {
    /// Controller with the `/Info` metadata reader and the pdfium preview renderer.
    pub fn new(config: SessionConfig) -> Result<Self, AskPdfError> {
        Self::builder(config).build()
    }

    /// Builder for injecting custom collaborators.
    pub fn builder(config: SessionConfig) -> SessionControllerBuilder {
        SessionControllerBuilder {
            config,
            metadata: None,
            renderer: None,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    /// Current state.
    pub fn snapshot(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    /// Receiver notified on every committed transition.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    /// Stream of states: the current one first, then each change.
    pub fn updates(&self) -> WatchStream<SessionState> {
        WatchStream::new(self.subscribe())
    }

    /// Make `source` the current document.
    ///
    /// Publishes a pending document immediately (fallback title, no encoding,
    /// no preview), resets the upload state to `Idle` unless an upload is
    /// still in flight, then starts the encode → preview and metadata steps
    /// in the background. Must be called from within a Tokio runtime.
    pub fn select_file(&self, source: DocumentSource) -> FileSelection {
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let document = Document::pending(generation, source, &self.inner.config.fallback_title);

        info!(
            "Selected '{}' ({} bytes, generation {})",
            document.name(),
            document.bytes().len(),
            generation
        );

        let installed = document.clone();
        self.inner.state.send_if_modified(move |s| {
            // A racing select_file with a higher generation already won.
            if s.generation().is_some_and(|g| g > generation) {
                return false;
            }
            s.document = Some(installed);
            s.preview = None;
            if !s.upload.is_in_flight() {
                s.upload = UploadState::Idle;
            }
            true
        });

        let tasks = vec![
            tokio::spawn(encode_and_preview(Arc::clone(&self.inner), document.clone())),
            tokio::spawn(extract_title(Arc::clone(&self.inner), document.clone())),
        ];
        FileSelection { document, tasks }
    }

    /// Upload the current document.
    ///
    /// No document → [`UploadOutcome::Skipped`]; an upload already in flight
    /// → [`UploadOutcome::Rejected`]. Otherwise the state goes `InFlight` for
    /// exactly the duration of this call and settles to `Succeeded` or
    /// `Failed`. If a different file was selected meanwhile, it settles to
    /// `Idle` instead, since the outcome no longer describes the shown file.
    pub async fn upload(&self) -> UploadOutcome {
        enum Claim {
            NoDocument,
            Busy,
            Claimed(Document),
        }

        let mut claim = Claim::NoDocument;
        self.inner.state.send_if_modified(|s| {
            let Some(doc) = s.document.as_ref() else {
                return false;
            };
            if !s.upload.accepts_upload() {
                claim = Claim::Busy;
                return false;
            }
            claim = Claim::Claimed(doc.clone());
            s.upload = UploadState::InFlight;
            true
        });

        let document = match claim {
            Claim::NoDocument => {
                debug!("Upload requested with no document selected; ignoring");
                return UploadOutcome::Skipped;
            }
            Claim::Busy => {
                debug!("Upload requested while another is in flight; rejecting");
                return UploadOutcome::Rejected;
            }
            Claim::Claimed(doc) => doc,
        };

        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(async move {
            let generation = document.generation();
            let result = inner.client.upload(&document).await;

            match &result {
                Ok(receipt) => info!("Upload succeeded: {}", receipt.message),
                Err(e) => warn!("Upload of '{}' failed: {}", document.name(), e),
            }

            inner.state.send_modify(|s| {
                s.upload = if !s.is_current(generation) {
                    UploadState::Idle
                } else {
                    match &result {
                        Ok(_) => UploadState::Succeeded,
                        Err(e) => UploadState::Failed(e.reason()),
                    }
                };
            });

            match result {
                Ok(receipt) => UploadOutcome::Succeeded(receipt),
                Err(e) => UploadOutcome::Failed(e),
            }
        });

        task.await
            .unwrap_or_else(|e| UploadOutcome::Failed(self.inner.upload_task_lost(e)))
    }

    /// Send `prompt` to the backend.
    ///
    /// The prompt is recorded immediately; the response slot changes only on
    /// success. Overlapping calls are allowed and the last answer to arrive
    /// wins, regardless of submission order.
    pub async fn ask(&self, prompt: impl Into<String>) -> ChatOutcome {
        let prompt = prompt.into();
        self.inner.state.send_modify(|s| {
            s.chat.prompt = prompt.clone();
            s.chat.pending += 1;
        });

        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(async move {
            let result = inner.client.ask(&prompt).await;

            inner.state.send_modify(|s| {
                s.chat.pending = s.chat.pending.saturating_sub(1);
                if let Ok(answer) = &result {
                    s.chat.response = Some(answer.clone());
                }
            });

            match result {
                Ok(answer) => {
                    debug!("Chat answered ({} chars)", answer.len());
                    ChatOutcome::Answered(answer)
                }
                Err(e) => {
                    warn!("Chat request failed: {}", e);
                    ChatOutcome::Failed(e)
                }
            }
        });

        task.await
            .unwrap_or_else(|e| ChatOutcome::Failed(self.inner.chat_task_lost(e)))
    }
}

/// Builder for [`SessionController`].
pub struct SessionControllerBuilder {
    config: SessionConfig,
    metadata: Option<Arc<dyn MetadataReader>>,
    renderer: Option<Arc<dyn PreviewRenderer>>,
}

impl SessionControllerBuilder {
    pub fn metadata_reader(mut self, reader: Arc<dyn MetadataReader>) -> Self {
        self.metadata = Some(reader);
        self
    }

    pub fn preview_renderer(mut self, renderer: Arc<dyn PreviewRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn build(self) -> Result<SessionController, AskPdfError> {
        let client = BackendClient::new(&self.config)?;
        let library = self.config.pdfium_library_path.clone();
        let metadata = self.metadata.unwrap_or_else(|| Arc::new(InfoDictReader));
        let renderer = self
            .renderer
            .unwrap_or_else(|| Arc::new(PdfiumPreviewRenderer::with_library(library)));
        let (state, _) = watch::channel(SessionState::default());

        Ok(SessionController {
            inner: Arc::new(Inner {
                config: self.config,
                client,
                metadata,
                renderer,
                state,
                generation: AtomicU64::new(0),
            }),
        })
    }
}

// ── Background steps ─────────────────────────────────────────────────────

/// Encode the bytes, attach the encoding, then render the preview from it.
async fn encode_and_preview(inner: Arc<Inner>, document: Document) {
    let generation = document.generation();
    let source = document.source().clone();

    let encoding: Arc<str> =
        match tokio::task::spawn_blocking(move || encode::encode_data_url(source.bytes())).await {
            Ok(e) => Arc::from(e),
            Err(e) => {
                warn!("Encoding task for generation {} failed: {}", generation, e);
                return;
            }
        };

    let attached = {
        let encoding = Arc::clone(&encoding);
        inner.apply_to_current(generation, move |d| d.with_display_encoding(encoding))
    };
    if !attached {
        debug!("Discarding stale encoding for generation {}", generation);
        return;
    }

    if document.bytes().is_empty() || encode::is_empty_payload(&encoding) {
        debug!("Empty document; skipping preview render");
        return;
    }

    let renderer = Arc::clone(&inner.renderer);
    let width = inner.config.preview_width;
    let rendered = tokio::task::spawn_blocking(move || {
        renderer.render(&encoding, PREVIEW_PAGE, width)
    })
    .await
    .unwrap_or_else(|e| Err(crate::error::RenderError::TaskFailed(e.to_string())));

    match rendered {
        Ok(surface) => {
            let surface = Arc::new(surface);
            let shown = inner.state.send_if_modified(|s| {
                if !s.is_current(generation) {
                    return false;
                }
                s.preview = Some(Preview {
                    generation,
                    surface,
                });
                true
            });
            if !shown {
                debug!("Discarding stale preview for generation {}", generation);
            }
        }
        Err(e) => warn!("Preview render failed for '{}': {}", document.name(), e),
    }
}

/// Read the metadata title and attach it (or the fallback).
async fn extract_title(inner: Arc<Inner>, document: Document) {
    let generation = document.generation();
    let reader = Arc::clone(&inner.metadata);
    let source = document.source().clone();

    let read = tokio::task::spawn_blocking(move || reader.read_title(source.bytes()))
        .await
        .unwrap_or_else(|e| Err(AskPdfError::Internal(format!("metadata task panicked: {e}"))));

    let (title, title_source) = resolve_title(read, &inner.config.fallback_title);
    debug!("Title for generation {}: {:?}", generation, title);

    if !inner.apply_to_current(generation, move |d| d.with_title(title, title_source)) {
        debug!("Discarding stale title for generation {}", generation);
    }
}
