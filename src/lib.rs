//! # askyourpdf
//!
//! Client-side ingestion and conversation pipeline for a "chat with a
//! document" backend.
//!
//! A user picks a PDF; the client reads its title and paints a page-1
//! preview locally, uploads the file to the backend for indexing, and then
//! sends free-text prompts whose answers come back grounded in that
//! document. This crate is the orchestration layer in between: the state a
//! document and a chat exchange pass through, and the concurrency and error
//! semantics of the calls that move them along.
//!
//! ## Pipeline Overview
//!
//! ```text
//! select_file ─┬─ encode  bytes → data URL ──▶ render page 1 (pdfium)
//!              └─ metadata  Info /Title (lopdf) or "Untitled PDF"
//! upload ────── POST /upload   multipart, field `pdf_file`
//! ask ───────── POST /chat     {"prompt": …} → {"response": …}
//! ```
//!
//! Every failure is recovered locally: logged through `tracing`, then
//! folded into the state as `Failed`, "previous response kept", a fallback
//! title or an empty preview. Nothing here is fatal to the session.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use askyourpdf::{ChatOutcome, DocumentSource, SessionConfig, SessionController};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let session = SessionController::new(SessionConfig::default())?;
//!
//!     let source = DocumentSource::from_path("paper.pdf").await?;
//!     session.select_file(source).settled().await;
//!     println!("{}", session.snapshot().document.unwrap().title());
//!
//!     session.upload().await;
//!     if let ChatOutcome::Answered(answer) = session.ask("What is this about?").await {
//!         println!("{answer}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `askpdf` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! pdfium is loaded at runtime: from [`SessionConfig::pdfium_library_path`]
//! when set, otherwise from the system library path. Without it previews stay
//! empty; titles, uploads and chat are unaffected.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod client;
pub mod config;
pub mod document;
pub mod error;
pub mod pipeline;
pub mod session;
pub mod state;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use client::{BackendClient, ChatRequest, ChatResponse, UploadReceipt};
pub use config::{SessionConfig, SessionConfigBuilder, DEFAULT_FALLBACK_TITLE};
pub use document::{Document, DocumentSource, TitleSource};
pub use error::{AskPdfError, RenderError};
pub use pipeline::metadata::{InfoDictReader, MetadataReader};
pub use pipeline::render::{PdfiumPreviewRenderer, PreviewRenderer, PreviewSurface};
pub use session::{ChatOutcome, FileSelection, SessionController, UploadOutcome};
pub use state::{ChatExchange, Preview, SessionState, StateSummary, UploadState};
