//! pdfium binding shared by the metadata reader and the preview renderer.
//!
//! pdfium uses thread-local state and is not async-safe, so every caller of
//! [`bind`] is expected to be running on the blocking pool.

use crate::error::AskPdfError;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::debug;

/// Bind to pdfium: an explicit library (file or directory) if given,
/// otherwise whatever the system loader finds.
pub(crate) fn bind(library: Option<&Path>) -> Result<Pdfium, AskPdfError> {
    let bindings = match library {
        Some(path) if path.is_dir() => {
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(path))
        }
        Some(path) => Pdfium::bind_to_library(path),
        None => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| AskPdfError::PdfiumBindingFailed(format!("{e:?}")))?;

    debug!(
        "Bound pdfium ({})",
        library.map_or("system".to_string(), |p| p.display().to_string())
    );
    Ok(Pdfium::new(bindings))
}
