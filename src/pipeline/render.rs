//! Page-1 preview: paint a page of the display encoding into a surface.
//!
//! The renderer is an external collaborator. The controller only ever asks
//! for "page N of this data URL at this width" through [`PreviewRenderer`]
//! and treats every [`RenderError`] as cosmetic.
//!
//! [`PdfiumPreviewRenderer`] is the stock implementation. Only the target
//! width is fixed; pdfium scales the height to keep the page aspect ratio.

use crate::error::RenderError;
use crate::pipeline::{encode, engine};
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::fmt;
use std::io::Cursor;
use std::path::PathBuf;
use tracing::debug;

/// A rendered page ready for display.
#[derive(Clone)]
pub struct PreviewSurface {
    page: u16,
    image: DynamicImage,
}

impl PreviewSurface {
    pub fn new(page: u16, image: DynamicImage) -> Self {
        Self { page, image }
    }

    /// 1-indexed page number this surface shows.
    pub fn page(&self) -> u16 {
        self.page
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    /// Lossless PNG bytes of the surface.
    pub fn to_png(&self) -> Result<Vec<u8>, image::ImageError> {
        let mut buf = Vec::new();
        self.image
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;
        Ok(buf)
    }
}

impl fmt::Debug for PreviewSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreviewSurface")
            .field("page", &self.page)
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}

/// Renders one page of a PDF given as a display encoding.
///
/// Implementations are called on the blocking pool and may block.
pub trait PreviewRenderer: Send + Sync {
    fn render(
        &self,
        display_encoding: &str,
        page_number: u16,
        width: u32,
    ) -> Result<PreviewSurface, RenderError>;
}

/// [`PreviewRenderer`] backed by pdfium.
#[derive(Debug, Clone, Default)]
pub struct PdfiumPreviewRenderer {
    library: Option<PathBuf>,
}

impl PdfiumPreviewRenderer {
    /// Use an explicit pdfium library instead of the system one.
    pub fn with_library(library: Option<PathBuf>) -> Self {
        Self { library }
    }
}

impl PreviewRenderer for PdfiumPreviewRenderer {
    fn render(
        &self,
        display_encoding: &str,
        page_number: u16,
        width: u32,
    ) -> Result<PreviewSurface, RenderError> {
        let bytes = encode::decode_data_url(display_encoding)
            .map_err(|e| RenderError::BadEncoding(e.to_string()))?;
        if page_number == 0 {
            return Err(RenderError::PageFailed {
                page: 0,
                detail: "pages are 1-indexed".into(),
            });
        }

        let pdfium = engine::bind(self.library.as_deref())
            .map_err(|e| RenderError::EngineUnavailable(e.to_string()))?;
        let document = pdfium
            .load_pdf_from_byte_slice(&bytes, None)
            .map_err(|e| RenderError::PageFailed {
                page: page_number,
                detail: format!("{e:?}"),
            })?;

        let page = document
            .pages()
            .get(page_number - 1)
            .map_err(|e| RenderError::PageFailed {
                page: page_number,
                detail: format!("{e:?}"),
            })?;

        let render_config = PdfRenderConfig::new().set_target_width(width as i32);
        let bitmap = page
            .render_with_config(&render_config)
            .map_err(|e| RenderError::PageFailed {
                page: page_number,
                detail: format!("{e:?}"),
            })?;

        let image = bitmap.as_image();
        debug!(
            "Rendered page {} → {}x{} px",
            page_number,
            image.width(),
            image.height()
        );
        Ok(PreviewSurface::new(page_number, image))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn surface_exports_png() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(12, 16, Rgba([0, 128, 0, 255])));
        let surface = PreviewSurface::new(1, img);
        assert_eq!((surface.width(), surface.height()), (12, 16));

        let png = surface.to_png().expect("encode should succeed");
        assert_eq!(&png[1..4], b"PNG");
    }

    #[test]
    fn pdfium_renderer_rejects_bad_encoding_before_binding() {
        let renderer = PdfiumPreviewRenderer::default();
        let err = renderer.render("not a data url", 1, 120).unwrap_err();
        assert!(matches!(err, RenderError::BadEncoding(_)));
    }
}
