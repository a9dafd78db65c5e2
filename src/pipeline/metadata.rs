//! Title extraction: parse the raw bytes locally and read the Info `Title`.
//!
//! This never touches the network and is independent of any upload. The
//! [`MetadataReader`] trait is the seam: the controller only needs "bytes in,
//! optional title out", so tests and alternative PDF parsers plug in.
//!
//! The default [`InfoDictReader`] reads the trailer `/Info` dictionary with
//! `lopdf`. A present `/Title` key is always a title, even `()` or a
//! non-string value: strings are decoded, anything else is rendered as its
//! PDF text.

use crate::document::TitleSource;
use crate::error::AskPdfError;
use lopdf::{Document as PdfDocument, Object};
use tracing::{debug, warn};

/// Reads the title field from a document's embedded metadata.
///
/// Implementations are called on the blocking pool and may block.
pub trait MetadataReader: Send + Sync {
    /// `Ok(Some(title))` when the field is present (its text verbatim, even if
    /// empty or odd-looking), `Ok(None)` when absent, `Err` when the bytes
    /// could not be opened at all.
    fn read_title(&self, bytes: &[u8]) -> Result<Option<String>, AskPdfError>;
}

/// [`MetadataReader`] over the trailer `/Info` dictionary.
#[derive(Debug, Clone, Copy, Default)]
pub struct InfoDictReader;

impl MetadataReader for InfoDictReader {
    fn read_title(&self, bytes: &[u8]) -> Result<Option<String>, AskPdfError> {
        let document = PdfDocument::load_mem(bytes).map_err(|e| AskPdfError::UnreadablePdf {
            detail: e.to_string(),
        })?;

        let Ok(info) = document.trailer.get(b"Info") else {
            debug!("No /Info dictionary");
            return Ok(None);
        };
        let Ok(info) = resolve(&document, info).as_dict() else {
            debug!("/Info is not a dictionary");
            return Ok(None);
        };
        let Ok(title) = info.get(b"Title") else {
            return Ok(None);
        };

        let title = object_text(&document, resolve(&document, title));
        debug!("Metadata title: {:?}", title);
        Ok(Some(title))
    }
}

/// Follow one indirect reference; a dangling one yields `null`.
fn resolve<'a>(document: &'a PdfDocument, object: &'a Object) -> &'a Object {
    match object {
        Object::Reference(id) => document.get_object(*id).unwrap_or(&Object::Null),
        other => other,
    }
}

/// Text of a metadata value as a viewer would show it.
fn object_text(document: &PdfDocument, object: &Object) -> String {
    match object {
        Object::String(bytes, _) => decode_text_string(bytes),
        Object::Name(name) => String::from_utf8_lossy(name).into_owned(),
        Object::Integer(i) => i.to_string(),
        Object::Real(r) => r.to_string(),
        Object::Boolean(b) => b.to_string(),
        Object::Null => "null".to_string(),
        Object::Reference((number, generation)) => format!("{number} {generation} R"),
        Object::Array(items) => {
            let parts: Vec<String> = items
                .iter()
                .map(|item| object_text(document, item))
                .collect();
            format!("[{}]", parts.join(" "))
        }
        other => format!("{other:?}"),
    }
}

/// PDF text strings are UTF-16BE with a BOM, or a single-byte encoding.
/// UTF-8 is accepted as well since many producers write it.
fn decode_text_string(bytes: &[u8]) -> String {
    if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = utf16
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => bytes.iter().map(|&b| char::from(b)).collect(),
    }
}

/// Apply the title policy: a present field wins verbatim, anything else
/// falls back.
pub fn resolve_title(
    read: Result<Option<String>, AskPdfError>,
    fallback: &str,
) -> (String, TitleSource) {
    match read {
        Ok(Some(title)) => (title, TitleSource::Metadata),
        Ok(None) => (fallback.to_string(), TitleSource::Fallback),
        Err(e) => {
            warn!("Metadata extraction failed, using fallback title: {}", e);
            (fallback.to_string(), TitleSource::Fallback)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    #[test]
    fn present_title_is_kept_verbatim() {
        let (t, source) = resolve_title(Ok(Some("  Annual Report ".into())), "Untitled PDF");
        assert_eq!(t, "  Annual Report ");
        assert_eq!(source, TitleSource::Metadata);
    }

    #[test]
    fn empty_title_is_still_a_title() {
        let (t, source) = resolve_title(Ok(Some(String::new())), "Untitled PDF");
        assert_eq!(t, "");
        assert_eq!(source, TitleSource::Metadata);
    }

    #[test]
    fn absent_title_falls_back() {
        let (t, source) = resolve_title(Ok(None), "Untitled PDF");
        assert_eq!(t, "Untitled PDF");
        assert_eq!(source, TitleSource::Fallback);
    }

    /// One-page PDF whose trailer carries `info` (if any) as `/Info`.
    fn pdf_with_info(info: Option<lopdf::Dictionary>) -> Vec<u8> {
        let mut doc = PdfDocument::with_version("1.5");
        let pages_id = doc.new_object_id();
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(612),
                Object::Integer(792),
            ],
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::Reference(page_id)],
                "Count" => Object::Integer(1),
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        if let Some(info) = info {
            let info_id = doc.add_object(info);
            doc.trailer.set("Info", info_id);
        }
        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    fn title_of(info: Option<lopdf::Dictionary>) -> Option<String> {
        InfoDictReader.read_title(&pdf_with_info(info)).unwrap()
    }

    #[test]
    fn reads_plain_title() {
        let info = dictionary! { "Title" => Object::string_literal("Quarterly Report") };
        assert_eq!(title_of(Some(info)).as_deref(), Some("Quarterly Report"));
    }

    #[test]
    fn reads_utf16_title() {
        let mut raw = vec![0xFE, 0xFF];
        for unit in "Café".encode_utf16() {
            raw.extend_from_slice(&unit.to_be_bytes());
        }
        let info = dictionary! { "Title" => Object::string_literal(raw) };
        assert_eq!(title_of(Some(info)).as_deref(), Some("Café"));
    }

    #[test]
    fn empty_title_string_is_present() {
        let info = dictionary! { "Title" => Object::string_literal("") };
        assert_eq!(title_of(Some(info)).as_deref(), Some(""));
    }

    #[test]
    fn non_string_title_is_rendered_as_text() {
        let info = dictionary! { "Title" => Object::Integer(5) };
        assert_eq!(title_of(Some(info)).as_deref(), Some("5"));
    }

    #[test]
    fn missing_title_key_is_absent() {
        let info = dictionary! { "Author" => Object::string_literal("Someone") };
        assert_eq!(title_of(Some(info)), None);
    }

    #[test]
    fn missing_info_dictionary_is_absent() {
        assert_eq!(title_of(None), None);
    }

    #[test]
    fn garbage_bytes_are_unreadable() {
        let err = InfoDictReader.read_title(b"not a pdf").unwrap_err();
        assert!(matches!(err, AskPdfError::UnreadablePdf { .. }));
    }

    #[test]
    fn failed_extraction_falls_back() {
        let err = AskPdfError::UnreadablePdf {
            detail: "no header".into(),
        };
        let (t, source) = resolve_title(Err(err), "Untitled PDF");
        assert_eq!(t, "Untitled PDF");
        assert_eq!(source, TitleSource::Fallback);
    }
}
