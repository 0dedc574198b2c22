//! PDF text extraction.
//!
//! Parses uploaded PDF bytes and extracts text page by page, in document
//! page order. Extraction quality is whatever the PDF's text operators
//! carry; image-only pages extract to empty text and are skipped upstream.

use crate::error::{AskPdfError, Result};
use lopdf::Document;

/// Extract per-page text from PDF bytes.
///
/// Returns one string per page in page order. A page without text
/// operators yields an empty string.
pub fn extract_pages(file: &str, bytes: &[u8]) -> Result<Vec<String>> {
    let doc = Document::load_mem(bytes).map_err(|e| AskPdfError::Pdf {
        file: file.to_string(),
        reason: e.to_string(),
    })?;

    let mut pages = Vec::new();
    for &number in doc.get_pages().keys() {
        let text = doc.extract_text(&[number]).map_err(|e| AskPdfError::Pdf {
            file: file.to_string(),
            reason: e.to_string(),
        })?;
        pages.push(text);
    }
    Ok(pages)
}

/// Build a minimal one-page PDF with the given text, for tests.
#[cfg(test)]
pub(crate) fn one_page_pdf(text: &str) -> Vec<u8> {
    pdf_with_pages(&[text])
}

/// Build a minimal PDF with one page per text, for tests.
#[cfg(test)]
pub(crate) fn pdf_with_pages(page_texts: &[&str]) -> Vec<u8> {
    use lopdf::content::{Content, Operation};
    use lopdf::{Object, Stream, dictionary};

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids = Vec::new();
    for text in page_texts {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![100.into(), 600.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("encode content"),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        });
        kids.push(page_id.into());
    }

    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => page_texts.len() as i64,
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("serialize pdf");
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_single_page_text() {
        let bytes = one_page_pdf("Hello from a test page");
        let pages = extract_pages("test.pdf", &bytes).unwrap();
        assert_eq!(pages.len(), 1);
        assert!(pages[0].contains("Hello from a test page"));
    }

    #[test]
    fn test_extracts_pages_in_order() {
        let bytes = pdf_with_pages(&["first page body", "second page body"]);
        let pages = extract_pages("two.pdf", &bytes).unwrap();
        assert_eq!(pages.len(), 2);
        assert!(pages[0].contains("first page body"));
        assert!(pages[1].contains("second page body"));
    }

    #[test]
    fn test_invalid_bytes_name_the_file() {
        let err = extract_pages("broken.pdf", b"not a pdf at all").unwrap_err();
        match err {
            AskPdfError::Pdf { file, .. } => assert_eq!(file, "broken.pdf"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
