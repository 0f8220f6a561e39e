// src/document/extract.rs
//! PDF text extraction.

use thiserror::Error;

/// The uploaded artifact could not be read as a PDF.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("document is empty")]
    Empty,
    #[error("failed to parse PDF: {0}")]
    Parse(String),
    #[error("PDF extraction aborted: {0}")]
    Aborted(String),
}

/// Extract page text from PDF bytes, joined in page order.
///
/// Blocking and CPU-bound; async callers should run it on a blocking thread.
pub fn extract_text(pdf_bytes: &[u8]) -> Result<String, ExtractionError> {
    if pdf_bytes.is_empty() {
        return Err(ExtractionError::Empty);
    }
    let pages = pdf_extract::extract_text_from_mem_by_pages(pdf_bytes)
        .map_err(|e| ExtractionError::Parse(e.to_string()))?;
    Ok(join_pages(pages))
}

/// Join per-page text with single spaces. Pages without any text (empty or
/// whitespace-only) are skipped rather than represented as empty entries.
pub fn join_pages<I, S>(pages: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = String::new();
    for page in pages {
        let page = page.as_ref();
        if page.trim().is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(page);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Single-page PDF with one line of Helvetica text (or no text at all).
    fn make_test_pdf(text: Option<&str>) -> Vec<u8> {
        use lopdf::dictionary;
        use lopdf::{Document, Object, Stream};

        let mut doc = Document::with_version("1.4");

        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });

        let content = match text {
            Some(t) => format!("BT /F1 12 Tf 72 700 Td ({t}) Tj ET"),
            None => String::new(),
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
            },
        });

        let pages_id = doc.add_object(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        });

        if let Ok(Object::Dictionary(dict)) = doc.get_object_mut(page_id) {
            dict.set("Parent", pages_id);
        }

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    #[test]
    fn join_skips_blank_pages() {
        let pages = vec!["Page one", "", "  \n ", "Page three"];
        assert_eq!(join_pages(pages), "Page one Page three");
    }

    #[test]
    fn join_of_no_text_is_empty() {
        assert_eq!(join_pages(Vec::<String>::new()), "");
        assert_eq!(join_pages(vec!["", "\n"]), "");
    }

    #[test]
    fn extracts_text_from_generated_pdf() {
        let bytes = make_test_pdf(Some("Heart Rate: 120"));
        let text = extract_text(&bytes).unwrap();
        assert!(
            text.contains("Heart") && text.contains("120"),
            "unexpected extraction: {text:?}"
        );
    }

    #[test]
    fn page_without_text_extracts_empty() {
        let bytes = make_test_pdf(None);
        let text = extract_text(&bytes).unwrap();
        assert_eq!(text, "");
    }

    #[test]
    fn invalid_bytes_fail() {
        assert!(matches!(
            extract_text(b"definitely not a pdf"),
            Err(ExtractionError::Parse(_))
        ));
        assert!(matches!(extract_text(b""), Err(ExtractionError::Empty)));
    }
}
