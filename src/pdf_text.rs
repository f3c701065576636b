// src/pdf_text.rs

use std::fs;
use std::path::Path;

use lopdf::{Dictionary, Document};
use tracing::{info, warn};

/// Result of attempting to extract text from a PDF.
#[derive(Debug)]
pub enum PdfContent {
    /// The PDF contains extractable text.
    Text(String),
    /// The PDF appears to be scanned / image-only — needs OCR.
    ScannedImage,
    /// Something went wrong during extraction.
    Error(String),
}

/// Minimum number of non-whitespace characters we expect from a
/// "real" text PDF. Below this threshold we treat it as scanned.
const MIN_TEXT_CHARS: usize = 30;

/// Main entry point: takes raw PDF bytes and returns `PdfContent`.
pub fn extract_text_from_pdf(pdf_bytes: &[u8]) -> PdfContent {
    // --- Phase 1: structural check with lopdf ---
    let doc = match Document::load_mem(pdf_bytes) {
        Ok(d) => d,
        Err(e) => return PdfContent::Error(format!("Failed to parse PDF: {e}")),
    };

    if looks_like_scanned(&doc) {
        info!("PDF structural check: likely scanned / image-only");
        return PdfContent::ScannedImage;
    }

    // --- Phase 2: attempt full text extraction ---
    match pdf_extract::extract_text_from_mem(pdf_bytes) {
        Ok(text) => {
            let meaningful = text.chars().filter(|c| !c.is_whitespace()).count();
            if meaningful < MIN_TEXT_CHARS {
                info!(
                    chars = meaningful,
                    "Extracted text too short — treating as scanned"
                );
                PdfContent::ScannedImage
            } else {
                info!(chars = meaningful, "Text extracted successfully");
                PdfContent::Text(text)
            }
        }
        Err(e) => {
            warn!(error = %e, "pdf-extract failed — may be scanned or corrupted");
            PdfContent::ScannedImage
        }
    }
}

/// Heuristic: inspect the PDF object tree for signs that every page
/// is just a single image with no text operators.
///
/// A page whose `Resources` dictionary has XObject images but no Font
/// entries is almost certainly a scanned page.
fn looks_like_scanned(doc: &Document) -> bool {
    let pages = doc.get_pages();
    if pages.is_empty() {
        return false; // Can't tell — let text extraction try
    }

    let mut image_only_pages = 0;

    for object_id in pages.values() {
        let Ok(page_dict) = doc.get_object(*object_id).and_then(|o| o.as_dict()) else {
            continue;
        };

        let has_fonts = resources_entry_nonempty(doc, page_dict, b"Font");
        let has_images = resources_entry_nonempty(doc, page_dict, b"XObject");

        if has_images && !has_fonts {
            image_only_pages += 1;
        }
    }

    let total = pages.len();
    let ratio = image_only_pages as f64 / total as f64;
    info!(
        total_pages = total,
        image_only = image_only_pages,
        ratio = format!("{ratio:.2}"),
        "Scanned-page analysis"
    );

    // If ≥80% of pages are image-only, treat the whole PDF as scanned
    ratio >= 0.8
}

/// Whether the page's `Resources` dictionary carries a non-empty entry
/// (e.g. `Font`, `XObject`), following indirect references.
fn resources_entry_nonempty(doc: &Document, page_dict: &Dictionary, key: &[u8]) -> bool {
    page_dict
        .get(b"Resources")
        .ok()
        .and_then(|r| doc.dereference(r).ok())
        .and_then(|(_, resolved)| resolved.as_dict().ok())
        .and_then(|res| res.get(key).ok())
        .and_then(|entry| doc.dereference(entry).ok())
        .and_then(|(_, resolved)| resolved.as_dict().ok())
        .is_some_and(|dict| !dict.is_empty())
}

/// Load a document from disk and return its text.
///
/// PDFs go through text-layer extraction; anything else is read as UTF-8
/// text, the form OCR output arrives in. Scanned PDFs are an error here —
/// OCR is an external step, so the caller is told to run it first.
pub fn load_document(path: &Path) -> Result<String, Box<dyn std::error::Error>> {
    let is_pdf = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));

    if !is_pdf {
        info!(path = %path.display(), "Reading document as plain text");
        return Ok(fs::read_to_string(path)?);
    }

    info!(path = %path.display(), "Extracting text layer from PDF");
    let bytes = fs::read(path)?;
    match extract_text_from_pdf(&bytes) {
        PdfContent::Text(text) => Ok(text),
        PdfContent::ScannedImage => Err(format!(
            "{} is scanned/image-only — run OCR first and pass the text file",
            path.display()
        )
        .into()),
        PdfContent::Error(e) => Err(e.into()),
    }
}
