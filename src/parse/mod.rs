//! Document text extraction
//!
//! This module converts uploaded file bytes into plain text plus typed
//! metadata. Dispatch is on the filename extension; PDF, DOCX and TXT are
//! supported. Unsupported extensions are a soft failure (no text, a note in
//! the metadata), while a corrupt file of a supported type is a hard error
//! the caller must handle per file.

mod docx;
mod pdf;
mod text;

pub use docx::*;
pub use pdf::*;
pub use text::*;

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::warn;

/// File types we can extract text from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Pdf,
    Docx,
    PlainText,
    Unsupported,
}

impl FileType {
    /// Detect file type from a filename's extension
    pub fn from_name(filename: &str) -> Self {
        match Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .as_deref()
        {
            Some("pdf") => FileType::Pdf,
            Some("docx") | Some("doc") => FileType::Docx,
            Some("txt") => FileType::PlainText,
            _ => FileType::Unsupported,
        }
    }
}

/// Lowercased extension of a filename, without the dot
pub fn file_extension(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default()
}

/// Typed metadata recorded for an extracted document.
///
/// Known fields are explicit; anything format-specific beyond them goes
/// into the open `extra` map.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentMeta {
    pub filename: String,
    pub file_type: String,
    pub file_size: u64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_count: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub paragraph_count: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_count: Option<u32>,

    /// Which extraction path produced the text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extractor: Option<String>,

    /// Open-ended extension data
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

/// Result of extracting a single file
#[derive(Debug, Clone)]
pub struct Extraction {
    /// Extracted plain text; `None` for unsupported file types
    pub text: Option<String>,

    pub meta: DocumentMeta,
}

/// Extract plain text and metadata from file bytes.
///
/// Pure over the provided bytes; never touches the filesystem. Unsupported
/// extensions return `Ok` with `text: None`; extraction failures on
/// supported types return `Err`.
pub fn extract(bytes: &[u8], filename: &str) -> Result<Extraction> {
    let mut meta = DocumentMeta {
        filename: filename.to_string(),
        file_type: file_extension(filename),
        file_size: bytes.len() as u64,
        ..Default::default()
    };

    match FileType::from_name(filename) {
        FileType::Pdf => {
            let extracted = extract_pdf(bytes)?;
            meta.page_count = Some(extracted.page_count);
            meta.extractor = Some(extracted.extractor.to_string());
            Ok(Extraction {
                text: Some(extracted.text),
                meta,
            })
        }
        FileType::Docx => {
            let extracted = extract_docx(bytes)?;
            meta.paragraph_count = Some(extracted.paragraph_count);
            meta.table_count = Some(extracted.table_count);
            meta.extractor = Some("docx-xml".to_string());
            Ok(Extraction {
                text: Some(extracted.text),
                meta,
            })
        }
        FileType::PlainText => {
            let decoded = decode_text(bytes);
            meta.extractor = Some(decoded.encoding.to_string());
            Ok(Extraction {
                text: Some(decoded.text),
                meta,
            })
        }
        FileType::Unsupported => {
            warn!("Unsupported file format: {}", filename);
            meta.extra
                .insert("unsupported".to_string(), "true".to_string());
            Ok(Extraction { text: None, meta })
        }
    }
}
