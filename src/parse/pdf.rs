//! PDF text extraction

use crate::error::{Error, Result};
use tracing::{debug, warn};

/// Extracted PDF content
#[derive(Debug, Clone)]
pub struct PdfExtraction {
    pub text: String,
    pub page_count: u32,
    pub extractor: &'static str,
}

/// Extract text from PDF bytes.
///
/// The per-page path is preferred because it yields a reliable page count
/// and page markers in the text. If it fails, the whole-document path is
/// tried; if both fail the error propagates to the caller, which is
/// expected to catch it per file during batch ingest.
pub fn extract_pdf(bytes: &[u8]) -> Result<PdfExtraction> {
    match extract_by_pages(bytes) {
        Ok(extracted) => Ok(extracted),
        Err(page_err) => {
            warn!("Per-page PDF extraction failed, retrying whole-document: {}", page_err);
            extract_whole(bytes).map_err(|whole_err| {
                Error::Extract(format!(
                    "PDF extraction failed (per-page: {}; whole-document: {})",
                    page_err, whole_err
                ))
            })
        }
    }
}

fn extract_by_pages(bytes: &[u8]) -> Result<PdfExtraction> {
    let pages = pdf_extract::extract_text_from_mem_by_pages(bytes)
        .map_err(|e| Error::Extract(e.to_string()))?;

    let page_count = pages.len() as u32;
    debug!("Extracted {} PDF pages", page_count);

    let parts: Vec<String> = pages
        .iter()
        .enumerate()
        .filter(|(_, page)| !page.trim().is_empty())
        .map(|(i, page)| format!("--- Page {} ---\n{}", i + 1, page.trim()))
        .collect();

    Ok(PdfExtraction {
        text: parts.join("\n\n"),
        page_count,
        extractor: "pdf-extract/pages",
    })
}

fn extract_whole(bytes: &[u8]) -> Result<PdfExtraction> {
    let text = pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| Error::Extract(e.to_string()))?;

    // Whole-document output marks page breaks with form feeds
    let page_count = text.matches('\u{c}').count() as u32 + 1;

    Ok(PdfExtraction {
        text: text.trim().to_string(),
        page_count,
        extractor: "pdf-extract/whole",
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // A minimal single-page PDF with one text object ("Hello PDF")
    fn minimal_pdf() -> Vec<u8> {
        let mut pdf = Vec::new();
        pdf.extend_from_slice(b"%PDF-1.4\n");

        let mut offsets = Vec::new();
        let objects: Vec<String> = vec![
            "1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n".to_string(),
            "2 0 obj\n<< /Type /Pages /Kids [3 0 R] /Count 1 >>\nendobj\n".to_string(),
            "3 0 obj\n<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
             /Contents 4 0 R /Resources << /Font << /F1 5 0 R >> >> >>\nendobj\n"
                .to_string(),
            {
                let stream = "BT /F1 12 Tf 72 720 Td (Hello PDF) Tj ET";
                format!(
                    "4 0 obj\n<< /Length {} >>\nstream\n{}\nendstream\nendobj\n",
                    stream.len(),
                    stream
                )
            },
            "5 0 obj\n<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>\nendobj\n"
                .to_string(),
        ];

        for obj in &objects {
            offsets.push(pdf.len());
            pdf.extend_from_slice(obj.as_bytes());
        }

        let xref_pos = pdf.len();
        pdf.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
        pdf.extend_from_slice(b"0000000000 65535 f \n");
        for offset in &offsets {
            pdf.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
        }
        pdf.extend_from_slice(
            format!(
                "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
                objects.len() + 1,
                xref_pos
            )
            .as_bytes(),
        );

        pdf
    }

    #[test]
    fn test_extract_minimal_pdf() {
        let result = extract_pdf(&minimal_pdf()).unwrap();
        assert_eq!(result.page_count, 1);
        assert!(result.text.contains("Hello"));
        assert!(result.text.contains("--- Page 1 ---"));
    }

    #[test]
    fn test_extract_garbage_fails_loud() {
        let err = extract_pdf(b"definitely not a pdf").unwrap_err();
        assert!(err.to_string().contains("PDF extraction failed"));
    }
}
