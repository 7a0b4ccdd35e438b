//! DOCX text extraction
//!
//! A .docx file is a ZIP archive whose main body lives in
//! `word/document.xml`. Paragraph text sits in `w:t` runs inside `w:p`
//! elements; tables are `w:tbl` > `w:tr` > `w:tc`. We stream the XML and
//! collect paragraph text with blank-line separation, then append table
//! content as pipe-delimited rows under a section marker.

use crate::error::{Error, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{Cursor, Read};
use tracing::debug;

/// Extracted DOCX content
#[derive(Debug, Clone)]
pub struct DocxExtraction {
    pub text: String,
    pub paragraph_count: u32,
    pub table_count: u32,
}

/// Extract text from DOCX bytes
pub fn extract_docx(bytes: &[u8]) -> Result<DocxExtraction> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| Error::Extract(format!("Not a DOCX archive: {}", e)))?;

    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| Error::Extract(format!("DOCX body missing: {}", e)))?
        .read_to_string(&mut xml)
        .map_err(|e| Error::Extract(format!("DOCX body unreadable: {}", e)))?;

    parse_document_xml(&xml)
}

fn parse_document_xml(xml: &str) -> Result<DocxExtraction> {
    let mut reader = Reader::from_str(xml);

    let mut paragraphs: Vec<String> = Vec::new();
    let mut table_rows: Vec<String> = Vec::new();
    let mut table_count: u32 = 0;

    let mut paragraph = String::new();
    let mut cell = String::new();
    let mut row_cells: Vec<String> = Vec::new();
    let mut table_depth: u32 = 0;
    let mut in_text_run = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"w:p" if table_depth == 0 => paragraph.clear(),
                b"w:tbl" => {
                    table_depth += 1;
                    if table_depth == 1 {
                        table_count += 1;
                    }
                }
                b"w:tr" if table_depth > 0 => row_cells.clear(),
                b"w:tc" if table_depth > 0 => cell.clear(),
                b"w:t" => in_text_run = true,
                _ => {}
            },
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"w:p" if table_depth == 0 => {
                    let trimmed = paragraph.trim();
                    if !trimmed.is_empty() {
                        paragraphs.push(trimmed.to_string());
                    }
                }
                b"w:tbl" => table_depth = table_depth.saturating_sub(1),
                b"w:tr" if table_depth > 0 => {
                    let row = row_cells.join(" | ");
                    if !row.trim().is_empty() {
                        table_rows.push(row);
                    }
                }
                b"w:tc" if table_depth > 0 => row_cells.push(cell.trim().to_string()),
                b"w:t" => in_text_run = false,
                _ => {}
            },
            Ok(Event::Text(t)) if in_text_run => {
                let content = t
                    .unescape()
                    .map_err(|e| Error::Extract(format!("DOCX text decode failed: {}", e)))?;
                if table_depth > 0 {
                    cell.push_str(&content);
                } else {
                    paragraph.push_str(&content);
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(Error::Extract(format!("DOCX XML parse failed: {}", e)));
            }
        }
    }

    debug!(
        "Extracted {} paragraphs and {} tables from DOCX",
        paragraphs.len(),
        table_count
    );

    let mut text = paragraphs.join("\n\n");
    if !table_rows.is_empty() {
        text.push_str("\n\n--- Tables ---\n");
        text.push_str(&table_rows.join("\n"));
    }

    Ok(DocxExtraction {
        text,
        paragraph_count: paragraphs.len() as u32,
        table_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn docx_with_body(body: &str) -> Vec<u8> {
        let xml = format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
             <w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">\
             <w:body>{}</w:body></w:document>",
            body
        );

        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("word/document.xml", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(xml.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_extract_paragraphs() {
        let bytes = docx_with_body(
            "<w:p><w:r><w:t>First paragraph.</w:t></w:r></w:p>\
             <w:p><w:r><w:t></w:t></w:r></w:p>\
             <w:p><w:r><w:t>Second </w:t></w:r><w:r><w:t>paragraph.</w:t></w:r></w:p>",
        );

        let result = extract_docx(&bytes).unwrap();
        assert_eq!(result.paragraph_count, 2);
        assert_eq!(result.table_count, 0);
        assert_eq!(result.text, "First paragraph.\n\nSecond paragraph.");
    }

    #[test]
    fn test_extract_table_rows() {
        let bytes = docx_with_body(
            "<w:p><w:r><w:t>Intro.</w:t></w:r></w:p>\
             <w:tbl><w:tr>\
             <w:tc><w:p><w:r><w:t>Name</w:t></w:r></w:p></w:tc>\
             <w:tc><w:p><w:r><w:t>Value</w:t></w:r></w:p></w:tc>\
             </w:tr><w:tr>\
             <w:tc><w:p><w:r><w:t>alpha</w:t></w:r></w:p></w:tc>\
             <w:tc><w:p><w:r><w:t>1</w:t></w:r></w:p></w:tc>\
             </w:tr></w:tbl>",
        );

        let result = extract_docx(&bytes).unwrap();
        assert_eq!(result.paragraph_count, 1);
        assert_eq!(result.table_count, 1);
        assert!(result.text.contains("--- Tables ---"));
        assert!(result.text.contains("Name | Value"));
        assert!(result.text.contains("alpha | 1"));
    }

    #[test]
    fn test_not_a_zip_fails() {
        let err = extract_docx(b"plain text pretending").unwrap_err();
        assert!(err.to_string().contains("Not a DOCX archive"));
    }

    #[test]
    fn test_zip_without_body_fails() {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("unrelated.txt", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"nothing").unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        let err = extract_docx(&bytes).unwrap_err();
        assert!(err.to_string().contains("DOCX body missing"));
    }
}
