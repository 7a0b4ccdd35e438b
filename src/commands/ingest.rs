//! Ingest command implementation
//!
//! The upload surface: extracts text from each file, stores it under the
//! target project, and derives suggested questions. One bad file never
//! aborts the batch — failures are counted and reported per file.

use crate::config::Config;
use crate::error::Result;
use crate::meta::{MetaDb, NewDocument};
use crate::parse::{extract, FileType};
use crate::progress::file_bar;
use crate::qa::QaGenerator;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;
use walkdir::WalkDir;

/// Outcome of a batch ingest
#[derive(Debug, Clone, Serialize)]
pub struct IngestStats {
    pub project: String,
    pub succeeded: usize,
    pub failed: usize,
    pub qa_pairs_created: usize,
    pub errors: Vec<IngestFailure>,
}

/// A single file that could not be ingested
#[derive(Debug, Clone, Serialize)]
pub struct IngestFailure {
    pub file: String,
    pub reason: String,
}

/// Ingest files (or directories of files) into a project
pub async fn cmd_ingest(
    config: &Config,
    db: &MetaDb,
    project_selector: &str,
    paths: &[PathBuf],
) -> Result<IngestStats> {
    let project = db.resolve_project(project_selector).await?;
    let files = collect_files(paths)?;

    info!(
        "Ingesting {} file(s) into project '{}'",
        files.len(),
        project.name
    );

    let qa_generator = QaGenerator::from_config(&config.qa);
    let bar = file_bar(files.len() as u64);

    let mut stats = IngestStats {
        project: project.name.clone(),
        succeeded: 0,
        failed: 0,
        qa_pairs_created: 0,
        errors: Vec::new(),
    };

    for file in &files {
        let name = file
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("<unnamed>")
            .to_string();
        bar.set_message(name.clone());

        match ingest_one(config, db, &qa_generator, project.id, file, &name).await {
            Ok(qa_count) => {
                stats.succeeded += 1;
                stats.qa_pairs_created += qa_count;
            }
            Err(e) => {
                warn!("Failed to ingest {}: {}", file.display(), e);
                stats.failed += 1;
                stats.errors.push(IngestFailure {
                    file: file.display().to_string(),
                    reason: e.to_string(),
                });
            }
        }

        bar.inc(1);
    }

    bar.finish_and_clear();
    Ok(stats)
}

/// Ingest a single file; returns the number of QA pairs stored
async fn ingest_one(
    config: &Config,
    db: &MetaDb,
    qa_generator: &QaGenerator,
    project_id: i64,
    path: &Path,
    name: &str,
) -> Result<usize> {
    let bytes = std::fs::read(path)?;
    let extraction = extract(&bytes, name)?;

    let text = match extraction.text {
        Some(t) if !t.trim().is_empty() => t,
        Some(_) => {
            return Err(crate::error::Error::Extract(
                "No text extracted".to_string(),
            ))
        }
        None => {
            return Err(crate::error::Error::Extract(format!(
                "Unsupported file type '{}'",
                extraction.meta.file_type
            )))
        }
    };

    let doc = NewDocument {
        project_id,
        filename: format!("doc-{}-{}", project_id, Uuid::new_v4().simple()),
        original_filename: name.to_string(),
        file_type: extraction.meta.file_type.clone(),
        file_size: bytes.len() as i64,
        page_count: extraction.meta.page_count.unwrap_or(0) as i64,
        content: text,
        meta: extraction.meta,
    };

    let doc_id = db.save_document(&doc).await?;

    let pairs = qa_generator.generate(&doc.content, name, config.qa.max_pairs);
    db.save_document_qa_pairs(doc_id, &pairs).await?;

    debug!(
        "Ingested '{}' as document {} with {} QA pairs",
        name,
        doc_id,
        pairs.len()
    );
    Ok(pairs.len())
}

/// Expand the given paths into a flat file list. Directories are walked
/// and filtered to supported extensions; explicitly named files are kept
/// as-is so an unsupported one surfaces as a per-file failure.
fn collect_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_dir() {
            for entry in WalkDir::new(path)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
            {
                let name = entry.file_name().to_string_lossy();
                if FileType::from_name(&name) != FileType::Unsupported {
                    files.push(entry.into_path());
                }
            }
        } else {
            files.push(path.clone());
        }
    }

    files.sort();
    Ok(files)
}

/// Print an ingest report to console
pub fn print_ingest_stats(stats: &IngestStats) {
    println!("\n✓ Ingest into '{}' complete", stats.project);
    println!("  Succeeded: {}", stats.succeeded);
    println!("  Failed: {}", stats.failed);
    println!("  QA pairs created: {}", stats.qa_pairs_created);

    for failure in &stats.errors {
        println!("  ✗ {}: {}", failure.file, failure.reason);
    }
}
