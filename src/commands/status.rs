//! Status command implementation

use crate::config::Config;
use crate::error::Result;
use crate::meta::{MetaDb, StoreStats};
use crate::store::{IndexInfo, SearchEngine};
use serde::Serialize;
use std::path::PathBuf;

/// System status for display
#[derive(Debug, Clone, Serialize)]
pub struct Status {
    pub config_file: PathBuf,
    pub db_file: PathBuf,
    pub store: StoreStats,
    pub index: IndexInfo,
}

/// Gather store counts and, when a saved index exists, its shape
pub async fn cmd_status(config: &Config, db: &MetaDb) -> Result<Status> {
    let store = db.stats().await?;

    // Loading the index needs no embedding model, so status stays cheap
    let mut engine = SearchEngine::new(&config.embedding, config.paths.index_file.clone());
    let _ = engine.load();
    let index = engine.index_info();

    Ok(Status {
        config_file: config.paths.config_file.clone(),
        db_file: config.paths.db_file.clone(),
        store,
        index,
    })
}

/// Print status to console
pub fn print_status(status: &Status) {
    println!("\ncurator status\n");
    println!("  Config: {}", status.config_file.display());
    println!("  Database: {}", status.db_file.display());
    println!("  Projects: {}", status.store.project_count);
    println!("  Documents: {}", status.store.document_count);
    println!("  QA pairs: {}", status.store.qa_count);
    println!("  Embedding model: {}", status.index.embedding_model);

    match status.index.status {
        "ready" => println!(
            "  Saved index: {} vector(s), dimension {} at {}",
            status.index.total_documents,
            status.index.dimension,
            status.index.index_path.display()
        ),
        _ => println!("  Saved index: none"),
    }
}
