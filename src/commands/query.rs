//! Query command implementation

use crate::config::Config;
use crate::error::Result;
use crate::meta::MetaDb;
use crate::progress::spinner;
use crate::store::{ProjectHit, SearchEngine};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Query options
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    /// Number of results to return
    pub k: Option<usize>,
    /// Minimum similarity score (0.0 - 1.0)
    pub min_similarity: Option<f32>,
}

/// Query result for CLI display
#[derive(Debug, Clone, Serialize)]
pub struct QueryResult {
    pub project: String,
    pub query: String,
    pub documents_indexed: usize,
    pub results: Vec<ProjectHit>,
}

/// Execute a search against one project.
///
/// The project's index is rebuilt from its full current document list on
/// every call — the document set may have changed since the last view,
/// and rebuilding is cheaper than tracking that.
pub async fn cmd_query(
    config: &Config,
    db: &MetaDb,
    engine: &mut SearchEngine,
    project_selector: &str,
    query: &str,
    options: QueryOptions,
) -> Result<QueryResult> {
    let project = db.resolve_project(project_selector).await?;
    let documents = db.get_project_documents(project.id).await?;

    info!(
        "Searching '{}' across {} document(s) in '{}'",
        query,
        documents.len(),
        project.name
    );

    engine.load_embedding_model()?;

    let bar = spinner("Building search index...");
    engine.build_project_index(&documents).await?;
    bar.finish_and_clear();

    // Keep the last built index on disk; status reports it and a future
    // session can inspect it without re-embedding
    if let Err(e) = engine.save() {
        warn!("Could not persist index: {}", e);
    }

    let k = options
        .k
        .unwrap_or(config.search.default_k)
        .min(config.search.max_results);
    let threshold = options.min_similarity.unwrap_or(config.search.min_score);

    let results = engine.search_project(query, k, threshold).await?;
    debug!("Query returned {} result(s)", results.len());

    Ok(QueryResult {
        project: project.name,
        query: query.to_string(),
        documents_indexed: documents.len(),
        results,
    })
}

/// Print query results to console
pub fn print_query_results(result: &QueryResult) {
    println!(
        "\n🔍 '{}' in project '{}' ({} document(s) indexed)\n",
        result.query, result.project, result.documents_indexed
    );

    if result.results.is_empty() {
        println!("No results. Try lowering --min-similarity or uploading more documents.");
        return;
    }

    for (i, hit) in result.results.iter().enumerate() {
        println!(
            "{}. {} — {}% match ({})",
            i + 1,
            hit.filename,
            hit.similarity_percent,
            hit.relevance
        );

        let preview: String = hit.document_text.chars().take(200).collect();
        let suffix = if hit.document_text.chars().count() > 200 {
            "..."
        } else {
            ""
        };
        println!("   {}{}\n", preview.replace('\n', " "), suffix);
    }
}
