//! Embedding/index engine
//!
//! Holds an embedding backend and a flat inner-product index over one
//! project's documents at a time. The engine moves through three states:
//! nothing loaded, embedding model loaded, index ready. Indexing is always
//! a full rebuild — on every search the caller hands over the project's
//! complete document list and the previous index is discarded. Per-project
//! document counts are small enough that re-embedding per view is cheaper
//! than keeping incremental state correct.

mod index;

pub use index::*;

use crate::config::EmbeddingConfig;
use crate::embed::{create_embedder, embed_in_batches, normalize_embedding, Embedder};
use crate::error::{Error, Result};
use crate::meta::Document;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Per-row metadata mapping an index row back to its source document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocRef {
    pub id: i64,
    pub source: String,
    #[serde(default)]
    pub file_type: String,
}

/// A raw engine-level search hit
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub document: String,
    pub meta: DocRef,
    pub score: f32,
    pub row_id: i64,
}

/// Presentational relevance bucket; never used for ranking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relevance {
    High,
    Medium,
    Low,
    Marginal,
}

impl Relevance {
    pub fn from_percent(percent: i32) -> Self {
        match percent {
            p if p >= 70 => Relevance::High,
            p if p >= 50 => Relevance::Medium,
            p if p >= 30 => Relevance::Low,
            _ => Relevance::Marginal,
        }
    }
}

impl std::fmt::Display for Relevance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Relevance::High => write!(f, "high"),
            Relevance::Medium => write!(f, "medium"),
            Relevance::Low => write!(f, "low"),
            Relevance::Marginal => write!(f, "marginal"),
        }
    }
}

/// A project-level search result as surfaced to callers
#[derive(Debug, Clone, Serialize)]
pub struct ProjectHit {
    pub document_text: String,
    pub filename: String,
    pub file_type: String,
    pub similarity_percent: i32,
    pub relevance: Relevance,
    pub score: f32,
}

/// Information about the current index state
#[derive(Debug, Clone, Serialize)]
pub struct IndexInfo {
    pub status: &'static str,
    pub total_documents: usize,
    pub dimension: usize,
    pub embedding_model: String,
    pub index_path: PathBuf,
}

/// Sidecar file stored next to the index binary
#[derive(Debug, Serialize, Deserialize)]
struct IndexSidecar {
    documents: Vec<String>,
    metadata: Vec<DocRef>,
    embedding_model: String,
}

/// Semantic search engine over a bounded working set of documents
pub struct SearchEngine {
    embedding_config: EmbeddingConfig,
    embedder: Option<Box<dyn Embedder>>,
    index: Option<FlatIndex>,
    documents: Vec<String>,
    metadata: Vec<DocRef>,
    index_path: PathBuf,
}

impl SearchEngine {
    /// Create an engine with no model loaded yet
    pub fn new(config: &EmbeddingConfig, index_path: PathBuf) -> Self {
        Self {
            embedding_config: config.clone(),
            embedder: None,
            index: None,
            documents: Vec::new(),
            metadata: Vec::new(),
            index_path,
        }
    }

    /// Create an engine around an existing embedding backend
    pub fn with_embedder(embedder: Box<dyn Embedder>, index_path: PathBuf) -> Self {
        let embedding_config = EmbeddingConfig {
            model: embedder.model_name().to_string(),
            dimension: embedder.dimension(),
            ..EmbeddingConfig::default()
        };

        Self {
            embedding_config,
            embedder: Some(embedder),
            index: None,
            documents: Vec::new(),
            metadata: Vec::new(),
            index_path,
        }
    }

    /// Load the configured embedding model. Idempotent; on failure the
    /// engine stays uninitialized and the cause is returned.
    pub fn load_embedding_model(&mut self) -> Result<()> {
        if self.embedder.is_some() {
            return Ok(());
        }

        info!("Loading embedding model: {}", self.embedding_config.model);
        let embedder = create_embedder(&self.embedding_config)?;
        self.embedder = Some(embedder);
        Ok(())
    }

    /// Name of the configured embedding model
    pub fn model_name(&self) -> &str {
        &self.embedding_config.model
    }

    /// Allocate a fresh empty index, discarding any held documents.
    /// Requires the embedding model; can change dimensionality.
    pub fn create_index(&mut self, dimension: usize) -> Result<()> {
        if self.embedder.is_none() {
            return Err(Error::NotInitialized("embedding model not loaded"));
        }

        self.index = Some(FlatIndex::new(dimension));
        self.documents.clear();
        self.metadata.clear();
        debug!("Created index with dimension {}", dimension);
        Ok(())
    }

    /// Embed and index a batch of texts.
    ///
    /// When `metadata` is omitted, per-row placeholders are synthesized.
    /// Row ids follow insertion order.
    pub async fn add_documents(
        &mut self,
        texts: Vec<String>,
        metadata: Option<Vec<DocRef>>,
    ) -> Result<()> {
        let embedder = self
            .embedder
            .as_deref()
            .ok_or(Error::NotInitialized("embedding model not loaded"))?;
        let index = self
            .index
            .as_mut()
            .ok_or(Error::NotInitialized("index not created"))?;

        let metadata = match metadata {
            Some(m) => {
                if m.len() != texts.len() {
                    return Err(Error::Index(format!(
                        "Metadata count {} does not match text count {}",
                        m.len(),
                        texts.len()
                    )));
                }
                m
            }
            None => (0..texts.len())
                .map(|i| DocRef {
                    id: i as i64,
                    source: "unknown".to_string(),
                    file_type: String::new(),
                })
                .collect(),
        };

        debug!("Adding {} documents to index", texts.len());

        let embeddings = embed_in_batches(
            embedder,
            texts.clone(),
            self.embedding_config.batch_size,
        )
        .await?;

        for embedding in &embeddings {
            index.add(&normalize_embedding(embedding))?;
        }

        self.documents.extend(texts);
        self.metadata.extend(metadata);

        debug!("Index now holds {} documents", self.documents.len());
        Ok(())
    }

    /// Search the current index.
    ///
    /// Results are ordered by similarity descending and filtered to
    /// `score >= threshold`. An empty index returns immediately without
    /// touching the embedding model.
    pub async fn search(&self, query: &str, k: usize, threshold: f32) -> Result<Vec<SearchHit>> {
        let embedder = self
            .embedder
            .as_deref()
            .ok_or(Error::NotInitialized("embedding model not loaded"))?;
        let index = self
            .index
            .as_ref()
            .ok_or(Error::NotInitialized("index not created"))?;

        if index.is_empty() {
            return Ok(Vec::new());
        }

        let mut embeddings = embedder.embed(vec![query.to_string()]).await?;
        let query_vector = normalize_embedding(
            &embeddings
                .pop()
                .ok_or_else(|| Error::Embedding("No embedding returned".to_string()))?,
        );

        let raw = index.search(&query_vector, k.min(index.len()))?;

        let results: Vec<SearchHit> = raw
            .into_iter()
            .filter(|(score, row)| *row >= 0 && *score >= threshold)
            .map(|(score, row)| SearchHit {
                document: self.documents[row as usize].clone(),
                meta: self.metadata[row as usize].clone(),
                score,
                row_id: row,
            })
            .collect();

        debug!("Found {} results for query '{}'", results.len(), query);
        Ok(results)
    }

    /// Persist the index and its document/metadata sidecar
    pub fn save(&self) -> Result<()> {
        let index = self
            .index
            .as_ref()
            .ok_or(Error::NotInitialized("index not created"))?;

        index.save(&self.index_path)?;

        let sidecar = IndexSidecar {
            documents: self.documents.clone(),
            metadata: self.metadata.clone(),
            embedding_model: self.embedding_config.model.clone(),
        };
        std::fs::write(
            self.sidecar_path(),
            serde_json::to_string_pretty(&sidecar)?,
        )?;

        info!("Index saved to {:?}", self.index_path);
        Ok(())
    }

    /// Load a previously saved index and sidecar.
    ///
    /// A differing embedding model is a warning, not an error — the
    /// stored vectors may be incompatible, and that risk belongs to the
    /// caller who changed the configuration.
    pub fn load(&mut self) -> Result<()> {
        let sidecar_path = self.sidecar_path();
        if !self.index_path.exists() || !sidecar_path.exists() {
            return Err(Error::Index(format!(
                "Index files not found at {}",
                self.index_path.display()
            )));
        }

        let index = FlatIndex::load(&self.index_path)?;
        let sidecar: IndexSidecar =
            serde_json::from_str(&std::fs::read_to_string(&sidecar_path)?)?;

        if sidecar.embedding_model != self.embedding_config.model {
            warn!(
                "Index was created with model '{}', but current model is '{}'",
                sidecar.embedding_model, self.embedding_config.model
            );
        }

        if index.len() != sidecar.documents.len() || index.len() != sidecar.metadata.len() {
            return Err(Error::Index(format!(
                "Index holds {} vectors but sidecar lists {} documents",
                index.len(),
                sidecar.documents.len()
            )));
        }

        self.index = Some(index);
        self.documents = sidecar.documents;
        self.metadata = sidecar.metadata;

        info!("Index loaded from {:?}", self.index_path);
        Ok(())
    }

    /// Drop all documents, keeping the current dimensionality
    pub fn clear(&mut self) -> Result<()> {
        let index = self
            .index
            .as_mut()
            .ok_or(Error::NotInitialized("index not created"))?;

        *index = FlatIndex::new(index.dimension());
        self.documents.clear();
        self.metadata.clear();
        debug!("Index cleared");
        Ok(())
    }

    /// Current index state for status reporting
    pub fn index_info(&self) -> IndexInfo {
        match &self.index {
            Some(index) => IndexInfo {
                status: "ready",
                total_documents: index.len(),
                dimension: index.dimension(),
                embedding_model: self.embedding_config.model.clone(),
                index_path: self.index_path.clone(),
            },
            None => IndexInfo {
                status: "not_loaded",
                total_documents: 0,
                dimension: 0,
                embedding_model: self.embedding_config.model.clone(),
                index_path: self.index_path.clone(),
            },
        }
    }

    /// Rebuild the index from a project's complete document list.
    ///
    /// Called on every project view; deliberately unconditional, with no
    /// diffing against the previous document set.
    pub async fn build_project_index(&mut self, documents: &[Document]) -> Result<()> {
        let dimension = self
            .embedder
            .as_deref()
            .ok_or(Error::NotInitialized("embedding model not loaded"))?
            .dimension();

        self.create_index(dimension)?;

        if documents.is_empty() {
            return Ok(());
        }

        let texts: Vec<String> = documents.iter().map(|d| d.content.clone()).collect();
        let refs: Vec<DocRef> = documents
            .iter()
            .map(|d| DocRef {
                id: d.id,
                source: d.original_filename.clone(),
                file_type: d.file_type.clone(),
            })
            .collect();

        self.add_documents(texts, Some(refs)).await
    }

    /// Search the project index, mapping raw scores to percentages and
    /// presentational relevance buckets
    pub async fn search_project(
        &self,
        query: &str,
        k: usize,
        threshold: f32,
    ) -> Result<Vec<ProjectHit>> {
        let hits = self.search(query, k, threshold).await?;

        Ok(hits
            .into_iter()
            .map(|hit| {
                let similarity_percent = (hit.score * 100.0).round() as i32;
                ProjectHit {
                    document_text: hit.document,
                    filename: hit.meta.source,
                    file_type: hit.meta.file_type,
                    similarity_percent,
                    relevance: Relevance::from_percent(similarity_percent),
                    score: hit.score,
                }
            })
            .collect())
    }

    fn sidecar_path(&self) -> PathBuf {
        self.index_path.with_extension("meta.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;

    const DIM: usize = 64;

    /// Deterministic bag-of-words embedder: each word hashes to a bucket.
    /// Good enough to make lexical overlap show up as cosine similarity.
    struct HashEmbedder {
        name: String,
        calls: Arc<AtomicUsize>,
    }

    impl HashEmbedder {
        fn new(name: &str) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    name: name.to_string(),
                    calls: calls.clone(),
                },
                calls,
            )
        }

        fn embed_one(text: &str) -> Vec<f32> {
            let mut vector = vec![0.0f32; DIM];
            for word in text
                .to_lowercase()
                .split(|c: char| !c.is_alphanumeric())
                .filter(|w| !w.is_empty())
            {
                let mut hasher = DefaultHasher::new();
                word.hash(&mut hasher);
                vector[(hasher.finish() % DIM as u64) as usize] += 1.0;
            }
            vector
        }
    }

    #[async_trait]
    impl Embedder for HashEmbedder {
        async fn embed(&self, texts: Vec<String>) -> crate::error::Result<Vec<Vec<f32>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(texts.iter().map(|t| Self::embed_one(t)).collect())
        }

        fn dimension(&self) -> usize {
            DIM
        }

        fn model_name(&self) -> &str {
            &self.name
        }
    }

    fn engine_in(tmp: &TempDir) -> (SearchEngine, Arc<AtomicUsize>) {
        let (embedder, calls) = HashEmbedder::new("hash-test");
        (
            SearchEngine::with_embedder(Box::new(embedder), tmp.path().join("index.bin")),
            calls,
        )
    }

    #[tokio::test]
    async fn test_self_match_ranks_first() {
        let tmp = TempDir::new().unwrap();
        let (mut engine, _) = engine_in(&tmp);

        engine.create_index(DIM).unwrap();
        engine
            .add_documents(
                vec![
                    "deep work requires eliminating distractions".to_string(),
                    "completely unrelated gardening advice".to_string(),
                ],
                None,
            )
            .await
            .unwrap();

        let hits = engine
            .search("deep work requires eliminating distractions", 1, 0.0)
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].row_id, 0);
        assert!(hits[0].score > 0.99, "self-match score {}", hits[0].score);
    }

    #[tokio::test]
    async fn test_empty_index_skips_embedding() {
        let tmp = TempDir::new().unwrap();
        let (mut engine, calls) = engine_in(&tmp);

        engine.create_index(DIM).unwrap();
        let hits = engine.search("anything", 5, 0.0).await.unwrap();

        assert!(hits.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_threshold_always_respected() {
        let tmp = TempDir::new().unwrap();
        let (mut engine, _) = engine_in(&tmp);

        engine.create_index(DIM).unwrap();
        engine
            .add_documents(
                vec![
                    "rust is a systems programming language".to_string(),
                    "cooking pasta requires boiling water".to_string(),
                    "programming languages and their type systems".to_string(),
                ],
                None,
            )
            .await
            .unwrap();

        for threshold in [0.0, 0.2, 0.5, 0.9, 1.0] {
            let hits = engine
                .search("systems programming", 3, threshold)
                .await
                .unwrap();
            assert!(
                hits.iter().all(|h| h.score >= threshold),
                "threshold {} violated",
                threshold
            );
        }
    }

    #[tokio::test]
    async fn test_rebuild_is_deterministic() {
        let tmp = TempDir::new().unwrap();
        let (mut engine, _) = engine_in(&tmp);

        let docs = vec![
            "alpha beta gamma delta epsilon words".to_string(),
            "beta gamma delta other tokens here".to_string(),
            "unrelated content about something else".to_string(),
        ];

        let mut orders = Vec::new();
        for _ in 0..2 {
            engine.create_index(DIM).unwrap();
            engine.add_documents(docs.clone(), None).await.unwrap();
            let hits = engine.search("beta gamma delta", 3, 0.0).await.unwrap();
            orders.push(hits.iter().map(|h| h.row_id).collect::<Vec<_>>());
        }

        assert_eq!(orders[0], orders[1]);
    }

    #[tokio::test]
    async fn test_precondition_errors() {
        let tmp = TempDir::new().unwrap();
        let config = EmbeddingConfig::default();

        // No model loaded yet
        let mut engine = SearchEngine::new(&config, tmp.path().join("index.bin"));
        assert!(matches!(
            engine.create_index(DIM).unwrap_err(),
            Error::NotInitialized(_)
        ));

        // Model present, index missing
        let (mut engine, _) = engine_in(&tmp);
        assert!(matches!(
            engine
                .add_documents(vec!["text".to_string()], None)
                .await
                .unwrap_err(),
            Error::NotInitialized(_)
        ));
        assert!(matches!(
            engine.search("query", 1, 0.0).await.unwrap_err(),
            Error::NotInitialized(_)
        ));
        assert!(matches!(
            engine.clear().unwrap_err(),
            Error::NotInitialized(_)
        ));
    }

    #[tokio::test]
    async fn test_synthesized_metadata() {
        let tmp = TempDir::new().unwrap();
        let (mut engine, _) = engine_in(&tmp);

        engine.create_index(DIM).unwrap();
        engine
            .add_documents(vec!["some document text goes here".to_string()], None)
            .await
            .unwrap();

        let hits = engine
            .search("some document text goes here", 1, 0.0)
            .await
            .unwrap();
        assert_eq!(hits[0].meta.id, 0);
        assert_eq!(hits[0].meta.source, "unknown");
    }

    #[tokio::test]
    async fn test_metadata_count_mismatch_rejected() {
        let tmp = TempDir::new().unwrap();
        let (mut engine, _) = engine_in(&tmp);

        engine.create_index(DIM).unwrap();
        let err = engine
            .add_documents(
                vec!["one".to_string(), "two".to_string()],
                Some(vec![DocRef {
                    id: 1,
                    source: "only-one.txt".to_string(),
                    file_type: "txt".to_string(),
                }]),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Index(_)));
    }

    #[tokio::test]
    async fn test_save_load_round_trip() {
        let tmp = TempDir::new().unwrap();
        let (mut engine, _) = engine_in(&tmp);

        engine.create_index(DIM).unwrap();
        engine
            .add_documents(
                vec![
                    "persistent document about databases".to_string(),
                    "another note on caching strategies".to_string(),
                ],
                None,
            )
            .await
            .unwrap();
        engine.save().unwrap();

        let (mut restored, _) = engine_in(&tmp);
        restored.load().unwrap();

        let info = restored.index_info();
        assert_eq!(info.status, "ready");
        assert_eq!(info.total_documents, 2);

        let hits = restored
            .search("persistent document about databases", 1, 0.0)
            .await
            .unwrap();
        assert_eq!(hits[0].row_id, 0);
    }

    #[tokio::test]
    async fn test_load_with_different_model_warns_but_succeeds() {
        let tmp = TempDir::new().unwrap();
        let (mut engine, _) = engine_in(&tmp);

        engine.create_index(DIM).unwrap();
        engine
            .add_documents(vec!["document text for the index".to_string()], None)
            .await
            .unwrap();
        engine.save().unwrap();

        let (other_embedder, _) = HashEmbedder::new("hash-other");
        let mut restored =
            SearchEngine::with_embedder(Box::new(other_embedder), tmp.path().join("index.bin"));
        restored.load().unwrap();
        assert_eq!(restored.index_info().total_documents, 1);
    }

    #[tokio::test]
    async fn test_load_missing_files_fails() {
        let tmp = TempDir::new().unwrap();
        let (mut engine, _) = engine_in(&tmp);
        assert!(matches!(engine.load().unwrap_err(), Error::Index(_)));
    }

    #[tokio::test]
    async fn test_clear_keeps_dimension() {
        let tmp = TempDir::new().unwrap();
        let (mut engine, _) = engine_in(&tmp);

        engine.create_index(DIM).unwrap();
        engine
            .add_documents(vec!["document text to be dropped".to_string()], None)
            .await
            .unwrap();

        engine.clear().unwrap();

        let info = engine.index_info();
        assert_eq!(info.total_documents, 0);
        assert_eq!(info.dimension, DIM);
        assert!(engine.search("anything", 5, 0.0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_k_capped_at_index_size() {
        let tmp = TempDir::new().unwrap();
        let (mut engine, _) = engine_in(&tmp);

        engine.create_index(DIM).unwrap();
        engine
            .add_documents(
                vec![
                    "first document about topics".to_string(),
                    "second document about topics".to_string(),
                ],
                None,
            )
            .await
            .unwrap();

        let hits = engine.search("document about topics", 10, 0.0).await.unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn test_relevance_buckets() {
        assert_eq!(Relevance::from_percent(85), Relevance::High);
        assert_eq!(Relevance::from_percent(70), Relevance::High);
        assert_eq!(Relevance::from_percent(69), Relevance::Medium);
        assert_eq!(Relevance::from_percent(50), Relevance::Medium);
        assert_eq!(Relevance::from_percent(35), Relevance::Low);
        assert_eq!(Relevance::from_percent(10), Relevance::Marginal);
    }
}
