//! Default values for configuration

/// Default embedding model (BAAI/bge-small-en-v1.5)
pub fn default_embedding_model() -> String {
    "BAAI/bge-small-en-v1.5".to_string()
}

/// Default embedding dimension for bge-small-en-v1.5
pub fn default_embedding_dimension() -> usize {
    384
}

/// Default batch size for embedding
pub fn default_embedding_batch_size() -> usize {
    32
}

/// Default number of search results
pub fn default_search_k() -> usize {
    5
}

/// Default maximum search results
pub fn default_search_max_results() -> usize {
    20
}

/// Default minimum similarity score
pub fn default_search_min_score() -> f32 {
    0.25
}

/// Default maximum QA pairs generated per document
pub fn default_qa_max_pairs() -> usize {
    10
}

/// Default minimum answer length in characters
pub fn default_qa_min_answer_chars() -> usize {
    100
}

/// Default maximum answer length in characters
pub fn default_qa_max_answer_chars() -> usize {
    500
}
