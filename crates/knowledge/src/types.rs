//! Core types for retrieval and answering.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Metadata key every chunk must carry.
pub const SOURCE_KEY: &str = "source";

/// Number of chunks handed to the model.
pub const DEFAULT_K: usize = 10;

/// Size of the candidate pool re-ranked by MMR.
pub const DEFAULT_FETCH_K: usize = 100;

/// A passage of the corpus with its provenance.
///
/// The embedding lives in [`StoredChunk`]; nothing past the store sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub content: String,
    pub metadata: BTreeMap<String, String>,
}

impl DocumentChunk {
    /// Create a chunk with only a `source` entry.
    pub fn new(content: impl Into<String>, source: impl Into<String>) -> Self {
        let mut metadata = BTreeMap::new();
        metadata.insert(SOURCE_KEY.to_string(), source.into());
        Self {
            content: content.into(),
            metadata,
        }
    }

    /// Add a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Provenance identifier of this chunk.
    pub fn source(&self) -> Option<&str> {
        self.metadata.get(SOURCE_KEY).map(String::as_str)
    }
}

/// A chunk together with its embedding, as held by a vector store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredChunk {
    pub chunk: DocumentChunk,
    pub embedding: Vec<f32>,
}

impl StoredChunk {
    pub fn new(chunk: DocumentChunk, embedding: Vec<f32>) -> Self {
        Self { chunk, embedding }
    }
}

/// Similarity measure between query and chunk embeddings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    #[default]
    Cosine,
    L2,
    InnerProduct,
}

impl DistanceMetric {
    /// Score two vectors so that larger always means more relevant.
    ///
    /// L2 distance is negated. Vectors of different length score as
    /// unrelated.
    pub fn score(&self, a: &[f32], b: &[f32]) -> f32 {
        if a.len() != b.len() {
            return f32::NEG_INFINITY;
        }

        match self {
            DistanceMetric::Cosine => cosine_similarity(a, b),
            DistanceMetric::InnerProduct => dot(a, b),
            DistanceMetric::L2 => {
                let squared: f32 = a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum();
                -squared.sqrt()
            }
        }
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Cosine similarity; zero vectors score 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot(a, b) / (norm_a * norm_b)
}

/// Parameters of one similarity search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalQuery {
    pub query_text: String,
    /// Maximum number of chunks returned
    pub k: usize,
    /// Candidate pool size considered before diversification
    pub fetch_k: usize,
    pub distance_metric: DistanceMetric,
    /// Re-rank candidates with maximal marginal relevance
    pub diversify: bool,
}

impl RetrievalQuery {
    /// The fixed answering policy: cosine, 100 candidates, 10 results, MMR on.
    pub fn default_policy(query_text: impl Into<String>) -> Self {
        Self {
            query_text: query_text.into(),
            k: DEFAULT_K,
            fetch_k: DEFAULT_FETCH_K,
            distance_metric: DistanceMetric::Cosine,
            diversify: true,
        }
    }
}

/// Ordered retrieval result; at most `k` chunks, most relevant first.
pub type RetrievedSet = Vec<DocumentChunk>;
