use crate::embeddings::{cosine_similarity, CharacterNgramEmbedder, Embedder};
use crate::error::RetrieverError;
use crate::models::Document;
use crate::traits::VectorRetriever;
use async_trait::async_trait;

/// In-process vector index over documents loaded at startup.
pub struct MemoryVectorIndex {
    documents: Vec<Document>,
    embeddings: Vec<Vec<f32>>,
    embedder: CharacterNgramEmbedder,
    top_k: usize,
}

impl MemoryVectorIndex {
    pub fn new(documents: Vec<Document>, top_k: usize) -> Self {
        Self::with_embedder(documents, top_k, CharacterNgramEmbedder::default())
    }

    pub fn with_embedder(
        documents: Vec<Document>,
        top_k: usize,
        embedder: CharacterNgramEmbedder,
    ) -> Self {
        let embeddings = documents
            .iter()
            .map(|document| embedder.embed(&document.text))
            .collect();

        Self {
            documents,
            embeddings,
            embedder,
            top_k,
        }
    }
}

#[async_trait]
impl VectorRetriever for MemoryVectorIndex {
    async fn retrieve(&self, query: &str) -> Result<Vec<Document>, RetrieverError> {
        if query.trim().is_empty() {
            return Err(RetrieverError::Request("query is empty".to_string()));
        }

        let query_vector = self.embedder.embed(query);
        let mut scored: Vec<(usize, f32)> = self
            .embeddings
            .iter()
            .enumerate()
            .map(|(position, embedding)| (position, cosine_similarity(&query_vector, embedding)))
            .filter(|(_, score)| *score > 0.0)
            .collect();

        // Stable sort keeps load order among equal scores.
        scored.sort_by(|left, right| right.1.total_cmp(&left.1));

        Ok(scored
            .into_iter()
            .take(self.top_k)
            .map(|(position, _)| self.documents[position].clone())
            .collect())
    }
}
