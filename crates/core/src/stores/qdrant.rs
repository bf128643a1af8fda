use crate::embeddings::{CharacterNgramEmbedder, Embedder};
use crate::error::RetrieverError;
use crate::models::{Document, DocumentMetadata};
use crate::traits::VectorRetriever;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use url::Url;

pub struct QdrantRetriever {
    endpoint: Url,
    collection: String,
    client: Client,
    embedder: CharacterNgramEmbedder,
    top_k: usize,
}

impl QdrantRetriever {
    pub fn new(
        endpoint: &str,
        collection: impl Into<String>,
        top_k: usize,
    ) -> Result<Self, RetrieverError> {
        Ok(Self {
            endpoint: Url::parse(endpoint)?,
            collection: collection.into(),
            client: Client::new(),
            embedder: CharacterNgramEmbedder::default(),
            top_k,
        })
    }

    fn collection_url(&self, suffix: &str) -> Result<Url, RetrieverError> {
        let path = format!("collections/{}{}", self.collection, suffix);
        Ok(self.endpoint.join(&path)?)
    }

    fn collection_schema(&self) -> Value {
        json!({
            "vectors": {
                "size": self.embedder.dimensions(),
                "distance": "Cosine",
            }
        })
    }

    /// Creates the collection unless it already exists.
    pub async fn ensure_collection(&self) -> Result<(), RetrieverError> {
        let response = self
            .client
            .put(self.collection_url("")?)
            .json(&self.collection_schema())
            .send()
            .await?;

        let status = response.status();
        if status.is_success() || status == StatusCode::CONFLICT {
            return Ok(());
        }

        let details = response.text().await.unwrap_or_default();
        if details.contains("already exists") {
            return Ok(());
        }

        Err(RetrieverError::BackendResponse {
            backend: "qdrant".to_string(),
            details: format!("{status}: {details}"),
        })
    }

    /// Upserts every document as a point keyed by document id and row, so
    /// re-indexing overwrites the same points.
    pub async fn index_documents(&self, documents: &[Document]) -> Result<(), RetrieverError> {
        if documents.is_empty() {
            return Ok(());
        }

        self.ensure_collection().await?;

        let points = documents
            .iter()
            .map(|document| {
                json!({
                    "id": point_id(document),
                    "vector": self.embedder.embed(&document.text),
                    "payload": {
                        "text": document.text,
                        "source": document.metadata.source,
                        "document_id": document.metadata.document_id,
                        "row": document.metadata.row,
                        "page": document.metadata.page,
                    },
                })
            })
            .collect::<Vec<_>>();

        let response = self
            .client
            .put(self.collection_url("/points?wait=true")?)
            .json(&json!({ "points": points }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RetrieverError::BackendResponse {
                backend: "qdrant".to_string(),
                details: response.status().to_string(),
            });
        }

        Ok(())
    }
}

#[async_trait]
impl VectorRetriever for QdrantRetriever {
    async fn retrieve(&self, query: &str) -> Result<Vec<Document>, RetrieverError> {
        let query_vector = self.embedder.embed(query);
        if query_vector.len() != self.embedder.dimensions() {
            return Err(RetrieverError::Request(format!(
                "query vector dim {} is not {}",
                query_vector.len(),
                self.embedder.dimensions()
            )));
        }

        let response = self
            .client
            .post(self.collection_url("/points/search")?)
            .json(&json!({
                "vector": query_vector,
                "limit": self.top_k,
                "with_payload": true,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RetrieverError::BackendResponse {
                backend: "qdrant".to_string(),
                details: response.status().to_string(),
            });
        }

        let parsed: Value = response.json().await?;
        parse_search_hits(&parsed)
    }
}

fn point_id(document: &Document) -> u64 {
    let metadata = &document.metadata;
    let key = if metadata.document_id.is_empty() {
        &metadata.source
    } else {
        &metadata.document_id
    };

    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hasher.update(metadata.row.unwrap_or(0).to_le_bytes());
    hasher.update(metadata.page.unwrap_or(0).to_le_bytes());
    let digest = hasher.finalize();

    let mut id = [0u8; 8];
    id.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(id)
}

fn parse_search_hits(parsed: &Value) -> Result<Vec<Document>, RetrieverError> {
    let hits = parsed
        .pointer("/result")
        .and_then(Value::as_array)
        .ok_or_else(|| RetrieverError::BackendResponse {
            backend: "qdrant".to_string(),
            details: "response has no result array".to_string(),
        })?;

    Ok(hits
        .iter()
        .map(|hit| {
            let text_field = |name: &str| {
                hit.pointer(&format!("/payload/{name}"))
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string()
            };

            Document {
                text: text_field("text"),
                metadata: DocumentMetadata {
                    source: text_field("source"),
                    document_id: text_field("document_id"),
                    row: hit.pointer("/payload/row").and_then(Value::as_u64),
                    page: hit
                        .pointer("/payload/page")
                        .and_then(Value::as_u64)
                        .and_then(|page| u32::try_from(page).ok()),
                    loaded_at: None,
                },
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::DEFAULT_EMBEDDING_DIMENSIONS;

    #[test]
    fn search_hits_map_to_documents_in_rank_order() -> Result<(), Box<dyn std::error::Error>> {
        let response = json!({
            "result": [
                {
                    "id": 4,
                    "score": 0.91,
                    "payload": {"text": "Leave policy B", "source": "b.csv", "row": 2}
                },
                {"id": 1, "score": 0.42, "payload": {"text": "Payroll policy A", "source": "a.csv"}}
            ]
        });

        let documents = parse_search_hits(&response)?;
        assert_eq!(documents.len(), 2);
        assert_eq!(documents[0].source(), "b.csv");
        assert_eq!(documents[0].metadata.row, Some(2));
        assert_eq!(documents[1].text, "Payroll policy A");
        assert_eq!(documents[1].metadata.row, None);
        Ok(())
    }

    #[test]
    fn missing_result_array_is_a_backend_error() {
        let result = parse_search_hits(&json!({"status": "error"}));
        assert!(matches!(result, Err(RetrieverError::BackendResponse { .. })));
    }

    #[test]
    fn collection_urls_join_onto_endpoint() -> Result<(), Box<dyn std::error::Error>> {
        let retriever = QdrantRetriever::new("http://localhost:6333/", "inner_docs", 5)?;
        assert_eq!(
            retriever.collection_url("/points/search")?.as_str(),
            "http://localhost:6333/collections/inner_docs/points/search"
        );
        Ok(())
    }

    #[test]
    fn collection_is_created_at_its_own_url_with_cosine_vectors(
    ) -> Result<(), Box<dyn std::error::Error>> {
        let retriever = QdrantRetriever::new("http://localhost:6333", "inner_docs", 5)?;
        assert_eq!(
            retriever.collection_url("")?.as_str(),
            "http://localhost:6333/collections/inner_docs"
        );

        let schema = retriever.collection_schema();
        assert_eq!(schema["vectors"]["size"], DEFAULT_EMBEDDING_DIMENSIONS);
        assert_eq!(schema["vectors"]["distance"], "Cosine");
        Ok(())
    }

    #[test]
    fn point_ids_are_stable_per_document_row() {
        let mut first = Document::new("id,name\n1,Sato", "staff.csv");
        first.metadata.document_id = "doc-staff".to_string();
        first.metadata.row = Some(1);
        let mut second = first.clone();
        second.metadata.row = Some(2);
        let mut edited = first.clone();
        edited.text = "id,name\n1,Sato Hanako".to_string();

        assert_eq!(point_id(&first), point_id(&edited));
        assert_ne!(point_id(&first), point_id(&second));
    }

    #[test]
    fn invalid_endpoint_is_rejected() {
        assert!(QdrantRetriever::new("not a url", "inner_docs", 5).is_err());
    }
}
