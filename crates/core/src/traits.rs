use crate::error::{LlmError, RenderError, RetrieverError, StoreError};
use crate::models::Document;
use async_trait::async_trait;

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn load(&self) -> Result<Vec<Document>, StoreError>;
}

/// Ranked semantic lookup. Ranking and result size belong to the implementation.
#[async_trait]
pub trait VectorRetriever: Send + Sync {
    async fn retrieve(&self, query: &str) -> Result<Vec<Document>, RetrieverError>;
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String, LlmError>;
}

/// Display surface for a chat session.
pub trait ChatView {
    fn render_user_message(&mut self, text: &str) -> Result<(), RenderError>;

    fn render_assistant_message(
        &mut self,
        text: &str,
        keyword_hits: &[Document],
    ) -> Result<(), RenderError>;

    fn render_error(&mut self, message: &str);

    fn render_fallback_listing(&mut self, label: &str, documents: &[Document]);
}
