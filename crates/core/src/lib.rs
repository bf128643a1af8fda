pub mod chat;
pub mod display;
pub mod embeddings;
pub mod error;
pub mod generator;
pub mod ingest;
pub mod keyword;
pub mod llm;
pub mod models;
pub mod pipeline;
pub mod prompts;
pub mod rewriter;
pub mod session;
pub mod stores;
pub mod traits;

#[cfg(test)]
pub(crate) mod testing;

pub use chat::{initialize_documents, ChatController, FallbackListing, TurnOutcome};
pub use display::{
    build_error_message, compose_reply, format_keyword_hits, history_text, source_icon,
};
pub use embeddings::{CharacterNgramEmbedder, Embedder, DEFAULT_EMBEDDING_DIMENSIONS};
pub use error::{ChatError, LlmError, RenderError, RetrieverError, StoreError};
pub use generator::AnswerGenerator;
pub use ingest::{
    discover_document_files, load_folder_documents_best_effort, FolderDocumentStore, LoadReport,
    SkippedFile,
};
pub use keyword::search_documents_by_keyword;
pub use llm::{mask_secret, OpenAiChatClient, DEFAULT_API_BASE};
pub use models::{
    ChatSettings, Document, DocumentMetadata, LlmResponse, Mode, PipelineStage, Role, Turn,
};
pub use pipeline::RetrievalPipeline;
pub use rewriter::QueryRewriter;
pub use session::Session;
pub use stores::{MemoryVectorIndex, QdrantRetriever};
pub use traits::{ChatView, DocumentStore, LlmClient, VectorRetriever};
