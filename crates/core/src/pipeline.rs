use crate::error::ChatError;
use crate::generator::AnswerGenerator;
use crate::models::{LlmResponse, Mode, PipelineStage, Turn};
use crate::rewriter::QueryRewriter;
use crate::traits::{LlmClient, VectorRetriever};

/// History-aware retrieval followed by answer generation.
///
/// Stages run strictly in order (received, rewritten, retrieved, answered) and the
/// first failure ends the run. Nothing is retried.
pub struct RetrievalPipeline<R, L>
where
    R: VectorRetriever,
    L: LlmClient,
{
    retriever: R,
    llm: L,
}

impl<R, L> RetrievalPipeline<R, L>
where
    R: VectorRetriever,
    L: LlmClient,
{
    pub fn new(retriever: R, llm: L) -> Self {
        Self { retriever, llm }
    }

    pub fn retriever(&self) -> &R {
        &self.retriever
    }

    pub fn llm(&self) -> &L {
        &self.llm
    }

    pub async fn run(
        &self,
        history: &[Turn],
        question: &str,
        mode: Mode,
    ) -> Result<LlmResponse, ChatError> {
        let history = history.to_vec();
        tracing::debug!(stage = %PipelineStage::Received, history_len = history.len(), "pipeline");

        let standalone_query = QueryRewriter::new(&self.llm)
            .rewrite(&history, question)
            .await?;
        tracing::debug!(stage = %PipelineStage::Rewritten, query = %standalone_query, "pipeline");

        let documents = self.retriever.retrieve(&standalone_query).await?;
        tracing::debug!(
            stage = %PipelineStage::Retrieved,
            document_count = documents.len(),
            "pipeline"
        );

        let response = AnswerGenerator::new(&self.llm)
            .generate(question, &documents, mode)
            .await?;
        tracing::debug!(stage = %PipelineStage::Answered, %mode, "pipeline");

        Ok(response)
    }
}
