use crate::error::{ChatError, LlmError};
use crate::models::{PipelineStage, Turn};
use crate::prompts::{rewrite_user_prompt, SYSTEM_PROMPT_CREATE_STANDALONE_QUERY};
use crate::traits::LlmClient;

/// Turns a follow-up question plus history into a standalone search query.
pub struct QueryRewriter<'a, L: LlmClient> {
    llm: &'a L,
}

impl<'a, L: LlmClient> QueryRewriter<'a, L> {
    pub fn new(llm: &'a L) -> Self {
        Self { llm }
    }

    /// One completion call, no retry. Failures surface as generation errors.
    pub async fn rewrite(&self, history: &[Turn], question: &str) -> Result<String, ChatError> {
        let completion = self
            .llm
            .complete(
                SYSTEM_PROMPT_CREATE_STANDALONE_QUERY,
                &rewrite_user_prompt(history, question),
            )
            .await
            .map_err(|error| ChatError::generation(PipelineStage::Rewritten, error))?;

        let query = completion.trim().trim_matches('"').trim();
        if query.is_empty() {
            return Err(ChatError::generation(
                PipelineStage::Rewritten,
                LlmError::EmptyCompletion,
            ));
        }

        Ok(query.to_string())
    }
}
