use crate::error::{ChatError, LlmError};
use crate::models::{Document, LlmResponse, Mode, PipelineStage};
use crate::prompts::{answer_system_prompt, answer_user_prompt};
use crate::traits::LlmClient;

/// Composes the final answer from retrieved documents with the mode's template.
pub struct AnswerGenerator<'a, L: LlmClient> {
    llm: &'a L,
}

impl<'a, L: LlmClient> AnswerGenerator<'a, L> {
    pub fn new(llm: &'a L) -> Self {
        Self { llm }
    }

    pub async fn generate(
        &self,
        question: &str,
        context_documents: &[Document],
        mode: Mode,
    ) -> Result<LlmResponse, ChatError> {
        let completion = self
            .llm
            .complete(
                answer_system_prompt(mode),
                &answer_user_prompt(question, context_documents),
            )
            .await
            .map_err(|error| ChatError::generation(PipelineStage::Answered, error))?;

        let answer = completion.trim();
        if answer.is_empty() {
            return Err(ChatError::generation(
                PipelineStage::Answered,
                LlmError::EmptyCompletion,
            ));
        }

        Ok(LlmResponse {
            answer: answer.to_string(),
            source_documents: context_documents.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompts::{SYSTEM_PROMPT_DOC_SEARCH, SYSTEM_PROMPT_INQUIRY};
    use crate::testing::ScriptedLlm;

    fn context() -> Vec<Document> {
        vec![
            Document::new("Payroll policy A", "a.csv"),
            Document::new("Leave policy B", "b.csv"),
        ]
    }

    #[tokio::test]
    async fn template_follows_mode() -> Result<(), Box<dyn std::error::Error>> {
        let llm = ScriptedLlm::new(vec![
            Ok("a.csv".to_string()),
            Ok("Salaries are paid on the 25th [a.csv]".to_string()),
        ]);
        let generator = AnswerGenerator::new(&llm);

        generator.generate("payday?", &context(), Mode::DocumentSearch).await?;
        generator.generate("payday?", &context(), Mode::Inquiry).await?;

        let calls = llm.calls();
        assert_eq!(calls[0].0, SYSTEM_PROMPT_DOC_SEARCH);
        assert_eq!(calls[1].0, SYSTEM_PROMPT_INQUIRY);
        Ok(())
    }

    #[tokio::test]
    async fn response_carries_context_in_retrieval_order(
    ) -> Result<(), Box<dyn std::error::Error>> {
        let llm = ScriptedLlm::new(vec![Ok("  Leave policy lives in b.csv \n".to_string())]);

        let response = AnswerGenerator::new(&llm)
            .generate("leave?", &context(), Mode::DocumentSearch)
            .await?;

        assert_eq!(response.answer, "Leave policy lives in b.csv");
        assert_eq!(response.source_documents, context());
        let user_prompt = &llm.calls()[0].1;
        let payroll = user_prompt.find("Payroll policy A").ok_or("payroll missing")?;
        let leave = user_prompt.find("Leave policy B").ok_or("leave missing")?;
        assert!(payroll < leave);
        Ok(())
    }

    #[tokio::test]
    async fn blank_completion_is_a_generation_error() {
        let llm = ScriptedLlm::new(vec![Ok("   ".to_string())]);
        let result = AnswerGenerator::new(&llm)
            .generate("leave?", &context(), Mode::Inquiry)
            .await;
        assert!(matches!(
            result,
            Err(ChatError::Generation {
                stage: PipelineStage::Answered,
                ..
            })
        ));
    }
}
