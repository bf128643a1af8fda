use crate::display::{build_error_message, compose_reply, user_message_for};
use crate::error::ChatError;
use crate::keyword::search_documents_by_keyword;
use crate::models::{ChatSettings, Document, LlmResponse};
use crate::pipeline::RetrievalPipeline;
use crate::session::Session;
use crate::traits::{ChatView, DocumentStore, LlmClient, VectorRetriever};
use std::collections::HashSet;

/// Static listing rendered next to the error when a turn fails.
#[derive(Debug, Clone)]
pub struct FallbackListing {
    pub label: String,
    pub filter: String,
}

#[derive(Debug)]
pub enum TurnOutcome {
    Ignored,
    Answered {
        reply: String,
        response: LlmResponse,
        keyword_hits: Vec<Document>,
    },
}

/// Loads the corpus once at startup. Any failure is fatal.
pub async fn initialize_documents<S: DocumentStore>(
    store: &S,
) -> Result<Vec<Document>, ChatError> {
    let documents = store.load().await?;
    if documents.is_empty() {
        return Err(ChatError::Initialization(
            "document store returned no documents".to_string(),
        ));
    }
    Ok(documents)
}

/// Wires one user submission through keyword search, the pipeline and the view.
pub struct ChatController<R, L>
where
    R: VectorRetriever,
    L: LlmClient,
{
    pipeline: RetrievalPipeline<R, L>,
    documents: Vec<Document>,
    settings: ChatSettings,
    fallback: Option<FallbackListing>,
    credential_hint: Option<String>,
}

impl<R, L> ChatController<R, L>
where
    R: VectorRetriever,
    L: LlmClient,
{
    pub fn new(
        pipeline: RetrievalPipeline<R, L>,
        documents: Vec<Document>,
        settings: ChatSettings,
    ) -> Self {
        Self {
            pipeline,
            documents,
            settings,
            fallback: None,
            credential_hint: None,
        }
    }

    pub fn with_fallback(mut self, fallback: FallbackListing) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Already-masked credential shown in debug error output.
    pub fn with_credential_hint(mut self, hint: impl Into<String>) -> Self {
        self.credential_hint = Some(hint.into());
        self
    }

    pub fn keyword_search(&self, query: &str) -> Vec<Document> {
        search_documents_by_keyword(query, &self.documents, self.settings.keyword_limit)
    }

    /// Every record matching the filter, without duplicates. Not capped by the
    /// keyword limit.
    fn fallback_records(&self, filter: &str) -> Vec<Document> {
        let mut seen = HashSet::new();
        search_documents_by_keyword(filter, &self.documents, usize::MAX)
            .into_iter()
            .filter(|document| seen.insert(document.text.clone()))
            .collect()
    }

    /// Handles one submission. History grows by exactly two turns on success and is
    /// untouched on any failure; failures are rendered before being returned.
    pub async fn submit<V: ChatView>(
        &self,
        session: &mut Session,
        view: &mut V,
        text: &str,
    ) -> Result<TurnOutcome, ChatError> {
        let question = text.trim();
        if question.is_empty() {
            return Ok(TurnOutcome::Ignored);
        }

        let mode = session.mode();
        tracing::info!(session = %session.id(), %mode, text = question, "user message");

        match self.answer(session, view, question).await {
            Ok((reply, response, keyword_hits)) => {
                tracing::info!(session = %session.id(), %mode, text = %reply, "assistant message");
                session.record_exchange(question, response.answer.clone());
                Ok(TurnOutcome::Answered {
                    reply,
                    response,
                    keyword_hits,
                })
            }
            Err(error) => {
                self.report_failure(view, &error);
                Err(error)
            }
        }
    }

    async fn answer<V: ChatView>(
        &self,
        session: &Session,
        view: &mut V,
        question: &str,
    ) -> Result<(String, LlmResponse, Vec<Document>), ChatError> {
        view.render_user_message(question)?;

        let keyword_hits = self.keyword_search(question);
        let response = self
            .pipeline
            .run(session.history(), question, session.mode())
            .await?;

        let reply = compose_reply(session.mode(), &response, &keyword_hits);
        view.render_assistant_message(&reply, &keyword_hits)?;

        Ok((reply, response, keyword_hits))
    }

    fn report_failure<V: ChatView>(&self, view: &mut V, error: &ChatError) {
        tracing::error!(error = %error, "chat turn failed");

        let mut message = build_error_message(user_message_for(error));
        if self.settings.debug {
            message.push_str(&format!("\n\nDetails: {error}"));
            if let Some(hint) = &self.credential_hint {
                message.push_str(&format!("\nAPI key: {hint}"));
            }
        }
        view.render_error(&message);

        if matches!(error, ChatError::Retrieval(_) | ChatError::Generation { .. }) {
            if let Some(fallback) = &self.fallback {
                let listing = self.fallback_records(&fallback.filter);
                view.render_fallback_listing(&fallback.label, &listing);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::{GET_LLM_RESPONSE_ERROR_MESSAGE, RETRIEVAL_ERROR_MESSAGE};
    use crate::error::{LlmError, StoreError};
    use crate::models::{Mode, Role, Turn};
    use crate::prompts::{SYSTEM_PROMPT_DOC_SEARCH, SYSTEM_PROMPT_INQUIRY};
    use crate::testing::{FakeRetriever, RecordingView, ScriptedLlm};
    use async_trait::async_trait;

    fn corpus() -> Vec<Document> {
        vec![
            Document::new("Payroll policy A", "a.csv"),
            Document::new("Leave policy B", "b.csv"),
            Document::new("id,name,department\n7,Sato,HR", "staff.csv"),
        ]
    }

    fn controller(
        retriever: FakeRetriever,
        replies: Vec<Result<String, LlmError>>,
    ) -> ChatController<FakeRetriever, ScriptedLlm> {
        ChatController::new(
            RetrievalPipeline::new(retriever, ScriptedLlm::new(replies)),
            corpus(),
            ChatSettings::default(),
        )
    }

    #[tokio::test]
    async fn successful_turn_appends_user_then_assistant(
    ) -> Result<(), Box<dyn std::error::Error>> {
        let chat = controller(
            FakeRetriever::returning(corpus()[..2].to_vec()),
            vec![Ok("leave policy".to_string()), Ok("b.csv".to_string())],
        );
        let mut session = Session::new();
        let mut view = RecordingView::default();

        chat.submit(&mut session, &mut view, "policy").await?;

        assert_eq!(
            session.history(),
            &[Turn::user("policy"), Turn::assistant("b.csv")]
        );
        assert_eq!(view.user_messages, vec!["policy".to_string()]);
        let (reply, hits) = &view.assistant_messages[0];
        assert!(reply.contains("📄 b.csv"));
        assert_eq!(hits.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn retriever_failure_leaves_history_unchanged(
    ) -> Result<(), Box<dyn std::error::Error>> {
        let chat = controller(
            FakeRetriever::failing("vector store unreachable"),
            vec![Ok("leave policy".to_string())],
        );
        let mut session = Session::new();
        session.record_exchange("earlier", "answer");
        let mut view = RecordingView::default();

        let result = chat.submit(&mut session, &mut view, "leave?").await;

        assert!(matches!(result, Err(ChatError::Retrieval(_))));
        assert_eq!(session.history().len(), 2);
        assert!(view.errors[0].starts_with(RETRIEVAL_ERROR_MESSAGE));
        assert!(!view.errors[0].contains("unreachable"));
        assert!(view.assistant_messages.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn generation_failure_leaves_history_unchanged() {
        let chat = controller(
            FakeRetriever::returning(corpus()),
            vec![Ok("leave policy".to_string()), Err(LlmError::EmptyCompletion)],
        );
        let mut session = Session::new();
        let mut view = RecordingView::default();

        let result = chat.submit(&mut session, &mut view, "leave?").await;

        assert!(matches!(result, Err(ChatError::Generation { .. })));
        assert!(session.history().is_empty());
        assert!(view.errors[0].starts_with(GET_LLM_RESPONSE_ERROR_MESSAGE));
    }

    #[tokio::test]
    async fn render_failure_loses_the_answer() {
        let chat = controller(
            FakeRetriever::returning(corpus()),
            vec![Ok("leave policy".to_string()), Ok("b.csv".to_string())],
        );
        let mut session = Session::new();
        let mut view = RecordingView {
            fail_assistant_render: true,
            ..Default::default()
        };

        let result = chat.submit(&mut session, &mut view, "leave?").await;

        assert!(matches!(result, Err(ChatError::Render(_))));
        assert!(session.history().is_empty());
        assert!(view.fallback_listings.is_empty());
    }

    #[tokio::test]
    async fn blank_input_is_ignored() -> Result<(), Box<dyn std::error::Error>> {
        let chat = controller(FakeRetriever::returning(corpus()), Vec::new());
        let mut session = Session::new();
        let mut view = RecordingView::default();

        let outcome = chat.submit(&mut session, &mut view, "   ").await?;

        assert!(matches!(outcome, TurnOutcome::Ignored));
        assert!(view.user_messages.is_empty());
        assert!(session.history().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn mode_switch_changes_template_but_not_history(
    ) -> Result<(), Box<dyn std::error::Error>> {
        let chat = controller(
            FakeRetriever::returning(corpus()[..2].to_vec()),
            vec![
                Ok("leave policy".to_string()),
                Ok("b.csv".to_string()),
                Ok("leave policy rules".to_string()),
                Ok("Request leave a week ahead [b.csv]".to_string()),
            ],
        );
        let mut session = Session::new();
        let mut view = RecordingView::default();

        chat.submit(&mut session, &mut view, "leave?").await?;
        let recorded = session.history().to_vec();
        session.set_mode(Mode::Inquiry);
        chat.submit(&mut session, &mut view, "how early?").await?;

        assert_eq!(&session.history()[..2], recorded.as_slice());
        assert_eq!(session.history().len(), 4);
        assert_eq!(session.history()[3].role, Role::Assistant);

        let calls = chat.pipeline_calls();
        assert_eq!(calls[1].0, SYSTEM_PROMPT_DOC_SEARCH);
        assert_eq!(calls[3].0, SYSTEM_PROMPT_INQUIRY);
        assert!(calls[2].1.contains("assistant: b.csv"));

        let (inquiry_reply, _) = &view.assistant_messages[1];
        assert!(inquiry_reply.starts_with("Request leave a week ahead [b.csv]"));
        assert!(inquiry_reply.contains("Sources:"));
        Ok(())
    }

    #[tokio::test]
    async fn fallback_listing_is_shown_on_failure() {
        let chat = controller(FakeRetriever::failing("offline"), vec![Ok("hr staff".to_string())])
            .with_fallback(FallbackListing {
                label: "HR department members".to_string(),
                filter: "HR".to_string(),
            });
        let mut session = Session::new();
        let mut view = RecordingView::default();

        let _ = chat.submit(&mut session, &mut view, "who is in HR?").await;

        let (label, listing) = &view.fallback_listings[0];
        assert_eq!(label, "HR department members");
        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].source(), "staff.csv");
    }

    #[tokio::test]
    async fn fallback_listing_lists_every_match_once() {
        let mut documents: Vec<Document> = (1..=15)
            .map(|id| Document::new(format!("id,name,department\n{id},Staff {id},HR"), "staff.csv"))
            .collect();
        documents.push(documents[0].clone());
        documents.push(Document::new("Payroll policy A", "a.csv"));

        let chat = ChatController::new(
            RetrievalPipeline::new(
                FakeRetriever::failing("offline"),
                ScriptedLlm::new(vec![Ok("hr staff".to_string())]),
            ),
            documents,
            ChatSettings::default(),
        )
        .with_fallback(FallbackListing {
            label: "HR department members".to_string(),
            filter: "HR".to_string(),
        });
        let mut session = Session::new();
        let mut view = RecordingView::default();

        let _ = chat.submit(&mut session, &mut view, "who is in HR?").await;

        let (_, listing) = &view.fallback_listings[0];
        assert!(listing.len() > ChatSettings::default().keyword_limit);
        assert_eq!(listing.len(), 15);
        assert!(listing[0].text.ends_with("1,Staff 1,HR"));
        assert!(listing[14].text.ends_with("15,Staff 15,HR"));
    }

    #[tokio::test]
    async fn debug_mode_adds_details_and_masked_key() {
        let mut settings = ChatSettings::default();
        settings.debug = true;
        let chat = ChatController::new(
            RetrievalPipeline::new(
                FakeRetriever::failing("vector store unreachable"),
                ScriptedLlm::new(vec![Ok("q".to_string())]),
            ),
            corpus(),
            settings,
        )
        .with_credential_hint("sk-ab...mnop");
        let mut session = Session::new();
        let mut view = RecordingView::default();

        let _ = chat.submit(&mut session, &mut view, "leave?").await;

        assert!(view.errors[0].contains("vector store unreachable"));
        assert!(view.errors[0].contains("API key: sk-ab...mnop"));
    }

    struct EmptyStore;

    #[async_trait]
    impl DocumentStore for EmptyStore {
        async fn load(&self) -> Result<Vec<Document>, StoreError> {
            Err(StoreError::InvalidArgument("no documents found".to_string()))
        }
    }

    #[tokio::test]
    async fn store_failure_is_an_initialization_error() {
        let result = initialize_documents(&EmptyStore).await;
        assert!(matches!(result, Err(ChatError::Initialization(_))));
    }

    impl ChatController<FakeRetriever, ScriptedLlm> {
        fn pipeline_calls(&self) -> Vec<(String, String)> {
            self.pipeline.llm().calls()
        }
    }
}
