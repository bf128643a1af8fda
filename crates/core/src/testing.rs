use crate::error::{LlmError, RenderError, RetrieverError};
use crate::models::Document;
use crate::traits::{ChatView, LlmClient, VectorRetriever};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Replays queued completions and records every (system, user) prompt pair.
pub struct ScriptedLlm {
    replies: Mutex<VecDeque<Result<String, LlmError>>>,
    calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedLlm {
    pub fn new(replies: Vec<Result<String, LlmError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String, LlmError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((system_prompt.to_string(), user_prompt.to_string()));
        }
        self.replies
            .lock()
            .ok()
            .and_then(|mut replies| replies.pop_front())
            .unwrap_or(Err(LlmError::EmptyCompletion))
    }
}

pub struct FakeRetriever {
    documents: Vec<Document>,
    failure: Option<String>,
    queries: Mutex<Vec<String>>,
}

impl FakeRetriever {
    pub fn returning(documents: Vec<Document>) -> Self {
        Self {
            documents,
            failure: None,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            documents: Vec::new(),
            failure: Some(reason.to_string()),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().map(|queries| queries.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl VectorRetriever for FakeRetriever {
    async fn retrieve(&self, query: &str) -> Result<Vec<Document>, RetrieverError> {
        if let Ok(mut queries) = self.queries.lock() {
            queries.push(query.to_string());
        }
        match &self.failure {
            Some(reason) => Err(RetrieverError::Request(reason.clone())),
            None => Ok(self.documents.clone()),
        }
    }
}

#[derive(Default)]
pub struct RecordingView {
    pub user_messages: Vec<String>,
    pub assistant_messages: Vec<(String, Vec<Document>)>,
    pub errors: Vec<String>,
    pub fallback_listings: Vec<(String, Vec<Document>)>,
    pub fail_assistant_render: bool,
}

impl ChatView for RecordingView {
    fn render_user_message(&mut self, text: &str) -> Result<(), RenderError> {
        self.user_messages.push(text.to_string());
        Ok(())
    }

    fn render_assistant_message(
        &mut self,
        text: &str,
        keyword_hits: &[Document],
    ) -> Result<(), RenderError> {
        if self.fail_assistant_render {
            return Err(RenderError("display closed".to_string()));
        }
        self.assistant_messages
            .push((text.to_string(), keyword_hits.to_vec()));
        Ok(())
    }

    fn render_error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }

    fn render_fallback_listing(&mut self, label: &str, documents: &[Document]) {
        self.fallback_listings
            .push((label.to_string(), documents.to_vec()));
    }
}
