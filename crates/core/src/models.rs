use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentMetadata {
    pub source: String,
    pub document_id: String,
    pub row: Option<u64>,
    pub page: Option<u32>,
    pub loaded_at: Option<DateTime<Utc>>,
}

impl DocumentMetadata {
    pub fn from_source(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            document_id: String::new(),
            row: None,
            page: None,
            loaded_at: None,
        }
    }

    /// Human-readable location: the source plus row or page when known.
    pub fn location(&self) -> String {
        match (self.row, self.page) {
            (Some(row), _) => format!("{} (row {row})", self.source),
            (None, Some(page)) => format!("{} (page {page})", self.source),
            (None, None) => self.source.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    pub text: String,
    pub metadata: DocumentMetadata,
}

impl Document {
    pub fn new(text: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            metadata: DocumentMetadata::from_source(source),
        }
    }

    pub fn source(&self) -> &str {
        &self.metadata.source
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
        }
    }
}

/// Response style for a session: point at documents, or answer directly.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    #[default]
    DocumentSearch,
    Inquiry,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::DocumentSearch => "document-search",
            Mode::Inquiry => "inquiry",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "document-search" | "search" | "documents" => Ok(Mode::DocumentSearch),
            "inquiry" | "ask" => Ok(Mode::Inquiry),
            other => Err(format!(
                "unknown mode '{other}', expected 'document-search' or 'inquiry'"
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LlmResponse {
    pub answer: String,
    pub source_documents: Vec<Document>,
}

/// Progress of one pipeline run, in order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum PipelineStage {
    Received,
    Rewritten,
    Retrieved,
    Answered,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::Received => "received",
            PipelineStage::Rewritten => "rewritten",
            PipelineStage::Retrieved => "retrieved",
            PipelineStage::Answered => "answered",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct ChatSettings {
    pub model: String,
    pub temperature: f32,
    pub retriever_top_k: usize,
    pub keyword_limit: usize,
    pub debug: bool,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            temperature: 0.5,
            retriever_top_k: 5,
            keyword_limit: 10,
            debug: false,
        }
    }
}
