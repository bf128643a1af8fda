use crate::models::PipelineStage;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("path has no file name: {0}")]
    MissingFileName(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

#[derive(Debug, Error)]
pub enum RetrieverError {
    #[error("invalid response from {backend}: {details}")]
    BackendResponse { backend: String, details: String },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("retrieval request failed: {0}")]
    Request(String),
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("invalid response from {backend}: {details}")]
    BackendResponse { backend: String, details: String },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("serialize error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("api key is not configured")]
    MissingApiKey,

    #[error("completion was empty")]
    EmptyCompletion,
}

/// Failure of one chat turn, or of startup.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("initialization failed: {0}")]
    Initialization(String),

    #[error("retrieval failed: {0}")]
    Retrieval(String),

    #[error("generation failed at {stage} stage: {detail}")]
    Generation { stage: PipelineStage, detail: String },

    #[error("rendering failed: {0}")]
    Render(String),
}

impl ChatError {
    pub fn generation(stage: PipelineStage, detail: impl ToString) -> Self {
        Self::Generation {
            stage,
            detail: detail.to_string(),
        }
    }
}

impl From<StoreError> for ChatError {
    fn from(error: StoreError) -> Self {
        Self::Initialization(error.to_string())
    }
}

impl From<RetrieverError> for ChatError {
    fn from(error: RetrieverError) -> Self {
        Self::Retrieval(error.to_string())
    }
}

#[derive(Debug, Error)]
#[error("{0}")]
pub struct RenderError(pub String);

impl From<std::io::Error> for RenderError {
    fn from(error: std::io::Error) -> Self {
        Self(error.to_string())
    }
}

impl From<RenderError> for ChatError {
    fn from(error: RenderError) -> Self {
        Self::Render(error.0)
    }
}
