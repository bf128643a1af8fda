//! OpenAI-compatible chat completion client.

use crate::error::LlmError;
use crate::models::ChatSettings;
use crate::traits::LlmClient;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use url::Url;

pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

pub struct OpenAiChatClient {
    base_url: Url,
    api_key: String,
    model: String,
    temperature: f32,
    client: Client,
}

impl OpenAiChatClient {
    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
        settings: &ChatSettings,
    ) -> Result<Self, LlmError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(LlmError::MissingApiKey);
        }

        // A trailing slash keeps `join` from replacing the last path segment.
        let normalized = format!("{}/", base_url.trim_end_matches('/'));

        Ok(Self {
            base_url: Url::parse(&normalized)?,
            api_key,
            model: settings.model.clone(),
            temperature: settings.temperature,
            client: Client::new(),
        })
    }

    fn completions_url(&self) -> Result<Url, LlmError> {
        Ok(self.base_url.join("chat/completions")?)
    }

    fn request_body(&self, system_prompt: &str, user_prompt: &str) -> Value {
        json!({
            "model": self.model,
            "temperature": self.temperature,
            "messages": [
                {"role": "system", "content": system_prompt},
                {"role": "user", "content": user_prompt},
            ],
        })
    }
}

#[async_trait]
impl LlmClient for OpenAiChatClient {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String, LlmError> {
        let response = self
            .client
            .post(self.completions_url()?)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(system_prompt, user_prompt))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let details = response.text().await.unwrap_or_default();
            return Err(LlmError::BackendResponse {
                backend: "chat-completions".to_string(),
                details: format!("{status}: {details}"),
            });
        }

        let parsed: Value = response.json().await?;
        extract_completion_text(&parsed)
    }
}

fn extract_completion_text(parsed: &Value) -> Result<String, LlmError> {
    let content = parsed
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .ok_or_else(|| LlmError::BackendResponse {
            backend: "chat-completions".to_string(),
            details: "response has no choices[0].message.content".to_string(),
        })?;

    if content.trim().is_empty() {
        return Err(LlmError::EmptyCompletion);
    }

    Ok(content.to_string())
}

/// Masks a credential for diagnostics: first five and last four characters.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.is_empty() {
        return "(not set)".to_string();
    }
    if chars.len() <= 9 {
        return "*".repeat(chars.len());
    }

    let head: String = chars[..5].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}
