//! Turns pipeline output into the text shown to the user.

use crate::error::ChatError;
use crate::models::{Document, LlmResponse, Mode, Role, Turn};
use crate::prompts::NO_DOC_MATCH_ANSWER;
use std::collections::HashSet;

pub const LINK_SOURCE_ICON: &str = "🔗";
pub const DOC_SOURCE_ICON: &str = "📄";

pub const COMMON_ERROR_MESSAGE: &str =
    "If the problem persists, please contact your system administrator.";
pub const INITIALIZE_ERROR_MESSAGE: &str = "Initialization failed.";
pub const RETRIEVAL_ERROR_MESSAGE: &str = "Failed to search the internal documents.";
pub const GET_LLM_RESPONSE_ERROR_MESSAGE: &str = "Failed to get an answer from the assistant.";
pub const DISP_ANSWER_ERROR_MESSAGE: &str = "Failed to display the answer.";
pub const NO_DOC_MATCH_MESSAGE: &str =
    "No document matching your input was found. Try rephrasing your question.";

pub fn source_icon(source: &str) -> &'static str {
    if source.starts_with("http") {
        LINK_SOURCE_ICON
    } else {
        DOC_SOURCE_ICON
    }
}

pub fn build_error_message(message: &str) -> String {
    [message, COMMON_ERROR_MESSAGE].join("\n")
}

/// Fixed, non-diagnostic text for each failure kind.
pub fn user_message_for(error: &ChatError) -> &'static str {
    match error {
        ChatError::Initialization(_) => INITIALIZE_ERROR_MESSAGE,
        ChatError::Retrieval(_) => RETRIEVAL_ERROR_MESSAGE,
        ChatError::Generation { .. } => GET_LLM_RESPONSE_ERROR_MESSAGE,
        ChatError::Render(_) => DISP_ANSWER_ERROR_MESSAGE,
    }
}

/// Location pointers for document-search mode, or `None` when nothing matched.
///
/// The primary pointer is the retrieved document the model named, falling back to
/// the top-ranked one.
pub fn format_search_response(response: &LlmResponse) -> Option<String> {
    if response.answer.trim() == NO_DOC_MATCH_ANSWER || response.source_documents.is_empty() {
        return None;
    }

    let primary = response
        .source_documents
        .iter()
        .position(|document| {
            !document.source().is_empty() && response.answer.contains(document.source())
        })
        .unwrap_or(0);

    let primary_document = &response.source_documents[primary];
    let mut lines = vec![
        "The information you are looking for may be in this file:".to_string(),
        pointer_line(primary_document),
    ];

    let mut seen = HashSet::from([primary_document.metadata.location()]);
    let others: Vec<String> = response
        .source_documents
        .iter()
        .filter(|document| seen.insert(document.metadata.location()))
        .map(pointer_line)
        .collect();

    if !others.is_empty() {
        lines.push(String::new());
        lines.push("Other files that may be relevant:".to_string());
        lines.extend(others);
    }

    Some(lines.join("\n"))
}

/// Direct answer followed by the distinct sources it was grounded on.
pub fn format_inquiry_response(response: &LlmResponse) -> String {
    let mut seen = HashSet::new();
    let sources: Vec<String> = response
        .source_documents
        .iter()
        .filter(|document| seen.insert(document.metadata.location()))
        .map(|document| format!("- {}", pointer_line(document)))
        .collect();

    if sources.is_empty() {
        return response.answer.clone();
    }

    format!("{}\n\nSources:\n{}", response.answer, sources.join("\n"))
}

/// Assistant text for a turn. Keyword hits are shown by the view in their own
/// section, so a not-found warning appears only when both sections would be empty.
pub fn compose_reply(mode: Mode, response: &LlmResponse, keyword_hits: &[Document]) -> String {
    let ai_section = match mode {
        Mode::DocumentSearch => format_search_response(response),
        Mode::Inquiry => Some(format_inquiry_response(response)),
    };

    match ai_section {
        Some(text) => text,
        None if keyword_hits.is_empty() => NO_DOC_MATCH_MESSAGE.to_string(),
        None => String::new(),
    }
}

/// Text shown when replaying history. History keeps the raw model answer, so
/// the no-match sentinel is swapped for the user-facing message here.
pub fn history_text(turn: &Turn) -> &str {
    if turn.role == Role::Assistant && turn.text.trim() == NO_DOC_MATCH_ANSWER {
        NO_DOC_MATCH_MESSAGE
    } else {
        &turn.text
    }
}

pub fn format_keyword_hits(hits: &[Document]) -> String {
    hits.iter()
        .map(|hit| {
            // CSV rows carry the header first; show the row itself.
            let mut lines = hit.text.lines().map(str::trim).filter(|line| !line.is_empty());
            let preview = if hit.metadata.row.is_some() {
                lines.last()
            } else {
                lines.next()
            };
            format!("{}  {}", pointer_line(hit), preview.unwrap_or_default())
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn pointer_line(document: &Document) -> String {
    format!(
        "{} {}",
        source_icon(document.source()),
        document.metadata.location()
    )
}
