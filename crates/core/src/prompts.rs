use crate::models::{Document, Mode, Turn};

/// Reply the document-search prompt asks for when nothing in the context fits.
pub const NO_DOC_MATCH_ANSWER: &str = "NO_MATCHING_DOCUMENT";

pub const DOCUMENT_DELIMITER: &str = "\n\n---\n\n";

pub const SYSTEM_PROMPT_CREATE_STANDALONE_QUERY: &str = "\
You rewrite questions into search queries for an internal document index. \
Given the conversation history and the latest question, write one standalone \
search query that can be understood without the history. Add common synonyms \
for company and HR terms (for example department names, job titles, leave \
and payroll vocabulary). Reply with the query text only.";

pub const SYSTEM_PROMPT_DOC_SEARCH: &str = "\
You locate internal documents. Using only the context below, name the source \
of the document that best matches the user's request and summarize in one \
sentence what it contains. Do not answer the question itself. If no document \
in the context is relevant, reply with exactly NO_MATCHING_DOCUMENT.";

pub const SYSTEM_PROMPT_INQUIRY: &str = "\
You answer questions about the company using only the context below. Answer \
directly and concisely, and cite the sources you used in square brackets, for \
example [handbook.md]. If the context does not contain the answer, say that \
the information was not found in the internal documents.";

pub fn answer_system_prompt(mode: Mode) -> &'static str {
    match mode {
        Mode::DocumentSearch => SYSTEM_PROMPT_DOC_SEARCH,
        Mode::Inquiry => SYSTEM_PROMPT_INQUIRY,
    }
}

pub fn format_history(history: &[Turn]) -> String {
    if history.is_empty() {
        return "(none)".to_string();
    }

    history
        .iter()
        .map(|turn| format!("{}: {}", turn.role.as_str(), turn.text))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Document texts in retrieval order, each headed by its source.
pub fn format_context(documents: &[Document]) -> String {
    documents
        .iter()
        .map(|document| format!("[{}]\n{}", document.metadata.location(), document.text.trim()))
        .collect::<Vec<_>>()
        .join(DOCUMENT_DELIMITER)
}

pub fn rewrite_user_prompt(history: &[Turn], question: &str) -> String {
    format!(
        "History:\n{}\n\nQuestion: {}\n\n\
         Write the search query, taking related synonyms into account.",
        format_history(history),
        question
    )
}

pub fn answer_user_prompt(question: &str, context_documents: &[Document]) -> String {
    let context = if context_documents.is_empty() {
        "(no documents retrieved)".to_string()
    } else {
        format_context(context_documents)
    };

    format!("Question: {question}\n\nContext:\n{context}")
}
