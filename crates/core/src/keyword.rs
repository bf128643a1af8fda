use crate::models::Document;

/// Literal, case-sensitive substring scan in document order.
///
/// Stops as soon as `limit` matches are collected. An empty query matches nothing.
pub fn search_documents_by_keyword(
    query: &str,
    documents: &[Document],
    limit: usize,
) -> Vec<Document> {
    let mut results = Vec::new();
    if query.is_empty() || limit == 0 {
        return results;
    }

    for document in documents {
        if document.text.contains(query) {
            results.push(document.clone());
            if results.len() >= limit {
                break;
            }
        }
    }

    results
}
