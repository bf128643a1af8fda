use crate::error::StoreError;
use crate::models::{Document, DocumentMetadata};
use crate::traits::DocumentStore;
use async_trait::async_trait;
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const SUPPORTED_EXTENSIONS: [&str; 3] = ["txt", "md", "csv"];

pub fn discover_document_files(folder: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry in WalkDir::new(folder)
        .into_iter()
        .filter_map(|item| item.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }

        let supported = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                SUPPORTED_EXTENSIONS
                    .iter()
                    .any(|known| ext.eq_ignore_ascii_case(known))
            });

        if supported {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort_unstable();
    files
}

pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

pub struct LoadReport {
    pub documents: Vec<Document>,
    pub skipped_files: Vec<SkippedFile>,
}

pub fn load_folder_documents_best_effort(folder: &Path) -> Result<LoadReport, StoreError> {
    let files = discover_document_files(folder);

    if files.is_empty() {
        return Err(StoreError::InvalidArgument(format!(
            "no documents found in {}",
            folder.display()
        )));
    }

    let mut documents = Vec::new();
    let mut skipped_files = Vec::new();

    for path in files {
        match load_file(&path) {
            Ok(file_documents) => documents.extend(file_documents),
            Err(error) => skipped_files.push(SkippedFile {
                path,
                reason: error.to_string(),
            }),
        }
    }

    Ok(LoadReport {
        documents,
        skipped_files,
    })
}

fn load_file(path: &Path) -> Result<Vec<Document>, StoreError> {
    if path.file_name().is_none() {
        return Err(StoreError::MissingFileName(path.display().to_string()));
    }

    let content = fs::read_to_string(path)?;
    let source = path.to_string_lossy().to_string();
    let document_id = generate_document_id(path);

    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));

    if is_csv {
        return Ok(csv_row_documents(&content, &source, &document_id));
    }

    if content.trim().is_empty() {
        return Ok(Vec::new());
    }

    Ok(vec![Document {
        text: content,
        metadata: DocumentMetadata {
            source,
            document_id,
            row: None,
            page: None,
            loaded_at: Some(Utc::now()),
        },
    }])
}

/// One document per data row; the header line is prepended so column names stay searchable.
fn csv_row_documents(content: &str, source: &str, document_id: &str) -> Vec<Document> {
    let mut lines = content.lines();
    let header = lines.next().map(str::trim).unwrap_or_default();
    let loaded_at = Utc::now();

    lines
        .filter(|line| !line.trim().is_empty())
        .enumerate()
        .map(|(index, line)| Document {
            text: format!("{header}\n{}", line.trim()),
            metadata: DocumentMetadata {
                source: source.to_string(),
                document_id: document_id.to_string(),
                row: Some(index as u64 + 1),
                page: None,
                loaded_at: Some(loaded_at),
            },
        })
        .collect()
}

fn generate_document_id(path: &Path) -> String {
    let mut hasher = Sha256::new();
    hasher.update(path.to_string_lossy().as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Loads every supported file under a folder, skipping unreadable ones.
pub struct FolderDocumentStore {
    folder: PathBuf,
}

impl FolderDocumentStore {
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
        }
    }
}

#[async_trait]
impl DocumentStore for FolderDocumentStore {
    async fn load(&self) -> Result<Vec<Document>, StoreError> {
        let folder = self.folder.clone();
        let report = tokio::task::spawn_blocking(move || load_folder_documents_best_effort(&folder))
            .await
            .map_err(|error| StoreError::InvalidArgument(format!("loader task failed: {error}")))??;

        for skipped in &report.skipped_files {
            tracing::warn!(
                path = %skipped.path.display(),
                reason = %skipped.reason,
                "skipped document"
            );
        }
        tracing::info!(
            folder = %self.folder.display(),
            document_count = report.documents.len(),
            "documents loaded"
        );

        Ok(report.documents)
    }
}
