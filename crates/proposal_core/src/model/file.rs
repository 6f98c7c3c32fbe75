//! Uploaded document metadata.

use crate::util::generate_id;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Largest accepted upload, in bytes.
pub const MAX_FILE_SIZE_BYTES: u64 = 25 * 1024 * 1024;

const ACCEPTED_MIME_TYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "text/plain",
    "text/markdown",
];

/// Result of checking one upload against accepted types and size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileValidation {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

/// Metadata of one document attached to a proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMeta {
    pub id: Uuid,
    pub filename: String,
    pub mime_type: String,
    pub size_bytes: u64,
    /// Opaque payload reference (storage key, data URL, ...).
    pub content: String,
    pub uploaded_at: DateTime<Utc>,
    pub validation: Option<FileValidation>,
}

impl FileMeta {
    pub fn new(
        filename: impl Into<String>,
        mime_type: impl Into<String>,
        size_bytes: u64,
        content: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: generate_id(),
            filename: filename.into(),
            mime_type: mime_type.into(),
            size_bytes,
            content: content.into(),
            uploaded_at: now,
            validation: None,
        }
    }

    /// Checks type, size and name, and stores the result on `self`.
    pub fn validate(&mut self) -> &FileValidation {
        let mut errors = Vec::new();
        if self.filename.trim().is_empty() {
            errors.push("filename is required".to_string());
        }
        let mime = self.mime_type.trim().to_ascii_lowercase();
        if !ACCEPTED_MIME_TYPES.contains(&mime.as_str()) {
            errors.push(format!("unsupported file type `{}`", self.mime_type));
        }
        if self.size_bytes == 0 {
            errors.push("file is empty".to_string());
        } else if self.size_bytes > MAX_FILE_SIZE_BYTES {
            errors.push(format!(
                "file exceeds {} MiB limit",
                MAX_FILE_SIZE_BYTES / (1024 * 1024)
            ));
        }

        self.validation.insert(FileValidation {
            is_valid: errors.is_empty(),
            errors,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{FileMeta, MAX_FILE_SIZE_BYTES};
    use chrono::Utc;

    #[test]
    fn validate_flags_type_and_size() {
        let mut file = FileMeta::new(
            "rfp.exe",
            "application/x-msdownload",
            MAX_FILE_SIZE_BYTES + 1,
            "blob:1",
            Utc::now(),
        );
        let result = file.validate().clone();
        assert!(!result.is_valid);
        assert_eq!(result.errors.len(), 2);
        assert_eq!(file.validation, Some(result));
    }

    #[test]
    fn validate_accepts_pdf() {
        let mut file = FileMeta::new("rfp.pdf", "application/pdf", 2048, "blob:2", Utc::now());
        assert!(file.validate().is_valid);
    }
}
