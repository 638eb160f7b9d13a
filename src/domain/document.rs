//! Uploaded document references and upload validation

use serde::{Deserialize, Serialize};

use crate::infra::ValidationError;

/// Content types the upload zones accept
pub const ACCEPTED_CONTENT_TYPES: &[&str] =
    &["application/pdf", "image/jpeg", "image/jpg", "image/png"];

/// Default upload size limit (10 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// A file handed to a verification run. Only metadata; contents are never read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRef {
    pub name: String,
    pub content_type: String,
    pub size_bytes: u64,
}

impl DocumentRef {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, size_bytes: u64) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            size_bytes,
        }
    }

    /// Placeholder document used by the demo sample buttons
    pub fn demo(sample: &str) -> Self {
        Self::new(format!("demo-{sample}.pdf"), "application/pdf", 0)
    }

    /// Check type and size against the upload policy
    pub fn validate(&self, max_bytes: u64) -> Result<(), ValidationError> {
        if !ACCEPTED_CONTENT_TYPES.contains(&self.content_type.as_str()) {
            return Err(ValidationError::UnsupportedFileType(
                self.content_type.clone(),
            ));
        }
        if self.size_bytes > max_bytes {
            return Err(ValidationError::FileTooLarge {
                name: self.name.clone(),
                size: self.size_bytes,
                max: max_bytes,
            });
        }
        Ok(())
    }

    pub fn icon(&self) -> &'static str {
        if self.content_type == "application/pdf" {
            "📄"
        } else if self.content_type.starts_with("image/") {
            "🖼️"
        } else {
            "📎"
        }
    }

    pub fn display_size(&self) -> String {
        format_file_size(self.size_bytes)
    }
}

/// Keep the acceptable documents of a batch, rejecting the batch if none are.
pub fn filter_valid(
    documents: impl IntoIterator<Item = DocumentRef>,
    max_bytes: u64,
) -> Result<Vec<DocumentRef>, ValidationError> {
    let valid: Vec<DocumentRef> = documents
        .into_iter()
        .filter(|doc| doc.validate(max_bytes).is_ok())
        .collect();

    if valid.is_empty() {
        return Err(ValidationError::NoValidDocuments);
    }
    Ok(valid)
}

/// Human-readable size: bytes, then KB and MB with one decimal
pub fn format_file_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
