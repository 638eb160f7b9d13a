//! Error types for the TrueCred dashboard core

use thiserror::Error;
use uuid::Uuid;

use crate::auth::AuthError;
use crate::domain::FlowState;

/// Input rejected at the boundary, before any flow or provider call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field was blank
    #[error("{field} is required")]
    MissingField { field: &'static str },

    /// Email did not look like `local@domain.tld`
    #[error("invalid email address: {0}")]
    InvalidEmail(String),

    /// Password shorter than the minimum length
    #[error("password must be at least {min} characters")]
    PasswordTooShort { min: usize },

    /// Upload content type is not a PDF or supported image
    #[error("unsupported file type: {0}")]
    UnsupportedFileType(String),

    /// Upload exceeds the size limit
    #[error("file {name} is {size} bytes, limit is {max}")]
    FileTooLarge { name: String, size: u64, max: u64 },

    /// A batch contained no acceptable documents
    #[error("no valid documents to analyze")]
    NoValidDocuments,
}

impl ValidationError {
    /// Message shown next to the offending form field or upload zone.
    pub fn user_message(&self) -> String {
        match self {
            ValidationError::MissingField { .. } => "This field is required".to_string(),
            ValidationError::InvalidEmail(_) => "Please enter a valid email address".to_string(),
            ValidationError::PasswordTooShort { min } => {
                format!("Password must be at least {min} characters")
            }
            ValidationError::UnsupportedFileType(_) => {
                "Please upload a valid PDF or image file".to_string()
            }
            ValidationError::FileTooLarge { max, .. } => {
                format!("File size must be less than {}MB", max / (1024 * 1024))
            }
            ValidationError::NoValidDocuments => {
                "Please select valid PDF or image files (max 10MB)".to_string()
            }
        }
    }
}

/// Errors that can occur in the dashboard core
#[derive(Error, Debug)]
pub enum DashboardError {
    /// Boundary validation failure
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Identity provider failure
    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),

    /// A verification run is already in progress
    #[error("verification run {active} is already in progress")]
    FlowBusy { active: Uuid },

    /// The run was cancelled before completing
    #[error("verification run {run_id} cancelled after {state}")]
    FlowCancelled { run_id: Uuid, state: FlowState },

    /// The run's task ended without a result
    #[error("verification run {run_id} aborted: {message}")]
    FlowAborted { run_id: Uuid, message: String },

    /// Session persistence failure
    #[error("session store error: {0}")]
    Session(String),

    /// Serialization failure
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Filesystem failure
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl DashboardError {
    /// Whether this failure came from user input rather than the system.
    pub fn is_validation(&self) -> bool {
        matches!(self, DashboardError::Validation(_))
    }
}

/// Result type for dashboard operations
pub type Result<T> = std::result::Result<T, DashboardError>;
