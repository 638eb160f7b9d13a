//! Credential validation

use regex::Regex;

use crate::infra::ValidationError;

/// Minimum accepted password length, in characters
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Something before and after a single `@`, with a dot in the domain
pub const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";

/// Checks login and registration forms before any provider call
pub struct CredentialValidator {
    email_regex: Regex,
    min_password_length: usize,
}

impl CredentialValidator {
    pub fn new() -> Self {
        Self {
            email_regex: Regex::new(EMAIL_PATTERN).expect("email pattern is valid"),
            min_password_length: MIN_PASSWORD_LENGTH,
        }
    }

    pub fn with_min_password_length(mut self, min: usize) -> Self {
        self.min_password_length = min;
        self
    }

    pub fn is_valid_email(&self, email: &str) -> bool {
        self.email_regex.is_match(email.trim())
    }

    pub fn validate_email(&self, email: &str) -> Result<(), ValidationError> {
        if email.trim().is_empty() {
            return Err(ValidationError::MissingField { field: "email" });
        }
        if !self.is_valid_email(email) {
            return Err(ValidationError::InvalidEmail(email.trim().to_string()));
        }
        Ok(())
    }

    pub fn validate_password(&self, password: &str) -> Result<(), ValidationError> {
        if password.is_empty() {
            return Err(ValidationError::MissingField { field: "password" });
        }
        if password.chars().count() < self.min_password_length {
            return Err(ValidationError::PasswordTooShort {
                min: self.min_password_length,
            });
        }
        Ok(())
    }

    /// Email first, then password; the first problem wins
    pub fn validate_credentials(&self, email: &str, password: &str) -> Result<(), ValidationError> {
        self.validate_email(email)?;
        self.validate_password(password)
    }
}

impl Default for CredentialValidator {
    fn default() -> Self {
        Self::new()
    }
}
