//! Authentication for the TrueCred portals
//!
//! Sign-in is delegated to an [`IdentityProvider`](crate::infra::IdentityProvider)
//! (email/password or an OAuth popup). This module owns everything around
//! that call:
//!
//! - **Validation**: email shape and password length are checked before
//!   the provider is contacted
//! - **Rate limiting**: a per-email attempt budget per minute
//! - **Error mapping**: provider error codes become [`AuthError`] kinds with
//!   fixed user-facing messages
//! - **Session persistence**: a successful sign-in writes a
//!   [`SessionRecord`](crate::domain::SessionRecord) to a
//!   [`SessionStore`](crate::infra::SessionStore)
//!
//! # Configuration
//!
//! - `TRUECRED_LOGIN_ATTEMPTS_PER_MINUTE`: attempt budget (default 10)
//! - `TRUECRED_SESSION_FILE`: JSON file backing the session store

mod login;
mod provider;
mod rate_limit;
mod session_store;
mod validation;

pub use login::*;
pub use provider::*;
pub use rate_limit::*;
pub use session_store::*;
pub use validation::*;

/// Authentication error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("user not found")]
    UserNotFound,

    #[error("wrong password")]
    WrongPassword,

    #[error("invalid email")]
    InvalidEmail,

    #[error("too many requests")]
    TooManyRequests,

    #[error("popup closed by user")]
    PopupClosed,

    #[error("popup already open")]
    PopupAlreadyOpen,

    #[error("{code}: {message}")]
    Other { code: String, message: String },
}

impl AuthError {
    /// Map a provider error code (`auth/...`) to an error kind.
    ///
    /// Unknown codes keep the provider's own message.
    pub fn from_provider_code(code: &str, message: impl Into<String>) -> Self {
        match code {
            "auth/user-not-found" => AuthError::UserNotFound,
            "auth/wrong-password" => AuthError::WrongPassword,
            "auth/invalid-email" => AuthError::InvalidEmail,
            "auth/too-many-requests" => AuthError::TooManyRequests,
            "auth/popup-closed-by-user" => AuthError::PopupClosed,
            "auth/cancelled-popup-request" => AuthError::PopupAlreadyOpen,
            other => AuthError::Other {
                code: other.to_string(),
                message: message.into(),
            },
        }
    }

    /// Provider code this error corresponds to
    pub fn code(&self) -> &str {
        match self {
            AuthError::UserNotFound => "auth/user-not-found",
            AuthError::WrongPassword => "auth/wrong-password",
            AuthError::InvalidEmail => "auth/invalid-email",
            AuthError::TooManyRequests => "auth/too-many-requests",
            AuthError::PopupClosed => "auth/popup-closed-by-user",
            AuthError::PopupAlreadyOpen => "auth/cancelled-popup-request",
            AuthError::Other { code, .. } => code,
        }
    }

    /// Message shown to the user
    pub fn user_message(&self) -> String {
        match self {
            AuthError::UserNotFound => "No account found with this email address.".to_string(),
            AuthError::WrongPassword => "Incorrect password. Please try again.".to_string(),
            AuthError::InvalidEmail => "Invalid email address format.".to_string(),
            AuthError::TooManyRequests => {
                "Too many failed attempts. Please try again later.".to_string()
            }
            AuthError::PopupClosed => "Sign-in popup was closed.".to_string(),
            AuthError::PopupAlreadyOpen => "Another sign-in popup is already open.".to_string(),
            AuthError::Other { message, .. } => message.clone(),
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, AuthError::TooManyRequests)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codes_map_to_kinds() {
        let cases = [
            ("auth/user-not-found", AuthError::UserNotFound),
            ("auth/wrong-password", AuthError::WrongPassword),
            ("auth/invalid-email", AuthError::InvalidEmail),
            ("auth/too-many-requests", AuthError::TooManyRequests),
            ("auth/popup-closed-by-user", AuthError::PopupClosed),
            ("auth/cancelled-popup-request", AuthError::PopupAlreadyOpen),
        ];
        for (code, expected) in cases {
            let error = AuthError::from_provider_code(code, "ignored");
            assert_eq!(error, expected);
            assert_eq!(error.code(), code);
        }
    }

    #[test]
    fn test_unknown_code_keeps_provider_message() {
        let error = AuthError::from_provider_code("auth/network-request-failed", "Network down");
        assert_eq!(error.code(), "auth/network-request-failed");
        assert_eq!(error.user_message(), "Network down");
    }

    #[test]
    fn test_user_messages() {
        assert_eq!(
            AuthError::WrongPassword.user_message(),
            "Incorrect password. Please try again."
        );
        assert_eq!(
            AuthError::TooManyRequests.user_message(),
            "Too many failed attempts. Please try again later."
        );
        assert!(AuthError::TooManyRequests.is_rate_limited());
    }
}
