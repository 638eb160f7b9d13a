//! Signed-in user and persisted session types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fixed storage key the session record is kept under
pub const SESSION_STORAGE_KEY: &str = "truecred_user";

/// Which portal the user signs in to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserType {
    Institution,
    Employer,
    Government,
}

impl UserType {
    /// Page the user lands on after signing in
    pub fn landing_page(&self) -> &'static str {
        match self {
            UserType::Institution => "index.html",
            UserType::Employer => "public.html",
            UserType::Government => "government.html",
        }
    }

    /// Example address shown in the email field
    pub fn email_placeholder(&self) -> &'static str {
        match self {
            UserType::Institution => "registrar@university.edu",
            UserType::Employer => "hr@company.com",
            UserType::Government => "officer@gov.in",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::Institution => "institution",
            UserType::Employer => "employer",
            UserType::Government => "government",
        }
    }
}

impl Default for UserType {
    fn default() -> Self {
        UserType::Institution
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "institution" => Ok(UserType::Institution),
            "employer" => Ok(UserType::Employer),
            "government" => Ok(UserType::Government),
            other => Err(format!("unknown user type: {other}")),
        }
    }
}

/// User as reported by the identity provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub email: String,
    pub uid: String,
    pub display_name: Option<String>,
}

/// Persisted client-side session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub email: String,
    pub uid: String,
    pub user_type: UserType,
    pub login_time: DateTime<Utc>,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

impl SessionRecord {
    /// Build a session for a freshly signed-in user.
    ///
    /// The display name falls back to the local part of the email.
    pub fn for_user(user: &UserRecord, user_type: UserType, provider: Option<&str>) -> Self {
        let display_name = user
            .display_name
            .clone()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| email_local_part(&user.email).to_string());

        Self {
            email: user.email.clone(),
            uid: user.uid.clone(),
            user_type,
            login_time: Utc::now(),
            display_name,
            provider: provider.map(str::to_string),
        }
    }

    pub fn landing_page(&self) -> &'static str {
        self.user_type.landing_page()
    }
}

fn email_local_part(email: &str) -> &str {
    email.split('@').next().unwrap_or(email)
}
