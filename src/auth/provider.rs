//! In-memory identity provider for demos and tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use crate::domain::UserRecord;
use crate::infra::IdentityProvider;

use super::AuthError;

struct Account {
    password: String,
    user: UserRecord,
}

/// Accounts held in a map, popup sign-ins scripted per provider name.
///
/// A popup stays "open" for `popup_delay`; a second popup request during
/// that time fails with [`AuthError::PopupAlreadyOpen`].
pub struct InMemoryIdentityProvider {
    accounts: RwLock<HashMap<String, Account>>,
    popup_users: RwLock<HashMap<String, UserRecord>>,
    popup_open: AtomicBool,
    popup_delay: Duration,
    signed_in: RwLock<Option<UserRecord>>,
}

impl InMemoryIdentityProvider {
    pub fn new() -> Self {
        Self {
            accounts: RwLock::new(HashMap::new()),
            popup_users: RwLock::new(HashMap::new()),
            popup_open: AtomicBool::new(false),
            popup_delay: Duration::ZERO,
            signed_in: RwLock::new(None),
        }
    }

    /// Pre-register an email/password account
    pub fn with_account(self, email: &str, password: &str, display_name: Option<&str>) -> Self {
        let user = UserRecord {
            email: email.to_string(),
            uid: Uuid::new_v4().to_string(),
            display_name: display_name.map(str::to_string),
        };
        self.accounts
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                email.to_lowercase(),
                Account {
                    password: password.to_string(),
                    user,
                },
            );
        self
    }

    /// User returned when a popup for `provider` completes
    pub fn with_popup_user(self, provider: &str, user: UserRecord) -> Self {
        self.popup_users
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(provider.to_string(), user);
        self
    }

    pub fn with_popup_delay(mut self, delay: Duration) -> Self {
        self.popup_delay = delay;
        self
    }

    /// User of the provider-side session, if any
    pub fn current_user(&self) -> Option<UserRecord> {
        self.signed_in
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_signed_in(&self, user: Option<UserRecord>) {
        *self.signed_in.write().unwrap_or_else(PoisonError::into_inner) = user;
    }
}

impl Default for InMemoryIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// Clears the popup flag when the popup future ends
struct PopupGuard<'a>(&'a AtomicBool);

impl Drop for PopupGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<UserRecord, AuthError> {
        let user = {
            let accounts = self.accounts.read().unwrap_or_else(PoisonError::into_inner);
            let account = accounts
                .get(&email.trim().to_lowercase())
                .ok_or(AuthError::UserNotFound)?;
            if account.password != password {
                return Err(AuthError::WrongPassword);
            }
            account.user.clone()
        };

        self.set_signed_in(Some(user.clone()));
        Ok(user)
    }

    async fn sign_in_with_popup(&self, provider: &str) -> Result<UserRecord, AuthError> {
        if self.popup_open.swap(true, Ordering::SeqCst) {
            return Err(AuthError::PopupAlreadyOpen);
        }
        let _guard = PopupGuard(&self.popup_open);

        if !self.popup_delay.is_zero() {
            tokio::time::sleep(self.popup_delay).await;
        }

        let user = self
            .popup_users
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(provider)
            .cloned()
            .ok_or(AuthError::PopupClosed)?;

        debug!(provider, email = %user.email, "Popup sign-in completed");
        self.set_signed_in(Some(user.clone()));
        Ok(user)
    }

    async fn create_user(&self, email: &str, password: &str) -> Result<UserRecord, AuthError> {
        let key = email.trim().to_lowercase();
        let user = {
            let mut accounts = self.accounts.write().unwrap_or_else(PoisonError::into_inner);
            if accounts.contains_key(&key) {
                return Err(AuthError::from_provider_code(
                    "auth/email-already-in-use",
                    "The email address is already in use by another account.",
                ));
            }
            let user = UserRecord {
                email: email.trim().to_string(),
                uid: Uuid::new_v4().to_string(),
                display_name: None,
            };
            accounts.insert(
                key,
                Account {
                    password: password.to_string(),
                    user: user.clone(),
                },
            );
            user
        };

        self.set_signed_in(Some(user.clone()));
        Ok(user)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.set_signed_in(None);
        Ok(())
    }
}
