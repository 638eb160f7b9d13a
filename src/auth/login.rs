//! Login, registration and logout

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::{SessionRecord, UserRecord, UserType};
use crate::infra::{DashboardError, IdentityProvider, Result, SessionStore};

use super::{AuthError, CredentialValidator, LoginRateLimiter};

/// Coordinates validation, the identity provider and the session store.
///
/// A failure at any step leaves the stored session as it was.
pub struct LoginService {
    provider: Arc<dyn IdentityProvider>,
    store: Arc<dyn SessionStore>,
    validator: CredentialValidator,
    limiter: LoginRateLimiter,
}

impl LoginService {
    pub fn new(provider: Arc<dyn IdentityProvider>, store: Arc<dyn SessionStore>) -> Self {
        Self {
            provider,
            store,
            validator: CredentialValidator::new(),
            limiter: LoginRateLimiter::default(),
        }
    }

    pub fn with_rate_limiter(mut self, limiter: LoginRateLimiter) -> Self {
        self.limiter = limiter;
        self
    }

    pub fn validator(&self) -> &CredentialValidator {
        &self.validator
    }

    /// Email/password sign-in
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        user_type: UserType,
    ) -> Result<SessionRecord> {
        self.validator.validate_credentials(email, password)?;
        self.limiter.check(email)?;

        let user = self
            .provider
            .sign_in_with_password(email.trim(), password)
            .await
            .map_err(|e| rejected("password", e))?;

        let record = self.persist(&user, user_type, None).await?;
        self.limiter.reset(email);
        Ok(record)
    }

    /// OAuth popup sign-in (e.g. `google`)
    pub async fn login_with_popup(
        &self,
        provider: &str,
        user_type: UserType,
    ) -> Result<SessionRecord> {
        let user = self
            .provider
            .sign_in_with_popup(provider)
            .await
            .map_err(|e| rejected(provider, e))?;

        self.persist(&user, user_type, Some(provider)).await
    }

    /// Create an account and sign it in
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        user_type: UserType,
    ) -> Result<SessionRecord> {
        self.validator.validate_credentials(email, password)?;

        let user = self
            .provider
            .create_user(email.trim(), password)
            .await
            .map_err(|e| rejected("register", e))?;

        self.persist(&user, user_type, None).await
    }

    /// Sign out at the provider, then forget the stored session
    pub async fn logout(&self) -> Result<()> {
        self.provider
            .sign_out()
            .await
            .map_err(|e| rejected("logout", e))?;
        self.store.clear()?;
        info!("Signed out");
        Ok(())
    }

    pub fn current_session(&self) -> Result<Option<SessionRecord>> {
        self.store.load()
    }

    /// Stored session, or an error when nobody is signed in
    pub fn require_session(&self) -> Result<SessionRecord> {
        self.store
            .load()?
            .ok_or_else(|| DashboardError::Session("not signed in".to_string()))
    }

    /// Store the session; on failure sign the provider back out
    async fn persist(
        &self,
        user: &UserRecord,
        user_type: UserType,
        provider: Option<&str>,
    ) -> Result<SessionRecord> {
        let record = SessionRecord::for_user(user, user_type, provider);
        if let Err(e) = self.store.save(&record) {
            warn!(email = %record.email, error = %e, "Session not stored, signing out");
            if let Err(sign_out) = self.provider.sign_out().await {
                warn!(code = sign_out.code(), "Provider sign-out failed");
            }
            return Err(e);
        }
        info!(
            email = %record.email,
            user_type = %record.user_type,
            landing = record.landing_page(),
            "Signed in"
        );
        Ok(record)
    }
}

fn rejected(method: &str, error: AuthError) -> DashboardError {
    warn!(method, code = error.code(), "Authentication failed");
    DashboardError::Auth(error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{MockIdentityProvider, MockSessionStore, ValidationError};

    fn user() -> UserRecord {
        UserRecord {
            email: "registrar@nitjsr.ac.in".into(),
            uid: "uid-1".into(),
            display_name: None,
        }
    }

    fn service(provider: MockIdentityProvider, store: MockSessionStore) -> LoginService {
        LoginService::new(Arc::new(provider), Arc::new(store))
    }

    #[tokio::test]
    async fn test_invalid_email_never_reaches_provider() {
        let service = service(MockIdentityProvider::new(), MockSessionStore::new());

        let err = service
            .login("not-an-email", "secret1", UserType::Institution)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DashboardError::Validation(ValidationError::InvalidEmail(_))
        ));
    }

    #[tokio::test]
    async fn test_short_password_never_reaches_provider() {
        let service = service(MockIdentityProvider::new(), MockSessionStore::new());

        let err = service
            .register("hr@company.com", "123", UserType::Employer)
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_successful_login_saves_session() {
        let mut provider = MockIdentityProvider::new();
        provider
            .expect_sign_in_with_password()
            .withf(|email, password| email == "registrar@nitjsr.ac.in" && password == "secret1")
            .times(1)
            .returning(|_, _| Ok(user()));

        let mut store = MockSessionStore::new();
        store
            .expect_save()
            .withf(|record| record.display_name == "registrar" && record.provider.is_none())
            .times(1)
            .returning(|_| Ok(()));

        let record = service(provider, store)
            .login(" registrar@nitjsr.ac.in ", "secret1", UserType::Institution)
            .await
            .unwrap();
        assert_eq!(record.landing_page(), "index.html");
    }

    #[tokio::test]
    async fn test_wrong_password_leaves_session() {
        let mut provider = MockIdentityProvider::new();
        provider
            .expect_sign_in_with_password()
            .returning(|_, _| Err(AuthError::WrongPassword));
        let mut store = MockSessionStore::new();
        store.expect_save().times(0);

        let err = service(provider, store)
            .login("registrar@nitjsr.ac.in", "secret9", UserType::Institution)
            .await
            .unwrap_err();
        match err {
            DashboardError::Auth(e) => {
                assert_eq!(e.user_message(), "Incorrect password. Please try again.")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_rate_limit_stops_before_provider() {
        let mut provider = MockIdentityProvider::new();
        provider
            .expect_sign_in_with_password()
            .times(2)
            .returning(|_, _| Err(AuthError::WrongPassword));

        let service = service(provider, MockSessionStore::new())
            .with_rate_limiter(LoginRateLimiter::new(2));

        for _ in 0..2 {
            let _ = service
                .login("registrar@nitjsr.ac.in", "secret9", UserType::Institution)
                .await;
        }
        let err = service
            .login("registrar@nitjsr.ac.in", "secret9", UserType::Institution)
            .await
            .unwrap_err();
        assert!(matches!(err, DashboardError::Auth(AuthError::TooManyRequests)));
    }

    #[tokio::test]
    async fn test_popup_login_records_provider() {
        let mut provider = MockIdentityProvider::new();
        provider
            .expect_sign_in_with_popup()
            .withf(|name| name == "google")
            .returning(|_| {
                Ok(UserRecord {
                    email: "officer@gov.in".into(),
                    uid: "g-7".into(),
                    display_name: Some("Officer".into()),
                })
            });
        let mut store = MockSessionStore::new();
        store.expect_save().times(1).returning(|_| Ok(()));

        let record = service(provider, store)
            .login_with_popup("google", UserType::Government)
            .await
            .unwrap();
        assert_eq!(record.provider.as_deref(), Some("google"));
        assert_eq!(record.landing_page(), "government.html");
    }

    #[tokio::test]
    async fn test_failed_save_signs_provider_out() {
        let mut provider = MockIdentityProvider::new();
        provider
            .expect_sign_in_with_password()
            .returning(|_, _| Ok(user()));
        provider.expect_sign_out().times(1).returning(|| Ok(()));
        let mut store = MockSessionStore::new();
        store.expect_save().times(1).returning(|_| {
            Err(DashboardError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only storage",
            )))
        });

        let err = service(provider, store)
            .login("registrar@nitjsr.ac.in", "secret1", UserType::Institution)
            .await
            .unwrap_err();
        assert!(matches!(err, DashboardError::Io(_)));
    }

    #[tokio::test]
    async fn test_logout_clears_session() {
        let mut provider = MockIdentityProvider::new();
        provider.expect_sign_out().times(1).returning(|| Ok(()));
        let mut store = MockSessionStore::new();
        store.expect_clear().times(1).returning(|| Ok(()));

        service(provider, store).logout().await.unwrap();
    }

    #[tokio::test]
    async fn test_failed_logout_keeps_session() {
        let mut provider = MockIdentityProvider::new();
        provider.expect_sign_out().returning(|| {
            Err(AuthError::from_provider_code(
                "auth/network-request-failed",
                "Network error",
            ))
        });
        let mut store = MockSessionStore::new();
        store.expect_clear().times(0);

        assert!(service(provider, store).logout().await.is_err());
    }

    #[test]
    fn test_require_session() {
        let mut store = MockSessionStore::new();
        store.expect_load().returning(|| Ok(None));

        let err = service(MockIdentityProvider::new(), store)
            .require_session()
            .unwrap_err();
        assert!(matches!(err, DashboardError::Session(_)));
    }
}
