//! Identity Resolution Service
//!
//! Turns session state into an explicit [`ResolvedIdentity`] and handles
//! sign-in/sign-out against the auth provider. Apart from the missing access
//! key (the "back to the unlock screen" terminal), resolution never fails:
//! every path lands on either an authenticated identity or a named anonymous
//! transition, so callers always have a concrete identity to act as.
//!
//! # Resolution rules
//!
//! 1. No unlocked access key in the session → `NotAuthenticated` error
//! 2. Anonymous browsing was chosen at unlock → `Anonymous(Requested)`,
//!    no provider call
//! 3. Provider reports a signed-in account → `Authenticated`, with username
//!    and section rights from the profile row (a missing row degrades the
//!    username to "unknown user" with empty rights, still authenticated)
//! 4. Provider reports nobody → `Anonymous(NoUser)`
//! 5. Provider unreachable → `Anonymous(AuthCheckFailed)` with a warning
//!
//! Sign-in is wrapped in a bounded timeout (20 seconds by default) so a hung
//! provider surfaces as a `Timeout` error instead of blocking forever.

use crate::auth::{AuthProvider, AuthUser, SessionStore};
use crate::db::WikiStore;
use crate::models::{AnonymousReason, Identity, ResolvedIdentity, ValidationError};
use crate::services::WikiServiceError;
use regex::Regex;
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default deadline for a sign-in attempt
pub const DEFAULT_SIGN_IN_TIMEOUT_SECS: u64 = 20;

/// Minimum accepted password length
pub const MIN_PASSWORD_LEN: usize = 6;

/// Compiled email shape check (full validation is the provider's job)
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

/// Resolves the acting identity and manages sign-in/sign-out
pub struct IdentityResolver {
    auth: Arc<dyn AuthProvider>,
    store: Arc<dyn WikiStore>,
    sign_in_timeout: Duration,
}

impl IdentityResolver {
    pub fn new(auth: Arc<dyn AuthProvider>, store: Arc<dyn WikiStore>) -> Self {
        Self {
            auth,
            store,
            sign_in_timeout: Duration::from_secs(DEFAULT_SIGN_IN_TIMEOUT_SECS),
        }
    }

    /// Override the sign-in deadline (tests use milliseconds)
    pub fn with_sign_in_timeout(mut self, timeout: Duration) -> Self {
        self.sign_in_timeout = timeout;
        self
    }

    /// Build a resolver with the configured sign-in deadline
    pub fn from_config(
        auth: Arc<dyn AuthProvider>,
        store: Arc<dyn WikiStore>,
        config: &crate::config::WikiConfig,
    ) -> Self {
        Self::new(auth, store)
            .with_sign_in_timeout(Duration::from_secs(config.sign_in_deadline_secs))
    }

    /// Resolve the acting identity from session state
    ///
    /// # Errors
    ///
    /// Only `NotAuthenticated`, when no unlocked access key is present;
    /// the caller sends the visitor back to the unlock screen. Auth failures
    /// past that point degrade to anonymous with the reason recorded, they
    /// never abort the request.
    pub async fn resolve(
        &self,
        session: &mut SessionStore,
    ) -> Result<ResolvedIdentity, WikiServiceError> {
        if session.access_key().is_none() {
            return Err(WikiServiceError::NotAuthenticated);
        }

        if session.anonymous_requested() {
            debug!("identity resolved: anonymous by request");
            return Ok(ResolvedIdentity::anonymous(AnonymousReason::Requested));
        }

        match self.auth.current_user().await {
            Ok(Some(user)) => {
                let identity = self.populate_identity(user).await;
                if let (Some(id), Some(email)) = (&identity.id, &identity.email) {
                    session.remember_sign_in(id, email);
                }
                debug!(username = %identity.username, "identity resolved: authenticated");
                Ok(ResolvedIdentity::authenticated(identity))
            }
            Ok(None) => {
                debug!("identity resolved: no account session");
                session.clear_user();
                Ok(ResolvedIdentity::anonymous(AnonymousReason::NoUser))
            }
            Err(e) => {
                warn!(error = %e, "auth check failed, degrading to anonymous");
                session.clear_user();
                Ok(ResolvedIdentity::anonymous(AnonymousReason::AuthCheckFailed))
            }
        }
    }

    /// Sign in with email and password
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` for a malformed email or a short password, before
    ///   the provider is contacted
    /// - `Timeout` if the provider does not answer within the deadline
    /// - `AuthFailed` for bad credentials or provider failures
    pub async fn sign_in(
        &self,
        session: &mut SessionStore,
        email: &str,
        password: &str,
    ) -> Result<ResolvedIdentity, WikiServiceError> {
        if !EMAIL_RE.is_match(email) {
            return Err(ValidationError::InvalidEmail(email.to_string()).into());
        }
        if password.len() < MIN_PASSWORD_LEN {
            return Err(ValidationError::PasswordTooShort(MIN_PASSWORD_LEN).into());
        }

        let attempt = tokio::time::timeout(
            self.sign_in_timeout,
            self.auth.sign_in_with_password(email, password),
        );

        let user = match attempt.await {
            Ok(Ok(user)) => user,
            Ok(Err(e)) => {
                info!(email = %email, "sign-in rejected");
                return Err(WikiServiceError::auth_failed(e.to_string()));
            }
            Err(_) => {
                warn!(email = %email, "sign-in timed out");
                return Err(WikiServiceError::timeout(
                    "sign-in",
                    self.sign_in_timeout.as_secs(),
                ));
            }
        };

        session.remember_sign_in(&user.id, &user.email);
        let identity = self.populate_identity(user).await;
        info!(username = %identity.username, "signed in");

        Ok(ResolvedIdentity::authenticated(identity))
    }

    /// Sign out and drop all session state
    ///
    /// Provider-side invalidation is best effort: the session is cleared even
    /// if the provider cannot be reached.
    pub async fn sign_out(&self, session: &mut SessionStore) {
        if let Err(e) = self.auth.sign_out().await {
            warn!(error = %e, "provider sign-out failed, clearing session anyway");
        } else {
            info!("signed out");
        }
        session.clear();
    }

    /// Attach profile-derived username and section rights to an account
    ///
    /// A missing or unreadable profile row degrades the username to the
    /// "unknown user" sentinel with empty rights; the identity stays
    /// authenticated.
    async fn populate_identity(&self, user: AuthUser) -> Identity {
        match self.store.get_profile(&user.id).await {
            Ok(Some(profile)) => Identity::account(
                user.id,
                user.email,
                profile.username,
                profile.visit_sections,
                profile.admin_sections,
            ),
            Ok(None) => {
                debug!(user_id = %user.id, "no profile row, using sentinel username");
                Identity::account_without_profile(user.id, user.email)
            }
            Err(e) => {
                warn!(user_id = %user.id, error = %e, "profile lookup failed, using sentinel username");
                Identity::account_without_profile(user.id, user.email)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AccessKey, StaticAuthProvider};
    use crate::db::{DatabaseService, TursoStore};
    use crate::models::{Profile, Resolution, UNKNOWN_USER};
    use tempfile::TempDir;

    async fn test_store() -> (Arc<dyn WikiStore>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let db = Arc::new(DatabaseService::new(db_path).await.unwrap());
        let store: Arc<dyn WikiStore> = Arc::new(TursoStore::new(db));
        (store, temp_dir)
    }

    fn unlocked_session() -> SessionStore {
        let mut session = SessionStore::new();
        session.remember_unlock(&AccessKey::new("sk_test".to_string()), false);
        session
    }

    #[tokio::test]
    async fn test_resolve_without_access_key() {
        let (store, _tmp) = test_store().await;
        let resolver = IdentityResolver::new(Arc::new(StaticAuthProvider::new()), store);
        let mut session = SessionStore::new();

        let err = resolver.resolve(&mut session).await.unwrap_err();
        assert!(matches!(err, WikiServiceError::NotAuthenticated));
    }

    #[tokio::test]
    async fn test_resolve_anonymous_by_request() {
        let (store, _tmp) = test_store().await;
        let resolver = IdentityResolver::new(Arc::new(StaticAuthProvider::new()), store);
        let mut session = SessionStore::new();
        session.remember_unlock(&AccessKey::new("sk_test".to_string()), true);

        let resolved = resolver.resolve(&mut session).await.unwrap();
        assert_eq!(
            resolved.resolution,
            Resolution::Anonymous {
                reason: AnonymousReason::Requested
            }
        );
        assert!(resolved.identity.is_anonymous);
        assert!(!resolved.is_degraded());
    }

    #[tokio::test]
    async fn test_resolve_no_account_session() {
        let (store, _tmp) = test_store().await;
        let resolver = IdentityResolver::new(Arc::new(StaticAuthProvider::new()), store);
        let mut session = unlocked_session();

        let resolved = resolver.resolve(&mut session).await.unwrap();
        assert_eq!(
            resolved.resolution,
            Resolution::Anonymous {
                reason: AnonymousReason::NoUser
            }
        );
    }

    #[tokio::test]
    async fn test_resolve_authenticated_with_profile() {
        let (store, _tmp) = test_store().await;
        let mut profile = Profile::new("u-1".to_string(), "alice".to_string());
        profile.visit_sections = vec!["marketing".to_string()];
        profile.admin_sections = vec!["marketing".to_string()];
        store.upsert_profile(profile).await.unwrap();

        let provider = StaticAuthProvider::new().with_signed_in("alice@example.com", "u-1");
        let resolver = IdentityResolver::new(Arc::new(provider), store);
        let mut session = unlocked_session();

        let resolved = resolver.resolve(&mut session).await.unwrap();
        assert_eq!(resolved.resolution, Resolution::Authenticated);
        assert_eq!(resolved.identity.username, "alice");
        assert!(resolved.identity.can_visit("marketing"));
        assert!(resolved.identity.is_admin_of("marketing"));
        // Session hints refreshed for the next load
        assert_eq!(
            session.user(),
            Some(("u-1".to_string(), "alice@example.com".to_string()))
        );
    }

    #[tokio::test]
    async fn test_resolve_authenticated_without_profile() {
        let (store, _tmp) = test_store().await;
        let provider = StaticAuthProvider::new().with_signed_in("ghost@example.com", "ghost");
        let resolver = IdentityResolver::new(Arc::new(provider), store);
        let mut session = unlocked_session();

        let resolved = resolver.resolve(&mut session).await.unwrap();
        // Still authenticated, but with the sentinel name and no rights
        assert_eq!(resolved.resolution, Resolution::Authenticated);
        assert_eq!(resolved.identity.username, UNKNOWN_USER);
        assert!(!resolved.identity.can_visit("marketing"));
        assert!(resolved.identity.can_visit("all"));
    }

    #[tokio::test]
    async fn test_resolve_degrades_when_provider_fails() {
        let (store, _tmp) = test_store().await;
        let provider = Arc::new(StaticAuthProvider::new().with_signed_in("alice@example.com", "u-1"));
        let resolver = IdentityResolver::new(provider.clone(), store);
        let mut session = unlocked_session();
        session.remember_sign_in("u-1", "alice@example.com");
        provider.break_current_user();

        let resolved = resolver.resolve(&mut session).await.unwrap();
        assert!(resolved.is_degraded());
        assert!(resolved.identity.is_anonymous);
        // Stale account hints are dropped
        assert!(session.user().is_none());
    }

    #[tokio::test]
    async fn test_sign_in_validation() {
        let (store, _tmp) = test_store().await;
        let resolver = IdentityResolver::new(Arc::new(StaticAuthProvider::new()), store);
        let mut session = unlocked_session();

        let err = resolver
            .sign_in(&mut session, "not-an-email", "hunter22")
            .await
            .unwrap_err();
        assert!(matches!(err, WikiServiceError::ValidationFailed(_)));

        let err = resolver
            .sign_in(&mut session, "alice@example.com", "short")
            .await
            .unwrap_err();
        assert!(matches!(err, WikiServiceError::ValidationFailed(_)));
    }

    #[tokio::test]
    async fn test_sign_in_success_updates_session() {
        let (store, _tmp) = test_store().await;
        let mut profile = Profile::new("u-1".to_string(), "alice".to_string());
        profile.visit_sections = vec!["marketing".to_string()];
        store.upsert_profile(profile).await.unwrap();

        let provider = StaticAuthProvider::new().with_account("alice@example.com", "hunter22", "u-1");
        let resolver = IdentityResolver::new(Arc::new(provider), store);
        let mut session = SessionStore::new();
        session.remember_unlock(&AccessKey::new("sk_test".to_string()), true);

        let resolved = resolver
            .sign_in(&mut session, "alice@example.com", "hunter22")
            .await
            .unwrap();

        assert_eq!(resolved.resolution, Resolution::Authenticated);
        assert_eq!(resolved.identity.username, "alice");
        // The anonymous unlock choice is replaced by the account session
        assert!(!session.anonymous_requested());
        assert_eq!(
            session.user(),
            Some(("u-1".to_string(), "alice@example.com".to_string()))
        );
    }

    #[tokio::test]
    async fn test_sign_in_rejected() {
        let (store, _tmp) = test_store().await;
        let provider = StaticAuthProvider::new().with_account("alice@example.com", "hunter22", "u-1");
        let resolver = IdentityResolver::new(Arc::new(provider), store);
        let mut session = unlocked_session();

        let err = resolver
            .sign_in(&mut session, "alice@example.com", "wrong-password")
            .await
            .unwrap_err();
        assert!(matches!(err, WikiServiceError::AuthFailed(_)));
        assert!(session.user().is_none());
    }

    #[tokio::test]
    async fn test_sign_in_timeout() {
        let (store, _tmp) = test_store().await;
        let provider = StaticAuthProvider::new()
            .with_account("alice@example.com", "hunter22", "u-1")
            .with_sign_in_delay(Duration::from_millis(200));
        let resolver = IdentityResolver::new(Arc::new(provider), store)
            .with_sign_in_timeout(Duration::from_millis(10));
        let mut session = unlocked_session();

        let err = resolver
            .sign_in(&mut session, "alice@example.com", "hunter22")
            .await
            .unwrap_err();
        assert!(matches!(err, WikiServiceError::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_deadline_from_config() {
        let (store, _tmp) = test_store().await;
        let mut config = crate::config::WikiConfig::default();
        config.sign_in_deadline_secs = 5;

        let resolver =
            IdentityResolver::from_config(Arc::new(StaticAuthProvider::new()), store, &config);
        assert_eq!(resolver.sign_in_timeout, Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_sign_out_clears_session() {
        let (store, _tmp) = test_store().await;
        let provider = StaticAuthProvider::new().with_signed_in("alice@example.com", "u-1");
        let resolver = IdentityResolver::new(Arc::new(provider), store);
        let mut session = unlocked_session();
        session.remember_sign_in("u-1", "alice@example.com");

        resolver.sign_out(&mut session).await;
        assert!(session.user().is_none());
        assert!(session.access_key().is_none());
    }
}
