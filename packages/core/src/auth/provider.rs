//! Auth Provider Abstraction
//!
//! Account authentication is delegated to the hosted data service. The
//! `AuthProvider` trait is the seam, mirroring the capability set its client
//! exposes: a current-user accessor, password sign-in, and sign-out. The
//! provider owns the account session; this crate only reads its answers.
//! Tests use [`StaticAuthProvider`] with preset accounts, an in-memory
//! signed-in slot, injectable failures, and artificial latency (for
//! exercising the sign-in timeout).

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// An authenticated account as reported by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
}

/// External authentication backend
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// The currently signed-in account, if any
    ///
    /// # Returns
    ///
    /// - `Ok(Some(user))` while an account session is active
    /// - `Ok(None)` if nobody is signed in or the session was revoked
    /// - `Err(_)` if the provider could not be reached
    async fn current_user(&self) -> Result<Option<AuthUser>>;

    /// Authenticate with email and password, establishing a session
    ///
    /// # Errors
    ///
    /// Returns an error for bad credentials or provider failures; callers
    /// surface both the same way.
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<AuthUser>;

    /// End the current account session on the provider side
    async fn sign_out(&self) -> Result<()>;
}

/// In-memory provider for tests and offline development
pub struct StaticAuthProvider {
    /// email -> (password, user id)
    accounts: HashMap<String, (String, String)>,
    /// The account currently signed in, if any
    signed_in: Mutex<Option<AuthUser>>,
    /// Force `current_user` to return Err (simulates provider outage)
    fail_current_user: AtomicBool,
    /// Artificial latency applied to `sign_in_with_password`
    sign_in_delay: Duration,
}

impl StaticAuthProvider {
    pub fn new() -> Self {
        Self {
            accounts: HashMap::new(),
            signed_in: Mutex::new(None),
            fail_current_user: AtomicBool::new(false),
            sign_in_delay: Duration::ZERO,
        }
    }

    pub fn with_account(mut self, email: &str, password: &str, user_id: &str) -> Self {
        self.accounts
            .insert(email.to_string(), (password.to_string(), user_id.to_string()));
        self
    }

    pub fn with_sign_in_delay(mut self, delay: Duration) -> Self {
        self.sign_in_delay = delay;
        self
    }

    /// Start with an account session already active
    pub fn with_signed_in(self, email: &str, user_id: &str) -> Self {
        *self.signed_in.lock().unwrap() = Some(AuthUser {
            id: user_id.to_string(),
            email: email.to_string(),
        });
        self
    }

    /// Make subsequent `current_user` calls fail (unreachable provider)
    pub fn break_current_user(&self) {
        self.fail_current_user.store(true, Ordering::SeqCst);
    }

    /// Revoke the active session without going through `sign_out`
    pub fn revoke_session(&self) {
        *self.signed_in.lock().unwrap() = None;
    }
}

impl Default for StaticAuthProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuthProvider for StaticAuthProvider {
    async fn current_user(&self) -> Result<Option<AuthUser>> {
        if self.fail_current_user.load(Ordering::SeqCst) {
            return Err(anyhow::anyhow!("Auth provider unreachable"));
        }

        Ok(self.signed_in.lock().unwrap().clone())
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<AuthUser> {
        if !self.sign_in_delay.is_zero() {
            tokio::time::sleep(self.sign_in_delay).await;
        }

        match self.accounts.get(email) {
            Some((stored_password, user_id)) if stored_password == password => {
                let user = AuthUser {
                    id: user_id.clone(),
                    email: email.to_string(),
                };
                *self.signed_in.lock().unwrap() = Some(user.clone());
                Ok(user)
            }
            _ => Err(anyhow::anyhow!("Invalid email or password")),
        }
    }

    async fn sign_out(&self) -> Result<()> {
        *self.signed_in.lock().unwrap() = None;
        Ok(())
    }
}
