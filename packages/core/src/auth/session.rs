//! Session Value Store
//!
//! Holds the small set of values that survive between requests: the unlocked
//! database access key, the anonymous-browsing flag, and the signed-in
//! account's id and email. A web front-end backs these with cookies; here
//! they live in an in-process store with the same expiry semantics.
//!
//! Each value carries its own expiry (seven days by default). Reading an
//! expired value behaves exactly like reading a missing one, so callers never
//! see stale identity data.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

/// Default lifetime for session values
pub const DEFAULT_SESSION_TTL_DAYS: i64 = 7;

/// The named slots a session can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionKey {
    /// Unlocked database access key
    AccessKey,
    /// The visitor explicitly chose anonymous browsing
    AnonymousRequested,
    /// Signed-in account id
    UserId,
    /// Signed-in account email
    UserEmail,
}

#[derive(Debug, Clone)]
struct SessionValue {
    value: String,
    expires_at: DateTime<Utc>,
}

/// In-process store for session values with per-value expiry
#[derive(Debug, Clone)]
pub struct SessionStore {
    values: HashMap<SessionKey, SessionValue>,
    ttl: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
            ttl: Duration::days(DEFAULT_SESSION_TTL_DAYS),
        }
    }

    /// Override the default expiry (tests, short-lived kiosk sessions)
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            values: HashMap::new(),
            ttl,
        }
    }

    /// A store whose values expire per the configured session TTL
    pub fn from_config(config: &crate::config::WikiConfig) -> Self {
        Self::with_ttl(Duration::days(config.session_ttl_days))
    }

    /// Store a value with the default expiry
    pub fn set(&mut self, key: SessionKey, value: String) {
        self.values.insert(
            key,
            SessionValue {
                value,
                expires_at: Utc::now() + self.ttl,
            },
        );
    }

    /// Read a value; expired values read as absent and are dropped
    pub fn get(&mut self, key: SessionKey) -> Option<String> {
        match self.values.get(&key) {
            Some(v) if v.expires_at > Utc::now() => Some(v.value.clone()),
            Some(_) => {
                self.values.remove(&key);
                None
            }
            None => None,
        }
    }

    /// Remove a single value
    pub fn remove(&mut self, key: SessionKey) {
        self.values.remove(&key);
    }

    /// Drop everything (sign-out)
    pub fn clear(&mut self) {
        self.values.clear();
    }

    //
    // CONVENIENCE ACCESSORS
    //

    /// Record a successful credential unlock
    ///
    /// Stores the access key and the anonymous/account browsing choice made
    /// at unlock time.
    pub fn remember_unlock(&mut self, access_key: &crate::auth::AccessKey, anonymous: bool) {
        self.set(SessionKey::AccessKey, access_key.expose_secret().to_string());
        if anonymous {
            self.request_anonymous();
        } else {
            self.remove(SessionKey::AnonymousRequested);
        }
    }

    /// The unlocked access key, if present and live
    pub fn access_key(&mut self) -> Option<String> {
        self.get(SessionKey::AccessKey)
    }

    /// Record a successful sign-in
    pub fn remember_sign_in(&mut self, user_id: &str, email: &str) {
        self.remove(SessionKey::AnonymousRequested);
        self.set(SessionKey::UserId, user_id.to_string());
        self.set(SessionKey::UserEmail, email.to_string());
    }

    /// Record an explicit choice to browse anonymously
    pub fn request_anonymous(&mut self) {
        self.remove(SessionKey::UserId);
        self.remove(SessionKey::UserEmail);
        self.set(SessionKey::AnonymousRequested, "1".to_string());
    }

    /// Drop only the account values (auth degradation path)
    pub fn clear_user(&mut self) {
        self.remove(SessionKey::UserId);
        self.remove(SessionKey::UserEmail);
    }

    /// Whether the visitor asked for anonymous browsing
    pub fn anonymous_requested(&mut self) -> bool {
        self.get(SessionKey::AnonymousRequested).is_some()
    }

    /// Signed-in account as (id, email), if both values are present and live
    pub fn user(&mut self) -> Option<(String, String)> {
        let id = self.get(SessionKey::UserId)?;
        let email = self.get(SessionKey::UserEmail)?;
        Some((id, email))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_clear() {
        let mut session = SessionStore::new();
        session.set(SessionKey::UserId, "u-1".to_string());

        assert_eq!(session.get(SessionKey::UserId), Some("u-1".to_string()));
        assert_eq!(session.get(SessionKey::UserEmail), None);

        session.clear();
        assert_eq!(session.get(SessionKey::UserId), None);
    }

    #[test]
    fn test_ttl_from_config() {
        let mut config = crate::config::WikiConfig::default();
        config.session_ttl_days = 0;

        // A zero-day TTL expires values immediately
        let mut session = SessionStore::from_config(&config);
        session.set(SessionKey::AccessKey, "k".to_string());
        assert_eq!(session.get(SessionKey::AccessKey), None);
    }

    #[test]
    fn test_expired_value_reads_as_absent() {
        let mut session = SessionStore::with_ttl(Duration::microseconds(-1));
        session.set(SessionKey::AccessKey, "k".to_string());

        assert_eq!(session.get(SessionKey::AccessKey), None);
    }

    #[test]
    fn test_sign_in_replaces_anonymous_choice() {
        let mut session = SessionStore::new();
        session.request_anonymous();
        assert!(session.anonymous_requested());

        session.remember_sign_in("u-1", "alice@example.com");
        assert!(!session.anonymous_requested());
        assert_eq!(
            session.user(),
            Some(("u-1".to_string(), "alice@example.com".to_string()))
        );
    }

    #[test]
    fn test_unlock_stores_key_and_choice() {
        let mut session = SessionStore::new();
        let key = crate::auth::AccessKey::new("sk_live_123".to_string());

        session.remember_unlock(&key, true);
        assert_eq!(session.access_key(), Some("sk_live_123".to_string()));
        assert!(session.anonymous_requested());

        session.remember_unlock(&key, false);
        assert!(!session.anonymous_requested());
    }

    #[test]
    fn test_anonymous_choice_clears_user() {
        let mut session = SessionStore::new();
        session.remember_sign_in("u-1", "alice@example.com");

        session.request_anonymous();
        assert!(session.user().is_none());
    }
}
