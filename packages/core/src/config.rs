//! Runtime Configuration
//!
//! Settings come from `SECTIONWIKI_*` environment variables, each with a
//! sensible default. Missing or malformed values never abort startup; they
//! log a notice and fall back.
//!
//! `SessionStore::from_config` and `IdentityResolver::from_config` consume
//! the TTL and sign-in deadline values.

use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{info, warn};

/// Runtime settings for the wiki engine
#[derive(Debug, Clone)]
pub struct WikiConfig {
    /// Hosted database URL; when set, the local path is ignored
    pub backend_url: Option<String>,
    /// Local database file path (development, tests)
    pub db_path: PathBuf,
    /// Passphrase-encrypted access-key bundle (base64)
    pub encrypted_access_key: Option<String>,
    /// Session value lifetime, in days
    pub session_ttl_days: i64,
    /// Sign-in deadline, in seconds
    pub sign_in_deadline_secs: u64,
}

impl WikiConfig {
    /// Load settings from the environment
    pub fn load() -> Self {
        Self {
            backend_url: var("SECTIONWIKI_BACKEND_URL").ok(),
            db_path: PathBuf::from(try_load::<String>("SECTIONWIKI_DB_PATH", "./wiki.db")),
            encrypted_access_key: var("SECTIONWIKI_ENCRYPTED_ACCESS_KEY").ok(),
            session_ttl_days: try_load("SECTIONWIKI_SESSION_TTL_DAYS", "7"),
            sign_in_deadline_secs: try_load("SECTIONWIKI_SIGN_IN_DEADLINE_SECS", "20"),
        }
    }
}

impl Default for WikiConfig {
    fn default() -> Self {
        Self {
            backend_url: None,
            db_path: PathBuf::from("./wiki.db"),
            encrypted_access_key: None,
            session_ttl_days: 7,
            sign_in_deadline_secs: 20,
        }
    }
}

/// Install the global tracing subscriber, honoring `RUST_LOG`
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

fn var(key: &str) -> Result<String, ()> {
    env::var(key).map_err(|_| ())
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    let raw = var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    match raw.parse() {
        Ok(value) => value,
        Err(e) => {
            warn!("Invalid {key} value: {e}, using default: {default}");
            default
                .parse()
                .unwrap_or_else(|_| unreachable!("default for {key} must parse"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_environment() {
        let config = WikiConfig::default();
        assert!(config.backend_url.is_none());
        assert_eq!(config.db_path, PathBuf::from("./wiki.db"));
        assert!(config.encrypted_access_key.is_none());
        assert_eq!(config.session_ttl_days, 7);
        assert_eq!(config.sign_in_deadline_secs, 20);
    }

    #[test]
    fn test_malformed_value_falls_back() {
        std::env::set_var("SECTIONWIKI_TEST_NUM", "not-a-number");
        let value: u64 = try_load("SECTIONWIKI_TEST_NUM", "42");
        assert_eq!(value, 42);
        std::env::remove_var("SECTIONWIKI_TEST_NUM");
    }
}
