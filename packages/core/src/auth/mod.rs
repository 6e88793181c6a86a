//! Authentication and Credential Bootstrap
//!
//! Three concerns live here:
//!
//! - `credentials`: passphrase-gated decryption of the database access key
//! - `session`: the per-visitor value store with expiry
//! - `provider`: the external account authentication seam

mod credentials;
mod provider;
mod session;

pub use credentials::{decrypt_access_key, encrypt_access_key, AccessKey, CredentialError};
pub use provider::{AuthProvider, AuthUser, StaticAuthProvider};
pub use session::{SessionKey, SessionStore, DEFAULT_SESSION_TTL_DAYS};
