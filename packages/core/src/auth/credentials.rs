//! Passphrase-Gated Credential Bootstrap
//!
//! The database access key is shipped as an encrypted bundle rather than
//! baked into the client. A user passphrase unlocks it:
//!
//! ```text
//! bundle = base64( salt(16) ‖ nonce(12) ‖ tag(16) ‖ ciphertext )
//! key    = PBKDF2-HMAC-SHA256(passphrase, salt, 100_000 iterations)
//! ```
//!
//! AES-256-GCM authenticates the ciphertext, so a wrong passphrase and a
//! tampered bundle are indistinguishable; both surface as the same opaque
//! [`CredentialError::Decryption`], which is exactly what callers should show
//! the user.

use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Key, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;
const PBKDF2_ITERATIONS: u32 = 100_000;

/// Errors from credential bundle handling
///
/// Deliberately a single opaque variant: distinguishing a wrong passphrase
/// from a malformed or tampered bundle would help an attacker probing
/// bundles offline.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CredentialError {
    /// Wrong passphrase, malformed bundle, or tampered bundle
    #[error("Could not unlock credentials")]
    Decryption,
}

/// Decrypted database access key
///
/// Wraps the secret so it is zeroized when dropped and never shows up in
/// `Debug` output or logs.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct AccessKey(String);

impl AccessKey {
    pub fn new(secret: String) -> Self {
        Self(secret)
    }

    /// Access the raw secret. Callers should hold the result only as long as
    /// needed to open the database connection.
    pub fn expose_secret(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AccessKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessKey(REDACTED)")
    }
}

/// Derive the AES-256 key from a passphrase and salt
fn derive_key(passphrase: &str, salt: &[u8]) -> [u8; 32] {
    let mut key = [0u8; 32];
    pbkdf2_hmac::<Sha256>(passphrase.as_bytes(), salt, PBKDF2_ITERATIONS, &mut key);
    key
}

/// Decrypt a credential bundle with the given passphrase
///
/// # Errors
///
/// [`CredentialError::Decryption`] for every failure: bad base64, a short
/// bundle, a wrong passphrase, a tampered bundle, or a payload that is not
/// valid UTF-8. Callers cannot tell the cases apart, on purpose.
pub fn decrypt_access_key(bundle: &str, passphrase: &str) -> Result<AccessKey, CredentialError> {
    let raw = BASE64
        .decode(bundle.trim())
        .map_err(|_| CredentialError::Decryption)?;

    if raw.len() < SALT_LEN + NONCE_LEN + TAG_LEN {
        return Err(CredentialError::Decryption);
    }

    let (salt, rest) = raw.split_at(SALT_LEN);
    let (nonce, rest) = rest.split_at(NONCE_LEN);
    let (tag, ciphertext) = rest.split_at(TAG_LEN);

    let mut key_bytes = derive_key(passphrase, salt);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key_bytes));

    // The bundle stores the GCM tag before the ciphertext; the cipher expects
    // ciphertext ‖ tag, so reassemble before decrypting.
    let mut sealed = Vec::with_capacity(ciphertext.len() + TAG_LEN);
    sealed.extend_from_slice(ciphertext);
    sealed.extend_from_slice(tag);

    let plaintext = cipher
        .decrypt(Nonce::from_slice(nonce), sealed.as_ref())
        .map_err(|_| CredentialError::Decryption)?;

    key_bytes.zeroize();

    let secret = String::from_utf8(plaintext).map_err(|_| CredentialError::Decryption)?;

    Ok(AccessKey::new(secret))
}

/// Encrypt an access key into a bundle (provisioning tool and tests)
pub fn encrypt_access_key(access_key: &str, passphrase: &str) -> String {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);

    let mut key_bytes = derive_key(passphrase, &salt);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key_bytes));
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    let sealed = cipher
        .encrypt(&nonce, access_key.as_bytes())
        .expect("AEAD encryption of an in-memory buffer cannot fail");
    key_bytes.zeroize();

    let (ciphertext, tag) = sealed.split_at(sealed.len() - TAG_LEN);

    let mut raw = Vec::with_capacity(SALT_LEN + NONCE_LEN + TAG_LEN + ciphertext.len());
    raw.extend_from_slice(&salt);
    raw.extend_from_slice(&nonce);
    raw.extend_from_slice(tag);
    raw.extend_from_slice(ciphertext);

    BASE64.encode(raw)
}
