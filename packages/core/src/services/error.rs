//! Service Layer Error Types
//!
//! This module defines error types for service-layer operations, providing
//! detailed error handling for business logic failures.

use crate::auth::CredentialError;
use crate::db::DatabaseError;
use crate::models::ValidationError;
use thiserror::Error;

/// Service operation errors
///
/// Provides high-level error types for all service operations,
/// with detailed context and proper error chaining.
#[derive(Error, Debug)]
pub enum WikiServiceError {
    /// Document not found by ID
    #[error("Document not found: {id}")]
    DocumentNotFound { id: String },

    /// Profile not found for account
    #[error("Profile not found: {id}")]
    ProfileNotFound { id: String },

    /// Validation failed
    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),

    /// Credential bootstrap failed
    #[error("Credential error: {0}")]
    CredentialFailed(#[from] CredentialError),

    /// Caller lacks the right to perform the operation
    #[error("Permission denied: {reason}")]
    PermissionDenied { reason: String },

    /// Operation requires a signed-in account
    #[error("Not signed in")]
    NotAuthenticated,

    /// Operation exceeded its deadline
    #[error("{what} timed out after {secs}s")]
    Timeout { what: String, secs: u64 },

    /// Authentication provider rejected or failed the request
    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    /// Database operation failed
    #[error("Database operation failed: {0}")]
    DatabaseError(#[from] DatabaseError),

    /// Store operation failed
    #[error("Store operation failed: {0}")]
    StoreError(#[from] anyhow::Error),
}

impl WikiServiceError {
    /// Create a document not found error
    pub fn document_not_found(id: impl Into<String>) -> Self {
        Self::DocumentNotFound { id: id.into() }
    }

    /// Create a profile not found error
    pub fn profile_not_found(id: impl Into<String>) -> Self {
        Self::ProfileNotFound { id: id.into() }
    }

    /// Create a permission denied error
    pub fn permission_denied(reason: impl Into<String>) -> Self {
        Self::PermissionDenied {
            reason: reason.into(),
        }
    }

    /// Create a timeout error
    pub fn timeout(what: impl Into<String>, secs: u64) -> Self {
        Self::Timeout {
            what: what.into(),
            secs,
        }
    }

    /// Create an authentication failure error
    pub fn auth_failed(msg: impl Into<String>) -> Self {
        Self::AuthFailed(msg.into())
    }
}
