//! Business Services
//!
//! This module contains the core business logic services:
//!
//! - `DocumentService` - section visibility, page listings, page CRUD
//! - `CommentService` - threaded comment trees and subtree deletion
//! - `IdentityResolver` - session-to-identity resolution and sign-in/out
//! - `ProfileService` - profile page projection
//!
//! Services coordinate between the database layer and application logic,
//! implementing access rules and orchestrating multi-step operations.

pub mod comment_service;
pub mod document_service;
pub mod error;
pub mod identity_service;
pub mod profile_service;
pub mod prompter;

pub use comment_service::{CommentNode, CommentService};
pub use document_service::{DocumentListing, DocumentService, DocumentSummary, PageView};
pub use error::WikiServiceError;
pub use identity_service::{IdentityResolver, DEFAULT_SIGN_IN_TIMEOUT_SECS};
pub use profile_service::ProfileService;
pub use prompter::{Prompter, StaticPrompter};
