//! Data Models
//!
//! This module contains the core data structures used throughout SectionWiki:
//!
//! - `Document` - Universal row for wiki pages and comment nodes
//! - `Identity` / `ResolvedIdentity` - Explicit acting identity per request
//! - `Profile` - Per-account attributes and section rights
//!
//! All entities live in the flat `documents` table; comment trees are
//! reconstructed from `parent_id` links at query time.

mod document;
mod identity;
mod profile;

pub use document::{
    ContentKind, DeleteResult, Document, DocumentFilter, DocumentKind, DocumentUpdate, OrderBy,
    ValidationError, SECTION_ALL,
};
pub use identity::{AnonymousReason, Identity, Resolution, ResolvedIdentity, UNKNOWN_USER};
pub use profile::{Gender, Profile, ProfileView};
