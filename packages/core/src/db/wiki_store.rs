//! WikiStore Trait - Database Abstraction Layer
//!
//! This module defines the `WikiStore` trait that abstracts persistence for
//! documents and profiles. The trait keeps the business logic in the services
//! independent of the backing database, so a local SQLite file (development,
//! tests) and a hosted Turso database (production) are interchangeable.
//!
//! # Design Decisions
//!
//! 1. **Async-First**: All methods are async to support both embedded and
//!    network backends
//! 2. **Ownership Semantics**: Methods take ownership of values to avoid
//!    unnecessary cloning (caller can clone if needed)
//! 3. **Error Handling**: Uses `anyhow::Result` for flexible error context;
//!    services map failures into their own error taxonomy
//!
//! # Examples
//!
//! ```rust,no_run
//! use sectionwiki_core::db::{WikiStore, TursoStore, DatabaseService};
//! use sectionwiki_core::models::{ContentKind, Document};
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let db = Arc::new(DatabaseService::new(PathBuf::from("./wiki.db")).await?);
//!     let store: Arc<dyn WikiStore> = Arc::new(TursoStore::new(db));
//!
//!     let page = Document::new_page(
//!         "Welcome".to_string(),
//!         "all".to_string(),
//!         ContentKind::Markdown,
//!         "# Welcome".to_string(),
//!         "alice@example.com".to_string(),
//!         "alice-id".to_string(),
//!     );
//!     let created = store.create_document(page).await?;
//!
//!     Ok(())
//! }
//! ```

use crate::models::{DeleteResult, Document, DocumentFilter, DocumentUpdate, Profile};
use anyhow::Result;
use async_trait::async_trait;

/// Abstraction layer for document and profile persistence
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` to allow usage in async contexts
/// where futures may be moved between threads.
///
/// # Method Categories
///
/// - **Document CRUD**: create, get, update, delete
/// - **Querying**: filter queries, child listing
/// - **Profiles**: get, upsert
#[async_trait]
pub trait WikiStore: Send + Sync {
    //
    // DOCUMENT CRUD OPERATIONS
    //

    /// Create a new document
    ///
    /// Takes ownership of the document to avoid cloning; the caller can clone
    /// before calling if they need to retain the original.
    ///
    /// # Errors
    ///
    /// Returns error if the document ID already exists or the insert fails.
    async fn create_document(&self, document: Document) -> Result<Document>;

    /// Get document by ID
    ///
    /// # Returns
    ///
    /// - `Ok(Some(document))` if the document exists
    /// - `Ok(None)` if it doesn't (not an error)
    /// - `Err(_)` if a database error occurs
    async fn get_document(&self, id: &str) -> Result<Option<Document>>;

    /// Apply a sparse update to a document's editable fields
    ///
    /// Only fields set in `update` change; lineage and ownership columns are
    /// immutable. Returns the updated document.
    ///
    /// # Errors
    ///
    /// Returns error if the document doesn't exist.
    async fn update_document(&self, id: &str, update: DocumentUpdate) -> Result<Document>;

    /// Delete a single document row
    ///
    /// Idempotent: deleting a non-existent document succeeds with
    /// `DeleteResult { existed: false }`. Never touches other rows; the
    /// comment service is responsible for removing subtrees child-first.
    async fn delete_document(&self, id: &str) -> Result<DeleteResult>;

    //
    // QUERY OPERATIONS
    //

    /// Query documents matching a filter
    async fn query_documents(&self, filter: DocumentFilter) -> Result<Vec<Document>>;

    /// Get all direct children of a document, in stable creation order
    async fn get_children(&self, parent_id: &str) -> Result<Vec<Document>>;

    //
    // PROFILE OPERATIONS
    //

    /// Get a profile by account id
    async fn get_profile(&self, id: &str) -> Result<Option<Profile>>;

    /// Insert or replace a profile
    async fn upsert_profile(&self, profile: Profile) -> Result<Profile>;
}
