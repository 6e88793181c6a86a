//! TursoStore - WikiStore Implementation for Turso/libsql Backend
//!
//! This module implements the `WikiStore` trait for the Turso (libsql)
//! database, wrapping DatabaseService and delegating all operations to the
//! extracted `db_*` methods. It is a thin abstraction layer with zero
//! business logic.
//!
//! # Design Principles
//!
//! 1. **Pure Delegation**: All methods delegate to DatabaseService
//! 2. **Row Conversion**: Handles libsql::Row → Document/Profile conversion
//! 3. **No permission checks**: Access rules live in the services
//!
//! # Examples
//!
//! ```rust,no_run
//! use sectionwiki_core::db::{WikiStore, TursoStore, DatabaseService};
//! use std::sync::Arc;
//! use std::path::PathBuf;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let db = Arc::new(DatabaseService::new(PathBuf::from("./data/wiki.db")).await?);
//!     let store: Arc<dyn WikiStore> = Arc::new(TursoStore::new(db));
//!
//!     let page = store.get_document("9f3c2a1e-0000-4000-8000-000000000000").await?;
//!
//!     Ok(())
//! }
//! ```

use crate::db::wiki_store::WikiStore;
use crate::db::{DatabaseService, DbCreateDocumentParams, DbUpsertProfileParams};
use crate::models::{
    ContentKind, DeleteResult, Document, DocumentFilter, DocumentKind, DocumentUpdate, Gender,
    OrderBy, Profile,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use libsql::Row;
use std::sync::Arc;

/// TursoStore implements the WikiStore trait for the Turso/libsql backend
pub struct TursoStore {
    /// Underlying database service (extracted SQL operations)
    db: Arc<DatabaseService>,
}

impl TursoStore {
    /// Create a new TursoStore wrapper
    pub fn new(db: Arc<DatabaseService>) -> Self {
        Self { db }
    }

    /// Parse timestamp from database - handles both SQLite and RFC3339 formats
    ///
    /// New rows are written as RFC3339 with microseconds; rows touched by raw
    /// SQL (CURRENT_TIMESTAMP) come back as "YYYY-MM-DD HH:MM:SS".
    fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(dt.with_timezone(&Utc));
        }

        if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
            return Ok(naive.and_utc());
        }

        Err(anyhow::anyhow!(
            "Unable to parse timestamp '{}' as RFC3339 or SQLite format",
            s
        ))
    }

    /// Format a timestamp for storage
    ///
    /// Microsecond precision keeps creation order stable for rapid inserts.
    fn format_timestamp(dt: &DateTime<Utc>) -> String {
        dt.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    /// Convert libsql::Row to Document model
    ///
    /// This is the central conversion point for all document queries.
    ///
    /// # Row Format
    ///
    /// Expected columns (in order):
    /// - id (TEXT)
    /// - kind (TEXT)
    /// - title (TEXT)
    /// - section (TEXT, nullable)
    /// - content_kind (INTEGER)
    /// - content (TEXT)
    /// - parent_id (TEXT, nullable)
    /// - page_id (TEXT, nullable)
    /// - created_by (TEXT)
    /// - created_by_id (TEXT)
    /// - created_at (TEXT, ISO 8601)
    fn row_to_document(row: &Row) -> Result<Document> {
        let id: String = row.get(0).context("Failed to get id")?;
        let kind: String = row.get(1).context("Failed to get kind")?;
        let title: String = row.get(2).context("Failed to get title")?;
        let section: Option<String> = row.get(3).context("Failed to get section")?;
        let content_kind: i64 = row.get(4).context("Failed to get content_kind")?;
        let content: String = row.get(5).context("Failed to get content")?;
        let parent_id: Option<String> = row.get(6).context("Failed to get parent_id")?;
        let page_id: Option<String> = row.get(7).context("Failed to get page_id")?;
        let created_by: String = row.get(8).context("Failed to get created_by")?;
        let created_by_id: String = row.get(9).context("Failed to get created_by_id")?;
        let created_at_str: String = row.get(10).context("Failed to get created_at")?;

        let created_at =
            Self::parse_timestamp(&created_at_str).context("Failed to parse created_at")?;

        Ok(Document {
            id,
            kind: DocumentKind::from_str(&kind),
            title,
            section,
            content_kind: ContentKind::from_code(content_kind),
            content,
            parent_id,
            page_id,
            created_by,
            created_by_id,
            created_at,
        })
    }

    /// Convert libsql::Row to Profile model
    ///
    /// Section right lists are stored as JSON arrays in TEXT columns.
    fn row_to_profile(row: &Row) -> Result<Profile> {
        let id: String = row.get(0).context("Failed to get id")?;
        let username: String = row.get(1).context("Failed to get username")?;
        let gender: i64 = row.get(2).context("Failed to get gender")?;
        let admin_json: String = row.get(3).context("Failed to get admin_sections")?;
        let visit_json: String = row.get(4).context("Failed to get visit_sections")?;

        let admin_sections: Vec<String> =
            serde_json::from_str(&admin_json).context("Failed to parse admin_sections JSON")?;
        let visit_sections: Vec<String> =
            serde_json::from_str(&visit_json).context("Failed to parse visit_sections JSON")?;

        Ok(Profile {
            id,
            username,
            gender: Gender::from_code(gender),
            admin_sections,
            visit_sections,
        })
    }

    fn order_clause(order_by: Option<OrderBy>) -> &'static str {
        match order_by {
            Some(OrderBy::CreatedAsc) => " ORDER BY created_at ASC, id ASC",
            Some(OrderBy::CreatedDesc) => " ORDER BY created_at DESC, id DESC",
            None => "",
        }
    }
}

#[async_trait]
impl WikiStore for TursoStore {
    async fn create_document(&self, document: Document) -> Result<Document> {
        let created_at = Self::format_timestamp(&document.created_at);

        let params = DbCreateDocumentParams {
            id: &document.id,
            kind: document.kind.as_str(),
            title: &document.title,
            section: document.section.as_deref(),
            content_kind: document.content_kind.as_code(),
            content: &document.content,
            parent_id: document.parent_id.as_deref(),
            page_id: document.page_id.as_deref(),
            created_by: &document.created_by,
            created_by_id: &document.created_by_id,
            created_at: &created_at,
        };

        self.db
            .db_create_document(params)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to create document: {}", e))?;

        // Fetch and return the created document
        self.get_document(&document.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Document not found after creation"))
    }

    async fn get_document(&self, id: &str) -> Result<Option<Document>> {
        match self
            .db
            .db_get_document(id)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to get document: {}", e))?
        {
            Some(row) => Ok(Some(Self::row_to_document(&row)?)),
            None => Ok(None),
        }
    }

    async fn update_document(&self, id: &str, update: DocumentUpdate) -> Result<Document> {
        // Fetch current document to build the sparse update
        let current = self
            .get_document(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Document not found: {}", id))?;

        let title = update.title.unwrap_or(current.title);
        let content_kind = update.content_kind.unwrap_or(current.content_kind);
        let content = update.content.unwrap_or(current.content);

        let rows_affected = self
            .db
            .db_update_document(id, &title, content_kind.as_code(), &content)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to update document: {}", e))?;

        if rows_affected == 0 {
            return Err(anyhow::anyhow!("Document not found: {}", id));
        }

        self.get_document(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Document not found after update"))
    }

    async fn delete_document(&self, id: &str) -> Result<DeleteResult> {
        let rows_affected = self
            .db
            .db_delete_document(id)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to delete document: {}", e))?;

        Ok(DeleteResult {
            existed: rows_affected > 0,
        })
    }

    async fn query_documents(&self, filter: DocumentFilter) -> Result<Vec<Document>> {
        let order_clause = Self::order_clause(filter.order_by);
        let limit_clause = filter
            .limit
            .map(|l| format!(" LIMIT {}", l))
            .unwrap_or_default();

        let mut rows = self
            .db
            .db_query_documents(
                filter.kind.map(|k| k.as_str()),
                filter.section.as_deref(),
                filter.include_all,
                filter.parent_id.as_deref(),
                order_clause,
                &limit_clause,
            )
            .await
            .map_err(|e| anyhow::anyhow!("Failed to query documents: {}", e))?;

        let mut documents = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to fetch row: {}", e))?
        {
            documents.push(Self::row_to_document(&row)?);
        }

        Ok(documents)
    }

    async fn get_children(&self, parent_id: &str) -> Result<Vec<Document>> {
        let mut rows = self
            .db
            .db_get_children(parent_id)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to get children: {}", e))?;

        let mut children = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to fetch row: {}", e))?
        {
            children.push(Self::row_to_document(&row)?);
        }

        Ok(children)
    }

    async fn get_profile(&self, id: &str) -> Result<Option<Profile>> {
        match self
            .db
            .db_get_profile(id)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to get profile: {}", e))?
        {
            Some(row) => Ok(Some(Self::row_to_profile(&row)?)),
            None => Ok(None),
        }
    }

    async fn upsert_profile(&self, profile: Profile) -> Result<Profile> {
        let admin_json = serde_json::to_string(&profile.admin_sections)
            .context("Failed to serialize admin_sections")?;
        let visit_json = serde_json::to_string(&profile.visit_sections)
            .context("Failed to serialize visit_sections")?;

        let params = DbUpsertProfileParams {
            id: &profile.id,
            username: &profile.username,
            gender: profile.gender.as_code(),
            admin_sections: &admin_json,
            visit_sections: &visit_json,
        };

        self.db
            .db_upsert_profile(params)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to upsert profile: {}", e))?;

        self.get_profile(&profile.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Profile not found after upsert"))
    }
}
