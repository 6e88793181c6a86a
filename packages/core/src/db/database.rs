//! Database Connection Management
//!
//! This module provides the core database connection and initialization
//! functionality using libsql/Turso for SectionWiki's flat-table architecture.
//!
//! # Architecture
//!
//! - **One table for all documents**: wiki pages and comment nodes share the
//!   `documents` table, discriminated by the `kind` column
//! - **No cascade between pages and comments**: deleting a page leaves its
//!   comment rows behind (unreachable, not removed), so `parent_id` and
//!   `page_id` are plain columns rather than foreign keys
//! - **WAL mode**: Write-Ahead Logging for better concurrency (local files)
//! - **Local or remote**: a local SQLite file for development and tests, or a
//!   hosted Turso database addressed by URL and access token
//!
//! # Database Connection Patterns
//!
//! **ALWAYS use `connect_with_timeout()` in async functions** to avoid SQLite
//! thread-safety violations when the Tokio runtime moves futures between
//! threads. The 5-second busy timeout allows concurrent operations to wait
//! and retry instead of failing immediately with `SQLITE_BUSY` errors.
//!
//! ```no_run
//! # use sectionwiki_core::db::DatabaseService;
//! # use std::path::PathBuf;
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let db_service = DatabaseService::new(PathBuf::from("./wiki.db")).await?;
//! let conn = db_service.connect_with_timeout().await?;
//! # Ok(())
//! # }
//! ```

use crate::db::error::DatabaseError;
use libsql::{Builder, Database};
use std::path::PathBuf;
use std::sync::Arc;

/// Column list shared by every document SELECT
const DOCUMENT_COLUMNS: &str = "id, kind, title, section, content_kind, content, \
     parent_id, page_id, created_by, created_by_id, created_at";

/// Where the database lives
#[derive(Debug, Clone)]
pub enum DatabaseLocation {
    /// Local SQLite file
    Local(PathBuf),
    /// Hosted Turso database (URL only, no credentials stored here)
    Remote(String),
}

/// Database service for managing the libsql connection and schema
///
/// # Examples
///
/// ```no_run
/// use sectionwiki_core::db::DatabaseService;
/// use std::path::PathBuf;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let db_service = DatabaseService::new(PathBuf::from("/path/to/wiki.db")).await?;
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct DatabaseService {
    /// libsql database connection (wrapped in Arc for sharing)
    pub db: Arc<Database>,

    /// Local path or remote URL
    pub location: DatabaseLocation,
}

/// Parameters for document insertion (avoids too-many-arguments lint)
pub struct DbCreateDocumentParams<'a> {
    pub id: &'a str,
    pub kind: &'a str,
    pub title: &'a str,
    pub section: Option<&'a str>,
    pub content_kind: i64,
    pub content: &'a str,
    pub parent_id: Option<&'a str>,
    pub page_id: Option<&'a str>,
    pub created_by: &'a str,
    pub created_by_id: &'a str,
    pub created_at: &'a str,
}

/// Parameters for profile upsert
pub struct DbUpsertProfileParams<'a> {
    pub id: &'a str,
    pub username: &'a str,
    pub gender: i64,
    pub admin_sections: &'a str,
    pub visit_sections: &'a str,
}

impl DatabaseService {
    /// Create a new DatabaseService backed by a local SQLite file
    ///
    /// This will:
    /// 1. Ensure the parent directory exists (create if needed)
    /// 2. Open/create the database file
    /// 3. Initialize the schema (CREATE TABLE IF NOT EXISTS)
    /// 4. Enable SQLite features (WAL mode, busy timeout)
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if:
    /// - Parent directory cannot be created
    /// - Database connection fails
    /// - Schema initialization fails
    pub async fn new(db_path: PathBuf) -> Result<Self, DatabaseError> {
        // Only checkpoint WAL for databases created by this call
        let is_new_database = !db_path.exists();

        // Ensure parent directory exists
        if let Some(parent) = db_path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    if e.kind() == std::io::ErrorKind::PermissionDenied {
                        DatabaseError::permission_denied(db_path.clone())
                    } else {
                        DatabaseError::DirectoryCreationFailed(e)
                    }
                })?;
            }
        }

        let db = Builder::new_local(&db_path)
            .build()
            .await
            .map_err(|e| DatabaseError::connection_failed(db_path.clone(), e))?;

        let service = Self {
            db: Arc::new(db),
            location: DatabaseLocation::Local(db_path),
        };

        service.initialize_schema(is_new_database).await?;

        Ok(service)
    }

    /// Create a new DatabaseService backed by a hosted Turso database
    ///
    /// # Arguments
    ///
    /// * `url` - libsql URL of the hosted database
    /// * `access_token` - Access token obtained from the credential bootstrap
    pub async fn new_remote(url: String, access_token: String) -> Result<Self, DatabaseError> {
        let db = Builder::new_remote(url.clone(), access_token)
            .build()
            .await
            .map_err(|e| DatabaseError::remote_connection_failed(url.clone(), e))?;

        let service = Self {
            db: Arc::new(db),
            location: DatabaseLocation::Remote(url),
        };

        // Hosted databases manage journaling themselves; just ensure the schema
        service.initialize_schema(false).await?;

        Ok(service)
    }

    /// Execute a PRAGMA statement
    ///
    /// PRAGMA statements return rows, so we must use query() instead of execute().
    /// This helper method encapsulates that pattern for cleaner code.
    async fn execute_pragma(
        &self,
        conn: &libsql::Connection,
        pragma: &str,
    ) -> Result<(), DatabaseError> {
        let mut stmt = conn.prepare(pragma).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute '{}': {}", pragma, e))
        })?;
        let _ = stmt.query(()).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute '{}': {}", pragma, e))
        })?;
        Ok(())
    }

    fn is_local(&self) -> bool {
        matches!(self.location, DatabaseLocation::Local(_))
    }

    /// Initialize database schema and configuration
    ///
    /// Creates tables and indexes using CREATE TABLE IF NOT EXISTS,
    /// ensuring idempotent initialization (safe to call multiple times).
    ///
    /// # Schema
    ///
    /// - `documents` table: wiki pages and comment nodes, flat
    /// - `profiles` table: per-account attributes and section rights
    /// - Core indexes: kind, section, parent, page, creator, created
    async fn initialize_schema(&self, is_new_database: bool) -> Result<(), DatabaseError> {
        // Must use connect_with_timeout() in async functions to prevent
        // SQLite thread-safety violations when Tokio moves futures between threads.
        let conn = self.connect_with_timeout().await?;

        if self.is_local() {
            // WAL mode for better concurrency on local files
            self.execute_pragma(&conn, "PRAGMA journal_mode = WAL")
                .await?;

            // Wait up to 5s instead of failing immediately on lock
            self.execute_pragma(&conn, "PRAGMA busy_timeout = 5000")
                .await?;
        }

        // Create documents table. parent_id/page_id are deliberately NOT
        // foreign keys: deleting a page must not touch its comment rows.
        conn.execute(
            "CREATE TABLE IF NOT EXISTS documents (
                id TEXT PRIMARY KEY,
                kind TEXT NOT NULL,
                title TEXT NOT NULL DEFAULT '',
                section TEXT,
                content_kind INTEGER NOT NULL DEFAULT 0,
                content TEXT NOT NULL,
                parent_id TEXT,
                page_id TEXT,
                created_by TEXT NOT NULL,
                created_by_id TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
            (),
        )
        .await
        .map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to create documents table: {}", e))
        })?;

        // Create profiles table (section rights stored as JSON arrays)
        conn.execute(
            "CREATE TABLE IF NOT EXISTS profiles (
                id TEXT PRIMARY KEY,
                username TEXT NOT NULL,
                gender INTEGER NOT NULL DEFAULT 0,
                admin_sections TEXT NOT NULL DEFAULT '[]',
                visit_sections TEXT NOT NULL DEFAULT '[]'
            )",
            (),
        )
        .await
        .map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to create profiles table: {}", e))
        })?;

        self.create_core_indexes(&conn).await?;

        // Force WAL checkpoint only for newly created databases. This prevents
        // race conditions where rapid database swaps in tests cause
        // "no such table" errors due to WAL entries not being flushed.
        if is_new_database && self.is_local() {
            self.execute_pragma(&conn, "PRAGMA wal_checkpoint(TRUNCATE)")
                .await?;
        }

        Ok(())
    }

    /// Create core indexes for the documents table
    ///
    /// These indexes are essential for query performance and never change
    /// (no ALTER TABLE required on user machines).
    async fn create_core_indexes(&self, conn: &libsql::Connection) -> Result<(), DatabaseError> {
        // Index on kind (every listing filters on it)
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_documents_kind ON documents(kind)",
            (),
        )
        .await
        .map_err(|e| {
            DatabaseError::sql_execution(format!(
                "Failed to create index 'idx_documents_kind': {}",
                e
            ))
        })?;

        // Index on section (page listings)
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_documents_section ON documents(section)",
            (),
        )
        .await
        .map_err(|e| {
            DatabaseError::sql_execution(format!(
                "Failed to create index 'idx_documents_section': {}",
                e
            ))
        })?;

        // Index on parent_id (comment tree queries)
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_documents_parent ON documents(parent_id)",
            (),
        )
        .await
        .map_err(|e| {
            DatabaseError::sql_execution(format!(
                "Failed to create index 'idx_documents_parent': {}",
                e
            ))
        })?;

        // Index on page_id (whole-page comment loads)
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_documents_page ON documents(page_id)",
            (),
        )
        .await
        .map_err(|e| {
            DatabaseError::sql_execution(format!(
                "Failed to create index 'idx_documents_page': {}",
                e
            ))
        })?;

        // Index on created_by_id (ownership checks)
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_documents_creator ON documents(created_by_id)",
            (),
        )
        .await
        .map_err(|e| {
            DatabaseError::sql_execution(format!(
                "Failed to create index 'idx_documents_creator': {}",
                e
            ))
        })?;

        // Index on created_at (temporal ordering)
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_documents_created ON documents(created_at)",
            (),
        )
        .await
        .map_err(|e| {
            DatabaseError::sql_execution(format!(
                "Failed to create index 'idx_documents_created': {}",
                e
            ))
        })?;

        Ok(())
    }

    /// Get a synchronous connection to the database
    ///
    /// **⚠️ WARNING**: Only use this in synchronous, single-threaded contexts.
    /// In async functions or Tokio runtime contexts, use `connect_with_timeout()`
    /// instead to avoid SQLite thread-safety violations.
    pub fn connect(&self) -> Result<libsql::Connection, DatabaseError> {
        self.db.connect().map_err(DatabaseError::LibsqlError)
    }

    /// Get an async connection with busy timeout configured
    ///
    /// **✅ RECOMMENDED**: Use this for all async functions and Tokio runtime
    /// contexts. Sets a 5-second busy timeout so concurrent operations wait
    /// and retry instead of failing immediately when the database is locked.
    /// This prevents SQLite thread-safety violations when the Tokio runtime
    /// moves futures between threads at `.await` points.
    pub async fn connect_with_timeout(&self) -> Result<libsql::Connection, DatabaseError> {
        // The synchronous connect() call is safe here because it only creates
        // the connection handle; the actual SQLite operations happen later.
        let conn = self.connect()?;

        if self.is_local() {
            self.execute_pragma(&conn, "PRAGMA busy_timeout = 5000")
                .await?;
        }

        Ok(conn)
    }

    //
    // DOCUMENT STORE OPERATIONS
    // These methods contain the SQL logic wrapped by the WikiStore trait
    // implementation. They return raw rows; TursoStore converts them.
    //

    /// Insert a document into the database
    ///
    /// # Notes
    ///
    /// - `created_at` is supplied by the caller as an RFC 3339 string with
    ///   microsecond precision, so sibling ordering survives rapid inserts
    ///   (CURRENT_TIMESTAMP only has second resolution)
    pub async fn db_create_document(
        &self,
        params: DbCreateDocumentParams<'_>,
    ) -> Result<(), DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        conn.execute(
            "INSERT INTO documents (id, kind, title, section, content_kind, content, parent_id, page_id, created_by, created_by_id, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            (
                params.id,
                params.kind,
                params.title,
                params.section,
                params.content_kind,
                params.content,
                params.parent_id,
                params.page_id,
                params.created_by,
                params.created_by_id,
                params.created_at,
            ),
        )
        .await
        .map_err(|e| DatabaseError::sql_execution(format!("Failed to insert document: {}", e)))?;

        Ok(())
    }

    /// Retrieve a single document by ID from the database
    ///
    /// # Returns
    ///
    /// * `Ok(Some(row))` - Document found, returns the libsql Row
    /// * `Ok(None)` - Document not found in database
    /// * `Err(DatabaseError)` - Query execution failed
    pub async fn db_get_document(&self, id: &str) -> Result<Option<libsql::Row>, DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        let sql = format!("SELECT {} FROM documents WHERE id = ?", DOCUMENT_COLUMNS);
        let mut stmt = conn.prepare(&sql).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to prepare get_document query: {}", e))
        })?;

        let mut rows = stmt.query([id]).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute get_document query: {}", e))
        })?;

        rows.next()
            .await
            .map_err(|e| DatabaseError::sql_execution(e.to_string()))
    }

    /// Update a document's editable fields
    ///
    /// Only title, content kind, and content are editable; lineage and
    /// ownership columns never change after insertion.
    ///
    /// # Returns
    ///
    /// Number of rows affected (0 = document didn't exist)
    pub async fn db_update_document(
        &self,
        id: &str,
        title: &str,
        content_kind: i64,
        content: &str,
    ) -> Result<u64, DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        let rows_affected = conn
            .execute(
                "UPDATE documents SET title = ?, content_kind = ?, content = ? WHERE id = ?",
                (title, content_kind, content, id),
            )
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to update document: {}", e))
            })?;

        Ok(rows_affected)
    }

    /// Delete a document from the database
    ///
    /// # Returns
    ///
    /// Number of rows affected (0 = document didn't exist, >0 = deleted)
    ///
    /// # Notes
    ///
    /// - Deletes exactly one row: comment subtrees are removed child-first by
    ///   the comment service, and page deletion never touches comment rows
    /// - Idempotent: deleting a non-existent document returns 0 (success)
    pub async fn db_delete_document(&self, id: &str) -> Result<u64, DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        let rows_affected = conn
            .execute("DELETE FROM documents WHERE id = ?", [id])
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to delete document: {}", e))
            })?;

        Ok(rows_affected)
    }

    /// Query documents with filtering by kind, section, or parent_id
    ///
    /// # Arguments
    ///
    /// * `kind` - Optional document kind filter
    /// * `section` - Optional section filter (ANDed with `kind` when both are set)
    /// * `include_all` - Also match the reserved "all" section (OR with `section`)
    /// * `parent_id` - Optional parent ID filter (takes priority over the others)
    /// * `order_clause` - SQL ORDER BY clause (e.g., " ORDER BY created_at ASC, id ASC")
    /// * `limit_clause` - SQL LIMIT clause (e.g., " LIMIT 10")
    ///
    /// # Notes
    ///
    /// - Returns raw libsql::Rows iterator (TursoStore processes rows)
    /// - Caller must consume the rows iterator before the connection drops
    pub async fn db_query_documents(
        &self,
        kind: Option<&str>,
        section: Option<&str>,
        include_all: bool,
        parent_id: Option<&str>,
        order_clause: &str,
        limit_clause: &str,
    ) -> Result<libsql::Rows, DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        if let Some(parent_id) = parent_id {
            // Query by parent_id (comment children)
            let query = format!(
                "SELECT {} FROM documents WHERE parent_id = ?{}{}",
                DOCUMENT_COLUMNS, order_clause, limit_clause
            );

            let mut stmt = conn.prepare(&query).await.map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to prepare query: {}", e))
            })?;

            stmt.query([parent_id]).await.map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to execute query: {}", e))
            })
        } else if let (Some(kind), Some(section)) = (kind, section) {
            if include_all {
                // Rows in the active section OR the reserved "all" section
                let query = format!(
                    "SELECT {} FROM documents WHERE kind = ? AND (section = ? OR section = 'all'){}{}",
                    DOCUMENT_COLUMNS, order_clause, limit_clause
                );

                let mut stmt = conn.prepare(&query).await.map_err(|e| {
                    DatabaseError::sql_execution(format!("Failed to prepare query: {}", e))
                })?;

                stmt.query([kind, section]).await.map_err(|e| {
                    DatabaseError::sql_execution(format!("Failed to execute query: {}", e))
                })
            } else {
                let query = format!(
                    "SELECT {} FROM documents WHERE kind = ? AND section = ?{}{}",
                    DOCUMENT_COLUMNS, order_clause, limit_clause
                );

                let mut stmt = conn.prepare(&query).await.map_err(|e| {
                    DatabaseError::sql_execution(format!("Failed to prepare query: {}", e))
                })?;

                stmt.query([kind, section]).await.map_err(|e| {
                    DatabaseError::sql_execution(format!("Failed to execute query: {}", e))
                })
            }
        } else if let Some(section) = section {
            // Query by section only
            let query = if include_all {
                format!(
                    "SELECT {} FROM documents WHERE (section = ? OR section = 'all'){}{}",
                    DOCUMENT_COLUMNS, order_clause, limit_clause
                )
            } else {
                format!(
                    "SELECT {} FROM documents WHERE section = ?{}{}",
                    DOCUMENT_COLUMNS, order_clause, limit_clause
                )
            };

            let mut stmt = conn.prepare(&query).await.map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to prepare query: {}", e))
            })?;

            stmt.query([section]).await.map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to execute query: {}", e))
            })
        } else if let Some(kind) = kind {
            // Query by kind only
            let query = format!(
                "SELECT {} FROM documents WHERE kind = ?{}{}",
                DOCUMENT_COLUMNS, order_clause, limit_clause
            );

            let mut stmt = conn.prepare(&query).await.map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to prepare query: {}", e))
            })?;

            stmt.query([kind]).await.map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to execute query: {}", e))
            })
        } else {
            // Default: return all documents (with optional ordering/limit)
            let query = format!(
                "SELECT {} FROM documents{}{}",
                DOCUMENT_COLUMNS, order_clause, limit_clause
            );

            let mut stmt = conn.prepare(&query).await.map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to prepare query: {}", e))
            })?;

            stmt.query(()).await.map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to execute query: {}", e))
            })
        }
    }

    /// Get all direct children of a parent document
    ///
    /// Returns comment rows filtered by parent_id, in stable creation order
    /// (`created_at` with `id` as tie-breaker for equal timestamps).
    ///
    /// # Notes
    ///
    /// - Does NOT validate parent exists (the comment service handles that)
    /// - Empty result is NOT an error (a comment may have no replies)
    pub async fn db_get_children(&self, parent_id: &str) -> Result<libsql::Rows, DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        let sql = format!(
            "SELECT {} FROM documents WHERE parent_id = ? ORDER BY created_at ASC, id ASC",
            DOCUMENT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to prepare get_children query: {}", e))
        })?;

        stmt.query([parent_id]).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute get_children query: {}", e))
        })
    }

    //
    // PROFILE OPERATIONS
    //

    /// Retrieve a profile row by account id
    pub async fn db_get_profile(&self, id: &str) -> Result<Option<libsql::Row>, DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        let mut stmt = conn
            .prepare(
                "SELECT id, username, gender, admin_sections, visit_sections
                 FROM profiles WHERE id = ?",
            )
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to prepare profile query: {}", e))
            })?;

        let mut rows = stmt.query([id]).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute profile query: {}", e))
        })?;

        rows.next()
            .await
            .map_err(|e| DatabaseError::sql_execution(e.to_string()))
    }

    /// Insert or replace a profile row
    pub async fn db_upsert_profile(
        &self,
        params: DbUpsertProfileParams<'_>,
    ) -> Result<(), DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        conn.execute(
            "INSERT INTO profiles (id, username, gender, admin_sections, visit_sections)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 username = excluded.username,
                 gender = excluded.gender,
                 admin_sections = excluded.admin_sections,
                 visit_sections = excluded.visit_sections",
            (
                params.id,
                params.username,
                params.gender,
                params.admin_sections,
                params.visit_sections,
            ),
        )
        .await
        .map_err(|e| DatabaseError::sql_execution(format!("Failed to upsert profile: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn test_db() -> (TempDir, DatabaseService) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let db_service = DatabaseService::new(db_path).await.unwrap();
        (temp_dir, db_service)
    }

    #[tokio::test]
    async fn test_database_creation() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        let db_service = DatabaseService::new(db_path.clone()).await.unwrap();

        match db_service.location {
            DatabaseLocation::Local(ref path) => assert_eq!(path, &db_path),
            DatabaseLocation::Remote(_) => panic!("expected local database"),
        }
        assert!(db_path.exists());
    }

    #[tokio::test]
    async fn test_schema_initialization() {
        let (_temp_dir, db_service) = test_db().await;
        let conn = db_service.connect().unwrap();

        // Verify documents table exists
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' AND name='documents'")
            .await
            .unwrap();
        let mut rows = stmt.query(()).await.unwrap();
        let row = rows.next().await.unwrap().unwrap();
        let table_name: String = row.get(0).unwrap();
        assert_eq!(table_name, "documents");

        // Verify profiles table exists
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' AND name='profiles'")
            .await
            .unwrap();
        let mut rows = stmt.query(()).await.unwrap();
        let row = rows.next().await.unwrap().unwrap();
        let table_name: String = row.get(0).unwrap();
        assert_eq!(table_name, "profiles");
    }

    #[tokio::test]
    async fn test_indexes_created() {
        let (_temp_dir, db_service) = test_db().await;
        let conn = db_service.connect().unwrap();

        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='index' AND name LIKE 'idx_%'")
            .await
            .unwrap();
        let mut rows = stmt.query(()).await.unwrap();

        let mut index_names = Vec::new();
        while let Some(row) = rows.next().await.unwrap() {
            let name: String = row.get(0).unwrap();
            index_names.push(name);
        }

        assert!(index_names.contains(&"idx_documents_kind".to_string()));
        assert!(index_names.contains(&"idx_documents_section".to_string()));
        assert!(index_names.contains(&"idx_documents_parent".to_string()));
        assert!(index_names.contains(&"idx_documents_page".to_string()));
        assert!(index_names.contains(&"idx_documents_creator".to_string()));
        assert!(index_names.contains(&"idx_documents_created".to_string()));
    }

    #[tokio::test]
    async fn test_wal_mode_enabled() {
        let (_temp_dir, db_service) = test_db().await;
        let conn = db_service.connect().unwrap();

        let mut stmt = conn.prepare("PRAGMA journal_mode").await.unwrap();
        let mut rows = stmt.query(()).await.unwrap();
        let row = rows.next().await.unwrap().unwrap();
        let mode: String = row.get(0).unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
    }

    #[tokio::test]
    async fn test_parent_directory_creation() {
        let temp_dir = TempDir::new().unwrap();
        let nested_path = temp_dir.path().join("nested").join("dirs").join("test.db");

        let _db_service = DatabaseService::new(nested_path.clone()).await.unwrap();

        assert!(nested_path.exists());
        assert!(nested_path.parent().unwrap().exists());
    }

    #[tokio::test]
    async fn test_idempotent_initialization() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        // Create database twice
        let _db_service1 = DatabaseService::new(db_path.clone()).await.unwrap();
        let db_service2 = DatabaseService::new(db_path.clone()).await.unwrap();

        let conn = db_service2.connect().unwrap();
        let mut stmt = conn
            .prepare("SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name IN ('documents', 'profiles')")
            .await
            .unwrap();
        let mut rows = stmt.query(()).await.unwrap();
        let row = rows.next().await.unwrap().unwrap();
        let count: i64 = row.get(0).unwrap();

        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn test_insert_and_get_document() {
        let (_temp_dir, db_service) = test_db().await;

        db_service
            .db_create_document(DbCreateDocumentParams {
                id: "doc-1",
                kind: "page",
                title: "Hello",
                section: Some("general"),
                content_kind: 1,
                content: "# Hello",
                parent_id: None,
                page_id: None,
                created_by: "alice@example.com",
                created_by_id: "alice-id",
                created_at: "2026-01-01T00:00:00.000000+00:00",
            })
            .await
            .unwrap();

        let row = db_service.db_get_document("doc-1").await.unwrap().unwrap();
        let id: String = row.get(0).unwrap();
        let kind: String = row.get(1).unwrap();
        let title: String = row.get(2).unwrap();
        assert_eq!(id, "doc-1");
        assert_eq!(kind, "page");
        assert_eq!(title, "Hello");

        assert!(db_service.db_get_document("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let (_temp_dir, db_service) = test_db().await;

        let affected = db_service.db_delete_document("ghost").await.unwrap();
        assert_eq!(affected, 0);
    }

    #[tokio::test]
    async fn test_profile_upsert_round_trip() {
        let (_temp_dir, db_service) = test_db().await;

        db_service
            .db_upsert_profile(DbUpsertProfileParams {
                id: "u-1",
                username: "alice",
                gender: 2,
                admin_sections: r#"["marketing"]"#,
                visit_sections: r#"["marketing","all"]"#,
            })
            .await
            .unwrap();

        // Second upsert replaces the row instead of failing
        db_service
            .db_upsert_profile(DbUpsertProfileParams {
                id: "u-1",
                username: "alice",
                gender: 2,
                admin_sections: r#"["marketing","engineering"]"#,
                visit_sections: r#"["marketing","all"]"#,
            })
            .await
            .unwrap();

        let row = db_service.db_get_profile("u-1").await.unwrap().unwrap();
        let username: String = row.get(1).unwrap();
        let admin: String = row.get(3).unwrap();
        assert_eq!(username, "alice");
        assert!(admin.contains("engineering"));
    }
}
