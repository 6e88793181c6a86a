//! Document Data Structures
//!
//! This module defines the `Document` struct that backs both wiki pages and
//! comments. The legacy schema overloaded a single `section` column with a
//! synthetic `"page-<id>"` parent encoding; here the two concerns are split
//! into an explicit `kind` discriminant plus `parent_id`/`page_id` links, so
//! comment trees are addressed by real foreign keys instead of string parsing.
//!
//! # Examples
//!
//! ```rust
//! use sectionwiki_core::models::{ContentKind, Document};
//!
//! // A wiki page in the "marketing" section
//! let page = Document::new_page(
//!     "Launch plan".to_string(),
//!     "marketing".to_string(),
//!     ContentKind::Markdown,
//!     "# Q3 launch".to_string(),
//!     "alice@example.com".to_string(),
//!     "alice-id".to_string(),
//! );
//!
//! // A top-level comment on that page
//! let comment = Document::new_comment(
//!     page.id.clone(),
//!     page.id.clone(),
//!     "Looks good".to_string(),
//!     "bob@example.com".to_string(),
//!     "bob-id".to_string(),
//! );
//! assert_eq!(comment.parent_id.as_deref(), Some(page.id.as_str()));
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Reserved section visible to every identity with any visit right, and the
/// only section an anonymous identity may view.
pub const SECTION_ALL: &str = "all";

/// Validation errors for Document operations
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid section: {0}")]
    InvalidSection(String),

    #[error("Invalid parent reference: {0}")]
    InvalidParent(String),

    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    #[error("Password too short: must be at least {0} characters")]
    PasswordTooShort(usize),
}

/// Discriminant separating wiki pages from comment nodes.
///
/// Stored as a plain text column (`"page"` / `"comment"`), replacing the
/// legacy convention of marking comments with a `"page-<id>"` section value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DocumentKind {
    Page,
    Comment,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Page => "page",
            DocumentKind::Comment => "comment",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "comment" => DocumentKind::Comment,
            _ => DocumentKind::Page,
        }
    }
}

/// Content type of a document body.
///
/// The numeric codes are the wire/storage representation: 1 = Markdown,
/// 2 = HTML, 3 = plain text (comments), anything else = unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContentKind {
    Markdown,
    Html,
    Plain,
    Unknown,
}

impl ContentKind {
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => ContentKind::Markdown,
            2 => ContentKind::Html,
            3 => ContentKind::Plain,
            _ => ContentKind::Unknown,
        }
    }

    pub fn as_code(&self) -> i64 {
        match self {
            ContentKind::Markdown => 1,
            ContentKind::Html => 2,
            ContentKind::Plain => 3,
            ContentKind::Unknown => 0,
        }
    }

    /// Human-readable label (list/detail page tag)
    pub fn label(&self) -> &'static str {
        match self {
            ContentKind::Markdown => "Markdown",
            ContentKind::Html => "HTML",
            ContentKind::Plain => "Plain text",
            ContentKind::Unknown => "Unknown",
        }
    }
}

/// Universal document row: wiki pages and comment nodes share one table.
///
/// # Fields
///
/// - `section`: `Some(name)` for pages (a real section name or [`SECTION_ALL`]);
///   `None` for comments, whose access domain is resolved through `page_id`
/// - `parent_id`: `None` for pages; the hosting page id for top-level
///   comments, or the parent comment id for replies
/// - `page_id`: the hosting page id for every comment node (root locator,
///   so permission resolution never has to walk the reply chain)
/// - `created_by` / `created_by_id`: creator email and identity id, recorded
///   at creation and never reassigned
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Unique identifier (UUID string)
    pub id: String,

    /// Page or comment discriminant
    pub kind: DocumentKind,

    /// Title (empty string for comments)
    pub title: String,

    /// Section name for pages; None for comments
    pub section: Option<String>,

    /// Body content type
    pub content_kind: ContentKind,

    /// Body content
    pub content: String,

    /// Parent document id (None for pages)
    pub parent_id: Option<String>,

    /// Hosting page id (None for pages, Some for comments)
    pub page_id: Option<String>,

    /// Creator email
    pub created_by: String,

    /// Creator identity id
    pub created_by_id: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Document {
    /// Create a new wiki page with an auto-generated UUID.
    pub fn new_page(
        title: String,
        section: String,
        content_kind: ContentKind,
        content: String,
        created_by: String,
        created_by_id: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind: DocumentKind::Page,
            title,
            section: Some(section),
            content_kind,
            content,
            parent_id: None,
            page_id: None,
            created_by,
            created_by_id,
            created_at: Utc::now(),
        }
    }

    /// Create a new comment node attached to `parent_id` on page `page_id`.
    ///
    /// For a top-level comment the two ids are the same; for a reply,
    /// `parent_id` is the parent comment and `page_id` stays the hosting page.
    /// Comment bodies are always plain text.
    pub fn new_comment(
        parent_id: String,
        page_id: String,
        content: String,
        created_by: String,
        created_by_id: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind: DocumentKind::Comment,
            title: String::new(),
            section: None,
            content_kind: ContentKind::Plain,
            content,
            parent_id: Some(parent_id),
            page_id: Some(page_id),
            created_by,
            created_by_id,
            created_at: Utc::now(),
        }
    }

    /// Validate structural invariants before insertion.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if:
    /// - `id` or `created_by_id` is empty
    /// - a page has no section, or carries a parent link
    /// - a comment lacks its parent/page links
    /// - the document references itself as parent
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.is_empty() {
            return Err(ValidationError::MissingField("id".to_string()));
        }
        if self.created_by_id.is_empty() {
            return Err(ValidationError::MissingField("created_by_id".to_string()));
        }

        match self.kind {
            DocumentKind::Page => {
                if self.section.as_deref().unwrap_or("").is_empty() {
                    return Err(ValidationError::MissingField("section".to_string()));
                }
                if self.parent_id.is_some() || self.page_id.is_some() {
                    return Err(ValidationError::InvalidParent(
                        "pages cannot carry parent links".to_string(),
                    ));
                }
            }
            DocumentKind::Comment => {
                if self.parent_id.as_deref().unwrap_or("").is_empty() {
                    return Err(ValidationError::MissingField("parent_id".to_string()));
                }
                if self.page_id.as_deref().unwrap_or("").is_empty() {
                    return Err(ValidationError::MissingField("page_id".to_string()));
                }
            }
        }

        if self.parent_id.as_deref() == Some(self.id.as_str()) {
            return Err(ValidationError::InvalidParent(
                "document cannot be its own parent".to_string(),
            ));
        }

        Ok(())
    }

    /// Whether this row is a comment node rather than a page.
    pub fn is_comment(&self) -> bool {
        self.kind == DocumentKind::Comment
    }
}

/// Partial document update for edit operations.
///
/// Only title, content kind, and content are editable; section, lineage, and
/// ownership are fixed at creation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_kind: Option<ContentKind>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl DocumentUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: String) -> Self {
        self.title = Some(title);
        self
    }

    pub fn with_content_kind(mut self, content_kind: ContentKind) -> Self {
        self.content_kind = Some(content_kind);
        self
    }

    pub fn with_content(mut self, content: String) -> Self {
        self.content = Some(content);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content_kind.is_none() && self.content.is_none()
    }
}

/// Result of a delete operation.
///
/// Deletes are idempotent: removing a row that does not exist succeeds, and
/// `existed` records whether anything was actually deleted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeleteResult {
    pub existed: bool,
}

impl DeleteResult {
    pub fn existed() -> Self {
        Self { existed: true }
    }

    pub fn not_found() -> Self {
        Self { existed: false }
    }
}

/// Sort order for document queries
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OrderBy {
    /// Creation time, oldest first (comment forests)
    CreatedAsc,
    /// Creation time, newest first (page listings)
    CreatedDesc,
}

/// Query filter for document listings.
///
/// All set fields combine with AND. `section` plus `include_all` expresses
/// the listing rule "rows in the active section OR in the reserved `all`
/// section" without the caller hand-writing SQL.
///
/// # Examples
///
/// ```rust
/// use sectionwiki_core::models::{DocumentFilter, DocumentKind, OrderBy};
///
/// let filter = DocumentFilter::new()
///     .with_kind(DocumentKind::Page)
///     .with_section("marketing".to_string())
///     .including_all()
///     .with_order_by(OrderBy::CreatedDesc);
/// assert!(filter.include_all);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentFilter {
    /// Filter by document kind
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<DocumentKind>,

    /// Filter by section name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,

    /// Also match the reserved "all" section (OR with `section`)
    #[serde(default)]
    pub include_all: bool,

    /// Filter by parent document id (comment children)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,

    /// Sort order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_by: Option<OrderBy>,

    /// Limit number of results
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl DocumentFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_kind(mut self, kind: DocumentKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_section(mut self, section: String) -> Self {
        self.section = Some(section);
        self
    }

    pub fn including_all(mut self) -> Self {
        self.include_all = true;
        self
    }

    pub fn with_parent_id(mut self, parent_id: String) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn with_order_by(mut self, order_by: OrderBy) -> Self {
        self.order_by = Some(order_by);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}
