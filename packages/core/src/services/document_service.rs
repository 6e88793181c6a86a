//! Document Service - Page Listing and CRUD
//!
//! This module provides the business logic layer for wiki pages:
//!
//! - Section tabs (what the acting identity may browse)
//! - Page listings with batch creator-name resolution
//! - Page CRUD with ownership and section-right checks
//!
//! # Access model
//!
//! - The reserved `all` section is readable by everyone, anonymous included;
//!   an anonymous listing request is always answered from `all`, whatever
//!   section was asked for
//! - Any other section is readable only with a visit or admin right on it
//! - Creating a page in `all` requires admin rights over at least one
//!   section; any other section name is accepted from any signed-in account
//! - Editing and deleting a page takes ownership, an admin right on its
//!   section, or (for `all` pages) any admin rights
//!
//! Deleting a page removes only the page row. Its comment rows stay behind,
//! unreachable through the UI; see the comment service for subtree deletion.

use crate::db::WikiStore;
use crate::models::{
    ContentKind, Document, DocumentFilter, DocumentKind, DocumentUpdate, Identity, OrderBy,
    ValidationError, SECTION_ALL, UNKNOWN_USER,
};
use crate::services::error::WikiServiceError;
use crate::utils::{render_content, strip_markdown};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Maximum excerpt length in listings, in characters
const EXCERPT_LEN: usize = 160;

/// One row of a page listing
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSummary {
    pub id: String,
    pub title: String,
    pub section: String,
    /// Content type tag shown next to the title
    pub content_label: &'static str,
    /// Resolved creator name ("unknown user" when unresolvable)
    pub creator_name: String,
    pub created_at: DateTime<Utc>,
    /// Plain-text excerpt of the body
    pub excerpt: String,
}

/// A page listing for one active section
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentListing {
    /// The section actually served (always `all` for anonymous viewers)
    pub section: String,
    pub items: Vec<DocumentSummary>,
}

/// A page prepared for display
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageView {
    pub document: Document,
    /// Rendered body HTML
    pub html: String,
    pub creator_name: String,
    /// Whether the acting identity may edit or delete this page
    pub can_edit: bool,
}

/// Business logic for wiki pages
pub struct DocumentService {
    store: Arc<dyn WikiStore>,
}

impl DocumentService {
    pub fn new(store: Arc<dyn WikiStore>) -> Self {
        Self { store }
    }

    /// Section tabs for the acting identity
    ///
    /// Anonymous viewers get only the reserved `all` section. Accounts get
    /// their visit rights in profile order; the first entry is the default
    /// tab. An account with no rights falls back to `all`.
    pub fn list_visible_sections(&self, identity: &Identity) -> Vec<String> {
        if identity.is_anonymous || identity.visitable_sections.is_empty() {
            return vec![SECTION_ALL.to_string()];
        }
        identity.visitable_sections.clone()
    }

    /// List pages visible in `section`, newest first
    ///
    /// Anonymous viewers are always served the `all` listing, whatever
    /// section they asked for. Account listings include pages from the
    /// reserved `all` section alongside the active one. Creator names are
    /// resolved in one pass with per-creator memoization.
    ///
    /// # Errors
    ///
    /// `PermissionDenied` if a signed-in account may not browse `section`.
    pub async fn list_documents(
        &self,
        identity: &Identity,
        section: &str,
    ) -> Result<DocumentListing, WikiServiceError> {
        // Anonymous override: the requested section is ignored
        let section = if identity.is_anonymous {
            SECTION_ALL
        } else {
            section
        };

        if !identity.can_visit(section) {
            return Err(WikiServiceError::permission_denied(format!(
                "no visit right on section '{}'",
                section
            )));
        }

        let mut filter = DocumentFilter::new()
            .with_kind(DocumentKind::Page)
            .with_section(section.to_string())
            .with_order_by(OrderBy::CreatedDesc);
        if section != SECTION_ALL {
            filter = filter.including_all();
        }

        let pages = self.store.query_documents(filter).await?;
        debug!(section = %section, count = pages.len(), "listed pages");

        let mut names: HashMap<String, String> = HashMap::new();
        let mut items = Vec::with_capacity(pages.len());
        for page in pages {
            let creator_name = match names.get(&page.created_by_id) {
                Some(name) => name.clone(),
                None => {
                    let name = self.resolve_creator_name(&page.created_by_id).await;
                    names.insert(page.created_by_id.clone(), name.clone());
                    name
                }
            };

            let mut excerpt = strip_markdown(&page.content);
            if excerpt.chars().count() > EXCERPT_LEN {
                excerpt = excerpt.chars().take(EXCERPT_LEN).collect();
            }

            items.push(DocumentSummary {
                id: page.id,
                title: page.title,
                section: page.section.unwrap_or_default(),
                content_label: page.content_kind.label(),
                creator_name,
                created_at: page.created_at,
                excerpt,
            });
        }

        Ok(DocumentListing {
            section: section.to_string(),
            items,
        })
    }

    /// Load a page for display
    ///
    /// # Errors
    ///
    /// - `DocumentNotFound` if `id` does not exist or is not a page
    /// - `PermissionDenied` if the identity may not browse the page's section
    pub async fn get_page(
        &self,
        identity: &Identity,
        id: &str,
    ) -> Result<PageView, WikiServiceError> {
        let document = self
            .store
            .get_document(id)
            .await?
            .filter(|d| d.kind == DocumentKind::Page)
            .ok_or_else(|| WikiServiceError::document_not_found(id))?;

        let section = document.section.as_deref().unwrap_or(SECTION_ALL);
        if !identity.can_visit(section) {
            return Err(WikiServiceError::permission_denied(format!(
                "no visit right on section '{}'",
                section
            )));
        }

        let html = render_content(document.content_kind, &document.content);
        let creator_name = self.resolve_creator_name(&document.created_by_id).await;
        let can_edit = Self::can_modify(identity, &document);

        Ok(PageView {
            document,
            html,
            creator_name,
            can_edit,
        })
    }

    /// Create a new page in `section`
    ///
    /// Any section name is accepted from a signed-in account; the reserved
    /// `all` section additionally requires admin rights over at least one
    /// section.
    ///
    /// # Errors
    ///
    /// - `NotAuthenticated` for anonymous identities
    /// - `ValidationFailed` for an empty title, content, or section, or for
    ///   `all` without admin rights; nothing is inserted on failure
    pub async fn create_page(
        &self,
        identity: &Identity,
        section: &str,
        title: &str,
        content_kind: ContentKind,
        content: &str,
    ) -> Result<Document, WikiServiceError> {
        let (creator_id, creator_email) = match (&identity.id, &identity.email) {
            (Some(id), Some(email)) if !identity.is_anonymous => (id.clone(), email.clone()),
            _ => return Err(WikiServiceError::NotAuthenticated),
        };

        if title.trim().is_empty() {
            return Err(ValidationError::MissingField("title".to_string()).into());
        }
        if content.trim().is_empty() {
            return Err(ValidationError::MissingField("content".to_string()).into());
        }
        if section.trim().is_empty() {
            return Err(ValidationError::MissingField("section".to_string()).into());
        }
        if section == SECTION_ALL && !identity.has_admin_rights() {
            return Err(ValidationError::InvalidSection(
                "the reserved 'all' section requires admin rights".to_string(),
            )
            .into());
        }

        let page = Document::new_page(
            title.to_string(),
            section.to_string(),
            content_kind,
            content.to_string(),
            creator_email,
            creator_id,
        );
        page.validate()?;

        let created = self.store.create_document(page).await?;
        info!(page_id = %created.id, section = %section, "created page");

        Ok(created)
    }

    /// Edit a page's title, content kind, or content
    ///
    /// Permitted for the page's creator, an admin of its section, or (for
    /// `all` pages) any identity with admin rights.
    pub async fn edit_page(
        &self,
        identity: &Identity,
        id: &str,
        update: DocumentUpdate,
    ) -> Result<Document, WikiServiceError> {
        if update.is_empty() {
            return Err(ValidationError::MissingField("update fields".to_string()).into());
        }

        let document = self
            .store
            .get_document(id)
            .await?
            .filter(|d| d.kind == DocumentKind::Page)
            .ok_or_else(|| WikiServiceError::document_not_found(id))?;

        if !Self::can_modify(identity, &document) {
            return Err(WikiServiceError::permission_denied(
                "only the creator or a section admin may edit this page",
            ));
        }

        let updated = self.store.update_document(id, update).await?;
        info!(page_id = %id, "edited page");

        Ok(updated)
    }

    /// Delete a page
    ///
    /// Same permission rule as editing. Removes only the page row; comment
    /// rows under it remain in the table but become unreachable.
    pub async fn delete_page(&self, identity: &Identity, id: &str) -> Result<(), WikiServiceError> {
        let document = self
            .store
            .get_document(id)
            .await?
            .filter(|d| d.kind == DocumentKind::Page)
            .ok_or_else(|| WikiServiceError::document_not_found(id))?;

        if !Self::can_modify(identity, &document) {
            return Err(WikiServiceError::permission_denied(
                "only the creator or a section admin may delete this page",
            ));
        }

        self.store.delete_document(id).await?;
        info!(page_id = %id, "deleted page");

        Ok(())
    }

    /// Owner, admin of the page's section, or any admin for `all` pages
    pub(crate) fn can_modify(identity: &Identity, document: &Document) -> bool {
        if identity.owns(&document.created_by_id) {
            return true;
        }
        match document.section.as_deref() {
            Some(SECTION_ALL) => identity.has_admin_rights(),
            Some(section) => identity.is_admin_of(section),
            None => false,
        }
    }

    /// Resolve a creator id to a display name; never blank, never an error
    async fn resolve_creator_name(&self, creator_id: &str) -> String {
        match self.store.get_profile(creator_id).await {
            Ok(Some(profile)) => profile.username,
            _ => UNKNOWN_USER.to_string(),
        }
    }
}
