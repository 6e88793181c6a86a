//! Comment Service - Threaded Discussions
//!
//! Comments live in the same document table as pages, linked by `parent_id`
//! (the page or the comment being replied to) and `page_id` (always the
//! hosting page). This module assembles them into a reply tree and provides
//! the posting, editing, and deletion operations:
//!
//! - `load_tree` - the full comment forest for a page, oldest first at every
//!   level
//! - `post_comment` / `post_reply` - add a top-level comment or a nested
//!   reply
//! - `permission_for` - who may edit or delete a comment (owner, or an admin
//!   of the hosting page's section)
//! - `edit_comment` - body replacement, permission-checked at this layer
//! - `delete_comment` - subtree removal behind a confirmation prompt,
//!   deleting replies before their parents
//!
//! Comment bodies are always plain text and are HTML-escaped for display.

use crate::db::WikiStore;
use crate::models::{ContentKind, Document, DocumentKind, DocumentUpdate, Identity, SECTION_ALL};
use crate::services::error::WikiServiceError;
use crate::services::prompter::Prompter;
use crate::utils::render_content;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tracing::{debug, info};

/// One comment with its replies, ready for display
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentNode {
    pub document: Document,
    /// Escaped body HTML
    pub html: String,
    /// Whether the acting identity may edit or delete this comment
    pub can_modify: bool,
    pub replies: Vec<CommentNode>,
}

impl CommentNode {
    /// Total number of comments in this subtree, itself included
    pub fn count(&self) -> usize {
        1 + self.replies.iter().map(|r| r.count()).sum::<usize>()
    }
}

/// Business logic for page comments
pub struct CommentService {
    store: Arc<dyn WikiStore>,
}

impl CommentService {
    pub fn new(store: Arc<dyn WikiStore>) -> Self {
        Self { store }
    }

    /// Load the comment forest for a page
    ///
    /// Returns top-level comments in posting order, each carrying its reply
    /// subtree in posting order. One child query per node visited, so
    /// latency grows with tree size.
    ///
    /// # Errors
    ///
    /// - `DocumentNotFound` if the page does not exist
    /// - `PermissionDenied` if the identity may not browse the page's section
    pub async fn load_tree(
        &self,
        identity: &Identity,
        page_id: &str,
    ) -> Result<Vec<CommentNode>, WikiServiceError> {
        let page = self.require_viewable_page(identity, page_id).await?;

        // The whole forest hangs off one page, so the admin half of the
        // permission check is constant across it
        let is_admin = Self::admin_over(identity, &page);
        let forest = self.build_subtree(identity, is_admin, &page.id).await?;
        debug!(
            page_id = %page_id,
            comments = forest.iter().map(|n| n.count()).sum::<usize>(),
            "loaded comment tree"
        );

        Ok(forest)
    }

    /// Post a top-level comment on a page
    ///
    /// # Errors
    ///
    /// - `NotAuthenticated` for anonymous identities
    /// - `DocumentNotFound` / `PermissionDenied` as for `load_tree`
    /// - `ValidationFailed` for an empty body
    pub async fn post_comment(
        &self,
        identity: &Identity,
        page_id: &str,
        content: &str,
    ) -> Result<Document, WikiServiceError> {
        let page = self.require_viewable_page(identity, page_id).await?;
        self.insert_comment(identity, &page.id, &page.id, content).await
    }

    /// Post a reply under an existing comment
    pub async fn post_reply(
        &self,
        identity: &Identity,
        comment_id: &str,
        content: &str,
    ) -> Result<Document, WikiServiceError> {
        let parent = self.require_comment(comment_id).await?;
        let page_id = parent
            .page_id
            .clone()
            .ok_or_else(|| WikiServiceError::document_not_found(comment_id))?;
        self.require_viewable_page(identity, &page_id).await?;

        self.insert_comment(identity, &parent.id, &page_id, content).await
    }

    /// Whether the acting identity may edit or delete `comment`
    ///
    /// Anonymous identities never may. Owners always may. Otherwise the
    /// hosting page's section decides: an admin right on it, or any admin
    /// rights when it is the reserved `all` section. A missing hosting page
    /// denies.
    pub async fn permission_for(
        &self,
        identity: &Identity,
        comment: &Document,
    ) -> Result<bool, WikiServiceError> {
        if identity.is_anonymous {
            return Ok(false);
        }
        if identity.owns(&comment.created_by_id) {
            return Ok(true);
        }

        let page_id = match &comment.page_id {
            Some(id) => id,
            None => return Ok(false),
        };
        let page = match self.store.get_document(page_id).await? {
            Some(page) => page,
            None => return Ok(false),
        };

        Ok(Self::admin_over(identity, &page))
    }

    /// Replace a comment's body
    ///
    /// Permission-checked here, not only at the UI: the same owner/admin rule
    /// as deletion applies.
    pub async fn edit_comment(
        &self,
        identity: &Identity,
        comment_id: &str,
        content: &str,
    ) -> Result<Document, WikiServiceError> {
        let comment = self.require_comment(comment_id).await?;
        if !self.permission_for(identity, &comment).await? {
            return Err(WikiServiceError::permission_denied(
                "only the author or a section admin may edit this comment",
            ));
        }
        if content.trim().is_empty() {
            return Err(
                crate::models::ValidationError::MissingField("content".to_string()).into(),
            );
        }

        let update = DocumentUpdate::new().with_content(content.to_string());
        let updated = self.store.update_document(comment_id, update).await?;
        info!(comment_id = %comment_id, "edited comment");

        Ok(updated)
    }

    /// Delete a comment and all of its replies
    ///
    /// Owner/admin rule as in [`permission_for`]. The prompter is asked to
    /// confirm first; a declined prompt cancels the deletion and returns
    /// `false`. Replies are removed before their parents; no transaction
    /// spans the recursion, so an interrupted deletion can leave orphans.
    pub async fn delete_comment(
        &self,
        identity: &Identity,
        prompter: &dyn Prompter,
        comment_id: &str,
    ) -> Result<bool, WikiServiceError> {
        let comment = self.require_comment(comment_id).await?;
        if !self.permission_for(identity, &comment).await? {
            return Err(WikiServiceError::permission_denied(
                "only the author or a section admin may delete this comment",
            ));
        }

        if !prompter
            .confirm("Delete comment", "Delete this comment and all of its replies?")
            .await
        {
            debug!(comment_id = %comment_id, "comment deletion cancelled");
            return Ok(false);
        }

        let removed = self.delete_subtree(&comment.id).await?;
        info!(comment_id = %comment_id, removed, "deleted comment subtree");

        Ok(true)
    }

    async fn insert_comment(
        &self,
        identity: &Identity,
        parent_id: &str,
        page_id: &str,
        content: &str,
    ) -> Result<Document, WikiServiceError> {
        let (author_id, author_email) = match (&identity.id, &identity.email) {
            (Some(id), Some(email)) if !identity.is_anonymous => (id.clone(), email.clone()),
            _ => return Err(WikiServiceError::NotAuthenticated),
        };

        if content.trim().is_empty() {
            return Err(
                crate::models::ValidationError::MissingField("content".to_string()).into(),
            );
        }

        let comment = Document::new_comment(
            parent_id.to_string(),
            page_id.to_string(),
            content.to_string(),
            author_email,
            author_id,
        );
        comment.validate()?;

        let created = self.store.create_document(comment).await?;
        info!(comment_id = %created.id, page_id = %page_id, "posted comment");

        Ok(created)
    }

    fn build_subtree<'a>(
        &'a self,
        identity: &'a Identity,
        is_admin: bool,
        parent_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<CommentNode>, WikiServiceError>> + Send + 'a>>
    {
        Box::pin(async move {
            let children = self.store.get_children(parent_id).await?;
            let mut nodes = Vec::with_capacity(children.len());
            for child in children {
                let replies = self.build_subtree(identity, is_admin, &child.id).await?;
                nodes.push(CommentNode {
                    html: render_content(ContentKind::Plain, &child.content),
                    can_modify: is_admin || identity.owns(&child.created_by_id),
                    document: child,
                    replies,
                });
            }
            Ok(nodes)
        })
    }

    /// Delete `id` and everything under it, children first
    fn delete_subtree<'a>(
        &'a self,
        id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<usize, WikiServiceError>> + Send + 'a>> {
        Box::pin(async move {
            let mut removed = 0;
            for child in self.store.get_children(id).await? {
                removed += self.delete_subtree(&child.id).await?;
            }
            self.store.delete_document(id).await?;
            Ok(removed + 1)
        })
    }

    /// The admin half of the comment permission rule, for a hosting page
    fn admin_over(identity: &Identity, page: &Document) -> bool {
        match page.section.as_deref() {
            Some(SECTION_ALL) => identity.has_admin_rights(),
            Some(section) => identity.is_admin_of(section),
            None => false,
        }
    }

    async fn require_comment(&self, id: &str) -> Result<Document, WikiServiceError> {
        self.store
            .get_document(id)
            .await?
            .filter(|d| d.kind == DocumentKind::Comment)
            .ok_or_else(|| WikiServiceError::document_not_found(id))
    }

    async fn require_viewable_page(
        &self,
        identity: &Identity,
        page_id: &str,
    ) -> Result<Document, WikiServiceError> {
        let page = self
            .store
            .get_document(page_id)
            .await?
            .filter(|d| d.kind == DocumentKind::Page)
            .ok_or_else(|| WikiServiceError::document_not_found(page_id))?;

        let section = page.section.as_deref().unwrap_or(SECTION_ALL);
        if !identity.can_visit(section) {
            return Err(WikiServiceError::permission_denied(format!(
                "no visit right on section '{}'",
                section
            )));
        }

        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{DatabaseService, TursoStore};
    use crate::services::prompter::StaticPrompter;
    use tempfile::TempDir;

    async fn test_setup() -> (CommentService, Arc<dyn WikiStore>, Document, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let db = Arc::new(DatabaseService::new(db_path).await.unwrap());
        let store: Arc<dyn WikiStore> = Arc::new(TursoStore::new(db));

        let page = Document::new_page(
            "Post".to_string(),
            SECTION_ALL.to_string(),
            ContentKind::Markdown,
            "body".to_string(),
            "alice@example.com".to_string(),
            "alice-id".to_string(),
        );
        let page = store.create_document(page).await.unwrap();

        (CommentService::new(store.clone()), store, page, temp_dir)
    }

    fn alice() -> Identity {
        Identity::account(
            "alice-id".to_string(),
            "alice@example.com".to_string(),
            "alice".to_string(),
            vec![],
            vec![],
        )
    }

    fn bob() -> Identity {
        Identity::account(
            "bob-id".to_string(),
            "bob@example.com".to_string(),
            "bob".to_string(),
            vec![],
            vec![],
        )
    }

    #[tokio::test]
    async fn test_post_and_load_nested_tree() {
        let (service, _store, page, _tmp) = test_setup().await;

        let top1 = service.post_comment(&alice(), &page.id, "first").await.unwrap();
        let _top2 = service.post_comment(&bob(), &page.id, "second").await.unwrap();
        let reply = service.post_reply(&bob(), &top1.id, "reply to first").await.unwrap();
        service.post_reply(&alice(), &reply.id, "deeper").await.unwrap();

        let forest = service.load_tree(&alice(), &page.id).await.unwrap();
        assert_eq!(forest.len(), 2);
        assert_eq!(forest[0].document.content, "first");
        assert_eq!(forest[1].document.content, "second");
        assert_eq!(forest[0].replies.len(), 1);
        assert_eq!(forest[0].replies[0].document.content, "reply to first");
        assert_eq!(forest[0].replies[0].replies[0].document.content, "deeper");
        assert_eq!(forest.iter().map(|n| n.count()).sum::<usize>(), 4);
    }

    #[tokio::test]
    async fn test_tree_shape_is_stable() {
        let (service, _store, page, _tmp) = test_setup().await;

        let top = service.post_comment(&alice(), &page.id, "top").await.unwrap();
        service.post_reply(&bob(), &top.id, "reply").await.unwrap();
        service.post_comment(&bob(), &page.id, "second").await.unwrap();

        let ids = |forest: &[CommentNode]| -> Vec<String> {
            fn walk(nodes: &[CommentNode], out: &mut Vec<String>) {
                for n in nodes {
                    out.push(n.document.id.clone());
                    walk(&n.replies, out);
                }
            }
            let mut out = Vec::new();
            walk(forest, &mut out);
            out
        };

        let first = service.load_tree(&alice(), &page.id).await.unwrap();
        let second = service.load_tree(&alice(), &page.id).await.unwrap();
        assert_eq!(ids(&first), ids(&second));
    }

    #[tokio::test]
    async fn test_tree_marks_modifiable_nodes() {
        let (service, _store, page, _tmp) = test_setup().await;

        service.post_comment(&alice(), &page.id, "mine").await.unwrap();
        service.post_comment(&bob(), &page.id, "theirs").await.unwrap();

        let forest = service.load_tree(&alice(), &page.id).await.unwrap();
        assert!(forest[0].can_modify);
        assert!(!forest[1].can_modify);

        // Any admin rights cover the whole forest on an "all" page
        let admin = Identity::account(
            "mod-id".to_string(),
            "mod@example.com".to_string(),
            "mod".to_string(),
            vec![],
            vec!["engineering".to_string()],
        );
        let forest = service.load_tree(&admin, &page.id).await.unwrap();
        assert!(forest.iter().all(|n| n.can_modify));

        let forest = service.load_tree(&Identity::anonymous(), &page.id).await.unwrap();
        assert!(forest.iter().all(|n| !n.can_modify));
    }

    #[tokio::test]
    async fn test_permission_for_rules() {
        let (service, _store, page, _tmp) = test_setup().await;

        let comment = service.post_comment(&alice(), &page.id, "mine").await.unwrap();

        // Owner, regardless of admin sections
        assert!(service.permission_for(&alice(), &comment).await.unwrap());
        // Anonymous never, even if ownership fields were to match
        assert!(!service
            .permission_for(&Identity::anonymous(), &comment)
            .await
            .unwrap());
        // Unrelated account without rights
        assert!(!service.permission_for(&bob(), &comment).await.unwrap());
    }

    #[tokio::test]
    async fn test_comment_bodies_are_escaped() {
        let (service, _store, page, _tmp) = test_setup().await;

        service
            .post_comment(&alice(), &page.id, "<script>alert(1)</script>")
            .await
            .unwrap();

        let forest = service.load_tree(&alice(), &page.id).await.unwrap();
        assert!(!forest[0].html.contains("<script>"));
        assert!(forest[0].html.contains("&lt;script&gt;"));
    }

    #[tokio::test]
    async fn test_anonymous_cannot_post() {
        let (service, _store, page, _tmp) = test_setup().await;

        let err = service
            .post_comment(&Identity::anonymous(), &page.id, "nope")
            .await
            .unwrap_err();
        assert!(matches!(err, WikiServiceError::NotAuthenticated));
    }

    #[tokio::test]
    async fn test_posting_requires_visit_right() {
        let (service, store, _page, _tmp) = test_setup().await;

        let private = Document::new_page(
            "Private".to_string(),
            "engineering".to_string(),
            ContentKind::Markdown,
            "body".to_string(),
            "alice@example.com".to_string(),
            "alice-id".to_string(),
        );
        let private = store.create_document(private).await.unwrap();

        let err = service
            .post_comment(&bob(), &private.id, "nope")
            .await
            .unwrap_err();
        assert!(matches!(err, WikiServiceError::PermissionDenied { .. }));

        let engineer = Identity::account(
            "eng-id".to_string(),
            "eng@example.com".to_string(),
            "eng".to_string(),
            vec!["engineering".to_string()],
            vec![],
        );
        service.post_comment(&engineer, &private.id, "now allowed").await.unwrap();
    }

    #[tokio::test]
    async fn test_empty_body_rejected() {
        let (service, _store, page, _tmp) = test_setup().await;

        let err = service
            .post_comment(&alice(), &page.id, "   ")
            .await
            .unwrap_err();
        assert!(matches!(err, WikiServiceError::ValidationFailed(_)));
    }

    #[tokio::test]
    async fn test_edit_permission_checked_at_service_layer() {
        let (service, _store, page, _tmp) = test_setup().await;

        let comment = service.post_comment(&alice(), &page.id, "v1").await.unwrap();

        let err = service.edit_comment(&bob(), &comment.id, "v2").await.unwrap_err();
        assert!(matches!(err, WikiServiceError::PermissionDenied { .. }));

        let updated = service.edit_comment(&alice(), &comment.id, "v2").await.unwrap();
        assert_eq!(updated.content, "v2");
    }

    #[tokio::test]
    async fn test_delete_removes_whole_subtree() {
        let (service, store, page, _tmp) = test_setup().await;

        let top = service.post_comment(&alice(), &page.id, "top").await.unwrap();
        let reply = service.post_reply(&bob(), &top.id, "reply").await.unwrap();
        let deep = service.post_reply(&alice(), &reply.id, "deep").await.unwrap();
        let other = service.post_comment(&bob(), &page.id, "other").await.unwrap();

        let prompter = StaticPrompter::accepting();
        let deleted = service.delete_comment(&alice(), &prompter, &top.id).await.unwrap();
        assert!(deleted);

        assert!(store.get_document(&top.id).await.unwrap().is_none());
        assert!(store.get_document(&reply.id).await.unwrap().is_none());
        assert!(store.get_document(&deep.id).await.unwrap().is_none());
        // Sibling thread untouched
        assert!(store.get_document(&other.id).await.unwrap().is_some());

        let forest = service.load_tree(&alice(), &page.id).await.unwrap();
        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].document.id, other.id);
    }

    #[tokio::test]
    async fn test_declined_confirmation_cancels_delete() {
        let (service, store, page, _tmp) = test_setup().await;

        let comment = service.post_comment(&alice(), &page.id, "keep me").await.unwrap();

        let prompter = StaticPrompter::declining();
        let deleted = service
            .delete_comment(&alice(), &prompter, &comment.id)
            .await
            .unwrap();
        assert!(!deleted);
        assert!(store.get_document(&comment.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_denied_without_permission() {
        let (service, _store, page, _tmp) = test_setup().await;

        let comment = service.post_comment(&alice(), &page.id, "mine").await.unwrap();

        let prompter = StaticPrompter::accepting();
        let err = service
            .delete_comment(&bob(), &prompter, &comment.id)
            .await
            .unwrap_err();
        assert!(matches!(err, WikiServiceError::PermissionDenied { .. }));
    }

    #[tokio::test]
    async fn test_reply_to_missing_comment() {
        let (service, _store, _page, _tmp) = test_setup().await;

        let err = service
            .post_reply(&alice(), "missing", "nope")
            .await
            .unwrap_err();
        assert!(matches!(err, WikiServiceError::DocumentNotFound { .. }));
    }
}
