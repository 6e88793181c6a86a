//! Profile Service
//!
//! Loads the profile page projection for an account addressed by identity
//! id. Profiles have no client-side update path; rights and attributes are
//! managed out of band, so this service is read-only.

use crate::db::WikiStore;
use crate::models::ProfileView;
use crate::services::error::WikiServiceError;
use std::sync::Arc;

/// Read side of account profiles
pub struct ProfileService {
    store: Arc<dyn WikiStore>,
}

impl ProfileService {
    pub fn new(store: Arc<dyn WikiStore>) -> Self {
        Self { store }
    }

    /// Load the profile page projection for `user_id`
    ///
    /// Visit rights are shown verbatim; admin rights only where the account
    /// can itself visit.
    ///
    /// # Errors
    ///
    /// `ProfileNotFound` if no profile row exists for `user_id`.
    pub async fn load_profile(&self, user_id: &str) -> Result<ProfileView, WikiServiceError> {
        let profile = self
            .store
            .get_profile(user_id)
            .await?
            .ok_or_else(|| WikiServiceError::profile_not_found(user_id))?;

        Ok(ProfileView::from(&profile))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{DatabaseService, TursoStore};
    use crate::models::{Gender, Profile};
    use tempfile::TempDir;

    async fn test_service() -> (ProfileService, Arc<dyn WikiStore>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let db = Arc::new(DatabaseService::new(db_path).await.unwrap());
        let store: Arc<dyn WikiStore> = Arc::new(TursoStore::new(db));
        (ProfileService::new(store.clone()), store, temp_dir)
    }

    #[tokio::test]
    async fn test_profile_view_projection() {
        let (service, store, _tmp) = test_service().await;

        let mut profile = Profile::new("u-1".to_string(), "alice".to_string());
        profile.gender = Gender::Female;
        profile.admin_sections = vec!["marketing".to_string(), "engineering".to_string()];
        profile.visit_sections = vec!["engineering".to_string()];
        store.upsert_profile(profile).await.unwrap();

        let view = service.load_profile("u-1").await.unwrap();
        assert_eq!(view.username, "alice");
        assert_eq!(view.gender, "female");
        assert_eq!(view.visit_sections, vec!["engineering".to_string()]);
        // Admin right on "marketing" is hidden: not visitable
        assert_eq!(view.admin_sections, vec!["engineering".to_string()]);
    }

    #[tokio::test]
    async fn test_missing_profile() {
        let (service, _store, _tmp) = test_service().await;

        let err = service.load_profile("ghost").await.unwrap_err();
        assert!(matches!(err, WikiServiceError::ProfileNotFound { .. }));
    }
}
