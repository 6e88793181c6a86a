//! Profile Data Structures
//!
//! A profile row records per-account attributes plus the two section right
//! lists: `admin_sections` (sections the account administers) and
//! `visit_sections` (sections the account may read). The profile page renders
//! visit rights verbatim but only shows admin rights the account can itself
//! visit; [`ProfileView`] applies that intersection.

use serde::{Deserialize, Serialize};

/// Gender attribute, stored as a numeric code: 1 = male, 2 = female,
/// anything else = unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Gender {
    Male,
    Female,
    Unknown,
}

impl Gender {
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => Gender::Male,
            2 => Gender::Female,
            _ => Gender::Unknown,
        }
    }

    pub fn as_code(&self) -> i64 {
        match self {
            Gender::Male => 1,
            Gender::Female => 2,
            Gender::Unknown => 0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Unknown => "unknown",
        }
    }
}

/// Per-account profile row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// Account identity id (primary key)
    pub id: String,

    /// Display name shown in listings and bylines
    pub username: String,

    /// Gender attribute
    pub gender: Gender,

    /// Sections the account administers
    pub admin_sections: Vec<String>,

    /// Sections the account may read, in display order
    pub visit_sections: Vec<String>,
}

impl Profile {
    pub fn new(id: String, username: String) -> Self {
        Self {
            id,
            username,
            gender: Gender::Unknown,
            admin_sections: Vec::new(),
            visit_sections: Vec::new(),
        }
    }

    /// Whether the account may read `section`.
    pub fn can_visit(&self, section: &str) -> bool {
        self.visit_sections.iter().any(|s| s == section)
    }

    /// Whether the account administers `section`.
    pub fn can_admin(&self, section: &str) -> bool {
        self.admin_sections.iter().any(|s| s == section)
    }

    /// Admin rights restricted to sections the account can itself visit,
    /// in `admin_sections` order.
    pub fn displayed_admin_sections(&self) -> Vec<String> {
        self.admin_sections
            .iter()
            .filter(|s| self.can_visit(s))
            .cloned()
            .collect()
    }
}

/// Read-only projection rendered on the profile page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileView {
    pub username: String,
    pub gender: &'static str,
    /// Visit rights, verbatim
    pub visit_sections: Vec<String>,
    /// Admin rights the account can itself visit
    pub admin_sections: Vec<String>,
}

impl From<&Profile> for ProfileView {
    fn from(profile: &Profile) -> Self {
        Self {
            username: profile.username.clone(),
            gender: profile.gender.label(),
            visit_sections: profile.visit_sections.clone(),
            admin_sections: profile.displayed_admin_sections(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gender_codes() {
        assert_eq!(Gender::from_code(1), Gender::Male);
        assert_eq!(Gender::from_code(2), Gender::Female);
        assert_eq!(Gender::from_code(0), Gender::Unknown);
        assert_eq!(Gender::from_code(7), Gender::Unknown);
        assert_eq!(Gender::Female.label(), "female");
    }

    #[test]
    fn test_profile_view_intersection() {
        let mut profile = Profile::new("u-1".to_string(), "alice".to_string());
        profile.admin_sections = vec!["marketing".to_string(), "engineering".to_string()];
        profile.visit_sections = vec!["engineering".to_string(), "all".to_string()];

        assert!(profile.can_admin("marketing"));
        assert!(!profile.can_visit("marketing"));

        let view = ProfileView::from(&profile);
        // Visit rights shown verbatim, admin rights only where visitable
        assert_eq!(
            view.visit_sections,
            vec!["engineering".to_string(), "all".to_string()]
        );
        assert_eq!(view.admin_sections, vec!["engineering".to_string()]);
        assert_eq!(view.gender, "unknown");
    }

    #[test]
    fn test_profile_view_serializes_camel_case() {
        let mut profile = Profile::new("u-1".to_string(), "alice".to_string());
        profile.gender = Gender::Female;
        profile.visit_sections = vec!["all".to_string()];

        let json = serde_json::to_value(ProfileView::from(&profile)).unwrap();
        assert_eq!(json["username"], "alice");
        assert_eq!(json["gender"], "female");
        assert_eq!(json["visitSections"][0], "all");
        assert!(json["adminSections"].as_array().unwrap().is_empty());
    }
}
