//! Identity Data Structures
//!
//! The acting identity is an explicit value constructed once per request by
//! the identity resolver and passed into every service call; there is no
//! ambient current-user state. [`ResolvedIdentity`] additionally records HOW
//! the identity was arrived at, so silent auth degradation stays inspectable.

use serde::{Deserialize, Serialize};

use crate::models::SECTION_ALL;

/// Display-name sentinel for accounts whose profile row is missing
pub const UNKNOWN_USER: &str = "unknown user";

/// The resolved viewer of a page
///
/// Anonymous identities have no id and empty permission sets, with an
/// implicit right to the reserved `all` section only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Account identity id; `None` for anonymous viewers
    pub id: Option<String>,
    /// Account email; `None` for anonymous viewers
    pub email: Option<String>,
    /// Display name ("unknown user" when the profile row is missing)
    pub username: String,
    pub is_anonymous: bool,
    /// Sections the identity may read, in profile order
    pub visitable_sections: Vec<String>,
    /// Sections the identity administers
    pub admin_sections: Vec<String>,
}

impl Identity {
    /// The fixed degraded identity for anonymous viewers
    pub fn anonymous() -> Self {
        Self {
            id: None,
            email: None,
            username: "anonymous".to_string(),
            is_anonymous: true,
            visitable_sections: Vec::new(),
            admin_sections: Vec::new(),
        }
    }

    /// An account identity with its profile-derived permission sets
    pub fn account(
        id: String,
        email: String,
        username: String,
        visitable_sections: Vec<String>,
        admin_sections: Vec<String>,
    ) -> Self {
        Self {
            id: Some(id),
            email: Some(email),
            username,
            is_anonymous: false,
            visitable_sections,
            admin_sections,
        }
    }

    /// An account identity whose profile row could not be found
    ///
    /// The sentinel username replaces the display name; the permission sets
    /// stay empty, but the identity stays non-anonymous.
    pub fn account_without_profile(id: String, email: String) -> Self {
        Self::account(id, email, UNKNOWN_USER.to_string(), Vec::new(), Vec::new())
    }

    /// Whether the identity may read documents in `section`
    ///
    /// The reserved `all` section is readable by everyone, anonymous
    /// included. Any other section needs a visit or admin right on it.
    pub fn can_visit(&self, section: &str) -> bool {
        if section == SECTION_ALL {
            return true;
        }
        self.visitable_sections.iter().any(|s| s == section)
            || self.admin_sections.iter().any(|s| s == section)
    }

    /// Whether the identity administers `section`
    pub fn is_admin_of(&self, section: &str) -> bool {
        self.admin_sections.iter().any(|s| s == section)
    }

    /// Whether the identity administers at least one section
    pub fn has_admin_rights(&self) -> bool {
        !self.admin_sections.is_empty()
    }

    /// Whether the identity created the row owned by `created_by_id`
    ///
    /// Always false for anonymous viewers, even on an accidental id match.
    pub fn owns(&self, created_by_id: &str) -> bool {
        if self.is_anonymous {
            return false;
        }
        self.id.as_deref() == Some(created_by_id)
    }
}

/// Why an identity resolved to anonymous
///
/// The distinctions matter for logging: a visitor who asked for anonymous
/// browsing is normal traffic, while a failed auth check is a degradation
/// worth a warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AnonymousReason {
    /// Anonymous browsing was chosen at unlock time
    Requested,
    /// No account session exists
    NoUser,
    /// The auth check errored; degraded rather than failing the page
    AuthCheckFailed,
}

/// How the identity was arrived at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum Resolution {
    Authenticated,
    Anonymous { reason: AnonymousReason },
}

/// The outcome of identity resolution: who is acting, and how we know
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedIdentity {
    pub identity: Identity,
    pub resolution: Resolution,
}

impl ResolvedIdentity {
    pub fn authenticated(identity: Identity) -> Self {
        Self {
            identity,
            resolution: Resolution::Authenticated,
        }
    }

    pub fn anonymous(reason: AnonymousReason) -> Self {
        Self {
            identity: Identity::anonymous(),
            resolution: Resolution::Anonymous { reason },
        }
    }

    /// True when this resolution is a degradation rather than a choice.
    pub fn is_degraded(&self) -> bool {
        matches!(
            self.resolution,
            Resolution::Anonymous {
                reason: AnonymousReason::AuthCheckFailed
            }
        )
    }
}
