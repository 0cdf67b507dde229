use serde::{Deserialize, Serialize};

/// Something an account is allowed to do, derived from its role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    SearchSpots,
    BookSpots,
    ManageOwnSpots,
    ViewOwnerBookings,
    UploadImages,
    ReviewSpots,
    ManageUsers,
    ViewAnalytics,
}

const USER_CAPABILITIES: &[Capability] = &[Capability::SearchSpots, Capability::BookSpots];

const OWNER_CAPABILITIES: &[Capability] = &[
    Capability::SearchSpots,
    Capability::BookSpots,
    Capability::ManageOwnSpots,
    Capability::ViewOwnerBookings,
    Capability::UploadImages,
];

const ADMIN_CAPABILITIES: &[Capability] = &[
    Capability::SearchSpots,
    Capability::BookSpots,
    Capability::ManageOwnSpots,
    Capability::ViewOwnerBookings,
    Capability::UploadImages,
    Capability::ReviewSpots,
    Capability::ManageUsers,
    Capability::ViewAnalytics,
];

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Owner,
    Admin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::User, Role::Owner, Role::Admin];

    pub fn capabilities(&self) -> &'static [Capability] {
        match self {
            Role::User => USER_CAPABILITIES,
            Role::Owner => OWNER_CAPABILITIES,
            Role::Admin => ADMIN_CAPABILITIES,
        }
    }

    pub fn has_capability(&self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }

    /// Roles an account may pick for itself at sign-up.
    pub fn is_self_assignable(&self) -> bool {
        !matches!(self, Role::Admin)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Owner => "owner",
            Role::Admin => "admin",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "user" => Some(Role::User),
            "owner" => Some(Role::Owner),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_can_only_search_and_book() {
        assert!(Role::User.has_capability(Capability::SearchSpots));
        assert!(Role::User.has_capability(Capability::BookSpots));
        assert!(!Role::User.has_capability(Capability::ManageOwnSpots));
        assert!(!Role::User.has_capability(Capability::UploadImages));
        assert!(!Role::User.has_capability(Capability::ReviewSpots));
    }

    #[test]
    fn owner_cannot_review_spots() {
        assert!(Role::Owner.has_capability(Capability::ManageOwnSpots));
        assert!(Role::Owner.has_capability(Capability::ViewOwnerBookings));
        assert!(!Role::Owner.has_capability(Capability::ReviewSpots));
        assert!(!Role::Owner.has_capability(Capability::ManageUsers));
        assert!(!Role::Owner.has_capability(Capability::ViewAnalytics));
    }

    #[test]
    fn admin_has_every_capability() {
        for capability in ADMIN_CAPABILITIES
            .iter()
            .chain(OWNER_CAPABILITIES)
            .chain(USER_CAPABILITIES)
        {
            assert!(Role::Admin.has_capability(*capability));
        }
    }

    #[test]
    fn role_from_str_is_case_insensitive() {
        assert_eq!(Role::from_str("Owner"), Some(Role::Owner));
        assert_eq!(Role::from_str(" ADMIN "), Some(Role::Admin));
        assert_eq!(Role::from_str("user"), Some(Role::User));
        assert_eq!(Role::from_str("superuser"), None);
    }

    #[test]
    fn role_str_roundtrip() {
        for role in Role::ALL {
            assert_eq!(Role::from_str(role.as_str()), Some(role));
        }
    }

    #[test]
    fn admin_is_not_self_assignable() {
        assert!(Role::User.is_self_assignable());
        assert!(Role::Owner.is_self_assignable());
        assert!(!Role::Admin.is_self_assignable());
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Owner).unwrap(), "\"owner\"");
        let parsed: Role = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(parsed, Role::Admin);
    }
}
