//! Account domain types.
//!
//! Administrators and users are separate credential namespaces; the same
//! username may exist once in each.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Authorization scope of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Creates and publishes courses.
    Admin,
    /// Browses and purchases courses.
    User,
}

impl Role {
    /// Table or document name holding this role's credentials.
    pub fn store_name(&self) -> &'static str {
        match self {
            Role::Admin => "admins",
            Role::User => "users",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::User => write!(f, "user"),
        }
    }
}

/// A stored identity/secret pair for one role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialRecord {
    /// Unique within the role's store.
    pub username: String,
    /// bcrypt hash of the secret.
    pub password_hash: String,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

impl CredentialRecord {
    /// Create a record from an already hashed secret.
    pub fn new(username: impl Into<String>, password_hash: String) -> Self {
        Self {
            username: username.into(),
            password_hash,
            created_at: Utc::now(),
        }
    }
}

/// A verified caller, attached to the request by the auth gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub role: Role,
    pub username: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_display_matches_claim_encoding() {
        assert_eq!(Role::Admin.to_string(), "admin");
        assert_eq!(Role::User.to_string(), "user");
        assert_eq!(serde_json::to_value(Role::Admin).unwrap(), "admin");
        assert_eq!(serde_json::from_str::<Role>("\"user\"").unwrap(), Role::User);
    }

    #[test]
    fn test_roles_use_distinct_stores() {
        assert_ne!(Role::Admin.store_name(), Role::User.store_name());
    }
}
