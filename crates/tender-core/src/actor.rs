//! # Actor Model — Users, Roles, and Sessions
//!
//! The three roles of the marketplace and the session record every
//! mutating operation is attributed to.
//!
//! A `Session` always wraps an authenticated `User`; anonymous requests
//! carry no session at all (`Option<Session>` at the extraction layer).
//! Sessions are established by an external identity provider and resolved
//! from an opaque token — this crate only defines the shape.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::identity::UserId;
use crate::temporal::Timestamp;

/// The role of a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserType {
    /// A vendor who bids on opportunities.
    Vendor,
    /// Government staff who post and evaluate opportunities.
    Government,
    /// Platform administrator.
    Admin,
}

impl UserType {
    /// Parse a role label (e.g., `"VENDOR"`).
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        match raw {
            "VENDOR" => Ok(Self::Vendor),
            "GOVERNMENT" => Ok(Self::Government),
            "ADMIN" => Ok(Self::Admin),
            other => Err(CoreError::UnknownUserType(other.to_string())),
        }
    }

    /// Whether this role is government staff or an administrator.
    pub fn is_public_sector(&self) -> bool {
        matches!(self, Self::Government | Self::Admin)
    }
}

impl std::fmt::Display for UserType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Vendor => "VENDOR",
            Self::Government => "GOVERNMENT",
            Self::Admin => "ADMIN",
        };
        f.write_str(s)
    }
}

/// A user account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique account identifier.
    pub id: UserId,
    /// The account's role.
    pub user_type: UserType,
    /// Display name.
    pub name: String,
    /// Contact email, when the identity provider supplied one.
    pub email: Option<String>,
    /// Whether the account is active. Deactivated accounts keep their
    /// history but are denied every mutating operation.
    pub active: bool,
    /// When the user accepted the platform terms, if ever. Vendors must
    /// accept terms before creating or submitting proposals.
    pub accepted_terms_at: Option<Timestamp>,
    /// When the account was created.
    pub created_at: Timestamp,
}

impl User {
    /// Whether the user has accepted the platform terms.
    pub fn accepted_terms(&self) -> bool {
        self.accepted_terms_at.is_some()
    }
}

/// An authenticated session: the actor behind a request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// The authenticated user.
    pub user: User,
}

impl Session {
    /// Construct a session for the given user.
    pub fn for_user(user: User) -> Self {
        Self { user }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(user_type: UserType) -> User {
        User {
            id: UserId::new(),
            user_type,
            name: "Test User".to_string(),
            email: None,
            active: true,
            accepted_terms_at: None,
            created_at: Timestamp::now(),
        }
    }

    #[test]
    fn test_parse_roundtrip() {
        for ut in [UserType::Vendor, UserType::Government, UserType::Admin] {
            assert_eq!(UserType::parse(&ut.to_string()).unwrap(), ut);
        }
        assert!(UserType::parse("WIZARD").is_err());
    }

    #[test]
    fn test_public_sector() {
        assert!(!UserType::Vendor.is_public_sector());
        assert!(UserType::Government.is_public_sector());
        assert!(UserType::Admin.is_public_sector());
    }

    #[test]
    fn test_terms_acceptance() {
        let mut u = user(UserType::Vendor);
        assert!(!u.accepted_terms());
        u.accepted_terms_at = Some(Timestamp::now());
        assert!(u.accepted_terms());
    }

    #[test]
    fn test_user_serde_uses_camel_case() {
        let u = user(UserType::Government);
        let json = serde_json::to_string(&u).unwrap();
        assert!(json.contains("\"userType\":\"GOVERNMENT\""));
        assert!(json.contains("acceptedTermsAt"));
    }
}
