use serde::{Deserialize, Serialize};

use crate::UserId;

/// Portal role attached to an authenticated requester.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortalRole {
    /// Regular portal account.
    Member,
    /// Administrative account with cross-user access.
    Admin,
}

impl PortalRole {
    /// Returns true for roles allowed to act on other users' resources.
    #[must_use]
    pub fn is_elevated(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

/// Identity of the requester behind a privileged call, as resolved by the
/// auth subsystem from the presented bearer credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequesterIdentity {
    user_id: UserId,
    email: Option<String>,
    role: PortalRole,
}

impl RequesterIdentity {
    /// Creates a requester identity from resolved authentication data.
    #[must_use]
    pub fn new(user_id: UserId, email: Option<String>, role: PortalRole) -> Self {
        Self {
            user_id,
            email,
            role,
        }
    }

    /// Returns the stable user identifier.
    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the email, if the auth subsystem returned one.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Returns the portal role.
    #[must_use]
    pub fn role(&self) -> PortalRole {
        self.role
    }

    /// Returns true if the requester may act on the given user's resources.
    #[must_use]
    pub fn can_act_for(&self, user_id: UserId) -> bool {
        self.user_id == user_id || self.role.is_elevated()
    }
}
