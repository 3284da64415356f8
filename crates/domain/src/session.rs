//! Session bookkeeping types.

use chrono::{DateTime, Utc};
use gatewell_core::UserId;
use serde::{Deserialize, Serialize};

/// One issued bearer credential the portal considers live unless revoked.
///
/// Presence of a row keyed by a token means "not administratively revoked";
/// absence means revoked or never tracked. Rows are created at login and
/// deleted on logout, admin revocation, or guard pruning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// The bearer credential itself; unique key.
    pub session_token: String,
    /// Owner of the session.
    pub user_id: UserId,
    /// When the credential was issued.
    pub created_at: DateTime<Utc>,
    /// When the credential expires on its own.
    pub expires_at: DateTime<Utc>,
    /// Client IP captured at login, if known.
    pub ip_address: Option<String>,
    /// Client user agent captured at login, if known.
    pub user_agent: Option<String>,
}

impl SessionRecord {
    /// Returns true once the record's own expiry has passed.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// The auth subsystem's own record of a live session.
///
/// Externally owned and read-only: ground truth for "not expired", but it
/// must be cross-referenced with [`SessionRecord`] for "not revoked".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSessionSnapshot {
    /// The auth subsystem's session identifier.
    pub session_id: String,
    /// Confirmed expiry, when the subsystem reports one.
    pub expires_at: Option<DateTime<Utc>>,
}

impl AuthSessionSnapshot {
    /// Returns true when the subsystem reports an expiry that has passed.
    /// A missing expiry counts as still live.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use gatewell_core::UserId;

    use super::{AuthSessionSnapshot, SessionRecord};

    #[test]
    fn record_expiry_is_inclusive_at_the_boundary() {
        let now = Utc::now();
        let record = SessionRecord {
            session_token: "token".to_owned(),
            user_id: UserId::new(),
            created_at: now - Duration::hours(1),
            expires_at: now,
            ip_address: None,
            user_agent: None,
        };

        assert!(record.is_expired(now));
        assert!(!record.is_expired(now - Duration::seconds(1)));
    }

    #[test]
    fn snapshot_without_expiry_counts_as_live() {
        let snapshot = AuthSessionSnapshot {
            session_id: "sid".to_owned(),
            expires_at: None,
        };
        assert!(!snapshot.is_expired(Utc::now()));
    }
}
