//! Grading sessions.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{AccountId, SessionId};

/// How long a session stays usable after it starts.
pub const SESSION_TTL_MINUTES: i64 = 120;

/// A time-boxed window bounding and attributing metered feature usage.
///
/// At most one active, unexpired session per account (best effort, not
/// lock-enforced). A session past its TTL stays nominally active until the
/// account's next `start()` discovers and settles it; there is no sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Session id (ULID, time-ordered).
    pub id: SessionId,

    /// The owning account.
    pub account_id: AccountId,

    /// Current state. `Expired` is terminal for a session instance.
    pub status: SessionStatus,

    /// When the session started.
    pub started_at: DateTime<Utc>,

    /// Last time the session was touched by a `start()` reuse.
    pub last_activity_at: DateTime<Utc>,

    /// Fixed expiry: `started_at` + TTL.
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Start a fresh session at `now` with the standard TTL.
    #[must_use]
    pub fn start(account_id: AccountId, now: DateTime<Utc>) -> Self {
        Self {
            id: SessionId::generate(),
            account_id,
            status: SessionStatus::Active,
            started_at: now,
            last_activity_at: now,
            expires_at: now + Duration::minutes(SESSION_TTL_MINUTES),
        }
    }

    /// Whether the TTL has elapsed at `now`, regardless of stored status.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Record a reuse of the session without extending its expiry.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_activity_at = now;
    }
}

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Session is usable (by stored status; the TTL may have elapsed).
    Active,

    /// Session was settled. Terminal.
    Expired,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_session_expires_after_ttl() {
        let now = Utc::now();
        let session = Session::start(AccountId::generate(), now);

        assert_eq!(session.status, SessionStatus::Active);
        assert_eq!(session.expires_at, now + Duration::minutes(120));
        assert!(!session.is_expired(now + Duration::minutes(119)));
        assert!(session.is_expired(now + Duration::minutes(120)));
    }

    #[test]
    fn touch_does_not_extend_expiry() {
        let now = Utc::now();
        let mut session = Session::start(AccountId::generate(), now);
        let expires = session.expires_at;

        session.touch(now + Duration::minutes(30));
        assert_eq!(session.last_activity_at, now + Duration::minutes(30));
        assert_eq!(session.expires_at, expires);
    }
}
