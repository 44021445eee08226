//! Moderator-facing notification records
//!
//! Notifications are derived, read-only observations of originating events.
//! Their only mutation is the bulk mark-all-read operation.

use crate::NotificationId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The originating event a notification reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Signup,
    Deposit,
    Submission,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Signup => "signup",
            Self::Deposit => "deposit",
            Self::Submission => "submission",
        };
        write!(f, "{}", name)
    }
}

/// One event record surfaced to moderators
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub kind: NotificationKind,
    pub message: String,
    /// Deep link into the moderation surface
    pub link: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}
