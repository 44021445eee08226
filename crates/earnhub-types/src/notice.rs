//! Moderator-authored announcements

use crate::NoticeId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An announcement shown to users while active
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub id: NoticeId,
    pub title: String,
    pub content: String,
    pub published_at: DateTime<Utc>,
    /// Whether the notice is currently displayed
    pub is_active: bool,
}
