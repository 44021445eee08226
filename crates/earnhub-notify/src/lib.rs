//! EarnHub Notify - moderator notifications and the notice board
//!
//! The notification store is a one-way observer: originating events (signup,
//! deposit request, submission) append read/unread records, and the only
//! mutation is the bulk mark-all-read. It makes no decisions and a failed
//! command never leaves a partial notification behind, because emission
//! happens after the originating command has succeeded.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::debug;

use earnhub_types::{
    CoreError, Notice, NoticeId, Notification, NotificationId, NotificationKind, Result,
};

/// Append-only store of moderator-facing event records
pub struct NotificationStore {
    notifications: RwLock<Vec<Notification>>,
}

impl NotificationStore {
    pub fn new() -> Self {
        Self {
            notifications: RwLock::new(Vec::new()),
        }
    }

    /// Append an unread notification for an originating event
    pub fn emit(
        &self,
        kind: NotificationKind,
        message: impl Into<String>,
        link: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Notification {
        let notification = Notification {
            id: NotificationId::new(),
            kind,
            message: message.into(),
            link: link.into(),
            is_read: false,
            created_at: now,
        };
        debug!(notification = %notification.id, %kind, "notification emitted");
        self.notifications.write().push(notification.clone());
        notification
    }

    /// All notifications, newest first
    pub fn list(&self) -> Vec<Notification> {
        self.notifications.read().iter().rev().cloned().collect()
    }

    /// Notifications of one kind, newest first
    pub fn of_kind(&self, kind: NotificationKind) -> Vec<Notification> {
        self.notifications
            .read()
            .iter()
            .rev()
            .filter(|n| n.kind == kind)
            .cloned()
            .collect()
    }

    /// Number of unread notifications
    pub fn unread_count(&self) -> usize {
        self.notifications
            .read()
            .iter()
            .filter(|n| !n.is_read)
            .count()
    }

    /// Bulk mark every notification read
    pub fn mark_all_read(&self) {
        for notification in self.notifications.write().iter_mut() {
            notification.is_read = true;
        }
    }
}

impl Default for NotificationStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Moderator-authored announcements shown to users while active
pub struct NoticeBoard {
    notices: RwLock<HashMap<NoticeId, Notice>>,
}

impl NoticeBoard {
    pub fn new() -> Self {
        Self {
            notices: RwLock::new(HashMap::new()),
        }
    }

    /// Publish a new notice, active immediately
    pub fn publish(
        &self,
        title: impl Into<String>,
        content: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Notice {
        let notice = Notice {
            id: NoticeId::new(),
            title: title.into(),
            content: content.into(),
            published_at: now,
            is_active: true,
        };
        self.notices.write().insert(notice.id, notice.clone());
        notice
    }

    /// Edit a notice's title and content
    pub fn update(&self, id: NoticeId, title: String, content: String) -> Result<Notice> {
        let mut notices = self.notices.write();
        let notice = notices
            .get_mut(&id)
            .ok_or_else(|| CoreError::not_found("notice", id))?;
        notice.title = title;
        notice.content = content;
        Ok(notice.clone())
    }

    /// Toggle whether a notice is currently displayed
    pub fn set_active(&self, id: NoticeId, active: bool) -> Result<()> {
        let mut notices = self.notices.write();
        let notice = notices
            .get_mut(&id)
            .ok_or_else(|| CoreError::not_found("notice", id))?;
        notice.is_active = active;
        Ok(())
    }

    /// Delete a notice
    pub fn remove(&self, id: NoticeId) -> Result<()> {
        self.notices
            .write()
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| CoreError::not_found("notice", id))
    }

    /// Every notice, newest first
    pub fn list(&self) -> Vec<Notice> {
        let mut notices: Vec<Notice> = self.notices.read().values().cloned().collect();
        notices.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        notices
    }

    /// Currently displayed notices, newest first
    pub fn active(&self) -> Vec<Notice> {
        self.list().into_iter().filter(|n| n.is_active).collect()
    }
}

impl Default for NoticeBoard {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_and_mark_all_read() {
        let store = NotificationStore::new();
        store.emit(
            NotificationKind::Signup,
            "New user signup: Rahim",
            "/admin/users",
            Utc::now(),
        );
        store.emit(
            NotificationKind::Deposit,
            "New deposit request from Rahim",
            "/admin/deposits",
            Utc::now(),
        );
        assert_eq!(store.unread_count(), 2);

        store.mark_all_read();
        assert_eq!(store.unread_count(), 0);
        assert!(store.list().iter().all(|n| n.is_read));
    }

    #[test]
    fn test_list_is_newest_first() {
        let store = NotificationStore::new();
        let first = store.emit(NotificationKind::Signup, "first", "/a", Utc::now());
        let second = store.emit(NotificationKind::Signup, "second", "/b", Utc::now());
        let listed = store.list();
        assert_eq!(listed[0].id, second.id);
        assert_eq!(listed[1].id, first.id);
    }

    #[test]
    fn test_filter_by_kind() {
        let store = NotificationStore::new();
        store.emit(NotificationKind::Signup, "signup", "/a", Utc::now());
        store.emit(NotificationKind::Submission, "proofs", "/b", Utc::now());
        assert_eq!(store.of_kind(NotificationKind::Submission).len(), 1);
    }

    #[test]
    fn test_notice_lifecycle() {
        let board = NoticeBoard::new();
        let notice = board.publish("Payout schedule", "Payouts run on Fridays", Utc::now());
        assert_eq!(board.active().len(), 1);

        board.set_active(notice.id, false).unwrap();
        assert!(board.active().is_empty());
        assert_eq!(board.list().len(), 1);

        board
            .update(notice.id, "Payouts".to_string(), "Fridays only".to_string())
            .unwrap();
        board.remove(notice.id).unwrap();
        assert!(matches!(
            board.set_active(notice.id, true),
            Err(CoreError::NotFound { .. })
        ));
    }
}
