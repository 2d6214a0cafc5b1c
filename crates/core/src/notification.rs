//! Notification center entries and client-side filtering.

use serde::Serialize;

use crate::page::PageQuery;
use crate::types::{DbId, Timestamp};

/// What produced a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    System,
    Workflow,
    Meeting,
    Announcement,
}

impl NotificationKind {
    /// Map a backend type string. Unrecognized values map to `System`.
    pub fn from_backend(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "workflow" | "approval" | "process" => Self::Workflow,
            "meeting" => Self::Meeting,
            "announcement" | "notice" => Self::Announcement,
            _ => Self::System,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Workflow => "workflow",
            Self::Meeting => "meeting",
            Self::Announcement => "announcement",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub id: DbId,
    pub title: String,
    pub content: String,
    pub kind: NotificationKind,
    pub read: bool,
    pub created_at: Option<Timestamp>,
}

/// Query for the paged notification list.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationQuery {
    #[serde(flatten)]
    pub page: PageQuery,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<NotificationKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_read: Option<bool>,
}

/// Tab/filter state of the notification center.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NotificationFilter {
    pub kind: Option<NotificationKind>,
    pub unread_only: bool,
}

impl NotificationFilter {
    pub fn matches(&self, notification: &Notification) -> bool {
        self.kind.map_or(true, |k| k == notification.kind)
            && (!self.unread_only || !notification.read)
    }

    pub fn apply<'a>(&self, notifications: &'a [Notification]) -> Vec<&'a Notification> {
        notifications.iter().filter(|n| self.matches(n)).collect()
    }
}

pub fn count_unread(notifications: &[Notification]) -> usize {
    notifications.iter().filter(|n| !n.read).count()
}
