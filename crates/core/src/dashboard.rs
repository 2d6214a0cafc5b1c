//! Dashboard summary figures.

use serde::Serialize;

use crate::notification::Notification;
use crate::workflow::WorkflowTask;

/// Headline counters shown on the dashboard cards.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardStats {
    pub user_count: u64,
    pub department_count: u64,
    pub pending_workflow_count: u64,
    pub today_meeting_count: u64,
    pub unread_notification_count: u64,
}

/// Everything the dashboard page renders, loaded in one fan-out.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardOverview {
    pub stats: DashboardStats,
    pub pending_tasks: Vec<WorkflowTask>,
    pub recent_notifications: Vec<Notification>,
}
