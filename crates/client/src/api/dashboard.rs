//! Dashboard figures and the overview fan-out.

use oa_core::dashboard::{DashboardOverview, DashboardStats};
use oa_core::notification::NotificationQuery;
use oa_core::page::PageQuery;
use reqwest::Method;
use serde::Deserialize;

use crate::de;
use crate::error::ApiResult;
use crate::transport::ApiClient;

/// Number of unread notifications shown on the dashboard.
pub const RECENT_NOTIFICATIONS: u64 = 5;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatsDto {
    #[serde(default, alias = "totalUsers", deserialize_with = "de::u64_or_zero")]
    user_count: u64,
    #[serde(default, alias = "totalDepartments", alias = "deptCount", deserialize_with = "de::u64_or_zero")]
    department_count: u64,
    #[serde(default, alias = "pendingApprovals", alias = "todoCount", deserialize_with = "de::u64_or_zero")]
    pending_workflow_count: u64,
    #[serde(default, alias = "todayMeetings", deserialize_with = "de::u64_or_zero")]
    today_meeting_count: u64,
    #[serde(default, alias = "unreadNotifications", alias = "unreadCount", deserialize_with = "de::u64_or_zero")]
    unread_notification_count: u64,
}

impl From<StatsDto> for DashboardStats {
    fn from(dto: StatsDto) -> Self {
        Self {
            user_count: dto.user_count,
            department_count: dto.department_count,
            pending_workflow_count: dto.pending_workflow_count,
            today_meeting_count: dto.today_meeting_count,
            unread_notification_count: dto.unread_notification_count,
        }
    }
}

impl ApiClient {
    pub async fn dashboard_stats(&self) -> ApiResult<DashboardStats> {
        let request = self.request(Method::GET, "/api/dashboard/stats").await;
        let dto: StatsDto = self.execute(request).await?;
        Ok(dto.into())
    }

    /// Load everything the dashboard renders, concurrently.
    pub async fn dashboard_overview(&self) -> ApiResult<DashboardOverview> {
        let unread = NotificationQuery {
            page: PageQuery::new(1, RECENT_NOTIFICATIONS),
            kind: None,
            is_read: Some(false),
        };
        let (stats, pending_tasks, notifications) = futures::try_join!(
            self.dashboard_stats(),
            self.pending_tasks(),
            self.list_notifications(&unread),
        )?;
        Ok(DashboardOverview {
            stats,
            pending_tasks,
            recent_notifications: notifications.records,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn stats_accept_aliases_and_strings() {
        let dto: StatsDto = serde_json::from_value(json!({
            "totalUsers": "120",
            "deptCount": 8,
            "todoCount": 3,
            "todayMeetings": null
        }))
        .unwrap();
        let stats = DashboardStats::from(dto);
        assert_eq!(stats.user_count, 120);
        assert_eq!(stats.department_count, 8);
        assert_eq!(stats.pending_workflow_count, 3);
        assert_eq!(stats.today_meeting_count, 0);
    }
}
