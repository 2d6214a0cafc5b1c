//! Notification center.

use oa_core::notification::{Notification, NotificationKind, NotificationQuery};
use oa_core::page::Page;
use oa_core::types::{DbId, Timestamp};
use reqwest::Method;
use serde::Deserialize;

use crate::de;
use crate::envelope::PageDto;
use crate::error::ApiResult;
use crate::transport::ApiClient;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NotificationDto {
    #[serde(deserialize_with = "de::id")]
    id: DbId,
    #[serde(default, deserialize_with = "de::string")]
    title: String,
    #[serde(default, alias = "message", deserialize_with = "de::string")]
    content: String,
    #[serde(default, rename = "type", alias = "category", deserialize_with = "de::string")]
    kind: String,
    #[serde(default, alias = "read", deserialize_with = "de::flag")]
    is_read: bool,
    #[serde(default, alias = "createdAt", deserialize_with = "de::timestamp")]
    create_time: Option<Timestamp>,
}

impl From<NotificationDto> for Notification {
    fn from(dto: NotificationDto) -> Self {
        Self {
            id: dto.id,
            title: dto.title,
            content: dto.content,
            kind: NotificationKind::from_backend(&dto.kind),
            read: dto.is_read,
            created_at: dto.create_time,
        }
    }
}

/// Unread counter: either a bare number or `{ "count": n }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CountDto {
    Plain(u64),
    Wrapped {
        #[serde(alias = "unreadCount", alias = "total", deserialize_with = "de::u64_or_zero")]
        count: u64,
    },
}

impl ApiClient {
    pub async fn list_notifications(
        &self,
        query: &NotificationQuery,
    ) -> ApiResult<Page<Notification>> {
        let request = self
            .request(Method::GET, "/api/notifications")
            .await
            .query(query);
        let page: PageDto<NotificationDto> = self.execute(request).await?;
        Ok(page.into_page().map(Notification::from))
    }

    pub async fn mark_read(&self, id: DbId) -> ApiResult<()> {
        let request = self
            .request(Method::PUT, &format!("/api/notifications/{id}/read"))
            .await;
        self.execute_unit(request).await
    }

    pub async fn mark_all_read(&self) -> ApiResult<()> {
        let request = self
            .request(Method::PUT, "/api/notifications/read-all")
            .await;
        self.execute_unit(request).await
    }

    pub async fn delete_notification(&self, id: DbId) -> ApiResult<()> {
        let request = self
            .request(Method::DELETE, &format!("/api/notifications/{id}"))
            .await;
        self.execute_unit(request).await
    }

    /// Badge count for the header bell.
    pub async fn unread_count(&self) -> ApiResult<u64> {
        let request = self
            .request(Method::GET, "/api/notifications/unread-count")
            .await;
        let count: CountDto = self.execute(request).await?;
        Ok(match count {
            CountDto::Plain(n) | CountDto::Wrapped { count: n } => n,
        })
    }
}
