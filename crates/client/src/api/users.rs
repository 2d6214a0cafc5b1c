//! User directory.

use oa_core::error::CoreError;
use oa_core::page::Page;
use oa_core::roles::PERM_USER_MANAGE;
use oa_core::types::{DbId, Timestamp};
use oa_core::user::{CreateUser, UpdateUser, User, UserQuery, UserStatus};
use reqwest::Method;
use serde::Deserialize;

use crate::de;
use crate::envelope::PageDto;
use crate::error::ApiResult;
use crate::transport::ApiClient;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserDto {
    #[serde(deserialize_with = "de::id")]
    id: DbId,
    #[serde(default, deserialize_with = "de::string")]
    username: String,
    #[serde(default, deserialize_with = "de::string")]
    real_name: String,
    #[serde(default, deserialize_with = "de::string")]
    nickname: String,
    #[serde(default, deserialize_with = "de::string")]
    email: String,
    #[serde(default, deserialize_with = "de::string")]
    phone: String,
    #[serde(default, alias = "departmentId", deserialize_with = "de::opt_id")]
    dept_id: Option<DbId>,
    #[serde(default, alias = "departmentName", deserialize_with = "de::string")]
    dept_name: String,
    #[serde(default, deserialize_with = "de::string")]
    role: String,
    #[serde(default, deserialize_with = "de::string")]
    role_name: String,
    #[serde(default, deserialize_with = "de::string")]
    role_code: String,
    #[serde(default = "default_status", deserialize_with = "de::user_status")]
    status: UserStatus,
    #[serde(default, alias = "createdAt", deserialize_with = "de::timestamp")]
    create_time: Option<Timestamp>,
}

fn default_status() -> UserStatus {
    UserStatus::Active
}

impl From<UserDto> for User {
    fn from(dto: UserDto) -> Self {
        Self {
            id: dto.id,
            username: dto.username,
            real_name: de::first_text([dto.real_name, dto.nickname]),
            email: dto.email,
            phone: dto.phone,
            department_id: dto.dept_id,
            department_name: dto.dept_name,
            role: de::first_text([dto.role, dto.role_name, dto.role_code]),
            status: dto.status,
            created_at: dto.create_time,
        }
    }
}

impl ApiClient {
    /// One page of the user directory.
    pub async fn list_users(&self, query: &UserQuery) -> ApiResult<Page<User>> {
        let request = self.request(Method::GET, "/api/users").await.query(query);
        let page: PageDto<UserDto> = self.execute(request).await?;
        Ok(page.into_page().map(User::from))
    }

    pub async fn get_user(&self, id: DbId) -> ApiResult<User> {
        let request = self.request(Method::GET, &format!("/api/users/{id}")).await;
        let dto: Option<UserDto> = self.execute(request).await?;
        dto.map(User::from)
            .ok_or_else(|| CoreError::NotFound { entity: "user", id }.into())
    }

    pub async fn create_user(&self, payload: &CreateUser) -> ApiResult<()> {
        self.authorize(PERM_USER_MANAGE).await?;
        payload.validate()?;
        let request = self.request(Method::POST, "/api/users").await.json(payload);
        self.execute_unit(request).await?;
        tracing::info!(username = %payload.username, "User created");
        Ok(())
    }

    pub async fn update_user(&self, id: DbId, payload: &UpdateUser) -> ApiResult<()> {
        self.authorize(PERM_USER_MANAGE).await?;
        payload.validate()?;
        let request = self
            .request(Method::PUT, &format!("/api/users/{id}"))
            .await
            .json(payload);
        self.execute_unit(request).await
    }

    pub async fn delete_user(&self, id: DbId) -> ApiResult<()> {
        self.authorize(PERM_USER_MANAGE).await?;
        let request = self.request(Method::DELETE, &format!("/api/users/{id}")).await;
        self.execute_unit(request).await?;
        tracing::info!(user_id = id, "User deleted");
        Ok(())
    }

    /// Reset a user's password to the backend default.
    pub async fn reset_password(&self, id: DbId) -> ApiResult<()> {
        self.authorize(PERM_USER_MANAGE).await?;
        let request = self
            .request(Method::PUT, &format!("/api/users/{id}/reset-password"))
            .await;
        self.execute_unit(request).await
    }
}
