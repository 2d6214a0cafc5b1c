//! Login, logout, and the current-user profile.

use oa_core::roles::PermissionPolicy;
use oa_core::types::DbId;
use oa_core::user::{Credentials, UserProfile};
use reqwest::Method;
use serde::de::Error as _;
use serde::Deserialize;

use crate::de;
use crate::error::ApiResult;
use crate::transport::ApiClient;

/// Payload of `POST /api/auth/login`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginDto {
    #[serde(default, deserialize_with = "de::opt_string")]
    token: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    access_token: Option<String>,
    #[serde(default, deserialize_with = "de::opt_id")]
    user_id: Option<DbId>,
    #[serde(default, deserialize_with = "de::opt_id")]
    id: Option<DbId>,
}

impl LoginDto {
    fn into_session(self) -> Result<(String, Option<DbId>), serde_json::Error> {
        let token = self
            .token
            .or(self.access_token)
            .ok_or_else(|| serde_json::Error::missing_field("token"))?;
        Ok((token, self.user_id.or(self.id)))
    }
}

/// Payload of `GET /api/auth/current-user`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfileDto {
    #[serde(default, deserialize_with = "de::opt_id")]
    id: Option<DbId>,
    #[serde(default, deserialize_with = "de::opt_id")]
    user_id: Option<DbId>,
    #[serde(default, deserialize_with = "de::string")]
    username: String,
    #[serde(default, deserialize_with = "de::string")]
    real_name: String,
    #[serde(default, deserialize_with = "de::string")]
    nickname: String,
    #[serde(default, deserialize_with = "de::string")]
    name: String,
    #[serde(default, deserialize_with = "de::string")]
    role: String,
    #[serde(default, deserialize_with = "de::string")]
    role_code: String,
    #[serde(default, deserialize_with = "de::list")]
    roles: Vec<String>,
    #[serde(default, deserialize_with = "de::list")]
    permissions: Vec<String>,
    #[serde(default, alias = "deptName", deserialize_with = "de::string")]
    department_name: String,
    #[serde(default, deserialize_with = "de::opt_string")]
    avatar: Option<String>,
}

impl ProfileDto {
    /// The profile must identify the user; every other field is optional.
    fn into_profile(self) -> Result<UserProfile, serde_json::Error> {
        let id = self
            .id
            .or(self.user_id)
            .ok_or_else(|| serde_json::Error::missing_field("id"))?;
        let first_role = self.roles.into_iter().next().unwrap_or_default();
        Ok(UserProfile {
            id,
            username: self.username,
            real_name: de::first_text([self.real_name, self.nickname, self.name]),
            role: de::first_text([self.role, self.role_code, first_role]),
            permissions: self.permissions,
            department_name: self.department_name,
            avatar: self.avatar,
        })
    }
}

impl ApiClient {
    /// Sign in, persist the new session, and fetch the profile.
    ///
    /// Any previously cached profile and reference data are discarded.
    pub async fn login(&self, credentials: &Credentials) -> ApiResult<UserProfile> {
        credentials.validate()?;

        let request = self
            .request(Method::POST, "/api/auth/login")
            .await
            .json(credentials);
        let login: LoginDto = self.execute(request).await?;
        let (token, user_id) = login.into_session()?;

        self.session().begin(token, user_id).await;
        self.cache().clear().await;
        tracing::info!(username = %credentials.username, "Signed in");

        self.refresh_profile().await
    }

    /// Sign out.
    ///
    /// The server call is best-effort: its failure is logged and the local
    /// session is cleared regardless.
    pub async fn logout(&self) {
        if self.session().is_authenticated().await {
            let request = self.request(Method::POST, "/api/auth/logout").await;
            if let Err(e) = self.execute_unit(request).await {
                tracing::warn!(error = %e, "Server logout failed, clearing local session anyway");
            }
        }
        self.session().clear().await;
        self.cache().clear().await;
        tracing::info!("Signed out");
    }

    /// Fetch the signed-in user's profile from the backend.
    pub async fn current_user(&self) -> ApiResult<UserProfile> {
        let request = self.request(Method::GET, "/api/auth/current-user").await;
        let dto: ProfileDto = self.execute(request).await?;
        Ok(dto.into_profile()?)
    }

    /// Refetch the profile and replace the cached copy.
    pub async fn refresh_profile(&self) -> ApiResult<UserProfile> {
        let profile = self.current_user().await?;
        self.session().set_profile(profile.clone()).await;
        Ok(profile)
    }

    /// The cached profile, fetched on first use after login or restore.
    ///
    /// Returns `None` when signed out.
    pub async fn profile(&self) -> ApiResult<Option<UserProfile>> {
        if !self.session().is_authenticated().await {
            return Ok(None);
        }
        if let Some(profile) = self.session().profile().await {
            return Ok(Some(profile));
        }
        self.refresh_profile().await.map(Some)
    }

    /// Fail unless the signed-in user may perform `permission`.
    ///
    /// Under [`PermissionPolicy::RoleBased`] a restored session has no
    /// profile yet, so it is fetched before the role is judged.
    pub(crate) async fn authorize(&self, permission: &str) -> ApiResult<()> {
        let session = self.session();
        if session.policy() == PermissionPolicy::RoleBased
            && session.is_authenticated().await
            && session.profile().await.is_none()
        {
            self.refresh_profile().await?;
        }
        session.require(permission).await?;
        Ok(())
    }
}
