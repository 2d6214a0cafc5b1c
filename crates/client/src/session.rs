//! Auth session store: bearer token, user id, and the cached profile.
//!
//! The store is the only writer of session state. The token is read before
//! every request; it changes only on login, logout, and expiry (401/403).

use std::sync::Arc;

use oa_core::error::CoreError;
use oa_core::roles::PermissionPolicy;
use oa_core::types::DbId;
use oa_core::user::UserProfile;
use tokio::sync::RwLock;

use crate::navigator::{decide_route, Navigator, RouteDecision, LOGIN_ROUTE};
use crate::storage::SessionStorage;

/// Storage key holding the bearer token.
pub const TOKEN_KEY: &str = "token";

/// Storage key holding the signed-in user's id.
pub const USER_ID_KEY: &str = "userId";

#[derive(Debug, Default)]
struct SessionState {
    token: Option<String>,
    user_id: Option<DbId>,
    profile: Option<UserProfile>,
}

/// Holds the current session and persists it through a [`SessionStorage`].
///
/// Designed to be wrapped in `Arc` and shared between the API client and
/// whatever drives navigation.
pub struct SessionStore {
    storage: Arc<dyn SessionStorage>,
    navigator: Arc<dyn Navigator>,
    policy: PermissionPolicy,
    state: RwLock<SessionState>,
}

impl SessionStore {
    /// Create a store, restoring the token and user id from storage.
    ///
    /// The profile is never persisted; it is fetched again after restore.
    /// Unreadable storage yields an empty session.
    pub fn restore(
        storage: Arc<dyn SessionStorage>,
        navigator: Arc<dyn Navigator>,
        policy: PermissionPolicy,
    ) -> Self {
        let token = read_key(storage.as_ref(), TOKEN_KEY).filter(|t| !t.is_empty());
        let user_id = read_key(storage.as_ref(), USER_ID_KEY).and_then(|v| v.parse().ok());

        if token.is_some() {
            tracing::debug!(?user_id, "Restored persisted session");
        }

        Self {
            storage,
            navigator,
            policy,
            state: RwLock::new(SessionState {
                token,
                user_id,
                profile: None,
            }),
        }
    }

    /// Current bearer token, if signed in.
    pub async fn token(&self) -> Option<String> {
        self.state.read().await.token.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.state.read().await.token.is_some()
    }

    pub async fn user_id(&self) -> Option<DbId> {
        self.state.read().await.user_id
    }

    /// Cached profile, if one has been fetched since the last login.
    pub async fn profile(&self) -> Option<UserProfile> {
        self.state.read().await.profile.clone()
    }

    pub fn policy(&self) -> PermissionPolicy {
        self.policy
    }

    /// Start a new session: persist the token (and user id when known) and
    /// drop any cached profile so it is refetched.
    pub async fn begin(&self, token: String, user_id: Option<DbId>) {
        self.persist(TOKEN_KEY, &token);
        match user_id {
            Some(id) => self.persist(USER_ID_KEY, &id.to_string()),
            None => self.forget(USER_ID_KEY),
        }

        let mut state = self.state.write().await;
        state.token = Some(token);
        state.user_id = user_id;
        state.profile = None;
        tracing::info!(?user_id, "Session started");
    }

    /// Cache the fetched profile, recording its id as the session user.
    pub async fn set_profile(&self, profile: UserProfile) {
        let mut state = self.state.write().await;
        if state.user_id != Some(profile.id) {
            self.persist(USER_ID_KEY, &profile.id.to_string());
            state.user_id = Some(profile.id);
        }
        state.profile = Some(profile);
    }

    /// Clear the session locally: memory and persisted keys.
    ///
    /// Storage failures are logged; the in-memory session is cleared
    /// regardless.
    pub async fn clear(&self) {
        self.forget(TOKEN_KEY);
        self.forget(USER_ID_KEY);
        *self.state.write().await = SessionState::default();
    }

    /// The backend rejected the session: clear it and send the user to the
    /// login route.
    pub async fn expire(&self, status: u16) {
        tracing::warn!(status, "Session rejected by backend, signing out");
        self.clear().await;
        self.navigator.redirect(LOGIN_ROUTE);
    }

    /// Whether the signed-in user may perform `permission`.
    ///
    /// Signed-out users hold no permissions. Signed-in users whose profile
    /// has not been fetched yet are judged with an empty role.
    pub async fn has_permission(&self, permission: &str) -> bool {
        let state = self.state.read().await;
        if state.token.is_none() {
            return false;
        }
        match &state.profile {
            Some(profile) => profile.can(self.policy, permission),
            None => self.policy.allows("", &[], permission),
        }
    }

    /// Fail unless the signed-in user may perform `permission`.
    pub async fn require(&self, permission: &str) -> Result<(), CoreError> {
        if !self.is_authenticated().await {
            return Err(CoreError::Unauthorized("Not signed in".into()));
        }
        if !self.has_permission(permission).await {
            tracing::debug!(permission, "Action denied by permission policy");
            return Err(CoreError::Forbidden(format!("Missing permission '{permission}'")));
        }
        Ok(())
    }

    /// Gate navigation to `path` and perform the redirect when denied.
    pub async fn check_route(&self, path: &str) -> RouteDecision {
        let decision = decide_route(path, self.is_authenticated().await);
        if let RouteDecision::Redirect(target) = decision {
            tracing::debug!(path, target, "Route redirected");
            self.navigator.redirect(target);
        }
        decision
    }

    fn persist(&self, key: &str, value: &str) {
        if let Err(e) = self.storage.set(key, value) {
            tracing::error!(key, error = %e, "Failed to persist session key");
        }
    }

    fn forget(&self, key: &str) {
        if let Err(e) = self.storage.remove(key) {
            tracing::error!(key, error = %e, "Failed to remove session key");
        }
    }
}

fn read_key(storage: &dyn SessionStorage, key: &str) -> Option<String> {
    storage.get(key).unwrap_or_else(|e| {
        tracing::error!(key, error = %e, "Failed to read session key");
        None
    })
}

#[cfg(test)]
mod tests {
    use oa_core::roles::{ROLE_ADMIN, ROLE_EMPLOYEE};

    use super::*;
    use crate::navigator::{RecordingNavigator, HOME_ROUTE};
    use crate::storage::MemoryStorage;

    fn store(policy: PermissionPolicy) -> (SessionStore, Arc<MemoryStorage>, Arc<RecordingNavigator>) {
        let storage = Arc::new(MemoryStorage::new());
        let navigator = Arc::new(RecordingNavigator::new());
        let session = SessionStore::restore(storage.clone(), navigator.clone(), policy);
        (session, storage, navigator)
    }

    fn profile(id: DbId, role: &str) -> UserProfile {
        UserProfile {
            id,
            username: "u".into(),
            real_name: String::new(),
            role: role.into(),
            permissions: vec![],
            department_name: String::new(),
            avatar: None,
        }
    }

    #[tokio::test]
    async fn restore_reads_persisted_keys() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(TOKEN_KEY, "abc").unwrap();
        storage.set(USER_ID_KEY, "42").unwrap();

        let session = SessionStore::restore(
            storage,
            Arc::new(RecordingNavigator::new()),
            PermissionPolicy::AllowAll,
        );
        assert_eq!(session.token().await.as_deref(), Some("abc"));
        assert_eq!(session.user_id().await, Some(42));
        assert!(session.profile().await.is_none());
    }

    #[tokio::test]
    async fn begin_persists_and_drops_profile() {
        let (session, storage, _) = store(PermissionPolicy::AllowAll);
        session.begin("t1".into(), Some(1)).await;
        session.set_profile(profile(1, ROLE_ADMIN)).await;

        session.begin("t2".into(), None).await;
        assert_eq!(storage.get(TOKEN_KEY).unwrap().as_deref(), Some("t2"));
        assert!(storage.get(USER_ID_KEY).unwrap().is_none());
        assert!(session.profile().await.is_none());
    }

    #[tokio::test]
    async fn set_profile_records_user_id() {
        let (session, storage, _) = store(PermissionPolicy::AllowAll);
        session.begin("t".into(), None).await;
        session.set_profile(profile(9, ROLE_EMPLOYEE)).await;
        assert_eq!(session.user_id().await, Some(9));
        assert_eq!(storage.get(USER_ID_KEY).unwrap().as_deref(), Some("9"));
    }

    #[tokio::test]
    async fn expire_clears_keys_and_redirects() {
        let (session, storage, navigator) = store(PermissionPolicy::AllowAll);
        session.begin("t".into(), Some(3)).await;

        session.expire(401).await;

        assert!(!session.is_authenticated().await);
        assert!(storage.is_empty());
        assert_eq!(navigator.last().as_deref(), Some(LOGIN_ROUTE));
    }

    #[tokio::test]
    async fn permissions_follow_policy() {
        let (session, _, _) = store(PermissionPolicy::RoleBased);
        assert!(!session.has_permission("user:delete").await);

        session.begin("t".into(), Some(1)).await;
        session.set_profile(profile(1, ROLE_EMPLOYEE)).await;
        assert!(!session.has_permission("user:delete").await);

        session.set_profile(profile(1, ROLE_ADMIN)).await;
        assert!(session.has_permission("user:delete").await);
    }

    #[tokio::test]
    async fn require_distinguishes_signed_out_from_forbidden() {
        let (session, _, _) = store(PermissionPolicy::RoleBased);
        assert!(matches!(
            session.require("user:manage").await,
            Err(CoreError::Unauthorized(_))
        ));

        session.begin("t".into(), Some(1)).await;
        session.set_profile(profile(1, ROLE_EMPLOYEE)).await;
        assert!(matches!(
            session.require("user:manage").await,
            Err(CoreError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn allow_all_grants_signed_in_users() {
        let (session, _, _) = store(PermissionPolicy::AllowAll);
        session.begin("t".into(), Some(1)).await;
        assert!(session.has_permission("user:delete").await);
    }

    #[tokio::test]
    async fn check_route_redirects_when_signed_out() {
        let (session, _, navigator) = store(PermissionPolicy::AllowAll);
        assert_eq!(
            session.check_route("/workflows").await,
            RouteDecision::Redirect(LOGIN_ROUTE)
        );
        assert_eq!(navigator.last().as_deref(), Some(LOGIN_ROUTE));

        session.begin("t".into(), None).await;
        assert_eq!(session.check_route("/workflows").await, RouteDecision::Allow);
        assert_eq!(
            session.check_route("/login").await,
            RouteDecision::Redirect(HOME_ROUTE)
        );
    }
}
