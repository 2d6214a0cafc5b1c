//! Shared helpers for oa-client integration tests.
//!
//! Each test spins up an axum router on an ephemeral port to stand in for
//! the OA backend, and builds an [`ApiClient`] against it with in-memory
//! session storage and a recording navigator.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::Router;
use oa_client::cache::QueryCache;
use oa_client::navigator::RecordingNavigator;
use oa_client::session::TOKEN_KEY;
use oa_client::storage::{MemoryStorage, SessionStorage};
use oa_client::{ApiClient, SessionStore};
use oa_core::roles::PermissionPolicy;
use serde_json::{json, Value};

/// Client plus handles on everything it was built from.
pub struct TestClient {
    pub client: ApiClient,
    pub storage: Arc<MemoryStorage>,
    pub navigator: Arc<RecordingNavigator>,
    pub base_url: String,
}

/// Serve `router` on `127.0.0.1:0` and return its base URL.
pub async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock backend");
    let addr = listener.local_addr().expect("mock backend address");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("mock backend");
    });
    format!("http://{addr}")
}

/// Serve `router` and build a signed-out client against it.
pub async fn client_for(router: Router) -> TestClient {
    build(router, Arc::new(MemoryStorage::new()), PermissionPolicy::AllowAll).await
}

/// Build a client whose storage already holds `token`, as after a restart.
pub async fn signed_in_client_for(router: Router, token: &str) -> TestClient {
    signed_in_client_with_policy(router, token, PermissionPolicy::AllowAll).await
}

/// Like [`signed_in_client_for`], with a chosen permission policy.
pub async fn signed_in_client_with_policy(
    router: Router,
    token: &str,
    policy: PermissionPolicy,
) -> TestClient {
    let storage = Arc::new(MemoryStorage::new());
    storage.set(TOKEN_KEY, token).expect("seed token");
    build(router, storage, policy).await
}

async fn build(router: Router, storage: Arc<MemoryStorage>, policy: PermissionPolicy) -> TestClient {
    let base_url = serve(router).await;
    let navigator = Arc::new(RecordingNavigator::new());
    let session = Arc::new(SessionStore::restore(
        storage.clone(),
        navigator.clone(),
        policy,
    ));
    let client = ApiClient::with_client(
        reqwest::Client::new(),
        base_url.clone(),
        session,
        QueryCache::new(Duration::from_secs(60)),
    );
    TestClient {
        client,
        storage,
        navigator,
        base_url,
    }
}

/// Wrap `data` in the backend's success envelope.
pub fn ok(data: Value) -> Value {
    json!({ "code": 0, "msg": "success", "data": data })
}

/// Records the `Authorization` header of each request a handler sees.
#[derive(Clone, Default)]
pub struct AuthLog(Arc<Mutex<Vec<Option<String>>>>);

impl AuthLog {
    pub fn record(&self, headers: &HeaderMap) {
        let value = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        self.0.lock().unwrap().push(value);
    }

    pub fn entries(&self) -> Vec<Option<String>> {
        self.0.lock().unwrap().clone()
    }
}
