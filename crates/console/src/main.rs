//! `oa-console` -- headless shell for the OA admin console.
//!
//! Restores the persisted session, optionally signs in, gates the dashboard
//! route, and prints the dashboard overview as JSON. When a chat key is
//! configured it can also put one question to the assistant.
//!
//! # Environment variables
//!
//! Client settings (`OA_API_BASE_URL`, `OA_SESSION_FILE`, `OA_CHAT_*`, ...)
//! are documented on [`oa_client::config::ClientConfig`]. In addition:
//!
//! | Variable          | Required | Description                                  |
//! |-------------------|----------|----------------------------------------------|
//! | `OA_USERNAME`     | no       | Sign in with these credentials before loading |
//! | `OA_PASSWORD`     | no       | Password for `OA_USERNAME`                   |
//! | `OA_CHAT_PROMPT`  | no       | Question to send to the chat assistant       |

use std::sync::Arc;

use oa_client::chat::{ChatClient, Conversation};
use oa_client::config::ClientConfig;
use oa_client::navigator::{LogNavigator, RouteDecision, HOME_ROUTE};
use oa_client::storage::FileStorage;
use oa_client::{ApiClient, SessionStore};
use oa_core::user::Credentials;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const CHAT_SYSTEM_PROMPT: &str =
    "You are the assistant of an office automation console. Answer briefly.";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "oa_client=debug,oa_console=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ClientConfig::from_env().unwrap_or_else(|e| {
        tracing::error!(error = %e, "Invalid configuration");
        std::process::exit(1);
    });

    let storage = FileStorage::open(&config.session_file).unwrap_or_else(|e| {
        tracing::error!(path = %config.session_file.display(), error = %e, "Cannot open session file");
        std::process::exit(1);
    });
    let session = Arc::new(SessionStore::restore(
        Arc::new(storage),
        Arc::new(LogNavigator),
        config.permission_policy,
    ));
    let client = ApiClient::new(&config, session.clone()).unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to build HTTP client");
        std::process::exit(1);
    });

    tracing::info!(
        api_base_url = %config.api_base_url,
        restored = session.is_authenticated().await,
        "Starting oa-console",
    );

    if let (Ok(username), Ok(password)) = (std::env::var("OA_USERNAME"), std::env::var("OA_PASSWORD")) {
        match client.login(&Credentials::new(username, password)).await {
            Ok(profile) => tracing::info!(user = %profile.display_name(), role = %profile.role, "Signed in"),
            Err(e) => {
                tracing::error!(error = %e, "Sign-in failed");
                std::process::exit(1);
            }
        }
    }

    if session.check_route(HOME_ROUTE).await != RouteDecision::Allow {
        tracing::error!("No session; set OA_USERNAME and OA_PASSWORD to sign in");
        std::process::exit(1);
    }

    match client.dashboard_overview().await {
        Ok(overview) => match serde_json::to_string_pretty(&overview) {
            Ok(json) => println!("{json}"),
            Err(e) => tracing::error!(error = %e, "Failed to render overview"),
        },
        Err(e) => {
            if let Some(message) = e.toast_message() {
                tracing::error!(status = ?e.status(), "{message}");
            }
            std::process::exit(1);
        }
    }

    if let Ok(prompt) = std::env::var("OA_CHAT_PROMPT") {
        ask_assistant(config, &prompt).await;
    }
}

async fn ask_assistant(config: ClientConfig, prompt: &str) {
    let chat = ChatClient::new(config.chat);
    if !chat.is_enabled() {
        tracing::warn!("OA_CHAT_PROMPT set but OA_CHAT_API_KEY is not, skipping chat");
        return;
    }

    let mut conversation = Conversation::new(Some(CHAT_SYSTEM_PROMPT.to_string()));
    match conversation.ask(&chat, prompt).await {
        Ok(reply) => println!("{}", reply.content),
        Err(e) => tracing::error!(error = %e, "Chat request failed"),
    }
}
