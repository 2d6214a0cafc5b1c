use std::path::PathBuf;
use std::time::Duration;

use oa_core::roles::PermissionPolicy;

/// Client configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development against a
/// backend on `localhost:8080`.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// REST backend base URL, without a trailing slash.
    pub api_base_url: String,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// File the session token and user id are persisted to.
    pub session_file: PathBuf,
    /// Client-side permission policy.
    pub permission_policy: PermissionPolicy,
    /// How long cached reference data (rooms, departments, roles) stays fresh.
    pub cache_ttl_secs: u64,
    pub chat: ChatConfig,
}

/// Settings for the OpenAI-compatible chat completion endpoint.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Base URL; `/chat/completions` is appended.
    pub api_url: String,
    /// Bearer key. Chat is disabled when absent.
    pub api_key: Option<String>,
    pub model: String,
}

/// Errors from reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} has invalid value '{value}': {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: &'static str,
    },
}

const DEFAULT_API_BASE_URL: &str = "http://localhost:8080";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_SESSION_FILE: &str = ".oa-session.json";
const DEFAULT_CACHE_TTL_SECS: u64 = 60;
const DEFAULT_CHAT_API_URL: &str = "https://api.openai.com/v1";
const DEFAULT_CHAT_MODEL: &str = "gpt-3.5-turbo";

impl ClientConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default                     |
    /// |---------------------------|-----------------------------|
    /// | `OA_API_BASE_URL`         | `http://localhost:8080`     |
    /// | `OA_REQUEST_TIMEOUT_SECS` | `30`                        |
    /// | `OA_SESSION_FILE`         | `.oa-session.json`          |
    /// | `OA_ENFORCE_PERMISSIONS`  | `false`                     |
    /// | `OA_CACHE_TTL_SECS`       | `60`                        |
    /// | `OA_CHAT_API_URL`         | `https://api.openai.com/v1` |
    /// | `OA_CHAT_API_KEY`         | unset (chat disabled)       |
    /// | `OA_CHAT_MODEL`           | `gpt-3.5-turbo`             |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_base_url = get("OA_API_BASE_URL")
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.into())
            .trim_end_matches('/')
            .to_string();

        let request_timeout_secs = parse_u64(
            "OA_REQUEST_TIMEOUT_SECS",
            get("OA_REQUEST_TIMEOUT_SECS"),
            DEFAULT_REQUEST_TIMEOUT_SECS,
        )?;

        let session_file = get("OA_SESSION_FILE")
            .unwrap_or_else(|| DEFAULT_SESSION_FILE.into())
            .into();

        let enforce = parse_bool("OA_ENFORCE_PERMISSIONS", get("OA_ENFORCE_PERMISSIONS"))?;

        let cache_ttl_secs = parse_u64(
            "OA_CACHE_TTL_SECS",
            get("OA_CACHE_TTL_SECS"),
            DEFAULT_CACHE_TTL_SECS,
        )?;

        let chat = ChatConfig {
            api_url: get("OA_CHAT_API_URL")
                .unwrap_or_else(|| DEFAULT_CHAT_API_URL.into())
                .trim_end_matches('/')
                .to_string(),
            api_key: get("OA_CHAT_API_KEY"),
            model: get("OA_CHAT_MODEL").unwrap_or_else(|| DEFAULT_CHAT_MODEL.into()),
        };

        Ok(Self {
            api_base_url,
            request_timeout_secs,
            session_file,
            permission_policy: PermissionPolicy::from_enforce_flag(enforce),
            cache_ttl_secs,
            chat,
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

fn parse_u64(var: &'static str, raw: Option<String>, default: u64) -> Result<u64, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
            var,
            value,
            reason: "expected a non-negative integer",
        }),
    }
}

fn parse_bool(var: &'static str, raw: Option<String>) -> Result<bool, ConfigError> {
    let Some(value) = raw else {
        return Ok(false);
    };
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            var,
            value,
            reason: "expected true or false",
        }),
    }
}
