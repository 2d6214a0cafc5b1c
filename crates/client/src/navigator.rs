//! Client-side navigation hooks and route gating.
//!
//! The session store never decides how a redirect is carried out; it calls
//! a [`Navigator`]. A browser shell would change the location, the console
//! binary logs it, tests record it.

use std::sync::Mutex;

/// Route unauthenticated users are sent to.
pub const LOGIN_ROUTE: &str = "/login";

/// Route an authenticated user lands on.
pub const HOME_ROUTE: &str = "/dashboard";

/// Routes reachable without a session.
pub const PUBLIC_ROUTES: &[&str] = &[LOGIN_ROUTE];

/// Performs a client-side redirect.
pub trait Navigator: Send + Sync {
    fn redirect(&self, route: &str);
}

/// Navigator for headless use: records the redirect in the log only.
#[derive(Debug, Default)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn redirect(&self, route: &str) {
        tracing::warn!(route, "Redirect requested");
    }
}

/// Navigator that keeps every redirect it was asked to perform.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    history: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> Vec<String> {
        self.history.lock().map(|h| h.clone()).unwrap_or_default()
    }

    pub fn last(&self) -> Option<String> {
        self.history().pop()
    }
}

impl Navigator for RecordingNavigator {
    fn redirect(&self, route: &str) {
        if let Ok(mut history) = self.history.lock() {
            history.push(route.to_string());
        }
    }
}

/// Outcome of checking a route against the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    Allow,
    Redirect(&'static str),
}

/// Gate a route.
///
/// Protected routes need a session, otherwise the user goes to the login
/// page. A signed-in user opening the login page goes home instead.
pub fn decide_route(path: &str, authenticated: bool) -> RouteDecision {
    let path = normalize_path(path);
    let public = PUBLIC_ROUTES.contains(&path);
    match (public, authenticated) {
        (true, true) if path == LOGIN_ROUTE => RouteDecision::Redirect(HOME_ROUTE),
        (true, _) => RouteDecision::Allow,
        (false, true) => RouteDecision::Allow,
        (false, false) => RouteDecision::Redirect(LOGIN_ROUTE),
    }
}

/// Strip the query string, fragment and trailing slash.
fn normalize_path(path: &str) -> &str {
    let path = path.split(['?', '#']).next().unwrap_or(path);
    if path.len() > 1 {
        path.trim_end_matches('/')
    } else {
        path
    }
}
