use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::AppState;

pub const COOKIE_NAME: &str = "ps_session";

struct Session {
    username: String,
    expires_at: Instant,
}

/// Live login sessions keyed by opaque cookie token. Owned by `AppState`.
pub struct SessionStore {
    ttl: Duration,
    sessions: Mutex<HashMap<String, Session>>,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Start a session and return its token. Expired sessions are pruned.
    pub async fn create(&self, username: &str) -> String {
        let token = Uuid::new_v4().simple().to_string();
        let now = Instant::now();
        let mut sessions = self.sessions.lock().await;
        sessions.retain(|_, s| s.expires_at > now);
        sessions.insert(
            token.clone(),
            Session {
                username: username.to_string(),
                expires_at: now + self.ttl,
            },
        );
        token
    }

    pub async fn lookup(&self, token: &str) -> Option<String> {
        let sessions = self.sessions.lock().await;
        sessions
            .get(token)
            .filter(|s| s.expires_at > Instant::now())
            .map(|s| s.username.clone())
    }

    pub async fn revoke(&self, token: &str) {
        self.sessions.lock().await.remove(token);
    }
}

/// Logged-in user. Extract this in handlers that require auth; anything
/// else redirects to /login.
pub struct AuthSession {
    pub username: String,
    pub token: String,
}

impl FromRequestParts<Arc<AppState>> for AuthSession {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let cookie_header = parts
            .headers
            .get(axum::http::header::COOKIE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        if let Some(token) = parse_cookie(cookie_header, COOKIE_NAME) {
            if let Some(username) = state.sessions.lookup(token).await {
                return Ok(AuthSession {
                    username,
                    token: token.to_string(),
                });
            }
        }

        Err(Redirect::to("/login").into_response())
    }
}

pub fn check_credentials(users: &HashMap<String, String>, username: &str, password: &str) -> bool {
    users
        .get(username)
        .is_some_and(|expected| constant_time_eq(expected.as_bytes(), password.as_bytes()))
}

pub fn session_cookie(token: &str, ttl: Duration) -> String {
    format!(
        "{COOKIE_NAME}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        ttl.as_secs()
    )
}

pub fn clear_session_cookie() -> String {
    format!("{COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

fn parse_cookie<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header.split(';').find_map(|part| {
        part.trim()
            .strip_prefix(name)
            .and_then(|v| v.strip_prefix('='))
            .filter(|v| !v.is_empty())
    })
}
