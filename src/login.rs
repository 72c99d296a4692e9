use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordVerifier},
};
#[cfg(feature = "web")]
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
#[cfg(feature = "web")]
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
#[cfg(feature = "web")]
use std::sync::Arc;
use std::sync::RwLock;
use std::time::{Duration, SystemTime};
use uuid::Uuid;

#[cfg(feature = "web")]
use crate::app::AppState;

/// Name of the cookie carrying the manager session id
pub const SESSION_COOKIE: &str = "manager_session";

/// Manager login form data
#[derive(Debug, Serialize, Deserialize)]
pub struct ManagerCredentials {
    /// Password in plaintext (only transmitted, never stored)
    #[serde(default)]
    pub password: String,
}

/// Manager session data
#[derive(Debug, Clone)]
pub struct Session {
    /// Time when the session expires
    pub expires_at: SystemTime,
}

/// Active manager sessions
///
/// Sessions only live in process memory; restarting the server logs every
/// manager out.
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Create a new session
    ///
    /// Expired sessions are dropped on the way.
    ///
    /// # Returns
    /// * `String` - A unique session ID
    pub fn create_session(&self) -> String {
        let session_id = Uuid::new_v4().to_string();
        let now = SystemTime::now();
        let session = Session {
            expires_at: now + self.ttl,
        };

        if let Ok(mut sessions) = self.sessions.write() {
            sessions.retain(|_, s| s.expires_at > now);
            sessions.insert(session_id.clone(), session);
        }

        session_id
    }

    /// Check if a session exists and has not expired
    pub fn validate_session(&self, session_id: &str) -> bool {
        match self.sessions.read() {
            Ok(sessions) => sessions
                .get(session_id)
                .is_some_and(|s| s.expires_at > SystemTime::now()),
            Err(_) => false,
        }
    }

    pub fn drop_session(&self, session_id: &str) {
        if let Ok(mut sessions) = self.sessions.write() {
            sessions.remove(session_id);
        }
    }

    pub fn active_sessions(&self) -> usize {
        let now = SystemTime::now();
        self.sessions
            .read()
            .map(|sessions| sessions.values().filter(|s| s.expires_at > now).count())
            .unwrap_or(0)
    }
}

/// Verify a password against a stored hash
///
/// Checks if a plaintext password matches a stored Argon2 hash.
///
/// # Arguments
/// * `password` - The plaintext password to verify
/// * `hash` - The stored password hash to check against
///
/// # Returns
/// * `Result<bool, String>` - True if the password matches, false if not, or an error
///
/// # Errors
/// * Returns an error if the hash is in an invalid format
pub fn verify_password(password: &str, hash: &str) -> Result<bool, String> {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(hash) => hash,
        Err(_) => return Err("Invalid password hash format".to_string()),
    };

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(_) => Ok(true),
        Err(_) => Ok(false), // Password didn't match
    }
}

/// Handle manager login requests
///
/// A correct password starts a session and sends the browser back to the
/// manager console; anything else goes back to the login form with a message.
#[cfg(feature = "web")]
pub async fn handle_login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(credentials): Form<ManagerCredentials>,
) -> Response {
    if credentials.password.is_empty() {
        return Redirect::to("/manager").into_response();
    }

    match verify_password(&credentials.password, &state.config.manager_password_hash) {
        Ok(true) => {
            let session_id = state.sessions.create_session();
            log::info!(
                "manager logged in ({} active sessions)",
                state.sessions.active_sessions()
            );
            let cookie = Cookie::build((SESSION_COOKIE, session_id))
                .path("/")
                .http_only(true)
                .same_site(SameSite::Strict);
            (jar.add(cookie), Redirect::to("/manager")).into_response()
        }
        Ok(false) => {
            log::warn!("failed manager login");
            Redirect::to("/manager?error=Wrong+password").into_response()
        }
        Err(e) => {
            log::error!("manager password check failed: {}", e);
            Redirect::to("/manager?error=Authentication+error").into_response()
        }
    }
}

/// Handle manager logout
///
/// Drops the session and clears the cookie.
#[cfg(feature = "web")]
pub async fn handle_logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> (CookieJar, Redirect) {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        state.sessions.drop_session(cookie.value());
    }

    let removal = Cookie::build((SESSION_COOKIE, "")).path("/");
    (jar.remove(removal), Redirect::to("/manager"))
}

/// Whether the request carries a live manager session
#[cfg(feature = "web")]
pub fn is_manager(state: &AppState, jar: &CookieJar) -> bool {
    jar.get(SESSION_COOKIE)
        .is_some_and(|cookie| state.sessions.validate_session(cookie.value()))
}

/// Authentication middleware for the manager routes
///
/// Requests without a valid session are redirected to the login form.
#[cfg(feature = "web")]
pub async fn require_manager(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    request: axum::extract::Request,
    next: axum::middleware::Next,
) -> Response {
    if is_manager(&state, &jar) {
        return next.run(request).await;
    }

    Redirect::to("/manager").into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::hash_secret;

    #[test]
    fn verify_against_hash() {
        let hash = hash_secret("correct horse").unwrap();
        assert_eq!(verify_password("correct horse", &hash), Ok(true));
        assert_eq!(verify_password("Correct horse", &hash), Ok(false));
        assert!(verify_password("x", "not a hash").is_err());
    }

    #[test]
    fn sessions_expire() {
        let store = SessionStore::new(Duration::from_secs(60));
        let id = store.create_session();
        assert!(store.validate_session(&id));
        assert!(!store.validate_session("unknown"));
        store.drop_session(&id);
        assert!(!store.validate_session(&id));

        let expired = SessionStore::new(Duration::ZERO);
        let id = expired.create_session();
        assert!(!expired.validate_session(&id));
        assert_eq!(expired.active_sessions(), 0);
    }
}
