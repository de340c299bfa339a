//! Types for authentication

use serde::{Deserialize, Serialize};

use super::Session;

/// User data returned by the auth service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// The user ID
    pub id: String,

    /// The user's email address
    #[serde(default)]
    pub email: Option<String>,

    /// The user's role
    #[serde(default)]
    pub role: Option<String>,

    /// The audience the user's tokens are issued for
    #[serde(default)]
    pub aud: Option<String>,

    /// The last sign-in time
    #[serde(default)]
    pub last_sign_in_at: Option<String>,

    /// The app metadata
    #[serde(default)]
    pub app_metadata: serde_json::Value,

    /// The user metadata
    #[serde(default)]
    pub user_metadata: serde_json::Value,
}

impl User {
    /// A user with only an id and email, as issued by in-process backends
    pub fn new(id: &str, email: Option<&str>) -> Self {
        Self {
            id: id.to_string(),
            email: email.map(str::to_string),
            role: Some("authenticated".to_string()),
            aud: Some("authenticated".to_string()),
            last_sign_in_at: None,
            app_metadata: serde_json::Value::Null,
            user_metadata: serde_json::Value::Null,
        }
    }
}

/// Email/password credentials for the password grant
#[derive(Debug, Serialize)]
pub(crate) struct PasswordCredentials<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Body of the refresh token grant
#[derive(Debug, Serialize)]
pub(crate) struct RefreshTokenGrant<'a> {
    pub refresh_token: &'a str,
}

/// What happened to the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthChangeKind {
    /// A new session was created by signing in
    SignedIn,
    /// The session was ended locally or invalidated by the server
    SignedOut,
    /// The session was replaced with a refreshed one
    TokenRefreshed,
}

/// Notification broadcast on every session change
#[derive(Debug, Clone)]
pub struct AuthChangeEvent {
    /// The kind of change
    pub kind: AuthChangeKind,
    /// The session after the change, `None` once signed out
    pub session: Option<Session>,
}

impl AuthChangeEvent {
    pub fn signed_in(session: Session) -> Self {
        Self {
            kind: AuthChangeKind::SignedIn,
            session: Some(session),
        }
    }

    pub fn signed_out() -> Self {
        Self {
            kind: AuthChangeKind::SignedOut,
            session: None,
        }
    }

    pub fn token_refreshed(session: Session) -> Self {
        Self {
            kind: AuthChangeKind::TokenRefreshed,
            session: Some(session),
        }
    }
}
