//! Password sign-in and session management against the Supabase auth service

mod session;
mod types;

use reqwest::Client;
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;

use crate::config::ClientOptions;
use crate::error::Error;
use crate::fetch::Fetch;

pub use session::*;
pub use types::*;

/// Client for Supabase Authentication
pub struct Auth {
    /// The base URL for the Supabase project
    url: String,

    /// The anonymous API key for the Supabase project
    key: String,

    /// HTTP client used for requests
    client: Client,

    /// The current session
    session: Arc<RwLock<Option<Session>>>,

    /// Session change notifications
    changes: broadcast::Sender<AuthChangeEvent>,

    /// Client options
    options: ClientOptions,
}

impl Auth {
    /// Create a new Auth client
    pub fn new(url: &str, key: &str, client: Client, options: ClientOptions) -> Self {
        let (changes, _) = broadcast::channel(16);
        Self {
            url: url.trim_end_matches('/').to_string(),
            key: key.to_string(),
            client,
            session: Arc::new(RwLock::new(None)),
            changes,
            options,
        }
    }

    fn get_auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1{}", self.url, path)
    }

    /// Subscribe to session changes
    pub fn on_auth_state_change(&self) -> broadcast::Receiver<AuthChangeEvent> {
        self.changes.subscribe()
    }

    fn store(&self, session: Option<Session>) {
        let mut guard = self.session.write().unwrap_or_else(|e| e.into_inner());
        *guard = session;
    }

    fn notify(&self, event: AuthChangeEvent) {
        log::info!("auth state changed: {:?}", event.kind);
        // No receivers is fine.
        let _ = self.changes.send(event);
    }

    /// Sign in a user with email and password
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, Error> {
        let url = self.get_auth_url("/token?grant_type=password");

        let session = Fetch::post(&self.client, &url)
            .header("apikey", &self.key)
            .timeout(self.options.request_timeout)
            .json(&PasswordCredentials { email, password })?
            .execute::<Session>()
            .await?
            .stamp_expiry();

        self.store(Some(session.clone()));
        self.notify(AuthChangeEvent::signed_in(session.clone()));

        Ok(session)
    }

    /// Exchange the refresh token for a new session.
    ///
    /// A rejected refresh means the session was invalidated server-side, so it
    /// is dropped and a sign-out is broadcast.
    pub async fn refresh_session(&self) -> Result<Session, Error> {
        let refresh_token = self
            .get_session()
            .map(|s| s.refresh_token)
            .ok_or_else(|| Error::auth("Not logged in"))?;

        let url = self.get_auth_url("/token?grant_type=refresh_token");

        let result = Fetch::post(&self.client, &url)
            .header("apikey", &self.key)
            .timeout(self.options.request_timeout)
            .json(&RefreshTokenGrant {
                refresh_token: &refresh_token,
            })?
            .execute::<Session>()
            .await;

        match result {
            Ok(session) => {
                let session = session.stamp_expiry();
                self.store(Some(session.clone()));
                self.notify(AuthChangeEvent::token_refreshed(session.clone()));
                Ok(session)
            }
            Err(err) => {
                self.store(None);
                self.notify(AuthChangeEvent::signed_out());
                Err(err)
            }
        }
    }

    /// Sign out the current user.
    ///
    /// The local session is cleared even when the server call fails.
    pub async fn sign_out(&self) -> Result<(), Error> {
        let Some(session) = self.get_session() else {
            return Ok(());
        };

        let url = self.get_auth_url("/logout");
        let result = Fetch::post(&self.client, &url)
            .header("apikey", &self.key)
            .timeout(self.options.request_timeout)
            .bearer_auth(&session.access_token)
            .execute_empty()
            .await;

        self.store(None);
        self.notify(AuthChangeEvent::signed_out());

        result
    }

    /// Drop an expired session without contacting the server
    pub fn expire_session(&self) {
        if self.get_session().is_some() {
            self.store(None);
            self.notify(AuthChangeEvent::signed_out());
        }
    }

    /// Get the current session
    pub fn get_session(&self) -> Option<Session> {
        let guard = self.session.read().unwrap_or_else(|e| e.into_inner());
        guard.clone()
    }

    /// Whether expired sessions should be refreshed
    pub fn auto_refresh_token(&self) -> bool {
        self.options.auto_refresh_token
    }
}
