use async_trait::async_trait;
use reqwest::Client;
use tokio::sync::broadcast;

use crate::auth::{Auth, AuthChangeEvent, Session};
use crate::backend::Backend;
use crate::config::AppConfig;
use crate::error::{
    DeleteFailure, Error, LoadFailure, LoginFailure, SaveFailure, SessionFailure,
};
use crate::model::{RecordFields, RecordId, SubstitutionRecord};
use crate::postgrest::PostgrestClient;

/// [`Backend`] over a Supabase project: PostgREST for the table, GoTrue for sign-in
pub struct SupabaseBackend {
    auth: Auth,
    table: PostgrestClient,
}

impl SupabaseBackend {
    /// Create a backend for the configured project
    pub fn new(config: &AppConfig) -> Result<Self, Error> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.options.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build()?;
        let base_url = config.base_url();

        Ok(Self {
            auth: Auth::new(
                &base_url,
                &config.anon_key,
                http_client.clone(),
                config.options.clone(),
            ),
            table: PostgrestClient::new(
                &base_url,
                &config.anon_key,
                &config.options.table,
                http_client,
                &config.options,
            ),
        })
    }

    /// The auth client
    pub fn auth(&self) -> &Auth {
        &self.auth
    }

    /// The stored session, refreshed or dropped once it has expired
    async fn live_session(&self) -> Result<Option<Session>, Error> {
        match self.auth.get_session() {
            Some(session) if session.is_expired() => {
                if self.auth.auto_refresh_token() {
                    self.auth.refresh_session().await.map(Some)
                } else {
                    self.auth.expire_session();
                    Ok(None)
                }
            }
            other => Ok(other),
        }
    }

    /// Table client carrying the session token when signed in
    async fn reader(&self) -> PostgrestClient {
        match self.live_session().await {
            Ok(Some(session)) => self.table.with_auth(&session.access_token),
            Ok(None) => self.table.clone(),
            Err(err) => {
                log::warn!("reading anonymously, session refresh failed: {}", err);
                self.table.clone()
            }
        }
    }

    /// Table client for writes; refuses to send the anon key in place of a session
    async fn writer(&self) -> Result<PostgrestClient, Error> {
        let session = self
            .live_session()
            .await?
            .ok_or_else(|| Error::auth("Not logged in"))?;
        Ok(self.table.with_auth(&session.access_token))
    }
}

#[async_trait]
impl Backend for SupabaseBackend {
    async fn list(&self) -> Result<Vec<SubstitutionRecord>, LoadFailure> {
        let records = self
            .reader()
            .await
            .select("*")
            .order("product_name")
            .execute::<SubstitutionRecord>()
            .await?;
        log::debug!("loaded {} records", records.len());
        Ok(records)
    }

    async fn create(&self, fields: &RecordFields) -> Result<(), SaveFailure> {
        self.writer().await?.insert(fields).execute_no_return().await?;
        Ok(())
    }

    async fn update(&self, id: &RecordId, fields: &RecordFields) -> Result<(), SaveFailure> {
        let rows = self
            .writer()
            .await?
            .update(fields)
            .eq("id", id)
            .execute::<serde_json::Value>()
            .await?;
        if rows.is_empty() {
            // Row-level security filters the row out instead of erroring.
            return Err(SaveFailure::from(Error::database(format!(
                "update of {} affected no rows",
                id
            ))));
        }
        Ok(())
    }

    async fn delete(&self, id: &RecordId) -> Result<(), DeleteFailure> {
        let rows = self
            .writer()
            .await?
            .delete()
            .eq("id", id)
            .execute::<serde_json::Value>()
            .await?;
        if rows.is_empty() {
            return Err(DeleteFailure::from(Error::database(format!(
                "delete of {} affected no rows",
                id
            ))));
        }
        Ok(())
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, LoginFailure> {
        Ok(self.auth.sign_in_with_password(email, password).await?)
    }

    async fn sign_out(&self) -> Result<(), SessionFailure> {
        Ok(self.auth.sign_out().await?)
    }

    async fn current_session(&self) -> Result<Option<Session>, SessionFailure> {
        Ok(self.live_session().await?)
    }

    fn on_session_change(&self) -> broadcast::Receiver<AuthChangeEvent> {
        self.auth.on_auth_state_change()
    }
}
