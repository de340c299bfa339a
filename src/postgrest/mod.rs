//! Database operations through the PostgREST API

mod query;
mod types;

use reqwest::Client;
use serde::Serialize;

use crate::config::ClientOptions;

pub use query::*;
pub use types::*;

/// Client for one table
#[derive(Clone)]
pub struct PostgrestClient {
    /// The table URL
    url: String,

    /// The anonymous API key for the Supabase project
    key: String,

    /// HTTP client
    client: Client,

    /// Request settings shared by every builder
    settings: RequestSettings,
}

impl PostgrestClient {
    /// Create a new PostgrestClient for `table`
    pub fn new(url: &str, key: &str, table: &str, client: Client, options: &ClientOptions) -> Self {
        Self {
            url: format!("{}/rest/v1/{}", url.trim_end_matches('/'), table),
            key: key.to_string(),
            client,
            settings: RequestSettings {
                token: None,
                schema: options.db_schema.clone(),
                timeout: options.request_timeout,
            },
        }
    }

    /// Send `token` as bearer instead of the anon key
    pub fn with_auth(&self, token: &str) -> Self {
        let mut client = self.clone();
        client.settings.token = Some(token.to_string());
        client
    }

    fn base(&self) -> BaseRequest {
        BaseRequest {
            url: self.url.clone(),
            key: self.key.clone(),
            client: self.client.clone(),
            settings: self.settings.clone(),
            query: QueryBuilder::new(),
        }
    }

    /// Select specific columns from the table
    pub fn select(&self, columns: &str) -> SelectBuilder {
        SelectBuilder::new(self.base(), columns)
    }

    /// Insert rows into the table
    pub fn insert<T: Serialize>(&self, values: T) -> InsertBuilder<T> {
        InsertBuilder::new(self.base(), values)
    }

    /// Update rows in the table
    pub fn update<T: Serialize>(&self, values: T) -> UpdateBuilder<T> {
        UpdateBuilder::new(self.base(), values)
    }

    /// Delete rows from the table
    pub fn delete(&self) -> DeleteBuilder {
        DeleteBuilder::new(self.base())
    }
}
