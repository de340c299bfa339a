//! Query builders for PostgrestClient

use reqwest::{Client, Method};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;

use crate::error::Error;
use crate::fetch::FetchBuilder;
use crate::postgrest::ReturnOption;

/// Query parameters, in the order they were added
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    params: Vec<(String, String)>,
}

impl QueryBuilder {
    /// Create a new QueryBuilder
    pub fn new() -> Self {
        Self { params: Vec::new() }
    }

    /// Add a parameter, replacing an earlier one with the same key
    pub fn add_param(&mut self, key: &str, value: &str) {
        self.params.retain(|(k, _)| k != key);
        self.params.push((key.to_string(), value.to_string()));
    }

    /// Get the query parameters
    pub fn get_params(&self) -> &[(String, String)] {
        &self.params
    }
}

/// Per-client request settings
#[derive(Debug, Clone)]
pub struct RequestSettings {
    /// Bearer token; the anon key is sent when absent
    pub token: Option<String>,
    /// Database schema
    pub schema: String,
    /// Request timeout
    pub timeout: Option<Duration>,
}

/// State shared by every builder
pub struct BaseRequest {
    pub(crate) url: String,
    pub(crate) key: String,
    pub(crate) client: Client,
    pub(crate) settings: RequestSettings,
    pub(crate) query: QueryBuilder,
}

impl BaseRequest {
    fn eq(&mut self, column: &str, value: &str) {
        self.query.add_param(column, &format!("eq.{}", value));
    }

    fn fetch(&self, method: Method) -> FetchBuilder<'_> {
        let token = self.settings.token.as_deref().unwrap_or(&self.key);
        let mut fetch = FetchBuilder::new(&self.client, &self.url, method.clone())
            .header("apikey", &self.key)
            .bearer_auth(token)
            .timeout(self.settings.timeout)
            .query(self.query.get_params());

        if self.settings.schema != "public" {
            let header = if method == Method::GET {
                "Accept-Profile"
            } else {
                "Content-Profile"
            };
            fetch = fetch.header(header, &self.settings.schema);
        }
        fetch
    }
}

/// Builder for SELECT queries
pub struct SelectBuilder {
    base: BaseRequest,
}

impl SelectBuilder {
    /// Create a new SelectBuilder
    pub fn new(mut base: BaseRequest, columns: &str) -> Self {
        base.query.add_param("select", columns);
        Self { base }
    }

    /// Order the results by a column, ascending
    pub fn order(mut self, column: &str) -> Self {
        self.base
            .query
            .add_param("order", &format!("{}.asc", column));
        self
    }

    /// Execute the query and return the rows
    pub async fn execute<T: DeserializeOwned>(&self) -> Result<Vec<T>, Error> {
        self.base.fetch(Method::GET).execute::<Vec<T>>().await
    }
}

/// Builder for INSERT queries
pub struct InsertBuilder<T: Serialize> {
    base: BaseRequest,
    values: T,
}

impl<T: Serialize> InsertBuilder<T> {
    /// Create a new InsertBuilder
    pub fn new(base: BaseRequest, values: T) -> Self {
        Self { base, values }
    }

    /// Execute the insert without returning the inserted rows
    pub async fn execute_no_return(&self) -> Result<(), Error> {
        self.base
            .fetch(Method::POST)
            .header("Prefer", ReturnOption::Minimal.as_prefer())
            .json(&self.values)?
            .execute_empty()
            .await
    }
}

/// Builder for UPDATE queries
pub struct UpdateBuilder<T: Serialize> {
    base: BaseRequest,
    values: T,
}

impl<T: Serialize> UpdateBuilder<T> {
    /// Create a new UpdateBuilder
    pub fn new(base: BaseRequest, values: T) -> Self {
        Self { base, values }
    }

    /// Filter rows where column equals a value
    pub fn eq<V: ToString>(mut self, column: &str, value: V) -> Self {
        self.base.eq(column, &value.to_string());
        self
    }

    /// Execute the update and return the updated rows
    pub async fn execute<R: DeserializeOwned>(&self) -> Result<Vec<R>, Error> {
        self.base
            .fetch(Method::PATCH)
            .header("Prefer", ReturnOption::Representation.as_prefer())
            .json(&self.values)?
            .execute::<Vec<R>>()
            .await
    }
}

/// Builder for DELETE queries
pub struct DeleteBuilder {
    base: BaseRequest,
}

impl DeleteBuilder {
    /// Create a new DeleteBuilder
    pub fn new(base: BaseRequest) -> Self {
        Self { base }
    }

    /// Filter rows where column equals a value
    pub fn eq<V: ToString>(mut self, column: &str, value: V) -> Self {
        self.base.eq(column, &value.to_string());
        self
    }

    /// Execute the delete and return the deleted rows
    pub async fn execute<R: DeserializeOwned>(&self) -> Result<Vec<R>, Error> {
        self.base
            .fetch(Method::DELETE)
            .header("Prefer", ReturnOption::Representation.as_prefer())
            .execute::<Vec<R>>()
            .await
    }
}
