//! Configuration options for the codeswap client

use std::path::PathBuf;
use std::time::Duration;
use url::Url;

use crate::error::Error;

/// Table holding the substitution records unless configured otherwise
pub const DEFAULT_TABLE: &str = "product_codes";

/// Configuration options for the backend client
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Whether an expired session is refreshed when it is next read
    pub auto_refresh_token: bool,

    /// The request timeout
    pub request_timeout: Option<Duration>,

    /// The database schema
    pub db_schema: String,

    /// The table holding the substitution records
    pub table: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            auto_refresh_token: true,
            request_timeout: Some(Duration::from_secs(30)),
            db_schema: "public".to_string(),
            table: DEFAULT_TABLE.to_string(),
        }
    }
}

impl ClientOptions {
    /// Set whether to automatically refresh the token
    pub fn with_auto_refresh_token(mut self, value: bool) -> Self {
        self.auto_refresh_token = value;
        self
    }

    /// Set the request timeout
    pub fn with_request_timeout(mut self, value: Option<Duration>) -> Self {
        self.request_timeout = value;
        self
    }

    /// Set the database schema
    pub fn with_db_schema(mut self, value: &str) -> Self {
        self.db_schema = value.to_string();
        self
    }

    /// Set the substitution table name
    pub fn with_table(mut self, value: &str) -> Self {
        self.table = value.to_string();
        self
    }
}

/// Everything needed to start the application.
///
/// Load these from the environment or a `.env` file rather than hard-coding them.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Base URL of the Supabase project
    pub url: Url,
    /// Public anon key of the project
    pub anon_key: String,
    /// Backend client options
    pub options: ClientOptions,
    /// JSON file mapping username shortcuts to sign-in emails
    pub shortcuts_path: Option<PathBuf>,
}

impl AppConfig {
    /// Creates a new configuration, validating the URL and key.
    pub fn new(url: &str, anon_key: &str) -> Result<Self, Error> {
        let url = Url::parse(url)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::config(format!(
                "unsupported URL scheme `{}`",
                url.scheme()
            )));
        }
        if anon_key.trim().is_empty() {
            return Err(Error::config("anon key cannot be empty"));
        }
        Ok(Self {
            url,
            anon_key: anon_key.trim().to_string(),
            options: ClientOptions::default(),
            shortcuts_path: None,
        })
    }

    /// Reads the configuration from environment variables.
    ///
    /// `SUPABASE_URL` and `SUPABASE_ANON_KEY` (or `SUPABASE_KEY`) are required.
    /// `CODESWAP_TABLE`, `CODESWAP_SHORTCUTS` and `CODESWAP_TIMEOUT_SECS` are optional.
    pub fn from_env() -> Result<Self, Error> {
        let url = std::env::var("SUPABASE_URL")
            .map_err(|_| Error::config("SUPABASE_URL environment variable not found"))?;
        let key = std::env::var("SUPABASE_ANON_KEY")
            .or_else(|_| std::env::var("SUPABASE_KEY"))
            .map_err(|_| Error::config("SUPABASE_ANON_KEY environment variable not found"))?;

        let mut config = Self::new(&url, &key)?;

        if let Ok(table) = std::env::var("CODESWAP_TABLE") {
            config.options = config.options.with_table(&table);
        }
        if let Ok(path) = std::env::var("CODESWAP_SHORTCUTS") {
            config.shortcuts_path = Some(PathBuf::from(path));
        }
        if let Ok(secs) = std::env::var("CODESWAP_TIMEOUT_SECS") {
            let secs: u64 = secs
                .parse()
                .map_err(|_| Error::config(format!("invalid CODESWAP_TIMEOUT_SECS `{}`", secs)))?;
            config.options = config
                .options
                .with_request_timeout(Some(Duration::from_secs(secs)));
        }

        Ok(config)
    }

    /// Replace the client options
    pub fn with_options(mut self, options: ClientOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the shortcut file
    pub fn with_shortcuts_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.shortcuts_path = Some(path.into());
        self
    }

    /// The project URL without a trailing slash, ready for path concatenation
    pub fn base_url(&self) -> String {
        self.url.as_str().trim_end_matches('/').to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_key() {
        let err = AppConfig::new("https://demo.supabase.co", "  ").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn rejects_non_http_scheme() {
        assert!(AppConfig::new("ftp://demo.supabase.co", "key").is_err());
        assert!(AppConfig::new("not a url", "key").is_err());
    }

    #[test]
    fn base_url_has_no_trailing_slash() {
        let config = AppConfig::new("https://demo.supabase.co/", "key").unwrap();
        assert_eq!(config.base_url(), "https://demo.supabase.co");
    }

    #[test]
    fn option_builders() {
        let options = ClientOptions::default()
            .with_table("codes")
            .with_db_schema("retail")
            .with_auto_refresh_token(false)
            .with_request_timeout(None);

        assert_eq!(options.table, "codes");
        assert_eq!(options.db_schema, "retail");
        assert!(!options.auto_refresh_token);
        assert!(options.request_timeout.is_none());
    }
}
