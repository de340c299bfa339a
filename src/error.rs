//! Error handling for the codeswap client

use std::fmt;
use thiserror::Error;

/// Unified error type for everything below the workflow layer
#[derive(Error, Debug)]
pub enum Error {
    /// Network or HTTP related errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization or deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The service answered with a non-success status
    #[error("Request failed with status {status}: {body}")]
    Api { status: u16, body: String },

    /// Authentication errors
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Database query errors
    #[error("Database error: {0}")]
    Database(String),

    /// URL parsing errors
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// JWT errors
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    /// Missing or invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Reading local data files
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a new authentication error
    pub fn auth<T: fmt::Display>(msg: T) -> Self {
        Error::Auth(msg.to_string())
    }

    /// Create a new database error
    pub fn database<T: fmt::Display>(msg: T) -> Self {
        Error::Database(msg.to_string())
    }

    /// Create a new configuration error
    pub fn config<T: fmt::Display>(msg: T) -> Self {
        Error::Config(msg.to_string())
    }
}

/// Declares a failure type for one backend operation.
///
/// The `Display` output is the generic, user-facing message. The underlying
/// [`Error`] is kept as the `source()` so it can be logged without being shown.
macro_rules! operation_failure {
    ($(#[$meta:meta])* $name:ident, $default:expr) => {
        $(#[$meta])*
        #[derive(Error, Debug)]
        #[error("{message}")]
        pub struct $name {
            message: String,
            #[source]
            source: Option<Error>,
        }

        impl $name {
            /// Message shown when no more specific one is given
            pub const DEFAULT_MESSAGE: &'static str = $default;

            /// Create a failure with a specific user-facing message
            pub fn new<T: fmt::Display>(message: T) -> Self {
                Self {
                    message: message.to_string(),
                    source: None,
                }
            }

            /// The user-facing message
            pub fn message(&self) -> &str {
                &self.message
            }
        }

        impl From<Error> for $name {
            fn from(err: Error) -> Self {
                log::warn!("{}: {}", stringify!($name), err);
                Self {
                    message: $default.to_string(),
                    source: Some(err),
                }
            }
        }
    };
}

operation_failure!(
    /// Loading the substitution list failed
    LoadFailure,
    "Could not load the substitution list."
);

operation_failure!(
    /// Creating or updating an entry failed
    SaveFailure,
    "Could not save the entry."
);

operation_failure!(
    /// Deleting an entry failed
    DeleteFailure,
    "Could not delete the entry."
);

operation_failure!(
    /// Signing in failed. Never says whether the account or the password was wrong.
    LoginFailure,
    "Login failed."
);

operation_failure!(
    /// Reading or ending the current session failed
    SessionFailure,
    "Could not reach the sign-in service."
);

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn failure_hides_backend_details() {
        let failure = SaveFailure::from(Error::Api {
            status: 403,
            body: "new row violates row-level security policy".to_string(),
        });

        assert_eq!(failure.to_string(), "Could not save the entry.");
        assert!(failure.source().is_some());
    }

    #[test]
    fn messages_are_distinct_per_operation() {
        let messages = [
            LoadFailure::DEFAULT_MESSAGE,
            SaveFailure::DEFAULT_MESSAGE,
            DeleteFailure::DEFAULT_MESSAGE,
            LoginFailure::DEFAULT_MESSAGE,
            SessionFailure::DEFAULT_MESSAGE,
        ];
        for (i, a) in messages.iter().enumerate() {
            for b in &messages[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn custom_message_has_no_source() {
        let failure = DeleteFailure::new("The entry no longer exists.");
        assert_eq!(failure.message(), "The entry no longer exists.");
        assert!(failure.source().is_none());
    }
}
