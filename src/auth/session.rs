//! Session data and token inspection

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use super::User;
use crate::error::Error;

/// Session data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// The access token
    pub access_token: String,

    /// The refresh token
    pub refresh_token: String,

    /// The token type
    #[serde(default = "default_token_type")]
    pub token_type: String,

    /// The expiry time in seconds
    pub expires_in: i64,

    /// The expiry timestamp
    #[serde(default)]
    pub expires_at: Option<i64>,

    /// The signed-in user
    #[serde(default)]
    pub user: Option<User>,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

/// Claims read from an access token
#[derive(Debug, Clone, Deserialize)]
pub struct AccessClaims {
    /// Subject, the user id
    pub sub: Option<String>,
    /// Email of the user
    pub email: Option<String>,
    /// Database role the token maps to
    pub role: Option<String>,
    /// Expiry timestamp
    pub exp: Option<i64>,
}

fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::from_secs(0))
        .as_secs() as i64
}

impl Session {
    /// Create a new session
    pub fn new(
        access_token: String,
        refresh_token: String,
        user: Option<User>,
        expires_in: i64,
    ) -> Self {
        Self {
            access_token,
            refresh_token,
            token_type: default_token_type(),
            expires_in,
            expires_at: Some(now() + expires_in),
            user,
        }
    }

    /// Fill in `expires_at` when the server only sent `expires_in`
    pub(crate) fn stamp_expiry(mut self) -> Self {
        if self.expires_at.is_none() {
            self.expires_at = Some(now() + self.expires_in);
        }
        self
    }

    /// Check if the session has expired
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => now() >= expires_at,
            None => false,
        }
    }

    /// Reads the access token claims without verifying the signature.
    ///
    /// Only the server can verify the token; the client uses the claims for
    /// display and for deciding which controls to show.
    pub fn claims(&self) -> Result<AccessClaims, Error> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        let data = decode::<AccessClaims>(
            &self.access_token,
            &DecodingKey::from_secret(&[]),
            &validation,
        )?;
        Ok(data.claims)
    }

    /// The identity carried by the session, if any
    pub fn user_id(&self) -> Option<String> {
        if let Some(user) = &self.user {
            if !user.id.is_empty() {
                return Some(user.id.clone());
            }
        }
        self.claims()
            .ok()
            .and_then(|claims| claims.sub)
            .filter(|sub| !sub.is_empty())
    }

    /// Email of the signed-in user, for display
    pub fn email(&self) -> Option<String> {
        self.user
            .as_ref()
            .and_then(|user| user.email.clone())
            .or_else(|| self.claims().ok().and_then(|claims| claims.email))
    }
}
