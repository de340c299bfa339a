//! The login form

use thiserror::Error;

use crate::auth::Session;
use crate::backend::Backend;
use crate::error::{LoginFailure, SessionFailure};
use crate::shortcuts::ShortcutTable;

/// Why signing in did not happen
#[derive(Error, Debug)]
pub enum LoginError {
    #[error("Unknown user name `{0}`.")]
    UnknownIdentifier(String),

    #[error(transparent)]
    Failed(#[from] LoginFailure),

    #[error("The login form is not open.")]
    NotOpen,
}

/// Credentials being typed in. Dropped once the form closes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginForm {
    /// Username shortcut or email address
    pub identifier: String,
    pub password: String,
}

/// The login modal and the shortcut resolver behind it
#[derive(Debug, Default)]
pub struct LoginWorkflow {
    shortcuts: ShortcutTable,
    form: Option<LoginForm>,
}

impl LoginWorkflow {
    pub fn new(shortcuts: ShortcutTable) -> Self {
        Self {
            shortcuts,
            form: None,
        }
    }

    /// Email to sign in with: the input itself when it contains `@`,
    /// otherwise the email registered for that shortcut.
    pub fn resolve_identifier(&self, input: &str) -> Result<String, LoginError> {
        let input = input.trim();
        if input.contains('@') {
            return Ok(input.to_string());
        }
        self.shortcuts
            .lookup(input)
            .map(str::to_string)
            .ok_or_else(|| LoginError::UnknownIdentifier(input.to_string()))
    }

    /// Show an empty form
    pub fn open(&mut self) {
        self.form = Some(LoginForm::default());
    }

    /// Hide the form and forget what was typed
    pub fn close(&mut self) {
        self.form = None;
    }

    pub fn is_open(&self) -> bool {
        self.form.is_some()
    }

    pub fn form(&self) -> Option<&LoginForm> {
        self.form.as_ref()
    }

    pub fn form_mut(&mut self) -> Option<&mut LoginForm> {
        self.form.as_mut()
    }

    /// Sign in with the form contents.
    ///
    /// An unknown shortcut is reported without contacting the backend. On
    /// success the credentials are cleared and the form closes; on failure the
    /// form stays as typed.
    pub async fn sign_in(&mut self, backend: &dyn Backend) -> Result<Session, LoginError> {
        let form = self.form.as_ref().ok_or(LoginError::NotOpen)?;
        let email = self.resolve_identifier(&form.identifier)?;

        let session = backend.sign_in(&email, &form.password).await?;
        log::info!("signed in as {}", email);

        self.close();
        Ok(session)
    }

    /// End the session
    pub async fn sign_out(&mut self, backend: &dyn Backend) -> Result<(), SessionFailure> {
        self.close();
        backend.sign_out().await
    }
}
