//! The seam between the application and the hosted backend.
//!
//! Every operation returns a typed failure instead of propagating transport
//! errors, so callers only ever deal with messages that are safe to show.

mod memory;
mod supabase;

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::auth::{AuthChangeEvent, Session};
use crate::error::{DeleteFailure, LoadFailure, LoginFailure, SaveFailure, SessionFailure};
use crate::model::{RecordFields, RecordId, SubstitutionRecord};

pub use memory::{Call, MemoryBackend, Operation};
pub use supabase::SupabaseBackend;

/// Data store and auth provider operations
#[async_trait]
pub trait Backend: Send + Sync {
    /// All records, ordered by product name ascending
    async fn list(&self) -> Result<Vec<SubstitutionRecord>, LoadFailure>;

    /// Insert a new record; the backend assigns the id
    async fn create(&self, fields: &RecordFields) -> Result<(), SaveFailure>;

    /// Overwrite the writable columns of an existing record
    async fn update(&self, id: &RecordId, fields: &RecordFields) -> Result<(), SaveFailure>;

    /// Remove a record
    async fn delete(&self, id: &RecordId) -> Result<(), DeleteFailure>;

    /// Sign in with an email and password
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, LoginFailure>;

    /// End the current session
    async fn sign_out(&self) -> Result<(), SessionFailure>;

    /// The session currently held by the auth provider
    async fn current_session(&self) -> Result<Option<Session>, SessionFailure>;

    /// Stream of session changes
    fn on_session_change(&self) -> broadcast::Receiver<AuthChangeEvent>;
}
