//! Deleting an entry, behind an explicit confirmation step

use thiserror::Error;

use crate::backend::Backend;
use crate::error::DeleteFailure;
use crate::model::SubstitutionRecord;
use crate::state::{CatalogStore, SessionTracker};

#[derive(Error, Debug)]
pub enum DeleteError {
    #[error("Please sign in first.")]
    NotAuthenticated,

    #[error("Nothing is waiting for confirmation.")]
    NothingPending,

    #[error(transparent)]
    Failed(#[from] DeleteFailure),
}

/// Pending deletion awaiting the user's answer
#[derive(Debug, Default)]
pub struct DeleteAction {
    pending: Option<SubstitutionRecord>,
}

impl DeleteAction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask to delete `record`. Returns the question to put to the user.
    pub fn request(
        &mut self,
        record: &SubstitutionRecord,
        session: &SessionTracker,
    ) -> Result<String, DeleteError> {
        if !session.is_authorized() {
            return Err(DeleteError::NotAuthenticated);
        }
        self.pending = Some(record.clone());
        Ok(confirmation_prompt(record))
    }

    /// The record waiting for confirmation
    pub fn pending(&self) -> Option<&SubstitutionRecord> {
        self.pending.as_ref()
    }

    /// Drop the pending request
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    /// Delete the pending record and reload the catalog.
    ///
    /// On failure the catalog is left as it was.
    pub async fn confirm(
        &mut self,
        catalog: &mut CatalogStore,
        session: &SessionTracker,
        backend: &dyn Backend,
    ) -> Result<SubstitutionRecord, DeleteError> {
        if self.pending.is_none() {
            return Err(DeleteError::NothingPending);
        }
        if !session.is_authorized() {
            return Err(DeleteError::NotAuthenticated);
        }
        let record = self.pending.take().ok_or(DeleteError::NothingPending)?;

        backend.delete(&record.id).await?;
        log::info!("deleted entry {}", record.product_name);

        let _ = catalog.reload(backend).await;
        Ok(record)
    }
}

/// Question naming the record about to be deleted
pub fn confirmation_prompt(record: &SubstitutionRecord) -> String {
    format!(
        "Delete \"{}\" ({} -> {})?",
        record.product_name, record.old_code, record.new_code
    )
}
