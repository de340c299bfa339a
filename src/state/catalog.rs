//! The in-memory catalog of substitution records

use tokio::sync::watch;

use crate::backend::Backend;
use crate::error::LoadFailure;
use crate::model::SubstitutionRecord;

/// Published after every change to the store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogStatus {
    /// A reload is in flight
    pub loading: bool,
    /// Incremented each time the records are replaced
    pub generation: u64,
    /// Message of the last failed reload, cleared by a successful one
    pub error: Option<String>,
}

/// Records as last loaded from the backend, ordered by product name
pub struct CatalogStore {
    records: Vec<SubstitutionRecord>,
    status: watch::Sender<CatalogStatus>,
}

impl Default for CatalogStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogStore {
    pub fn new() -> Self {
        let (status, _) = watch::channel(CatalogStatus::default());
        Self {
            records: Vec::new(),
            status,
        }
    }

    /// Receive status changes
    pub fn subscribe(&self) -> watch::Receiver<CatalogStatus> {
        self.status.subscribe()
    }

    /// Replace the records with a fresh list from the backend.
    ///
    /// On failure the previous records stay available and the message is kept
    /// in the status. The loading flag is cleared either way.
    pub async fn reload(&mut self, backend: &dyn Backend) -> Result<usize, LoadFailure> {
        self.status.send_modify(|status| status.loading = true);

        match backend.list().await {
            Ok(records) => {
                let count = records.len();
                self.records = records;
                self.status.send_modify(|status| {
                    status.loading = false;
                    status.generation += 1;
                    status.error = None;
                });
                log::info!("catalog reloaded with {} records", count);
                Ok(count)
            }
            Err(failure) => {
                self.status.send_modify(|status| {
                    status.loading = false;
                    status.error = Some(failure.message().to_string());
                });
                Err(failure)
            }
        }
    }

    /// The loaded records
    pub fn records(&self) -> &[SubstitutionRecord] {
        &self.records
    }

    /// Current status
    pub fn status(&self) -> CatalogStatus {
        self.status.borrow().clone()
    }

    pub fn is_loading(&self) -> bool {
        self.status.borrow().loading
    }

    pub fn error(&self) -> Option<String> {
        self.status.borrow().error.clone()
    }
}
