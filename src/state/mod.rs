//! Owned application state: the session and the loaded catalog

pub mod catalog;
pub mod session;

pub use catalog::{CatalogStatus, CatalogStore};
pub use session::SessionTracker;
