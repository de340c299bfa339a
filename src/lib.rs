//! codeswap
//!
//! Look up product code substitutions and, once signed in, maintain them.
//! Records, sign-in and access control live in a Supabase project; this crate
//! is the client: a backend adapter, the session and catalog state, the
//! search filter, the add/edit, login and delete workflows, and a plain-text
//! presentation layer.

pub mod auth;
pub mod backend;
pub mod config;
pub mod error;
pub mod fetch;
pub mod model;
pub mod postgrest;
pub mod search;
pub mod shortcuts;
pub mod state;
pub mod ui;
pub mod workflow;

use std::sync::Arc;

use crate::backend::SupabaseBackend;
use crate::config::AppConfig;
use crate::error::Error;
use crate::shortcuts::ShortcutTable;
use crate::ui::App;

/// Connect to the configured project and start the application
///
/// # Example
///
/// ```no_run
/// use codeswap::config::AppConfig;
///
/// # async fn run() -> Result<(), codeswap::error::Error> {
/// let config = AppConfig::new("https://your-project-url.supabase.co", "your-anon-key")?;
/// let app = codeswap::connect(&config).await?;
/// println!("{} entries", app.results().len());
/// # Ok(())
/// # }
/// ```
pub async fn connect(config: &AppConfig) -> Result<App, Error> {
    let shortcuts = match &config.shortcuts_path {
        Some(path) => ShortcutTable::from_path(path)?,
        None => ShortcutTable::default(),
    };
    let backend = SupabaseBackend::new(config)?;
    Ok(App::start(Arc::new(backend), shortcuts).await)
}

/// A convenience module for common imports
pub mod prelude {
    pub use crate::backend::{Backend, MemoryBackend, SupabaseBackend};
    pub use crate::config::{AppConfig, ClientOptions};
    pub use crate::error::Error;
    pub use crate::model::{RecordFields, RecordId, SubstitutionRecord};
    pub use crate::shortcuts::ShortcutTable;
    pub use crate::ui::{App, Screen};
}
