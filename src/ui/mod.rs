//! Presentation layer: binds user intents to the workflows and state

pub mod view;

use std::sync::Arc;

use crate::backend::Backend;
use crate::model::SubstitutionRecord;
use crate::search;
use crate::shortcuts::ShortcutTable;
use crate::state::{CatalogStore, SessionTracker};
use crate::workflow::{DeleteAction, Draft, Editor, LoginForm, LoginWorkflow, Saved};

pub use view::Screen;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Error,
}

/// Transient message shown above the results
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            text: text.into(),
        }
    }
}

const SIGN_IN_FIRST: &str = "Please sign in first.";

/// Application state and the intents that change it.
///
/// Nothing here is fatal: every failure becomes an error [`Notice`] and the
/// previous state stays usable.
pub struct App {
    backend: Arc<dyn Backend>,
    session: SessionTracker,
    catalog: CatalogStore,
    editor: Editor,
    login: LoginWorkflow,
    deletion: DeleteAction,
    query: String,
    notice: Option<Notice>,
}

impl App {
    /// Pick up the session and load the catalog
    pub async fn start(backend: Arc<dyn Backend>, shortcuts: ShortcutTable) -> Self {
        let session = SessionTracker::start(backend.as_ref()).await;
        let mut app = Self {
            backend,
            session,
            catalog: CatalogStore::new(),
            editor: Editor::new(),
            login: LoginWorkflow::new(shortcuts),
            deletion: DeleteAction::new(),
            query: String::new(),
            notice: None,
        };
        app.refresh().await;
        app
    }

    pub fn session(&self) -> &SessionTracker {
        &self.session
    }

    pub fn catalog(&self) -> &CatalogStore {
        &self.catalog
    }

    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    pub fn login(&self) -> &LoginWorkflow {
        &self.login
    }

    pub fn deletion(&self) -> &DeleteAction {
        &self.deletion
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Remove the notice once it has been shown
    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }

    pub fn is_authorized(&self) -> bool {
        self.session.is_authorized()
    }

    /// Apply pending session changes
    pub fn sync_session(&mut self) -> bool {
        self.session.sync()
    }

    /// Wait for the next session change
    pub async fn session_changed(&mut self) {
        self.session.changed().await
    }

    pub fn set_query(&mut self, query: &str) {
        self.query = query.to_string();
    }

    /// Records matching the current query
    pub fn results(&self) -> Vec<&SubstitutionRecord> {
        search::filter(self.catalog.records(), &self.query)
    }

    /// The record at `index` in the current results
    fn result(&self, index: usize) -> Option<SubstitutionRecord> {
        self.results().get(index).map(|record| (*record).clone())
    }

    pub async fn refresh(&mut self) {
        if let Err(failure) = self.catalog.reload(self.backend.as_ref()).await {
            self.notice = Some(Notice::error(failure.message()));
        }
    }

    pub fn open_login(&mut self) {
        self.login.open();
    }

    pub fn close_login(&mut self) {
        self.login.close();
    }

    pub fn login_form_mut(&mut self) -> Option<&mut LoginForm> {
        self.login.form_mut()
    }

    pub async fn submit_login(&mut self) {
        match self.login.sign_in(self.backend.as_ref()).await {
            Ok(session) => {
                let who = session.email().unwrap_or_else(|| "manager".to_string());
                self.notice = Some(Notice::info(format!("Signed in as {}.", who)));
            }
            Err(err) => self.notice = Some(Notice::error(err.to_string())),
        }
        self.session.sync();
    }

    pub async fn sign_out(&mut self) {
        self.editor.close();
        self.deletion.cancel();
        match self.login.sign_out(self.backend.as_ref()).await {
            Ok(()) => self.notice = Some(Notice::info("Signed out.")),
            Err(failure) => self.notice = Some(Notice::error(failure.message())),
        }
        self.session.sync();
    }

    /// Open the editor for a new entry, or for the result at `index`
    pub fn open_editor(&mut self, index: Option<usize>) {
        if !self.is_authorized() {
            self.notice = Some(Notice::error(SIGN_IN_FIRST));
            return;
        }
        match index {
            None => self.editor.open(None),
            Some(index) => match self.result(index) {
                Some(record) => self.editor.open(Some(&record)),
                None => self.notice = Some(Notice::error("No such entry.")),
            },
        }
    }

    pub fn close_editor(&mut self) {
        self.editor.close();
    }

    pub fn editor_draft_mut(&mut self) -> Option<&mut Draft> {
        self.editor.draft_mut()
    }

    pub async fn submit_editor(&mut self) {
        self.session.sync();
        let result = self
            .editor
            .submit(&mut self.catalog, &self.session, self.backend.as_ref())
            .await;
        self.notice = Some(match result {
            Ok(Saved::Created) => Notice::info("Entry added."),
            Ok(Saved::Updated) => Notice::info("Entry updated."),
            Err(err) => Notice::error(err.to_string()),
        });
    }

    /// Ask to delete the result at `index`
    pub fn request_delete(&mut self, index: usize) {
        let Some(record) = self.result(index) else {
            self.notice = Some(Notice::error("No such entry."));
            return;
        };
        if let Err(err) = self.deletion.request(&record, &self.session) {
            self.notice = Some(Notice::error(err.to_string()));
        }
    }

    pub async fn confirm_delete(&mut self) {
        self.session.sync();
        let result = self
            .deletion
            .confirm(&mut self.catalog, &self.session, self.backend.as_ref())
            .await;
        self.notice = Some(match result {
            Ok(record) => Notice::info(format!("Deleted {}.", record.product_name)),
            Err(err) => Notice::error(err.to_string()),
        });
    }

    pub fn cancel_delete(&mut self) {
        self.deletion.cancel();
    }
}
