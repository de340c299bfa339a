//! What the user sees, built from [`App`] and rendered as plain text

use std::fmt;

use super::{App, Notice, NoticeKind};
use crate::workflow::delete::confirmation_prompt;
use crate::workflow::{Draft, EditorState};

pub const TITLE: &str = "Product code changes";

/// A control the user can trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Login,
    Logout,
    Add,
    Refresh,
    /// Edit the card with this 1-based number
    Edit(usize),
    /// Delete the card with this 1-based number
    Delete(usize),
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Login => f.write_str("[login]"),
            Action::Logout => f.write_str("[logout]"),
            Action::Add => f.write_str("[add]"),
            Action::Refresh => f.write_str("[refresh]"),
            Action::Edit(n) => write!(f, "[edit {}]", n),
            Action::Delete(n) => write!(f, "[delete {}]", n),
        }
    }
}

/// One search result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub number: usize,
    pub product_name: String,
    pub old_code: String,
    pub new_code: String,
    pub notes: Option<String>,
    pub actions: Vec<Action>,
}

/// The open modal, if any
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Modal {
    Login { identifier: String },
    Editor { title: &'static str, draft: Draft },
    ConfirmDelete { prompt: String },
}

/// Snapshot of the whole screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screen {
    /// Signed-in email, or `None` in read-only mode
    pub identity: Option<String>,
    pub toolbar: Vec<Action>,
    pub query: String,
    pub status: String,
    pub notice: Option<Notice>,
    pub cards: Vec<Card>,
    pub modal: Option<Modal>,
}

impl Screen {
    pub fn build(app: &App) -> Self {
        let authorized = app.is_authorized();
        let identity = if authorized {
            app.session()
                .session()
                .map(|s| s.email().or_else(|| s.user_id()).unwrap_or_default())
        } else {
            None
        };

        let toolbar = if authorized {
            vec![Action::Add, Action::Refresh, Action::Logout]
        } else {
            vec![Action::Login]
        };

        let results = app.results();
        let catalog = app.catalog();
        let status = if catalog.is_loading() {
            "Loading...".to_string()
        } else if let Some(error) = catalog.error() {
            format!("{} Showing the last loaded list.", error)
        } else {
            match results.len() {
                1 => "1 entry".to_string(),
                n => format!("{} entries", n),
            }
        };

        let cards = results
            .iter()
            .enumerate()
            .map(|(i, record)| {
                let number = i + 1;
                Card {
                    number,
                    product_name: record.product_name.clone(),
                    old_code: record.old_code.clone(),
                    new_code: record.new_code.clone(),
                    notes: record.notes.clone(),
                    actions: if authorized {
                        vec![Action::Edit(number), Action::Delete(number)]
                    } else {
                        Vec::new()
                    },
                }
            })
            .collect();

        let modal = if let Some(record) = app.deletion().pending() {
            Some(Modal::ConfirmDelete {
                prompt: confirmation_prompt(record),
            })
        } else if let Some(form) = app.login().form() {
            Some(Modal::Login {
                identifier: form.identifier.clone(),
            })
        } else {
            match app.editor().state() {
                EditorState::Closed => None,
                EditorState::Creating(draft) => Some(Modal::Editor {
                    title: "Add entry",
                    draft: draft.clone(),
                }),
                EditorState::Editing { draft, .. } => Some(Modal::Editor {
                    title: "Edit entry",
                    draft: draft.clone(),
                }),
            }
        };

        Self {
            identity,
            toolbar,
            query: app.query().to_string(),
            status,
            notice: app.notice().cloned(),
            cards,
            modal,
        }
    }

    /// Whether `action` is offered anywhere on screen
    pub fn offers(&self, action: Action) -> bool {
        self.toolbar.contains(&action) || self.cards.iter().any(|c| c.actions.contains(&action))
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "== {} ==", TITLE)?;
        match &self.identity {
            Some(who) => write!(f, "  (signed in: {})", who)?,
            None => write!(f, "  (read only)")?,
        }
        writeln!(f)?;
        for action in &self.toolbar {
            write!(f, "{} ", action)?;
        }
        writeln!(f)?;
        writeln!(f, "Search: {}", self.query)?;
        if let Some(notice) = &self.notice {
            let tag = match notice.kind {
                NoticeKind::Info => "ok",
                NoticeKind::Error => "error",
            };
            writeln!(f, "[{}] {}", tag, notice.text)?;
        }
        writeln!(f, "{}", self.status)?;

        for card in &self.cards {
            writeln!(
                f,
                "{:>3}. {}: {} -> {}",
                card.number, card.product_name, card.old_code, card.new_code
            )?;
            if let Some(notes) = &card.notes {
                writeln!(f, "     {}", notes)?;
            }
            if !card.actions.is_empty() {
                write!(f, "    ")?;
                for action in &card.actions {
                    write!(f, " {}", action)?;
                }
                writeln!(f)?;
            }
        }

        match &self.modal {
            None => Ok(()),
            Some(Modal::Login { identifier }) => {
                writeln!(f, "-- Login --")?;
                writeln!(f, "User name or email: {}", identifier)
            }
            Some(Modal::Editor { title, draft }) => {
                writeln!(f, "-- {} --", title)?;
                writeln!(f, "Product name: {}", draft.product_name)?;
                writeln!(f, "Old code:     {}", draft.old_code)?;
                writeln!(f, "New code:     {}", draft.new_code)?;
                writeln!(f, "Notes:        {}", draft.notes)?;
                writeln!(f, "[save] [fill] [cancel]")
            }
            Some(Modal::ConfirmDelete { prompt }) => {
                writeln!(f, "-- {} --", prompt)?;
                writeln!(f, "[yes] [no]")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Backend, MemoryBackend};
    use crate::model::RecordFields;
    use crate::shortcuts::ShortcutTable;
    use std::sync::Arc;

    fn backend() -> Arc<MemoryBackend> {
        Arc::new(
            MemoryBackend::new()
                .with_records([RecordFields {
                    product_name: "Banana".to_string(),
                    old_code: "0".to_string(),
                    new_code: "17".to_string(),
                    notes: Some("Loose".to_string()),
                }])
                .with_account("m@shop.test", "pw"),
        )
    }

    #[tokio::test]
    async fn read_only_screen_hides_admin_actions() {
        let app = App::start(backend(), ShortcutTable::default()).await;
        let screen = Screen::build(&app);

        assert_eq!(screen.toolbar, [Action::Login]);
        assert!(!screen.offers(Action::Add));
        assert!(!screen.offers(Action::Edit(1)));
        assert_eq!(screen.cards.len(), 1);

        let text = screen.to_string();
        assert!(text.contains("(read only)"));
        assert!(text.contains("Banana: 0 -> 17"));
        assert!(!text.contains("[delete"));
    }

    #[tokio::test]
    async fn signed_in_screen_offers_admin_actions() {
        let backend = backend();
        backend.sign_in("m@shop.test", "pw").await.unwrap();
        let mut app = App::start(backend, ShortcutTable::default()).await;
        app.open_editor(None);

        let screen = Screen::build(&app);
        assert_eq!(screen.identity.as_deref(), Some("m@shop.test"));
        assert!(screen.offers(Action::Refresh));
        assert!(screen.offers(Action::Delete(1)));
        assert!(matches!(screen.modal, Some(Modal::Editor { title: "Add entry", .. })));
        assert!(screen.to_string().contains("-- Add entry --"));
    }

    #[tokio::test]
    async fn status_line_counts_results() {
        let mut app = App::start(backend(), ShortcutTable::default()).await;
        assert_eq!(Screen::build(&app).status, "1 entry");
        app.set_query("zzz");
        assert_eq!(Screen::build(&app).status, "0 entries");
    }
}
