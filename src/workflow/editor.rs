//! The add/edit form

use std::fmt;
use thiserror::Error;

use crate::backend::Backend;
use crate::error::SaveFailure;
use crate::model::{RecordFields, RecordId, SubstitutionRecord};
use crate::state::{CatalogStore, SessionTracker};

/// Unsaved form contents
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    pub product_name: String,
    pub old_code: String,
    pub new_code: String,
    pub notes: String,
}

impl From<&SubstitutionRecord> for Draft {
    fn from(record: &SubstitutionRecord) -> Self {
        Self {
            product_name: record.product_name.clone(),
            old_code: record.old_code.clone(),
            new_code: record.new_code.clone(),
            notes: record.notes.clone().unwrap_or_default(),
        }
    }
}

/// Fields that may not be blank
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredField {
    ProductName,
    OldCode,
    NewCode,
}

/// Fields that must be unique across the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateField {
    ProductName,
    NewCode,
}

impl fmt::Display for DuplicateField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DuplicateField::ProductName => f.write_str("product name"),
            DuplicateField::NewCode => f.write_str("new code"),
        }
    }
}

impl Draft {
    /// Trimmed fields ready to send, or the first blank required field
    pub fn normalize(&self) -> Result<RecordFields, RequiredField> {
        let product_name = self.product_name.trim();
        let old_code = self.old_code.trim();
        let new_code = self.new_code.trim();
        let notes = self.notes.trim();

        if product_name.is_empty() {
            return Err(RequiredField::ProductName);
        }
        if old_code.is_empty() {
            return Err(RequiredField::OldCode);
        }
        if new_code.is_empty() {
            return Err(RequiredField::NewCode);
        }

        Ok(RecordFields {
            product_name: product_name.to_string(),
            old_code: old_code.to_string(),
            new_code: new_code.to_string(),
            notes: (!notes.is_empty()).then(|| notes.to_string()),
        })
    }
}

/// Why a submission was refused
#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Product name, old code and new code are required.")]
    MissingField(RequiredField),

    #[error("An entry with this {field} already exists: {existing}.")]
    Duplicate {
        field: DuplicateField,
        existing: String,
    },

    #[error("Please sign in first.")]
    NotAuthenticated,

    #[error(transparent)]
    Save(#[from] SaveFailure),

    #[error("The editor is not open.")]
    NotOpen,
}

/// Outcome of a successful submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Saved {
    Created,
    Updated,
}

/// Form state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EditorState {
    #[default]
    Closed,
    Creating(Draft),
    Editing { target: RecordId, draft: Draft },
}

/// First record other than `exclude` clashing with `fields`.
///
/// Only the records loaded into memory are checked, so a clash written by
/// another client since the last reload goes unnoticed.
pub fn find_duplicate<'a>(
    records: &'a [SubstitutionRecord],
    fields: &RecordFields,
    exclude: Option<&RecordId>,
) -> Option<(DuplicateField, &'a SubstitutionRecord)> {
    let name = fields.product_name.to_lowercase();
    let code = fields.new_code.to_lowercase();

    records
        .iter()
        .filter(|record| Some(&record.id) != exclude)
        .find_map(|record| {
            if record.product_name.to_lowercase() == name {
                Some((DuplicateField::ProductName, record))
            } else if record.new_code.to_lowercase() == code {
                Some((DuplicateField::NewCode, record))
            } else {
                None
            }
        })
}

/// The add/edit modal
#[derive(Debug, Default)]
pub struct Editor {
    state: EditorState,
}

impl Editor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open for a new entry, or for editing `record`
    pub fn open(&mut self, record: Option<&SubstitutionRecord>) {
        self.state = match record {
            Some(record) => EditorState::Editing {
                target: record.id.clone(),
                draft: Draft::from(record),
            },
            None => EditorState::Creating(Draft::default()),
        };
    }

    /// Discard the draft
    pub fn close(&mut self) {
        self.state = EditorState::Closed;
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        self.state != EditorState::Closed
    }

    /// Id of the record being edited
    pub fn target(&self) -> Option<&RecordId> {
        match &self.state {
            EditorState::Editing { target, .. } => Some(target),
            _ => None,
        }
    }

    pub fn draft(&self) -> Option<&Draft> {
        match &self.state {
            EditorState::Closed => None,
            EditorState::Creating(draft) | EditorState::Editing { draft, .. } => Some(draft),
        }
    }

    pub fn draft_mut(&mut self) -> Option<&mut Draft> {
        match &mut self.state {
            EditorState::Closed => None,
            EditorState::Creating(draft) | EditorState::Editing { draft, .. } => Some(draft),
        }
    }

    /// Validate and save the draft, then reload the catalog and close.
    ///
    /// Any refusal or backend failure leaves the editor open with the draft
    /// as it was.
    pub async fn submit(
        &mut self,
        catalog: &mut CatalogStore,
        session: &SessionTracker,
        backend: &dyn Backend,
    ) -> Result<Saved, EditorError> {
        let draft = self.draft().ok_or(EditorError::NotOpen)?;
        let fields = draft.normalize().map_err(EditorError::MissingField)?;
        let target = self.target().cloned();

        if let Some((field, existing)) = find_duplicate(catalog.records(), &fields, target.as_ref()) {
            return Err(EditorError::Duplicate {
                field,
                existing: existing.product_name.clone(),
            });
        }

        if !session.is_authorized() {
            return Err(EditorError::NotAuthenticated);
        }

        let saved = match &target {
            Some(id) => {
                backend.update(id, &fields).await?;
                Saved::Updated
            }
            None => {
                backend.create(&fields).await?;
                Saved::Created
            }
        };
        log::info!("{:?} entry {}", saved, fields.product_name);

        // The entry is saved even if the list cannot be refreshed; the store
        // keeps the load error for display.
        let _ = catalog.reload(backend).await;
        self.close();
        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Call, MemoryBackend, Operation};

    fn banana() -> RecordFields {
        RecordFields {
            product_name: "Banana".to_string(),
            old_code: "0".to_string(),
            new_code: "17".to_string(),
            notes: None,
        }
    }

    async fn signed_in() -> (MemoryBackend, CatalogStore, SessionTracker) {
        let backend = MemoryBackend::new()
            .with_records([banana()])
            .with_account("m@shop.test", "pw");
        backend.sign_in("m@shop.test", "pw").await.unwrap();
        let session = SessionTracker::start(&backend).await;
        let mut catalog = CatalogStore::new();
        catalog.reload(&backend).await.unwrap();
        backend.clear_calls();
        (backend, catalog, session)
    }

    fn fill(editor: &mut Editor, name: &str, old: &str, new: &str, notes: &str) {
        let draft = editor.draft_mut().unwrap();
        draft.product_name = name.to_string();
        draft.old_code = old.to_string();
        draft.new_code = new.to_string();
        draft.notes = notes.to_string();
    }

    #[test]
    fn open_and_close() {
        let record = banana().into_record(RecordId::Int(5));
        let mut editor = Editor::new();
        assert!(!editor.is_open());

        editor.open(Some(&record));
        assert_eq!(editor.target(), Some(&RecordId::Int(5)));
        assert_eq!(editor.draft().unwrap().product_name, "Banana");

        editor.close();
        assert!(editor.draft().is_none());

        editor.open(None);
        assert_eq!(editor.state(), &EditorState::Creating(Draft::default()));
    }

    #[test]
    fn normalize_trims_and_drops_blank_notes() {
        let draft = Draft {
            product_name: "  Kiwi ".to_string(),
            old_code: " 4 ".to_string(),
            new_code: "44".to_string(),
            notes: "   ".to_string(),
        };
        let fields = draft.normalize().unwrap();
        assert_eq!(fields.product_name, "Kiwi");
        assert_eq!(fields.old_code, "4");
        assert_eq!(fields.notes, None);

        let blank = Draft {
            old_code: "   ".to_string(),
            ..draft
        };
        assert_eq!(blank.normalize(), Err(RequiredField::OldCode));
    }

    #[tokio::test]
    async fn blank_fields_never_reach_backend() {
        let (backend, mut catalog, session) = signed_in().await;
        let mut editor = Editor::new();
        editor.open(None);
        fill(&mut editor, "Kiwi", " ", "44", "");

        let err = editor.submit(&mut catalog, &session, &backend).await.unwrap_err();
        assert!(matches!(err, EditorError::MissingField(RequiredField::OldCode)));
        assert!(backend.calls().is_empty());
        assert!(editor.is_open());
    }

    #[tokio::test]
    async fn duplicate_new_code_is_refused() {
        let (backend, mut catalog, session) = signed_in().await;
        let mut editor = Editor::new();
        editor.open(None);
        fill(&mut editor, "Apple", "1", "17", "");

        let err = editor.submit(&mut catalog, &session, &backend).await.unwrap_err();
        match err {
            EditorError::Duplicate { field, existing } => {
                assert_eq!(field, DuplicateField::NewCode);
                assert_eq!(existing, "Banana");
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn duplicate_name_ignores_case() {
        let (backend, mut catalog, session) = signed_in().await;
        let mut editor = Editor::new();
        editor.open(None);
        fill(&mut editor, "  bANANA ", "1", "99", "");

        let err = editor.submit(&mut catalog, &session, &backend).await.unwrap_err();
        assert!(matches!(
            err,
            EditorError::Duplicate {
                field: DuplicateField::ProductName,
                ..
            }
        ));
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn editing_own_values_is_not_a_duplicate() {
        let (backend, mut catalog, session) = signed_in().await;
        let record = catalog.records()[0].clone();
        let mut editor = Editor::new();
        editor.open(Some(&record));
        editor.draft_mut().unwrap().notes = "Loose fruit".to_string();

        let saved = editor.submit(&mut catalog, &session, &backend).await.unwrap();
        assert_eq!(saved, Saved::Updated);
        assert!(!editor.is_open());
        assert_eq!(catalog.records()[0].notes.as_deref(), Some("Loose fruit"));
        assert_eq!(
            backend.calls().iter().map(Call::operation).collect::<Vec<_>>(),
            [Operation::Update, Operation::List]
        );
    }

    #[tokio::test]
    async fn unauthorized_submit_is_refused() {
        let backend = MemoryBackend::new();
        let session = SessionTracker::start(&backend).await;
        let mut catalog = CatalogStore::new();
        backend.clear_calls();

        let mut editor = Editor::new();
        editor.open(None);
        fill(&mut editor, "Kiwi", "4", "44", "");

        let err = editor.submit(&mut catalog, &session, &backend).await.unwrap_err();
        assert!(matches!(err, EditorError::NotAuthenticated));
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn backend_failure_keeps_draft() {
        let (backend, mut catalog, session) = signed_in().await;
        backend.fail(Operation::Create);

        let mut editor = Editor::new();
        editor.open(None);
        fill(&mut editor, "Kiwi", "4", "44", "note");

        let err = editor.submit(&mut catalog, &session, &backend).await.unwrap_err();
        assert_eq!(err.to_string(), SaveFailure::DEFAULT_MESSAGE);
        assert_eq!(editor.draft().unwrap().notes, "note");
        assert_eq!(backend.count(Operation::List), 0);
    }

    #[tokio::test]
    async fn create_reloads_once() {
        let (backend, mut catalog, session) = signed_in().await;
        let mut editor = Editor::new();
        editor.open(None);
        fill(&mut editor, "Kiwi", "4", "44", "");

        let saved = editor.submit(&mut catalog, &session, &backend).await.unwrap();
        assert_eq!(saved, Saved::Created);
        assert_eq!(catalog.records().len(), 2);
        assert_eq!(backend.count(Operation::List), 1);
    }

    #[tokio::test]
    async fn submit_while_closed() {
        let (backend, mut catalog, session) = signed_in().await;
        let mut editor = Editor::new();
        let err = editor.submit(&mut catalog, &session, &backend).await.unwrap_err();
        assert!(matches!(err, EditorError::NotOpen));
    }
}
