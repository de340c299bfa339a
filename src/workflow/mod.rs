//! User-facing workflows: the add/edit form, the login form and deletion

pub mod delete;
pub mod editor;
pub mod login;

pub use delete::{DeleteAction, DeleteError};
pub use editor::{Draft, DuplicateField, Editor, EditorError, EditorState, RequiredField, Saved};
pub use login::{LoginError, LoginForm, LoginWorkflow};
