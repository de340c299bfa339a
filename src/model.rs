//! Substitution records

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier assigned by the backend. Opaque to the client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Int(i64),
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Int(id) => write!(f, "{}", id),
            RecordId::Text(id) => f.write_str(id),
        }
    }
}

impl From<i64> for RecordId {
    fn from(id: i64) -> Self {
        RecordId::Int(id)
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        RecordId::Text(id.to_string())
    }
}

/// One product code change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubstitutionRecord {
    pub id: RecordId,
    pub product_name: String,
    pub old_code: String,
    pub new_code: String,
    #[serde(default)]
    pub notes: Option<String>,
}

impl SubstitutionRecord {
    /// Lowercase text the search filter matches against
    pub fn search_text(&self) -> String {
        let mut parts = vec![
            self.product_name.as_str(),
            self.old_code.as_str(),
            self.new_code.as_str(),
        ];
        if let Some(notes) = &self.notes {
            parts.push(notes);
        }
        fold_case(&parts.join(" "))
    }
}

/// Lowercase one char at a time, so no letter depends on its neighbours
pub(crate) fn fold_case(text: &str) -> String {
    text.chars().flat_map(char::to_lowercase).collect()
}

/// Writable columns, the body of inserts and updates.
///
/// `notes` is sent as `null` when absent so an update clears it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFields {
    pub product_name: String,
    pub old_code: String,
    pub new_code: String,
    pub notes: Option<String>,
}

impl RecordFields {
    /// Attach an id, as the backend does on insert
    pub fn into_record(self, id: RecordId) -> SubstitutionRecord {
        SubstitutionRecord {
            id,
            product_name: self.product_name,
            old_code: self.old_code,
            new_code: self.new_code,
            notes: self.notes,
        }
    }
}
