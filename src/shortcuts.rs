//! Username shortcuts for the login form.
//!
//! Staff sign in with a short name; the table maps it to the email address
//! registered with the auth provider. The table is data, loaded from JSON:
//!
//! ```json
//! { "manager": "manager@shop.example", "anna": "anna.k@shop.example" }
//! ```

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use crate::error::Error;

/// Lowercase username to email
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "HashMap<String, String>")]
pub struct ShortcutTable {
    entries: HashMap<String, String>,
}

impl From<HashMap<String, String>> for ShortcutTable {
    fn from(map: HashMap<String, String>) -> Self {
        map.into_iter().collect()
    }
}

impl<K: AsRef<str>, V: AsRef<str>> FromIterator<(K, V)> for ShortcutTable {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let entries = iter
            .into_iter()
            .map(|(k, v)| (k.as_ref().trim().to_lowercase(), v.as_ref().trim().to_string()))
            .collect();
        Self { entries }
    }
}

impl ShortcutTable {
    /// Parse a JSON object of shortcut to email
    pub fn from_json(json: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read the table from a JSON file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Email registered for `username`, ignoring case
    pub fn lookup(&self, username: &str) -> Option<&str> {
        self.entries
            .get(&username.trim().to_lowercase())
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
