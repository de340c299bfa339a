//! Client-side search over the loaded catalog

use crate::model::{fold_case, SubstitutionRecord};

/// Records matching `query`, in their original order.
///
/// The query is trimmed and compared case-insensitively against the product
/// name, both codes and the notes. An empty query matches everything.
pub fn filter<'a, I>(records: I, query: &str) -> Vec<&'a SubstitutionRecord>
where
    I: IntoIterator<Item = &'a SubstitutionRecord>,
{
    let needle = fold_case(query.trim());
    if needle.is_empty() {
        return records.into_iter().collect();
    }
    records
        .into_iter()
        .filter(|record| record.search_text().contains(&needle))
        .collect()
}
