use std::fmt;

use serde::{Deserialize, Serialize};

/// Comparable key for an institution identity. Produced by
/// [`InstitutionTables::key_for`](super::tables::InstitutionTables::key_for) once aliases are
/// resolved, or by [`normalize_name`] for the purely textual form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NameKey(String);

impl NameKey {
    pub(crate) fn from_normalized(value: String) -> Self {
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NameKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lowercases, strips punctuation and collapses whitespace. Aliases are not
/// applied here.
pub fn normalize_name(value: &str) -> String {
    let cleaned = value
        .replace(['\u{feff}', '\u{200b}'], "")
        .to_lowercase()
        .replace('&', " and ")
        .replace(['\'', '\u{2019}', '.'], "");

    let spaced: String = cleaned
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();

    let collapsed = spaced.split_whitespace().collect::<Vec<_>>().join(" ");
    match collapsed.strip_prefix("the ") {
        Some(rest) => rest.to_string(),
        None => collapsed,
    }
}
