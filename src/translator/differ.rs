//! Source/target catalog diffing.

use crate::extractor::Catalog;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffState {
    New,
    Changed,
    Deleted,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiffItem {
    pub key: String,
    /// Current source text. Empty for `Deleted`, which has no source entry.
    pub source_text: String,
    /// Stored target text, present for `Changed` and `Deleted`.
    pub target_text: Option<String>,
    pub state: DiffState,
}

/// Compare the source catalog against a target locale's catalog.
///
/// The `Changed` check compares the stored target text against the current
/// source text. A real translation always differs from its source, so
/// previously translated keys come back as `Changed` on later runs; the
/// cache is expected to answer for them before any provider is called.
pub fn diff_catalogs(source: &Catalog, target: &Catalog) -> Vec<DiffItem> {
    let mut items = Vec::new();

    for (key, source_text) in source {
        match target.get(key) {
            None => items.push(DiffItem {
                key: key.clone(),
                source_text: source_text.clone(),
                target_text: None,
                state: DiffState::New,
            }),
            Some(target_text) if target_text != source_text => items.push(DiffItem {
                key: key.clone(),
                source_text: source_text.clone(),
                target_text: Some(target_text.clone()),
                state: DiffState::Changed,
            }),
            Some(_) => {}
        }
    }

    for (key, target_text) in target {
        if !source.contains_key(key) {
            items.push(DiffItem {
                key: key.clone(),
                source_text: String::new(),
                target_text: Some(target_text.clone()),
                state: DiffState::Deleted,
            });
        }
    }

    items
}

/// Keep only the items that need a provider call. `Deleted` entries are
/// reported upstream but never removed automatically.
pub fn filter_for_translation(items: Vec<DiffItem>) -> Vec<DiffItem> {
    items
        .into_iter()
        .filter(|item| matches!(item.state, DiffState::New | DiffState::Changed))
        .collect()
}
