//! Market tags: the fixed suggestion catalog and the selected tag set.
//!
//! The catalog is built once from an ordered list of category names and
//! never changes afterwards. Tag ids are the 1-based position of the name
//! in that list, so the same config always yields the same ids.

use serde::{Deserialize, Serialize};

use super::draft::DraftError;

/// Category names offered when no catalog is configured.
pub const BUILT_IN_TAGS: [&str; 10] = [
    "Sports",
    "Football",
    "Basketball",
    "Crypto",
    "Bitcoin",
    "Ethereum",
    "Politics",
    "Elections",
    "Economy",
    "Entertainment",
];

/// A selectable category label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TagSuggestion {
    /// 1-based position in the catalog.
    pub id: u32,
    /// Display name.
    pub name: String,
}

impl TagSuggestion {
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Read-only catalog of tag suggestions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagCatalog {
    suggestions: Vec<TagSuggestion>,
}

impl TagCatalog {
    /// Build a catalog from category names, numbering them from 1.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let suggestions = names
            .into_iter()
            .zip(1u32..)
            .map(|(name, id)| TagSuggestion::new(id, name))
            .collect();
        Self { suggestions }
    }

    /// Catalog of [`BUILT_IN_TAGS`].
    pub fn built_in() -> Self {
        Self::from_names(BUILT_IN_TAGS)
    }

    pub fn get(&self, id: u32) -> Option<&TagSuggestion> {
        // ids are dense and 1-based
        let index = usize::try_from(id).ok()?.checked_sub(1)?;
        self.suggestions.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TagSuggestion> {
        self.suggestions.iter()
    }

    pub fn len(&self) -> usize {
        self.suggestions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.suggestions.is_empty()
    }

    /// Suggestions not already present in `selected`.
    pub fn available<'a>(&'a self, selected: &'a TagSet) -> impl Iterator<Item = &'a TagSuggestion> {
        self.suggestions.iter().filter(|tag| !selected.contains(tag.id))
    }
}

impl Default for TagCatalog {
    fn default() -> Self {
        Self::built_in()
    }
}

/// Ordered, id-unique selection of tags.
///
/// Order is insertion order. Rejected mutations leave the set untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagSet {
    tags: Vec<TagSuggestion>,
}

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `tag` unless its id is already selected or the set is full.
    pub fn add(&mut self, tag: TagSuggestion, max_tags: usize) -> Result<(), DraftError> {
        if self.contains(tag.id) {
            return Err(DraftError::TagAlreadySelected { id: tag.id });
        }
        if self.tags.len() >= max_tags {
            return Err(DraftError::TagLimitReached { max: max_tags });
        }
        self.tags.push(tag);
        Ok(())
    }

    /// Remove the tag at `index`, returning it.
    pub fn remove_at(&mut self, index: usize) -> Result<TagSuggestion, DraftError> {
        if index >= self.tags.len() {
            return Err(DraftError::TagIndexOutOfRange {
                index,
                len: self.tags.len(),
            });
        }
        Ok(self.tags.remove(index))
    }

    pub fn contains(&self, id: u32) -> bool {
        self.tags.iter().any(|tag| tag.id == id)
    }

    pub fn as_slice(&self) -> &[TagSuggestion] {
        &self.tags
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}
