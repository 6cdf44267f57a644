//! Ordered list of position labels for a market draft.
//!
//! Indices are positional, not stable identities: removing index 0
//! shifts every later label down by one.

use serde::{Deserialize, Serialize};

use super::draft::DraftError;

/// Inclusive cardinality bounds for the position list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CountBounds {
    pub min: usize,
    pub max: usize,
}

impl CountBounds {
    pub fn contains(self, len: usize) -> bool {
        (self.min..=self.max).contains(&len)
    }
}

/// Position labels in display and submission order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PositionList {
    labels: Vec<String>,
}

impl PositionList {
    /// `count` empty labels.
    pub fn with_empty(count: usize) -> Self {
        Self {
            labels: vec![String::new(); count],
        }
    }

    pub fn can_add(&self, bounds: CountBounds) -> bool {
        self.labels.len() < bounds.max
    }

    pub fn can_remove(&self, bounds: CountBounds) -> bool {
        self.labels.len() > bounds.min
    }

    /// Append an empty label, returning its index.
    pub fn append(&mut self, bounds: CountBounds) -> Result<usize, DraftError> {
        if !self.can_add(bounds) {
            return Err(DraftError::PositionLimitReached { max: bounds.max });
        }
        self.labels.push(String::new());
        Ok(self.labels.len() - 1)
    }

    /// Remove the label at `index`, returning it.
    pub fn remove_at(&mut self, index: usize, bounds: CountBounds) -> Result<String, DraftError> {
        if !self.can_remove(bounds) {
            return Err(DraftError::PositionFloorReached { min: bounds.min });
        }
        self.check_index(index)?;
        Ok(self.labels.remove(index))
    }

    /// Replace the label at `index` verbatim. Length limits are advisory
    /// and checked by the draft, not here.
    pub fn set_text_at(&mut self, index: usize, text: impl Into<String>) -> Result<(), DraftError> {
        self.check_index(index)?;
        self.labels[index] = text.into();
        Ok(())
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    fn check_index(&self, index: usize) -> Result<(), DraftError> {
        if index < self.labels.len() {
            Ok(())
        } else {
            Err(DraftError::PositionIndexOutOfRange {
                index,
                len: self.labels.len(),
            })
        }
    }
}
