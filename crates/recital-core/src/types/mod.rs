//! # Core Type Definitions
//!
//! This module contains all core types for the Recital study engine:
//! - Poem identity and exposure counters (`Title`, `ExposureWeight`)
//! - Stored records (`Poem`)
//! - Sampler input and output (`Candidate`, `Excerpt`, `Selection`)
//! - Error types (`RecitalError`)
//!
//! ## Ordering
//!
//! `Title` implements `Ord` so titles can key `BTreeMap`/`BTreeSet`
//! and listings stay stable between runs.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

// =============================================================================
// IDENTIFIERS & COUNTERS
// =============================================================================

/// Unique, human-readable identifier of a poem.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Title(pub String);

impl Title {
    /// Create a new title from a string.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the title as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Title {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Title {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Title {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// How many times a poem has been served by a draw.
///
/// Unsigned, so a negative exposure cannot be represented.
/// Higher weight lowers the poem's chance in future draws.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct ExposureWeight(pub u64);

impl ExposureWeight {
    /// Create a new exposure weight with the given value.
    #[must_use]
    pub const fn new(weight: u64) -> Self {
        Self(weight)
    }

    /// Increment the weight by 1 using saturating arithmetic.
    /// This is the ONLY allowed mutation for exposure weights.
    #[must_use]
    pub const fn increment(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Get the raw weight value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

// =============================================================================
// POEM
// =============================================================================

/// A stored poem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Poem {
    pub title: Title,
    pub content: String,
    /// Set once via an explicit study action; never cleared.
    pub studied: bool,
    pub weight: ExposureWeight,
    /// Insertion sequence number. Larger is newer.
    pub created_at: u64,
}

impl Poem {
    /// Create a fresh, unstudied poem with zero exposure.
    #[must_use]
    pub fn new(title: Title, content: impl Into<String>, created_at: u64) -> Self {
        Self {
            title,
            content: content.into(),
            studied: false,
            weight: ExposureWeight::default(),
            created_at,
        }
    }

    /// Project this poem into a sampler candidate.
    #[must_use]
    pub fn to_candidate(&self) -> Candidate {
        Candidate {
            title: self.title.clone(),
            content: self.content.clone(),
            weight: self.weight,
        }
    }
}

// =============================================================================
// SAMPLER INPUT / OUTPUT
// =============================================================================

/// A studied poem eligible for a draw, with its current exposure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub title: Title,
    pub content: String,
    pub weight: ExposureWeight,
}

impl Candidate {
    #[must_use]
    pub fn new(title: impl Into<Title>, content: impl Into<String>, weight: u64) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            weight: ExposureWeight::new(weight),
        }
    }
}

/// A poem as served to the reader: title and text only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Excerpt {
    pub title: Title,
    pub content: String,
}

/// The result of one draw.
///
/// `selected` is in draw order, which carries no meaning.
/// `reweight` holds exactly the selected titles: every one of them must
/// have its exposure weight incremented by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Selection {
    pub selected: Vec<Excerpt>,
    pub reweight: BTreeSet<Title>,
}

impl Selection {
    /// Create an empty selection.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a selection from drawn candidates.
    #[must_use]
    pub fn from_drawn(drawn: Vec<Candidate>) -> Self {
        let reweight = drawn.iter().map(|c| c.title.clone()).collect();
        let selected = drawn
            .into_iter()
            .map(|c| Excerpt {
                title: c.title,
                content: c.content,
            })
            .collect();
        Self { selected, reweight }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.selected.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Titles in draw order.
    pub fn titles(&self) -> impl Iterator<Item = &Title> {
        self.selected.iter().map(|e| &e.title)
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the Recital system.
///
/// The sampler itself never fails; these come from stores and
/// from input validation at the boundary.
#[derive(Debug, Error)]
pub enum RecitalError {
    /// Title or content is empty or too long.
    #[error("Invalid poem: {0}")]
    InvalidPoem(String),

    /// A poem with this title already exists.
    #[error("Title already exists: {0}")]
    DuplicateTitle(String),

    /// No poem with this title.
    #[error("Poem not found: {0}")]
    PoemNotFound(String),

    /// A setting key or value was rejected.
    #[error("Invalid setting: {0}")]
    InvalidSetting(String),

    /// A serialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// A deserialization error occurred.
    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    /// An I/O or storage engine error occurred.
    #[error("I/O error: {0}")]
    IoError(String),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exposure_weight_saturating_increment() {
        let weight = ExposureWeight::new(u64::MAX);
        assert_eq!(weight.increment().value(), u64::MAX);
    }

    #[test]
    fn exposure_weight_normal_increment() {
        let weight = ExposureWeight::default();
        assert_eq!(weight.increment().value(), 1);
    }

    #[test]
    fn new_poem_is_unstudied_with_zero_weight() {
        let poem = Poem::new(Title::new("春晓"), "春眠不觉晓", 7);
        assert!(!poem.studied);
        assert_eq!(poem.weight.value(), 0);
        assert_eq!(poem.created_at, 7);
    }

    #[test]
    fn selection_reweight_matches_selected() {
        let drawn = vec![Candidate::new("A", "a", 0), Candidate::new("B", "b", 4)];
        let selection = Selection::from_drawn(drawn);

        assert_eq!(selection.len(), 2);
        let titles: BTreeSet<Title> = selection.titles().cloned().collect();
        assert_eq!(titles, selection.reweight);
    }

    #[test]
    fn poem_postcard_roundtrip_keeps_weight() {
        let mut poem = Poem::new(Title::new("相思"), "红豆生南国", 1);
        poem.weight = ExposureWeight::new(12);
        poem.studied = true;

        let bytes = postcard::to_allocvec(&poem).expect("encode");
        let back: Poem = postcard::from_bytes(&bytes).expect("decode");
        assert_eq!(back, poem);
    }
}
