//! # Poem Storage
//!
//! The `PoemStore` trait is the repository capability the library runs on:
//! poem CRUD, the `studied` flag, exposure weights, and settings.
//!
//! Two implementations:
//! - `MemoryStore`: `BTreeMap`-backed, volatile (or snapshotted to a file by the app)
//! - `RedbStore`: disk-backed, one ACID transaction per mutation

mod memory;
mod redb_store;

pub use memory::MemoryStore;
pub use redb_store::RedbStore;

use crate::primitives::{
    MAX_CONTENT_LENGTH, MAX_SETTING_KEY_LENGTH, MAX_SETTING_VALUE_LENGTH, MAX_TITLE_LENGTH,
};
use crate::{Candidate, ExposureWeight, Poem, RecitalError, Title};
use std::collections::BTreeMap;

// =============================================================================
// POEMSTORE TRAIT
// =============================================================================

/// Repository of poems and settings.
///
/// All fallible operations return `Result<T, RecitalError>` so the
/// in-memory and persistent backends can be used interchangeably.
pub trait PoemStore {
    /// Insert a new poem. Title and content are trimmed first.
    ///
    /// Fails with `InvalidPoem` on empty or oversized input and with
    /// `DuplicateTitle` if the title is taken.
    fn insert(&mut self, title: &str, content: &str) -> Result<Poem, RecitalError>;

    /// Look up a poem by title.
    fn get(&self, title: &Title) -> Result<Option<Poem>, RecitalError>;

    /// All titles, newest first.
    fn titles(&self) -> Result<Vec<Title>, RecitalError>;

    /// Delete a poem. Returns `false` if it did not exist.
    fn remove(&mut self, title: &Title) -> Result<bool, RecitalError>;

    /// Set the `studied` flag. Idempotent.
    fn mark_studied(&mut self, title: &Title) -> Result<Poem, RecitalError>;

    /// Every studied poem with its current weight.
    fn studied_candidates(&self) -> Result<Vec<Candidate>, RecitalError>;

    /// Increment a poem's exposure weight by exactly 1. Returns the new weight.
    fn increment_weight(&mut self, title: &Title) -> Result<ExposureWeight, RecitalError>;

    /// Read one setting.
    fn setting(&self, key: &str) -> Result<Option<String>, RecitalError>;

    /// Read all stored settings.
    fn settings(&self) -> Result<BTreeMap<String, String>, RecitalError>;

    /// Insert or replace one setting.
    fn put_setting(&mut self, key: &str, value: &str) -> Result<(), RecitalError>;

    /// Insert or replace several settings, all or nothing.
    ///
    /// Every pair is validated before any is written.
    fn put_settings(&mut self, updates: &BTreeMap<String, String>) -> Result<(), RecitalError> {
        for (key, value) in updates {
            validate_setting(key, value)?;
        }
        for (key, value) in updates {
            self.put_setting(key, value)?;
        }
        Ok(())
    }

    /// Number of stored poems.
    fn poem_count(&self) -> Result<usize, RecitalError>;
}

// =============================================================================
// VALIDATION
// =============================================================================

/// Trim and validate a new poem's fields.
pub fn validate_entry(title: &str, content: &str) -> Result<(Title, String), RecitalError> {
    let title = title.trim();
    let content = content.trim();

    if title.is_empty() || content.is_empty() {
        return Err(RecitalError::InvalidPoem(
            "title and content must not be empty".to_string(),
        ));
    }
    if title.len() > MAX_TITLE_LENGTH {
        return Err(RecitalError::InvalidPoem(format!(
            "title length {} exceeds maximum {} bytes",
            title.len(),
            MAX_TITLE_LENGTH
        )));
    }
    if content.len() > MAX_CONTENT_LENGTH {
        return Err(RecitalError::InvalidPoem(format!(
            "content length {} exceeds maximum {} bytes",
            content.len(),
            MAX_CONTENT_LENGTH
        )));
    }

    Ok((Title::new(title), content.to_string()))
}

/// Validate a settings pair before it is written.
pub fn validate_setting(key: &str, value: &str) -> Result<(), RecitalError> {
    if key.is_empty() || key.len() > MAX_SETTING_KEY_LENGTH {
        return Err(RecitalError::InvalidSetting(format!(
            "key must be 1..={} bytes",
            MAX_SETTING_KEY_LENGTH
        )));
    }
    if value.len() > MAX_SETTING_VALUE_LENGTH {
        return Err(RecitalError::InvalidSetting(format!(
            "value for '{}' exceeds maximum {} bytes",
            key, MAX_SETTING_VALUE_LENGTH
        )));
    }
    Ok(())
}
