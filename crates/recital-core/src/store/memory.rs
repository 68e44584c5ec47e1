//! In-memory poem store.
//!
//! Uses `BTreeMap` throughout so iteration order is stable. The whole store
//! is `Serialize`/`Deserialize`, which is how the file backend persists it.

use super::{PoemStore, validate_entry, validate_setting};
use crate::{Candidate, ExposureWeight, Poem, RecitalError, Title};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Volatile poem store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryStore {
    poems: BTreeMap<Title, Poem>,
    settings: BTreeMap<String, String>,
    /// Next insertion sequence number.
    next_seq: u64,
}

impl MemoryStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn poem_mut(&mut self, title: &Title) -> Result<&mut Poem, RecitalError> {
        self.poems
            .get_mut(title)
            .ok_or_else(|| RecitalError::PoemNotFound(title.to_string()))
    }
}

impl PoemStore for MemoryStore {
    fn insert(&mut self, title: &str, content: &str) -> Result<Poem, RecitalError> {
        let (title, content) = validate_entry(title, content)?;
        if self.poems.contains_key(&title) {
            return Err(RecitalError::DuplicateTitle(title.0));
        }

        let poem = Poem::new(title.clone(), content, self.next_seq);
        self.next_seq = self.next_seq.saturating_add(1);
        self.poems.insert(title, poem.clone());
        Ok(poem)
    }

    fn get(&self, title: &Title) -> Result<Option<Poem>, RecitalError> {
        Ok(self.poems.get(title).cloned())
    }

    fn titles(&self) -> Result<Vec<Title>, RecitalError> {
        let mut poems: Vec<&Poem> = self.poems.values().collect();
        poems.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(poems.into_iter().map(|p| p.title.clone()).collect())
    }

    fn remove(&mut self, title: &Title) -> Result<bool, RecitalError> {
        Ok(self.poems.remove(title).is_some())
    }

    fn mark_studied(&mut self, title: &Title) -> Result<Poem, RecitalError> {
        let poem = self.poem_mut(title)?;
        poem.studied = true;
        Ok(poem.clone())
    }

    fn studied_candidates(&self) -> Result<Vec<Candidate>, RecitalError> {
        Ok(self
            .poems
            .values()
            .filter(|p| p.studied)
            .map(Poem::to_candidate)
            .collect())
    }

    fn increment_weight(&mut self, title: &Title) -> Result<ExposureWeight, RecitalError> {
        let poem = self.poem_mut(title)?;
        poem.weight = poem.weight.increment();
        Ok(poem.weight)
    }

    fn setting(&self, key: &str) -> Result<Option<String>, RecitalError> {
        Ok(self.settings.get(key).cloned())
    }

    fn settings(&self) -> Result<BTreeMap<String, String>, RecitalError> {
        Ok(self.settings.clone())
    }

    fn put_setting(&mut self, key: &str, value: &str) -> Result<(), RecitalError> {
        validate_setting(key, value)?;
        self.settings.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn poem_count(&self) -> Result<usize, RecitalError> {
        Ok(self.poems.len())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_get() {
        let mut store = MemoryStore::new();
        let poem = store.insert("静夜思", "床前明月光").expect("insert");

        assert_eq!(poem.weight.value(), 0);
        assert!(!poem.studied);
        assert_eq!(store.get(&Title::new("静夜思")).expect("get"), Some(poem));
        assert_eq!(store.poem_count().expect("count"), 1);
    }

    #[test]
    fn duplicate_title_rejected() {
        let mut store = MemoryStore::new();
        store.insert("A", "one").expect("insert");
        let err = store.insert(" A ", "two").expect_err("duplicate");
        assert!(matches!(err, RecitalError::DuplicateTitle(t) if t == "A"));
    }

    #[test]
    fn titles_newest_first() {
        let mut store = MemoryStore::new();
        store.insert("first", "1").expect("insert");
        store.insert("second", "2").expect("insert");
        store.insert("third", "3").expect("insert");

        let titles: Vec<String> = store
            .titles()
            .expect("titles")
            .into_iter()
            .map(|t| t.0)
            .collect();
        assert_eq!(titles, vec!["third", "second", "first"]);
    }

    #[test]
    fn only_studied_poems_are_candidates() {
        let mut store = MemoryStore::new();
        store.insert("A", "a").expect("insert");
        store.insert("B", "b").expect("insert");
        store.mark_studied(&Title::new("B")).expect("study");

        let candidates = store.studied_candidates().expect("candidates");
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].title, Title::new("B"));
    }

    #[test]
    fn mark_studied_is_idempotent() {
        let mut store = MemoryStore::new();
        store.insert("A", "a").expect("insert");
        store.mark_studied(&Title::new("A")).expect("study");
        let again = store.mark_studied(&Title::new("A")).expect("study again");
        assert!(again.studied);
    }

    #[test]
    fn increment_missing_poem_fails() {
        let mut store = MemoryStore::new();
        let err = store
            .increment_weight(&Title::new("ghost"))
            .expect_err("missing");
        assert!(matches!(err, RecitalError::PoemNotFound(_)));
    }

    #[test]
    fn increment_counts_up() {
        let mut store = MemoryStore::new();
        store.insert("A", "a").expect("insert");
        let title = Title::new("A");
        store.increment_weight(&title).expect("inc");
        let weight = store.increment_weight(&title).expect("inc");
        assert_eq!(weight.value(), 2);
    }

    #[test]
    fn remove_reports_absence() {
        let mut store = MemoryStore::new();
        store.insert("A", "a").expect("insert");
        assert!(store.remove(&Title::new("A")).expect("remove"));
        assert!(!store.remove(&Title::new("A")).expect("remove"));
    }

    #[test]
    fn settings_replace_values() {
        let mut store = MemoryStore::new();
        store.put_setting("random_count", "5").expect("put");
        store.put_setting("random_count", "2").expect("put");
        assert_eq!(
            store.setting("random_count").expect("get").as_deref(),
            Some("2")
        );
        assert_eq!(store.settings().expect("all").len(), 1);
    }
}
