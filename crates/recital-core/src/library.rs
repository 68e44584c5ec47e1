//! # Library
//!
//! A `Library` owns a poem store handle and runs the practice loop:
//! read studied candidates, sample, then persist one exposure increment per
//! selected poem.
//!
//! ## Storage Backends
//!
//! - `InMemory`: `MemoryStore` (volatile unless the caller snapshots it)
//! - `Persistent`: `RedbStore` (disk-backed ACID storage)
//! - `External`: any boxed `PoemStore` supplied by the caller
//!
//! ## Increment policy
//!
//! Increments are best-effort per poem. Each one is attempted up to
//! `MAX_INCREMENT_ATTEMPTS` times; a poem whose increment still fails is
//! logged and listed in `DrawOutcome::unpersisted`, and the draw is returned
//! anyway. A failed attempt never half-applies (each store commits an
//! increment atomically), so retrying cannot double count.

use crate::primitives::{
    DEFAULT_RANDOM_COUNT, MAX_INCREMENT_ATTEMPTS, RANDOM_COUNT_KEY, SAMPLE_POEMS,
};
use crate::sampler::{SelectionRequest, WeightedSampler};
use crate::store::{MemoryStore, PoemStore, RedbStore};
use crate::{Poem, RecitalError, Selection, Title};
use rand::Rng;
use std::collections::BTreeMap;
use std::path::Path;

/// Storage backend for a Library.
pub enum StorageBackend {
    /// In-memory store (fast, volatile).
    InMemory(MemoryStore),
    /// Disk-backed store using redb (ACID, persistent).
    Persistent(RedbStore),
    /// Caller-provided store.
    External(Box<dyn PoemStore + Send + Sync>),
}

impl Default for StorageBackend {
    fn default() -> Self {
        Self::InMemory(MemoryStore::new())
    }
}

impl std::fmt::Debug for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InMemory(store) => f.debug_tuple("InMemory").field(store).finish(),
            Self::Persistent(store) => f.debug_tuple("Persistent").field(store).finish(),
            Self::External(_) => f.write_str("External(..)"),
        }
    }
}

/// Outcome of one practice draw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawOutcome {
    /// The poems served, with the reweight instruction that produced the increments.
    pub selection: Selection,
    /// Effective requested count after defaulting and clamping.
    pub requested: usize,
    /// Titles whose exposure increment could not be persisted.
    pub unpersisted: Vec<Title>,
}

/// A poem library backed by an explicit store handle.
#[derive(Debug, Default)]
pub struct Library {
    backend: StorageBackend,
}

impl Library {
    /// Create an empty library with in-memory storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a library around an existing in-memory store.
    #[must_use]
    pub fn with_memory(store: MemoryStore) -> Self {
        Self {
            backend: StorageBackend::InMemory(store),
        }
    }

    /// Open or create a redb database at the given path.
    pub fn with_redb(path: impl AsRef<Path>) -> Result<Self, RecitalError> {
        Ok(Self {
            backend: StorageBackend::Persistent(RedbStore::open(path)?),
        })
    }

    /// Create a library around any store implementation.
    #[must_use]
    pub fn with_store(store: Box<dyn PoemStore + Send + Sync>) -> Self {
        Self {
            backend: StorageBackend::External(store),
        }
    }

    /// Check if using persistent storage.
    #[must_use]
    pub fn is_persistent(&self) -> bool {
        matches!(self.backend, StorageBackend::Persistent(_))
    }

    /// The in-memory store, if this library uses one.
    #[must_use]
    pub fn memory_opt(&self) -> Option<&MemoryStore> {
        match &self.backend {
            StorageBackend::InMemory(store) => Some(store),
            _ => None,
        }
    }

    /// Compact the database file. Returns `false` for non-redb storage.
    pub fn compact(&mut self) -> Result<bool, RecitalError> {
        match &mut self.backend {
            StorageBackend::Persistent(store) => {
                store.compact()?;
                tracing::info!("database compacted");
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn store(&self) -> &dyn PoemStore {
        match &self.backend {
            StorageBackend::InMemory(store) => store,
            StorageBackend::Persistent(store) => store,
            StorageBackend::External(store) => store.as_ref(),
        }
    }

    fn store_mut(&mut self) -> &mut dyn PoemStore {
        match &mut self.backend {
            StorageBackend::InMemory(store) => store,
            StorageBackend::Persistent(store) => store,
            StorageBackend::External(store) => store.as_mut(),
        }
    }

    // =========================================================================
    // POEMS
    // =========================================================================

    /// Add a new poem.
    pub fn add(&mut self, title: &str, content: &str) -> Result<Poem, RecitalError> {
        let poem = self.store_mut().insert(title, content)?;
        tracing::debug!(title = %poem.title, "poem added");
        Ok(poem)
    }

    /// Look up a poem by title.
    pub fn poem(&self, title: &str) -> Result<Option<Poem>, RecitalError> {
        self.store().get(&Title::new(title))
    }

    /// All titles, newest first.
    pub fn titles(&self) -> Result<Vec<Title>, RecitalError> {
        self.store().titles()
    }

    /// Delete a poem. Returns `false` if it did not exist.
    pub fn remove(&mut self, title: &str) -> Result<bool, RecitalError> {
        let removed = self.store_mut().remove(&Title::new(title))?;
        if removed {
            tracing::debug!(title, "poem removed");
        }
        Ok(removed)
    }

    /// Mark a poem as being studied.
    pub fn study(&mut self, title: &str) -> Result<Poem, RecitalError> {
        self.store_mut().mark_studied(&Title::new(title))
    }

    /// Number of stored poems.
    pub fn poem_count(&self) -> Result<usize, RecitalError> {
        self.store().poem_count()
    }

    /// Insert the sample poems if the library is empty.
    ///
    /// Samples are marked studied so a fresh library can serve a draw.
    /// Returns how many poems were inserted.
    pub fn seed_samples(&mut self) -> Result<usize, RecitalError> {
        if self.poem_count()? > 0 {
            return Ok(0);
        }

        for (title, content) in SAMPLE_POEMS {
            self.add(title, content)?;
            self.study(title)?;
        }
        tracing::info!(count = SAMPLE_POEMS.len(), "seeded sample poems");
        Ok(SAMPLE_POEMS.len())
    }

    // =========================================================================
    // SETTINGS
    // =========================================================================

    /// All settings, with `random_count` defaulted when never set.
    pub fn settings(&self) -> Result<BTreeMap<String, String>, RecitalError> {
        let mut settings = self.store().settings()?;
        settings
            .entry(RANDOM_COUNT_KEY.to_string())
            .or_insert_with(|| DEFAULT_RANDOM_COUNT.to_string());
        Ok(settings)
    }

    /// Write every pair, or none of them if any pair is rejected.
    pub fn update_settings(
        &mut self,
        updates: &BTreeMap<String, String>,
    ) -> Result<(), RecitalError> {
        self.store_mut().put_settings(updates)
    }

    /// The default draw size. Missing or unparsable values fall back to 3.
    pub fn default_count(&self) -> Result<usize, RecitalError> {
        let raw = self.store().setting(RANDOM_COUNT_KEY)?;
        Ok(raw
            .and_then(|v| v.trim().parse::<i64>().ok())
            .map(|n| SelectionRequest::clamped(n).count)
            .unwrap_or(DEFAULT_RANDOM_COUNT))
    }

    // =========================================================================
    // PRACTICE DRAW
    // =========================================================================

    /// Draw poems for practice and persist their exposure increments.
    ///
    /// `count` of `None` uses the `random_count` setting. Negative counts draw nothing.
    pub fn draw(&mut self, count: Option<i64>) -> Result<DrawOutcome, RecitalError> {
        let mut rng = rand::rng();
        self.draw_with_rng(count, &mut rng)
    }

    /// `draw` with a caller-supplied RNG.
    pub fn draw_with_rng<R: Rng + ?Sized>(
        &mut self,
        count: Option<i64>,
        rng: &mut R,
    ) -> Result<DrawOutcome, RecitalError> {
        let request = match count {
            Some(n) => SelectionRequest::clamped(n),
            None => SelectionRequest::new(self.default_count()?),
        };

        let candidates = self.store().studied_candidates()?;
        let selection = WeightedSampler::select_with_rng(&candidates, request.count, rng);
        let unpersisted = self.apply_increments(&selection);

        tracing::debug!(
            requested = request.count,
            candidates = candidates.len(),
            selected = selection.len(),
            unpersisted = unpersisted.len(),
            "practice draw"
        );

        Ok(DrawOutcome {
            selection,
            requested: request.count,
            unpersisted,
        })
    }

    /// Apply a selection's reweight instruction. Returns the titles that failed.
    fn apply_increments(&mut self, selection: &Selection) -> Vec<Title> {
        let store = self.store_mut();
        let mut failed = Vec::new();

        for title in &selection.reweight {
            let mut last_error = None;
            for attempt in 1..=MAX_INCREMENT_ATTEMPTS {
                match store.increment_weight(title) {
                    Ok(_) => {
                        last_error = None;
                        break;
                    }
                    Err(e) => {
                        tracing::debug!(%title, attempt, error = %e, "weight increment attempt failed");
                        last_error = Some(e);
                    }
                }
            }

            if let Some(e) = last_error {
                tracing::warn!(%title, error = %e, "weight increment not persisted");
                failed.push(title.clone());
            }
        }

        failed
    }
}

// =============================================================================
// TESTS
// =============================================================================
