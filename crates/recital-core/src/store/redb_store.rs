//! # redb-backed Poem Storage
//!
//! A disk-backed poem store using the redb embedded database:
//! - ACID transactions (each mutation commits on its own)
//! - Crash safety (copy-on-write B-trees)
//! - MVCC (concurrent readers, single writer)
//!
//! Poems are stored postcard-encoded, keyed by title. A weight increment is a
//! read-modify-write inside one write transaction, so it either lands fully or
//! not at all and can be retried safely after a failed commit.

use super::{PoemStore, validate_entry, validate_setting};
use crate::{Candidate, ExposureWeight, Poem, RecitalError, Title};
use redb::{Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::path::Path;

/// Table for poems: title -> serialized Poem bytes
const POEMS: TableDefinition<&str, &[u8]> = TableDefinition::new("poems");

/// Table for settings: key -> value
const SETTINGS: TableDefinition<&str, &str> = TableDefinition::new("settings");

/// Table for metadata: key string -> value u64
const METADATA: TableDefinition<&str, u64> = TableDefinition::new("metadata");

const NEXT_SEQ_KEY: &str = "next_seq";

fn storage_err(e: impl Display) -> RecitalError {
    RecitalError::IoError(e.to_string())
}

fn encode(poem: &Poem) -> Result<Vec<u8>, RecitalError> {
    postcard::to_allocvec(poem).map_err(|e| RecitalError::SerializationError(e.to_string()))
}

fn decode(bytes: &[u8]) -> Result<Poem, RecitalError> {
    postcard::from_bytes(bytes).map_err(|e| RecitalError::DeserializationError(e.to_string()))
}

/// A disk-backed poem store using redb.
pub struct RedbStore {
    db: Database,
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore").finish_non_exhaustive()
    }
}

impl RedbStore {
    /// Open or create a poem database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RecitalError> {
        let db = Database::create(path.as_ref()).map_err(storage_err)?;

        // Initialize tables if they don't exist
        {
            let write_txn = db.begin_write().map_err(storage_err)?;
            let _ = write_txn.open_table(POEMS).map_err(storage_err)?;
            let _ = write_txn.open_table(SETTINGS).map_err(storage_err)?;
            let _ = write_txn.open_table(METADATA).map_err(storage_err)?;
            write_txn.commit().map_err(storage_err)?;
        }

        Ok(Self { db })
    }

    /// Compact the database file.
    pub fn compact(&mut self) -> Result<(), RecitalError> {
        self.db.compact().map_err(storage_err)?;
        Ok(())
    }

    /// Read-modify-write a single poem in one transaction.
    fn update_poem(
        &self,
        title: &Title,
        update: impl FnOnce(&mut Poem),
    ) -> Result<Poem, RecitalError> {
        let write_txn = self.db.begin_write().map_err(storage_err)?;
        let poem = {
            let mut poems = write_txn.open_table(POEMS).map_err(storage_err)?;
            let current = poems
                .get(title.as_str())
                .map_err(storage_err)?
                .map(|guard| decode(guard.value()))
                .transpose()?;
            let mut poem = current.ok_or_else(|| RecitalError::PoemNotFound(title.to_string()))?;
            update(&mut poem);
            let bytes = encode(&poem)?;
            poems
                .insert(title.as_str(), bytes.as_slice())
                .map_err(storage_err)?;
            poem
        };
        write_txn.commit().map_err(storage_err)?;
        Ok(poem)
    }

    fn all_poems(&self) -> Result<Vec<Poem>, RecitalError> {
        let read_txn = self.db.begin_read().map_err(storage_err)?;
        let table = read_txn.open_table(POEMS).map_err(storage_err)?;

        let mut poems = Vec::new();
        for entry in table.iter().map_err(storage_err)? {
            let (_, value) = entry.map_err(storage_err)?;
            poems.push(decode(value.value())?);
        }
        Ok(poems)
    }
}

impl PoemStore for RedbStore {
    fn insert(&mut self, title: &str, content: &str) -> Result<Poem, RecitalError> {
        let (title, content) = validate_entry(title, content)?;

        let write_txn = self.db.begin_write().map_err(storage_err)?;
        let poem = {
            let mut poems = write_txn.open_table(POEMS).map_err(storage_err)?;
            let exists = poems.get(title.as_str()).map_err(storage_err)?.is_some();
            if exists {
                // Dropping the transaction aborts it.
                return Err(RecitalError::DuplicateTitle(title.0));
            }

            let mut meta = write_txn.open_table(METADATA).map_err(storage_err)?;
            let seq = meta
                .get(NEXT_SEQ_KEY)
                .map_err(storage_err)?
                .map(|v| v.value())
                .unwrap_or(0);

            let poem = Poem::new(title.clone(), content, seq);
            let bytes = encode(&poem)?;
            poems
                .insert(title.as_str(), bytes.as_slice())
                .map_err(storage_err)?;
            meta.insert(NEXT_SEQ_KEY, seq.saturating_add(1))
                .map_err(storage_err)?;
            poem
        };
        write_txn.commit().map_err(storage_err)?;
        Ok(poem)
    }

    fn get(&self, title: &Title) -> Result<Option<Poem>, RecitalError> {
        let read_txn = self.db.begin_read().map_err(storage_err)?;
        let table = read_txn.open_table(POEMS).map_err(storage_err)?;

        match table.get(title.as_str()).map_err(storage_err)? {
            Some(guard) => Ok(Some(decode(guard.value())?)),
            None => Ok(None),
        }
    }

    fn titles(&self) -> Result<Vec<Title>, RecitalError> {
        let mut poems = self.all_poems()?;
        poems.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(poems.into_iter().map(|p| p.title).collect())
    }

    fn remove(&mut self, title: &Title) -> Result<bool, RecitalError> {
        let write_txn = self.db.begin_write().map_err(storage_err)?;
        let removed = {
            let mut poems = write_txn.open_table(POEMS).map_err(storage_err)?;
            poems.remove(title.as_str()).map_err(storage_err)?.is_some()
        };
        write_txn.commit().map_err(storage_err)?;
        Ok(removed)
    }

    fn mark_studied(&mut self, title: &Title) -> Result<Poem, RecitalError> {
        self.update_poem(title, |poem| poem.studied = true)
    }

    fn studied_candidates(&self) -> Result<Vec<Candidate>, RecitalError> {
        Ok(self
            .all_poems()?
            .iter()
            .filter(|p| p.studied)
            .map(Poem::to_candidate)
            .collect())
    }

    fn increment_weight(&mut self, title: &Title) -> Result<ExposureWeight, RecitalError> {
        let poem = self.update_poem(title, |poem| poem.weight = poem.weight.increment())?;
        Ok(poem.weight)
    }

    fn setting(&self, key: &str) -> Result<Option<String>, RecitalError> {
        let read_txn = self.db.begin_read().map_err(storage_err)?;
        let table = read_txn.open_table(SETTINGS).map_err(storage_err)?;
        Ok(table
            .get(key)
            .map_err(storage_err)?
            .map(|v| v.value().to_string()))
    }

    fn settings(&self) -> Result<BTreeMap<String, String>, RecitalError> {
        let read_txn = self.db.begin_read().map_err(storage_err)?;
        let table = read_txn.open_table(SETTINGS).map_err(storage_err)?;

        let mut settings = BTreeMap::new();
        for entry in table.iter().map_err(storage_err)? {
            let (key, value) = entry.map_err(storage_err)?;
            settings.insert(key.value().to_string(), value.value().to_string());
        }
        Ok(settings)
    }

    fn put_setting(&mut self, key: &str, value: &str) -> Result<(), RecitalError> {
        validate_setting(key, value)?;

        let write_txn = self.db.begin_write().map_err(storage_err)?;
        {
            let mut table = write_txn.open_table(SETTINGS).map_err(storage_err)?;
            table.insert(key, value).map_err(storage_err)?;
        }
        write_txn.commit().map_err(storage_err)?;
        Ok(())
    }

    fn put_settings(&mut self, updates: &BTreeMap<String, String>) -> Result<(), RecitalError> {
        for (key, value) in updates {
            validate_setting(key, value)?;
        }

        let write_txn = self.db.begin_write().map_err(storage_err)?;
        {
            let mut table = write_txn.open_table(SETTINGS).map_err(storage_err)?;
            for (key, value) in updates {
                table
                    .insert(key.as_str(), value.as_str())
                    .map_err(storage_err)?;
            }
        }
        write_txn.commit().map_err(storage_err)?;
        Ok(())
    }

    fn poem_count(&self) -> Result<usize, RecitalError> {
        let read_txn = self.db.begin_read().map_err(storage_err)?;
        let table = read_txn.open_table(POEMS).map_err(storage_err)?;
        let count = table.len().map_err(storage_err)?;
        Ok(count as usize)
    }
}

// =============================================================================
// TESTS
// =============================================================================
