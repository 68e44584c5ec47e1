//! # recital-core
//!
//! The study engine for Recital - THE LOGIC.
//!
//! Stores short texts ("poems"), tracks which ones are being studied, and
//! serves a weighted-random practice set that favors poems served less often.
//!
//! ## Layout
//!
//! - `sampler`: the pure exposure-weighted sampler (no I/O, no state)
//! - `store`: the `PoemStore` repository trait with memory and redb backends
//! - `library`: the practice loop tying a store to the sampler
//!
//! ## Architectural Constraints
//!
//! - NO async, NO network dependencies (pure Rust)
//! - The sampler never touches a store; it returns a reweight instruction
//! - Store handles are owned explicitly, there is no global connection

// =============================================================================
// MODULES
// =============================================================================

pub mod library;
pub mod primitives;
pub mod sampler;
pub mod store;
pub mod types;

// =============================================================================
// RE-EXPORTS
// =============================================================================

pub use types::{Candidate, Excerpt, ExposureWeight, Poem, RecitalError, Selection, Title};

pub use library::{DrawOutcome, Library, StorageBackend};
pub use sampler::{SelectionRequest, WeightedSampler};
pub use store::{MemoryStore, PoemStore, RedbStore};
