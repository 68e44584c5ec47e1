//! # Primitives
//!
//! Hardcoded runtime constants for the Recital core.
//! These are compiled into the binary and are immutable at runtime.

/// Settings key holding the default number of poems per draw.
pub const RANDOM_COUNT_KEY: &str = "random_count";

/// Value reported for `RANDOM_COUNT_KEY` when it was never set.
pub const DEFAULT_RANDOM_COUNT: usize = 3;

/// How many times a single weight increment is attempted before the
/// failure is logged and the title reported as unpersisted.
pub const MAX_INCREMENT_ATTEMPTS: usize = 3;

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum length for a poem title, in bytes.
pub const MAX_TITLE_LENGTH: usize = 256;

/// Maximum length for poem content, in bytes.
pub const MAX_CONTENT_LENGTH: usize = 65536;

/// Maximum length for a settings key, in bytes.
pub const MAX_SETTING_KEY_LENGTH: usize = 64;

/// Maximum length for a settings value, in bytes.
pub const MAX_SETTING_VALUE_LENGTH: usize = 1024;

// =============================================================================
// SAMPLE DATA
// =============================================================================

/// Poems inserted into an empty library on first start.
pub const SAMPLE_POEMS: [(&str, &str); 3] = [
    (
        "静夜思",
        "床前明月光，\n疑是地上霜。\n举头望明月，\n低头思故乡。",
    ),
    (
        "春晓",
        "春眠不觉晓，\n处处闻啼鸟。\n夜来风雨声，\n花落知多少。",
    ),
    (
        "相思",
        "红豆生南国，\n春来发几枝。\n愿君多采撷，\n此物最相思。",
    ),
];
