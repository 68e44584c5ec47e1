//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use recital::api;
use recital::backend::{Backend, open_library, save_library};
use recital::config::AppConfig;
use recital_core::{RecitalError, primitives::MAX_CONTENT_LENGTH};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

// =============================================================================
// FILE INPUT
// =============================================================================

/// Maximum size of a poem file read by `add --file`.
const MAX_POEM_FILE_SIZE: u64 = MAX_CONTENT_LENGTH as u64;

/// Canonicalize an input path and check it is a regular file within the size limit.
fn validate_input_file(path: &Path) -> Result<PathBuf, RecitalError> {
    let canonical = path.canonicalize().map_err(|e| {
        RecitalError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(RecitalError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    let metadata = std::fs::metadata(&canonical)
        .map_err(|e| RecitalError::IoError(format!("Cannot read file metadata: {}", e)))?;
    if metadata.len() > MAX_POEM_FILE_SIZE {
        return Err(RecitalError::InvalidPoem(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            MAX_POEM_FILE_SIZE
        )));
    }

    Ok(canonical)
}

fn print_json(value: &serde_json::Value) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_server(config: &AppConfig, seed: bool) -> Result<(), RecitalError> {
    let mut library = open_library(&config.database, config.backend)?;
    if seed && library.seed_samples()? > 0 {
        save_library(&library, &config.database)?;
    }

    println!("Recital Poem Practice Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Host:       {}", config.host);
    println!("  Port:       {}", config.port);
    println!("  Backend:    {}", config.backend);
    println!("  Database:   {:?}", config.database);
    match &config.public_dir {
        Some(dir) => println!("  Public dir: {:?}", dir),
        None => println!("  Public dir: (none)"),
    }
    println!();
    println!("Endpoints:");
    println!("  GET    /api/poems              - List titles");
    println!("  GET    /api/poem/{{title}}       - Get a poem");
    println!("  POST   /api/poem               - Add a poem");
    println!("  DELETE /api/poem/{{title}}       - Delete a poem");
    println!("  POST   /api/poem/{{title}}/study - Mark as studied");
    println!("  GET    /api/random?count=N     - Practice set");
    println!("  GET    /api/settings           - Read settings");
    println!("  POST   /api/settings           - Update settings");
    println!("  GET    /health                 - Health check");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    api::run_server(config, library).await
}

// =============================================================================
// INIT COMMAND
// =============================================================================

/// Initialize a new database, optionally with the sample poems.
pub fn cmd_init(config: &AppConfig, force: bool, seed: bool) -> Result<(), RecitalError> {
    let db_path = &config.database;
    if db_path.exists() {
        if !force {
            return Err(RecitalError::IoError(
                "Database already exists. Use --force to overwrite.".to_string(),
            ));
        }
        std::fs::remove_file(db_path)
            .map_err(|e| RecitalError::IoError(format!("Remove db: {}", e)))?;
    }

    let mut library = open_library(db_path, config.backend)?;
    let seeded = if seed { library.seed_samples()? } else { 0 };
    save_library(&library, db_path)?;

    match config.backend {
        Backend::Redb => println!("Initialized new redb database at {:?}", db_path),
        Backend::File => println!("Initialized new file database at {:?}", db_path),
    }
    if seeded > 0 {
        println!("Added {} sample poems", seeded);
    }

    Ok(())
}

// =============================================================================
// POEM COMMANDS
// =============================================================================

/// List titles, newest first.
pub fn cmd_list(config: &AppConfig, json_mode: bool) -> Result<(), RecitalError> {
    let library = open_library(&config.database, config.backend)?;
    let titles = library.titles()?;

    if json_mode {
        let titles: Vec<&str> = titles.iter().map(|t| t.as_str()).collect();
        print_json(&serde_json::json!(titles));
        return Ok(());
    }

    if titles.is_empty() {
        println!("No poems yet. Add one with `recital add`.");
        return Ok(());
    }
    for title in &titles {
        println!("{}", title);
    }
    Ok(())
}

/// Show one poem.
pub fn cmd_show(config: &AppConfig, json_mode: bool, title: &str) -> Result<(), RecitalError> {
    let library = open_library(&config.database, config.backend)?;
    let poem = library
        .poem(title)?
        .ok_or_else(|| RecitalError::PoemNotFound(title.to_string()))?;

    if json_mode {
        print_json(&serde_json::json!({
            "title": poem.title.as_str(),
            "content": poem.content,
            "studied": poem.studied,
            "weight": poem.weight.value(),
        }));
        return Ok(());
    }

    println!("{}", poem.title);
    println!("{}", "=".repeat(poem.title.as_str().chars().count().max(3)));
    println!("{}", poem.content);
    println!();
    println!("Studied: {}", if poem.studied { "yes" } else { "no" });
    println!("Recited: {} times", poem.weight.value());
    Ok(())
}

/// Add a poem from an argument or a file.
pub fn cmd_add(
    config: &AppConfig,
    json_mode: bool,
    title: &str,
    content: Option<String>,
    file: Option<&Path>,
) -> Result<(), RecitalError> {
    let content = match (content, file) {
        (Some(text), _) => text,
        (None, Some(path)) => {
            let path = validate_input_file(path)?;
            std::fs::read_to_string(&path)
                .map_err(|e| RecitalError::IoError(format!("Read file: {}", e)))?
        }
        (None, None) => String::new(),
    };

    let mut library = open_library(&config.database, config.backend)?;
    let poem = library.add(title, &content)?;
    save_library(&library, &config.database)?;

    if json_mode {
        print_json(&serde_json::json!({ "message": "Poem added", "title": poem.title.as_str() }));
    } else {
        println!("Added \"{}\"", poem.title);
    }
    Ok(())
}

/// Delete a poem.
pub fn cmd_remove(config: &AppConfig, json_mode: bool, title: &str) -> Result<(), RecitalError> {
    let mut library = open_library(&config.database, config.backend)?;
    if !library.remove(title)? {
        return Err(RecitalError::PoemNotFound(title.to_string()));
    }
    save_library(&library, &config.database)?;

    if json_mode {
        print_json(&serde_json::json!({ "message": "Poem deleted", "title": title }));
    } else {
        println!("Deleted \"{}\"", title);
    }
    Ok(())
}

/// Mark a poem as being studied.
pub fn cmd_study(config: &AppConfig, json_mode: bool, title: &str) -> Result<(), RecitalError> {
    let mut library = open_library(&config.database, config.backend)?;
    let poem = library.study(title)?;
    save_library(&library, &config.database)?;

    if json_mode {
        print_json(&serde_json::json!({ "title": poem.title.as_str(), "studied": poem.studied }));
    } else {
        println!("Now studying \"{}\"", poem.title);
    }
    Ok(())
}

// =============================================================================
// DRAW COMMAND
// =============================================================================

/// Draw a practice set and record the exposures.
pub fn cmd_draw(
    config: &AppConfig,
    json_mode: bool,
    count: Option<i64>,
    seed: Option<u64>,
) -> Result<(), RecitalError> {
    let mut library = open_library(&config.database, config.backend)?;
    let outcome = match seed {
        Some(seed) => library.draw_with_rng(count, &mut ChaCha8Rng::seed_from_u64(seed))?,
        None => library.draw(count)?,
    };
    save_library(&library, &config.database)?;

    if json_mode {
        let selected: Vec<serde_json::Value> = outcome
            .selection
            .selected
            .iter()
            .map(|e| serde_json::json!({ "title": e.title.as_str(), "content": e.content }))
            .collect();
        print_json(&serde_json::json!(selected));
        return Ok(());
    }

    if outcome.selection.is_empty() {
        println!("Nothing to practice. Mark poems with `recital study <title>`.");
        return Ok(());
    }

    for (i, excerpt) in outcome.selection.selected.iter().enumerate() {
        if i > 0 {
            println!();
        }
        println!("{}. {}", i + 1, excerpt.title);
        println!("{}", excerpt.content);
    }
    if !outcome.unpersisted.is_empty() {
        eprintln!(
            "Warning: exposure not recorded for {} poem(s)",
            outcome.unpersisted.len()
        );
    }
    Ok(())
}

// =============================================================================
// SETTINGS COMMANDS
// =============================================================================

/// Show all settings, or a single key.
pub fn cmd_settings_get(
    config: &AppConfig,
    json_mode: bool,
    key: Option<&str>,
) -> Result<(), RecitalError> {
    let library = open_library(&config.database, config.backend)?;
    let settings = library.settings()?;

    let shown: BTreeMap<String, String> = match key {
        Some(key) => {
            let value = settings
                .get(key)
                .ok_or_else(|| RecitalError::InvalidSetting(format!("Unknown setting: {}", key)))?;
            BTreeMap::from([(key.to_string(), value.clone())])
        }
        None => settings,
    };

    if json_mode {
        print_json(&serde_json::json!(shown));
        return Ok(());
    }
    for (key, value) in &shown {
        println!("{} = {}", key, value);
    }
    Ok(())
}

/// Set one setting.
pub fn cmd_settings_set(
    config: &AppConfig,
    json_mode: bool,
    key: &str,
    value: &str,
) -> Result<(), RecitalError> {
    let mut library = open_library(&config.database, config.backend)?;
    library.update_settings(&BTreeMap::from([(key.to_string(), value.to_string())]))?;
    save_library(&library, &config.database)?;

    if json_mode {
        print_json(&serde_json::json!({ "message": "Settings updated" }));
    } else {
        println!("{} = {}", key, value);
    }
    Ok(())
}

// =============================================================================
// COMPACT COMMAND
// =============================================================================

/// Compact the redb database file.
pub fn cmd_compact(config: &AppConfig, json_mode: bool) -> Result<(), RecitalError> {
    if config.backend != Backend::Redb {
        return Err(RecitalError::ConfigError(
            "Compaction is only supported by the redb backend".to_string(),
        ));
    }

    let mut library = open_library(&config.database, config.backend)?;
    let compacted = library.compact()?;

    if json_mode {
        print_json(&serde_json::json!({ "compacted": compacted }));
    } else {
        println!("Compacted {:?}", config.database);
    }
    Ok(())
}
