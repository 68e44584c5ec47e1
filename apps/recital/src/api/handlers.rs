//! # API Endpoint Handlers
//!
//! This module implements the actual HTTP endpoint handlers.

use super::{
    AppState,
    types::{
        AddPoemRequest, ApiError, ApiResult, ExcerptJson, HealthResponse, MessageResponse,
        PoemResponse, RandomQuery, SettingsResponse, stringify_settings,
    },
};
use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    response::IntoResponse,
};
use recital_core::RecitalError;

// =============================================================================
// HEALTH HANDLER
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

// =============================================================================
// POEM HANDLERS
// =============================================================================

/// List all titles, newest first.
pub async fn list_poems_handler(State(state): State<AppState>) -> ApiResult<Vec<String>> {
    let library = state.library.read().await;
    let titles = library.titles()?;
    Ok(Json(titles.into_iter().map(|t| t.0).collect()))
}

/// Get one poem.
pub async fn get_poem_handler(
    State(state): State<AppState>,
    Path(title): Path<String>,
) -> ApiResult<PoemResponse> {
    let library = state.library.read().await;
    match library.poem(&title)? {
        Some(poem) => Ok(Json(poem.into())),
        None => Err(ApiError::not_found(format!("Poem not found: {}", title))),
    }
}

/// Add a poem.
pub async fn add_poem_handler(
    State(state): State<AppState>,
    payload: Result<Json<AddPoemRequest>, JsonRejection>,
) -> ApiResult<MessageResponse> {
    let Json(request) = payload?;

    let mut library = state.library.write().await;
    let poem = state.commit(&mut library, |lib| lib.add(&request.title, &request.content))?;

    tracing::info!(title = %poem.title, "poem added");
    Ok(Json(MessageResponse::new("Poem added")))
}

/// Delete a poem.
pub async fn delete_poem_handler(
    State(state): State<AppState>,
    Path(title): Path<String>,
) -> ApiResult<MessageResponse> {
    let mut library = state.library.write().await;
    state.commit(&mut library, |lib| {
        if lib.remove(&title)? {
            Ok(())
        } else {
            Err(RecitalError::PoemNotFound(title.clone()))
        }
    })?;

    tracing::info!(title, "poem deleted");
    Ok(Json(MessageResponse::new("Poem deleted")))
}

/// Mark a poem as being studied.
pub async fn study_poem_handler(
    State(state): State<AppState>,
    Path(title): Path<String>,
) -> ApiResult<PoemResponse> {
    let mut library = state.library.write().await;
    let poem = state.commit(&mut library, |lib| lib.study(&title))?;
    Ok(Json(poem.into()))
}

// =============================================================================
// PRACTICE HANDLER
// =============================================================================

/// Serve a weighted-random practice set.
///
/// Takes the write lock: the draw's weight increments are persisted
/// before any later draw reads weights. Like a failed increment, a failed
/// snapshot write is logged and the selection is still served.
pub async fn random_handler(
    State(state): State<AppState>,
    Query(query): Query<RandomQuery>,
) -> ApiResult<Vec<ExcerptJson>> {
    let mut library = state.library.write().await;
    let outcome = library.draw(query.parsed_count())?;
    if let Err(e) = state.persist(&library) {
        tracing::warn!(error = %e, "exposure increments not written to snapshot");
    }

    if !outcome.unpersisted.is_empty() {
        tracing::warn!(
            count = outcome.unpersisted.len(),
            "some exposure increments were not persisted"
        );
    }

    Ok(Json(
        outcome
            .selection
            .selected
            .into_iter()
            .map(ExcerptJson::from)
            .collect(),
    ))
}

// =============================================================================
// SETTINGS HANDLERS
// =============================================================================

/// Read settings, with `random_count` always present.
pub async fn get_settings_handler(State(state): State<AppState>) -> ApiResult<SettingsResponse> {
    let library = state.library.read().await;
    Ok(Json(library.settings()?))
}

/// Update settings from a JSON object.
pub async fn update_settings_handler(
    State(state): State<AppState>,
    payload: Result<Json<serde_json::Map<String, serde_json::Value>>, JsonRejection>,
) -> ApiResult<MessageResponse> {
    let Json(updates) = payload?;
    let updates = stringify_settings(updates);

    let mut library = state.library.write().await;
    state.commit(&mut library, |lib| lib.update_settings(&updates))?;

    tracing::info!(keys = updates.len(), "settings updated");
    Ok(Json(MessageResponse::new("Settings updated")))
}
