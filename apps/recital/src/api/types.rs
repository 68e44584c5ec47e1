//! # API Request/Response Types
//!
//! This module defines the JSON structures for the HTTP API.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use recital_core::{Excerpt, Poem, RecitalError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::num::IntErrorKind;

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// POEMS
// =============================================================================

/// Full poem as returned by `GET /api/poem/{title}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoemResponse {
    pub title: String,
    pub content: String,
    pub studied: bool,
    pub weight: u64,
}

impl From<Poem> for PoemResponse {
    fn from(poem: Poem) -> Self {
        Self {
            title: poem.title.0,
            content: poem.content,
            studied: poem.studied,
            weight: poem.weight.value(),
        }
    }
}

/// Body of `POST /api/poem`. Missing fields count as empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AddPoemRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

/// One poem served by a practice draw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcerptJson {
    pub title: String,
    pub content: String,
}

impl From<Excerpt> for ExcerptJson {
    fn from(excerpt: Excerpt) -> Self {
        Self {
            title: excerpt.title.0,
            content: excerpt.content,
        }
    }
}

/// Query string of `GET /api/random`.
///
/// `count` is kept as text: anything that is not an integer falls back
/// to the configured default instead of rejecting the request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RandomQuery {
    pub count: Option<String>,
}

impl RandomQuery {
    /// The requested count, if one was given and parses as an integer.
    /// Integers outside `i64` saturate.
    #[must_use]
    pub fn parsed_count(&self) -> Option<i64> {
        let text = self.count.as_deref()?.trim();
        match text.parse::<i64>() {
            Ok(n) => Some(n),
            Err(e) => match e.kind() {
                IntErrorKind::PosOverflow => Some(i64::MAX),
                IntErrorKind::NegOverflow => Some(i64::MIN),
                _ => None,
            },
        }
    }
}

// =============================================================================
// SETTINGS
// =============================================================================

/// Settings map as returned by `GET /api/settings`.
pub type SettingsResponse = BTreeMap<String, String>;

/// Stringify a JSON settings update. Strings are kept verbatim, other values
/// use their JSON text (`5`, `true`, `null`).
#[must_use]
pub fn stringify_settings(
    updates: serde_json::Map<String, serde_json::Value>,
) -> BTreeMap<String, String> {
    updates
        .into_iter()
        .map(|(key, value)| {
            let text = match value {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            (key, text)
        })
        .collect()
}

// =============================================================================
// MESSAGES & ERRORS
// =============================================================================

/// Success acknowledgement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Error body: `{"error": "..."}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// An error with its HTTP status.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    #[must_use]
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }
}

impl From<RecitalError> for ApiError {
    fn from(e: RecitalError) -> Self {
        let status = match &e {
            RecitalError::InvalidPoem(_)
            | RecitalError::DuplicateTitle(_)
            | RecitalError::InvalidSetting(_) => StatusCode::BAD_REQUEST,
            RecitalError::PoemNotFound(_) => StatusCode::NOT_FOUND,
            RecitalError::SerializationError(_)
            | RecitalError::DeserializationError(_)
            | RecitalError::IoError(_)
            | RecitalError::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %e, "request failed");
        }
        Self::new(status, e.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}

/// Handler result type.
pub type ApiResult<T> = Result<Json<T>, ApiError>;
