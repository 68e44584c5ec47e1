//! Unit tests for API types serialization/deserialization.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use axum::http::StatusCode;
use recital::api::{
    AddPoemRequest, ApiError, ExcerptJson, HealthResponse, PoemResponse, RandomQuery,
    stringify_settings,
};
use recital_core::{Excerpt, ExposureWeight, Poem, RecitalError, Title};

// =============================================================================
// HEALTH RESPONSE TESTS
// =============================================================================

#[test]
fn test_health_response_default() {
    let health = HealthResponse::default();
    assert_eq!(health.status, "ok");
    assert!(!health.version.is_empty());
}

#[test]
fn test_health_response_serialization() {
    let health = HealthResponse {
        status: "ok".to_string(),
        version: "0.4.2".to_string(),
    };

    let json = serde_json::to_string(&health).unwrap();
    assert!(json.contains("\"status\":\"ok\""));
    assert!(json.contains("\"version\":\"0.4.2\""));
}

// =============================================================================
// POEM TYPES TESTS
// =============================================================================

#[test]
fn test_poem_response_from_poem() {
    let mut poem = Poem::new(Title::new("春晓"), "春眠不觉晓", 4);
    poem.studied = true;
    poem.weight = ExposureWeight::new(7);

    let response = PoemResponse::from(poem);

    assert_eq!(response.title, "春晓");
    assert_eq!(response.content, "春眠不觉晓");
    assert!(response.studied);
    assert_eq!(response.weight, 7);
}

#[test]
fn test_poem_response_field_names() {
    let response = PoemResponse {
        title: "A".to_string(),
        content: "B".to_string(),
        studied: false,
        weight: 0,
    };

    let value = serde_json::to_value(&response).unwrap();
    assert_eq!(
        value,
        serde_json::json!({"title": "A", "content": "B", "studied": false, "weight": 0})
    );
}

#[test]
fn test_excerpt_json_has_only_title_and_content() {
    let excerpt = Excerpt {
        title: Title::new("相思"),
        content: "红豆生南国".to_string(),
    };

    let value = serde_json::to_value(ExcerptJson::from(excerpt)).unwrap();
    assert_eq!(value, serde_json::json!({"title": "相思", "content": "红豆生南国"}));
}

#[test]
fn test_add_poem_request_missing_fields_default_to_empty() {
    let request: AddPoemRequest = serde_json::from_str(r#"{"title":"Only"}"#).unwrap();
    assert_eq!(request.title, "Only");
    assert!(request.content.is_empty());

    let request: AddPoemRequest = serde_json::from_str("{}").unwrap();
    assert!(request.title.is_empty());
}

// =============================================================================
// RANDOM QUERY TESTS
// =============================================================================

#[test]
fn test_random_query_parsed_count() {
    let parse = |count: Option<&str>| {
        RandomQuery {
            count: count.map(str::to_string),
        }
        .parsed_count()
    };

    assert_eq!(parse(None), None);
    assert_eq!(parse(Some("4")), Some(4));
    assert_eq!(parse(Some(" 2 ")), Some(2));
    assert_eq!(parse(Some("-1")), Some(-1));
    assert_eq!(parse(Some("three")), None);
    assert_eq!(parse(Some("")), None);
}

#[test]
fn test_random_query_out_of_range_count_saturates() {
    let parse = |count: &str| {
        RandomQuery {
            count: Some(count.to_string()),
        }
        .parsed_count()
    };

    assert_eq!(parse("99999999999999999999"), Some(i64::MAX));
    assert_eq!(parse("-99999999999999999999"), Some(i64::MIN));
    assert_eq!(parse("9.5"), None);
}

// =============================================================================
// SETTINGS TESTS
// =============================================================================

#[test]
fn test_stringify_settings() {
    let updates = serde_json::json!({
        "random_count": 4,
        "theme": "light",
        "flag": false,
        "nothing": null
    });
    let serde_json::Value::Object(map) = updates else {
        panic!("expected object");
    };

    let settings = stringify_settings(map);

    assert_eq!(settings["random_count"], "4");
    assert_eq!(settings["theme"], "light");
    assert_eq!(settings["flag"], "false");
    assert_eq!(settings["nothing"], "null");
}

// =============================================================================
// ERROR MAPPING TESTS
// =============================================================================

#[test]
fn test_api_error_status_mapping() {
    let cases = [
        (RecitalError::InvalidPoem("empty".into()), StatusCode::BAD_REQUEST),
        (RecitalError::DuplicateTitle("A".into()), StatusCode::BAD_REQUEST),
        (RecitalError::InvalidSetting("key".into()), StatusCode::BAD_REQUEST),
        (RecitalError::PoemNotFound("A".into()), StatusCode::NOT_FOUND),
        (RecitalError::IoError("disk".into()), StatusCode::INTERNAL_SERVER_ERROR),
        (
            RecitalError::DeserializationError("bad".into()),
            StatusCode::INTERNAL_SERVER_ERROR,
        ),
    ];

    for (error, expected) in cases {
        assert_eq!(ApiError::from(error).status, expected);
    }
}
