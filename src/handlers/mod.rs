// handlers/mod.rs - HTTP handlers grouped by access level
//
// public/     No authentication (token exchange, health)
// protected/  Bearer JWT required (resources, streams)

pub mod protected;
pub mod public;

use axum::extract::rejection::JsonRejection;
use axum::Json;

use crate::error::ApiError;

/// Body extraction that reports malformed JSON in the API error shape
pub fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| ApiError::validation_error(rejection.body_text()))
}
