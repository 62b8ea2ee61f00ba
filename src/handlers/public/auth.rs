// handlers/public/auth.rs - POST /auth/google

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderName, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use crate::error::ApiError;
use crate::handlers::json_body;
use crate::middleware::ApiResponse;
use crate::services::AuthService;
use crate::state::AppState;

pub const AUTH_TOKEN_HEADER: &str = "x-auth-token";

#[derive(Debug, Deserialize)]
pub struct GoogleLoginRequest {
    pub access_token: String,
}

/// Exchange a Google access token for a session JWT, returned in `x-auth-token`
pub async fn google_login(
    State(state): State<AppState>,
    body: Result<Json<GoogleLoginRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    info!("Google login started");
    let request = json_body(body)?;

    let service = AuthService::new(state.store.clone(), state.google.clone());
    let (token, user) = service
        .login_with_google(&request.access_token, &state.config.security)
        .await
        .map_err(|e| {
            error!("Google login failed: {}", e);
            ApiError::from(e)
        })?;

    let header_value = HeaderValue::from_str(&token)
        .map_err(|_| ApiError::internal_server_error("Failed to issue session token"))?;

    info!(email = %user.email, "Google login success");
    let mut response = ApiResponse::success(json!({
        "message": "User logged in successfully",
        "user": { "_id": user.id.to_hex(), "email": user.email, "name": user.name },
    }))
    .into_response();
    response
        .headers_mut()
        .insert(HeaderName::from_static(AUTH_TOKEN_HEADER), header_value);
    Ok(response)
}
