use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::config::{GoogleConfig, SecurityConfig};
use crate::database::models::User;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// User ObjectId as hex
    pub sub: String,
    pub email: String,
    pub name: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn for_user(user: &User, expiry_hours: u64) -> Self {
        let now = Utc::now();
        let exp = (now + Duration::hours(expiry_hours as i64)).timestamp();

        Self {
            sub: user.id.to_hex(),
            email: user.email.clone(),
            name: user.name.clone(),
            iat: now.timestamp(),
            exp,
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing Authorization header")]
    MissingToken,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("User Not Authenticated: {0}")]
    Rejected(String),

    #[error("User Not Allowed: {0}")]
    UnknownUser(String),

    #[error("Identity provider error: {0}")]
    Provider(String),

    #[error("JWT generation error: {0}")]
    Signing(String),
}

pub fn generate_jwt(claims: &Claims, security: &SecurityConfig) -> Result<String, AuthError> {
    if security.jwt_secret.is_empty() {
        return Err(AuthError::Signing("JWT secret not configured".to_string()));
    }

    let encoding_key = EncodingKey::from_secret(security.jwt_secret.as_bytes());
    encode(&Header::default(), claims, &encoding_key).map_err(|e| AuthError::Signing(e.to_string()))
}

pub fn validate_jwt(token: &str, security: &SecurityConfig) -> Result<Claims, AuthError> {
    if security.jwt_secret.is_empty() {
        return Err(AuthError::InvalidToken("JWT secret not configured".to_string()));
    }

    let decoding_key = DecodingKey::from_secret(security.jwt_secret.as_bytes());
    decode::<Claims>(token, &decoding_key, &Validation::default())
        .map(|data| data.claims)
        .map_err(|e| AuthError::InvalidToken(e.to_string()))
}

/// Identity asserted by the provider for an access token
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GoogleProfile {
    pub email: String,
    #[serde(default)]
    pub aud: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Exchanges an OAuth access token for the profile it was issued to
#[async_trait]
pub trait GoogleVerifier: Send + Sync {
    async fn verify(&self, access_token: &str) -> Result<GoogleProfile, AuthError>;
}

/// Verifier backed by Google's tokeninfo endpoint
pub struct TokenInfoVerifier {
    client: reqwest::Client,
    tokeninfo_url: String,
    client_id: Option<String>,
}

impl TokenInfoVerifier {
    pub fn new(config: &GoogleConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            tokeninfo_url: config.tokeninfo_url.clone(),
            client_id: config.client_id.clone(),
        }
    }
}

#[async_trait]
impl GoogleVerifier for TokenInfoVerifier {
    async fn verify(&self, access_token: &str) -> Result<GoogleProfile, AuthError> {
        let response = self
            .client
            .get(&self.tokeninfo_url)
            .query(&[("access_token", access_token)])
            .send()
            .await
            .map_err(|e| AuthError::Provider(e.to_string()))?;

        if response.status().is_client_error() {
            return Err(AuthError::Rejected(format!("tokeninfo returned {}", response.status())));
        }
        if !response.status().is_success() {
            return Err(AuthError::Provider(format!("tokeninfo returned {}", response.status())));
        }

        let profile: GoogleProfile = response
            .json()
            .await
            .map_err(|e| AuthError::Provider(e.to_string()))?;

        if let Some(expected) = &self.client_id {
            if profile.aud.as_deref() != Some(expected.as_str()) {
                warn!(aud = ?profile.aud, "access token issued for another client");
                return Err(AuthError::Rejected("audience mismatch".to_string()));
            }
        }
        Ok(profile)
    }
}
