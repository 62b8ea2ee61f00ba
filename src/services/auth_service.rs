use std::sync::Arc;

use crate::auth::{generate_jwt, AuthError, Claims, GoogleVerifier};
use crate::config::SecurityConfig;
use crate::database::models::User;
use crate::database::Store;
use crate::sync::SyncError;

use super::resource_service::release;

#[derive(Debug, thiserror::Error)]
pub enum LoginError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Lookup(#[from] SyncError),
}

/// Google access token in, signed session token out
pub struct AuthService {
    store: Arc<dyn Store>,
    google: Arc<dyn GoogleVerifier>,
}

impl AuthService {
    pub fn new(store: Arc<dyn Store>, google: Arc<dyn GoogleVerifier>) -> Self {
        Self { store, google }
    }

    /// Only users already on the roster may sign in
    pub async fn login_with_google(
        &self,
        access_token: &str,
        security: &SecurityConfig,
    ) -> Result<(String, User), LoginError> {
        if access_token.trim().is_empty() {
            return Err(AuthError::MissingToken.into());
        }
        let profile = self.google.verify(access_token.trim()).await?;

        let mut session = self.store.begin().await.map_err(SyncError::from)?;
        let found = session.find_user_by_email(&profile.email).await;
        release(session).await;

        let user = found
            .map_err(SyncError::from)?
            .ok_or_else(|| AuthError::UnknownUser(profile.email.clone()))?;

        let claims = Claims::for_user(&user, security.jwt_expiry_hours);
        let token = generate_jwt(&claims, security)?;
        Ok((token, user))
    }
}
