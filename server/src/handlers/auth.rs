//! Sign-in callback and sign-out.
//!
//! The provider handshake itself happens upstream; by the time the callback
//! reaches us the provider, uid and display name are trusted. We find or
//! create the matching user and hand back a fresh opaque access token.

use axum::extract::{Path, Query, State};
use axum::response::Response;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::context::CurrentUser;
use crate::models::{AuthCallbackParams, User};
use crate::repository::{StoreError, UserRepository, USER_IDENTITY_CONSTRAINT};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::{empty_success, success};
use crate::validation::check_fields;

#[derive(Serialize)]
struct SignInPayload {
    token: String,
    user: User,
}

#[derive(Debug, Deserialize)]
pub struct FailureParams {
    pub message: Option<String>,
}

fn new_access_token() -> String {
    Uuid::new_v4().simple().to_string()
}

pub async fn callback(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Query(params): Query<AuthCallbackParams>,
) -> Result<Response, AppError> {
    let payload = sign_in(state.users.as_ref(), &state.config, &provider, params).await?;
    Ok(success(payload, "Signed in successfully"))
}

async fn sign_in(
    users: &dyn UserRepository,
    config: &Config,
    provider: &str,
    params: AuthCallbackParams,
) -> Result<SignInPayload, AppError> {
    check_fields(&params).into_result()?;

    let token = new_access_token();
    let user = match users.find_by_identity(provider, &params.uid).await? {
        Some(existing) => reissue_token(users, existing, &token).await?,
        None => {
            let uid = params.uid.clone();
            let is_admin = config.is_admin_identity(provider, &uid);
            let candidate = params.into_user(provider, is_admin, token.clone(), Utc::now());
            match users.insert(&candidate).await {
                Ok(user) => {
                    info!(user_id = %user.id, provider = %provider, is_admin, "User registered");
                    user
                }
                // a concurrent first sign-in registered this identity
                Err(StoreError::Conflict(constraint)) if constraint == USER_IDENTITY_CONSTRAINT => {
                    let existing = users
                        .find_by_identity(provider, &uid)
                        .await?
                        .ok_or_else(AppError::resource_not_found)?;
                    reissue_token(users, existing, &token).await?
                }
                Err(e) => return Err(e.into()),
            }
        }
    };

    info!(user_id = %user.id, provider = %provider, "Signed in");
    Ok(SignInPayload { token, user })
}

async fn reissue_token(
    users: &dyn UserRepository,
    existing: User,
    token: &str,
) -> Result<User, AppError> {
    if !existing.enable {
        return Err(AppError::AuthError("Account disabled".to_string()));
    }
    users
        .set_access_token(existing.id, Some(token))
        .await?
        .ok_or_else(AppError::resource_not_found)
}

pub async fn failure(Query(params): Query<FailureParams>) -> AppError {
    let reason = params
        .message
        .unwrap_or_else(|| "unknown error".to_string());
    warn!(reason = %reason, "Provider sign-in failed");
    AppError::AuthError(format!("Authentication failed: {reason}"))
}

pub async fn signout(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Response, AppError> {
    state.users.set_access_token(user.id, None).await?;
    info!(user_id = %user.id, "Signed out");
    Ok(empty_success("Signed out successfully"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MemoryStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Misses the first identity lookup, as if another request registered
    /// the user between our lookup and our insert.
    struct LateRegistration {
        inner: MemoryStore,
        missed: AtomicBool,
    }

    #[async_trait]
    impl UserRepository for LateRegistration {
        async fn insert(&self, user: &User) -> Result<User, StoreError> {
            self.inner.insert(user).await
        }

        async fn find(&self, id: Uuid) -> Result<Option<User>, StoreError> {
            UserRepository::find(&self.inner, id).await
        }

        async fn find_by_identity(
            &self,
            provider: &str,
            uid: &str,
        ) -> Result<Option<User>, StoreError> {
            if !self.missed.swap(true, Ordering::SeqCst) {
                return Ok(None);
            }
            self.inner.find_by_identity(provider, uid).await
        }

        async fn find_by_token(&self, token: &str) -> Result<Option<User>, StoreError> {
            self.inner.find_by_token(token).await
        }

        async fn set_access_token(
            &self,
            id: Uuid,
            token: Option<&str>,
        ) -> Result<Option<User>, StoreError> {
            self.inner.set_access_token(id, token).await
        }

        async fn set_enabled(&self, id: Uuid, enable: bool) -> Result<Option<User>, StoreError> {
            UserRepository::set_enabled(&self.inner, id, enable).await
        }

        async fn list(&self) -> Result<Vec<User>, StoreError> {
            self.inner.list().await
        }
    }

    fn params(uid: &str) -> AuthCallbackParams {
        AuthCallbackParams {
            uid: uid.to_string(),
            name: "userA".to_string(),
            handle: None,
        }
    }

    #[tokio::test]
    async fn test_lost_registration_race_still_signs_in() {
        let store = MemoryStore::new();
        let config = Config::default();
        let winner = sign_in(&store, &config, "twitter", params("1")).await.unwrap();

        let users = LateRegistration {
            inner: store.clone(),
            missed: AtomicBool::new(false),
        };
        let loser = sign_in(&users, &config, "twitter", params("1")).await.unwrap();

        assert_eq!(loser.user.id, winner.user.id);
        assert_eq!(store.list().await.unwrap().len(), 1);
        let current = store.find_by_token(&loser.token).await.unwrap();
        assert_eq!(current.map(|u| u.id), Some(winner.user.id));
    }

    #[tokio::test]
    async fn test_disabled_user_cannot_sign_in() {
        let store = MemoryStore::new();
        let config = Config::default();
        let first = sign_in(&store, &config, "twitter", params("1")).await.unwrap();
        UserRepository::set_enabled(&store, first.user.id, false)
            .await
            .unwrap();

        let result = sign_in(&store, &config, "twitter", params("1")).await;
        assert!(matches!(result, Err(AppError::AuthError(_))));
    }
}
