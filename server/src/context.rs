//! Per-request identity.
//!
//! Handlers that need a caller take [`CurrentUser`] as an argument; there is
//! no ambient "current user". The token comes from `Authorization: Bearer`
//! or, for clients that cannot set headers, a `?token=` query parameter.

use async_trait::async_trait;
use axum::extract::{FromRequestParts, Query};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use serde::Deserialize;

use crate::models::User;
use crate::state::AppState;
use crate::utils::error::AppError;

#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[derive(Deserialize)]
struct TokenParams {
    token: Option<String>,
}

fn bearer_token(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

fn query_token(parts: &Parts) -> Option<String> {
    Query::<TokenParams>::try_from_uri(&parts.uri)
        .ok()
        .and_then(|Query(params)| params.token)
        .filter(|token| !token.is_empty())
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .or_else(|| query_token(parts))
            .ok_or_else(|| {
                AppError::AuthError("Please log in to perform the current operation".to_string())
            })?;

        let user = state
            .users
            .find_by_token(&token)
            .await?
            .ok_or_else(|| AppError::AuthError("Invalid access token".to_string()))?;

        if !user.enable {
            return Err(AppError::AuthError("Account disabled".to_string()));
        }

        Ok(Self(user))
    }
}

impl CurrentUser {
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.0.is_admin {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "Only administrators can perform this operation".to_string(),
            ))
        }
    }
}
