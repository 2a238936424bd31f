use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::validation::validate_not_blank;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub provider: String,
    pub uid: String,
    pub handle: Option<String>,
    #[serde(skip_serializing)]
    pub access_token: Option<String>,
    pub is_admin: bool,
    pub enable: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Identity asserted by the external provider on its sign-in callback.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AuthCallbackParams {
    #[validate(custom(function = "validate_not_blank"))]
    pub uid: String,
    #[serde(default)]
    #[validate(custom(function = "validate_not_blank"))]
    pub name: String,
    pub handle: Option<String>,
}

impl AuthCallbackParams {
    pub fn into_user(
        self,
        provider: &str,
        is_admin: bool,
        access_token: String,
        now: DateTime<Utc>,
    ) -> User {
        User {
            id: Uuid::new_v4(),
            name: self.name.trim().to_string(),
            provider: provider.to_string(),
            uid: self.uid,
            handle: self.handle,
            access_token: Some(access_token),
            is_admin,
            enable: true,
            created_at: now,
            updated_at: now,
        }
    }
}
