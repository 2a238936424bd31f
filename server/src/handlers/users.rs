use axum::extract::{Path, State};
use axum::response::Response;
use tracing::info;

use crate::context::CurrentUser;
use crate::handlers::load_user;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::success;

pub async fn me(CurrentUser(user): CurrentUser) -> Response {
    success(user, "Current user")
}

pub async fn list_users(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Response, AppError> {
    current.require_admin()?;
    let users = state.users.list().await?;
    Ok(success(users, "Users retrieved"))
}

pub async fn enable_user(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    set_enabled(&state, &current, &id, true).await
}

pub async fn disable_user(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    set_enabled(&state, &current, &id, false).await
}

async fn set_enabled(
    state: &AppState,
    current: &CurrentUser,
    raw_id: &str,
    enable: bool,
) -> Result<Response, AppError> {
    current.require_admin()?;
    let target = load_user(state, raw_id).await?;
    if target.id == current.0.id && !enable {
        return Err(AppError::Forbidden(
            "Administrators cannot disable their own account".to_string(),
        ));
    }

    let user = state
        .users
        .set_enabled(target.id, enable)
        .await?
        .ok_or_else(AppError::resource_not_found)?;
    info!(user_id = %user.id, admin_id = %current.0.id, enable, "User access changed");

    let message = if enable { "User enabled" } else { "User disabled" };
    Ok(success(user, message))
}
