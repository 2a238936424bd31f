use axum::extract::{Path, State};
use axum::response::Response;
use axum::Json;
use chrono::Utc;
use tracing::info;

use crate::context::CurrentUser;
use crate::handlers::{managed_event, visible_event, visible_session};
use crate::models::{CreateSessionRequest, UpdateSessionRequest};
use crate::services::sessions;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::{created, empty_success, success};

pub async fn list_sessions(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(event_id): Path<String>,
) -> Result<Response, AppError> {
    let event = visible_event(&state, &user, &event_id).await?;
    let enabled_only = !event.can_be_managed_by(&user);
    let list = state
        .sessions
        .list_for_event(event.id, enabled_only)
        .await?;
    Ok(success(list, "Sessions retrieved"))
}

pub async fn create_session(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(event_id): Path<String>,
    Json(request): Json<CreateSessionRequest>,
) -> Result<Response, AppError> {
    let event = managed_event(&state, &user, &event_id).await?;
    let session =
        sessions::create_session(state.sessions.as_ref(), &event, request, Utc::now()).await?;
    Ok(created(session, "Session created successfully"))
}

pub async fn show_session(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((event_id, session_id)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let event = visible_event(&state, &user, &event_id).await?;
    let session = visible_session(&state, &user, &event, &session_id).await?;
    Ok(success(session, "Session retrieved"))
}

pub async fn update_session(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((event_id, session_id)): Path<(String, String)>,
    Json(request): Json<UpdateSessionRequest>,
) -> Result<Response, AppError> {
    let event = managed_event(&state, &user, &event_id).await?;
    let session = visible_session(&state, &user, &event, &session_id).await?;
    let updated = sessions::update_session(
        state.sessions.as_ref(),
        &event,
        &session,
        request,
        Utc::now(),
    )
    .await?;
    Ok(success(updated, "Session updated successfully"))
}

pub async fn delete_session(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((event_id, session_id)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let event = managed_event(&state, &user, &event_id).await?;
    let session = visible_session(&state, &user, &event, &session_id).await?;
    if !state.sessions.delete(session.id).await? {
        return Err(AppError::resource_not_found());
    }
    info!(event_id = %event.id, session_id = %session.id, "Session deleted");
    Ok(empty_success("Session deleted successfully"))
}

pub async fn disable_session(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((event_id, session_id)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let event = managed_event(&state, &user, &event_id).await?;
    let session = visible_session(&state, &user, &event, &session_id).await?;
    let session = state
        .sessions
        .set_enabled(session.id, false)
        .await?
        .ok_or_else(AppError::resource_not_found)?;
    info!(event_id = %event.id, session_id = %session.id, "Session disabled");
    Ok(success(session, "Session disabled"))
}

pub async fn session_attendees(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((event_id, session_id)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let event = visible_event(&state, &user, &event_id).await?;
    let session = visible_session(&state, &user, &event, &session_id).await?;
    let attendees = state.sessions.attendees(session.id).await?;
    Ok(success(attendees, "Attendees retrieved"))
}
