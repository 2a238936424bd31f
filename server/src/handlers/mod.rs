use axum::response::{IntoResponse, Response};
use serde::Serialize;
use uuid::Uuid;

use crate::models::{Event, Session, User};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::success;

pub mod auth;
pub mod events;
pub mod rsvps;
pub mod sessions;
pub mod users;

#[derive(Serialize)]
struct HealthPayload {
    status: &'static str,
    service: &'static str,
}

pub async fn health_check() -> Response {
    let payload = HealthPayload {
        status: "ok",
        service: "eventhub-api",
    };

    success(payload, "Health check successful").into_response()
}

/// Ids arrive as raw path segments so a malformed one reads as "not found"
/// rather than a path rejection.
fn parse_id(raw: &str, missing: fn() -> AppError) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| missing())
}

/// Looks an event up by id regardless of its `enable` flag.
pub(crate) async fn find_event(state: &AppState, raw_id: &str) -> Result<Event, AppError> {
    let id = parse_id(raw_id, AppError::event_not_found)?;
    state
        .events
        .find(id)
        .await?
        .ok_or_else(AppError::event_not_found)
}

/// Looks a session up within `event` regardless of its `enable` flag.
pub(crate) async fn find_session(
    state: &AppState,
    event: &Event,
    raw_id: &str,
) -> Result<Session, AppError> {
    let id = parse_id(raw_id, AppError::resource_not_found)?;
    state
        .sessions
        .find(event.id, id)
        .await?
        .ok_or_else(AppError::resource_not_found)
}

/// Loads an event the caller may see. Disabled events are hidden from
/// everyone but their managers.
pub(crate) async fn visible_event(
    state: &AppState,
    user: &User,
    raw_id: &str,
) -> Result<Event, AppError> {
    let event = find_event(state, raw_id).await?;
    if !event.is_visible_to(user) {
        return Err(AppError::event_not_found());
    }
    Ok(event)
}

pub(crate) async fn managed_event(
    state: &AppState,
    user: &User,
    raw_id: &str,
) -> Result<Event, AppError> {
    let event = visible_event(state, user, raw_id).await?;
    if !event.can_be_managed_by(user) {
        return Err(AppError::Forbidden(
            "Only the event owner can modify this event".to_string(),
        ));
    }
    Ok(event)
}

pub(crate) async fn visible_session(
    state: &AppState,
    user: &User,
    event: &Event,
    raw_id: &str,
) -> Result<Session, AppError> {
    let session = find_session(state, event, raw_id).await?;
    if !session.enable && !event.can_be_managed_by(user) {
        return Err(AppError::resource_not_found());
    }
    Ok(session)
}

pub(crate) async fn load_user(state: &AppState, raw_id: &str) -> Result<User, AppError> {
    let id = parse_id(raw_id, AppError::resource_not_found)?;
    state
        .users
        .find(id)
        .await?
        .ok_or_else(AppError::resource_not_found)
}
