//! Attendance endpoints. Every rejected RSVP, whatever the reason, answers
//! 404 `{"message":"unsuccessful"}`; the reason only goes to the log.
//!
//! Status and cancel look the session up without the visibility filter so an
//! attendee can still drop an RSVP after the event or session is disabled.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Response;

use crate::context::CurrentUser;
use crate::handlers::{find_event, find_session, visible_event};
use crate::models::Session;
use crate::services::RsvpManager;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::{attendance, message};

const RSVP_SUCCESS: &str = "success";

async fn rsvp_session(
    state: &AppState,
    event_id: &str,
    session_id: &str,
) -> Result<Session, AppError> {
    let event = find_event(state, event_id).await?;
    find_session(state, &event, session_id).await
}

pub async fn rsvp_status(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((event_id, session_id)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let session = rsvp_session(&state, &event_id, &session_id).await?;
    let attending = RsvpManager::new(state.rsvps.as_ref())
        .is_attending(&user, &session)
        .await?;
    Ok(attendance(attending))
}

pub async fn attend(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((event_id, session_id)): Path<(String, String)>,
) -> Result<Response, AppError> {
    // a disabled session is left to the manager, which rejects it
    let event = visible_event(&state, &user, &event_id).await?;
    let session = find_session(&state, &event, &session_id).await?;
    RsvpManager::new(state.rsvps.as_ref())
        .attend(&user, &session)
        .await?;
    Ok(message(StatusCode::OK, RSVP_SUCCESS))
}

pub async fn cancel(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((event_id, session_id)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let session = rsvp_session(&state, &event_id, &session_id).await?;
    RsvpManager::new(state.rsvps.as_ref())
        .cancel(&user, &session)
        .await?;
    Ok(message(StatusCode::OK, RSVP_SUCCESS))
}
