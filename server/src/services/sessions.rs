use chrono::{DateTime, Utc};
use tracing::info;

use crate::models::{CreateSessionRequest, Event, Session, UpdateSessionRequest};
use crate::repository::SessionRepository;
use crate::utils::error::AppError;
use crate::validation::check_fields;
use crate::validation::schedule::validate_session;

pub async fn create_session(
    sessions: &dyn SessionRepository,
    event: &Event,
    request: CreateSessionRequest,
    now: DateTime<Utc>,
) -> Result<Session, AppError> {
    let mut errors = check_fields(&request);
    if let Err(violation) = validate_session(&request.schedule(), &event.schedule()) {
        errors.merge(violation.into());
    }
    errors.into_result()?;

    let session = sessions.insert(&request.into_session(event.id, now)).await?;
    info!(event_id = %event.id, session_id = %session.id, "Session created");
    Ok(session)
}

pub async fn update_session(
    sessions: &dyn SessionRepository,
    event: &Event,
    session: &Session,
    request: UpdateSessionRequest,
    now: DateTime<Utc>,
) -> Result<Session, AppError> {
    let mut errors = check_fields(&request);
    if let Err(violation) = validate_session(&request.schedule_for(session), &event.schedule()) {
        errors.merge(violation.into());
    }
    errors.into_result()?;

    let updated = sessions
        .update(&request.apply_to(session, now))
        .await?
        .ok_or_else(AppError::resource_not_found)?;
    info!(event_id = %event.id, session_id = %updated.id, "Session updated");
    Ok(updated)
}
