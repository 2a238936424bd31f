//! Date-range rules between events and their sessions.
//!
//! Everything here is pure: callers pass `now` explicitly and the functions
//! only report the first violation they find. Handlers run these checks
//! before every insert or update and abort the write on failure.

use std::fmt;

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::session::Session;
use crate::validation::FieldErrors;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Which edge of an enclosing range was crossed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    Start,
    End,
}

impl Boundary {
    pub fn field(self) -> &'static str {
        match self {
            Boundary::Start => "start_date",
            Boundary::End => "end_date",
        }
    }
}

impl fmt::Display for Boundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Boundary::Start => f.write_str("start"),
            Boundary::End => f.write_str("end"),
        }
    }
}

impl Schedule {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn is_ordered(&self) -> bool {
        self.start < self.end
    }

    /// Checks that `inner` lies within this range, start edge first.
    pub fn contains(&self, inner: &Schedule) -> Result<(), Boundary> {
        if inner.start < self.start {
            Err(Boundary::Start)
        } else if inner.end > self.end {
            Err(Boundary::End)
        } else {
            Ok(())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleViolation {
    #[error("event must start in the future and before it ends")]
    EventStartUnacceptable,

    #[error("session {session_id} would fall outside the event at its {boundary} date")]
    SessionsOutsideEvent { session_id: Uuid, boundary: Boundary },

    #[error("session must start before it ends")]
    SessionStartNotBeforeEnd,

    #[error("session falls outside the event at its {0} date")]
    SessionOutsideEvent(Boundary),
}

impl ScheduleViolation {
    pub fn field(&self) -> &'static str {
        match self {
            ScheduleViolation::EventStartUnacceptable
            | ScheduleViolation::SessionStartNotBeforeEnd => "start_date",
            ScheduleViolation::SessionsOutsideEvent { boundary, .. }
            | ScheduleViolation::SessionOutsideEvent(boundary) => boundary.field(),
        }
    }

    #[cfg(test)]
    fn boundary(&self) -> Option<Boundary> {
        match self {
            ScheduleViolation::SessionsOutsideEvent { boundary, .. }
            | ScheduleViolation::SessionOutsideEvent(boundary) => Some(*boundary),
            _ => None,
        }
    }

    fn user_message(&self) -> &'static str {
        match self {
            ScheduleViolation::EventStartUnacceptable => {
                "should be before the end date and in the future"
            }
            ScheduleViolation::SessionsOutsideEvent { .. } => {
                "cannot update the event as it contains sessions outside the new range"
            }
            ScheduleViolation::SessionStartNotBeforeEnd => "should be before the end date",
            ScheduleViolation::SessionOutsideEvent(_) => "must lie within the event's dates",
        }
    }
}

impl From<ScheduleViolation> for FieldErrors {
    fn from(violation: ScheduleViolation) -> Self {
        let mut errors = FieldErrors::new();
        errors.add(violation.field(), violation.user_message());
        errors
    }
}

/// A new event must start strictly after `now` and strictly before it ends.
pub fn validate_new_event(schedule: &Schedule, now: DateTime<Utc>) -> Result<(), ScheduleViolation> {
    if schedule.start <= now || !schedule.is_ordered() {
        return Err(ScheduleViolation::EventStartUnacceptable);
    }
    Ok(())
}

/// Every session must still fit inside `schedule`.
pub fn ensure_contains_sessions(
    schedule: &Schedule,
    sessions: &[Session],
) -> Result<(), ScheduleViolation> {
    for session in sessions {
        schedule
            .contains(&session.schedule())
            .map_err(|boundary| ScheduleViolation::SessionsOutsideEvent {
                session_id: session.id,
                boundary,
            })?;
    }
    Ok(())
}

/// Rules for changing an existing event's dates.
///
/// The future-start rule only applies when the start date actually moves, so
/// an event that is already running can still be edited.
pub fn validate_event_update(
    schedule: &Schedule,
    previous: &Schedule,
    sessions: &[Session],
    now: DateTime<Utc>,
) -> Result<(), ScheduleViolation> {
    if !schedule.is_ordered() {
        return Err(ScheduleViolation::EventStartUnacceptable);
    }
    if schedule.start != previous.start && schedule.start <= now {
        return Err(ScheduleViolation::EventStartUnacceptable);
    }
    ensure_contains_sessions(schedule, sessions)
}

pub fn validate_session(schedule: &Schedule, event: &Schedule) -> Result<(), ScheduleViolation> {
    if !schedule.is_ordered() {
        return Err(ScheduleViolation::SessionStartNotBeforeEnd);
    }
    event
        .contains(schedule)
        .map_err(ScheduleViolation::SessionOutsideEvent)
}
