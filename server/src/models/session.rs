use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::validation::schedule::Schedule;
use crate::validation::validate_not_blank;

/// A scheduled slot inside an event. Its dates always lie within the event's.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Session {
    pub id: Uuid,
    pub event_id: Uuid,
    pub topic: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub location: String,
    pub speaker: Option<String>,
    pub description: Option<String>,
    pub enable: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn schedule(&self) -> Schedule {
        Schedule::new(self.start_date, self.end_date)
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateSessionRequest {
    #[validate(custom(function = "validate_not_blank"))]
    pub topic: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[validate(custom(function = "validate_not_blank"))]
    pub location: String,
    pub speaker: Option<String>,
    #[validate(length(max = 500, message = "is too long (maximum is 500 characters)"))]
    pub description: Option<String>,
    pub enable: Option<bool>,
}

impl CreateSessionRequest {
    pub fn schedule(&self) -> Schedule {
        Schedule::new(self.start_date, self.end_date)
    }

    pub fn into_session(self, event_id: Uuid, now: DateTime<Utc>) -> Session {
        Session {
            id: Uuid::new_v4(),
            event_id,
            topic: self.topic.trim().to_string(),
            start_date: self.start_date,
            end_date: self.end_date,
            location: self.location,
            speaker: self.speaker,
            description: self.description,
            enable: self.enable.unwrap_or(true),
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateSessionRequest {
    #[validate(custom(function = "validate_not_blank"))]
    pub topic: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    #[validate(custom(function = "validate_not_blank"))]
    pub location: Option<String>,
    pub speaker: Option<String>,
    #[validate(length(max = 500, message = "is too long (maximum is 500 characters)"))]
    pub description: Option<String>,
    pub enable: Option<bool>,
}

impl UpdateSessionRequest {
    pub fn schedule_for(&self, session: &Session) -> Schedule {
        Schedule::new(
            self.start_date.unwrap_or(session.start_date),
            self.end_date.unwrap_or(session.end_date),
        )
    }

    pub fn apply_to(self, session: &Session, now: DateTime<Utc>) -> Session {
        let schedule = self.schedule_for(session);

        Session {
            id: session.id,
            event_id: session.event_id,
            topic: self
                .topic
                .map(|topic| topic.trim().to_string())
                .unwrap_or_else(|| session.topic.clone()),
            start_date: schedule.start,
            end_date: schedule.end,
            location: self.location.unwrap_or_else(|| session.location.clone()),
            speaker: self.speaker.or_else(|| session.speaker.clone()),
            description: self.description.or_else(|| session.description.clone()),
            enable: self.enable.unwrap_or(session.enable),
            created_at: session.created_at,
            updated_at: now,
        }
    }
}
