use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A user's attendance of one session. At most one per (user, session).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Rsvp {
    pub id: Uuid,
    pub user_id: Uuid,
    pub session_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Rsvp {
    pub fn new(user_id: Uuid, session_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            session_id,
            created_at: now,
        }
    }
}
