//! Data access, one trait per entity.
//!
//! Handlers only see these traits. [`postgres::PgStore`] backs them with
//! sqlx in production; [`memory::MemoryStore`] keeps everything in process
//! for tests and local runs. Both enforce the same uniqueness rules and the
//! same cascades (event → sessions → rsvps).

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::filters::EventQuery;
use crate::models::{Event, Rsvp, Session, User};

pub use memory::MemoryStore;
pub use postgres::PgStore;

pub const RSVP_UNIQUE_CONSTRAINT: &str = "rsvps_user_session_key";
pub const USER_IDENTITY_CONSTRAINT: &str = "users_provider_uid_key";
pub const USER_TOKEN_CONSTRAINT: &str = "users_access_token_key";

#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique constraint rejected the write.
    #[error("unique constraint violated: {0}")]
    Conflict(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait EventRepository: Send + Sync {
    async fn insert(&self, event: &Event) -> Result<Event, StoreError>;

    async fn find(&self, id: Uuid) -> Result<Option<Event>, StoreError>;

    /// Writes every column of `event`; `None` if it no longer exists.
    async fn update(&self, event: &Event) -> Result<Option<Event>, StoreError>;

    async fn set_enabled(&self, id: Uuid, enable: bool) -> Result<Option<Event>, StoreError>;

    /// Hard delete, cascading to sessions and their RSVPs.
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;

    async fn query(&self, query: &EventQuery) -> Result<Vec<Event>, StoreError>;

    /// Distinct users holding an RSVP for any session of the event, by name.
    async fn attendees(&self, event_id: Uuid) -> Result<Vec<User>, StoreError>;
}

#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn insert(&self, session: &Session) -> Result<Session, StoreError>;

    /// Looks a session up within its event only.
    async fn find(&self, event_id: Uuid, id: Uuid) -> Result<Option<Session>, StoreError>;

    /// Sessions of an event ordered by start date.
    async fn list_for_event(
        &self,
        event_id: Uuid,
        enabled_only: bool,
    ) -> Result<Vec<Session>, StoreError>;

    async fn update(&self, session: &Session) -> Result<Option<Session>, StoreError>;

    async fn set_enabled(&self, id: Uuid, enable: bool) -> Result<Option<Session>, StoreError>;

    /// Hard delete, cascading to RSVPs.
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;

    async fn attendees(&self, session_id: Uuid) -> Result<Vec<User>, StoreError>;
}

#[async_trait]
pub trait RsvpRepository: Send + Sync {
    /// Fails with [`StoreError::Conflict`] if the user already holds one.
    async fn create(&self, rsvp: &Rsvp) -> Result<Rsvp, StoreError>;

    async fn find(&self, user_id: Uuid, session_id: Uuid) -> Result<Option<Rsvp>, StoreError>;

    async fn delete(&self, user_id: Uuid, session_id: Uuid) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn insert(&self, user: &User) -> Result<User, StoreError>;

    async fn find(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    async fn find_by_identity(&self, provider: &str, uid: &str)
        -> Result<Option<User>, StoreError>;

    async fn find_by_token(&self, token: &str) -> Result<Option<User>, StoreError>;

    async fn set_access_token(
        &self,
        id: Uuid,
        token: Option<&str>,
    ) -> Result<Option<User>, StoreError>;

    async fn set_enabled(&self, id: Uuid, enable: bool) -> Result<Option<User>, StoreError>;

    async fn list(&self) -> Result<Vec<User>, StoreError>;
}
