use chrono::Utc;
use thiserror::Error;
use tracing::info;

use crate::models::{Rsvp, Session, User};
use crate::repository::{RsvpRepository, StoreError};

#[derive(Debug, Error)]
pub enum RsvpError {
    #[error("already attending this session")]
    AlreadyAttending,

    #[error("session is disabled")]
    SessionDisabled,

    #[error("not attending this session")]
    NotAttending,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Attendance rules for one user and one session.
///
/// The existence check runs first, but the unique index on (user, session)
/// is what decides a race: a conflicting insert is reported as
/// [`RsvpError::AlreadyAttending`].
pub struct RsvpManager<'a> {
    rsvps: &'a dyn RsvpRepository,
}

impl<'a> RsvpManager<'a> {
    pub fn new(rsvps: &'a dyn RsvpRepository) -> Self {
        Self { rsvps }
    }

    pub async fn attend(&self, user: &User, session: &Session) -> Result<Rsvp, RsvpError> {
        if self.is_attending(user, session).await? {
            return Err(RsvpError::AlreadyAttending);
        }
        if !session.enable {
            return Err(RsvpError::SessionDisabled);
        }

        let rsvp = Rsvp::new(user.id, session.id, Utc::now());
        match self.rsvps.create(&rsvp).await {
            Ok(rsvp) => {
                info!(user_id = %user.id, session_id = %session.id, "RSVP created");
                Ok(rsvp)
            }
            Err(StoreError::Conflict(_)) => Err(RsvpError::AlreadyAttending),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn cancel(&self, user: &User, session: &Session) -> Result<(), RsvpError> {
        if !self.rsvps.delete(user.id, session.id).await? {
            return Err(RsvpError::NotAttending);
        }
        info!(user_id = %user.id, session_id = %session.id, "RSVP cancelled");
        Ok(())
    }

    pub async fn is_attending(&self, user: &User, session: &Session) -> Result<bool, RsvpError> {
        Ok(self.rsvps.find(user.id, session.id).await?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MemoryStore;
    use chrono::Duration;
    use uuid::Uuid;

    fn user() -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            name: "userA".to_string(),
            provider: "twitter".to_string(),
            uid: "1".to_string(),
            handle: None,
            access_token: None,
            is_admin: false,
            enable: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn session(enable: bool) -> Session {
        let start = Utc::now() + Duration::days(2);
        Session {
            id: Uuid::new_v4(),
            event_id: Uuid::new_v4(),
            topic: "dilpreet".to_string(),
            start_date: start,
            end_date: start + Duration::days(1),
            location: "Hno. 1234".to_string(),
            speaker: None,
            description: Some("ddqqdqdqd".to_string()),
            enable,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_second_attend_is_rejected() {
        let store = MemoryStore::new();
        let manager = RsvpManager::new(&store);
        let (user, session) = (user(), session(true));

        let rsvp = manager.attend(&user, &session).await.unwrap();
        assert_eq!(rsvp.user_id, user.id);
        assert_eq!(rsvp.session_id, session.id);

        let second = manager.attend(&user, &session).await;
        assert!(matches!(second, Err(RsvpError::AlreadyAttending)));
        assert_eq!(store.rsvp_count().await, 1);
    }

    #[tokio::test]
    async fn test_disabled_session_cannot_be_attended() {
        let store = MemoryStore::new();
        let manager = RsvpManager::new(&store);

        let result = manager.attend(&user(), &session(false)).await;

        assert!(matches!(result, Err(RsvpError::SessionDisabled)));
        assert_eq!(store.rsvp_count().await, 0);
    }

    #[tokio::test]
    async fn test_cancel_without_rsvp_is_not_attending() {
        let store = MemoryStore::new();
        let manager = RsvpManager::new(&store);

        let result = manager.cancel(&user(), &session(true)).await;

        assert!(matches!(result, Err(RsvpError::NotAttending)));
        assert_eq!(store.rsvp_count().await, 0);
    }

    #[tokio::test]
    async fn test_attend_cancel_round_trip() {
        let store = MemoryStore::new();
        let manager = RsvpManager::new(&store);
        let (user, session) = (user(), session(true));

        assert!(!manager.is_attending(&user, &session).await.unwrap());
        manager.attend(&user, &session).await.unwrap();
        assert!(manager.is_attending(&user, &session).await.unwrap());
        manager.cancel(&user, &session).await.unwrap();
        assert!(!manager.is_attending(&user, &session).await.unwrap());

        // attending again after cancelling is allowed
        manager.attend(&user, &session).await.unwrap();
    }

    #[tokio::test]
    async fn test_concurrent_attends_leave_one_rsvp() {
        let store = MemoryStore::new();
        let (user, session) = (user(), session(true));

        let manager = RsvpManager::new(&store);

        let (a, b) = tokio::join!(
            manager.attend(&user, &session),
            manager.attend(&user, &session)
        );

        assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);
        assert_eq!(store.rsvp_count().await, 1);
    }
}
