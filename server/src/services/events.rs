use chrono::{DateTime, Utc};
use tracing::info;

use crate::models::{CreateEventRequest, Event, UpdateEventRequest, User};
use crate::repository::{EventRepository, SessionRepository};
use crate::utils::error::AppError;
use crate::validation::check_fields;
use crate::validation::schedule::{validate_event_update, validate_new_event};

/// Field and date errors are reported together; nothing is written unless both pass.
pub async fn create_event(
    events: &dyn EventRepository,
    owner: &User,
    request: CreateEventRequest,
    now: DateTime<Utc>,
) -> Result<Event, AppError> {
    let mut errors = check_fields(&request);
    if let Err(violation) = validate_new_event(&request.schedule(), now) {
        errors.merge(violation.into());
    }
    errors.into_result()?;

    let event = events.insert(&request.into_event(owner.id, now)?).await?;
    info!(event_id = %event.id, user_id = %owner.id, "Event created");
    Ok(event)
}

/// Applies a partial update. The new range must still hold every existing
/// session, enabled or not.
pub async fn update_event(
    events: &dyn EventRepository,
    sessions: &dyn SessionRepository,
    event: &Event,
    request: UpdateEventRequest,
    now: DateTime<Utc>,
) -> Result<Event, AppError> {
    check_fields(&request).into_result()?;

    let schedule = request.schedule_for(event);
    let children = sessions.list_for_event(event.id, false).await?;
    validate_event_update(&schedule, &event.schedule(), &children, now)?;

    let candidate = request.apply_to(event, now)?;
    let updated = events
        .update(&candidate)
        .await?
        .ok_or_else(AppError::event_not_found)?;
    info!(event_id = %updated.id, "Event updated");
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Session;
    use crate::repository::MemoryStore;
    use chrono::Duration;
    use uuid::Uuid;

    fn owner() -> User {
        User {
            id: Uuid::new_v4(),
            name: "organizer".to_string(),
            provider: "twitter".to_string(),
            uid: "42".to_string(),
            handle: None,
            access_token: None,
            is_admin: false,
            enable: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn request(start: DateTime<Utc>, end: DateTime<Utc>) -> CreateEventRequest {
        CreateEventRequest {
            name: "dilpreet".to_string(),
            address: "Hno. 1234".to_string(),
            city: "Delhi".to_string(),
            country: "India".to_string(),
            contact_number: "131313".into(),
            description: "ddqqdqdqd".to_string(),
            start_date: start,
            end_date: end,
            enable: Some(true),
            logo_url: None,
        }
    }

    #[tokio::test]
    async fn test_create_rejects_past_start_and_blank_name_together() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let mut req = request(now - Duration::days(1), now + Duration::days(1));
        req.name = String::new();

        let err = create_event(&store, &owner(), req, now).await.unwrap_err();

        match err {
            AppError::ValidationError(fields) => {
                assert!(fields.get("start_date").is_some());
                assert!(fields.get("name").is_some());
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(store
            .query(&crate::filters::EventQuery::new())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_update_cannot_exclude_sessions() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let start = now + Duration::days(10);
        let event = create_event(&store, &owner(), request(start, start + Duration::days(2)), now)
            .await
            .unwrap();
        let session = Session {
            id: Uuid::new_v4(),
            event_id: event.id,
            topic: "Closing".to_string(),
            start_date: start + Duration::days(1),
            end_date: start + Duration::days(2),
            location: "Hall B".to_string(),
            speaker: None,
            description: None,
            enable: false,
            created_at: now,
            updated_at: now,
        };
        SessionRepository::insert(&store, &session).await.unwrap();

        let shrink = UpdateEventRequest {
            end_date: Some(start + Duration::days(1)),
            ..Default::default()
        };
        let err = update_event(&store, &store, &event, shrink, now)
            .await
            .unwrap_err();
        match err {
            AppError::ValidationError(fields) => assert!(fields.get("end_date").is_some()),
            other => panic!("unexpected error: {other:?}"),
        }

        let stored = EventRepository::find(&store, event.id).await.unwrap().unwrap();
        assert_eq!(stored.end_date, event.end_date);

        let extend = UpdateEventRequest {
            end_date: Some(start + Duration::days(3)),
            ..Default::default()
        };
        let updated = update_event(&store, &store, &event, extend, now).await.unwrap();
        assert_eq!(updated.end_date, start + Duration::days(3));
    }
}
