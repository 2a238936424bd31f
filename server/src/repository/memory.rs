use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::filters::{matches_search, EventPredicate, EventQuery, SortDirection};
use crate::models::{Event, Rsvp, Session, User};
use crate::repository::{
    EventRepository, RsvpRepository, SessionRepository, StoreError, UserRepository,
    RSVP_UNIQUE_CONSTRAINT, USER_IDENTITY_CONSTRAINT, USER_TOKEN_CONSTRAINT,
};

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    events: HashMap<Uuid, Event>,
    sessions: HashMap<Uuid, Session>,
    rsvps: Vec<Rsvp>,
}

impl Tables {
    fn is_attending_event(&self, user_id: Uuid, event_id: Uuid) -> bool {
        self.rsvps.iter().any(|rsvp| {
            rsvp.user_id == user_id
                && self
                    .sessions
                    .get(&rsvp.session_id)
                    .is_some_and(|session| session.event_id == event_id)
        })
    }

    fn matches(&self, event: &Event, predicate: &EventPredicate) -> bool {
        match predicate {
            EventPredicate::Enabled => event.enable,
            EventPredicate::Past(now) => event.is_past(*now),
            EventPredicate::LiveAndUpcoming(now) => event.is_live_or_upcoming(*now),
            EventPredicate::Search(text) => matches_search(event, text),
            EventPredicate::OwnedBy(user_id) => event.user_id == *user_id,
            EventPredicate::AttendedBy(user_id) => self.is_attending_event(*user_id, event.id),
        }
    }

    fn users_sorted(&self, ids: &HashSet<Uuid>) -> Vec<User> {
        let mut users: Vec<User> = ids
            .iter()
            .filter_map(|id| self.users.get(id).cloned())
            .collect();
        users.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        users
    }
}

/// In-process store with the same constraints as the SQL schema.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn rsvp_count(&self) -> usize {
        self.tables.read().await.rsvps.len()
    }
}

#[async_trait]
impl EventRepository for MemoryStore {
    async fn insert(&self, event: &Event) -> Result<Event, StoreError> {
        let mut tables = self.tables.write().await;
        if tables.events.contains_key(&event.id) {
            return Err(StoreError::Conflict("events_pkey".to_string()));
        }
        tables.events.insert(event.id, event.clone());
        Ok(event.clone())
    }

    async fn find(&self, id: Uuid) -> Result<Option<Event>, StoreError> {
        Ok(self.tables.read().await.events.get(&id).cloned())
    }

    async fn update(&self, event: &Event) -> Result<Option<Event>, StoreError> {
        let mut tables = self.tables.write().await;
        match tables.events.get_mut(&event.id) {
            Some(stored) => {
                *stored = event.clone();
                Ok(Some(event.clone()))
            }
            None => Ok(None),
        }
    }

    async fn set_enabled(&self, id: Uuid, enable: bool) -> Result<Option<Event>, StoreError> {
        let mut tables = self.tables.write().await;
        Ok(tables.events.get_mut(&id).map(|event| {
            event.enable = enable;
            event.updated_at = Utc::now();
            event.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        if tables.events.remove(&id).is_none() {
            return Ok(false);
        }
        let session_ids: HashSet<Uuid> = tables
            .sessions
            .values()
            .filter(|session| session.event_id == id)
            .map(|session| session.id)
            .collect();
        tables.sessions.retain(|sid, _| !session_ids.contains(sid));
        tables
            .rsvps
            .retain(|rsvp| !session_ids.contains(&rsvp.session_id));
        Ok(true)
    }

    async fn query(&self, query: &EventQuery) -> Result<Vec<Event>, StoreError> {
        let tables = self.tables.read().await;
        let mut events: Vec<Event> = tables
            .events
            .values()
            .filter(|event| {
                query
                    .predicates()
                    .iter()
                    .all(|predicate| tables.matches(event, predicate))
            })
            .cloned()
            .collect();

        match query.order() {
            Some(SortDirection::Asc) => events.sort_by(|a, b| {
                a.start_date.cmp(&b.start_date).then(a.id.cmp(&b.id))
            }),
            Some(SortDirection::Desc) => events.sort_by(|a, b| {
                b.start_date.cmp(&a.start_date).then(a.id.cmp(&b.id))
            }),
            None => events.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id))),
        }

        if let Some(page) = query.page() {
            let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
            events = events
                .into_iter()
                .skip(offset)
                .take(page.per_page as usize)
                .collect();
        }
        Ok(events)
    }

    async fn attendees(&self, event_id: Uuid) -> Result<Vec<User>, StoreError> {
        let tables = self.tables.read().await;
        let user_ids: HashSet<Uuid> = tables
            .rsvps
            .iter()
            .filter(|rsvp| {
                tables
                    .sessions
                    .get(&rsvp.session_id)
                    .is_some_and(|session| session.event_id == event_id)
            })
            .map(|rsvp| rsvp.user_id)
            .collect();
        Ok(tables.users_sorted(&user_ids))
    }
}

#[async_trait]
impl SessionRepository for MemoryStore {
    async fn insert(&self, session: &Session) -> Result<Session, StoreError> {
        let mut tables = self.tables.write().await;
        if tables.sessions.contains_key(&session.id) {
            return Err(StoreError::Conflict("sessions_pkey".to_string()));
        }
        tables.sessions.insert(session.id, session.clone());
        Ok(session.clone())
    }

    async fn find(&self, event_id: Uuid, id: Uuid) -> Result<Option<Session>, StoreError> {
        Ok(self
            .tables
            .read()
            .await
            .sessions
            .get(&id)
            .filter(|session| session.event_id == event_id)
            .cloned())
    }

    async fn list_for_event(
        &self,
        event_id: Uuid,
        enabled_only: bool,
    ) -> Result<Vec<Session>, StoreError> {
        let tables = self.tables.read().await;
        let mut sessions: Vec<Session> = tables
            .sessions
            .values()
            .filter(|session| session.event_id == event_id && (session.enable || !enabled_only))
            .cloned()
            .collect();
        sessions.sort_by(|a, b| a.start_date.cmp(&b.start_date).then(a.id.cmp(&b.id)));
        Ok(sessions)
    }

    async fn update(&self, session: &Session) -> Result<Option<Session>, StoreError> {
        let mut tables = self.tables.write().await;
        match tables.sessions.get_mut(&session.id) {
            Some(stored) => {
                *stored = session.clone();
                Ok(Some(session.clone()))
            }
            None => Ok(None),
        }
    }

    async fn set_enabled(&self, id: Uuid, enable: bool) -> Result<Option<Session>, StoreError> {
        let mut tables = self.tables.write().await;
        Ok(tables.sessions.get_mut(&id).map(|session| {
            session.enable = enable;
            session.updated_at = Utc::now();
            session.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        if tables.sessions.remove(&id).is_none() {
            return Ok(false);
        }
        tables.rsvps.retain(|rsvp| rsvp.session_id != id);
        Ok(true)
    }

    async fn attendees(&self, session_id: Uuid) -> Result<Vec<User>, StoreError> {
        let tables = self.tables.read().await;
        let user_ids: HashSet<Uuid> = tables
            .rsvps
            .iter()
            .filter(|rsvp| rsvp.session_id == session_id)
            .map(|rsvp| rsvp.user_id)
            .collect();
        Ok(tables.users_sorted(&user_ids))
    }
}

#[async_trait]
impl RsvpRepository for MemoryStore {
    async fn create(&self, rsvp: &Rsvp) -> Result<Rsvp, StoreError> {
        let mut tables = self.tables.write().await;
        let duplicate = tables
            .rsvps
            .iter()
            .any(|r| r.user_id == rsvp.user_id && r.session_id == rsvp.session_id);
        if duplicate {
            return Err(StoreError::Conflict(RSVP_UNIQUE_CONSTRAINT.to_string()));
        }
        tables.rsvps.push(rsvp.clone());
        Ok(rsvp.clone())
    }

    async fn find(&self, user_id: Uuid, session_id: Uuid) -> Result<Option<Rsvp>, StoreError> {
        Ok(self
            .tables
            .read()
            .await
            .rsvps
            .iter()
            .find(|r| r.user_id == user_id && r.session_id == session_id)
            .cloned())
    }

    async fn delete(&self, user_id: Uuid, session_id: Uuid) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        let before = tables.rsvps.len();
        tables
            .rsvps
            .retain(|r| !(r.user_id == user_id && r.session_id == session_id));
        Ok(tables.rsvps.len() < before)
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn insert(&self, user: &User) -> Result<User, StoreError> {
        let mut tables = self.tables.write().await;
        let identity_taken = tables
            .users
            .values()
            .any(|u| u.provider == user.provider && u.uid == user.uid);
        if identity_taken {
            return Err(StoreError::Conflict(USER_IDENTITY_CONSTRAINT.to_string()));
        }
        if let Some(token) = &user.access_token {
            if tables
                .users
                .values()
                .any(|u| u.access_token.as_ref() == Some(token))
            {
                return Err(StoreError::Conflict(USER_TOKEN_CONSTRAINT.to_string()));
            }
        }
        tables.users.insert(user.id, user.clone());
        Ok(user.clone())
    }

    async fn find(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_by_identity(
        &self,
        provider: &str,
        uid: &str,
    ) -> Result<Option<User>, StoreError> {
        Ok(self
            .tables
            .read()
            .await
            .users
            .values()
            .find(|u| u.provider == provider && u.uid == uid)
            .cloned())
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .tables
            .read()
            .await
            .users
            .values()
            .find(|u| u.access_token.as_deref() == Some(token))
            .cloned())
    }

    async fn set_access_token(
        &self,
        id: Uuid,
        token: Option<&str>,
    ) -> Result<Option<User>, StoreError> {
        let mut tables = self.tables.write().await;
        if let Some(token) = token {
            if tables
                .users
                .values()
                .any(|u| u.id != id && u.access_token.as_deref() == Some(token))
            {
                return Err(StoreError::Conflict(USER_TOKEN_CONSTRAINT.to_string()));
            }
        }
        Ok(tables.users.get_mut(&id).map(|user| {
            user.access_token = token.map(str::to_string);
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn set_enabled(&self, id: Uuid, enable: bool) -> Result<Option<User>, StoreError> {
        let mut tables = self.tables.write().await;
        Ok(tables.users.get_mut(&id).map(|user| {
            user.enable = enable;
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn list(&self) -> Result<Vec<User>, StoreError> {
        let tables = self.tables.read().await;
        let mut users: Vec<User> = tables.users.values().cloned().collect();
        users.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::Page;
    use chrono::{DateTime, Duration};

    fn user(name: &str) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            name: name.to_string(),
            provider: "twitter".to_string(),
            uid: Uuid::new_v4().to_string(),
            handle: None,
            access_token: None,
            is_admin: false,
            enable: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn event(owner: Uuid, name: &str, start: DateTime<Utc>) -> Event {
        Event {
            id: Uuid::new_v4(),
            user_id: owner,
            name: name.to_string(),
            address: "Hno. 1234".to_string(),
            city: "Delhi".to_string(),
            country: "India".to_string(),
            contact_number: 131313,
            description: "ddqqdqdqd".to_string(),
            start_date: start,
            end_date: start + Duration::days(2),
            enable: true,
            logo_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn session(event: &Event) -> Session {
        Session {
            id: Uuid::new_v4(),
            event_id: event.id,
            topic: "dilpreet".to_string(),
            start_date: event.start_date,
            end_date: event.start_date + Duration::hours(2),
            location: "Hall A".to_string(),
            speaker: None,
            description: None,
            enable: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_duplicate_rsvp_is_a_conflict() {
        let store = MemoryStore::new();
        let user_id = Uuid::new_v4();
        let session_id = Uuid::new_v4();

        RsvpRepository::create(&store, &Rsvp::new(user_id, session_id, Utc::now()))
            .await
            .unwrap();
        let second =
            RsvpRepository::create(&store, &Rsvp::new(user_id, session_id, Utc::now())).await;

        assert!(matches!(second, Err(StoreError::Conflict(c)) if c == RSVP_UNIQUE_CONSTRAINT));
        assert_eq!(store.rsvp_count().await, 1);
    }

    #[tokio::test]
    async fn test_event_delete_cascades_to_sessions_and_rsvps() {
        let store = MemoryStore::new();
        let owner = user("owner");
        let e = event(owner.id, "RustConf", Utc::now() + Duration::days(5));
        let s = session(&e);
        EventRepository::insert(&store, &e).await.unwrap();
        SessionRepository::insert(&store, &s).await.unwrap();
        RsvpRepository::create(&store, &Rsvp::new(owner.id, s.id, Utc::now()))
            .await
            .unwrap();

        assert!(EventRepository::delete(&store, e.id).await.unwrap());
        assert!(SessionRepository::find(&store, e.id, s.id)
            .await
            .unwrap()
            .is_none());
        assert_eq!(store.rsvp_count().await, 0);
        assert!(!EventRepository::delete(&store, e.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_query_composes_filters_and_pages() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let owner = Uuid::new_v4();
        for day in 1..=7 {
            let mut e = event(owner, &format!("Meetup {day}"), now + Duration::days(day));
            e.enable = day != 3;
            EventRepository::insert(&store, &e).await.unwrap();
        }
        EventRepository::insert(&store, &event(owner, "Old", now - Duration::days(10)))
            .await
            .unwrap();

        let first_page = store
            .query(
                &EventQuery::new()
                    .enabled()
                    .live_and_upcoming(now)
                    .order_by_start_date(SortDirection::Asc)
                    .paginate(Page::new(1, 4)),
            )
            .await
            .unwrap();
        let names: Vec<&str> = first_page.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["Meetup 1", "Meetup 2", "Meetup 4", "Meetup 5"]);

        let second_page = store
            .query(
                &EventQuery::new()
                    .enabled()
                    .live_and_upcoming(now)
                    .order_by_start_date(SortDirection::Asc)
                    .paginate(Page::new(2, 4)),
            )
            .await
            .unwrap();
        assert_eq!(second_page.len(), 2);

        let past = store.query(&EventQuery::new().past(now)).await.unwrap();
        assert_eq!(past.len(), 1);
        assert_eq!(past[0].name, "Old");

        let none = store
            .query(&EventQuery::new().search(""))
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_attended_events_are_distinct() {
        let store = MemoryStore::new();
        let attendee = user("attendee");
        UserRepository::insert(&store, &attendee).await.unwrap();
        let e = event(Uuid::new_v4(), "RustConf", Utc::now() + Duration::days(3));
        EventRepository::insert(&store, &e).await.unwrap();
        for _ in 0..2 {
            let s = session(&e);
            SessionRepository::insert(&store, &s).await.unwrap();
            RsvpRepository::create(&store, &Rsvp::new(attendee.id, s.id, Utc::now()))
                .await
                .unwrap();
        }

        let attending = store
            .query(&EventQuery::new().attended_by(attendee.id))
            .await
            .unwrap();
        assert_eq!(attending.len(), 1);

        let attendees = EventRepository::attendees(&store, e.id).await.unwrap();
        assert_eq!(attendees, vec![attendee]);
    }

    #[tokio::test]
    async fn test_user_identity_is_unique() {
        let store = MemoryStore::new();
        let first = user("a");
        UserRepository::insert(&store, &first).await.unwrap();

        let mut clash = user("b");
        clash.uid = first.uid.clone();
        assert!(matches!(
            UserRepository::insert(&store, &clash).await,
            Err(StoreError::Conflict(_))
        ));

        let updated = store
            .set_access_token(first.id, Some("tok"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.access_token.as_deref(), Some("tok"));
        assert_eq!(store.find_by_token("tok").await.unwrap().map(|u| u.id), Some(first.id));
    }
}
