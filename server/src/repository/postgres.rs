use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::filters::{EventPredicate, EventQuery};
use crate::models::{Event, Rsvp, Session, User};
use crate::repository::{
    EventRepository, RsvpRepository, SessionRepository, StoreError, UserRepository,
};

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Unique violations become [`StoreError::Conflict`] carrying the constraint name.
fn map_write_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            let constraint = db.constraint().unwrap_or("unique").to_string();
            return StoreError::Conflict(constraint);
        }
    }
    StoreError::Database(err)
}

/// `%text%` with LIKE wildcards in `text` matched literally.
fn like_pattern(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn push_event_query(builder: &mut QueryBuilder<'_, Postgres>, query: &EventQuery) {
    for predicate in query.predicates() {
        match predicate {
            EventPredicate::Enabled => {
                builder.push(" AND events.enable = TRUE");
            }
            EventPredicate::Past(now) => {
                builder.push(" AND events.end_date < ").push_bind(*now);
            }
            EventPredicate::LiveAndUpcoming(now) => {
                builder.push(" AND events.end_date >= ").push_bind(*now);
            }
            EventPredicate::Search(text) if text.is_empty() => {
                builder.push(" AND FALSE");
            }
            EventPredicate::Search(text) => {
                let pattern = like_pattern(text);
                builder
                    .push(" AND (events.name ILIKE ")
                    .push_bind(pattern.clone())
                    .push(" OR events.city ILIKE ")
                    .push_bind(pattern.clone())
                    .push(" OR events.country ILIKE ")
                    .push_bind(pattern)
                    .push(")");
            }
            EventPredicate::OwnedBy(user_id) => {
                builder.push(" AND events.user_id = ").push_bind(*user_id);
            }
            EventPredicate::AttendedBy(user_id) => {
                builder
                    .push(
                        " AND EXISTS (SELECT 1 FROM sessions \
                         JOIN rsvps ON rsvps.session_id = sessions.id \
                         WHERE sessions.event_id = events.id AND rsvps.user_id = ",
                    )
                    .push_bind(*user_id)
                    .push(")");
            }
        }
    }

    match query.order() {
        Some(direction) => {
            builder.push(format!(
                " ORDER BY events.start_date {}, events.id",
                direction.as_sql()
            ));
        }
        None => {
            builder.push(" ORDER BY events.created_at, events.id");
        }
    }

    if let Some(page) = query.page() {
        let offset = i64::try_from(page.offset()).unwrap_or(i64::MAX);
        builder
            .push(" LIMIT ")
            .push_bind(i64::from(page.per_page))
            .push(" OFFSET ")
            .push_bind(offset);
    }
}

#[async_trait]
impl EventRepository for PgStore {
    async fn insert(&self, event: &Event) -> Result<Event, StoreError> {
        sqlx::query_as::<_, Event>(
            "INSERT INTO events (id, user_id, name, address, city, country, contact_number, \
             description, start_date, end_date, enable, logo_url, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
             RETURNING *",
        )
        .bind(event.id)
        .bind(event.user_id)
        .bind(&event.name)
        .bind(&event.address)
        .bind(&event.city)
        .bind(&event.country)
        .bind(event.contact_number)
        .bind(&event.description)
        .bind(event.start_date)
        .bind(event.end_date)
        .bind(event.enable)
        .bind(&event.logo_url)
        .bind(event.created_at)
        .bind(event.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)
    }

    async fn find(&self, id: Uuid) -> Result<Option<Event>, StoreError> {
        let event = sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(event)
    }

    async fn update(&self, event: &Event) -> Result<Option<Event>, StoreError> {
        sqlx::query_as::<_, Event>(
            "UPDATE events SET name = $2, address = $3, city = $4, country = $5, \
             contact_number = $6, description = $7, start_date = $8, end_date = $9, \
             enable = $10, logo_url = $11, updated_at = $12 \
             WHERE id = $1 RETURNING *",
        )
        .bind(event.id)
        .bind(&event.name)
        .bind(&event.address)
        .bind(&event.city)
        .bind(&event.country)
        .bind(event.contact_number)
        .bind(&event.description)
        .bind(event.start_date)
        .bind(event.end_date)
        .bind(event.enable)
        .bind(&event.logo_url)
        .bind(event.updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_write_error)
    }

    async fn set_enabled(&self, id: Uuid, enable: bool) -> Result<Option<Event>, StoreError> {
        let event = sqlx::query_as::<_, Event>(
            "UPDATE events SET enable = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(enable)
        .fetch_optional(&self.pool)
        .await?;
        Ok(event)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn query(&self, query: &EventQuery) -> Result<Vec<Event>, StoreError> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT events.* FROM events WHERE TRUE");
        push_event_query(&mut builder, query);

        let events = builder
            .build_query_as::<Event>()
            .fetch_all(&self.pool)
            .await?;
        Ok(events)
    }

    async fn attendees(&self, event_id: Uuid) -> Result<Vec<User>, StoreError> {
        let users = sqlx::query_as::<_, User>(
            "SELECT users.* FROM users WHERE EXISTS (\
                SELECT 1 FROM rsvps JOIN sessions ON sessions.id = rsvps.session_id \
                WHERE rsvps.user_id = users.id AND sessions.event_id = $1) \
             ORDER BY users.name, users.id",
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }
}

#[async_trait]
impl SessionRepository for PgStore {
    async fn insert(&self, session: &Session) -> Result<Session, StoreError> {
        sqlx::query_as::<_, Session>(
            "INSERT INTO sessions (id, event_id, topic, start_date, end_date, location, \
             speaker, description, enable, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) RETURNING *",
        )
        .bind(session.id)
        .bind(session.event_id)
        .bind(&session.topic)
        .bind(session.start_date)
        .bind(session.end_date)
        .bind(&session.location)
        .bind(&session.speaker)
        .bind(&session.description)
        .bind(session.enable)
        .bind(session.created_at)
        .bind(session.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)
    }

    async fn find(&self, event_id: Uuid, id: Uuid) -> Result<Option<Session>, StoreError> {
        let session =
            sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE id = $1 AND event_id = $2")
                .bind(id)
                .bind(event_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(session)
    }

    async fn list_for_event(
        &self,
        event_id: Uuid,
        enabled_only: bool,
    ) -> Result<Vec<Session>, StoreError> {
        let sessions = sqlx::query_as::<_, Session>(
            "SELECT * FROM sessions WHERE event_id = $1 AND (enable OR NOT $2) \
             ORDER BY start_date, id",
        )
        .bind(event_id)
        .bind(enabled_only)
        .fetch_all(&self.pool)
        .await?;
        Ok(sessions)
    }

    async fn update(&self, session: &Session) -> Result<Option<Session>, StoreError> {
        sqlx::query_as::<_, Session>(
            "UPDATE sessions SET topic = $2, start_date = $3, end_date = $4, location = $5, \
             speaker = $6, description = $7, enable = $8, updated_at = $9 \
             WHERE id = $1 RETURNING *",
        )
        .bind(session.id)
        .bind(&session.topic)
        .bind(session.start_date)
        .bind(session.end_date)
        .bind(&session.location)
        .bind(&session.speaker)
        .bind(&session.description)
        .bind(session.enable)
        .bind(session.updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_write_error)
    }

    async fn set_enabled(&self, id: Uuid, enable: bool) -> Result<Option<Session>, StoreError> {
        let session = sqlx::query_as::<_, Session>(
            "UPDATE sessions SET enable = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(enable)
        .fetch_optional(&self.pool)
        .await?;
        Ok(session)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn attendees(&self, session_id: Uuid) -> Result<Vec<User>, StoreError> {
        let users = sqlx::query_as::<_, User>(
            "SELECT users.* FROM users JOIN rsvps ON rsvps.user_id = users.id \
             WHERE rsvps.session_id = $1 ORDER BY users.name, users.id",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }
}

#[async_trait]
impl RsvpRepository for PgStore {
    async fn create(&self, rsvp: &Rsvp) -> Result<Rsvp, StoreError> {
        sqlx::query_as::<_, Rsvp>(
            "INSERT INTO rsvps (id, user_id, session_id, created_at) \
             VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(rsvp.id)
        .bind(rsvp.user_id)
        .bind(rsvp.session_id)
        .bind(rsvp.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)
    }

    async fn find(&self, user_id: Uuid, session_id: Uuid) -> Result<Option<Rsvp>, StoreError> {
        let rsvp = sqlx::query_as::<_, Rsvp>(
            "SELECT * FROM rsvps WHERE user_id = $1 AND session_id = $2",
        )
        .bind(user_id)
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(rsvp)
    }

    async fn delete(&self, user_id: Uuid, session_id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM rsvps WHERE user_id = $1 AND session_id = $2")
            .bind(user_id)
            .bind(session_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl UserRepository for PgStore {
    async fn insert(&self, user: &User) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (id, name, provider, uid, handle, access_token, is_admin, \
             enable, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING *",
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.provider)
        .bind(&user.uid)
        .bind(&user.handle)
        .bind(&user.access_token)
        .bind(user.is_admin)
        .bind(user.enable)
        .bind(user.created_at)
        .bind(user.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)
    }

    async fn find(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_by_identity(
        &self,
        provider: &str,
        uid: &str,
    ) -> Result<Option<User>, StoreError> {
        let user =
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE provider = $1 AND uid = $2")
                .bind(provider)
                .bind(uid)
                .fetch_optional(&self.pool)
                .await?;
        Ok(user)
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE access_token = $1")
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn set_access_token(
        &self,
        id: Uuid,
        token: Option<&str>,
    ) -> Result<Option<User>, StoreError> {
        sqlx::query_as::<_, User>(
            "UPDATE users SET access_token = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_write_error)
    }

    async fn set_enabled(&self, id: Uuid, enable: bool) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            "UPDATE users SET enable = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(enable)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn list(&self) -> Result<Vec<User>, StoreError> {
        let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY name, id")
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }
}
