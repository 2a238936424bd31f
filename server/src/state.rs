use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::repository::{
    EventRepository, MemoryStore, PgStore, RsvpRepository, SessionRepository, UserRepository,
};

/// Shared by every handler. Each repository is a trait object so the same
/// router runs against Postgres or the in-memory store.
#[derive(Clone)]
pub struct AppState {
    pub events: Arc<dyn EventRepository>,
    pub sessions: Arc<dyn SessionRepository>,
    pub rsvps: Arc<dyn RsvpRepository>,
    pub users: Arc<dyn UserRepository>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn postgres(pool: PgPool, config: Config) -> Self {
        Self::from_store(Arc::new(PgStore::new(pool)), config)
    }

    pub fn in_memory(config: Config) -> Self {
        Self::from_store(Arc::new(MemoryStore::new()), config)
    }

    fn from_store<S>(store: Arc<S>, config: Config) -> Self
    where
        S: EventRepository + SessionRepository + RsvpRepository + UserRepository + 'static,
    {
        Self {
            events: store.clone(),
            sessions: store.clone(),
            rsvps: store.clone(),
            users: store,
            config: Arc::new(config),
        }
    }
}
