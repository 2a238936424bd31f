//! Composable event queries.
//!
//! An [`EventQuery`] is a list of predicates plus ordering and paging. It is
//! never evaluated on its own: each repository turns it into a single
//! statement (or a single pass over its tables), so chaining filters before
//! paginating never materializes intermediate results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::Config;
use crate::models::event::Event;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventPredicate {
    Enabled,
    Past(DateTime<Utc>),
    LiveAndUpcoming(DateTime<Utc>),
    /// Trimmed search text. Empty text matches nothing.
    Search(String),
    OwnedBy(Uuid),
    /// The user holds an RSVP for at least one session of the event.
    AttendedBy(Uuid),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Page {
    pub page: u32,
    pub per_page: u32,
}

impl Page {
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.max(1),
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.per_page)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventQuery {
    predicates: Vec<EventPredicate>,
    order: Option<SortDirection>,
    page: Option<Page>,
}

impl EventQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enabled(mut self) -> Self {
        self.predicates.push(EventPredicate::Enabled);
        self
    }

    pub fn past(mut self, now: DateTime<Utc>) -> Self {
        self.predicates.push(EventPredicate::Past(now));
        self
    }

    pub fn live_and_upcoming(mut self, now: DateTime<Utc>) -> Self {
        self.predicates.push(EventPredicate::LiveAndUpcoming(now));
        self
    }

    pub fn search(mut self, text: &str) -> Self {
        self.predicates
            .push(EventPredicate::Search(text.trim().to_string()));
        self
    }

    pub fn owned_by(mut self, user_id: Uuid) -> Self {
        self.predicates.push(EventPredicate::OwnedBy(user_id));
        self
    }

    pub fn attended_by(mut self, user_id: Uuid) -> Self {
        self.predicates.push(EventPredicate::AttendedBy(user_id));
        self
    }

    pub fn order_by_start_date(mut self, direction: SortDirection) -> Self {
        self.order = Some(direction);
        self
    }

    pub fn paginate(mut self, page: Page) -> Self {
        self.page = Some(page);
        self
    }

    pub fn predicates(&self) -> &[EventPredicate] {
        &self.predicates
    }

    pub fn order(&self) -> Option<SortDirection> {
        self.order
    }

    pub fn page(&self) -> Option<Page> {
        self.page
    }
}

/// Case-insensitive substring match on name, city or country.
pub fn matches_search(event: &Event, text: &str) -> bool {
    let needle = text.trim().to_lowercase();
    if needle.is_empty() {
        return false;
    }
    [&event.name, &event.city, &event.country]
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
}

/// `?filter=past|upcoming` on the listing endpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeFilter {
    Past,
    #[default]
    Upcoming,
}

impl TimeFilter {
    /// Past events newest first, upcoming ones soonest first.
    pub fn apply(self, query: EventQuery, now: DateTime<Utc>) -> EventQuery {
        match self {
            TimeFilter::Past => query.past(now).order_by_start_date(SortDirection::Desc),
            TimeFilter::Upcoming => query
                .live_and_upcoming(now)
                .order_by_start_date(SortDirection::Asc),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterParams {
    #[serde(default)]
    pub filter: TimeFilter,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl PageParams {
    pub fn resolve(&self, config: &Config) -> Page {
        let per_page = self
            .per_page
            .unwrap_or(config.default_per_page)
            .clamp(1, config.max_per_page.max(1));
        Page::new(self.page.unwrap_or(1), per_page)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub per_page: u32,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, page: Page) -> Self {
        Self {
            items,
            page: page.page,
            per_page: page.per_page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn event(name: &str, city: &str, country: &str, end: DateTime<Utc>) -> Event {
        Event {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: name.to_string(),
            address: "Hno. 1234".to_string(),
            city: city.to_string(),
            country: country.to_string(),
            contact_number: 131313,
            description: "ddqqdqdqd".to_string(),
            start_date: end - Duration::days(1),
            end_date: end,
            enable: true,
            logo_url: None,
            created_at: end,
            updated_at: end,
        }
    }

    #[test]
    fn test_search_matches_any_field_ignoring_case() {
        let e = event("Rails Meetup", "Delhi", "India", Utc::now());
        assert!(matches_search(&e, "meetup"));
        assert!(matches_search(&e, "DEL"));
        assert!(matches_search(&e, "ndi"));
        assert!(!matches_search(&e, "berlin"));
    }

    #[test]
    fn test_empty_search_matches_nothing() {
        let e = event("Rails Meetup", "Delhi", "India", Utc::now());
        assert!(!matches_search(&e, ""));
        assert!(!matches_search(&e, "   "));
    }

    #[test]
    fn test_past_and_upcoming_partition_events() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let ends = [
            now - Duration::days(3),
            now - Duration::seconds(1),
            now,
            now + Duration::seconds(1),
            now + Duration::days(30),
        ];
        for end in ends {
            let e = event("x", "y", "z", end);
            assert!(e.is_past(now) != e.is_live_or_upcoming(now));
        }
        assert!(event("x", "y", "z", now).is_live_or_upcoming(now));
    }

    #[test]
    fn test_filters_chain_in_order() {
        let now = Utc::now();
        let user = Uuid::new_v4();
        let query = EventQuery::new()
            .enabled()
            .owned_by(user)
            .search("  dp ")
            .paginate(Page::new(2, 5));

        assert_eq!(
            query.predicates(),
            &[
                EventPredicate::Enabled,
                EventPredicate::OwnedBy(user),
                EventPredicate::Search("dp".to_string()),
            ]
        );
        assert_eq!(query.page().map(|p| p.offset()), Some(5));

        let past = TimeFilter::Past.apply(EventQuery::new(), now);
        assert_eq!(past.order(), Some(SortDirection::Desc));
        assert_eq!(past.predicates(), &[EventPredicate::Past(now)]);
    }

    #[test]
    fn test_page_params_are_clamped() {
        let config = Config::default();
        let page = PageParams {
            page: Some(0),
            per_page: Some(10_000),
        }
        .resolve(&config);
        assert_eq!(page.page, 1);
        assert_eq!(page.per_page, config.max_per_page);

        let defaults = PageParams::default().resolve(&config);
        assert_eq!(defaults.per_page, config.default_per_page);
    }
}
