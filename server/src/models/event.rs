use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::models::user::User;
use crate::validation::schedule::Schedule;
use crate::validation::{validate_contact_number, validate_not_blank, ContactNumber, FieldErrors};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub address: String,
    pub city: String,
    pub country: String,
    pub contact_number: i64,
    pub description: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub enable: bool,
    pub logo_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    pub fn schedule(&self) -> Schedule {
        Schedule::new(self.start_date, self.end_date)
    }

    /// An event is past once its end date is strictly before `now`.
    pub fn is_past(&self, now: DateTime<Utc>) -> bool {
        self.end_date < now
    }

    pub fn is_live_or_upcoming(&self, now: DateTime<Utc>) -> bool {
        !self.is_past(now)
    }

    pub fn is_owned_by(&self, user: &User) -> bool {
        self.user_id == user.id
    }

    /// Owners and admins may edit, disable and delete an event and its sessions.
    pub fn can_be_managed_by(&self, user: &User) -> bool {
        user.is_admin || self.is_owned_by(user)
    }

    /// Disabled events are only visible to the people who can manage them.
    pub fn is_visible_to(&self, user: &User) -> bool {
        self.enable || self.can_be_managed_by(user)
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateEventRequest {
    #[validate(custom(function = "validate_not_blank"))]
    pub name: String,
    #[validate(custom(function = "validate_not_blank"))]
    pub address: String,
    #[validate(custom(function = "validate_not_blank"))]
    pub city: String,
    #[validate(custom(function = "validate_not_blank"))]
    pub country: String,
    #[validate(custom(function = "validate_contact_number"))]
    pub contact_number: ContactNumber,
    #[validate(
        custom(function = "validate_not_blank"),
        length(max = 500, message = "is too long (maximum is 500 characters)")
    )]
    pub description: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub enable: Option<bool>,
    pub logo_url: Option<String>,
}

impl CreateEventRequest {
    pub fn schedule(&self) -> Schedule {
        Schedule::new(self.start_date, self.end_date)
    }

    pub fn into_event(self, owner_id: Uuid, now: DateTime<Utc>) -> Result<Event, FieldErrors> {
        let contact_number = self.contact_number.value()?;

        Ok(Event {
            id: Uuid::new_v4(),
            user_id: owner_id,
            name: self.name.trim().to_string(),
            address: self.address,
            city: self.city.trim().to_string(),
            country: self.country.trim().to_string(),
            contact_number,
            description: self.description,
            start_date: self.start_date,
            end_date: self.end_date,
            enable: self.enable.unwrap_or(true),
            logo_url: self.logo_url,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Partial update; absent fields keep their current value.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateEventRequest {
    #[validate(custom(function = "validate_not_blank"))]
    pub name: Option<String>,
    #[validate(custom(function = "validate_not_blank"))]
    pub address: Option<String>,
    #[validate(custom(function = "validate_not_blank"))]
    pub city: Option<String>,
    #[validate(custom(function = "validate_not_blank"))]
    pub country: Option<String>,
    #[validate(custom(function = "validate_contact_number"))]
    pub contact_number: Option<ContactNumber>,
    #[validate(
        custom(function = "validate_not_blank"),
        length(max = 500, message = "is too long (maximum is 500 characters)")
    )]
    pub description: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub enable: Option<bool>,
    pub logo_url: Option<String>,
}

impl UpdateEventRequest {
    /// The date range the event would have once this update is applied.
    pub fn schedule_for(&self, event: &Event) -> Schedule {
        Schedule::new(
            self.start_date.unwrap_or(event.start_date),
            self.end_date.unwrap_or(event.end_date),
        )
    }

    pub fn apply_to(self, event: &Event, now: DateTime<Utc>) -> Result<Event, FieldErrors> {
        let schedule = self.schedule_for(event);
        let contact_number = match &self.contact_number {
            Some(raw) => raw.value()?,
            None => event.contact_number,
        };

        Ok(Event {
            id: event.id,
            user_id: event.user_id,
            name: self
                .name
                .map(|name| name.trim().to_string())
                .unwrap_or_else(|| event.name.clone()),
            address: self.address.unwrap_or_else(|| event.address.clone()),
            city: self
                .city
                .map(|city| city.trim().to_string())
                .unwrap_or_else(|| event.city.clone()),
            country: self
                .country
                .map(|country| country.trim().to_string())
                .unwrap_or_else(|| event.country.clone()),
            contact_number,
            description: self.description.unwrap_or_else(|| event.description.clone()),
            start_date: schedule.start,
            end_date: schedule.end,
            enable: self.enable.unwrap_or(event.enable),
            logo_url: self.logo_url.or_else(|| event.logo_url.clone()),
            created_at: event.created_at,
            updated_at: now,
        })
    }
}
