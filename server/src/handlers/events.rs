use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use crate::context::CurrentUser;
use crate::filters::{EventQuery, FilterParams, PageParams, Paginated, SortDirection};
use crate::handlers::{managed_event, visible_event};
use crate::models::{CreateEventRequest, UpdateEventRequest};
use crate::services::events;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::{created, empty_success, success};

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub search: String,
}

async fn run_query(
    state: &AppState,
    query: EventQuery,
    page: &PageParams,
    message: &str,
) -> Result<Response, AppError> {
    let page = page.resolve(&state.config);
    let items = state.events.query(&query.paginate(page)).await?;
    Ok(success(Paginated::new(items, page), message))
}

pub async fn list_events(
    State(state): State<AppState>,
    CurrentUser(_): CurrentUser,
    Query(page): Query<PageParams>,
) -> Result<Response, AppError> {
    let query = EventQuery::new()
        .enabled()
        .live_and_upcoming(Utc::now())
        .order_by_start_date(SortDirection::Asc);
    run_query(&state, query, &page, "Events retrieved").await
}

pub async fn filter_events(
    State(state): State<AppState>,
    CurrentUser(_): CurrentUser,
    Query(filter): Query<FilterParams>,
    Query(page): Query<PageParams>,
) -> Result<Response, AppError> {
    let query = filter.filter.apply(EventQuery::new().enabled(), Utc::now());
    run_query(&state, query, &page, "Events retrieved").await
}

pub async fn search_events(
    State(state): State<AppState>,
    CurrentUser(_): CurrentUser,
    Query(params): Query<SearchParams>,
    Query(page): Query<PageParams>,
) -> Result<Response, AppError> {
    let query = EventQuery::new()
        .enabled()
        .live_and_upcoming(Utc::now())
        .search(&params.search)
        .order_by_start_date(SortDirection::Asc);
    run_query(&state, query, &page, "Search results").await
}

/// The caller's own events, disabled ones included.
pub async fn my_events(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(filter): Query<FilterParams>,
    Query(page): Query<PageParams>,
) -> Result<Response, AppError> {
    let query = filter
        .filter
        .apply(EventQuery::new().owned_by(user.id), Utc::now());
    run_query(&state, query, &page, "Your events").await
}

pub async fn attending_events(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(filter): Query<FilterParams>,
    Query(page): Query<PageParams>,
) -> Result<Response, AppError> {
    let query = filter
        .filter
        .apply(EventQuery::new().enabled().attended_by(user.id), Utc::now());
    run_query(&state, query, &page, "Events you are attending").await
}

pub async fn create_event(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<CreateEventRequest>,
) -> Result<Response, AppError> {
    let event = events::create_event(state.events.as_ref(), &user, request, Utc::now()).await?;
    Ok(created(event, "Event created successfully"))
}

pub async fn show_event(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let event = visible_event(&state, &user, &id).await?;
    Ok(success(event, "Event retrieved"))
}

pub async fn update_event(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Json(request): Json<UpdateEventRequest>,
) -> Result<Response, AppError> {
    let event = managed_event(&state, &user, &id).await?;
    let updated = events::update_event(
        state.events.as_ref(),
        state.sessions.as_ref(),
        &event,
        request,
        Utc::now(),
    )
    .await?;
    Ok(success(updated, "Event updated successfully"))
}

pub async fn delete_event(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let event = managed_event(&state, &user, &id).await?;
    if !state.events.delete(event.id).await? {
        return Err(AppError::event_not_found());
    }
    info!(event_id = %event.id, user_id = %user.id, "Event deleted");
    Ok(empty_success("Event deleted successfully"))
}

pub async fn disable_event(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let event = managed_event(&state, &user, &id).await?;
    let event = state
        .events
        .set_enabled(event.id, false)
        .await?
        .ok_or_else(AppError::event_not_found)?;
    info!(event_id = %event.id, user_id = %user.id, "Event disabled");
    Ok(success(event, "Event disabled"))
}

pub async fn event_attendees(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let event = visible_event(&state, &user, &id).await?;
    let attendees = state.events.attendees(event.id).await?;
    Ok(success(attendees, "Attendees retrieved"))
}
