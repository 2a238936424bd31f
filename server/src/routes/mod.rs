use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::config::{create_cors_layer, create_security_headers_layer};
use crate::handlers::{auth, events, health_check, rsvps, sessions, users};
use crate::state::AppState;

pub fn create_routes(state: AppState) -> Router {
    let cors = create_cors_layer(&state.config.cors_allowed_origins);
    let security_headers = create_security_headers_layer(&state.config);

    Router::new()
        .route("/health", get(health_check))
        .route("/auth/failure", get(auth::failure))
        .route("/auth/:provider/callback", get(auth::callback))
        .nest("/api/v1", api_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(security_headers)
        .layer(cors)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/signout", get(auth::signout))
        .route("/me", get(users::me))
        .route("/events", get(events::list_events).post(events::create_event))
        .route("/events/filter", get(events::filter_events))
        .route("/events/search", get(events::search_events))
        .route("/events/mine", get(events::my_events))
        .route("/events/i_am_attending", get(events::attending_events))
        .route(
            "/events/:id",
            get(events::show_event)
                .put(events::update_event)
                .delete(events::delete_event),
        )
        .route("/events/:id/disable", post(events::disable_event))
        .route("/events/:id/attendees", get(events::event_attendees))
        .route(
            "/events/:id/sessions",
            get(sessions::list_sessions).post(sessions::create_session),
        )
        .route(
            "/events/:id/sessions/:session_id",
            get(sessions::show_session)
                .put(sessions::update_session)
                .delete(sessions::delete_session),
        )
        .route(
            "/events/:id/sessions/:session_id/disable",
            post(sessions::disable_session),
        )
        .route(
            "/events/:id/sessions/:session_id/attendees",
            get(sessions::session_attendees),
        )
        .route(
            "/events/:id/sessions/:session_id/rsvp",
            get(rsvps::rsvp_status)
                .post(rsvps::attend)
                .delete(rsvps::cancel),
        )
        .route("/admin/users", get(users::list_users))
        .route("/admin/users/:id/enable", post(users::enable_user))
        .route("/admin/users/:id/disable", post(users::disable_user))
}
