use crate::handlers;
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/history", get(handlers::history))
        .route(
            "/api/report",
            get(handlers::get_report).post(handlers::post_report),
        )
        .route("/api/dates", get(handlers::get_dates))
        .with_state(state)
}
