use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use detailbook_core::stores::StoreSet;
use serde::Serialize;

#[derive(Clone)]
pub struct HealthState {
    stores: StoreSet,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub active_sessions: usize,
    pub bookings: usize,
    pub checked_at: String,
}

pub fn router(stores: StoreSet) -> Router {
    Router::new().route("/health", get(health)).with_state(HealthState { stores })
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let payload = HealthResponse {
        status: "ready",
        service: HealthCheck {
            status: "ready",
            detail: "detailbook-server runtime initialized".to_string(),
        },
        active_sessions: state.stores.sessions.active_count(),
        bookings: state.stores.bookings.count(),
        checked_at: Utc::now().to_rfc3339(),
    };

    (StatusCode::OK, Json(payload))
}
