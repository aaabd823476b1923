use std::sync::Arc;

use axum::{Json, Router, extract::State, response::IntoResponse, routing::get};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::domain::models::event::{Countdown, EventDetails};

/// json for the countdown section
#[derive(Debug, Serialize, Deserialize)]
pub struct EventResponse {
    pub event: EventDetails,
    pub countdown: Countdown,
    pub started: bool,
}

pub fn create_event_router(event: EventDetails) -> Router {
    Router::new()
        .route("/event", get(show_event))
        .with_state(Arc::new(event))
}

async fn show_event(State(event): State<Arc<EventDetails>>) -> impl IntoResponse {
    let countdown = Countdown::until(event.starts_at, Utc::now());
    Json(EventResponse {
        event: event.as_ref().clone(),
        countdown,
        started: countdown.is_over(),
    })
}
