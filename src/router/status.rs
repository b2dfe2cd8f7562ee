//! Public instance metadata and metrics exposition.

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::AppState;

/// Structured configuration.
#[derive(Serialize)]
pub struct Status {
    version: String,
    name: String,
}

/// Public server status (configuration).
pub async fn handler(State(state): State<AppState>) -> Json<Status> {
    Json(Status {
        version: state.config.version().to_owned(),
        name: if state.config.name().is_empty() {
            env!("CARGO_CRATE_NAME").to_owned()
        } else {
            state.config.name().to_owned()
        },
    })
}

/// Prometheus exposition, empty until the recorder is installed.
pub async fn metrics(State(state): State<AppState>) -> String {
    state
        .metrics
        .as_ref()
        .map(|handle| handle.render())
        .unwrap_or_default()
}
