use axum::{extract::State, http::StatusCode, response::Json};

use crate::db::PlayerStore;
use crate::models::HealthResponse;
use crate::routes::AppState;

// GET /health - Liveness plus store availability
pub async fn health_check<S: PlayerStore + Clone>(
    State(state): State<AppState<S>>,
) -> (StatusCode, Json<HealthResponse>) {
    let available = state.store.is_available();
    let players = if available {
        state
            .store
            .count()
            .await
            .inspect_err(|e| tracing::warn!("Health check could not count players: {}", e))
            .ok()
    } else {
        None
    };

    let response = HealthResponse {
        status: "ok".to_string(),
        timestamp: chrono::Utc::now().timestamp(),
        available,
        players,
    };

    (StatusCode::OK, Json(response))
}
