use axum::{routing::get, Router};

use crate::db::{PlayerStore, SqliteStore};

pub mod health;
pub mod players;

/// State shared by every handler.
#[derive(Debug, Clone)]
pub struct AppState<S = SqliteStore> {
    pub store: S,
    pub default_page_size: i64,
    pub max_page_size: i64,
}

impl<S: PlayerStore> AppState<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            default_page_size: 250,
            max_page_size: 1000,
        }
    }

    pub fn with_page_sizes(mut self, default_page_size: i64, max_page_size: i64) -> Self {
        self.default_page_size = default_page_size;
        self.max_page_size = max_page_size;
        self
    }
}

pub fn router<S>(state: AppState<S>) -> Router
where
    S: PlayerStore + Clone + 'static,
{
    Router::new()
        .route("/", get(|| async { "Player API - v1.0" }))
        .route("/health", get(health::health_check::<S>))
        .route("/api/players", get(players::get_players::<S>))
        .route("/api/players/{player_id}", get(players::get_player_by_id::<S>))
        .with_state(state)
}
