use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use serde::Deserialize;

use crate::db::PlayerStore;
use crate::error::ApiError;
use crate::models::Player;
use crate::routes::AppState;

/// Sentinel page meaning "no pagination".
const ALL_PAGES: i64 = -1;

// Query parameters for listing players. Kept as raw strings so bad input
// gets a descriptive 417 instead of the extractor's generic 400.
#[derive(Debug, Default, Deserialize)]
pub struct ListPlayersQuery {
    #[serde(default)]
    page: Option<String>,
    #[serde(default)]
    page_size: Option<String>,
}

/// Validated paging parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paging {
    pub page: i64,
    pub page_size: i64,
}

impl ListPlayersQuery {
    pub fn new(page: Option<&str>, page_size: Option<&str>) -> Self {
        Self {
            page: page.map(str::to_string),
            page_size: page_size.map(str::to_string),
        }
    }

    /// Fails on the first bad parameter.
    pub fn validate(&self, default_page_size: i64, max_page_size: i64) -> Result<Paging, ApiError> {
        let page = match non_empty(&self.page) {
            Some(raw) => {
                let page: i64 = raw.parse().map_err(|_| {
                    ApiError::InvalidParameter(format!("page must be an integer: '{raw}'"))
                })?;
                if page < 0 {
                    return Err(ApiError::InvalidParameter(format!(
                        "invalid value for page: {page}"
                    )));
                }
                page
            }
            None => ALL_PAGES,
        };

        let page_size = match non_empty(&self.page_size) {
            Some(raw) => {
                let page_size: i64 = raw.parse().map_err(|_| {
                    ApiError::InvalidParameter(format!("page_size must be an integer: '{raw}'"))
                })?;
                if page_size < 0 || page_size > max_page_size {
                    return Err(ApiError::InvalidParameter(format!(
                        "invalid value for page_size: {page_size}"
                    )));
                }
                page_size
            }
            None => default_page_size,
        };

        Ok(Paging { page, page_size })
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

// GET /api/players?page=2&page_size=10 - List players, optionally paged
pub async fn get_players<S: PlayerStore + Clone>(
    State(state): State<AppState<S>>,
    Query(params): Query<ListPlayersQuery>,
) -> Result<Json<Vec<Player>>, ApiError> {
    let paging = params.validate(state.default_page_size, state.max_page_size)?;
    tracing::info!("Listing players: page {}, page_size {}", paging.page, paging.page_size);

    let players = state.store.fetch_page(paging.page, paging.page_size).await?;

    Ok(Json(players))
}

// GET /api/players/:player_id - Get player by ID
pub async fn get_player_by_id<S: PlayerStore + Clone>(
    State(state): State<AppState<S>>,
    Path(player_id): Path<String>,
) -> Result<Json<Player>, ApiError> {
    tracing::info!("Handling request for player ID {}", player_id);

    let player = state
        .store
        .fetch_by_id(&player_id)
        .await?
        .ok_or(ApiError::NotFound)?;

    Ok(Json(player))
}
