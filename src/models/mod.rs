use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Number of columns in a player record, both in the CSV snapshot and in
/// the `players` table.
pub const PLAYER_FIELD_COUNT: usize = 24;

/// Biographical record for one player, keyed by `player_id`.
///
/// Integer fields use `0` for "not provided" and dates use `None`. The
/// birth/death sub-fields are independent: nothing ties a death year to a
/// death month.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    #[serde(rename = "playerID")]
    pub player_id: String,
    pub birth_year: i64,
    pub birth_month: i64,
    pub birth_day: i64,
    pub birth_country: String,
    pub birth_state: String,
    pub birth_city: String,
    pub death_year: i64,
    pub death_month: i64,
    pub death_day: i64,
    pub death_country: String,
    pub death_state: String,
    pub death_city: String,
    pub name_first: String,
    pub name_last: String,
    pub name_given: String,
    pub weight: i64,
    pub height: i64,
    pub bats: String,
    pub throws: String,
    pub debut: Option<NaiveDate>,
    pub final_game: Option<NaiveDate>,
    #[serde(rename = "retroID")]
    pub retro_id: String,
    #[serde(rename = "bbrefID")]
    pub bbref_id: String,
}

impl Player {
    pub fn new(player_id: impl Into<String>) -> Self {
        Self {
            player_id: player_id.into(),
            ..Self::default()
        }
    }
}

/// Response body for `GET /health`
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: i64,
    pub available: bool,
    pub players: Option<i64>,
}
