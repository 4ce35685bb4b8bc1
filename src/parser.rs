//! CSV record → [`Player`] conversion.
//!
//! Ingestion is lenient: a field that is present but unparseable is replaced
//! by a per-field fallback and logged, never rejected. Empty fields keep the
//! zero value (`0`, `""`, or `None` for dates).

use chrono::{Duration, Local, NaiveDate};
use csv::StringRecord;

use crate::models::{Player, PLAYER_FIELD_COUNT};

pub const DEFAULT_BIRTH_YEAR: i64 = 1970;
pub const DEFAULT_BIRTH_MONTH: i64 = 7;
pub const DEFAULT_BIRTH_DAY: i64 = 11;
pub const DEFAULT_DEATH_YEAR: i64 = 1998;
pub const DEFAULT_DEATH_MONTH: i64 = 4;
pub const DEFAULT_DEATH_DAY: i64 = 21;
pub const DEFAULT_WEIGHT: i64 = 180;
pub const DEFAULT_HEIGHT: i64 = 75;

const DATE_FORMAT: &str = "%Y-%m-%d";
const DEBUT_DAYS_AGO: i64 = 30 * 365;
const FINAL_GAME_DAYS_AGO: i64 = 5 * 365;

/// Fallback dates for unparseable `debut` / `finalGame` values, relative to
/// a fixed "today".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerDefaults {
    pub debut: NaiveDate,
    pub final_game: NaiveDate,
}

impl PlayerDefaults {
    pub fn at(today: NaiveDate) -> Self {
        Self {
            debut: today - Duration::days(DEBUT_DAYS_AGO),
            final_game: today - Duration::days(FINAL_GAME_DAYS_AGO),
        }
    }

    pub fn current() -> Self {
        Self::at(Local::now().date_naive())
    }
}

/// Parse one data line using today's date for the date fallbacks.
pub fn parse_record(record: &StringRecord) -> Player {
    parse_record_with(record, &PlayerDefaults::current())
}

pub fn parse_record_with(record: &StringRecord, defaults: &PlayerDefaults) -> Player {
    if record.len() != PLAYER_FIELD_COUNT {
        tracing::warn!(
            "Record has {} fields, expected {}: {:?}",
            record.len(),
            PLAYER_FIELD_COUNT,
            record.get(0)
        );
    }

    let field = |i: usize| record.get(i).unwrap_or("");

    Player {
        player_id: field(0).to_string(),
        birth_year: int_field("birthYear", field(1), DEFAULT_BIRTH_YEAR),
        birth_month: int_field("birthMonth", field(2), DEFAULT_BIRTH_MONTH),
        birth_day: int_field("birthDay", field(3), DEFAULT_BIRTH_DAY),
        birth_country: field(4).to_string(),
        birth_state: field(5).to_string(),
        birth_city: field(6).to_string(),
        death_year: int_field("deathYear", field(7), DEFAULT_DEATH_YEAR),
        death_month: int_field("deathMonth", field(8), DEFAULT_DEATH_MONTH),
        death_day: int_field("deathDay", field(9), DEFAULT_DEATH_DAY),
        death_country: field(10).to_string(),
        death_state: field(11).to_string(),
        death_city: field(12).to_string(),
        name_first: field(13).to_string(),
        name_last: field(14).to_string(),
        name_given: field(15).to_string(),
        weight: int_field("weight", field(16), DEFAULT_WEIGHT),
        height: int_field("height", field(17), DEFAULT_HEIGHT),
        bats: field(18).to_string(),
        throws: field(19).to_string(),
        debut: date_field("debut", field(20), defaults.debut),
        final_game: date_field("finalGame", field(21), defaults.final_game),
        retro_id: field(22).to_string(),
        bbref_id: field(23).to_string(),
    }
}

fn int_field(name: &str, raw: &str, fallback: i64) -> i64 {
    if raw.is_empty() {
        tracing::debug!("Empty {} field, storing 0", name);
        return 0;
    }
    raw.parse().unwrap_or_else(|_| {
        tracing::warn!("Using default {} value {} for '{}'", name, fallback, raw);
        fallback
    })
}

fn date_field(name: &str, raw: &str, fallback: NaiveDate) -> Option<NaiveDate> {
    if raw.is_empty() {
        tracing::debug!("Empty {} field, storing null", name);
        return None;
    }
    let date = NaiveDate::parse_from_str(raw, DATE_FORMAT).unwrap_or_else(|_| {
        tracing::warn!("Using default {} value {} for '{}'", name, fallback, raw);
        fallback
    });
    Some(date)
}
