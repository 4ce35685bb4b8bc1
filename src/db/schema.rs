use sqlx::SqliteConnection;

use crate::error::StoreError;

pub const PLAYERS_TABLE: &str = "players";
pub const CONFIG_TABLE: &str = "config";

const CREATE_STATEMENTS: [&str; 2] = [
    r#"CREATE TABLE IF NOT EXISTS players (
           player_id     TEXT PRIMARY KEY NOT NULL,
           birth_year    INTEGER,
           birth_month   INTEGER,
           birth_day     INTEGER,
           birth_country TEXT,
           birth_state   TEXT,
           birth_city    TEXT,
           death_year    INTEGER,
           death_month   INTEGER,
           death_day     INTEGER,
           death_country TEXT,
           death_state   TEXT,
           death_city    TEXT,
           name_first    TEXT,
           name_last     TEXT,
           name_given    TEXT,
           weight        INTEGER,
           height        INTEGER,
           bats          TEXT,
           throws        TEXT,
           debut         DATE,
           final_game    DATE,
           retro_id      TEXT,
           bbref_id      TEXT
       )"#,
    r#"CREATE TABLE IF NOT EXISTS config (
           id        INTEGER PRIMARY KEY NOT NULL,
           file_hash TEXT
       )"#,
];

pub(super) async fn create_tables(conn: &mut SqliteConnection) -> Result<(), StoreError> {
    for stmt in CREATE_STATEMENTS {
        sqlx::query(stmt).execute(&mut *conn).await?;
    }
    Ok(())
}

/// Only ever called with one of the table constants above: the name is
/// interpolated, not bound.
pub(super) async fn drop_table(conn: &mut SqliteConnection, table: &'static str) -> Result<(), StoreError> {
    if table != PLAYERS_TABLE && table != CONFIG_TABLE {
        return Err(StoreError::Database(sqlx::Error::Protocol(format!(
            "refusing to drop unknown table '{table}'"
        ))));
    }
    sqlx::query(&format!(r#"DROP TABLE IF EXISTS "{table}""#))
        .execute(&mut *conn)
        .await?;
    Ok(())
}
