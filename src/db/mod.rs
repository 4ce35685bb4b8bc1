use std::path::Path;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{Executor, Sqlite};

use crate::error::StoreError;
use crate::models::Player;

mod schema;

pub use schema::{CONFIG_TABLE, PLAYERS_TABLE};

const MAX_CONNECTIONS: u32 = 10;
const MAX_LIFETIME: Duration = Duration::from_secs(3 * 60);
const IDLE_TIMEOUT: Duration = Duration::from_secs(60);

const CONFIG_ROW_ID: i64 = 1;

/// Persistence operations the reconciler and the API need.
///
/// Implementations own all persisted state; callers never reach the
/// underlying storage directly.
#[async_trait]
pub trait PlayerStore: Send + Sync {
    async fn fetch_by_id(&self, player_id: &str) -> Result<Option<Player>, StoreError>;
    /// `page <= 0` returns every row.
    async fn fetch_page(&self, page: i64, page_size: i64) -> Result<Vec<Player>, StoreError>;
    async fn exists(&self, player_id: &str) -> Result<bool, StoreError>;
    async fn insert(&self, player: &Player) -> Result<(), StoreError>;
    /// Writing zero rows is not an error.
    async fn update(&self, player: &Player) -> Result<(), StoreError>;
    async fn delete_by_id(&self, player_id: &str) -> Result<(), StoreError>;
    async fn count(&self) -> Result<i64, StoreError>;
    /// Drop, recreate and refill the players table in one transaction.
    async fn replace_all(&self, players: &[Player]) -> Result<(), StoreError>;
    /// Last applied file digest, or `""` when none was recorded yet.
    async fn config_hash(&self) -> Result<String, StoreError>;
    async fn set_config_hash(&self, hash: &str) -> Result<(), StoreError>;
    fn set_available(&self, available: bool);
    fn is_available(&self) -> bool;
}

/// SQLite-backed store shared by the HTTP handlers and the reconciler.
///
/// Cloning is cheap: the pool and the availability flag are shared.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
    available: Arc<AtomicBool>,
}

impl SqliteStore {
    fn from_pool(pool: SqlitePool) -> Self {
        Self {
            pool,
            available: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Open the database at `url`, creating the file (and its directory) if
    /// missing.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        ensure_parent_dir(options.get_filename())?;

        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .max_lifetime(MAX_LIFETIME)
            .idle_timeout(IDLE_TIMEOUT)
            .connect_with(options)
            .await?;

        Ok(Self::from_pool(pool))
    }

    /// In-memory database for tests. Limited to one connection that is never
    /// recycled, otherwise each connection would see its own empty database.
    pub async fn connect_in_memory() -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .max_lifetime(None)
            .idle_timeout(None)
            .connect_with(options)
            .await?;

        Ok(Self::from_pool(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create both tables if they do not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        let mut conn = self.pool.acquire().await?;
        schema::create_tables(&mut *conn).await
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.is_available() {
            Ok(())
        } else {
            Err(StoreError::Unavailable)
        }
    }
}

#[async_trait]
impl PlayerStore for SqliteStore {
    async fn fetch_by_id(&self, player_id: &str) -> Result<Option<Player>, StoreError> {
        self.check_available()?;
        let player = sqlx::query_as::<_, Player>(r#"SELECT * FROM players WHERE player_id = ?"#)
            .bind(player_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(player)
    }

    async fn fetch_page(&self, page: i64, page_size: i64) -> Result<Vec<Player>, StoreError> {
        self.check_available()?;

        let players = if page > 0 {
            let offset = (page - 1).saturating_mul(page_size);
            tracing::debug!("Fetching players: offset {}, limit {}", offset, page_size);
            sqlx::query_as::<_, Player>(
                r#"SELECT * FROM players ORDER BY player_id LIMIT ? OFFSET ?"#,
            )
            .bind(page_size)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?
        } else {
            sqlx::query_as::<_, Player>(r#"SELECT * FROM players ORDER BY player_id"#)
                .fetch_all(&self.pool)
                .await?
        };

        Ok(players)
    }

    async fn exists(&self, player_id: &str) -> Result<bool, StoreError> {
        let found: Option<i64> =
            sqlx::query_scalar(r#"SELECT 1 FROM players WHERE player_id = ?"#)
                .bind(player_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(found.is_some())
    }

    async fn insert(&self, player: &Player) -> Result<(), StoreError> {
        insert_player(&self.pool, player).await
    }

    async fn update(&self, player: &Player) -> Result<(), StoreError> {
        sqlx::query(
            r#"UPDATE players SET
                   birth_year = ?, birth_month = ?, birth_day = ?,
                   birth_country = ?, birth_state = ?, birth_city = ?,
                   death_year = ?, death_month = ?, death_day = ?,
                   death_country = ?, death_state = ?, death_city = ?,
                   name_first = ?, name_last = ?, name_given = ?,
                   weight = ?, height = ?, bats = ?, throws = ?,
                   debut = ?, final_game = ?, retro_id = ?, bbref_id = ?
               WHERE player_id = ?"#,
        )
        .bind(player.birth_year)
        .bind(player.birth_month)
        .bind(player.birth_day)
        .bind(&player.birth_country)
        .bind(&player.birth_state)
        .bind(&player.birth_city)
        .bind(player.death_year)
        .bind(player.death_month)
        .bind(player.death_day)
        .bind(&player.death_country)
        .bind(&player.death_state)
        .bind(&player.death_city)
        .bind(&player.name_first)
        .bind(&player.name_last)
        .bind(&player.name_given)
        .bind(player.weight)
        .bind(player.height)
        .bind(&player.bats)
        .bind(&player.throws)
        .bind(player.debut)
        .bind(player.final_game)
        .bind(&player.retro_id)
        .bind(&player.bbref_id)
        .bind(&player.player_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_by_id(&self, player_id: &str) -> Result<(), StoreError> {
        sqlx::query(r#"DELETE FROM players WHERE player_id = ?"#)
            .bind(player_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn count(&self) -> Result<i64, StoreError> {
        let count = sqlx::query_scalar(r#"SELECT COUNT(*) FROM players"#)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn replace_all(&self, players: &[Player]) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        schema::drop_table(&mut *tx, PLAYERS_TABLE).await?;
        schema::create_tables(&mut *tx).await?;
        for player in players {
            insert_player(&mut *tx, player).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn config_hash(&self) -> Result<String, StoreError> {
        let hash: Option<Option<String>> =
            sqlx::query_scalar(r#"SELECT file_hash FROM config WHERE id = ?"#)
                .bind(CONFIG_ROW_ID)
                .fetch_optional(&self.pool)
                .await?;
        Ok(hash.flatten().unwrap_or_default())
    }

    async fn set_config_hash(&self, hash: &str) -> Result<(), StoreError> {
        let result = sqlx::query(r#"UPDATE config SET file_hash = ? WHERE id = ?"#)
            .bind(hash)
            .bind(CONFIG_ROW_ID)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            sqlx::query(r#"INSERT INTO config (id, file_hash) VALUES (?, ?)"#)
                .bind(CONFIG_ROW_ID)
                .bind(hash)
                .execute(&self.pool)
                .await?;
        }
        Ok(())
    }

    fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }
}

async fn insert_player<'e, E>(executor: E, player: &Player) -> Result<(), StoreError>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"INSERT INTO players (
               player_id,
               birth_year, birth_month, birth_day,
               birth_country, birth_state, birth_city,
               death_year, death_month, death_day,
               death_country, death_state, death_city,
               name_first, name_last, name_given,
               weight, height, bats, throws,
               debut, final_game, retro_id, bbref_id
           )
           VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
    )
    .bind(&player.player_id)
    .bind(player.birth_year)
    .bind(player.birth_month)
    .bind(player.birth_day)
    .bind(&player.birth_country)
    .bind(&player.birth_state)
    .bind(&player.birth_city)
    .bind(player.death_year)
    .bind(player.death_month)
    .bind(player.death_day)
    .bind(&player.death_country)
    .bind(&player.death_state)
    .bind(&player.death_city)
    .bind(&player.name_first)
    .bind(&player.name_last)
    .bind(&player.name_given)
    .bind(player.weight)
    .bind(player.height)
    .bind(&player.bats)
    .bind(&player.throws)
    .bind(player.debut)
    .bind(player.final_game)
    .bind(&player.retro_id)
    .bind(&player.bbref_id)
    .execute(executor)
    .await?;
    Ok(())
}

fn ensure_parent_dir(db_file: &Path) -> Result<(), StoreError> {
    let in_memory = db_file.as_os_str().is_empty() || db_file == Path::new(":memory:");
    if in_memory {
        return Ok(());
    }
    match db_file.parent() {
        Some(dir) if !dir.as_os_str().is_empty() && !dir.exists() => {
            tracing::info!("Creating database directory {}", dir.display());
            std::fs::create_dir_all(dir).map_err(|e| StoreError::Database(sqlx::Error::Io(e)))
        }
        _ => Ok(()),
    }
}
