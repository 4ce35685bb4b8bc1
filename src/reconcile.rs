//! Keeps the `players` table in step with the CSV snapshot.
//!
//! A cycle hashes the file, compares the digest with the one stored in the
//! `config` row and only reloads when they differ. Two reload strategies are
//! available:
//!
//! - [`SyncStrategy::Incremental`]: upsert row by row while reads continue.
//!   Rows missing from the new snapshot are left in place.
//! - [`SyncStrategy::Bulk`]: mark the store unavailable, rebuild the table in
//!   one transaction, then mark it available again.
//!
//! The digest is written only after a successful reload. If that write fails
//! the data stays as loaded and the next cycle processes the same file again,
//! which is harmless because every write is keyed by player ID. An
//! incremental reload that loses the store connection, or writes no row at
//! all, fails the cycle and leaves the digest alone.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::db::PlayerStore;
use crate::error::{StoreError, SyncError};
use crate::hasher;
use crate::models::Player;
use crate::parser::{self, PlayerDefaults};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStrategy {
    Incremental,
    Bulk,
}

impl FromStr for SyncStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "incremental" => Ok(SyncStrategy::Incremental),
            "bulk" => Ok(SyncStrategy::Bulk),
            other => Err(format!("unknown sync strategy '{other}'")),
        }
    }
}

impl fmt::Display for SyncStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncStrategy::Incremental => f.write_str("incremental"),
            SyncStrategy::Bulk => f.write_str("bulk"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncPhase {
    Idle,
    Hashing,
    Unchanged,
    Reloading,
}

/// What a reload did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub strategy: SyncStrategy,
    pub rows_read: usize,
    pub inserted: usize,
    pub updated: usize,
    /// Rows that could not be parsed, keyed or written.
    pub skipped: usize,
    pub elapsed: Duration,
}

impl SyncReport {
    fn new(strategy: SyncStrategy) -> Self {
        Self {
            strategy,
            rows_read: 0,
            inserted: 0,
            updated: 0,
            skipped: 0,
            elapsed: Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Unchanged,
    Reloaded(SyncReport),
}

pub struct Reconciler<S> {
    store: S,
    csv_path: PathBuf,
    strategy: SyncStrategy,
    phase: Mutex<SyncPhase>,
}

impl<S: PlayerStore> Reconciler<S> {
    pub fn new(store: S, csv_path: impl Into<PathBuf>, strategy: SyncStrategy) -> Self {
        Self {
            store,
            csv_path: csv_path.into(),
            strategy,
            phase: Mutex::new(SyncPhase::Idle),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }

    pub fn strategy(&self) -> SyncStrategy {
        self.strategy
    }

    pub fn phase(&self) -> SyncPhase {
        self.phase.lock().map(|p| *p).unwrap_or(SyncPhase::Idle)
    }

    fn set_phase(&self, phase: SyncPhase) {
        if let Ok(mut current) = self.phase.lock() {
            tracing::debug!("Sync phase {:?} -> {:?}", *current, phase);
            *current = phase;
        }
    }

    /// Run one reconciliation cycle. Always ends in [`SyncPhase::Idle`].
    pub async fn run_once(&self) -> Result<SyncOutcome, SyncError> {
        self.set_phase(SyncPhase::Hashing);
        let result = self.cycle().await;
        self.set_phase(SyncPhase::Idle);
        result
    }

    async fn cycle(&self) -> Result<SyncOutcome, SyncError> {
        let hash = hasher::file_digest(&self.csv_path).await?;

        let previous = self.store.config_hash().await.unwrap_or_else(|e| {
            tracing::debug!("No previous file hash ({}), treating as empty", e);
            String::new()
        });

        if !hash.is_empty() && hash == previous {
            self.set_phase(SyncPhase::Unchanged);
            tracing::info!("File hash has not changed. Not updating.");
            return Ok(SyncOutcome::Unchanged);
        }

        self.set_phase(SyncPhase::Reloading);
        tracing::info!(
            "Populating player database from {} ({} strategy)",
            self.csv_path.display(),
            self.strategy
        );
        let started = Instant::now();

        let mut report = match self.strategy {
            SyncStrategy::Incremental => self.reload_incremental().await?,
            SyncStrategy::Bulk => self.reload_bulk().await?,
        };
        report.elapsed = started.elapsed();

        if let Err(e) = self.store.set_config_hash(&hash).await {
            tracing::error!("Could not update file hash: {}", e);
            return Err(e.into());
        }

        tracing::info!(
            "Player database populated in {} ms: {} read, {} inserted, {} updated, {} skipped",
            report.elapsed.as_millis(),
            report.rows_read,
            report.inserted,
            report.updated,
            report.skipped
        );

        Ok(SyncOutcome::Reloaded(report))
    }

    async fn reload_incremental(&self) -> Result<SyncReport, SyncError> {
        let mut report = SyncReport::new(SyncStrategy::Incremental);
        let players = read_players(&self.csv_path, &mut report).await?;

        let mut last_error = None;
        for player in &players {
            match self.upsert(player).await {
                Ok(true) => report.inserted += 1,
                Ok(false) => report.updated += 1,
                Err(e) if e.is_connection() => {
                    tracing::error!("Store unreachable while loading {}: {}", player.player_id, e);
                    return Err(e.into());
                }
                Err(e) => {
                    tracing::error!("Could not write {}: {}", player.player_id, e);
                    report.skipped += 1;
                    last_error = Some(e);
                }
            }
        }

        // Nothing landed: keep the old digest so the next cycle tries again.
        if report.inserted + report.updated == 0 {
            if let Some(e) = last_error {
                tracing::error!("No rows could be written, file hash left unchanged");
                return Err(e.into());
            }
        }

        Ok(report)
    }

    /// Insert or update one row. `Ok(true)` means a new row was inserted.
    async fn upsert(&self, player: &Player) -> Result<bool, StoreError> {
        if self.store.exists(&player.player_id).await? {
            self.store.update(player).await?;
            Ok(false)
        } else {
            self.store.insert(player).await?;
            Ok(true)
        }
    }

    async fn reload_bulk(&self) -> Result<SyncReport, SyncError> {
        let mut report = SyncReport::new(SyncStrategy::Bulk);
        let players = read_players(&self.csv_path, &mut report).await?;

        // First occurrence of a player ID wins; the primary key would reject
        // the whole import otherwise.
        let mut seen = HashSet::with_capacity(players.len());
        let players: Vec<Player> = players
            .into_iter()
            .filter(|p| {
                let first = seen.insert(p.player_id.clone());
                if !first {
                    tracing::warn!("Duplicate player ID {} ignored", p.player_id);
                    report.skipped += 1;
                }
                first
            })
            .collect();

        self.store.set_available(false);
        let result = self.store.replace_all(&players).await;
        self.store.set_available(true);

        if let Err(e) = result {
            tracing::error!("Bulk load failed: {}", e);
            return Err(e.into());
        }

        report.inserted = players.len();
        Ok(report)
    }
}

/// Read and parse every data line. The header line is skipped.
async fn read_players(path: &Path, report: &mut SyncReport) -> Result<Vec<Player>, SyncError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| SyncError::File {
        path: path.to_path_buf(),
        source,
    })?;

    let defaults = PlayerDefaults::current();
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes.as_slice());

    let mut players = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        report.rows_read += 1;
        // +2: one for the header, one because lines are 1-based
        let line = idx + 2;

        let record = match record {
            Ok(record) => record,
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(e) => {
                tracing::warn!("Skipping unreadable line {}: {}", line, e);
                report.skipped += 1;
                continue;
            }
        };

        let player = parser::parse_record_with(&record, &defaults);
        if player.player_id.is_empty() {
            tracing::warn!("Skipping line {} without a player ID", line);
            report.skipped += 1;
            continue;
        }
        players.push(player);
    }

    Ok(players)
}

/// Background reconciliation loop. Dropping the handle also stops the loop
/// once the current cycle finishes.
pub struct SyncHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SyncHandle {
    /// Stop the loop and wait for it. A cycle in progress is allowed to
    /// finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            tracing::error!("Sync task ended abnormally: {}", e);
        }
    }
}

/// Run a cycle every `interval`, starting one interval from now.
pub fn spawn_periodic<S>(reconciler: Arc<Reconciler<S>>, interval: Duration) -> SyncHandle
where
    S: PlayerStore + 'static,
{
    spawn_periodic_at(reconciler, tokio::time::Instant::now() + interval, interval)
}

/// Run a cycle at `start` and then every `interval`. Cycles never overlap;
/// ticks missed while a cycle runs are pushed back.
pub fn spawn_periodic_at<S>(
    reconciler: Arc<Reconciler<S>>,
    start: tokio::time::Instant,
    interval: Duration,
) -> SyncHandle
where
    S: PlayerStore + 'static,
{
    let (shutdown, mut stop) = watch::channel(false);

    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(start, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = reconciler.run_once().await {
                        tracing::error!("Reconciliation cycle failed: {}", e);
                    }
                }
                _ = stop.changed() => break,
            }
        }

        tracing::info!("Sync loop stopped");
    });

    SyncHandle { shutdown, task }
}
