// SQLite persistence for raw league snapshots and derived aggregates.

use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;

use maxpf_football::league::LeagueEvaluation;
use maxpf_football::lineup::WeeklyTeamResult;
use maxpf_football::model::LeagueSeason;
use maxpf_football::stats::{OwnerAllTimeStats, SeasonTeamStats};

/// SQLite-backed store. Raw snapshots are source data and are only ever
/// replaced by newer snapshots; everything else is derived and can be
/// rebuilt from them.
pub struct Database {
    conn: Mutex<Connection>,
}

/// Per-league derived-data version, as recorded by the last rebuild.
#[derive(Debug, Clone, PartialEq)]
pub struct LeagueVersion {
    pub rule_version: u32,
    pub migrated_at: String,
}

impl Database {
    /// Open (or create) a SQLite database at `path` and ensure all tables
    /// exist. Pass `":memory:"` for an ephemeral in-memory database.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {path}"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;
             PRAGMA foreign_keys = ON;",
        )
        .context("failed to set database pragmas")?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS raw_seasons (
                league_id  TEXT NOT NULL,
                season     INTEGER NOT NULL,
                payload    TEXT NOT NULL,
                stored_at  TEXT NOT NULL,
                PRIMARY KEY (league_id, season)
            );

            CREATE TABLE IF NOT EXISTS weekly_results (
                league_id  TEXT NOT NULL,
                season     INTEGER NOT NULL,
                week       INTEGER NOT NULL,
                roster_id  INTEGER NOT NULL,
                payload    TEXT NOT NULL,
                PRIMARY KEY (league_id, season, week, roster_id)
            );

            CREATE TABLE IF NOT EXISTS season_stats (
                league_id  TEXT NOT NULL,
                season     INTEGER NOT NULL,
                roster_id  INTEGER NOT NULL,
                owner_id   TEXT NOT NULL,
                payload    TEXT NOT NULL,
                PRIMARY KEY (league_id, season, roster_id)
            );

            CREATE TABLE IF NOT EXISTS owner_stats (
                league_id  TEXT NOT NULL,
                owner_id   TEXT NOT NULL,
                payload    TEXT NOT NULL,
                PRIMARY KEY (league_id, owner_id)
            );

            CREATE TABLE IF NOT EXISTS league_versions (
                league_id    TEXT PRIMARY KEY,
                rule_version INTEGER NOT NULL,
                migrated_at  TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS engine_state (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            ",
        )
        .context("failed to create database schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Acquire the database connection.
    ///
    /// Panics if the mutex is poisoned (another thread panicked while
    /// holding the lock).
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("database mutex poisoned")
    }

    // ------------------------------------------------------------------
    // Raw snapshots
    // ------------------------------------------------------------------

    /// Store a season snapshot, replacing any earlier one for the same
    /// league and season.
    pub fn save_raw_season(&self, season: &LeagueSeason) -> Result<()> {
        let payload = serde_json::to_string(season).context("failed to serialize season")?;
        self.conn()
            .execute(
                "INSERT OR REPLACE INTO raw_seasons (league_id, season, payload, stored_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![season.league_id, season.season, payload, timestamp()],
            )
            .context("failed to save raw season")?;
        Ok(())
    }

    /// All stored snapshots for a league, in season order.
    pub fn load_raw_seasons(&self, league_id: &str) -> Result<Vec<LeagueSeason>> {
        let payloads: Vec<(u32, String)> = self.query_rows(
            "SELECT season, payload FROM raw_seasons WHERE league_id = ?1 ORDER BY season",
            league_id,
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        payloads
            .into_iter()
            .map(|(season, p)| {
                decode(&p).with_context(|| format!("bad raw season {league_id}/{season}"))
            })
            .collect()
    }

    /// Every league with at least one stored snapshot, sorted.
    pub fn raw_league_ids(&self) -> Result<Vec<String>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare("SELECT DISTINCT league_id FROM raw_seasons ORDER BY league_id")
            .context("failed to prepare raw_league_ids query")?;
        let ids = stmt
            .query_map([], |row| row.get(0))
            .context("failed to query league ids")?
            .collect::<rusqlite::Result<Vec<String>>>()
            .context("failed to read league id row")?;
        Ok(ids)
    }

    // ------------------------------------------------------------------
    // Derived aggregates
    // ------------------------------------------------------------------

    /// Replace every derived row for a league with `evaluation` and record
    /// `rule_version` for it. Runs as one transaction: on any failure the
    /// league keeps its previous derived rows and version.
    pub fn replace_derived(
        &self,
        league_id: &str,
        evaluation: &LeagueEvaluation,
        rule_version: u32,
    ) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin transaction")?;

        for table in ["weekly_results", "season_stats", "owner_stats"] {
            tx.execute(&format!("DELETE FROM {table} WHERE league_id = ?1"), params![league_id])
                .with_context(|| format!("failed to clear {table}"))?;
        }

        for result in &evaluation.weekly {
            tx.execute(
                "INSERT INTO weekly_results (league_id, season, week, roster_id, payload)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    league_id,
                    result.season,
                    result.week,
                    result.roster_id,
                    encode(result)?
                ],
            )
            .context("failed to insert weekly result")?;
        }

        for block in &evaluation.seasons {
            for stats in &block.teams {
                tx.execute(
                    "INSERT INTO season_stats (league_id, season, roster_id, owner_id, payload)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        league_id,
                        stats.season,
                        stats.roster_id,
                        stats.owner_id,
                        encode(stats)?
                    ],
                )
                .context("failed to insert season stats")?;
            }
        }

        for owner in &evaluation.owners {
            tx.execute(
                "INSERT INTO owner_stats (league_id, owner_id, payload) VALUES (?1, ?2, ?3)",
                params![league_id, owner.owner_id, encode(owner)?],
            )
            .context("failed to insert owner stats")?;
        }

        tx.execute(
            "INSERT OR REPLACE INTO league_versions (league_id, rule_version, migrated_at)
             VALUES (?1, ?2, ?3)",
            params![league_id, rule_version, timestamp()],
        )
        .context("failed to record league version")?;

        tx.commit().context("failed to commit derived rewrite")?;
        Ok(())
    }

    pub fn league_version(&self, league_id: &str) -> Result<Option<LeagueVersion>> {
        self.conn()
            .query_row(
                "SELECT rule_version, migrated_at FROM league_versions WHERE league_id = ?1",
                params![league_id],
                |row| {
                    Ok(LeagueVersion {
                        rule_version: row.get(0)?,
                        migrated_at: row.get(1)?,
                    })
                },
            )
            .optional()
            .context("failed to query league version")
    }

    pub fn load_weekly_results(&self, league_id: &str) -> Result<Vec<WeeklyTeamResult>> {
        self.load_payloads(
            "SELECT payload FROM weekly_results WHERE league_id = ?1
             ORDER BY season, week, roster_id",
            league_id,
        )
    }

    pub fn load_season_stats(&self, league_id: &str) -> Result<Vec<SeasonTeamStats>> {
        self.load_payloads(
            "SELECT payload FROM season_stats WHERE league_id = ?1 ORDER BY season, roster_id",
            league_id,
        )
    }

    pub fn load_owner_stats(&self, league_id: &str) -> Result<Vec<OwnerAllTimeStats>> {
        self.load_payloads(
            "SELECT payload FROM owner_stats WHERE league_id = ?1 ORDER BY owner_id",
            league_id,
        )
    }

    fn load_payloads<T: DeserializeOwned>(&self, sql: &str, league_id: &str) -> Result<Vec<T>> {
        let payloads: Vec<String> = self.query_rows(sql, league_id, |row| row.get(0))?;
        payloads.iter().map(|p| decode(p)).collect()
    }

    fn query_rows<T>(
        &self,
        sql: &str,
        league_id: &str,
        map: impl FnMut(&rusqlite::Row<'_>) -> rusqlite::Result<T>,
    ) -> Result<Vec<T>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(sql).context("failed to prepare query")?;
        let rows = stmt
            .query_map(params![league_id], map)
            .context("failed to run query")?
            .collect::<rusqlite::Result<Vec<T>>>()
            .context("failed to read row")?;
        Ok(rows)
    }

    // ------------------------------------------------------------------
    // Engine state
    // ------------------------------------------------------------------

    const RULE_VERSION_KEY: &'static str = "rule_version";

    /// Store an arbitrary JSON value under `key`.
    pub fn save_state(&self, key: &str, value: &serde_json::Value) -> Result<()> {
        let json_str = serde_json::to_string(value).context("failed to serialize state value")?;
        self.conn()
            .execute(
                "INSERT OR REPLACE INTO engine_state (key, value) VALUES (?1, ?2)",
                params![key, json_str],
            )
            .context("failed to save state")?;
        Ok(())
    }

    pub fn load_state(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let json_str: Option<String> = self
            .conn()
            .query_row(
                "SELECT value FROM engine_state WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .context("failed to query engine state")?;
        json_str
            .map(|s| serde_json::from_str(&s).context("failed to deserialize state value"))
            .transpose()
    }

    /// Global rule version, written once every league has been rebuilt.
    pub fn rule_version(&self) -> Result<Option<u32>> {
        let value = self.load_state(Self::RULE_VERSION_KEY)?;
        Ok(value
            .and_then(|v| v.as_u64())
            .and_then(|v| u32::try_from(v).ok()))
    }

    pub fn set_rule_version(&self, version: u32) -> Result<()> {
        self.save_state(Self::RULE_VERSION_KEY, &serde_json::json!(version))
    }

    /// Run arbitrary SQL. Test-only hook for simulating corruption and
    /// failed writes.
    #[cfg(test)]
    pub(crate) fn execute_raw(&self, sql: &str) -> Result<()> {
        self.conn().execute_batch(sql).context("raw sql failed")?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

fn encode<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).context("failed to serialize payload")
}

fn decode<T: DeserializeOwned>(payload: &str) -> Result<T> {
    serde_json::from_str(payload).context("failed to deserialize payload")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
