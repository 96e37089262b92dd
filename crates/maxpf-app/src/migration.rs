// Rule-version migration: rebuild derived aggregates from raw snapshots
// whenever the engine's rule version moves past what the store was built
// with.
//
// Each league is rebuilt and re-tagged in a single transaction. The global
// tag only advances after every league has succeeded, so an interrupted run
// is simply picked up again on the next start.

use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info, warn};

use maxpf_football::RULE_VERSION;

use crate::db::Database;
use crate::pipeline;

#[derive(Debug, Error)]
pub enum MigrationError {
    /// The store claims a newer rule version than this engine knows.
    #[error("league {league_id} is at rule version {stored}, ahead of engine version {current}")]
    VersionAhead {
        league_id: String,
        stored: u32,
        current: u32,
    },

    #[error("store is at rule version {stored}, ahead of engine version {current}")]
    StoreAhead { stored: u32, current: u32 },

    #[error("failed to rebuild league {league_id}: {message}")]
    Rebuild { league_id: String, message: String },

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// What a migration run did.
#[derive(Debug, Default)]
pub struct MigrationReport {
    /// Global version found before the run.
    pub previous_version: Option<u32>,
    pub target_version: u32,
    /// Leagues rebuilt this run.
    pub rebuilt: Vec<String>,
    /// Leagues already at the target version.
    pub current: Vec<String>,
    pub failures: Vec<MigrationError>,
}

impl MigrationReport {
    /// True when every league is at the target version and the global tag
    /// was written.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Bring every stored league up to [`RULE_VERSION`].
pub async fn migrate(db: Arc<Database>, workers: usize) -> Result<MigrationReport, MigrationError> {
    migrate_to(db, workers, RULE_VERSION).await
}

/// Bring every stored league up to `target`. Re-running after success is a
/// no-op.
pub async fn migrate_to(
    db: Arc<Database>,
    workers: usize,
    target: u32,
) -> Result<MigrationReport, MigrationError> {
    let previous_version = db.rule_version()?;
    if let Some(stored) = previous_version.filter(|&v| v > target) {
        return Err(MigrationError::StoreAhead {
            stored,
            current: target,
        });
    }

    let mut report = MigrationReport {
        previous_version,
        target_version: target,
        ..Default::default()
    };

    for league_id in db.raw_league_ids()? {
        let stored = db.league_version(&league_id)?.map(|v| v.rule_version);
        match stored {
            Some(v) if v == target => {
                report.current.push(league_id);
            }
            Some(v) if v > target => {
                let err = MigrationError::VersionAhead {
                    league_id,
                    stored: v,
                    current: target,
                };
                error!("{err}");
                report.failures.push(err);
            }
            _ => match rebuild_league(&db, &league_id, workers, target).await {
                Ok(()) => {
                    info!("league {league_id}: rebuilt from {stored:?} to version {target}");
                    report.rebuilt.push(league_id);
                }
                Err(err) => {
                    error!("{err}");
                    report.failures.push(err);
                }
            },
        }
    }

    if report.is_complete() {
        if previous_version != Some(target) {
            db.set_rule_version(target)?;
            info!("rule version {previous_version:?} -> {target}");
        }
    } else {
        warn!(
            "{} league(s) failed; rule version left at {previous_version:?}",
            report.failures.len()
        );
    }

    Ok(report)
}

/// Recompute one league from its raw snapshots and swap the derived rows in
/// atomically.
pub async fn rebuild_league(
    db: &Database,
    league_id: &str,
    workers: usize,
    target: u32,
) -> Result<(), MigrationError> {
    let rebuild_err = |e: anyhow::Error| MigrationError::Rebuild {
        league_id: league_id.to_string(),
        message: format!("{e:#}"),
    };

    let seasons = db.load_raw_seasons(league_id).map_err(rebuild_err)?;
    let evaluation = pipeline::evaluate_league(&seasons, workers)
        .await
        .map_err(rebuild_err)?;
    db.replace_derived(league_id, &evaluation, target)
        .map_err(rebuild_err)?;
    Ok(())
}
