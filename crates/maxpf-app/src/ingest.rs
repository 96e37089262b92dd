// Pull configured league seasons from a snapshot source into the store and
// refresh the league's derived stats.

use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use maxpf_football::RULE_VERSION;

use crate::config::LeagueConfig;
use crate::db::Database;
use crate::migration::{rebuild_league, MigrationError};
use crate::source::{SnapshotSource, SourceError};

#[derive(Debug, Default, Clone, PartialEq)]
pub struct IngestSummary {
    pub stored: Vec<u32>,
    pub missing: Vec<u32>,
    pub rejected: Vec<u32>,
}

/// Fetch every configured season for a league and store the snapshots.
/// Missing or unreadable seasons are logged and skipped.
pub async fn ingest_league(
    db: &Database,
    source: &dyn SnapshotSource,
    league: &LeagueConfig,
) -> Result<IngestSummary> {
    let mut summary = IngestSummary::default();
    for &season in &league.seasons {
        match source.fetch_season(&league.id, season).await {
            Ok(snapshot) => {
                db.save_raw_season(&snapshot)?;
                summary.stored.push(season);
            }
            Err(SourceError::NotFound { .. }) => {
                warn!("league {} season {season}: no snapshot available", league.id);
                summary.missing.push(season);
            }
            Err(e) => {
                warn!("league {} season {season}: {e}", league.id);
                summary.rejected.push(season);
            }
        }
    }
    info!(
        "league {}: stored {} season(s), {} missing, {} rejected",
        league.id,
        summary.stored.len(),
        summary.missing.len(),
        summary.rejected.len()
    );
    Ok(summary)
}

/// Ingest a league and, if anything new was stored, rebuild its derived
/// stats at the current rule version.
pub async fn refresh_league(
    db: Arc<Database>,
    source: &dyn SnapshotSource,
    league: &LeagueConfig,
    workers: usize,
) -> Result<IngestSummary, MigrationError> {
    let summary = ingest_league(&db, source, league).await?;
    if summary.stored.is_empty() {
        return Ok(summary);
    }
    if let Some(version) = db.league_version(&league.id)? {
        if version.rule_version > RULE_VERSION {
            return Err(MigrationError::VersionAhead {
                league_id: league.id.clone(),
                stored: version.rule_version,
                current: RULE_VERSION,
            });
        }
    }
    rebuild_league(&db, &league.id, workers, RULE_VERSION).await?;
    Ok(summary)
}
