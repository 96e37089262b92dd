// Where raw league snapshots come from.
//
// Fetching from the fantasy platform lives outside this repository; the
// engine only sees the `SnapshotSource` seam. `JsonDirSource` reads snapshots
// that an external fetcher has written to disk.

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use maxpf_football::model::LeagueSeason;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("no snapshot for league {league_id} season {season}")]
    NotFound { league_id: String, season: u32 },

    #[error("failed to read snapshot {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse snapshot {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("snapshot {path} is for league {found_league} season {found_season}")]
    Mismatch {
        path: PathBuf,
        found_league: String,
        found_season: u32,
    },
}

/// A provider of raw league-season snapshots.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn fetch_season(&self, league_id: &str, season: u32) -> Result<LeagueSeason, SourceError>;
}

/// Reads `<root>/<league_id>/<season>.json`.
#[derive(Debug, Clone)]
pub struct JsonDirSource {
    root: PathBuf,
}

impl JsonDirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        JsonDirSource { root: root.into() }
    }

    fn path_for(&self, league_id: &str, season: u32) -> PathBuf {
        self.root.join(league_id).join(format!("{season}.json"))
    }
}

#[async_trait]
impl SnapshotSource for JsonDirSource {
    async fn fetch_season(&self, league_id: &str, season: u32) -> Result<LeagueSeason, SourceError> {
        let path = self.path_for(league_id, season);
        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SourceError::NotFound {
                    league_id: league_id.to_string(),
                    season,
                });
            }
            Err(e) => return Err(SourceError::Io { path, source: e }),
        };

        let snapshot: LeagueSeason =
            serde_json::from_str(&text).map_err(|e| SourceError::Parse {
                path: path.clone(),
                source: e,
            })?;

        if snapshot.league_id != league_id || snapshot.season != season {
            return Err(SourceError::Mismatch {
                path,
                found_league: snapshot.league_id,
                found_season: snapshot.season,
            });
        }

        debug!(
            "loaded {} with {} weeks and {} teams",
            path.display(),
            snapshot.weeks.len(),
            snapshot.teams.len()
        );
        Ok(snapshot)
    }
}
