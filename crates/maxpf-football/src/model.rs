// League snapshot types handed to the engine by the data-retrieval side,
// plus the read-only player directory built from them.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::roster::position::{eligible_positions, Position};

/// Everything the engine needs to evaluate one league for one season.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeagueSeason {
    pub league_id: String,
    pub season: u32,
    /// Ordered roster labels as the platform reports them, bench included.
    pub roster_positions: Vec<String>,
    /// First playoff week. Weeks at or after it are not regular season.
    #[serde(default)]
    pub playoff_week_start: Option<u32>,
    /// Every player that appeared on any roster during the season.
    #[serde(default)]
    pub players: Vec<RosterPlayer>,
    pub teams: Vec<TeamSeason>,
    #[serde(default)]
    pub weeks: Vec<WeekMatchups>,
}

impl LeagueSeason {
    /// Look up the owner of a roster for this season.
    pub fn owner_of(&self, roster_id: u32) -> Option<&str> {
        self.teams
            .iter()
            .find(|t| t.roster_id == roster_id)
            .map(|t| t.owner_id.as_str())
    }

    /// Whether a week belongs to the regular season.
    pub fn is_regular_season(&self, week: u32) -> bool {
        self.playoff_week_start.map_or(true, |start| week < start)
    }
}

/// A player as listed on a roster, with vendor position tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterPlayer {
    pub player_id: String,
    pub position: String,
    /// Alternate eligible positions, primary first when the platform lists it.
    #[serde(default)]
    pub fantasy_positions: Vec<String>,
}

/// One team's season: the roster it ran and who owned it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamSeason {
    pub roster_id: u32,
    /// Stable owner identity, carried across seasons even when roster ids move.
    pub owner_id: String,
    #[serde(default)]
    pub settlement: Settlement,
}

/// Settled standings and transaction counters for one team-season.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settlement {
    #[serde(default)]
    pub wins: u32,
    #[serde(default)]
    pub losses: u32,
    #[serde(default)]
    pub ties: u32,
    #[serde(default)]
    pub final_standing: Option<u32>,
    #[serde(default)]
    pub made_playoffs: bool,
    #[serde(default)]
    pub champion: bool,
    #[serde(default)]
    pub waiver_moves: u32,
    #[serde(default)]
    pub faab_spent: f64,
    #[serde(default)]
    pub trades: u32,
}

/// All matchup entries recorded for one week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekMatchups {
    pub week: u32,
    pub entries: Vec<MatchupEntry>,
}

/// One team's side of a weekly matchup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchupEntry {
    pub roster_id: u32,
    /// Teams sharing a matchup id played each other that week.
    #[serde(default)]
    pub matchup_id: Option<u32>,
    /// Starter ids in slot order. "0" or "" marks an empty slot.
    #[serde(default)]
    pub starters: Vec<String>,
    /// The full weekly player pool; may include players later dropped.
    #[serde(default)]
    pub players: Vec<String>,
    /// Points recorded per player id for the week.
    #[serde(default)]
    pub points: BTreeMap<String, f64>,
}

/// Whether a starter id marks an empty lineup slot.
pub fn is_empty_starter(id: &str) -> bool {
    let id = id.trim();
    id.is_empty() || id == "0"
}

// ---------------------------------------------------------------------------
// Player directory
// ---------------------------------------------------------------------------

/// Canonical positions for one player.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerInfo {
    pub position: Position,
    /// Eligible positions, primary first.
    pub eligible: Vec<Position>,
}

/// Read-only snapshot of player positions, passed explicitly into the
/// lineup evaluator.
#[derive(Debug, Clone, Default)]
pub struct PlayerDirectory {
    by_id: HashMap<String, PlayerInfo>,
}

impl PlayerDirectory {
    /// Build the directory from roster listings. Players whose tokens never
    /// normalize to a canonical position are left out.
    pub fn from_players(players: &[RosterPlayer]) -> Self {
        let mut by_id = HashMap::with_capacity(players.len());
        for player in players {
            let eligible = eligible_positions(&player.position, &player.fantasy_positions);
            let base = Position::normalize(&player.position).or_else(|| eligible.first().copied());
            match base {
                Some(position) => {
                    by_id.entry(player.player_id.clone()).or_insert(PlayerInfo {
                        position,
                        eligible,
                    });
                }
                None => tracing::debug!(
                    "player {} has no canonical position ({:?}), excluded",
                    player.player_id,
                    player.position
                ),
            }
        }
        PlayerDirectory { by_id }
    }

    pub fn get(&self, player_id: &str) -> Option<&PlayerInfo> {
        self.by_id.get(player_id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}
