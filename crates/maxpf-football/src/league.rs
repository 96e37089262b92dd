// League pipeline: one raw season snapshot into schedulable weekly units,
// and their results into season and all-time aggregates.
//
// `WeeklyUnit` owns everything it needs, so callers may run units on any
// thread in any order. The sequential helpers here are the reference the
// parallel runner must agree with.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::lineup::{evaluate_team_week, WeeklyTeamResult};
use crate::model::{LeagueSeason, MatchupEntry, PlayerDirectory};
use crate::roster::slot::starting_slots;
use crate::roster::Slot;
use crate::stats::alltime::{all_time_stats, OwnerAllTimeStats, SeasonBlock};
use crate::stats::matchup::pair_matchups;
use crate::stats::season::{aggregate_team_season, counted_weeks};

// ---------------------------------------------------------------------------
// Weekly units
// ---------------------------------------------------------------------------

/// One team's week, ready to evaluate independently of every other unit.
#[derive(Debug, Clone)]
pub struct WeeklyUnit {
    pub season: u32,
    pub week: u32,
    pub slots: Arc<[Slot]>,
    pub directory: Arc<PlayerDirectory>,
    pub entry: MatchupEntry,
}

impl WeeklyUnit {
    pub fn run(&self) -> WeeklyTeamResult {
        evaluate_team_week(
            self.season,
            self.week,
            &self.slots,
            &self.entry,
            &self.directory,
        )
    }
}

/// Split a season into one unit per team per week. The slot configuration
/// and player directory are built once and shared.
pub fn weekly_units(season: &LeagueSeason) -> Vec<WeeklyUnit> {
    let slots: Arc<[Slot]> = starting_slots(&season.roster_positions).into();
    let directory = Arc::new(PlayerDirectory::from_players(&season.players));
    debug!(
        "league {} season {}: {} starting slots, {} players",
        season.league_id,
        season.season,
        slots.len(),
        directory.len()
    );

    season
        .weeks
        .iter()
        .flat_map(|week| {
            let slots = Arc::clone(&slots);
            let directory = Arc::clone(&directory);
            week.entries.iter().map(move |entry| WeeklyUnit {
                season: season.season,
                week: week.week,
                slots: Arc::clone(&slots),
                directory: Arc::clone(&directory),
                entry: entry.clone(),
            })
        })
        .collect()
}

/// Put weekly results in their canonical order: season, week, roster.
pub fn sort_results(results: &mut [WeeklyTeamResult]) {
    results.sort_by_key(|r| (r.season, r.week, r.roster_id));
}

// ---------------------------------------------------------------------------
// Season and league evaluation
// ---------------------------------------------------------------------------

/// Aggregate one season's weekly results. Only completed regular-season
/// weeks count; the results themselves may cover every week.
pub fn aggregate_season(season: &LeagueSeason, results: &[WeeklyTeamResult]) -> SeasonBlock {
    let available = season.weeks.iter().map(|w| w.week);
    let counted = counted_weeks(available, season.playoff_week_start);
    let counted_results: Vec<WeeklyTeamResult> = results
        .iter()
        .filter(|r| r.season == season.season && counted.contains(&r.week))
        .cloned()
        .collect();

    let owned: BTreeSet<u32> = season.teams.iter().map(|t| t.roster_id).collect();
    let orphaned: BTreeSet<u32> = counted_results
        .iter()
        .map(|r| r.roster_id)
        .filter(|id| !owned.contains(id))
        .collect();
    for roster_id in orphaned {
        warn!(
            "league {} season {}: roster {roster_id} has results but no owner, left out",
            season.league_id, season.season
        );
    }

    let matchups = pair_matchups(&counted_results);
    let mut teams: Vec<_> = season
        .teams
        .iter()
        .map(|team| aggregate_team_season(season.season, team, &counted_results, &matchups))
        .collect();
    teams.sort_by_key(|t| t.roster_id);

    SeasonBlock {
        season: season.season,
        teams,
        matchups,
    }
}

/// Weekly results and season aggregates for one season.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonEvaluation {
    pub weekly: Vec<WeeklyTeamResult>,
    pub block: SeasonBlock,
}

/// Evaluate a season sequentially.
pub fn evaluate_season(season: &LeagueSeason) -> SeasonEvaluation {
    let mut weekly: Vec<WeeklyTeamResult> = weekly_units(season).iter().map(WeeklyUnit::run).collect();
    sort_results(&mut weekly);
    let block = aggregate_season(season, &weekly);
    SeasonEvaluation { weekly, block }
}

/// Everything derived for one league across its seasons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeagueEvaluation {
    pub weekly: Vec<WeeklyTeamResult>,
    /// Season blocks in ascending season order.
    pub seasons: Vec<SeasonBlock>,
    /// One entry per owner seen in any season, ordered by owner id.
    pub owners: Vec<OwnerAllTimeStats>,
}

/// Combine evaluated seasons into a league evaluation. Seasons may arrive
/// in any order.
pub fn combine_seasons(
    evaluations: Vec<SeasonEvaluation>,
    owners: &[String],
) -> LeagueEvaluation {
    let mut weekly = Vec::new();
    let mut seasons = Vec::with_capacity(evaluations.len());
    for evaluation in evaluations {
        weekly.extend(evaluation.weekly);
        seasons.push(evaluation.block);
    }
    sort_results(&mut weekly);
    seasons.sort_by_key(|b| b.season);
    let owners = all_time_stats(&seasons, owners);
    LeagueEvaluation {
        weekly,
        seasons,
        owners,
    }
}

/// Owner ids appearing in any of the given seasons, sorted and unique.
pub fn league_owners(seasons: &[LeagueSeason]) -> Vec<String> {
    let owners: BTreeSet<&str> = seasons
        .iter()
        .flat_map(|s| s.teams.iter().map(|t| t.owner_id.as_str()))
        .collect();
    owners.into_iter().map(String::from).collect()
}

/// Evaluate a whole league sequentially.
pub fn evaluate_league(seasons: &[LeagueSeason]) -> LeagueEvaluation {
    let evaluations = seasons.iter().map(evaluate_season).collect();
    combine_seasons(evaluations, &league_owners(seasons))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
