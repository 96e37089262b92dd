// Season aggregation: one team's evaluated weeks rolled into season stats.
//
// Always rebuilt from the complete set of counted weeks; nothing here patches
// a previous result in place.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::lineup::{management_percent, PointSplit, Tally, WeeklyTeamResult};
use crate::model::{Settlement, TeamSeason};
use crate::roster::Position;
use crate::stats::matchup::{MatchupResult, Outcome};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Win/loss/tie counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
}

impl Record {
    pub fn games(&self) -> u32 {
        self.wins + self.losses + self.ties
    }

    /// Ties count as half a win. Zero when no games were played.
    pub fn win_percent(&self) -> f64 {
        let games = self.games();
        if games == 0 {
            return 0.0;
        }
        (f64::from(self.wins) + 0.5 * f64::from(self.ties)) / f64::from(games) * 100.0
    }

    pub fn accumulate(&mut self, other: &Record) {
        self.wins += other.wins;
        self.losses += other.losses;
        self.ties += other.ties;
    }

    pub fn add(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Win => self.wins += 1,
            Outcome::Loss => self.losses += 1,
            Outcome::Tie => self.ties += 1,
        }
    }
}

/// Roster-move counters supplied by the platform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Transactions {
    pub waiver_moves: u32,
    pub faab_spent: f64,
    pub trades: u32,
}

impl Transactions {
    pub fn accumulate(&mut self, other: &Transactions) {
        self.waiver_moves += other.waiver_moves;
        self.faab_spent += other.faab_spent;
        self.trades += other.trades;
    }
}

/// Points-for, max-points-for and efficiency for one side of the ball.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SplitStats {
    pub points_for: f64,
    pub max_points_for: f64,
    pub management_percent: f64,
    pub points_per_week: f64,
    pub max_points_per_week: f64,
}

impl SplitStats {
    fn from_sums(points_for: f64, max_points_for: f64, weeks: u32) -> Self {
        SplitStats {
            points_for,
            max_points_for,
            management_percent: management_percent(points_for, max_points_for),
            points_per_week: per_week(points_for, weeks),
            max_points_per_week: per_week(max_points_for, weeks),
        }
    }
}

/// Season production credited to one position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PositionSeasonStats {
    pub points: f64,
    pub starts: u32,
    pub avg_per_week: f64,
    pub avg_per_start: f64,
    pub optimal_points: f64,
    pub optimal_starts: u32,
    pub optimal_avg_per_week: f64,
    pub optimal_avg_per_start: f64,
}

/// Production from one slot label (e.g. "FLEX") across actual starts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SlotSeasonStats {
    pub points: f64,
    pub starts: u32,
    pub avg_per_start: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeekScore {
    pub week: u32,
    pub points: f64,
}

/// One team's regular season.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonTeamStats {
    pub season: u32,
    pub roster_id: u32,
    pub owner_id: String,
    /// Completed regular-season weeks counted.
    pub weeks: u32,
    pub points_for: f64,
    pub max_points_for: f64,
    pub points_against: f64,
    pub management_percent: f64,
    pub points_per_week: f64,
    pub max_points_per_week: f64,
    pub offense: SplitStats,
    pub defense: SplitStats,
    pub best_week: Option<WeekScore>,
    pub worst_week: Option<WeekScore>,
    /// Weeks where the started lineup matched the greedy optimum.
    pub perfect_weeks: u32,
    pub positions: BTreeMap<Position, PositionSeasonStats>,
    pub slots: BTreeMap<String, SlotSeasonStats>,
    pub record: Record,
    pub final_standing: Option<u32>,
    pub made_playoffs: bool,
    pub champion: bool,
    pub transactions: Transactions,
}

// ---------------------------------------------------------------------------
// Week selection
// ---------------------------------------------------------------------------

/// Weeks that count toward season stats.
///
/// A week is complete once a later week exists; the latest week is still in
/// progress unless it is the only one. Weeks at or after
/// `playoff_week_start` are not regular season.
pub fn counted_weeks(
    available: impl IntoIterator<Item = u32>,
    playoff_week_start: Option<u32>,
) -> BTreeSet<u32> {
    let mut weeks: BTreeSet<u32> = available.into_iter().collect();
    if weeks.len() > 1 {
        weeks.pop_last();
    }
    weeks.retain(|&w| playoff_week_start.map_or(true, |start| w < start));
    weeks
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Aggregate one team's counted weeks into season stats.
///
/// `results` must already be limited to the counted weeks; they are summed
/// in week order so identical input always yields identical output.
/// `matchups` supplies points-against for those weeks.
pub fn aggregate_team_season(
    season: u32,
    team: &TeamSeason,
    results: &[WeeklyTeamResult],
    matchups: &[MatchupResult],
) -> SeasonTeamStats {
    let mut ordered: Vec<&WeeklyTeamResult> = results
        .iter()
        .filter(|r| r.roster_id == team.roster_id)
        .collect();
    ordered.sort_by_key(|r| r.week);

    let weeks = ordered.len() as u32;
    let mut actual = PointSplit::default();
    let mut optimal = PointSplit::default();
    let mut actual_positions: BTreeMap<Position, Tally> = BTreeMap::new();
    let mut optimal_positions: BTreeMap<Position, Tally> = BTreeMap::new();
    let mut slot_tallies: BTreeMap<String, Tally> = BTreeMap::new();
    let mut best_week: Option<WeekScore> = None;
    let mut worst_week: Option<WeekScore> = None;
    let mut perfect_weeks = 0;

    for result in &ordered {
        actual.accumulate(&result.actual);
        optimal.accumulate(&result.optimal);
        for (pos, tally) in &result.actual_by_position {
            actual_positions.entry(*pos).or_default().accumulate(tally);
        }
        for (pos, tally) in &result.optimal_by_position {
            optimal_positions.entry(*pos).or_default().accumulate(tally);
        }
        for (label, tally) in &result.actual_by_slot {
            slot_tallies.entry(label.clone()).or_default().accumulate(tally);
        }

        let score = WeekScore {
            week: result.week,
            points: result.actual.total,
        };
        if best_week.map_or(true, |b| score.points > b.points) {
            best_week = Some(score);
        }
        if worst_week.map_or(true, |w| score.points < w.points) {
            worst_week = Some(score);
        }
        if result.optimal.total > 0.0 && result.actual.total >= result.optimal.total - 1e-9 {
            perfect_weeks += 1;
        }
    }

    let counted: BTreeSet<u32> = ordered.iter().map(|r| r.week).collect();
    let points_against: f64 = matchups
        .iter()
        .filter(|m| m.season == season && counted.contains(&m.week))
        .filter_map(|m| m.sides_for(team.roster_id))
        .map(|(_, opp)| opp.points)
        .sum();

    let positions = position_stats(&actual_positions, &optimal_positions, weeks);
    let slots = slot_tallies
        .into_iter()
        .map(|(label, tally)| {
            let stats = SlotSeasonStats {
                points: tally.points,
                starts: tally.count,
                avg_per_start: tally.average(),
            };
            (label, stats)
        })
        .collect();

    let Settlement {
        wins,
        losses,
        ties,
        final_standing,
        made_playoffs,
        champion,
        waiver_moves,
        faab_spent,
        trades,
    } = team.settlement.clone();

    SeasonTeamStats {
        season,
        roster_id: team.roster_id,
        owner_id: team.owner_id.clone(),
        weeks,
        points_for: actual.total,
        max_points_for: optimal.total,
        points_against,
        management_percent: management_percent(actual.total, optimal.total),
        points_per_week: per_week(actual.total, weeks),
        max_points_per_week: per_week(optimal.total, weeks),
        offense: SplitStats::from_sums(actual.offense, optimal.offense, weeks),
        defense: SplitStats::from_sums(actual.defense, optimal.defense, weeks),
        best_week,
        worst_week,
        perfect_weeks,
        positions,
        slots,
        record: Record { wins, losses, ties },
        final_standing,
        made_playoffs,
        champion,
        transactions: Transactions {
            waiver_moves,
            faab_spent,
            trades,
        },
    }
}

fn position_stats(
    actual: &BTreeMap<Position, Tally>,
    optimal: &BTreeMap<Position, Tally>,
    weeks: u32,
) -> BTreeMap<Position, PositionSeasonStats> {
    let positions: BTreeSet<Position> = actual.keys().chain(optimal.keys()).copied().collect();
    positions
        .into_iter()
        .map(|pos| {
            let a = actual.get(&pos).copied().unwrap_or_default();
            let o = optimal.get(&pos).copied().unwrap_or_default();
            let stats = PositionSeasonStats {
                points: a.points,
                starts: a.count,
                avg_per_week: per_week(a.points, weeks),
                avg_per_start: a.average(),
                optimal_points: o.points,
                optimal_starts: o.count,
                optimal_avg_per_week: per_week(o.points, weeks),
                optimal_avg_per_start: o.average(),
            };
            (pos, stats)
        })
        .collect()
}

pub(crate) fn per_week(points: f64, weeks: u32) -> f64 {
    if weeks == 0 {
        0.0
    } else {
        points / f64::from(weeks)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
