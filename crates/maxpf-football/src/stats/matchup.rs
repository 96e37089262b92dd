// Pairs the two sides of each weekly matchup from evaluated team weeks.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::lineup::{management_percent, WeeklyTeamResult};

/// One team's side of a played matchup.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchupSide {
    pub roster_id: u32,
    /// Actual points scored.
    pub points: f64,
    /// Greedy optimal points for the same week.
    pub optimal: f64,
}

impl MatchupSide {
    pub fn management_percent(&self) -> f64 {
        management_percent(self.points, self.optimal)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Win,
    Loss,
    Tie,
}

/// A head-to-head game between two rosters. `home` is the lower roster id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchupResult {
    pub season: u32,
    pub week: u32,
    pub matchup_id: u32,
    pub home: MatchupSide,
    pub away: MatchupSide,
}

impl MatchupResult {
    /// The given roster's side and its opponent's, if it played here.
    pub fn sides_for(&self, roster_id: u32) -> Option<(&MatchupSide, &MatchupSide)> {
        if self.home.roster_id == roster_id {
            Some((&self.home, &self.away))
        } else if self.away.roster_id == roster_id {
            Some((&self.away, &self.home))
        } else {
            None
        }
    }

    /// Whether either side scored exactly zero. Such games are treated as
    /// missing data by head-to-head records.
    pub fn has_scoreless_side(&self) -> bool {
        self.home.points == 0.0 || self.away.points == 0.0
    }

    pub fn outcome_for(&self, roster_id: u32) -> Option<Outcome> {
        let (own, opp) = self.sides_for(roster_id)?;
        let outcome = if own.points > opp.points {
            Outcome::Win
        } else if own.points < opp.points {
            Outcome::Loss
        } else {
            Outcome::Tie
        };
        Some(outcome)
    }
}

/// Pair weekly results sharing (season, week, matchup id). Entries without
/// a matchup id, or groups that are not exactly two teams, are skipped.
/// Output is ordered by season, week, then matchup id.
pub fn pair_matchups(results: &[WeeklyTeamResult]) -> Vec<MatchupResult> {
    let mut groups: BTreeMap<(u32, u32, u32), Vec<&WeeklyTeamResult>> = BTreeMap::new();
    for result in results {
        if let Some(matchup_id) = result.matchup_id {
            groups
                .entry((result.season, result.week, matchup_id))
                .or_default()
                .push(result);
        }
    }

    groups
        .into_iter()
        .filter_map(|((season, week, matchup_id), mut sides)| {
            if sides.len() != 2 {
                debug!(
                    "season {season} week {week} matchup {matchup_id} has {} sides, skipped",
                    sides.len()
                );
                return None;
            }
            sides.sort_by_key(|r| r.roster_id);
            let side = |r: &WeeklyTeamResult| MatchupSide {
                roster_id: r.roster_id,
                points: r.actual.total,
                optimal: r.optimal.total,
            };
            Some(MatchupResult {
                season,
                week,
                matchup_id,
                home: side(sides[0]),
                away: side(sides[1]),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lineup::PointSplit;
    use std::collections::BTreeMap;

    fn result(week: u32, roster_id: u32, matchup_id: Option<u32>, points: f64) -> WeeklyTeamResult {
        WeeklyTeamResult {
            season: 2023,
            week,
            roster_id,
            matchup_id,
            actual: PointSplit {
                total: points,
                offense: points,
                defense: 0.0,
            },
            optimal: PointSplit {
                total: points + 10.0,
                offense: points + 10.0,
                defense: 0.0,
            },
            actual_by_position: BTreeMap::new(),
            optimal_by_position: BTreeMap::new(),
            actual_by_slot: BTreeMap::new(),
        }
    }

    #[test]
    fn pairs_sides_by_matchup_id() {
        let results = vec![
            result(1, 3, Some(1), 90.0),
            result(1, 1, Some(1), 100.0),
            result(1, 2, Some(2), 80.0),
            result(1, 4, Some(2), 80.0),
        ];
        let paired = pair_matchups(&results);
        assert_eq!(paired.len(), 2);
        assert_eq!(paired[0].home.roster_id, 1);
        assert_eq!(paired[0].away.roster_id, 3);
        assert_eq!(paired[0].outcome_for(1), Some(Outcome::Win));
        assert_eq!(paired[0].outcome_for(3), Some(Outcome::Loss));
        assert_eq!(paired[1].outcome_for(4), Some(Outcome::Tie));
        assert_eq!(paired[1].outcome_for(9), None);
    }

    #[test]
    fn skips_byes_and_odd_groups() {
        let results = vec![
            result(1, 1, None, 100.0),
            result(1, 2, Some(5), 80.0),
            result(2, 1, Some(1), 70.0),
            result(2, 2, Some(1), 60.0),
        ];
        let paired = pair_matchups(&results);
        assert_eq!(paired.len(), 1);
        assert_eq!(paired[0].week, 2);
    }

    #[test]
    fn scoreless_side_detection() {
        let paired = pair_matchups(&[result(1, 1, Some(1), 0.0), result(1, 2, Some(1), 55.0)]);
        assert!(paired[0].has_scoreless_side());
        let (own, opp) = paired[0].sides_for(2).unwrap();
        assert_eq!(own.points, 55.0);
        assert_eq!(opp.points, 0.0);
    }
}
