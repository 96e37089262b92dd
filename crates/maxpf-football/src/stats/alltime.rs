// All-time owner aggregation across seasons.
//
// Contributions are keyed by (season, roster) and head-to-head games by
// (opponent, season, week, roster); totals are summed in key order only when
// the accumulator is finished. Folding seasons in any order therefore yields
// identical stats.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::lineup::{management_percent, Tally};
use crate::roster::Position;
use crate::stats::matchup::{MatchupResult, Outcome};
use crate::stats::season::{per_week, Record, SeasonTeamStats, Transactions};

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// Career record against one opposing owner.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeadToHead {
    pub record: Record,
    pub points_for: f64,
    pub points_against: f64,
    pub avg_points_for: f64,
    pub avg_points_against: f64,
    pub avg_management_percent: f64,
}

/// Career production credited to one position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PositionCareerStats {
    pub points: f64,
    pub starts: u32,
    pub avg_per_week: f64,
    pub avg_per_start: f64,
    pub optimal_points: f64,
}

/// Career totals for one points-split (offense or defense).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CareerSplit {
    pub points_for: f64,
    pub max_points_for: f64,
    pub management_percent: f64,
}

/// Everything known about one owner across all seasons.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OwnerAllTimeStats {
    pub owner_id: String,
    /// Seasons played, ascending.
    pub seasons: Vec<u32>,
    pub weeks: u32,
    pub points_for: f64,
    pub max_points_for: f64,
    pub points_against: f64,
    pub management_percent: f64,
    pub points_per_week: f64,
    pub offense: CareerSplit,
    pub defense: CareerSplit,
    pub record: Record,
    pub win_percent: f64,
    pub championships: u32,
    pub playoff_appearances: u32,
    pub best_finish: Option<u32>,
    pub transactions: Transactions,
    pub positions: BTreeMap<Position, PositionCareerStats>,
    /// Keyed by opposing owner id.
    pub head_to_head: BTreeMap<String, HeadToHead>,
}

// ---------------------------------------------------------------------------
// Accumulation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
struct Game {
    outcome: Outcome,
    points_for: f64,
    points_against: f64,
    management_percent: f64,
}

/// Order-independent accumulator for one owner.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AllTimeAccumulator {
    owner_id: String,
    seasons: BTreeMap<(u32, u32), SeasonTeamStats>,
    games: BTreeMap<(String, u32, u32, u32), Game>,
}

impl AllTimeAccumulator {
    pub fn new(owner_id: impl Into<String>) -> Self {
        AllTimeAccumulator {
            owner_id: owner_id.into(),
            ..Default::default()
        }
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    /// Add one season. Re-adding the same (season, roster) replaces it.
    pub fn add_season(&mut self, stats: SeasonTeamStats) {
        self.seasons.insert((stats.season, stats.roster_id), stats);
    }

    /// Record one head-to-head game from this owner's perspective.
    pub fn add_game(
        &mut self,
        opponent: &str,
        matchup: &MatchupResult,
        own_roster_id: u32,
    ) {
        let (Some((own, opp)), Some(outcome)) = (
            matchup.sides_for(own_roster_id),
            matchup.outcome_for(own_roster_id),
        ) else {
            return;
        };
        let key = (
            opponent.to_string(),
            matchup.season,
            matchup.week,
            own_roster_id,
        );
        self.games.insert(
            key,
            Game {
                outcome,
                points_for: own.points,
                points_against: opp.points,
                management_percent: own.management_percent(),
            },
        );
    }

    /// Compute the derived all-time stats. An accumulator with no seasons
    /// yields a zeroed record rather than nothing.
    pub fn finish(&self) -> OwnerAllTimeStats {
        let mut out = OwnerAllTimeStats {
            owner_id: self.owner_id.clone(),
            ..Default::default()
        };

        let mut seasons = BTreeSet::new();
        let mut offense_for = 0.0;
        let mut offense_max = 0.0;
        let mut defense_for = 0.0;
        let mut defense_max = 0.0;
        let mut actual_positions: BTreeMap<Position, Tally> = BTreeMap::new();
        let mut optimal_points: BTreeMap<Position, f64> = BTreeMap::new();

        for stats in self.seasons.values() {
            seasons.insert(stats.season);
            out.weeks += stats.weeks;
            out.points_for += stats.points_for;
            out.max_points_for += stats.max_points_for;
            out.points_against += stats.points_against;
            offense_for += stats.offense.points_for;
            offense_max += stats.offense.max_points_for;
            defense_for += stats.defense.points_for;
            defense_max += stats.defense.max_points_for;
            out.record.accumulate(&stats.record);
            out.transactions.accumulate(&stats.transactions);
            if stats.champion {
                out.championships += 1;
            }
            if stats.made_playoffs {
                out.playoff_appearances += 1;
            }
            if let Some(standing) = stats.final_standing {
                out.best_finish = Some(out.best_finish.map_or(standing, |b| b.min(standing)));
            }
            for (pos, p) in &stats.positions {
                actual_positions.entry(*pos).or_default().accumulate(&Tally {
                    points: p.points,
                    count: p.starts,
                });
                *optimal_points.entry(*pos).or_default() += p.optimal_points;
            }
        }

        out.seasons = seasons.into_iter().collect();
        out.management_percent = management_percent(out.points_for, out.max_points_for);
        out.points_per_week = per_week(out.points_for, out.weeks);
        out.offense = CareerSplit {
            points_for: offense_for,
            max_points_for: offense_max,
            management_percent: management_percent(offense_for, offense_max),
        };
        out.defense = CareerSplit {
            points_for: defense_for,
            max_points_for: defense_max,
            management_percent: management_percent(defense_for, defense_max),
        };
        out.win_percent = out.record.win_percent();

        let positions: BTreeSet<Position> = actual_positions
            .keys()
            .chain(optimal_points.keys())
            .copied()
            .collect();
        for pos in positions {
            let tally = actual_positions.get(&pos).copied().unwrap_or_default();
            out.positions.insert(
                pos,
                PositionCareerStats {
                    points: tally.points,
                    starts: tally.count,
                    avg_per_week: per_week(tally.points, out.weeks),
                    avg_per_start: tally.average(),
                    optimal_points: optimal_points.get(&pos).copied().unwrap_or(0.0),
                },
            );
        }

        for ((opponent, ..), game) in &self.games {
            let h2h = out.head_to_head.entry(opponent.clone()).or_default();
            h2h.record.add(game.outcome);
            h2h.points_for += game.points_for;
            h2h.points_against += game.points_against;
            // Summed here, divided below.
            h2h.avg_management_percent += game.management_percent;
        }
        for h2h in out.head_to_head.values_mut() {
            let games = f64::from(h2h.record.games());
            h2h.avg_points_for = h2h.points_for / games;
            h2h.avg_points_against = h2h.points_against / games;
            h2h.avg_management_percent /= games;
        }

        out
    }
}

// ---------------------------------------------------------------------------
// Season blocks
// ---------------------------------------------------------------------------

/// A settled season ready for all-time folding: every team's stats plus the
/// counted regular-season matchups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonBlock {
    pub season: u32,
    pub teams: Vec<SeasonTeamStats>,
    pub matchups: Vec<MatchupResult>,
}

impl SeasonBlock {
    fn owner_of(&self, roster_id: u32) -> Option<&str> {
        self.teams
            .iter()
            .find(|t| t.roster_id == roster_id)
            .map(|t| t.owner_id.as_str())
    }
}

/// Fold one season block into per-owner accumulators.
///
/// Head-to-head games where either side scored exactly zero are skipped as
/// missing data. That also drops real zero-point weeks; zero doubles as the
/// "not recorded" sentinel in platform data.
pub fn fold_season(accumulators: &mut BTreeMap<String, AllTimeAccumulator>, block: &SeasonBlock) {
    for stats in &block.teams {
        accumulators
            .entry(stats.owner_id.clone())
            .or_insert_with(|| AllTimeAccumulator::new(stats.owner_id.clone()))
            .add_season(stats.clone());
    }

    for matchup in &block.matchups {
        if matchup.has_scoreless_side() {
            continue;
        }
        let (Some(home_owner), Some(away_owner)) = (
            block.owner_of(matchup.home.roster_id),
            block.owner_of(matchup.away.roster_id),
        ) else {
            continue;
        };
        if home_owner == away_owner {
            continue;
        }
        for (own, opponent, roster_id) in [
            (home_owner, away_owner, matchup.home.roster_id),
            (away_owner, home_owner, matchup.away.roster_id),
        ] {
            accumulators
                .entry(own.to_string())
                .or_insert_with(|| AllTimeAccumulator::new(own))
                .add_game(opponent, matchup, roster_id);
        }
    }
}

/// Build all-time stats for every owner found in `blocks`, plus any owner in
/// `owners` even if they have no qualifying season. Ordered by owner id.
pub fn all_time_stats(blocks: &[SeasonBlock], owners: &[String]) -> Vec<OwnerAllTimeStats> {
    let mut accumulators: BTreeMap<String, AllTimeAccumulator> = BTreeMap::new();
    for owner in owners {
        accumulators
            .entry(owner.clone())
            .or_insert_with(|| AllTimeAccumulator::new(owner.clone()));
    }
    for block in blocks {
        fold_season(&mut accumulators, block);
    }
    accumulators.values().map(AllTimeAccumulator::finish).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::matchup::MatchupSide;
    use crate::stats::season::{PositionSeasonStats, SplitStats};

    fn stats(season: u32, roster_id: u32, owner: &str, pf: f64, max: f64) -> SeasonTeamStats {
        let mut positions = BTreeMap::new();
        positions.insert(
            Position::WR,
            PositionSeasonStats {
                points: pf * 0.4,
                starts: 26,
                optimal_points: max * 0.4,
                ..Default::default()
            },
        );
        SeasonTeamStats {
            season,
            roster_id,
            owner_id: owner.to_string(),
            weeks: 13,
            points_for: pf,
            max_points_for: max,
            points_against: pf - 11.1,
            management_percent: management_percent(pf, max),
            points_per_week: pf / 13.0,
            max_points_per_week: max / 13.0,
            offense: SplitStats {
                points_for: pf * 0.8,
                max_points_for: max * 0.8,
                ..Default::default()
            },
            defense: SplitStats {
                points_for: pf * 0.2,
                max_points_for: max * 0.2,
                ..Default::default()
            },
            best_week: None,
            worst_week: None,
            perfect_weeks: 1,
            positions,
            slots: BTreeMap::new(),
            record: Record { wins: 8, losses: 5, ties: 0 },
            final_standing: Some(roster_id),
            made_playoffs: roster_id <= 2,
            champion: roster_id == 1,
            transactions: Transactions {
                waiver_moves: 10,
                faab_spent: 33.3,
                trades: 2,
            },
        }
    }

    fn game(season: u32, week: u32, a: (u32, f64), b: (u32, f64)) -> MatchupResult {
        MatchupResult {
            season,
            week,
            matchup_id: 1,
            home: MatchupSide {
                roster_id: a.0,
                points: a.1,
                optimal: a.1 + 12.3,
            },
            away: MatchupSide {
                roster_id: b.0,
                points: b.1,
                optimal: b.1 + 7.7,
            },
        }
    }

    fn blocks() -> Vec<SeasonBlock> {
        vec![
            SeasonBlock {
                season: 2021,
                teams: vec![
                    stats(2021, 1, "alice", 1401.7, 1620.3),
                    stats(2021, 2, "bob", 1333.1, 1590.9),
                ],
                matchups: vec![
                    game(2021, 1, (1, 101.3), (2, 99.9)),
                    game(2021, 2, (1, 0.0), (2, 120.0)),
                ],
            },
            // Roster ids swap owners between seasons.
            SeasonBlock {
                season: 2022,
                teams: vec![
                    stats(2022, 2, "alice", 1510.2, 1700.8),
                    stats(2022, 1, "bob", 1288.4, 1544.6),
                ],
                matchups: vec![game(2022, 1, (1, 88.8), (2, 111.1))],
            },
            SeasonBlock {
                season: 2023,
                teams: vec![
                    stats(2023, 1, "alice", 1377.7, 1599.1),
                    stats(2023, 3, "carol", 1222.2, 1500.5),
                ],
                matchups: vec![game(2023, 3, (1, 95.5), (3, 95.5))],
            },
        ]
    }

    #[test]
    fn sums_across_seasons_by_owner() {
        let all = all_time_stats(&blocks(), &[]);
        let alice = all.iter().find(|o| o.owner_id == "alice").unwrap();
        assert_eq!(alice.seasons, vec![2021, 2022, 2023]);
        assert_eq!(alice.weeks, 39);
        assert!((alice.points_for - (1401.7 + 1510.2 + 1377.7)).abs() < 1e-9);
        assert_eq!(alice.record, Record { wins: 24, losses: 15, ties: 0 });
        assert_eq!(alice.championships, 2);
        assert_eq!(alice.playoff_appearances, 3);
        assert_eq!(alice.best_finish, Some(1));
        assert_eq!(alice.transactions.trades, 6);
        assert_eq!(alice.positions[&Position::WR].starts, 78);
        assert!(alice.management_percent > 0.0 && alice.management_percent < 100.0);
    }

    #[test]
    fn head_to_head_follows_owners_not_rosters() {
        let all = all_time_stats(&blocks(), &[]);
        let alice = all.iter().find(|o| o.owner_id == "alice").unwrap();
        let vs_bob = &alice.head_to_head["bob"];
        // 2021 week 1 win as roster 1; 2022 week 1 win as roster 2.
        // 2021 week 2 had a scoreless side and is skipped.
        assert_eq!(vs_bob.record, Record { wins: 2, losses: 0, ties: 0 });
        assert!((vs_bob.avg_points_for - (101.3 + 111.1) / 2.0).abs() < 1e-9);
        assert!((vs_bob.avg_points_against - (99.9 + 88.8) / 2.0).abs() < 1e-9);

        let vs_carol = &alice.head_to_head["carol"];
        assert_eq!(vs_carol.record.ties, 1);

        let bob = all.iter().find(|o| o.owner_id == "bob").unwrap();
        assert_eq!(bob.head_to_head["alice"].record.losses, 2);
    }

    #[test]
    fn head_to_head_management_percent_is_averaged() {
        let all = all_time_stats(&blocks(), &[]);
        let carol = all.iter().find(|o| o.owner_id == "carol").unwrap();
        let vs_alice = &carol.head_to_head["alice"];
        let expected = management_percent(95.5, 95.5 + 7.7);
        assert!((vs_alice.avg_management_percent - expected).abs() < 1e-9);
    }

    #[test]
    fn owner_without_seasons_gets_zeroed_record() {
        let all = all_time_stats(&blocks(), &["dave".to_string()]);
        let dave = all.iter().find(|o| o.owner_id == "dave").unwrap();
        assert!(dave.seasons.is_empty());
        assert_eq!(dave.points_for, 0.0);
        assert_eq!(dave.management_percent, 0.0);
        assert_eq!(dave.win_percent, 0.0);
        assert!(dave.head_to_head.is_empty());
    }

    #[test]
    fn fold_order_does_not_matter() {
        let base = blocks();
        let expected = all_time_stats(&base, &[]);
        let orders = [[0, 1, 2], [0, 2, 1], [1, 0, 2], [1, 2, 0], [2, 0, 1], [2, 1, 0]];
        for order in orders {
            let permuted: Vec<SeasonBlock> = order.iter().map(|&i| base[i].clone()).collect();
            assert_eq!(all_time_stats(&permuted, &[]), expected, "order {order:?}");
        }
    }

    #[test]
    fn game_for_roster_outside_matchup_is_ignored() {
        let mut acc = AllTimeAccumulator::new("alice");
        acc.add_game("bob", &game(2023, 1, (1, 80.0), (2, 70.0)), 5);
        assert!(acc.finish().head_to_head.is_empty());

        acc.add_game("bob", &game(2023, 1, (1, 80.0), (2, 70.0)), 2);
        let vs_bob = &acc.finish().head_to_head["bob"];
        assert_eq!(vs_bob.record, Record { wins: 0, losses: 1, ties: 0 });
    }
}
