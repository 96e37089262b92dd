// Parallel runner for the league pipeline.
//
// Weekly units go to tokio's blocking pool through a JoinSet, with a
// semaphore capping how many run at once. Every unit of a season is joined
// before that season is aggregated, so the output is identical to the
// sequential pipeline in the engine crate.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info};

use maxpf_football::league::{
    aggregate_season, combine_seasons, league_owners, sort_results, weekly_units,
    LeagueEvaluation, SeasonEvaluation, WeeklyUnit,
};
use maxpf_football::lineup::WeeklyTeamResult;
use maxpf_football::model::LeagueSeason;

/// Run weekly units with at most `workers` evaluating at a time. Results
/// come back in canonical order regardless of completion order.
pub async fn run_units(units: Vec<WeeklyUnit>, workers: usize) -> Result<Vec<WeeklyTeamResult>> {
    let permits = Arc::new(Semaphore::new(workers.max(1)));
    let mut set = JoinSet::new();
    let total = units.len();

    for unit in units {
        let permit = Arc::clone(&permits)
            .acquire_owned()
            .await
            .context("worker semaphore closed")?;
        set.spawn_blocking(move || {
            let _permit = permit;
            unit.run()
        });
    }

    let mut results = Vec::with_capacity(total);
    while let Some(joined) = set.join_next().await {
        results.push(joined.context("weekly evaluation task failed")?);
    }
    sort_results(&mut results);
    Ok(results)
}

/// Evaluate one season in parallel.
pub async fn evaluate_season(season: &LeagueSeason, workers: usize) -> Result<SeasonEvaluation> {
    let units = weekly_units(season);
    debug!(
        "league {} season {}: {} weekly units",
        season.league_id,
        season.season,
        units.len()
    );
    let weekly = run_units(units, workers).await?;
    let block = aggregate_season(season, &weekly);
    Ok(SeasonEvaluation { weekly, block })
}

/// Evaluate every season of a league in parallel, then fold the all-time
/// stats.
pub async fn evaluate_league(seasons: &[LeagueSeason], workers: usize) -> Result<LeagueEvaluation> {
    let mut evaluations = Vec::with_capacity(seasons.len());
    for season in seasons {
        evaluations.push(evaluate_season(season, workers).await?);
    }
    let evaluation = combine_seasons(evaluations, &league_owners(seasons));
    if let Some(first) = seasons.first() {
        info!(
            "league {}: {} weekly results, {} seasons, {} owners",
            first.league_id,
            evaluation.weekly.len(),
            evaluation.seasons.len(),
            evaluation.owners.len()
        );
    }
    Ok(evaluation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use maxpf_football::model::{MatchupEntry, RosterPlayer, Settlement, TeamSeason, WeekMatchups};
    use std::collections::BTreeMap;

    /// Twelve teams, five weeks, superflex plus IDP lineup with overlapping
    /// eligibility so greedy tie-breaking matters.
    fn busy_season(year: u32) -> LeagueSeason {
        let positions = ["QB", "RB", "WR", "TE", "K", "DL", "LB", "DB"];
        let mut players = Vec::new();
        for team in 1..=12u32 {
            for (i, pos) in positions.iter().enumerate() {
                for depth in 0..2 {
                    let mut alts = vec![pos.to_string()];
                    if *pos == "DL" {
                        alts.push("LB".to_string());
                    }
                    players.push(RosterPlayer {
                        player_id: format!("{team}-{i}-{depth}"),
                        position: pos.to_string(),
                        fantasy_positions: alts,
                    });
                }
            }
        }

        let weeks = (1..=5u32)
            .map(|week| WeekMatchups {
                week,
                entries: (1..=12u32)
                    .map(|team| {
                        let ids: Vec<String> = players
                            .iter()
                            .filter(|p| p.player_id.starts_with(&format!("{team}-")))
                            .map(|p| p.player_id.clone())
                            .collect();
                        let points: BTreeMap<String, f64> = ids
                            .iter()
                            .enumerate()
                            .map(|(i, id)| {
                                let pts = ((team * 7 + week * 13 + i as u32 * 3) % 23) as f64 + 0.35;
                                (id.clone(), pts)
                            })
                            .collect();
                        MatchupEntry {
                            roster_id: team,
                            matchup_id: Some((team + 1) / 2),
                            starters: ids.iter().step_by(2).take(10).cloned().collect(),
                            players: ids,
                            points,
                        }
                    })
                    .collect(),
            })
            .collect();

        LeagueSeason {
            league_id: "busy".to_string(),
            season: year,
            roster_positions: [
                "QB", "RB", "RB", "WR", "WR", "TE", "FLEX", "SUPER_FLEX", "K", "DL", "LB",
                "IDP_FLEX", "BN", "BN",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            playoff_week_start: Some(5),
            players,
            teams: (1..=12u32)
                .map(|team| TeamSeason {
                    roster_id: team,
                    owner_id: format!("owner-{}", (team + year) % 12),
                    settlement: Settlement {
                        wins: team % 4,
                        losses: 4 - team % 4,
                        champion: team == (year % 12) + 1,
                        ..Default::default()
                    },
                })
                .collect(),
            weeks,
        }
    }

    #[tokio::test]
    async fn parallel_matches_sequential() {
        let seasons = vec![busy_season(2022), busy_season(2023)];
        let sequential = maxpf_football::league::evaluate_league(&seasons);
        for workers in [1, 3, 16] {
            let parallel = evaluate_league(&seasons, workers).await.unwrap();
            assert_eq!(parallel, sequential, "workers = {workers}");
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn run_units_returns_canonical_order() {
        let season = busy_season(2023);
        let mut units = weekly_units(&season);
        units.reverse();
        let results = run_units(units, 8).await.unwrap();
        assert_eq!(results.len(), 60);
        assert!(results
            .windows(2)
            .all(|w| (w[0].week, w[0].roster_id) < (w[1].week, w[1].roster_id)));
    }

    #[tokio::test]
    async fn zero_workers_still_runs() {
        let season = busy_season(2023);
        let results = run_units(weekly_units(&season), 0).await.unwrap();
        assert_eq!(results.len(), 60);
    }

    #[tokio::test]
    async fn empty_league_evaluates_to_nothing() {
        let evaluation = evaluate_league(&[], 4).await.unwrap();
        assert!(evaluation.weekly.is_empty());
        assert!(evaluation.owners.is_empty());
    }
}
