// Roll-ups above the weekly evaluator: matchups, seasons, careers.

pub mod alltime;
pub mod matchup;
pub mod season;

pub use alltime::{all_time_stats, AllTimeAccumulator, HeadToHead, OwnerAllTimeStats, SeasonBlock};
pub use matchup::{pair_matchups, MatchupResult, MatchupSide, Outcome};
pub use season::{aggregate_team_season, counted_weeks, Record, SeasonTeamStats, Transactions};
