// Weekly lineup evaluation: the points a team scored with the lineup it
// started, and the points its greedy best lineup would have scored.
//
// Both paths draw from the same candidate pool and credit positions through
// `credited_position`, so their position maps are directly comparable.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::{is_empty_starter, MatchupEntry, PlayerDirectory};
use crate::roster::{credited_position, Position, Slot};

// ---------------------------------------------------------------------------
// Candidates
// ---------------------------------------------------------------------------

/// A player's participation in one week.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub player_id: String,
    pub position: Position,
    /// Eligible positions, primary first.
    pub eligible: Vec<Position>,
    pub points: f64,
}

impl Candidate {
    /// Whether the player's base or any alternate position fits the slot.
    pub fn is_eligible_for(&self, slot: &Slot) -> bool {
        slot.accepts(self.position) || self.eligible.iter().any(|p| slot.accepts(*p))
    }

    /// Position this player's points are credited to when filling `slot`.
    pub fn credited_for(&self, slot: &Slot) -> Position {
        credited_position(slot, &self.eligible, self.position)
    }
}

/// Ordered, de-duplicated candidates for one team-week. Order decides greedy
/// ties: the first-encountered candidate wins.
#[derive(Debug, Clone, Default)]
pub struct CandidatePool {
    candidates: Vec<Candidate>,
    index: HashMap<String, usize>,
}

impl CandidatePool {
    /// Build a pool, keeping the first occurrence of each player id.
    pub fn new(candidates: impl IntoIterator<Item = Candidate>) -> Self {
        let mut pool = CandidatePool::default();
        for candidate in candidates {
            if pool.index.contains_key(&candidate.player_id) {
                continue;
            }
            pool.index
                .insert(candidate.player_id.clone(), pool.candidates.len());
            pool.candidates.push(candidate);
        }
        pool
    }

    /// Build the pool for one matchup entry: every player with a recorded
    /// score, in weekly-pool order, then any other scored player by id.
    /// Starters are included too, so a player dropped after the week still
    /// counts.
    pub fn from_entry(entry: &MatchupEntry, directory: &PlayerDirectory) -> Self {
        let ids = entry
            .players
            .iter()
            .chain(entry.starters.iter())
            .chain(entry.points.keys());

        let candidates = ids.filter_map(|id| {
            let points = *entry.points.get(id)?;
            let Some(info) = directory.get(id) else {
                debug!("player {id} missing from directory, left out of pool");
                return None;
            };
            Some(Candidate {
                player_id: id.clone(),
                position: info.position,
                eligible: info.eligible.clone(),
                points: if points.is_finite() { points } else { 0.0 },
            })
        });
        CandidatePool::new(candidates)
    }

    pub fn get(&self, player_id: &str) -> Option<&Candidate> {
        self.index.get(player_id).map(|&i| &self.candidates[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Candidate> {
        self.candidates.iter()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tallies
// ---------------------------------------------------------------------------

/// Points split into overall, offense, and defense.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PointSplit {
    pub total: f64,
    pub offense: f64,
    pub defense: f64,
}

impl PointSplit {
    pub fn add(&mut self, pos: Position, points: f64) {
        self.total += points;
        if pos.is_offense() {
            self.offense += points;
        } else {
            self.defense += points;
        }
    }

    pub fn accumulate(&mut self, other: &PointSplit) {
        self.total += other.total;
        self.offense += other.offense;
        self.defense += other.defense;
    }
}

/// Summed points and the number of contributions behind them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Tally {
    pub points: f64,
    pub count: u32,
}

impl Tally {
    pub fn add(&mut self, points: f64) {
        self.points += points;
        self.count += 1;
    }

    pub fn accumulate(&mut self, other: &Tally) {
        self.points += other.points;
        self.count += other.count;
    }

    /// Points per contribution, zero when there were none.
    pub fn average(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.points / f64::from(self.count)
        }
    }
}

/// Lineup efficiency as a percentage. Zero when there was nothing to score.
pub fn management_percent(actual: f64, optimal: f64) -> f64 {
    if optimal > 0.0 {
        (actual / optimal * 100.0).max(0.0)
    } else {
        0.0
    }
}

// ---------------------------------------------------------------------------
// Lineup outcomes
// ---------------------------------------------------------------------------

/// One filled slot.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub slot_index: usize,
    pub player_id: String,
    pub credited: Position,
    pub points: f64,
}

/// Result of filling a lineup, either as started or as the greedy optimum.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineupOutcome {
    pub points: PointSplit,
    pub by_position: BTreeMap<Position, Tally>,
    pub by_slot: BTreeMap<String, Tally>,
    /// Filled slots, ordered by slot index.
    pub assignments: Vec<Assignment>,
}

impl LineupOutcome {
    fn record(&mut self, slot_index: usize, slot: &Slot, candidate: &Candidate) {
        let credited = candidate.credited_for(slot);
        self.points.add(credited, candidate.points);
        self.by_position
            .entry(credited)
            .or_default()
            .add(candidate.points);
        self.by_slot
            .entry(slot.label())
            .or_default()
            .add(candidate.points);
        self.assignments.push(Assignment {
            slot_index,
            player_id: candidate.player_id.clone(),
            credited,
            points: candidate.points,
        });
    }

    fn finish(mut self) -> Self {
        self.assignments.sort_by_key(|a| a.slot_index);
        self
    }
}

/// Score the lineup a team actually started.
///
/// With one starter per slot, starters pair with slots positionally.
/// Otherwise each starter takes the first open slot it is eligible for,
/// trying strict slots before flex slots. Empty markers and starters
/// without a recorded score contribute nothing.
pub fn evaluate_actual(slots: &[Slot], starters: &[String], pool: &CandidatePool) -> LineupOutcome {
    let mut outcome = LineupOutcome::default();

    if starters.len() == slots.len() {
        for (idx, (slot, id)) in slots.iter().zip(starters).enumerate() {
            if is_empty_starter(id) {
                continue;
            }
            if let Some(candidate) = pool.get(id) {
                outcome.record(idx, slot, candidate);
            }
        }
        return outcome.finish();
    }

    debug!(
        "starter count {} differs from slot count {}, matching by eligibility",
        starters.len(),
        slots.len()
    );
    let mut filled = vec![false; slots.len()];
    for id in starters.iter().filter(|id| !is_empty_starter(id)) {
        let Some(candidate) = pool.get(id) else {
            continue;
        };
        match first_open_slot(slots, &filled, candidate) {
            Some(idx) => {
                filled[idx] = true;
                outcome.record(idx, &slots[idx], candidate);
            }
            None => debug!("starter {id} fits no open slot, not counted"),
        }
    }
    outcome.finish()
}

fn first_open_slot(slots: &[Slot], filled: &[bool], candidate: &Candidate) -> Option<usize> {
    let open = |strict: bool| {
        slots
            .iter()
            .enumerate()
            .find(|(i, s)| !filled[*i] && s.is_strict() == strict && candidate.is_eligible_for(s))
            .map(|(i, _)| i)
    };
    open(true).or_else(|| open(false))
}

/// Slot indices in greedy fill order: strict slots first, then flex kinds,
/// each group in declared order.
pub fn greedy_slot_order(slots: &[Slot]) -> Vec<usize> {
    let (strict, flex): (Vec<usize>, Vec<usize>) =
        (0..slots.len()).partition(|&i| slots[i].is_strict());
    strict.into_iter().chain(flex).collect()
}

/// Fill the lineup greedily: for each slot in [`greedy_slot_order`], take the
/// highest-scoring unused eligible candidate. This is a heuristic, not a
/// maximum-weight matching; a slot with nobody eligible stays empty.
pub fn evaluate_optimal(slots: &[Slot], pool: &CandidatePool) -> LineupOutcome {
    let mut outcome = LineupOutcome::default();
    let mut used = vec![false; pool.len()];

    for idx in greedy_slot_order(slots) {
        let slot = &slots[idx];
        let mut best: Option<(usize, &Candidate)> = None;
        for (ci, candidate) in pool.iter().enumerate() {
            if used[ci] || !candidate.is_eligible_for(slot) {
                continue;
            }
            if best.map_or(true, |(_, b)| candidate.points > b.points) {
                best = Some((ci, candidate));
            }
        }
        if let Some((ci, candidate)) = best {
            used[ci] = true;
            outcome.record(idx, slot, candidate);
        }
    }
    outcome.finish()
}

// ---------------------------------------------------------------------------
// Weekly team result
// ---------------------------------------------------------------------------

/// Evaluated lineup history for one team in one week. Never mutated once
/// produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyTeamResult {
    pub season: u32,
    pub week: u32,
    pub roster_id: u32,
    pub matchup_id: Option<u32>,
    pub actual: PointSplit,
    pub optimal: PointSplit,
    pub actual_by_position: BTreeMap<Position, Tally>,
    pub optimal_by_position: BTreeMap<Position, Tally>,
    /// Actual starts keyed by slot label.
    pub actual_by_slot: BTreeMap<String, Tally>,
}

impl WeeklyTeamResult {
    pub fn management_percent(&self) -> f64 {
        management_percent(self.actual.total, self.optimal.total)
    }

    pub fn offense_management_percent(&self) -> f64 {
        management_percent(self.actual.offense, self.optimal.offense)
    }

    pub fn defense_management_percent(&self) -> f64 {
        management_percent(self.actual.defense, self.optimal.defense)
    }
}

/// Evaluate one team's week from its matchup entry.
pub fn evaluate_team_week(
    season: u32,
    week: u32,
    slots: &[Slot],
    entry: &MatchupEntry,
    directory: &PlayerDirectory,
) -> WeeklyTeamResult {
    let pool = CandidatePool::from_entry(entry, directory);
    let actual = evaluate_actual(slots, &entry.starters, &pool);
    let optimal = evaluate_optimal(slots, &pool);

    WeeklyTeamResult {
        season,
        week,
        roster_id: entry.roster_id,
        matchup_id: entry.matchup_id,
        actual: actual.points,
        optimal: optimal.points,
        actual_by_position: actual.by_position,
        optimal_by_position: optimal.by_position,
        actual_by_slot: actual.by_slot,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
