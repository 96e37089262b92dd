// Starting-lineup slots and the label tables that classify them.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::position::Position;

// ---------------------------------------------------------------------------
// Eligibility sets
// ---------------------------------------------------------------------------

const OFFENSE_FLEX: &[Position] = &[Position::RB, Position::WR, Position::TE];
const SUPER_FLEX: &[Position] = &[Position::QB, Position::RB, Position::WR, Position::TE];
const DEFENSE_FLEX: &[Position] = &[Position::DL, Position::LB, Position::DB];

// ---------------------------------------------------------------------------
// Label tables
// ---------------------------------------------------------------------------

const OFFENSE_FLEX_LABELS: &[&str] = &["FLEX", "W/R/T", "WRT", "RB/WR/TE"];
const SUPER_FLEX_LABELS: &[&str] = &["SUPER_FLEX", "SUPERFLEX", "SFLEX", "OP", "Q/W/R/T"];
const DEFENSE_FLEX_LABELS: &[&str] = &["IDP_FLEX", "IDP", "DP", "DEF"];
const DUAL_LABELS: &[(&str, &[Position])] = &[
    ("REC_FLEX", &[Position::WR, Position::TE]),
    ("WRRB_FLEX", &[Position::RB, Position::WR]),
];

/// Labels that name reserve spots rather than starting slots.
const RESERVE_LABELS: &[&str] = &["BN", "BE", "BENCH", "IR", "RES", "TAXI"];

/// How a slot decides which positions may fill it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlotKind {
    Strict,
    OffenseFlex,
    SuperFlex,
    DefenseFlex,
    DualDesignation,
}

/// A resolved starting-lineup slot.
///
/// Built once by [`resolve_slot`]; everything downstream matches on the
/// variant instead of re-reading the label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Slot {
    Strict(Position),
    OffenseFlex,
    SuperFlex,
    DefenseFlex,
    /// An explicit 2-3 position combination, stored in canonical order.
    DualDesignation(Vec<Position>),
    /// Unrecognized label (uppercased). Strict over a token no canonical
    /// player position can match.
    Unknown(String),
}

impl Slot {
    pub fn kind(&self) -> SlotKind {
        match self {
            Slot::Strict(_) | Slot::Unknown(_) => SlotKind::Strict,
            Slot::OffenseFlex => SlotKind::OffenseFlex,
            Slot::SuperFlex => SlotKind::SuperFlex,
            Slot::DefenseFlex => SlotKind::DefenseFlex,
            Slot::DualDesignation(_) => SlotKind::DualDesignation,
        }
    }

    /// Canonical positions eligible for this slot. Empty only for `Unknown`.
    pub fn eligible(&self) -> &[Position] {
        match self {
            Slot::Strict(pos) => std::slice::from_ref(pos),
            Slot::OffenseFlex => OFFENSE_FLEX,
            Slot::SuperFlex => SUPER_FLEX,
            Slot::DefenseFlex => DEFENSE_FLEX,
            Slot::DualDesignation(positions) => positions,
            Slot::Unknown(_) => &[],
        }
    }

    pub fn accepts(&self, pos: Position) -> bool {
        self.eligible().contains(&pos)
    }

    pub fn is_strict(&self) -> bool {
        self.kind() == SlotKind::Strict
    }

    /// Label used for per-slot statistics (e.g. "QB", "FLEX", "DL/LB").
    pub fn label(&self) -> String {
        match self {
            Slot::Strict(pos) => pos.as_str().to_string(),
            Slot::OffenseFlex => "FLEX".to_string(),
            Slot::SuperFlex => "SUPER_FLEX".to_string(),
            Slot::DefenseFlex => "IDP_FLEX".to_string(),
            Slot::DualDesignation(positions) => positions
                .iter()
                .map(Position::as_str)
                .collect::<Vec<_>>()
                .join("/"),
            Slot::Unknown(label) => label.clone(),
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Classify a raw slot label. Pure and total: unrecognized labels become
/// [`Slot::Unknown`] rather than an error.
pub fn resolve_slot(label: &str) -> Slot {
    let upper = label.trim().to_uppercase();
    let key = upper.as_str();

    if OFFENSE_FLEX_LABELS.contains(&key) {
        return Slot::OffenseFlex;
    }
    if SUPER_FLEX_LABELS.contains(&key) {
        return Slot::SuperFlex;
    }
    if DEFENSE_FLEX_LABELS.contains(&key) {
        return Slot::DefenseFlex;
    }
    if let Some((_, positions)) = DUAL_LABELS.iter().find(|(l, _)| *l == key) {
        return Slot::DualDesignation(positions.to_vec());
    }
    if key.contains("IDP") {
        return Slot::DefenseFlex;
    }
    if let Some(pos) = Position::normalize(key) {
        return Slot::Strict(pos);
    }
    if let Some(slot) = combination_slot(key) {
        return slot;
    }

    tracing::debug!("unrecognized slot label {upper:?}, treating as strict");
    Slot::Unknown(upper)
}

/// Parse labels like "DL_LB" or "WR/TE" into a combined slot. Returns `None`
/// unless every token is a distinct canonical position and there are 2-3,
/// or exactly the four superflex positions.
fn combination_slot(key: &str) -> Option<Slot> {
    let tokens: Vec<&str> = key
        .split(|c| matches!(c, '_' | '/' | '+' | '-'))
        .filter(|t| !t.is_empty())
        .collect();
    if !(2..=4).contains(&tokens.len()) {
        return None;
    }

    let mut positions = Vec::with_capacity(tokens.len());
    for token in tokens {
        let pos = Position::normalize(token)?;
        if positions.contains(&pos) {
            return None;
        }
        positions.push(pos);
    }
    positions.sort();

    let slot = if positions == SUPER_FLEX {
        Slot::SuperFlex
    } else if positions.len() > 3 {
        return None;
    } else if positions == OFFENSE_FLEX {
        Slot::OffenseFlex
    } else if positions == DEFENSE_FLEX {
        Slot::DefenseFlex
    } else {
        Slot::DualDesignation(positions)
    };
    Some(slot)
}

/// Whether a roster label is a bench/reserve spot rather than a starter.
pub fn is_reserve_label(label: &str) -> bool {
    RESERVE_LABELS.contains(&label.trim().to_uppercase().as_str())
}

/// Resolve a league's ordered roster labels into its starting slots,
/// dropping reserve labels and keeping the declared order.
pub fn starting_slots(labels: &[String]) -> Vec<Slot> {
    labels
        .iter()
        .filter(|l| !is_reserve_label(l))
        .map(|l| resolve_slot(l))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_labels_resolve_to_their_position() {
        assert_eq!(resolve_slot("QB"), Slot::Strict(Position::QB));
        assert_eq!(resolve_slot("k"), Slot::Strict(Position::K));
        assert_eq!(resolve_slot("DL"), Slot::Strict(Position::DL));
        assert_eq!(resolve_slot("DB").kind(), SlotKind::Strict);
    }

    #[test]
    fn flex_tables() {
        assert_eq!(resolve_slot("FLEX"), Slot::OffenseFlex);
        assert_eq!(resolve_slot("W/R/T"), Slot::OffenseFlex);
        assert_eq!(resolve_slot("SUPER_FLEX"), Slot::SuperFlex);
        assert_eq!(resolve_slot("op"), Slot::SuperFlex);
        assert_eq!(resolve_slot("IDP_FLEX"), Slot::DefenseFlex);
        assert_eq!(resolve_slot("DEF"), Slot::DefenseFlex);
        assert_eq!(resolve_slot("DP"), Slot::DefenseFlex);
    }

    #[test]
    fn any_idp_label_is_defense_flex() {
        assert_eq!(resolve_slot("IDP_WILDCARD"), Slot::DefenseFlex);
        assert_eq!(resolve_slot("my_idp"), Slot::DefenseFlex);
    }

    #[test]
    fn dual_designation_tables() {
        assert_eq!(
            resolve_slot("REC_FLEX"),
            Slot::DualDesignation(vec![Position::WR, Position::TE])
        );
        assert_eq!(
            resolve_slot("WRRB_FLEX"),
            Slot::DualDesignation(vec![Position::RB, Position::WR])
        );
    }

    #[test]
    fn combination_label_falls_back_to_dual_designation() {
        let slot = resolve_slot("DL_LB");
        assert_eq!(slot.kind(), SlotKind::DualDesignation);
        assert_eq!(slot.eligible(), &[Position::DL, Position::LB]);
    }

    #[test]
    fn combination_label_matching_flex_set_uses_flex_kind() {
        assert_eq!(resolve_slot("TE/WR/RB"), Slot::OffenseFlex);
        assert_eq!(resolve_slot("DB+LB+DL"), Slot::DefenseFlex);
    }

    #[test]
    fn spelled_out_superflex_combination() {
        assert_eq!(resolve_slot("QB/RB/WR/TE"), Slot::SuperFlex);
        assert_eq!(resolve_slot("QB_RB_WR_TE"), Slot::SuperFlex);
        assert_eq!(resolve_slot("RB/WR/TE/QB"), Slot::SuperFlex);
    }

    #[test]
    fn four_way_combination_other_than_superflex_is_unknown() {
        assert_eq!(
            resolve_slot("QB/RB/WR/K"),
            Slot::Unknown("QB/RB/WR/K".to_string())
        );
    }

    #[test]
    fn three_way_offense_combination() {
        let slot = resolve_slot("QB/WR/TE");
        assert_eq!(slot.kind(), SlotKind::DualDesignation);
        assert_eq!(slot.eligible(), &[Position::QB, Position::WR, Position::TE]);
    }

    #[test]
    fn nonsense_label_is_strict_unknown() {
        let slot = resolve_slot("zztop");
        assert_eq!(slot, Slot::Unknown("ZZTOP".to_string()));
        assert_eq!(slot.kind(), SlotKind::Strict);
        assert_eq!(slot.label(), "ZZTOP");
        assert!(Position::ALL.iter().all(|p| !slot.accepts(*p)));
    }

    #[test]
    fn repeated_tokens_are_not_a_combination() {
        assert_eq!(resolve_slot("RB_RB"), Slot::Unknown("RB_RB".to_string()));
    }

    #[test]
    fn eligibility_never_empty_for_known_kinds() {
        for label in ["QB", "FLEX", "SUPER_FLEX", "IDP_FLEX", "REC_FLEX", "LB_DB"] {
            assert!(!resolve_slot(label).eligible().is_empty(), "{label}");
        }
    }

    #[test]
    fn starting_slots_skips_reserve_labels() {
        let labels: Vec<String> = ["QB", "RB", "BN", "FLEX", "IR", "TAXI"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(
            starting_slots(&labels),
            vec![Slot::Strict(Position::QB), Slot::Strict(Position::RB), Slot::OffenseFlex]
        );
    }

    #[test]
    fn slot_labels() {
        assert_eq!(Slot::Strict(Position::WR).label(), "WR");
        assert_eq!(resolve_slot("LB_DB").label(), "LB/DB");
        assert_eq!(Slot::SuperFlex.to_string(), "SUPER_FLEX");
    }
}
