// Canonical football positions and normalization of vendor position tokens.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of positions every player score is credited to.
///
/// Ordering follows the usual lineup card order (offense first), which keeps
/// every position-keyed map in a stable, readable order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Position {
    QB,
    RB,
    WR,
    TE,
    K,
    DL,
    LB,
    DB,
}

impl Position {
    pub const ALL: [Position; 8] = [
        Position::QB,
        Position::RB,
        Position::WR,
        Position::TE,
        Position::K,
        Position::DL,
        Position::LB,
        Position::DB,
    ];

    /// Normalize a raw position string to a canonical position.
    ///
    /// Case-insensitive and whitespace-tolerant. Returns `None` for anything
    /// that is not a player position, including team-defense and IDP slot
    /// tokens ("DEF", "DST", "DP", "IDP"), which only have meaning as slots.
    pub fn normalize(raw: &str) -> Option<Self> {
        match raw.trim().to_uppercase().as_str() {
            "QB" => Some(Position::QB),
            "RB" | "HB" | "FB" => Some(Position::RB),
            "WR" => Some(Position::WR),
            "TE" => Some(Position::TE),
            "K" | "PK" => Some(Position::K),
            "DL" | "DE" | "DT" | "NT" | "EDGE" => Some(Position::DL),
            "LB" | "ILB" | "OLB" | "MLB" => Some(Position::LB),
            "DB" | "CB" | "S" | "SS" | "FS" => Some(Position::DB),
            _ => None,
        }
    }

    /// Return the canonical token for this position.
    pub fn as_str(&self) -> &'static str {
        match self {
            Position::QB => "QB",
            Position::RB => "RB",
            Position::WR => "WR",
            Position::TE => "TE",
            Position::K => "K",
            Position::DL => "DL",
            Position::LB => "LB",
            Position::DB => "DB",
        }
    }

    /// Offensive positions, kickers included.
    pub fn is_offense(&self) -> bool {
        matches!(
            self,
            Position::QB | Position::RB | Position::WR | Position::TE | Position::K
        )
    }

    /// Individual defensive player positions.
    pub fn is_defense(&self) -> bool {
        !self.is_offense()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Normalize a player's primary position and alternates into an ordered,
/// de-duplicated eligibility list (primary first). Unknown tokens are dropped.
pub fn eligible_positions(primary: &str, alternates: &[String]) -> Vec<Position> {
    let mut out: Vec<Position> = Vec::with_capacity(alternates.len() + 1);
    let tokens = std::iter::once(primary).chain(alternates.iter().map(String::as_str));
    for pos in tokens.filter_map(Position::normalize) {
        if !out.contains(&pos) {
            out.push(pos);
        }
    }
    out
}
