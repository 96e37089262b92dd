// Credited-position rule: which canonical position a started player's
// points count toward. Both the actual and optimal lineup paths call this.

use super::position::Position;
use super::slot::Slot;

/// Return the position a player's score is attributed to when they fill
/// `slot`.
///
/// - Strict slots credit the slot's own position, not the player's base
///   position, so a miscategorized player counts where the league used them.
/// - Flex-kind slots credit the first of the player's eligible positions
///   (primary first) that the slot accepts, falling back to `base`.
/// - Unknown slots have no canonical position and credit `base`.
pub fn credited_position(slot: &Slot, eligible: &[Position], base: Position) -> Position {
    match slot {
        Slot::Strict(pos) => *pos,
        Slot::Unknown(_) => base,
        Slot::OffenseFlex | Slot::SuperFlex | Slot::DefenseFlex | Slot::DualDesignation(_) => {
            eligible
                .iter()
                .copied()
                .find(|p| slot.accepts(*p))
                .unwrap_or(base)
        }
    }
}
