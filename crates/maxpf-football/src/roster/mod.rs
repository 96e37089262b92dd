// Positions, lineup slots, and the crediting rule that ties them together.

pub mod credit;
pub mod position;
pub mod slot;

pub use credit::credited_position;
pub use position::Position;
pub use slot::{resolve_slot, Slot, SlotKind};
