// Library root for the lineup engine. Pure computation, no I/O.

pub mod league;
pub mod lineup;
pub mod model;
pub mod roster;
pub mod stats;

/// Version of the lineup and aggregation rules. Stored aggregates derived
/// under an older version are rebuilt from raw data.
pub const RULE_VERSION: u32 = 1;
