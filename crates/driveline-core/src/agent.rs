use core::fmt::Debug;

/// Stable identity of one racer for the duration of a race.
///
/// The engine keeps no roster; karts are told apart purely by this id.
/// Deterministic replay leans on two properties:
///
/// - equality is how a pilot recognizes itself in the rival list, so the id
///   must not change between ticks
/// - [`stable_id`](AgentId::stable_id) seeds the per-racer RNG streams (see
///   [`tick::streams`](crate::tick::streams)), so the same id under the same
///   global seed must reproduce the same driving
pub trait AgentId: Copy + Eq + Debug {
    /// Numeric form of the id, used for RNG stream derivation and log
    /// fields. Must be unique within a race.
    fn stable_id(self) -> u64;
}

impl AgentId for u64 {
    fn stable_id(self) -> u64 {
        self
    }
}

impl AgentId for u32 {
    fn stable_id(self) -> u64 {
        self as u64
    }
}

impl AgentId for usize {
    fn stable_id(self) -> u64 {
        self as u64
    }
}
