use crate::{rng, AgentId, SplitMix64};

/// RNG stream identifiers used by the decision engine.
///
/// Keeping the streams separate means one subsystem drawing an extra value
/// cannot perturb another subsystem's sequence.
pub mod streams {
    pub const ROUTE: u64 = 0;
    pub const SKID: u64 = 1;
    pub const ITEMS: u64 = 2;
    pub const START: u64 = 3;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickContext {
    pub tick: u64,
    pub dt_seconds: f32,
    pub seed: u64,
}

impl TickContext {
    pub fn rng_for_agent<A: AgentId>(&self, agent: A, stream: u64) -> SplitMix64 {
        let seed = rng::derive_seed(self.seed, agent.stable_id(), stream);
        SplitMix64::new(seed)
    }
}
