//! Deterministic foundation types for the racing AI decision engine.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod agent;
pub mod controls;
pub mod rng;
pub mod skill;
pub mod tick;

pub use agent::AgentId;
pub use controls::{Controls, SkidCommand};
pub use rng::{DeterministicRng, SplitMix64};
pub use skill::{ItemUsage, NitroUsage, ProbabilityCurve, SkillTier};
pub use tick::TickContext;
