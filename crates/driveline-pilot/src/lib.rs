//! Per-tick driving decision engine.
//!
//! Everything here is a synchronous function of (own state, read-only track
//! graph, read-only snapshot of rivals and items). No look-ahead search over
//! future ticks: the engine projects forward geometrically, scores
//! heuristically, and emits one [`Controls`](driveline_core::Controls) per
//! tick.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod aim;
pub mod crash;
pub mod curve;
pub mod items;
pub mod observer;
pub mod pilot;
pub mod route;
pub mod speed;
pub mod steering;
pub mod world;

pub use aim::{AimStrategy, AimTarget};
pub use crash::CrashReport;
pub use curve::CurveEstimate;
pub use items::{ItemDecision, ItemStrategist};
pub use observer::{NullObserver, PilotObserver};
pub use pilot::{Pilot, PilotConfig};
pub use route::RoutePlan;
pub use world::{
    Attachment, ItemKind, ItemSnapshot, KartSpec, KartState, KartStatus, Powerup, RaceState,
    WorldSnapshot,
};
