use driveline_core::AgentId;

use crate::aim::AimTarget;
use crate::crash::CrashReport;
use crate::curve::CurveEstimate;

/// Debug/visualization hook injected into the pilot.
///
/// The engine's logic never depends on an observer doing anything; every
/// method defaults to a no-op so tests and headless runs use
/// [`NullObserver`].
pub trait PilotObserver<A: AgentId> {
    fn route_computed(&mut self, _agent: A, _lap: u32) {}
    fn node_located(&mut self, _agent: A, _node: usize, _off_road: bool) {}
    fn crash_predicted(&mut self, _agent: A, _report: &CrashReport<A>) {}
    fn aim_selected(&mut self, _agent: A, _target: &AimTarget) {}
    fn curve_estimated(&mut self, _agent: A, _curve: &CurveEstimate) {}
    fn item_committed(&mut self, _agent: A, _item: Option<u64>) {}
    fn rescue_requested(&mut self, _agent: A) {}
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl<A: AgentId> PilotObserver<A> for NullObserver {}
