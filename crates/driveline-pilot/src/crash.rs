use driveline_core::{AgentId, SkillTier};
use tracing::trace;

use crate::route::RoutePlan;
use crate::world::WorldSnapshot;

/// Hard cap on forward samples so a bad speed value cannot hang the scan.
const MAX_FORECAST_STEPS: u32 = 1000;

/// Extra samples past the speed-derived horizon.
const FORECAST_MARGIN_STEPS: u32 = 5;

/// First predicted collision along the current velocity direction.
///
/// At most one rival and one boundary node; rebuilt from scratch every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrashReport<A: AgentId> {
    /// Rival we are about to run into, first match wins.
    pub rival: Option<A>,
    /// Last on-route node before the projected position leaves the corridor.
    pub boundary: Option<usize>,
}

impl<A: AgentId> Default for CrashReport<A> {
    fn default() -> Self {
        Self {
            rival: None,
            boundary: None,
        }
    }
}

impl<A: AgentId> CrashReport<A> {
    pub fn any(&self) -> bool {
        self.rival.is_some() || self.boundary.is_some()
    }
}

/// Steps along the velocity direction in kart-length increments and reports
/// the first predicted rival or boundary collision.
///
/// Rivals already strictly faster in our forward direction are skipped; they
/// are outrunning the collision. The corridor test walks the cached
/// lookahead chain, so a branch taken by the route is honored. The scan
/// stops entirely at the first off-corridor step.
pub fn predict_crash<A: AgentId>(
    snap: &WorldSnapshot<'_, A>,
    route: &RoutePlan,
    current_node: usize,
    tier: &SkillTier,
) -> CrashReport<A> {
    let mut report = CrashReport::default();

    // Drafting override: a charged slipstream is an intentional
    // "crash into and overtake" signal, not a hazard.
    if tier.use_slipstream && snap.status.slipstream_ready {
        if let Some(target) = snap.status.slipstream_target {
            report.rival = Some(target);
        }
    }

    let kart_length = snap.spec.length.max(f32::EPSILON);
    let speed = snap.me.speed.max(0.0);
    let dir = if snap.me.velocity.length_squared() > f32::EPSILON {
        snap.me.velocity.normalized_or_zero()
    } else {
        snap.forward()
    };

    let steps = ((speed / kart_length) as u32)
        .max(tier.min_forecast_steps)
        .saturating_add(FORECAST_MARGIN_STEPS)
        .min(MAX_FORECAST_STEPS);

    // Seconds to cover one kart length at current speed; rivals are
    // extrapolated by the same wall-clock horizon as each sample.
    let step_seconds = if speed > f32::EPSILON {
        kart_length / speed
    } else {
        0.0
    };

    let mut node = current_node;
    for step in 1..=steps {
        let pos = snap.me.position + dir * (step as f32 * kart_length);

        if report.rival.is_none() && step_seconds > 0.0 {
            let t = step as f32 * step_seconds;
            for rival in snap.rivals {
                if rival.id == snap.me.id || rival.eliminated || rival.finished {
                    continue;
                }
                if rival.velocity.dot(dir) > speed {
                    continue;
                }
                let rival_pos = rival.position + rival.velocity * t;
                if pos.distance(rival_pos) < kart_length {
                    trace!(step, rival = ?rival.id, "rival collision predicted");
                    report.rival = Some(rival.id);
                    break;
                }
            }
        }

        match snap.graph.find_node(pos, Some(node), Some(route.lookahead(node))) {
            Some(n) => node = n,
            None => {
                trace!(step, node, "boundary collision predicted");
                report.boundary = Some(node);
                // Off the corridor; everything past this point is unreachable.
                break;
            }
        }
    }

    report
}
