use driveline_core::AgentId;
use driveline_track::math::{cross, normalize_angle};
use driveline_track::Vec2;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::route::RoutePlan;
use crate::world::WorldSnapshot;

/// Upper bound on nodes walked by either algorithm. Hitting it is a normal
/// termination on degenerate graphs, not an error.
const MAX_NODE_WALK: usize = 100;

/// Heading change between consecutive route segments above which the walk
/// stops and aims at the near node (roughly 86 degrees; prevents aiming
/// through a hairpin).
const HAIRPIN_ANGLE: f32 = 1.5;

/// Which aim-point algorithm an agent uses.
///
/// The two disagree near sharp corners: edge projection cuts corners more
/// aggressively, the bounded corridor stays conservative. Both are kept
/// selectable per agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AimStrategy {
    #[default]
    EdgeProjection,
    BoundedCorridor,
}

/// Point the steering controller should drive toward, plus the node it
/// belongs to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AimTarget {
    pub point: Vec2,
    pub node: usize,
}

/// Furthest point reachable in a straight line without leaving the drivable
/// corridor, starting from the route node after `current_node`.
pub fn find_non_crashing_point<A: AgentId>(
    snap: &WorldSnapshot<'_, A>,
    route: &RoutePlan,
    current_node: usize,
    strategy: AimStrategy,
) -> Option<AimTarget> {
    let start = route.next_node(current_node)?;
    Some(match strategy {
        AimStrategy::EdgeProjection => edge_projection(snap, route, start),
        AimStrategy::BoundedCorridor => bounded_corridor(snap, route, start),
    })
}

/// Walks the route sampling the straight line to each candidate node's
/// center at kart-length intervals; the first sample whose lateral offset
/// plus half the kart width leaves the candidate's half-width marks the
/// previous node as the aim node.
fn edge_projection<A: AgentId>(
    snap: &WorldSnapshot<'_, A>,
    route: &RoutePlan,
    start: usize,
) -> AimTarget {
    let graph = snap.graph;
    let kart_length = snap.spec.length.max(f32::EPSILON);
    let half_kart_width = snap.spec.width * 0.5;

    let mut last = start;
    for _ in 0..MAX_NODE_WALK {
        let Some(target) = route.next_node(last) else {
            break;
        };

        // Sharp heading change ahead: aim at the near node's center rather
        // than projecting a line through the hairpin.
        if let (Some(si_last), Some(si_target)) =
            (route.successor_index(last), route.successor_index(target))
        {
            if let (Some(a0), Some(a1)) = (
                graph.node(last).angle_to_next(si_last),
                graph.node(target).angle_to_next(si_target),
            ) {
                if normalize_angle(a1 - a0).abs() > HAIRPIN_ANGLE {
                    return AimTarget {
                        point: graph.node(target).center(),
                        node: target,
                    };
                }
            }
        }

        let center = graph.node(target).center();
        let to_center = center - snap.me.position;
        let dist = to_center.length();
        let dir = to_center.normalized_or_zero();
        let steps = ((dist / kart_length) as usize).clamp(3, 1000);

        let mut off_corridor = false;
        for i in 2..steps {
            let sample = snap.me.position + dir * (i as f32 * kart_length);
            let coords = graph.spatial_to_track(sample, target);
            if coords.lateral.abs() + half_kart_width > graph.node(target).half_width() {
                off_corridor = true;
                break;
            }
        }
        if off_corridor {
            break;
        }
        last = target;
    }

    AimTarget {
        point: graph.node(last).center(),
        node: last,
    }
}

/// Narrows a left/right ray pair against successive node boundary points and
/// returns the center of the last node still inside the corridor.
fn bounded_corridor<A: AgentId>(
    snap: &WorldSnapshot<'_, A>,
    route: &RoutePlan,
    start: usize,
) -> AimTarget {
    let graph = snap.graph;
    let origin = snap.me.position;

    let mut left = graph.node(start).left() - origin;
    let mut right = graph.node(start).right() - origin;
    let mut last = start;

    for _ in 0..MAX_NODE_WALK {
        let Some(next) = route.next_node(last) else {
            break;
        };
        let cand_left = graph.node(next).left() - origin;
        let cand_right = graph.node(next).right() - origin;

        // A candidate crossing the opposite ray means the corridor has
        // pinched shut; stop at the last node.
        if cross(right, cand_left) < 0.0 || cross(left, cand_right) > 0.0 {
            break;
        }

        // Tighten each ray when the new boundary point lies inside it.
        if cross(left, cand_left) < 0.0 {
            left = cand_left;
        }
        if cross(right, cand_right) > 0.0 {
            right = cand_right;
        }
        last = next;
    }

    AimTarget {
        point: graph.node(last).center(),
        node: last,
    }
}
