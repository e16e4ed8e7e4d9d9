use core::f32::consts::PI;

use driveline_core::AgentId;
use driveline_track::{normalize_angle, TrackDirection, Vec2};

use crate::route::RoutePlan;
use crate::world::WorldSnapshot;

/// Sentinel radius meaning "no braking needed".
pub const NO_CURVE_RADIUS: f32 = 1.0e4;

/// Heading deviation from the track direction above which the curve ahead is
/// treated as undefined (0.22222 * pi, a bit under 40 degrees).
const MAX_TRACK_ANGLE_DEVIATION: f32 = 0.22222 * PI;

/// Per-tick estimate of the curve ahead: classification, turn radius, the
/// segment's last node, and the total heading change over the segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveEstimate {
    pub direction: TrackDirection,
    pub radius: f32,
    pub last_node: usize,
    /// Absolute heading change from segment entry to exit, radians.
    pub arc_angle: f32,
}

impl CurveEstimate {
    pub fn undefined(node: usize) -> Self {
        Self {
            direction: TrackDirection::Undefined,
            radius: NO_CURVE_RADIUS,
            last_node: node,
            arc_angle: 0.0,
        }
    }
}

/// Classifies the track ahead and estimates its turn radius.
///
/// When the kart's heading has diverged too far from the track direction the
/// estimate is undefined; the governor then brakes back onto the road
/// instead of trusting a radius.
pub fn estimate_curve<A: AgentId>(
    snap: &WorldSnapshot<'_, A>,
    route: &RoutePlan,
    current_node: usize,
) -> CurveEstimate {
    let graph = snap.graph;
    let Some(succ_idx) = route.successor_index(current_node) else {
        return CurveEstimate::undefined(current_node);
    };
    let Some(track_angle) = graph.node(current_node).angle_to_next(succ_idx) else {
        return CurveEstimate::undefined(current_node);
    };

    let heading = if snap.me.velocity.length_squared() > f32::EPSILON {
        snap.me.velocity.angle()
    } else {
        snap.me.heading
    };
    if normalize_angle(track_angle - heading).abs() > MAX_TRACK_ANGLE_DEVIATION {
        return CurveEstimate::undefined(current_node);
    }

    let Some(data) = graph.node(current_node).direction(succ_idx) else {
        return CurveEstimate::undefined(current_node);
    };

    // Two forward route corners for the parabola fit: the next node and the
    // last node of the segment (or one past it when they coincide).
    let Some(next) = route.next_node(current_node) else {
        return CurveEstimate::undefined(current_node);
    };
    let p1 = graph.node(next).center();
    let far_node = if data.last_node != next {
        data.last_node
    } else {
        route.next_node(next).unwrap_or(next)
    };
    let p2 = graph.node(far_node).center();

    let radius = if data.direction == TrackDirection::Straight {
        NO_CURVE_RADIUS
    } else {
        determine_turn_radius(snap.me.position, heading, p1, p2)
    };

    let arc_angle = exit_angle(snap, route, data.last_node)
        .map_or(0.0, |exit| normalize_angle(exit - track_angle).abs());

    CurveEstimate {
        direction: data.direction,
        radius,
        last_node: data.last_node,
        arc_angle,
    }
}

fn exit_angle<A: AgentId>(
    snap: &WorldSnapshot<'_, A>,
    route: &RoutePlan,
    node: usize,
) -> Option<f32> {
    let idx = route.successor_index(node)?;
    snap.graph.node(node).angle_to_next(idx)
}

/// Fits a parabola through three points in the kart's local frame and
/// returns the radius of curvature at the kart.
///
/// The frame puts the kart at the origin with +x forward; the fit solves
/// `lateral = a*x^2 + b*x + c` and evaluates `(1 + b^2)^1.5 / |2a|` at the
/// origin. Collinear or otherwise degenerate inputs return the
/// [`NO_CURVE_RADIUS`] sentinel rather than NaN.
pub fn determine_turn_radius(position: Vec2, heading: f32, p1: Vec2, p2: Vec2) -> f32 {
    let fwd = Vec2::new(heading.cos(), heading.sin());
    let side = fwd.perp();

    let to_local = |p: Vec2| -> Vec2 {
        let d = p - position;
        Vec2::new(d.dot(fwd), d.dot(side))
    };

    // Three samples: the kart itself (origin) and two route corners.
    let q0 = Vec2::ZERO;
    let q1 = to_local(p1);
    let q2 = to_local(p2);

    // Solve the 3x3 system for a, b, c by Cramer's rule.
    let (x0, y0) = (q0.x, q0.y);
    let (x1, y1) = (q1.x, q1.y);
    let (x2, y2) = (q2.x, q2.y);

    let det = x0 * x0 * (x1 - x2) - x0 * (x1 * x1 - x2 * x2) + (x1 * x1 * x2 - x1 * x2 * x2);
    if det.abs() <= 1e-6 {
        return NO_CURVE_RADIUS;
    }
    let det_a = y0 * (x1 - x2) - x0 * (y1 - y2) + (y1 * x2 - x1 * y2);
    let det_b = x0 * x0 * (y1 - y2) - y0 * (x1 * x1 - x2 * x2) + (x1 * x1 * y2 - y1 * x2 * x2);
    let a = det_a / det;
    let b = det_b / det;

    if a.abs() <= 1e-6 {
        return NO_CURVE_RADIUS;
    }
    let radius = (1.0 + b * b).powf(1.5) / (2.0 * a).abs();
    radius.min(NO_CURVE_RADIUS)
}
