use driveline_core::{DeterministicRng, SkidCommand, SkillTier, SplitMix64};
use driveline_track::{normalize_angle, TrackDirection, Vec2};
use tracing::debug;

use crate::curve::CurveEstimate;
use crate::world::KartSpec;

/// Minimum speed below which skidding never pays off.
const MIN_SKID_SPEED: f32 = 5.0;

/// Minimum worthwhile remaining curve duration, seconds.
const MIN_SKID_DURATION: f32 = 1.0;

/// Heading deviation against the curve direction that cancels a skid.
const WRONG_DIRECTION_SLACK: f32 = 0.2;

/// Steering clamp while a plunger blocks the view.
const BLOCKED_VIEW_STEER_CAP: f32 = 0.5;

/// Per-curve-segment skid decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SkidState {
    NotYetDecided,
    Skid,
    NoSkid,
}

/// Converts aim points into bounded, rate-limited steering and decides when
/// a controlled skid is worth it.
///
/// The skid decision is made once per continuous curve segment (identified
/// by the segment's last node) and held until the segment changes; per-tick
/// vetoes can suppress the skid without re-rolling the dice.
#[derive(Debug, Clone)]
pub struct SteerController {
    rng: SplitMix64,
    current_steer: f32,
    skid_state: SkidState,
    skid_segment: Option<usize>,
}

impl SteerController {
    pub fn new(rng: SplitMix64) -> Self {
        Self {
            rng,
            current_steer: 0.0,
            skid_state: SkidState::NotYetDecided,
            skid_segment: None,
        }
    }

    pub fn reset(&mut self) {
        self.current_steer = 0.0;
        self.skid_state = SkidState::NotYetDecided;
        self.skid_segment = None;
    }

    /// Steering angle (radians) needed to drive through `point`, computed on
    /// the kart's turning circle.
    ///
    /// Positive is left. A point more sideways than forward returns an
    /// oversteer angle past the physical maximum so the caller can translate
    /// it into a skid.
    pub fn steer_to_point(&self, position: Vec2, heading: f32, spec: &KartSpec, point: Vec2) -> f32 {
        let fwd = Vec2::new(heading.cos(), heading.sin());
        let d = point - position;
        let forward = d.dot(fwd);
        let lateral = driveline_track::math::cross(fwd, d);

        if lateral.abs() <= f32::EPSILON {
            return 0.0;
        }
        if lateral.abs() > forward.abs() {
            return lateral.signum() * spec.max_steer_angle * 2.0;
        }

        // Turning circle through the kart and the point.
        let radius = (lateral * lateral + forward * forward) / (2.0 * lateral.abs());
        let sin_steer = spec.wheel_base / radius;
        if sin_steer >= 1.0 {
            return lateral.signum() * spec.max_steer_angle * 2.0;
        }
        // Overshoot the geometric angle; the physics understeers.
        lateral.signum() * sin_steer.asin() * 2.0
    }

    /// Steering angle toward an absolute heading.
    pub fn steer_to_angle(&self, heading: f32, target_angle: f32) -> f32 {
        normalize_angle(target_angle - heading)
    }

    /// Turns a raw steering angle into the final `(fraction, skid)` output:
    /// skid decision, blocked-view clamp, `[-1, 1]` clamp, and the per-tick
    /// rate limit.
    #[allow(clippy::too_many_arguments)]
    pub fn finish(
        &mut self,
        angle: f32,
        spec: &KartSpec,
        tier: &SkillTier,
        curve: &CurveEstimate,
        speed: f32,
        heading_vs_track: f32,
        distance_to_player: f32,
        blocked_view: bool,
        dt: f32,
    ) -> (f32, SkidCommand) {
        let mut fraction = if spec.max_steer_angle > f32::EPSILON {
            angle / spec.max_steer_angle
        } else {
            0.0
        };

        let skid = self.decide_skid(fraction, tier, curve, speed, heading_vs_track, distance_to_player);

        if blocked_view {
            fraction = fraction.clamp(-BLOCKED_VIEW_STEER_CAP, BLOCKED_VIEW_STEER_CAP);
        }
        fraction = fraction.clamp(-1.0, 1.0);

        // Wheels turn gradually: bounded change per tick.
        let max_change = if tier.time_full_steer > f32::EPSILON {
            dt / tier.time_full_steer
        } else {
            2.0
        };
        let delta = (fraction - self.current_steer).clamp(-max_change, max_change);
        self.current_steer += delta;

        (self.current_steer, skid)
    }

    fn decide_skid(
        &mut self,
        fraction: f32,
        tier: &SkillTier,
        curve: &CurveEstimate,
        speed: f32,
        heading_vs_track: f32,
        distance_to_player: f32,
    ) -> SkidCommand {
        if !curve.direction.is_curve() {
            self.skid_state = SkidState::NotYetDecided;
            self.skid_segment = None;
            return SkidCommand::None;
        }

        if self.skid_segment != Some(curve.last_node) {
            self.skid_segment = Some(curve.last_node);
            self.skid_state = SkidState::NotYetDecided;
        }
        if self.skid_state == SkidState::NotYetDecided {
            let p = tier.skid_probability.eval(distance_to_player);
            self.skid_state = if self.rng.chance(p) {
                SkidState::Skid
            } else {
                SkidState::NoSkid
            };
            debug!(segment = curve.last_node, skid = ?self.skid_state, "skid decided");
        }
        if self.skid_state != SkidState::Skid {
            return SkidCommand::None;
        }

        // Per-tick vetoes; the segment decision itself stands.
        if speed < MIN_SKID_SPEED {
            return SkidCommand::None;
        }
        let remaining = if speed > f32::EPSILON {
            curve.radius * curve.arc_angle / speed * 1.5
        } else {
            0.0
        };
        if remaining < MIN_SKID_DURATION {
            return SkidCommand::None;
        }

        let curve_sign = match curve.direction {
            TrackDirection::Left => 1.0,
            TrackDirection::Right => -1.0,
            _ => return SkidCommand::None,
        };
        // Momentarily steering against the curve: skidding now would throw
        // the kart the wrong way.
        if fraction * curve_sign < 0.0 {
            return SkidCommand::None;
        }
        if heading_vs_track * curve_sign < -WRONG_DIRECTION_SLACK {
            return SkidCommand::None;
        }

        match curve.direction {
            TrackDirection::Left => SkidCommand::Left,
            TrackDirection::Right => SkidCommand::Right,
            _ => SkidCommand::None,
        }
    }
}
