#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Piecewise-linear curve over a scalar input (usually distance to the
/// nearest human player), clamped at both ends.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ProbabilityCurve {
    /// `(input, output)` points sorted by input.
    points: Vec<(f32, f32)>,
}

impl ProbabilityCurve {
    /// Builds a curve from `(input, output)` points. Points are sorted by
    /// input; an empty list evaluates to 0.
    pub fn new(mut points: Vec<(f32, f32)>) -> Self {
        points.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self { points }
    }

    pub fn constant(value: f32) -> Self {
        Self {
            points: vec![(0.0, value)],
        }
    }

    pub fn eval(&self, x: f32) -> f32 {
        let Some(first) = self.points.first() else {
            return 0.0;
        };
        if x <= first.0 {
            return first.1;
        }
        for pair in self.points.windows(2) {
            let (x0, y0) = pair[0];
            let (x1, y1) = pair[1];
            if x <= x1 {
                let t = if x1 > x0 { (x - x0) / (x1 - x0) } else { 0.0 };
                return y0 + t * (y1 - y0);
            }
        }
        // Past the last point.
        self.points[self.points.len() - 1].1
    }
}

/// How a tier decides when to fire a held consumable.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ItemUsage {
    /// Fire on a fixed timer after pickup, ignoring geometry.
    Timed { after_seconds: f32 },
    /// Fire based on rival distance/angle windows.
    Calculated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum NitroUsage {
    None,
    Some,
    All,
}

/// Tunable thresholds and probabilities for one difficulty tier.
///
/// Per-tier behavior differences are data, not code: every component of the
/// engine reads its knobs from here.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SkillTier {
    /// Seconds to move the wheel from straight to full lock. The per-tick
    /// steering rate limit is `dt / time_full_steer`.
    pub time_full_steer: f32,

    /// Whether this tier adjusts its aim for items at all.
    pub collect_avoid_items: bool,
    /// Max angle (radians) off the aim direction at which an item is still
    /// worth collecting.
    pub max_item_angle: f32,
    /// Looser bound used at high speed or with a skid bonus ready.
    pub max_item_angle_high_speed: f32,
    /// Squared distance below which an avoid-item cancels a collect
    /// commitment.
    pub bad_item_closeness_squared: f32,
    /// Chance to go for a beneficial item, by distance to the nearest player.
    pub collect_probability: ProbabilityCurve,

    pub item_usage: ItemUsage,
    /// Radius within which an incoming projectile triggers a shield.
    pub shield_incoming_radius: f32,
    /// Whether this tier tries to pass a bomb attachment on to rivals.
    pub handle_bomb: bool,

    pub nitro_usage: NitroUsage,
    /// Whether a ready slipstream bonus is spent as an overtake signal.
    pub use_slipstream: bool,
    /// Minimum straight length ahead before a zipper is used.
    pub straight_length_for_zipper: f32,

    /// Chance to skid through an upcoming curve, by distance to the nearest
    /// player.
    pub skid_probability: ProbabilityCurve,

    /// Speed cap as a fraction of the kart's maximum, by distance to the
    /// nearest player. This is the rubber-banding handicap.
    pub speed_cap: ProbabilityCurve,

    /// Minimum number of forward steps the crash predictor samples.
    pub min_forecast_steps: u32,

    pub false_start_probability: f32,
    pub min_start_delay: f32,
    pub max_start_delay: f32,
}

impl SkillTier {
    pub fn easy() -> Self {
        Self {
            time_full_steer: 0.5,
            collect_avoid_items: false,
            max_item_angle: 0.3,
            max_item_angle_high_speed: 0.5,
            bad_item_closeness_squared: 36.0,
            collect_probability: ProbabilityCurve::constant(0.0),
            item_usage: ItemUsage::Timed { after_seconds: 10.0 },
            shield_incoming_radius: 0.0,
            handle_bomb: false,
            nitro_usage: NitroUsage::None,
            use_slipstream: false,
            straight_length_for_zipper: f32::INFINITY,
            skid_probability: ProbabilityCurve::constant(0.0),
            speed_cap: ProbabilityCurve::new(vec![(0.0, 0.7), (20.0, 0.85), (50.0, 1.0)]),
            min_forecast_steps: 1,
            false_start_probability: 0.08,
            min_start_delay: 0.3,
            max_start_delay: 0.5,
        }
    }

    pub fn medium() -> Self {
        Self {
            time_full_steer: 0.35,
            collect_avoid_items: true,
            max_item_angle: 0.4,
            max_item_angle_high_speed: 0.7,
            bad_item_closeness_squared: 36.0,
            collect_probability: ProbabilityCurve::new(vec![(10.0, 0.5), (50.0, 0.9)]),
            item_usage: ItemUsage::Calculated,
            shield_incoming_radius: 10.0,
            handle_bomb: true,
            nitro_usage: NitroUsage::Some,
            use_slipstream: false,
            straight_length_for_zipper: 80.0,
            skid_probability: ProbabilityCurve::new(vec![(10.0, 0.3), (50.0, 0.6)]),
            speed_cap: ProbabilityCurve::new(vec![(0.0, 0.85), (20.0, 0.95), (50.0, 1.0)]),
            min_forecast_steps: 2,
            false_start_probability: 0.04,
            min_start_delay: 0.15,
            max_start_delay: 0.3,
        }
    }

    pub fn hard() -> Self {
        Self {
            time_full_steer: 0.25,
            collect_avoid_items: true,
            max_item_angle: 0.4,
            max_item_angle_high_speed: 0.7,
            bad_item_closeness_squared: 36.0,
            collect_probability: ProbabilityCurve::constant(1.0),
            item_usage: ItemUsage::Calculated,
            shield_incoming_radius: 15.0,
            handle_bomb: true,
            nitro_usage: NitroUsage::All,
            use_slipstream: true,
            straight_length_for_zipper: 35.0,
            skid_probability: ProbabilityCurve::constant(1.0),
            speed_cap: ProbabilityCurve::constant(1.0),
            min_forecast_steps: 2,
            false_start_probability: 0.0,
            min_start_delay: 0.05,
            max_start_delay: 0.15,
        }
    }
}
