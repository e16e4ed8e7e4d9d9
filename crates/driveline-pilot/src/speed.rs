use driveline_core::{AgentId, DeterministicRng, NitroUsage, SkillTier, SplitMix64};
use driveline_track::TrackDirection;
use tracing::debug;

use crate::curve::CurveEstimate;
use crate::world::{Attachment, WorldSnapshot};

/// Speed below which the kart should not brake further and above which an
/// undefined track direction forces braking.
const MIN_SPEED: f32 = 5.0;

/// Overspeed factor over the safe cornering speed before braking kicks in.
const BRAKE_OVERSPEED_FACTOR: f32 = 1.5;

/// Steering saturation required before cornering overspeed causes braking.
const BRAKE_STEER_SATURATION: f32 = 0.95;

/// Speed below which the kart counts as stuck.
const STUCK_SPEED: f32 = 2.0;

/// Seconds of being stuck before a rescue is requested.
const STUCK_SECONDS: f32 = 2.0;

/// Along-track window within which nitro is spent to fight for a position.
const OVERTAKE_DISTANCE: f32 = 10.0;

/// Fraction of the capped speed above which nitro is wasted.
const NITRO_SAVE_SPEED_FRACTION: f32 = 0.95;

/// Nitro reserve held back by tiers that only use some of their energy.
const NITRO_RESERVE_SOME: f32 = 4.0;

/// Energy worth spending freely when running last.
const LAST_PLACE_ENERGY: f32 = 2.0;

/// Throttle, brake, nitro, and rescue for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SpeedDecision {
    pub accel: f32,
    pub brake: bool,
    pub nitro: bool,
    pub rescue: bool,
}

/// Decides acceleration, braking, nitro and rescue from the curve estimate,
/// the rubber-banding target, and the start-phase state.
#[derive(Debug, Clone)]
pub struct SpeedGovernor {
    rng: SplitMix64,
    stuck_seconds: f32,
    /// Start reaction drawn once per race when the start signal arrives.
    start_delay: Option<f32>,
    false_start: bool,
}

impl SpeedGovernor {
    pub fn new(rng: SplitMix64) -> Self {
        Self {
            rng,
            stuck_seconds: 0.0,
            start_delay: None,
            false_start: false,
        }
    }

    pub fn reset(&mut self) {
        self.stuck_seconds = 0.0;
        self.start_delay = None;
        self.false_start = false;
    }

    pub fn handle<A: AgentId>(
        &mut self,
        snap: &WorldSnapshot<'_, A>,
        tier: &SkillTier,
        curve: &CurveEstimate,
        steer_fraction: f32,
        avoid_close: bool,
        dt: f32,
    ) -> SpeedDecision {
        let mut decision = SpeedDecision::default();

        self.prepare_start(tier);
        if !self.start_phase_done(snap) {
            decision.accel = if self.false_start { 1.0 } else { 0.0 };
            return decision;
        }

        decision.brake = self.should_brake(snap, curve, steer_fraction);
        if !decision.brake {
            decision.accel = self.acceleration(snap, tier);
        }
        decision.nitro = self.should_use_nitro(snap, tier, curve, decision.brake, avoid_close);
        decision.rescue = self.check_stuck(snap, decision.brake, dt);

        decision
    }

    /// Draws the start reaction on the first tick and keeps throttle closed
    /// until the drawn delay has elapsed. A false start opens the throttle
    /// during the countdown instead; the penalty is the outer loop's
    /// business.
    pub fn prepare_start(&mut self, tier: &SkillTier) {
        if self.start_delay.is_some() {
            return;
        }
        self.false_start = self.rng.chance(tier.false_start_probability);
        let delay = self
            .rng
            .next_range(tier.min_start_delay, tier.max_start_delay);
        debug!(delay, false_start = self.false_start, "start reaction drawn");
        self.start_delay = Some(delay);
    }

    fn start_phase_done<A: AgentId>(&self, snap: &WorldSnapshot<'_, A>) -> bool {
        if !snap.race.started {
            return false;
        }
        match self.start_delay {
            Some(delay) => snap.race.seconds_since_go >= delay,
            None => true,
        }
    }

    fn should_brake<A: AgentId>(
        &self,
        snap: &WorldSnapshot<'_, A>,
        curve: &CurveEstimate,
        steer_fraction: f32,
    ) -> bool {
        let speed = snap.me.speed;
        if curve.direction == TrackDirection::Undefined {
            return speed > MIN_SPEED;
        }
        let safe = snap.spec.speed_for_turn_radius(curve.radius);
        speed > BRAKE_OVERSPEED_FACTOR * safe && steer_fraction.abs() > BRAKE_STEER_SATURATION
    }

    fn acceleration<A: AgentId>(&self, snap: &WorldSnapshot<'_, A>, tier: &SkillTier) -> f32 {
        // Rubber banding: the speed cap tightens when well ahead of the
        // nearest player.
        let cap = self.capped_speed(snap, tier);
        if snap.me.speed >= cap {
            0.0
        } else {
            1.0
        }
    }

    fn capped_speed<A: AgentId>(&self, snap: &WorldSnapshot<'_, A>, tier: &SkillTier) -> f32 {
        let fraction = tier.speed_cap.eval(snap.race.distance_to_player);
        fraction.clamp(0.0, 1.0) * snap.spec.max_speed
    }

    fn should_use_nitro<A: AgentId>(
        &self,
        snap: &WorldSnapshot<'_, A>,
        tier: &SkillTier,
        curve: &CurveEstimate,
        braking: bool,
        avoid_close: bool,
    ) -> bool {
        if tier.nitro_usage == NitroUsage::None || snap.status.energy <= 0.0 {
            return false;
        }
        if braking || snap.status.blocked_view || !snap.status.on_ground || snap.me.finished {
            return false;
        }
        if avoid_close {
            return false;
        }
        if matches!(
            snap.status.attachment,
            Attachment::Parachute | Attachment::Anvil
        ) {
            return false;
        }

        let speed = snap.me.speed;
        // Stall recovery beats every reserve rule.
        if speed < MIN_SPEED {
            return true;
        }

        let cap = self.capped_speed(snap, tier);
        if speed > NITRO_SAVE_SPEED_FRACTION * cap {
            return false;
        }
        let safe = snap.spec.speed_for_turn_radius(curve.radius);
        if speed > safe {
            return false;
        }

        let last_lap = snap.race.lap + 1 >= snap.race.laps_total;
        if last_lap {
            let remaining = self.remaining_distance(snap);
            let est_seconds = remaining / speed.max(MIN_SPEED);
            // Holding a reserve past the finish line is pointless.
            if 1.5 * snap.status.energy >= est_seconds {
                return true;
            }
        }
        if snap.race.rank == snap.race.num_karts && snap.status.energy > LAST_PLACE_ENERGY {
            return true;
        }

        let reserve = match tier.nitro_usage {
            NitroUsage::Some => NITRO_RESERVE_SOME,
            NitroUsage::All => 0.0,
            NitroUsage::None => return false,
        };
        if snap.status.energy <= reserve {
            return false;
        }

        snap.rivals.iter().any(|r| {
            r.id != snap.me.id
                && !r.eliminated
                && !r.finished
                && (r.along - snap.me.along).abs() < OVERTAKE_DISTANCE
        })
    }

    fn remaining_distance<A: AgentId>(&self, snap: &WorldSnapshot<'_, A>) -> f32 {
        let lap_len = snap.graph.total_length();
        let laps_left = snap.race.laps_total.saturating_sub(snap.race.lap + 1) as f32;
        (lap_len - snap.me.along).max(0.0) + laps_left * lap_len
    }

    fn check_stuck<A: AgentId>(
        &mut self,
        snap: &WorldSnapshot<'_, A>,
        braking: bool,
        dt: f32,
    ) -> bool {
        if snap.me.speed < STUCK_SPEED && !braking && snap.race.started {
            self.stuck_seconds += dt;
        } else {
            self.stuck_seconds = 0.0;
        }
        if self.stuck_seconds > STUCK_SECONDS {
            debug!("stuck, requesting rescue");
            self.stuck_seconds = 0.0;
            return true;
        }
        false
    }
}
