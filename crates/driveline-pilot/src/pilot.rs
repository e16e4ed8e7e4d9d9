use core::f32::consts::FRAC_PI_2;

use driveline_core::rng::derive_seed;
use driveline_core::tick::streams;
use driveline_core::{AgentId, Controls, SkillTier, SplitMix64, TickContext};
use driveline_track::{normalize_angle, TrackGraph};
use tracing::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::aim::{find_non_crashing_point, AimStrategy};
use crate::crash::predict_crash;
use crate::curve::estimate_curve;
use crate::items::ItemStrategist;
use crate::observer::PilotObserver;
use crate::route::RoutePlan;
use crate::speed::SpeedGovernor;
use crate::steering::SteerController;
use crate::world::WorldSnapshot;

/// Lateral slack beyond the half-width before the kart counts as off-road.
const OFF_ROAD_SLACK: f32 = 0.5;

/// Per-agent engine configuration: one tier record and one aim algorithm,
/// no behavioral subclassing.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PilotConfig {
    pub tier: SkillTier,
    pub aim_strategy: AimStrategy,
}

impl Default for PilotConfig {
    fn default() -> Self {
        Self {
            tier: SkillTier::hard(),
            aim_strategy: AimStrategy::default(),
        }
    }
}

/// One agent's complete decision engine.
///
/// Owns the per-agent state (route, commitments, skid decision, timers)
/// exclusively; everything else arrives through the per-tick
/// [`WorldSnapshot`]. `update` is synchronous and never blocks.
pub struct Pilot<A: AgentId> {
    agent: A,
    config: PilotConfig,
    route: RoutePlan,
    route_rng: SplitMix64,
    items: ItemStrategist,
    steer: SteerController,
    governor: SpeedGovernor,
    current_node: Option<usize>,
    lap_seen: u32,
    /// Steering direction held while backing out of a kart-on-kart crash;
    /// zero when not crashed.
    crash_steer_sign: f32,
}

impl<A: AgentId> Pilot<A> {
    /// Builds the pilot and computes the first route. All randomness is
    /// derived from `global_seed` and the agent id, so a fixed seed replays
    /// identically.
    pub fn new(agent: A, config: PilotConfig, graph: &TrackGraph, global_seed: u64) -> Self {
        let id = agent.stable_id();
        let mut route_rng = SplitMix64::new(derive_seed(global_seed, id, streams::ROUTE));
        let route = RoutePlan::compute(graph, &mut route_rng);
        Self {
            agent,
            config,
            route,
            route_rng,
            items: ItemStrategist::new(SplitMix64::new(derive_seed(global_seed, id, streams::ITEMS))),
            steer: SteerController::new(SplitMix64::new(derive_seed(global_seed, id, streams::SKID))),
            governor: SpeedGovernor::new(SplitMix64::new(derive_seed(
                global_seed,
                id,
                streams::START,
            ))),
            current_node: None,
            lap_seen: 0,
            crash_steer_sign: 0.0,
        }
    }

    pub fn agent(&self) -> A {
        self.agent
    }

    pub fn route(&self) -> &RoutePlan {
        &self.route
    }

    pub fn current_node(&self) -> Option<usize> {
        self.current_node
    }

    pub fn committed_item(&self) -> Option<u64> {
        self.items.committed_item()
    }

    /// Race restart: new route, cleared commitments and timers.
    pub fn reset(&mut self, graph: &TrackGraph) {
        self.route = RoutePlan::compute(graph, &mut self.route_rng);
        self.items.reset();
        self.steer.reset();
        self.governor.reset();
        self.current_node = None;
        self.lap_seen = 0;
        self.crash_steer_sign = 0.0;
    }

    /// One decision tick: locate, predict, aim, adjust for items, steer,
    /// govern speed.
    pub fn update(
        &mut self,
        ctx: &TickContext,
        snap: &WorldSnapshot<'_, A>,
        observer: &mut impl PilotObserver<A>,
    ) -> Controls {
        if snap.race.lap != self.lap_seen {
            self.route
                .new_lap(snap.race.lap, snap.graph, &mut self.route_rng);
            self.lap_seen = snap.race.lap;
            observer.route_computed(self.agent, snap.race.lap);
        }

        // Locate; fall back to the broader off-road search, then to the
        // previous tick's node.
        let prev = self.current_node;
        let hints = prev.map(|p| self.route.lookahead(p));
        let located = snap.graph.find_node(snap.me.position, prev, hints);
        let node = match located.or_else(|| snap.graph.find_offroad_node(snap.me.position, prev)) {
            Some(n) => n,
            None => match prev {
                Some(p) => p,
                None => return Controls::braking(),
            },
        };
        self.current_node = Some(node);
        observer.node_located(self.agent, node, located.is_none());

        // Dead end ahead: nothing to aim at, drive conservatively.
        let Some(next_node) = self.route.next_node(node) else {
            debug!(node, "no route from node, braking");
            return Controls::braking();
        };

        let tier = &self.config.tier;

        let crash = predict_crash(snap, &self.route, node, tier);
        observer.crash_predicted(self.agent, &crash);

        let Some(aim) = find_non_crashing_point(snap, &self.route, node, self.config.aim_strategy)
        else {
            return Controls::braking();
        };
        observer.aim_selected(self.agent, &aim);

        let item_decision =
            self.items
                .handle(snap, &self.route, node, &aim, tier, ctx.dt_seconds);
        observer.item_committed(self.agent, self.items.committed_item());
        let aim_point = item_decision.aim_override.unwrap_or(aim.point);

        let curve = estimate_curve(snap, &self.route, node);
        observer.curve_estimated(self.agent, &curve);

        // Steering target selection mirrors the error-handling ladder:
        // off-road recovers toward the corridor, a kart crash backs out
        // sideways, otherwise the aim point is followed.
        let coords = snap.graph.spatial_to_track(snap.me.position, node);
        let off_road =
            coords.lateral.abs() > snap.graph.node(node).half_width() + OFF_ROAD_SLACK;

        let succ_idx = self.route.successor_index(node);
        let track_angle = succ_idx
            .and_then(|i| snap.graph.node(node).angle_to_next(i))
            .unwrap_or(snap.me.heading);
        let heading_vs_track = normalize_angle(snap.me.heading - track_angle);

        let angle = if off_road {
            let center = snap.graph.node(next_node).center();
            self.steer
                .steer_to_point(snap.me.position, snap.me.heading, &snap.spec, center)
        } else if crash.rival.is_some() && crash.boundary.is_none() {
            if self.crash_steer_sign == 0.0 {
                let to_aim = self.steer.steer_to_point(
                    snap.me.position,
                    snap.me.heading,
                    &snap.spec,
                    aim_point,
                );
                self.crash_steer_sign = if to_aim >= 0.0 { 1.0 } else { -1.0 };
            }
            self.steer
                .steer_to_angle(snap.me.heading, track_angle + self.crash_steer_sign * FRAC_PI_2)
        } else {
            self.crash_steer_sign = 0.0;
            self.steer
                .steer_to_point(snap.me.position, snap.me.heading, &snap.spec, aim_point)
        };

        let (steer_fraction, skid) = self.steer.finish(
            angle,
            &snap.spec,
            tier,
            &curve,
            snap.me.speed,
            heading_vs_track,
            snap.race.distance_to_player,
            snap.status.blocked_view,
            ctx.dt_seconds,
        );

        let speed = self.governor.handle(
            snap,
            tier,
            &curve,
            steer_fraction,
            item_decision.avoid_close,
            ctx.dt_seconds,
        );
        if speed.rescue {
            observer.rescue_requested(self.agent);
        }

        Controls {
            steer: steer_fraction,
            accel: speed.accel,
            brake: speed.brake,
            skid,
            fire: item_decision.fire,
            look_back: item_decision.look_back,
            nitro: speed.nitro,
            rescue: speed.rescue,
        }
    }
}
