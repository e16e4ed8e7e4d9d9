use driveline_core::{AgentId, DeterministicRng, ItemUsage, SkillTier, SplitMix64};
use driveline_track::{normalize_angle, TrackDirection, Vec2};
use tracing::debug;

use crate::aim::AimTarget;
use crate::route::RoutePlan;
use crate::world::{ItemKind, ItemSnapshot, Powerup, WorldSnapshot};

/// How far along the route items are considered.
const ITEM_SCAN_DISTANCE: f32 = 30.0;

/// Angle beyond which a committed item counts as passed.
const ITEM_PASSED_ANGLE: f32 = 1.5;

/// Angle within which the aim point is nudged toward an uncommitted item.
const ITEM_AIM_ADJUST_ANGLE: f32 = 0.3;

/// Speed fraction of the maximum above which the high-speed collect
/// tolerance applies.
const HIGH_SPEED_FRACTION: f32 = 0.7;

/// Steering angle below which the heading counts as straight for
/// fire-decision purposes.
const STRAIGHT_FIRE_ANGLE: f32 = 0.2;

/// Fire windows (track-distance units) per powerup kind.
const CAKE_AHEAD: f32 = 25.0;
const CAKE_BEHIND: f32 = 20.0;
const BOWLING_AHEAD: f32 = 30.0;
const BOWLING_BEHIND: f32 = 10.0;
const PLUNGER_AHEAD: f32 = 30.0;
const PLUNGER_BEHIND: f32 = 10.0;
const SWATTER_DISTANCE_SQUARED: f32 = 25.0;
const GUM_DROP_MIN_BEHIND: f32 = 3.0;
const GUM_DROP_MAX_BEHIND: f32 = 15.0;

/// Seconds a bowling ball is held before it is fired regardless of geometry.
const BOWLING_HOLD_LIMIT: f32 = 10.0;

/// What the strategist asks of the rest of the engine this tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ItemDecision {
    /// Replacement aim point, set when collecting or dodging.
    pub aim_override: Option<Vec2>,
    pub fire: bool,
    pub look_back: bool,
    /// A harmful item is close ahead; nitro is withheld while set.
    pub avoid_close: bool,
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    item: ItemSnapshot,
    distance: f32,
    /// Angle off the kart heading.
    angle: f32,
}

/// Scans pickups along the route, maintains the single committed
/// collect-target, dodges harmful items, and applies the held-consumable
/// usage policy.
#[derive(Debug, Clone)]
pub struct ItemStrategist {
    rng: SplitMix64,
    /// Item currently steered for; persists until collected, invalidated,
    /// or passed.
    committed: Option<u64>,
    /// Last candidate evaluated for the collect-probability draw, with the
    /// draw's outcome, so the dice are rolled once per candidate.
    considered: Option<(u64, bool)>,
    held_powerup: Powerup,
    held_seconds: f32,
}

impl ItemStrategist {
    pub fn new(rng: SplitMix64) -> Self {
        Self {
            rng,
            committed: None,
            considered: None,
            held_powerup: Powerup::Nothing,
            held_seconds: 0.0,
        }
    }

    pub fn reset(&mut self) {
        self.committed = None;
        self.considered = None;
        self.held_powerup = Powerup::Nothing;
        self.held_seconds = 0.0;
    }

    pub fn committed_item(&self) -> Option<u64> {
        self.committed
    }

    pub fn handle<A: AgentId>(
        &mut self,
        snap: &WorldSnapshot<'_, A>,
        route: &RoutePlan,
        current_node: usize,
        aim: &AimTarget,
        tier: &SkillTier,
        dt: f32,
    ) -> ItemDecision {
        let mut decision = ItemDecision::default();

        if snap.status.powerup == self.held_powerup {
            self.held_seconds += dt;
        } else {
            self.held_powerup = snap.status.powerup;
            self.held_seconds = 0.0;
        }

        // Low tiers drive straight through item fields; only the usage
        // policy below applies to them.
        if !tier.collect_avoid_items {
            let (fire, look_back) = self.use_powerup(snap, route, current_node, tier);
            decision.fire = fire;
            decision.look_back = look_back;
            return decision;
        }

        let (avoid, collect) = self.gather(snap, route, current_node, tier);

        decision.avoid_close = avoid
            .iter()
            .any(|c| c.distance < snap.spec.length * 2.0 && c.angle.abs() < ITEM_PASSED_ANGLE);

        // A harmful item parked next to the committed one makes the pickup
        // not worth the risk.
        if let Some(id) = self.committed {
            if let Some(target) = snap.items.iter().find(|i| i.id == id) {
                let too_close = avoid.iter().any(|c| {
                    c.item.position.distance_squared(target.position)
                        < tier.bad_item_closeness_squared
                });
                if too_close {
                    debug!(item = id, "dropping commitment, harmful item nearby");
                    self.committed = None;
                }
            }
        }

        self.update_commitment(snap, &collect, aim, tier, &mut decision);

        // Dodging overrides any collection aim.
        if let Some(point) = self.steer_to_avoid(snap, aim, &avoid) {
            decision.aim_override = Some(point);
        }

        let (fire, look_back) = self.use_powerup(snap, route, current_node, tier);
        decision.fire = fire;
        decision.look_back = look_back;

        decision
    }

    /// Collects items on the route within the scan distance and splits them
    /// into harmful and collectible candidates.
    fn gather<A: AgentId>(
        &mut self,
        snap: &WorldSnapshot<'_, A>,
        route: &RoutePlan,
        current_node: usize,
        tier: &SkillTier,
    ) -> (Vec<Candidate>, Vec<Candidate>) {
        let mut scan_nodes = vec![current_node];
        let mut travelled = 0.0;
        let mut node = current_node;
        while travelled < ITEM_SCAN_DISTANCE {
            let Some(next) = route.next_node(node) else {
                break;
            };
            travelled += snap
                .graph
                .node(node)
                .lower_center()
                .distance(snap.graph.node(next).lower_center());
            scan_nodes.push(next);
            node = next;
        }

        let mut avoid = Vec::new();
        let mut collect = Vec::new();
        let high_speed = snap.me.speed > HIGH_SPEED_FRACTION * snap.spec.max_speed
            || snap.status.skid_bonus_ready;
        let max_angle = if high_speed {
            tier.max_item_angle_high_speed
        } else {
            tier.max_item_angle
        };

        for item in snap.items {
            if !item.available || !scan_nodes.contains(&item.node) {
                continue;
            }
            let to_item = item.position - snap.me.position;
            let candidate = Candidate {
                item: *item,
                distance: to_item.length(),
                angle: normalize_angle(to_item.angle() - snap.me.heading),
            };
            if candidate.distance > ITEM_SCAN_DISTANCE {
                continue;
            }

            if item.kind.is_harmful() {
                avoid.push(candidate);
            } else if self.worth_collecting(snap, &candidate, max_angle) {
                collect.push(candidate);
            }
        }

        // A pickup parked next to something harmful is not worth the detour.
        collect.retain(|c| {
            !avoid.iter().any(|a| {
                a.item.position.distance_squared(c.item.position)
                    < tier.bad_item_closeness_squared
            })
        });

        avoid.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        collect.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        (avoid, collect)
    }

    fn worth_collecting<A: AgentId>(
        &self,
        snap: &WorldSnapshot<'_, A>,
        candidate: &Candidate,
        max_angle: f32,
    ) -> bool {
        if candidate.angle.abs() > max_angle {
            return false;
        }
        match candidate.item.kind {
            // Nitro is only worth a detour if the tank can hold it.
            ItemKind::NitroSmall | ItemKind::NitroBig => {
                snap.status.energy + candidate.item.kind.energy() <= snap.spec.max_energy
            }
            ItemKind::BonusBox => true,
            ItemKind::Banana | ItemKind::Bubblegum => false,
        }
    }

    /// Keeps, clears, or establishes the committed collect-target and nudges
    /// the aim toward it.
    fn update_commitment<A: AgentId>(
        &mut self,
        snap: &WorldSnapshot<'_, A>,
        collect: &[Candidate],
        aim: &AimTarget,
        tier: &SkillTier,
        decision: &mut ItemDecision,
    ) {
        if let Some(id) = self.committed {
            let current = snap.items.iter().find(|i| i.id == id && i.available);
            match current {
                None => {
                    debug!(item = id, "commitment cleared, item gone");
                    self.committed = None;
                }
                Some(item) => {
                    let to_item = item.position - snap.me.position;
                    let angle = normalize_angle(to_item.angle() - snap.me.heading);
                    if angle.abs() > ITEM_PASSED_ANGLE {
                        debug!(item = id, "commitment cleared, item passed");
                        self.committed = None;
                    } else {
                        if angle.abs() < ITEM_AIM_ADJUST_ANGLE {
                            decision.aim_override = Some(item.position);
                        }
                        return;
                    }
                }
            }
        }

        let Some(best) = collect.first() else {
            self.considered = None;
            return;
        };

        // One probability draw per candidate, remembered until the
        // candidate changes.
        let go_for_it = match self.considered {
            Some((id, verdict)) if id == best.item.id => verdict,
            _ => {
                let p = tier.collect_probability.eval(snap.race.distance_to_player);
                let verdict = self.rng.chance(p);
                self.considered = Some((best.item.id, verdict));
                verdict
            }
        };
        if !go_for_it {
            return;
        }

        if aim_line_hits(snap.me.position, aim.point, best.item.position, snap.spec.width) {
            debug!(item = best.item.id, "committing to item");
            self.committed = Some(best.item.id);
            decision.aim_override = Some(best.item.position);
        } else if best.angle.abs() < ITEM_AIM_ADJUST_ANGLE {
            decision.aim_override = Some(best.item.position);
        }
    }

    /// Computes a squeeze point past the outermost harmful items between the
    /// kart and its aim point, preferring the side with more room and
    /// falling back to the other when the preferred one leaves the corridor.
    fn steer_to_avoid<A: AgentId>(
        &self,
        snap: &WorldSnapshot<'_, A>,
        aim: &AimTarget,
        avoid: &[Candidate],
    ) -> Option<Vec2> {
        let aim_distance = snap.me.position.distance(aim.point);
        let blocking: Vec<&Candidate> = avoid
            .iter()
            .filter(|c| c.distance < aim_distance && c.angle.abs() < ITEM_PASSED_ANGLE)
            .collect();
        let nearest = blocking.first()?;

        let graph = snap.graph;
        let node = nearest.item.node;
        let mut min_lateral = f32::INFINITY;
        let mut max_lateral = f32::NEG_INFINITY;
        for c in &blocking {
            let lateral = graph.spatial_to_track(c.item.position, c.item.node).lateral;
            min_lateral = min_lateral.min(lateral);
            max_lateral = max_lateral.max(lateral);
        }

        let clearance = snap.spec.width;
        let half_width = graph.node(node).half_width();
        let left_target = max_lateral + clearance;
        let right_target = min_lateral - clearance;

        let fits = |lateral: f32| lateral.abs() + snap.spec.width * 0.5 <= half_width;
        let my_lateral = graph
            .spatial_to_track(snap.me.position, node)
            .lateral;

        // Prefer the side we are already on; fall back to the opposite one.
        let preferred_left = my_lateral >= (min_lateral + max_lateral) * 0.5;
        let lateral = if preferred_left && fits(left_target) {
            left_target
        } else if !preferred_left && fits(right_target) {
            right_target
        } else if fits(left_target) {
            left_target
        } else if fits(right_target) {
            right_target
        } else {
            // Both squeeze points leave the road; take the less bad one.
            if left_target.abs() <= right_target.abs() {
                left_target.clamp(-half_width, half_width)
            } else {
                right_target.clamp(-half_width, half_width)
            }
        };

        let n = graph.node(node);
        let dir = (n.upper_center() - n.lower_center()).normalized_or_zero();
        Some(n.center() + dir.perp() * lateral)
    }

    /// Held-consumable policy. Low item-usage skill fires on a timer;
    /// otherwise distance/angle windows per kind.
    fn use_powerup<A: AgentId>(
        &mut self,
        snap: &WorldSnapshot<'_, A>,
        route: &RoutePlan,
        current_node: usize,
        tier: &SkillTier,
    ) -> (bool, bool) {
        if snap.status.powerup == Powerup::Nothing || !snap.race.started {
            return (false, false);
        }

        if let ItemUsage::Timed { after_seconds } = tier.item_usage {
            return (self.held_seconds > after_seconds, false);
        }

        let closest = snap
            .rivals
            .iter()
            .filter(|r| r.id != snap.me.id && !r.eliminated && !r.finished && !r.invulnerable)
            .min_by(|a, b| {
                let da = (a.along - snap.me.along).abs();
                let db = (b.along - snap.me.along).abs();
                da.total_cmp(&db)
            });

        match snap.status.powerup {
            Powerup::Nothing => (false, false),

            Powerup::Bubblegum => {
                // An own shield is still valuable; never break it to re-fire.
                if snap.status.shield_seconds > 0.0 {
                    return (false, false);
                }
                if let Some(d) = snap.status.incoming_projectile {
                    if d < tier.shield_incoming_radius {
                        return (true, false);
                    }
                }
                if tier.handle_bomb && snap.status.attachment.is_detrimental() {
                    return (true, false);
                }
                let last_lap = snap.race.lap + 1 >= snap.race.laps_total;
                if let Some(r) = closest {
                    let behind = snap.me.along - r.along;
                    if (GUM_DROP_MIN_BEHIND..GUM_DROP_MAX_BEHIND).contains(&behind)
                        || (last_lap && behind > 0.0 && behind < GUM_DROP_MAX_BEHIND)
                    {
                        return (true, true);
                    }
                }
                (false, false)
            }

            Powerup::Cake => {
                let Some(r) = closest else { return (false, false) };
                let gap = r.along - snap.me.along;
                if gap > 0.0 && gap < CAKE_AHEAD {
                    (true, false)
                } else if gap < 0.0 && -gap < CAKE_BEHIND {
                    (true, true)
                } else {
                    (false, false)
                }
            }

            Powerup::Bowling => {
                if self.held_seconds > BOWLING_HOLD_LIMIT {
                    return (true, false);
                }
                let Some(r) = closest else { return (false, false) };
                // A bowling ball rolls straight; only worth it on straights.
                let straight = self.heading_is_straight(snap, route, current_node);
                let gap = r.along - snap.me.along;
                if straight && gap > 0.0 && gap < BOWLING_AHEAD {
                    (true, false)
                } else if straight && gap < 0.0 && -gap < BOWLING_BEHIND {
                    (true, true)
                } else {
                    (false, false)
                }
            }

            Powerup::Plunger => {
                let Some(r) = closest else { return (false, false) };
                let straight = self.heading_is_straight(snap, route, current_node);
                let gap = r.along - snap.me.along;
                if straight && gap > 0.0 && gap < PLUNGER_AHEAD {
                    (true, false)
                } else if gap < 0.0 && -gap < PLUNGER_BEHIND {
                    (true, true)
                } else {
                    (false, false)
                }
            }

            Powerup::Swatter => {
                let Some(r) = closest else { return (false, false) };
                let d2 = snap.me.position.distance_squared(r.position);
                (d2 < SWATTER_DISTANCE_SQUARED, false)
            }

            // Zippers are a speed boost; fire on a long enough straight.
            Powerup::Zipper => {
                let len = self.straight_length_ahead(snap, route, current_node);
                (len >= tier.straight_length_for_zipper, false)
            }
        }
    }

    fn heading_is_straight<A: AgentId>(
        &self,
        snap: &WorldSnapshot<'_, A>,
        route: &RoutePlan,
        current_node: usize,
    ) -> bool {
        let Some(idx) = route.successor_index(current_node) else {
            return false;
        };
        let Some(track_angle) = snap.graph.node(current_node).angle_to_next(idx) else {
            return false;
        };
        normalize_angle(track_angle - snap.me.heading).abs() < STRAIGHT_FIRE_ANGLE
    }

    /// Remaining length of the straight segment ahead, zero when the track
    /// curves.
    fn straight_length_ahead<A: AgentId>(
        &self,
        snap: &WorldSnapshot<'_, A>,
        route: &RoutePlan,
        current_node: usize,
    ) -> f32 {
        let Some(idx) = route.successor_index(current_node) else {
            return 0.0;
        };
        let Some(data) = snap.graph.node(current_node).direction(idx) else {
            return 0.0;
        };
        if data.direction != TrackDirection::Straight {
            return 0.0;
        }
        let end = snap.graph.node(data.last_node).distance_from_start();
        let mut len = end - snap.me.along;
        if len < 0.0 {
            len += snap.graph.total_length();
        }
        len
    }
}

/// True when the segment from `from` to `to` passes within the item's hit
/// zone.
fn aim_line_hits(from: Vec2, to: Vec2, item: Vec2, kart_width: f32) -> bool {
    let hit_radius = kart_width * 0.7;
    let closest = driveline_track::math::closest_point_on_segment(item, from, to);
    closest.distance_squared(item) < hit_radius * hit_radius
}
