use driveline_core::{SkillTier, SplitMix64};
use driveline_pilot::curve::{CurveEstimate, NO_CURVE_RADIUS};
use driveline_pilot::speed::SpeedGovernor;
use driveline_pilot::{KartSpec, KartState, KartStatus, RaceState, WorldSnapshot};
use driveline_track::{TrackDirection, TrackGraph, Vec2};

const DT: f32 = 0.05;

fn straight_graph() -> TrackGraph {
    let points: Vec<Vec2> = (0..=12).map(|i| Vec2::new(i as f32 * 5.0, 0.0)).collect();
    TrackGraph::from_centerline(&points, 6.0, false).expect("straight")
}

fn kart(speed: f32) -> KartState<u64> {
    let position = Vec2::new(2.5, 0.0);
    KartState {
        id: 1,
        position,
        heading: 0.0,
        velocity: Vec2::new(speed, 0.0),
        speed,
        along: position.x,
        eliminated: false,
        finished: false,
        invulnerable: false,
    }
}

fn snapshot<'a>(
    graph: &'a TrackGraph,
    me: KartState<u64>,
    rivals: &'a [KartState<u64>],
) -> WorldSnapshot<'a, u64> {
    WorldSnapshot {
        graph,
        me,
        spec: KartSpec::default(),
        status: KartStatus::default(),
        race: RaceState::default(),
        rivals,
        items: &[],
    }
}

fn straight_curve() -> CurveEstimate {
    CurveEstimate {
        direction: TrackDirection::Straight,
        radius: NO_CURVE_RADIUS,
        last_node: 5,
        arc_angle: 0.0,
    }
}

fn governor() -> SpeedGovernor {
    SpeedGovernor::new(SplitMix64::new(11))
}

#[test]
fn undefined_direction_brakes_above_min_speed() {
    let graph = straight_graph();
    let tier = SkillTier::hard();
    let mut g = governor();

    let d = g.handle(
        &snapshot(&graph, kart(10.0), &[]),
        &tier,
        &CurveEstimate::undefined(0),
        0.0,
        false,
        DT,
    );
    assert!(d.brake);
    assert_eq!(d.accel, 0.0);

    let d = g.handle(
        &snapshot(&graph, kart(4.0), &[]),
        &tier,
        &CurveEstimate::undefined(0),
        0.0,
        false,
        DT,
    );
    assert!(!d.brake, "below the speed floor the kart keeps driving");
    assert_eq!(d.accel, 1.0);
}

#[test]
fn cornering_overspeed_brakes_only_with_saturated_steering() {
    let graph = straight_graph();
    let tier = SkillTier::hard();
    let tight = CurveEstimate {
        direction: TrackDirection::Left,
        radius: 2.0,
        last_node: 5,
        arc_angle: 1.2,
    };
    let mut g = governor();

    let d = g.handle(&snapshot(&graph, kart(10.0), &[]), &tier, &tight, 1.0, false, DT);
    assert!(d.brake, "overspeeding a 2 unit radius at full lock");

    let d = g.handle(&snapshot(&graph, kart(10.0), &[]), &tier, &tight, 0.5, false, DT);
    assert!(!d.brake, "half lock still has steering in reserve");
    assert_eq!(d.accel, 1.0);
}

#[test]
fn rubber_band_cap_closes_the_throttle() {
    let graph = straight_graph();
    let tier = SkillTier::medium();
    let mut g = governor();

    // Medium caps at 85% of max speed when right next to the player.
    let mut snap = snapshot(&graph, kart(22.0), &[]);
    snap.race.distance_to_player = 0.0;
    let d = g.handle(&snap, &tier, &straight_curve(), 0.0, false, DT);
    assert!(!d.brake);
    assert_eq!(d.accel, 0.0, "above the handicap cap");
    assert!(!d.nitro);

    // Far behind, the cap opens up.
    snap.race.distance_to_player = 1000.0;
    let d = g.handle(&snap, &tier, &straight_curve(), 0.0, false, DT);
    assert_eq!(d.accel, 1.0);
}

#[test]
fn stuck_kart_requests_rescue_once() {
    let graph = straight_graph();
    let tier = SkillTier::hard();
    let mut g = governor();

    let mut rescues = Vec::new();
    for tick in 0..60 {
        let d = g.handle(&snapshot(&graph, kart(1.0), &[]), &tier, &straight_curve(), 0.0, false, DT);
        if d.rescue {
            rescues.push(tick);
        }
    }
    assert_eq!(rescues.len(), 1, "rescues at ticks {rescues:?}");
    assert!(
        (39..=41).contains(&rescues[0]),
        "rescue after about two stuck seconds, got tick {}",
        rescues[0]
    );
}

#[test]
fn moving_again_clears_the_stuck_timer() {
    let graph = straight_graph();
    let tier = SkillTier::hard();
    let mut g = governor();

    for _ in 0..30 {
        g.handle(&snapshot(&graph, kart(1.0), &[]), &tier, &straight_curve(), 0.0, false, DT);
    }
    // A burst of speed resets the counter; 30 more slow ticks stay short of
    // the threshold.
    g.handle(&snapshot(&graph, kart(10.0), &[]), &tier, &straight_curve(), 0.0, false, DT);
    for _ in 0..30 {
        let d = g.handle(&snapshot(&graph, kart(1.0), &[]), &tier, &straight_curve(), 0.0, false, DT);
        assert!(!d.rescue);
    }
}

#[test]
fn throttle_waits_for_the_start_reaction() {
    let graph = straight_graph();
    let tier = SkillTier::hard();
    let mut g = governor();

    let mut snap = snapshot(&graph, kart(0.0), &[]);
    snap.race.started = false;
    snap.race.seconds_since_go = 0.0;
    let d = g.handle(&snap, &tier, &straight_curve(), 0.0, false, DT);
    assert_eq!(d.accel, 0.0, "countdown still running");
    assert!(!d.brake);

    snap.race.started = true;
    snap.race.seconds_since_go = 0.0;
    let d = g.handle(&snap, &tier, &straight_curve(), 0.0, false, DT);
    assert_eq!(d.accel, 0.0, "reaction delay not yet elapsed");

    snap.race.seconds_since_go = 1.0;
    let d = g.handle(&snap, &tier, &straight_curve(), 0.0, false, DT);
    assert_eq!(d.accel, 1.0);
}

#[test]
fn nitro_spent_inside_the_overtake_window() {
    let graph = straight_graph();
    let tier = SkillTier::hard();
    let rival = KartState {
        id: 2,
        ..kart(10.0)
    };
    let rival = KartState {
        position: Vec2::new(8.0, 0.0),
        along: 8.0,
        ..rival
    };
    let rivals = [rival];

    let mut snap = snapshot(&graph, kart(10.0), &rivals);
    snap.status.energy = 6.0;

    let mut g = governor();
    let d = g.handle(&snap, &tier, &straight_curve(), 0.0, false, DT);
    assert!(d.nitro, "rival 5.5 units ahead, tank charged");

    // A harmful item close ahead holds the boost back.
    let d = g.handle(&snap, &tier, &straight_curve(), 0.0, true, DT);
    assert!(!d.nitro);

    // Tiers that never boost stay off the button.
    let d = g.handle(&snap, &SkillTier::easy(), &straight_curve(), 0.0, false, DT);
    assert!(!d.nitro);
}

#[test]
fn last_lap_dumps_the_reserve() {
    let graph = straight_graph();
    let tier = SkillTier::hard();
    let mut snap = snapshot(&graph, kart(10.0), &[]);
    snap.race.lap = 2;
    snap.race.laps_total = 3;
    snap.status.energy = 5.0;

    let mut g = governor();
    let d = g.handle(&snap, &tier, &straight_curve(), 0.0, false, DT);
    // About 57.5 units to go at speed 10: the tank outlasts the race.
    assert!(d.nitro);
}

#[test]
fn last_place_boosts_with_spare_energy() {
    let graph = straight_graph();
    let tier = SkillTier::hard();
    let mut snap = snapshot(&graph, kart(10.0), &[]);
    snap.race.rank = 4;
    snap.race.num_karts = 4;
    snap.status.energy = 3.0;

    let mut g = governor();
    let d = g.handle(&snap, &tier, &straight_curve(), 0.0, false, DT);
    assert!(d.nitro);
}
