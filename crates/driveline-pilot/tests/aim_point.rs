use driveline_core::SplitMix64;
use driveline_pilot::aim::find_non_crashing_point;
use driveline_pilot::{AimStrategy, KartSpec, KartState, KartStatus, RaceState, RoutePlan, WorldSnapshot};
use driveline_track::{TrackGraph, Vec2};

fn snapshot<'a>(
    graph: &'a TrackGraph,
    position: Vec2,
    heading: f32,
    speed: f32,
) -> WorldSnapshot<'a, u64> {
    let velocity = Vec2::new(heading.cos(), heading.sin()) * speed;
    WorldSnapshot {
        graph,
        me: KartState {
            id: 1,
            position,
            heading,
            velocity,
            speed,
            along: 0.0,
            eliminated: false,
            finished: false,
            invulnerable: false,
        },
        spec: KartSpec::default(),
        status: KartStatus::default(),
        race: RaceState::default(),
        rivals: &[],
        items: &[],
    }
}

fn straight_graph() -> TrackGraph {
    let points: Vec<Vec2> = (0..=12).map(|i| Vec2::new(i as f32 * 5.0, 0.0)).collect();
    TrackGraph::from_centerline(&points, 6.0, false).expect("straight")
}

fn curve_graph() -> TrackGraph {
    // Straight lead-in, then a 90 degree left sweep.
    let mut points: Vec<Vec2> = (0..4).map(|i| Vec2::new(i as f32 * 5.0, 0.0)).collect();
    for i in 1..=6 {
        let a = i as f32 / 6.0 * core::f32::consts::FRAC_PI_2;
        points.push(Vec2::new(15.0 + 20.0 * a.sin(), 20.0 - 20.0 * a.cos()));
    }
    TrackGraph::from_centerline(&points, 6.0, false).expect("curve")
}

fn s_curve_graph() -> TrackGraph {
    let points = vec![
        Vec2::new(0.0, 0.0),
        Vec2::new(10.0, 0.0),
        Vec2::new(20.0, 4.0),
        Vec2::new(30.0, 8.0),
        Vec2::new(40.0, 4.0),
        Vec2::new(50.0, 0.0),
        Vec2::new(60.0, 0.0),
    ];
    TrackGraph::from_centerline(&points, 6.0, false).expect("s-curve")
}

fn assert_aim_inside_corridor(graph: &TrackGraph, start: Vec2, strategy: AimStrategy) {
    let snap = snapshot(graph, start, 0.0, 10.0);
    let node = graph.find_node(start, None, None).expect("on road");
    let route = RoutePlan::compute(graph, &mut SplitMix64::new(4));
    let aim = find_non_crashing_point(&snap, &route, node, strategy).expect("aim target");
    let coords = graph.spatial_to_track(aim.point, aim.node);
    assert!(
        coords.lateral.abs() <= graph.node(aim.node).half_width() + 1e-3,
        "{strategy:?} aim point {:?} leaves node {} corridor (lateral {})",
        aim.point,
        aim.node,
        coords.lateral
    );
}

#[test]
fn aim_point_stays_in_corridor_on_straight() {
    let graph = straight_graph();
    for strategy in [AimStrategy::EdgeProjection, AimStrategy::BoundedCorridor] {
        assert_aim_inside_corridor(&graph, Vec2::new(2.0, 1.0), strategy);
    }
}

#[test]
fn aim_point_stays_in_corridor_on_curve() {
    let graph = curve_graph();
    for strategy in [AimStrategy::EdgeProjection, AimStrategy::BoundedCorridor] {
        assert_aim_inside_corridor(&graph, Vec2::new(2.0, -1.0), strategy);
        assert_aim_inside_corridor(&graph, Vec2::new(12.0, 0.5), strategy);
    }
}

#[test]
fn aim_point_stays_in_corridor_on_s_curve() {
    let graph = s_curve_graph();
    for strategy in [AimStrategy::EdgeProjection, AimStrategy::BoundedCorridor] {
        assert_aim_inside_corridor(&graph, Vec2::new(2.0, 0.0), strategy);
        assert_aim_inside_corridor(&graph, Vec2::new(22.0, 4.5), strategy);
    }
}

#[test]
fn aim_walk_terminates_on_looped_graph() {
    let points: Vec<Vec2> = (0..32)
        .map(|i| {
            let a = i as f32 / 32.0 * core::f32::consts::TAU;
            Vec2::new(50.0 * a.cos(), 50.0 * a.sin())
        })
        .collect();
    let graph = TrackGraph::from_centerline(&points, 8.0, true).expect("loop");
    let start = Vec2::new(50.0, 1.0);
    let node = graph.find_node(start, None, None).expect("on road");
    let route = RoutePlan::compute(&graph, &mut SplitMix64::new(2));
    // Both algorithms must hit their iteration ceiling and return, not spin.
    for strategy in [AimStrategy::EdgeProjection, AimStrategy::BoundedCorridor] {
        let snap = snapshot(&graph, start, core::f32::consts::FRAC_PI_2, 10.0);
        let aim = find_non_crashing_point(&snap, &route, node, strategy).expect("aim target");
        assert!(aim.node < graph.len());
    }
}

#[test]
fn edge_projection_stops_at_hairpin() {
    let points = vec![
        Vec2::new(0.0, 0.0),
        Vec2::new(10.0, 0.0),
        Vec2::new(20.0, 0.0),
        Vec2::new(12.0, 2.0),
        Vec2::new(2.0, 4.0),
    ];
    let graph = TrackGraph::from_centerline(&points, 4.0, false).expect("hairpin");
    let start = Vec2::new(5.0, 0.0);
    let node = graph.find_node(start, None, None).expect("on road");
    let route = RoutePlan::compute(&graph, &mut SplitMix64::new(1));
    let snap = snapshot(&graph, start, 0.0, 10.0);
    let aim = find_non_crashing_point(&snap, &route, node, AimStrategy::EdgeProjection)
        .expect("aim target");
    // Aiming through the hairpin would target node 3; the early exit stops
    // at the hairpin node itself.
    assert!(aim.node <= 2, "aimed through the hairpin at node {}", aim.node);
}
