#![cfg(feature = "serde")]

use driveline_track::{TrackGraph, Vec2};

fn s_curve() -> TrackGraph {
    let points = vec![
        Vec2::new(0.0, 0.0),
        Vec2::new(10.0, 0.0),
        Vec2::new(20.0, 5.0),
        Vec2::new(30.0, 5.0),
        Vec2::new(40.0, 0.0),
        Vec2::new(50.0, 0.0),
    ];
    TrackGraph::from_centerline(&points, 6.0, false).expect("s-curve")
}

#[test]
fn track_graph_roundtrips_via_serde() {
    let graph = s_curve();

    let json = serde_json::to_string(&graph).expect("serialize graph");
    let graph2: TrackGraph = serde_json::from_str(&json).expect("deserialize graph");

    assert_eq!(graph.len(), graph2.len());
    for i in 0..graph.len() {
        assert_eq!(graph.node(i), graph2.node(i), "node {i} differs");
    }

    let p = Vec2::new(15.0, 2.0);
    assert_eq!(
        graph.find_node(p, None, None),
        graph2.find_node(p, None, None)
    );
}
