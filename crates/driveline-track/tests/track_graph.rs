use driveline_track::{TrackDirection, TrackError, TrackGraph, TrackNodeDesc, Vec2};

fn straight_corridor(len: usize, spacing: f32, width: f32) -> TrackGraph {
    let points: Vec<Vec2> = (0..=len)
        .map(|i| Vec2::new(i as f32 * spacing, 0.0))
        .collect();
    TrackGraph::from_centerline(&points, width, false).expect("straight corridor")
}

fn oval_loop(radius: f32, segments: usize, width: f32) -> TrackGraph {
    let points: Vec<Vec2> = (0..segments)
        .map(|i| {
            let a = i as f32 / segments as f32 * core::f32::consts::TAU;
            Vec2::new(radius * a.cos(), radius * a.sin())
        })
        .collect();
    TrackGraph::from_centerline(&points, width, true).expect("oval loop")
}

#[test]
fn centerline_builder_rejects_degenerate_inputs() {
    let err = TrackGraph::from_centerline(&[Vec2::ZERO], 4.0, false);
    assert_eq!(err, Err(TrackError::TooFewPoints { needed: 2, got: 1 }));

    let err = TrackGraph::new(Vec::new());
    assert_eq!(err, Err(TrackError::Empty));
}

#[test]
fn graph_rejects_bad_successor_indices() {
    let desc = TrackNodeDesc {
        quad: [
            Vec2::new(0.0, 2.0),
            Vec2::new(0.0, -2.0),
            Vec2::new(5.0, -2.0),
            Vec2::new(5.0, 2.0),
        ],
        successors: vec![7],
        ai_successors: Vec::new(),
    };
    let err = TrackGraph::new(vec![desc]);
    assert_eq!(
        err,
        Err(TrackError::BadSuccessor {
            node: 0,
            successor: 7
        })
    );
}

#[test]
fn find_node_prefers_previous_node() {
    let graph = straight_corridor(10, 5.0, 4.0);
    let p = Vec2::new(12.0, 0.5);
    let node = graph.find_node(p, None, None).expect("on road");
    assert_eq!(node, 2);
    // The shortcut path returns the same node when still inside it.
    assert_eq!(graph.find_node(p, Some(node), None), Some(node));
    // A stale previous node recovers via the full scan.
    assert_eq!(graph.find_node(p, Some(7), None), Some(2));
}

#[test]
fn find_node_with_hints_only_scans_hints() {
    let graph = straight_corridor(10, 5.0, 4.0);
    let p = Vec2::new(22.0, 0.0);
    let on = graph.find_node(p, None, None).expect("on road");
    assert_eq!(on, 4);
    // Hinted lookup finds it when the hint list contains the node.
    assert_eq!(graph.find_node(p, Some(3), Some(&[3, 4, 5])), Some(4));
    // And misses it when the list does not.
    assert_eq!(graph.find_node(p, Some(0), Some(&[0, 1])), None);
}

#[test]
fn find_node_returns_none_off_road() {
    let graph = straight_corridor(10, 5.0, 4.0);
    assert_eq!(graph.find_node(Vec2::new(12.0, 9.0), None, None), None);
}

#[test]
fn offroad_lookup_finds_nearest_node() {
    let graph = straight_corridor(10, 5.0, 4.0);
    let node = graph
        .find_offroad_node(Vec2::new(31.0, 12.0), Some(6))
        .expect("nearest");
    // Point is well above the corridor around x = 31.
    let center = graph.node(node).center();
    for (i, n) in graph.nodes().iter().enumerate() {
        assert!(
            center.distance_squared(Vec2::new(31.0, 12.0))
                <= n.center().distance_squared(Vec2::new(31.0, 12.0)) + 1e-3,
            "node {i} is closer than the reported one"
        );
    }
}

#[test]
fn spatial_to_track_signs_lateral_offset() {
    let graph = straight_corridor(10, 5.0, 4.0);
    // Driving direction is +x, so +y is the left side.
    let left = graph.spatial_to_track(Vec2::new(7.0, 1.0), 1);
    assert!(left.lateral > 0.9 && left.lateral < 1.1);
    let right = graph.spatial_to_track(Vec2::new(7.0, -1.0), 1);
    assert!(right.lateral < -0.9 && right.lateral > -1.1);
    assert!((left.along - 7.0).abs() < 1e-3);
}

#[test]
fn distances_accumulate_along_the_lap() {
    let graph = straight_corridor(10, 5.0, 4.0);
    for i in 0..graph.len() {
        assert!((graph.node(i).distance_from_start() - 5.0 * i as f32).abs() < 1e-3);
    }
    assert!((graph.total_length() - 50.0).abs() < 1e-3);
}

#[test]
fn straight_corridor_classifies_as_straight() {
    let graph = straight_corridor(10, 5.0, 4.0);
    let dir = graph.node(0).direction(0).expect("direction data");
    assert_eq!(dir.direction, TrackDirection::Straight);
}

#[test]
fn counterclockwise_oval_classifies_as_left() {
    let graph = oval_loop(30.0, 24, 6.0);
    for i in 0..graph.len() {
        let dir = graph.node(i).direction(0).expect("direction data");
        assert_eq!(
            dir.direction,
            TrackDirection::Left,
            "node {i} should curve left"
        );
    }
}

#[test]
fn ai_successor_defaults_to_full_set() {
    let graph = straight_corridor(4, 5.0, 4.0);
    assert_eq!(graph.node(0).ai_successors(), graph.node(0).successors());
    // Final node of an open corridor has nowhere to go.
    assert!(graph.node(graph.len() - 1).successors().is_empty());
}
