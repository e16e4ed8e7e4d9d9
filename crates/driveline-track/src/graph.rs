use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::direction::{DirectionData, TrackDirection};
use crate::math::{closest_point_on_segment, cross, normalize_angle, Vec2};

/// Relative angle below which two consecutive segments count as straight.
const MAX_STRAIGHT_ANGLE: f32 = 0.1;

/// How far behind the last known node the off-road search starts, so nodes
/// near the current position are tested first.
const OFFROAD_SEARCH_BACKTRACK: usize = 10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TrackError {
    #[error("track graph has no nodes")]
    Empty,
    #[error("node {node} references out-of-range successor {successor}")]
    BadSuccessor { node: usize, successor: usize },
    #[error("node {node} marks {successor} as ai-legal but it is not a successor")]
    BadAiSuccessor { node: usize, successor: usize },
    #[error("centerline needs at least {needed} points, got {got}")]
    TooFewPoints { needed: usize, got: usize },
}

/// Builder input for one graph node.
///
/// Quad corners are `[lower_left, lower_right, upper_right, upper_left]`,
/// lower edge entering the node, upper edge leaving it. An empty
/// `ai_successors` list means every successor is AI-legal.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TrackNodeDesc {
    pub quad: [Vec2; 4],
    pub successors: Vec<usize>,
    pub ai_successors: Vec<usize>,
}

/// One drivable segment of the track.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackNode {
    quad: [Vec2; 4],
    center: Vec2,
    lower_center: Vec2,
    upper_center: Vec2,
    path_width: f32,
    distance_from_start: f32,
    successors: Vec<usize>,
    ai_successors: Vec<usize>,
    angle_to_next: Vec<f32>,
    direction: Vec<DirectionData>,
}

impl TrackNode {
    pub fn center(&self) -> Vec2 {
        self.center
    }

    pub fn lower_center(&self) -> Vec2 {
        self.lower_center
    }

    pub fn upper_center(&self) -> Vec2 {
        self.upper_center
    }

    pub fn path_width(&self) -> f32 {
        self.path_width
    }

    pub fn half_width(&self) -> f32 {
        self.path_width * 0.5
    }

    /// Left boundary point of the node's exit edge.
    pub fn left(&self) -> Vec2 {
        self.quad[3]
    }

    /// Right boundary point of the node's exit edge.
    pub fn right(&self) -> Vec2 {
        self.quad[2]
    }

    pub fn quad(&self) -> &[Vec2; 4] {
        &self.quad
    }

    pub fn successors(&self) -> &[usize] {
        &self.successors
    }

    /// Successors an AI is allowed to take (hidden shortcuts excluded).
    pub fn ai_successors(&self) -> &[usize] {
        &self.ai_successors
    }

    pub fn distance_from_start(&self) -> f32 {
        self.distance_from_start
    }

    /// Heading angle toward successor `i`.
    pub fn angle_to_next(&self, i: usize) -> Option<f32> {
        self.angle_to_next.get(i).copied()
    }

    /// Precomputed direction data for successor `i`.
    pub fn direction(&self, i: usize) -> Option<DirectionData> {
        self.direction.get(i).copied()
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point_in_quad(point, &self.quad)
    }
}

/// Directed graph of drivable quads. Built once at track load, immutable
/// afterwards, and safe to share read-only between agents.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackGraph {
    nodes: Vec<TrackNode>,
    total_length: f32,
}

/// Track-local coordinates of a point relative to one node's centerline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackCoords {
    /// Distance along the track from the start line.
    pub along: f32,
    /// Signed offset from the centerline; positive is to the left of the
    /// driving direction.
    pub lateral: f32,
}

impl TrackGraph {
    pub fn new(descs: Vec<TrackNodeDesc>) -> Result<Self, TrackError> {
        if descs.is_empty() {
            return Err(TrackError::Empty);
        }
        let count = descs.len();
        for (i, desc) in descs.iter().enumerate() {
            for &s in &desc.successors {
                if s >= count {
                    return Err(TrackError::BadSuccessor { node: i, successor: s });
                }
            }
            for &s in &desc.ai_successors {
                if !desc.successors.contains(&s) {
                    return Err(TrackError::BadAiSuccessor { node: i, successor: s });
                }
            }
        }

        let mut nodes: Vec<TrackNode> = descs
            .into_iter()
            .map(|desc| {
                let lower_center = (desc.quad[0] + desc.quad[1]) * 0.5;
                let upper_center = (desc.quad[3] + desc.quad[2]) * 0.5;
                let center =
                    (desc.quad[0] + desc.quad[1] + desc.quad[2] + desc.quad[3]) * 0.25;
                let path_width = desc.quad[0].distance(desc.quad[1]);
                let ai_successors = if desc.ai_successors.is_empty() {
                    desc.successors.clone()
                } else {
                    desc.ai_successors
                };
                TrackNode {
                    quad: desc.quad,
                    center,
                    lower_center,
                    upper_center,
                    path_width,
                    distance_from_start: 0.0,
                    successors: desc.successors,
                    ai_successors,
                    angle_to_next: Vec::new(),
                    direction: Vec::new(),
                }
            })
            .collect();

        for i in 0..count {
            let angles: Vec<f32> = nodes[i]
                .successors
                .iter()
                .map(|&s| (nodes[s].center - nodes[i].center).angle())
                .collect();
            nodes[i].angle_to_next = angles;
        }

        let total_length = assign_distances(&mut nodes);
        compute_direction_data(&mut nodes);

        Ok(Self {
            nodes,
            total_length,
        })
    }

    /// Builds a constant-width track from a centerline polyline. With
    /// `looped` the last point connects back to the first; otherwise the
    /// final node has no successors.
    pub fn from_centerline(
        points: &[Vec2],
        width: f32,
        looped: bool,
    ) -> Result<Self, TrackError> {
        let needed = if looped { 3 } else { 2 };
        if points.len() < needed {
            return Err(TrackError::TooFewPoints {
                needed,
                got: points.len(),
            });
        }
        let n = points.len();
        let node_count = if looped { n } else { n - 1 };

        // Mitered side offsets so consecutive quads share their joint edge.
        let offset_at = |k: usize| -> Vec2 {
            let prev = if k == 0 {
                if looped {
                    points[n - 1]
                } else {
                    points[0] * 2.0 - points[1]
                }
            } else {
                points[k - 1]
            };
            let next = if k == n - 1 {
                if looped {
                    points[0]
                } else {
                    points[n - 1] * 2.0 - points[n - 2]
                }
            } else {
                points[k + 1]
            };
            let dir_in = (points[k] - prev).normalized_or_zero();
            let dir_out = (next - points[k]).normalized_or_zero();
            let dir = (dir_in + dir_out).normalized_or_zero();
            let dir = if dir == Vec2::ZERO { dir_out } else { dir };
            dir.perp() * (width * 0.5)
        };

        let mut descs = Vec::with_capacity(node_count);
        for i in 0..node_count {
            let j = (i + 1) % n;
            let off_i = offset_at(i);
            let off_j = offset_at(j);
            let successors = if looped || i + 1 < node_count {
                vec![(i + 1) % node_count]
            } else {
                Vec::new()
            };
            descs.push(TrackNodeDesc {
                quad: [
                    points[i] + off_i,
                    points[i] - off_i,
                    points[j] - off_j,
                    points[j] + off_j,
                ],
                successors,
                ai_successors: Vec::new(),
            });
        }
        Self::new(descs)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, index: usize) -> &TrackNode {
        &self.nodes[index]
    }

    pub fn get(&self, index: usize) -> Option<&TrackNode> {
        self.nodes.get(index)
    }

    pub fn nodes(&self) -> &[TrackNode] {
        &self.nodes
    }

    /// Length of the successor-0 lap starting at node 0.
    pub fn total_length(&self) -> f32 {
        self.total_length
    }

    /// Locates the node whose quad contains `point`.
    ///
    /// `prev` is tested first since the common case is staying on the same
    /// node. When both `prev` and `hints` are given only the hinted nodes
    /// are scanned, which keeps an agent on its chosen branch and stops it
    /// skipping loops.
    pub fn find_node(
        &self,
        point: Vec2,
        prev: Option<usize>,
        hints: Option<&[usize]>,
    ) -> Option<usize> {
        if let Some(p) = prev {
            if self.nodes.get(p).is_some_and(|n| n.contains(point)) {
                return Some(p);
            }
        }

        if let (Some(_), Some(hints)) = (prev, hints) {
            return hints
                .iter()
                .copied()
                .find(|&h| self.nodes.get(h).is_some_and(|n| n.contains(point)));
        }

        let count = self.nodes.len();
        let start = prev.map_or(0, |p| (p + 1) % count);
        for i in 0..count {
            let idx = (start + i) % count;
            if self.nodes[idx].contains(point) {
                return Some(idx);
            }
        }
        None
    }

    /// Broader search for a point that is off the road: the node whose
    /// center is closest. Starts a few nodes behind `prev` so nearby nodes
    /// are tested first, but always scans the whole graph.
    pub fn find_offroad_node(&self, point: Vec2, prev: Option<usize>) -> Option<usize> {
        let count = self.nodes.len();
        if count == 0 {
            return None;
        }
        let start = prev.map_or(0, |p| {
            (p + count - OFFROAD_SEARCH_BACKTRACK.min(count)) % count
        });

        let mut best = None;
        let mut best_dist = f32::INFINITY;
        for i in 0..count {
            let idx = (start + i) % count;
            let d = self.nodes[idx].center.distance_squared(point);
            if d < best_dist {
                best_dist = d;
                best = Some(idx);
            }
        }
        best
    }

    /// Projects `point` onto `node`'s centerline.
    pub fn spatial_to_track(&self, point: Vec2, node: usize) -> TrackCoords {
        let n = &self.nodes[node];
        let closest = closest_point_on_segment(point, n.lower_center, n.upper_center);
        let dir = n.upper_center - n.lower_center;
        let side = cross(dir, point - n.lower_center);
        let lateral = if side >= 0.0 {
            closest.distance(point)
        } else {
            -closest.distance(point)
        };
        TrackCoords {
            along: n.distance_from_start + closest.distance(n.lower_center),
            lateral,
        }
    }
}

fn assign_distances(nodes: &mut [TrackNode]) -> f32 {
    let mut visited = vec![false; nodes.len()];
    let mut current = 0usize;
    let mut distance = 0.0f32;
    loop {
        visited[current] = true;
        nodes[current].distance_from_start = distance;
        let seg = nodes[current]
            .lower_center
            .distance(nodes[current].upper_center);
        distance += seg;
        let Some(&next) = nodes[current].successors.first() else {
            break;
        };
        if visited[next] {
            break;
        }
        current = next;
    }
    distance
}

fn compute_direction_data(nodes: &mut [TrackNode]) {
    let count = nodes.len();
    for i in 0..count {
        let mut data = Vec::with_capacity(nodes[i].successors.len());
        for s in 0..nodes[i].successors.len() {
            data.push(determine_direction(nodes, i, s));
        }
        nodes[i].direction = data;
    }
}

fn classify(rel_angle: f32) -> TrackDirection {
    if rel_angle.abs() < MAX_STRAIGHT_ANGLE {
        TrackDirection::Straight
    } else if rel_angle > 0.0 {
        TrackDirection::Left
    } else {
        TrackDirection::Right
    }
}

/// Classifies the track ahead of `(node, successor)` and finds the last node
/// that still belongs to the same straight or curve segment.
fn determine_direction(nodes: &[TrackNode], node: usize, successor: usize) -> DirectionData {
    let mut current = nodes[node].successors[successor];
    let mut angle = nodes[node].angle_to_next[successor];

    let Some(next_angle) = nodes[current].angle_to_next.first().copied() else {
        return DirectionData {
            direction: TrackDirection::Straight,
            last_node: current,
        };
    };
    let direction = classify(normalize_angle(next_angle - angle));

    // Extend the segment while consecutive nodes keep turning the same way.
    // Bounded by the node count so a looped track terminates.
    for _ in 0..nodes.len() {
        let Some(next_angle) = nodes[current].angle_to_next.first().copied() else {
            break;
        };
        if classify(normalize_angle(next_angle - angle)) != direction {
            break;
        }
        angle = next_angle;
        current = nodes[current].successors[0];
    }

    DirectionData {
        direction,
        last_node: current,
    }
}

fn quad_area2(a: Vec2, b: Vec2, c: Vec2) -> f32 {
    cross(b - a, c - a)
}

fn point_in_triangle(p: Vec2, a: Vec2, b: Vec2, c: Vec2) -> bool {
    let eps = 1e-6;
    let ab = quad_area2(a, b, p);
    let bc = quad_area2(b, c, p);
    let ca = quad_area2(c, a, p);
    let has_neg = ab < -eps || bc < -eps || ca < -eps;
    let has_pos = ab > eps || bc > eps || ca > eps;
    !(has_neg && has_pos)
}

fn point_in_quad(p: Vec2, quad: &[Vec2; 4]) -> bool {
    point_in_triangle(p, quad[0], quad[1], quad[2])
        || point_in_triangle(p, quad[0], quad[2], quad[3])
}

#[cfg(feature = "serde")]
#[derive(Serialize, Deserialize)]
struct TrackGraphSerde {
    nodes: Vec<TrackNodeDesc>,
}

#[cfg(feature = "serde")]
impl Serialize for TrackGraph {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        TrackGraphSerde {
            nodes: self
                .nodes
                .iter()
                .map(|n| TrackNodeDesc {
                    quad: n.quad,
                    successors: n.successors.clone(),
                    ai_successors: n.ai_successors.clone(),
                })
                .collect(),
        }
        .serialize(serializer)
    }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for TrackGraph {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let data = TrackGraphSerde::deserialize(deserializer)?;
        TrackGraph::new(data.nodes).map_err(serde::de::Error::custom)
    }
}
