use driveline_core::DeterministicRng;
use driveline_track::TrackGraph;
use tracing::debug;

/// Number of nodes cached ahead of every node.
pub const LOOK_AHEAD: usize = 10;

/// An agent's personal route for one lap: one successor choice per node plus
/// a fixed-length lookahead chain.
///
/// Nodes without successors keep no choice; callers must treat them as the
/// end of the road and fall back to conservative driving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePlan {
    /// Chosen next node per node, `None` where the node has no successors.
    next: Vec<Option<usize>>,
    /// Position of the chosen node in the node's successor list.
    successor_index: Vec<Option<usize>>,
    /// Up to [`LOOK_AHEAD`] nodes ahead of each node along the route.
    lookahead: Vec<Vec<usize>>,
}

impl RoutePlan {
    /// Picks one AI-legal successor per node uniformly at random, falling
    /// back to the full successor set where no legal one exists, then caches
    /// the lookahead chains. Deterministic for a given RNG state.
    pub fn compute(graph: &TrackGraph, rng: &mut impl DeterministicRng) -> Self {
        let count = graph.len();
        let mut next = Vec::with_capacity(count);
        let mut successor_index = Vec::with_capacity(count);

        for i in 0..count {
            let node = graph.node(i);
            let legal = if node.ai_successors().is_empty() {
                node.successors()
            } else {
                node.ai_successors()
            };
            if legal.is_empty() {
                next.push(None);
                successor_index.push(None);
                continue;
            }
            let chosen = legal[rng.next_below(legal.len() as u32) as usize];
            next.push(Some(chosen));
            successor_index.push(node.successors().iter().position(|&s| s == chosen));
        }

        let mut lookahead = Vec::with_capacity(count);
        for i in 0..count {
            let mut chain = Vec::with_capacity(LOOK_AHEAD);
            let mut current = i;
            for _ in 0..LOOK_AHEAD {
                let Some(n) = next[current] else { break };
                chain.push(n);
                current = n;
            }
            lookahead.push(chain);
        }

        Self {
            next,
            successor_index,
            lookahead,
        }
    }

    /// Recomputes the route at a lap boundary. The first lap keeps the route
    /// chosen at race start; later laps reroll for variation.
    pub fn new_lap(&mut self, lap: u32, graph: &TrackGraph, rng: &mut impl DeterministicRng) {
        if lap == 0 {
            return;
        }
        debug!(lap, "recomputing route");
        *self = Self::compute(graph, rng);
    }

    /// The chosen node after `node`, if it has one.
    pub fn next_node(&self, node: usize) -> Option<usize> {
        self.next.get(node).copied().flatten()
    }

    /// Index of the chosen successor in `node`'s successor list.
    pub fn successor_index(&self, node: usize) -> Option<usize> {
        self.successor_index.get(node).copied().flatten()
    }

    /// Cached chain of up to [`LOOK_AHEAD`] nodes ahead of `node`.
    pub fn lookahead(&self, node: usize) -> &[usize] {
        self.lookahead
            .get(node)
            .map_or(&[], |chain| chain.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use driveline_core::SplitMix64;
    use driveline_track::Vec2;

    fn looped_graph(n: usize) -> TrackGraph {
        let points: Vec<Vec2> = (0..n)
            .map(|i| {
                let a = i as f32 / n as f32 * core::f32::consts::TAU;
                Vec2::new(40.0 * a.cos(), 40.0 * a.sin())
            })
            .collect();
        TrackGraph::from_centerline(&points, 6.0, true).expect("loop")
    }

    #[test]
    fn compute_assigns_one_choice_per_node() {
        let graph = looped_graph(16);
        let mut rng = SplitMix64::new(1);
        let route = RoutePlan::compute(&graph, &mut rng);
        for i in 0..graph.len() {
            let next = route.next_node(i).expect("looped node has a choice");
            assert!(graph.node(i).successors().contains(&next));
            assert_eq!(route.lookahead(i).len(), LOOK_AHEAD);
            assert_eq!(route.lookahead(i)[0], next);
        }
    }

    #[test]
    fn compute_is_deterministic_for_a_seed() {
        let graph = looped_graph(16);
        let a = RoutePlan::compute(&graph, &mut SplitMix64::new(9));
        let b = RoutePlan::compute(&graph, &mut SplitMix64::new(9));
        assert_eq!(a, b);
    }

    #[test]
    fn new_lap_keeps_route_on_first_lap() {
        let graph = looped_graph(16);
        let mut rng = SplitMix64::new(3);
        let mut route = RoutePlan::compute(&graph, &mut rng);
        let before = route.clone();
        route.new_lap(0, &graph, &mut rng);
        assert_eq!(route, before);
    }

    #[test]
    fn dead_end_node_has_no_choice() {
        let points: Vec<Vec2> = (0..6).map(|i| Vec2::new(i as f32 * 5.0, 0.0)).collect();
        let graph = TrackGraph::from_centerline(&points, 4.0, false).expect("corridor");
        let route = RoutePlan::compute(&graph, &mut SplitMix64::new(5));
        let last = graph.len() - 1;
        assert_eq!(route.next_node(last), None);
        assert!(route.lookahead(last).is_empty());
        // Chains near the end stop at the dead end instead of dereferencing it.
        assert_eq!(route.lookahead(last - 1), &[last]);
    }
}
