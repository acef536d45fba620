// Multi-floor routing through staircases.
//
// A route between floors is assembled from plain A* legs: walk to a staircase
// on the current floor, cross it, repeat until standing on the goal's floor,
// then walk to the goal. Every walking leg must stay on one floor (complexity
// zero); any missing or crooked leg aborts the whole route. There is no
// backtracking: the nearest correctly-directed staircase is the only one
// tried at each step.
//
// The strategy sits behind `FloorRouter` so a different one (for example a
// single search that treats staircases as ordinary weighted edges) can be
// swapped into `NavManager` without touching callers.
//
// Staircase pairing: a stair node's exit is the nearest enabled stair node on
// a different floor in the requested direction. Nothing ties the two ends of
// a physical staircase together beyond that proximity rule.
//
// See also: `search.rs` for the A* legs, `manager.rs` which decides when a
// request needs this router.

use crate::error::{NavError, Result};
use crate::graph::NavGraph;
use crate::search::{SearchParams, astar};
use crate::types::{NodeId, NodeType, StairDirection};
use tracing::debug;

/// Number of times consecutive nodes of `nodes` sit on different floors.
pub fn path_complexity(graph: &NavGraph, nodes: &[NodeId]) -> usize {
    nodes
        .windows(2)
        .filter(|w| graph.node(w[0]).floor != graph.node(w[1]).floor)
        .count()
}

/// Builds a node route between two nodes on different floors.
pub trait FloorRouter: Send + Sync {
    /// `stairs` is the stair-node bucket of `graph`, in rebuild order.
    fn route(
        &self,
        graph: &NavGraph,
        stairs: &[NodeId],
        start: NodeId,
        goal: NodeId,
        params: &SearchParams,
    ) -> Result<Vec<NodeId>>;
}

/// Greedy nearest-staircase routing, one staircase per leg.
#[derive(Clone, Debug)]
pub struct GreedyStaircaseRouter {
    /// Staircases crossed before the attempt is abandoned. Guards against
    /// layouts where the greedy choice keeps overshooting the goal floor.
    pub max_legs: usize,
}

impl Default for GreedyStaircaseRouter {
    fn default() -> Self {
        Self { max_legs: 16 }
    }
}

impl FloorRouter for GreedyStaircaseRouter {
    fn route(
        &self,
        graph: &NavGraph,
        stairs: &[NodeId],
        start: NodeId,
        goal: NodeId,
        params: &SearchParams,
    ) -> Result<Vec<NodeId>> {
        graph.check(start)?;
        graph.check(goal)?;

        let target = graph.node(goal).floor;
        let mut route = Vec::new();
        let mut current = start;
        let mut legs = 0;

        while graph.node(current).floor != target {
            if legs == self.max_legs {
                debug!(%start, %goal, legs, "staircase routing exceeded leg budget");
                return Err(NavError::StaircaseLoop {
                    target,
                    legs: self.max_legs,
                });
            }
            let floor = graph.node(current).floor;
            let direction = StairDirection::toward(floor, target);
            let (entry, exit) = closest_staircase(graph, stairs, current, direction)
                .ok_or(NavError::MissingStaircase { floor, direction })?;

            let approach = astar(graph, current, entry, params)?;
            let complexity = path_complexity(graph, &approach.nodes);
            if complexity > 0 {
                debug!(%current, %entry, complexity, "path to staircase changes floor");
                return Err(NavError::TooComplex { complexity });
            }
            let crossing = astar(graph, entry, exit, params)?;

            append_leg(&mut route, &approach.nodes);
            append_leg(&mut route, &crossing.nodes);
            current = exit;
            legs += 1;
        }

        let last = astar(graph, current, goal, params)?;
        let complexity = path_complexity(graph, &last.nodes);
        if complexity > 0 {
            debug!(%current, %goal, complexity, "final leg changes floor");
            return Err(NavError::TooComplex { complexity });
        }
        append_leg(&mut route, &last.nodes);
        Ok(route)
    }
}

/// Concatenate a leg, dropping its first node when it repeats the joint.
fn append_leg(route: &mut Vec<NodeId>, leg: &[NodeId]) {
    let skip = usize::from(!route.is_empty() && route.last() == leg.first());
    route.extend_from_slice(&leg[skip..]);
}

/// Nearest enabled stair node on a different floor from `entry`, in
/// `direction`. `None` if `entry` is not a stair node or nothing qualifies.
pub fn stair_exit(
    graph: &NavGraph,
    stairs: &[NodeId],
    entry: NodeId,
    direction: StairDirection,
) -> Option<NodeId> {
    let from = graph.get(entry)?;
    if from.node_type != NodeType::Stairs {
        return None;
    }
    nearest(
        graph,
        stairs.iter().copied().filter(|&s| {
            let n = graph.node(s);
            n.enabled && n.floor != from.floor && direction.leads(from.floor, n.floor)
        }),
        entry,
    )
}

/// Nearest enabled stair node to `origin` that has an exit in `direction`,
/// paired with that exit.
pub fn closest_staircase(
    graph: &NavGraph,
    stairs: &[NodeId],
    origin: NodeId,
    direction: StairDirection,
) -> Option<(NodeId, NodeId)> {
    let origin_pos = graph.get(origin)?.position;
    let mut best: Option<(NodeId, NodeId, f32)> = None;
    for &stair in stairs {
        let node = graph.node(stair);
        if !node.enabled {
            continue;
        }
        let Some(exit) = stair_exit(graph, stairs, stair, direction) else {
            continue;
        };
        let dist = origin_pos.distance(node.position);
        if best.is_none_or(|(_, _, d)| dist < d) {
            best = Some((stair, exit, dist));
        }
    }
    best.map(|(entry, exit, _)| (entry, exit))
}

fn nearest(graph: &NavGraph, candidates: impl Iterator<Item = NodeId>, to: NodeId) -> Option<NodeId> {
    let to_pos = graph.node(to).position;
    let mut best: Option<(NodeId, f32)> = None;
    for id in candidates {
        let dist = to_pos.distance(graph.node(id).position);
        if best.is_none_or(|(_, d)| dist < d) {
            best = Some((id, dist));
        }
    }
    best.map(|(id, _)| id)
}
