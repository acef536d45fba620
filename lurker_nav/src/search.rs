// A* search over the waypoint graph.
//
// Open set is a `BinaryHeap` turned into a min-heap by reversing `Ord`, with
// lazy deletion: a node may sit in the heap several times and stale entries
// are skipped when popped. All per-search state (g, parent, closed) lives in
// vectors indexed by `NodeId` and is dropped when the call returns; nothing
// is written back to the graph, so concurrent searches over a shared graph
// are safe.
//
// Cost model:
//   step(current -> n) = edge distance + n.stair_cost
//   h(n)               = |n - goal| + vertical_weight * |n.y - goal.y|
// The vertical term overestimates on purpose. It trades optimality for a
// strong preference toward routes that stay level with the goal.
//
// Frontier order is ascending (f, h, node id): lowest total first, ties to
// the node closer to the goal, remaining ties to the lower handle.
//
// See also: `graph.rs` for `traversable_edges`, `floor_router.rs` which
// chains several searches through staircases.

use crate::error::{NavError, Result};
use crate::graph::NavGraph;
use crate::types::NodeId;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use tracing::trace;

/// Knobs for a single search.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SearchParams {
    pub vertical_weight: f32,
    /// Give up with `SearchLimit` after this many expansions.
    pub max_expansions: Option<usize>,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            vertical_weight: 10.0,
            max_expansions: None,
        }
    }
}

/// A found route, start and goal inclusive.
#[derive(Clone, Debug, PartialEq)]
pub struct Path {
    pub nodes: Vec<NodeId>,
    /// Accumulated g of the goal: edge distances plus stair costs of every
    /// node stepped onto.
    pub cost: f32,
}

struct OpenEntry {
    node: NodeId,
    f: f32,
    h: f32,
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenEntry {}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: the smallest (f, h, id) is the heap's maximum.
        other
            .f
            .total_cmp(&self.f)
            .then_with(|| other.h.total_cmp(&self.h))
            .then_with(|| other.node.cmp(&self.node))
    }
}

/// Shortest path from `start` to `goal` under the cost model above.
///
/// Handles the graph never issued are a caller bug and come back as
/// `UnknownNode`. An exhausted frontier is `Unreachable`. A disabled start
/// has no neighbours and therefore only reaches itself.
pub fn astar(graph: &NavGraph, start: NodeId, goal: NodeId, params: &SearchParams) -> Result<Path> {
    graph.check(start)?;
    graph.check(goal)?;

    if start == goal {
        return Ok(Path {
            nodes: vec![start],
            cost: 0.0,
        });
    }

    let n = graph.node_count();
    let goal_pos = graph.node(goal).position;
    let heuristic = |id: NodeId| {
        let pos = graph.node(id).position;
        pos.distance(goal_pos) + params.vertical_weight * (pos.y - goal_pos.y).abs()
    };

    let mut g = vec![f32::INFINITY; n];
    let mut parent: Vec<Option<NodeId>> = vec![None; n];
    let mut closed = vec![false; n];
    let mut open = BinaryHeap::new();

    g[start.index()] = 0.0;
    let h0 = heuristic(start);
    open.push(OpenEntry {
        node: start,
        f: h0,
        h: h0,
    });

    let mut expansions = 0usize;
    while let Some(OpenEntry { node: current, .. }) = open.pop() {
        let ci = current.index();
        if closed[ci] {
            continue;
        }
        if current == goal {
            trace!(%start, %goal, expansions, "astar reached goal");
            return Ok(Path {
                nodes: retrace(&parent, start, goal),
                cost: g[ci],
            });
        }
        closed[ci] = true;

        expansions += 1;
        if params.max_expansions.is_some_and(|cap| expansions > cap) {
            return Err(NavError::SearchLimit { expansions: expansions - 1 });
        }

        let current_g = g[ci];
        for (neighbor, distance) in graph.traversable_edges(current) {
            let ni = neighbor.index();
            if closed[ni] {
                continue;
            }
            let tentative = current_g + distance + graph.node(neighbor).stair_cost;
            if tentative < g[ni] {
                g[ni] = tentative;
                parent[ni] = Some(current);
                let h = heuristic(neighbor);
                open.push(OpenEntry {
                    node: neighbor,
                    f: tentative + h,
                    h,
                });
            }
        }
    }

    Err(NavError::Unreachable { start, goal })
}

fn retrace(parent: &[Option<NodeId>], start: NodeId, goal: NodeId) -> Vec<NodeId> {
    let mut nodes = vec![goal];
    let mut current = goal;
    while current != start {
        match parent[current.index()] {
            Some(prev) => {
                nodes.push(prev);
                current = prev;
            }
            None => break,
        }
    }
    nodes.reverse();
    nodes
}

/// Cost of walking `nodes` in order under the search's cost model, or `None`
/// if two consecutive nodes are not directly connected.
pub fn path_cost(graph: &NavGraph, nodes: &[NodeId]) -> Option<f32> {
    nodes.windows(2).try_fold(0.0, |acc, pair| {
        let step = graph.distance_to_neighbor(pair[0], pair[1])?;
        Some(acc + step + graph.get(pair[1])?.stair_cost)
    })
}
