// Waypoint graph: nodes, undirected weighted edges, and the proximity build.
//
// `NavGraph` is an arena of `Node`s addressed by `NodeId` (the node's index).
// Every node keeps its own list of incident edges; an undirected edge is
// stored once on each endpoint. Mutations keep the two copies in step, so
// "no duplicate edge between the same unordered pair" and "edge on A iff
// edge on B" hold after every public operation.
//
// Edge weight is the straight-line distance at creation time. Moving a node
// afterwards leaves its edge weights stale until the next `fetch_neighbors`.
//
// A disabled node keeps its edges but is invisible to traversal: it reports
// no neighbours, and no other node reports it as a neighbour. Re-enabling it
// restores the old connectivity without a rebuild.
//
// See also: `search.rs` for A* over this graph, `manager.rs` which owns the
// graph and drives rebuilds.

use crate::config::NavConfig;
use crate::error::{NavError, Result};
use crate::types::{Floor, NodeId, NodeType, Vec3};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// An undirected connection between two nodes.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub nodes: [NodeId; 2],
    /// Straight-line distance between the endpoints when the edge was made.
    pub distance: f32,
}

impl Edge {
    /// True if this edge joins `a` and `b`, in either order.
    pub fn connects(&self, a: NodeId, b: NodeId) -> bool {
        (self.nodes[0] == a && self.nodes[1] == b) || (self.nodes[0] == b && self.nodes[1] == a)
    }

    /// The endpoint that is not `node`, or `None` if `node` is not an endpoint.
    pub fn other(&self, node: NodeId) -> Option<NodeId> {
        if self.nodes[0] == node {
            Some(self.nodes[1])
        } else if self.nodes[1] == node {
            Some(self.nodes[0])
        } else {
            None
        }
    }
}

/// A waypoint.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub position: Vec3,
    pub node_type: NodeType,
    /// Derived from height on every rebuild.
    pub floor: Floor,
    /// Other nodes closer than this get an edge on rebuild.
    pub fetch_radius: f32,
    pub enabled: bool,
    /// Additive cost for stepping onto this node. Non-zero for stairs.
    pub stair_cost: f32,
    /// Marks nodes on some agent's pending path.
    pub selected: bool,
    edges: SmallVec<[Edge; 8]>,
}

impl Node {
    pub fn new(id: NodeId, position: Vec3, node_type: NodeType, fetch_radius: f32) -> Self {
        Self {
            id,
            position,
            node_type,
            floor: 0,
            fetch_radius,
            enabled: true,
            stair_cost: 0.0,
            selected: false,
            edges: SmallVec::new(),
        }
    }

    /// Raw incident edges, including those hidden by `enabled == false`.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    fn has_edge(&self, a: NodeId, b: NodeId) -> bool {
        self.edges.iter().any(|e| e.connects(a, b))
    }
}

/// Arena of waypoints and their edges.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NavGraph {
    nodes: Vec<Node>,
}

impl NavGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node and return its handle. The node starts enabled, on floor
    /// 0, with no edges; `fetch_neighbors` fills in floor, cost, and edges.
    pub fn add_node(&mut self, position: Vec3, node_type: NodeType, fetch_radius: f32) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node::new(id, position, node_type, fetch_radius));
        id
    }

    /// Node by handle. Panics on a handle this graph never issued.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// Mutable node by handle. Panics on a handle this graph never issued.
    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index())
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id.index() < self.nodes.len()
    }

    /// Error unless `id` belongs to this graph.
    pub fn check(&self, id: NodeId) -> Result<()> {
        if self.contains(id) {
            Ok(())
        } else {
            Err(NavError::UnknownNode(id))
        }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Every undirected edge exactly once, reported from its lower-id endpoint.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> + '_ {
        self.nodes.iter().flat_map(|n| {
            n.edges
                .iter()
                .filter(move |e| e.other(n.id).is_some_and(|o| o > n.id))
        })
    }

    pub fn edge_count(&self) -> usize {
        self.edges().count()
    }

    /// Connect `a` and `b` unless they already are. Each endpoint's own list
    /// is checked, so a one-sided leftover is repaired rather than doubled.
    /// Returns whether anything was inserted; self-loops are refused.
    pub fn add_edge(&mut self, a: NodeId, b: NodeId) -> Result<bool> {
        self.check(a)?;
        self.check(b)?;
        Ok(self.link(a, b))
    }

    fn link(&mut self, a: NodeId, b: NodeId) -> bool {
        if a == b {
            return false;
        }
        let edge = Edge {
            nodes: [a, b],
            distance: self.node(a).position.distance(self.node(b).position),
        };
        let mut inserted = false;
        for end in [a, b] {
            let node = &mut self.nodes[end.index()];
            if !node.has_edge(a, b) {
                node.edges.push(edge);
                inserted = true;
            }
        }
        inserted
    }

    /// Remove every edge joining `a` and `b` from both endpoints. Returns
    /// whether anything was removed.
    pub fn remove_edge(&mut self, a: NodeId, b: NodeId) -> Result<bool> {
        self.check(a)?;
        self.check(b)?;
        let mut removed = false;
        for end in [a, b] {
            let edges = &mut self.nodes[end.index()].edges;
            let before = edges.len();
            edges.retain(|e| !e.connects(a, b));
            removed |= edges.len() != before;
        }
        Ok(removed)
    }

    /// Drop all edges incident to `id`, including the mirrored copies held by
    /// its neighbours.
    pub fn clear_edges(&mut self, id: NodeId) -> Result<()> {
        self.check(id)?;
        let incident = std::mem::take(&mut self.nodes[id.index()].edges);
        for edge in &incident {
            if let Some(other) = edge.other(id) {
                self.nodes[other.index()].edges.retain(|e| !e.connects(id, other));
            }
        }
        Ok(())
    }

    /// Take a node out of the graph without a rebuild: disable it and drop
    /// every edge touching it. Its handle stays valid.
    pub fn detach_node(&mut self, id: NodeId) -> Result<()> {
        self.clear_edges(id)?;
        self.node_mut(id).enabled = false;
        Ok(())
    }

    pub fn clear_all_edges(&mut self) {
        for node in &mut self.nodes {
            node.edges.clear();
        }
    }

    /// Visible edges of `id`: none for a disabled node, and edges to disabled
    /// nodes are skipped. Panics on a foreign handle.
    pub fn traversable_edges(&self, id: NodeId) -> impl Iterator<Item = (NodeId, f32)> + '_ {
        let node = self.node(id);
        let edges: &[Edge] = if node.enabled { &node.edges } else { &[] };
        edges.iter().filter_map(move |e| {
            let other = e.other(id)?;
            self.nodes
                .get(other.index())
                .filter(|n| n.enabled)
                .map(|_| (other, e.distance))
        })
    }

    /// Neighbour handles as seen by traversal. See `traversable_edges`.
    pub fn neighbors(&self, id: NodeId) -> Vec<NodeId> {
        self.traversable_edges(id).map(|(n, _)| n).collect()
    }

    /// Weight of the edge between `from` and `to`, or `None` if they are not
    /// directly connected. Ignores the enabled flag.
    pub fn distance_to_neighbor(&self, from: NodeId, to: NodeId) -> Option<f32> {
        self.get(from)?
            .edges
            .iter()
            .find(|e| e.connects(from, to))
            .map(|e| e.distance)
    }

    pub fn set_enabled(&mut self, id: NodeId, enabled: bool) -> Result<()> {
        self.get_mut(id).ok_or(NavError::UnknownNode(id))?.enabled = enabled;
        Ok(())
    }

    /// Move a node. Edge weights are not recomputed until the next rebuild.
    pub fn set_position(&mut self, id: NodeId, position: Vec3) -> Result<()> {
        self.get_mut(id).ok_or(NavError::UnknownNode(id))?.position = position;
        Ok(())
    }

    /// Full proximity rebuild. Clears every edge, reassigns floor and stair
    /// cost from `config`, then links each ordered pair `(a, b)` whose
    /// distance is below `a.fetch_radius`.
    ///
    /// Candidate lists are computed in parallel; edges are inserted serially
    /// in node order so the result does not depend on thread scheduling.
    pub fn fetch_neighbors(&mut self, config: &NavConfig) {
        for node in &mut self.nodes {
            node.edges.clear();
            node.floor = floor_for_height(node.position.y, &config.floor_boundaries);
            node.stair_cost = match node.node_type {
                NodeType::Stairs => config.stair_cost,
                _ => 0.0,
            };
        }

        let nodes = &self.nodes;
        let candidates: Vec<Vec<NodeId>> = nodes
            .par_iter()
            .map(|a| {
                nodes
                    .iter()
                    .filter(|b| b.id != a.id && a.position.distance(b.position) < a.fetch_radius)
                    .map(|b| b.id)
                    .collect()
            })
            .collect();

        for (a, near) in candidates.into_iter().enumerate() {
            let a = NodeId(a as u32);
            for b in near {
                self.link(a, b);
            }
        }
    }

    /// Node minimising `|(node.position - position) * scale|`, i.e. distance
    /// in a coordinate system stretched per axis by `scale`. With
    /// `enabled_only`, disabled nodes are skipped. Ties go to the lowest id.
    pub fn closest_node(&self, position: Vec3, scale: Vec3, enabled_only: bool) -> Option<NodeId> {
        let mut best: Option<(NodeId, f32)> = None;
        for node in &self.nodes {
            if enabled_only && !node.enabled {
                continue;
            }
            let dist = ((node.position - position) * scale).length();
            if best.is_none_or(|(_, d)| dist < d) {
                best = Some((node.id, dist));
            }
        }
        best.map(|(id, _)| id)
    }
}

/// Floor bucket for a height: the number of `boundaries` strictly below `y`.
pub fn floor_for_height(y: f32, boundaries: &[f32]) -> Floor {
    boundaries.iter().filter(|&&b| y > b).count() as Floor
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(count: usize, spacing: f32) -> NavGraph {
        let mut graph = NavGraph::new();
        for i in 0..count {
            graph.add_node(Vec3::new(i as f32 * spacing, 0.0, 0.0), NodeType::Standard, 1.5);
        }
        graph
    }

    #[test]
    fn add_node_assigns_sequential_ids() {
        let graph = line(3, 1.0);
        let ids: Vec<_> = graph.nodes().iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![NodeId(0), NodeId(1), NodeId(2)]);
    }

    #[test]
    fn add_edge_is_symmetric_and_deduplicated() {
        let mut graph = line(2, 2.0);
        assert!(graph.add_edge(NodeId(0), NodeId(1)).unwrap());
        assert!(!graph.add_edge(NodeId(1), NodeId(0)).unwrap());
        assert_eq!(graph.node(NodeId(0)).edges().len(), 1);
        assert_eq!(graph.node(NodeId(1)).edges().len(), 1);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.distance_to_neighbor(NodeId(1), NodeId(0)), Some(2.0));
    }

    #[test]
    fn self_loop_refused() {
        let mut graph = line(1, 1.0);
        assert!(!graph.add_edge(NodeId(0), NodeId(0)).unwrap());
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn unknown_handle_is_reported() {
        let mut graph = line(1, 1.0);
        let err = graph.add_edge(NodeId(0), NodeId(7)).unwrap_err();
        assert!(matches!(err, NavError::UnknownNode(NodeId(7))));
    }

    #[test]
    fn remove_edge_clears_both_sides() {
        let mut graph = line(2, 1.0);
        graph.add_edge(NodeId(0), NodeId(1)).unwrap();
        assert!(graph.remove_edge(NodeId(1), NodeId(0)).unwrap());
        assert!(graph.node(NodeId(0)).edges().is_empty());
        assert!(graph.node(NodeId(1)).edges().is_empty());
        assert!(!graph.remove_edge(NodeId(0), NodeId(1)).unwrap());
    }

    #[test]
    fn clear_edges_leaves_no_orphans() {
        let mut graph = line(3, 1.0);
        graph.add_edge(NodeId(0), NodeId(1)).unwrap();
        graph.add_edge(NodeId(1), NodeId(2)).unwrap();
        graph.add_edge(NodeId(0), NodeId(2)).unwrap();
        graph.clear_edges(NodeId(1)).unwrap();
        assert!(graph.node(NodeId(1)).edges().is_empty());
        assert_eq!(graph.neighbors(NodeId(0)), vec![NodeId(2)]);
        assert_eq!(graph.neighbors(NodeId(2)), vec![NodeId(0)]);
    }

    #[test]
    fn detach_node_disables_and_unlinks() {
        let mut graph = line(3, 1.0);
        graph.add_edge(NodeId(0), NodeId(1)).unwrap();
        graph.add_edge(NodeId(1), NodeId(2)).unwrap();
        graph.detach_node(NodeId(1)).unwrap();

        assert!(!graph.node(NodeId(1)).enabled);
        assert_eq!(graph.edge_count(), 0);
        graph.set_enabled(NodeId(1), true).unwrap();
        assert!(graph.neighbors(NodeId(1)).is_empty());
    }

    #[test]
    fn distance_to_unconnected_is_none() {
        let graph = line(2, 1.0);
        assert_eq!(graph.distance_to_neighbor(NodeId(0), NodeId(1)), None);
        assert_eq!(graph.distance_to_neighbor(NodeId(5), NodeId(1)), None);
    }

    #[test]
    fn disabled_node_is_invisible_but_keeps_edges() {
        let mut graph = line(3, 1.0);
        graph.add_edge(NodeId(0), NodeId(1)).unwrap();
        graph.add_edge(NodeId(1), NodeId(2)).unwrap();
        graph.set_enabled(NodeId(1), false).unwrap();

        assert!(graph.neighbors(NodeId(1)).is_empty());
        assert!(graph.neighbors(NodeId(0)).is_empty());
        assert!(graph.neighbors(NodeId(2)).is_empty());
        assert_eq!(graph.node(NodeId(1)).edges().len(), 2);

        graph.set_enabled(NodeId(1), true).unwrap();
        assert_eq!(graph.neighbors(NodeId(1)), vec![NodeId(0), NodeId(2)]);
    }

    #[test]
    fn floor_buckets_by_height() {
        let bounds = [-1.0, 1.0];
        assert_eq!(floor_for_height(-3.0, &bounds), 0);
        assert_eq!(floor_for_height(0.0, &bounds), 1);
        assert_eq!(floor_for_height(1.0, &bounds), 1);
        assert_eq!(floor_for_height(1.5, &bounds), 2);
        assert_eq!(floor_for_height(42.0, &[]), 0);
    }

    #[test]
    fn fetch_neighbors_links_within_radius() {
        let mut graph = line(4, 1.0);
        graph.fetch_neighbors(&NavConfig::default());
        // Radius 1.5 with spacing 1.0 links only adjacent nodes.
        assert_eq!(graph.edge_count(), 3);
        assert_eq!(graph.neighbors(NodeId(1)), vec![NodeId(0), NodeId(2)]);
    }

    #[test]
    fn fetch_neighbors_is_idempotent() {
        let mut graph = NavGraph::new();
        for i in 0..6 {
            let fi = i as f32;
            graph.add_node(Vec3::new(fi, 0.0, (fi * 0.7).sin()), NodeType::Standard, 2.2);
        }
        let config = NavConfig::default();
        graph.fetch_neighbors(&config);
        let first: Vec<[NodeId; 2]> = graph.edges().map(|e| e.nodes).collect();
        graph.fetch_neighbors(&config);
        let second: Vec<[NodeId; 2]> = graph.edges().map(|e| e.nodes).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn fetch_neighbors_assigns_floor_and_stair_cost() {
        let mut graph = NavGraph::new();
        let low = graph.add_node(Vec3::new(0.0, -2.0, 0.0), NodeType::Standard, 1.0);
        let stair = graph.add_node(Vec3::new(0.0, 0.0, 0.0), NodeType::Stairs, 1.0);
        let high = graph.add_node(Vec3::new(0.0, 3.0, 0.0), NodeType::Interest, 1.0);
        graph.fetch_neighbors(&NavConfig::default());

        assert_eq!(graph.node(low).floor, 0);
        assert_eq!(graph.node(stair).floor, 1);
        assert_eq!(graph.node(high).floor, 2);
        assert_eq!(graph.node(stair).stair_cost, 1000.0);
        assert_eq!(graph.node(high).stair_cost, 0.0);
    }

    #[test]
    fn asymmetric_radius_still_links_both_ways() {
        let mut graph = NavGraph::new();
        let wide = graph.add_node(Vec3::ZERO, NodeType::Standard, 5.0);
        let narrow = graph.add_node(Vec3::new(3.0, 0.0, 0.0), NodeType::Standard, 1.0);
        graph.fetch_neighbors(&NavConfig::default());
        assert_eq!(graph.neighbors(wide), vec![narrow]);
        assert_eq!(graph.neighbors(narrow), vec![wide]);
    }

    #[test]
    fn moved_node_keeps_stale_weight() {
        let mut graph = line(2, 1.0);
        graph.add_edge(NodeId(0), NodeId(1)).unwrap();
        graph.set_position(NodeId(1), Vec3::new(10.0, 0.0, 0.0)).unwrap();
        assert_eq!(graph.distance_to_neighbor(NodeId(0), NodeId(1)), Some(1.0));
    }

    #[test]
    fn closest_node_respects_scale() {
        let mut graph = NavGraph::new();
        // Directly above the query point but one floor up.
        graph.add_node(Vec3::new(0.0, 2.0, 0.0), NodeType::Standard, 1.0);
        // Same height, a bit further away horizontally.
        graph.add_node(Vec3::new(3.0, 0.0, 0.0), NodeType::Standard, 1.0);

        let origin = Vec3::ZERO;
        assert_eq!(graph.closest_node(origin, Vec3::ONE, false), Some(NodeId(0)));
        assert_eq!(
            graph.closest_node(origin, Vec3::new(1.0, 10.0, 1.0), false),
            Some(NodeId(1))
        );
    }

    #[test]
    fn scale_applies_to_offset_not_absolute_position() {
        let mut graph = NavGraph::new();
        // Agent well above y = 0: a node just below it is nearest in plain
        // distance, but stretching the vertical offset favours its own level.
        let below = graph.add_node(Vec3::new(0.0, 3.0, 0.0), NodeType::Standard, 1.0);
        let level = graph.add_node(Vec3::new(3.0, 5.0, 0.0), NodeType::Standard, 1.0);
        let agent = Vec3::new(0.0, 5.0, 0.0);
        assert_eq!(graph.closest_node(agent, Vec3::ONE, false), Some(below));
        assert_eq!(
            graph.closest_node(agent, Vec3::new(1.0, 10.0, 1.0), false),
            Some(level)
        );
    }

    #[test]
    fn closest_enabled_skips_disabled_and_breaks_ties_low() {
        let mut graph = NavGraph::new();
        graph.add_node(Vec3::new(1.0, 0.0, 0.0), NodeType::Standard, 1.0);
        graph.add_node(Vec3::new(-1.0, 0.0, 0.0), NodeType::Standard, 1.0);
        graph.add_node(Vec3::new(0.0, 0.0, 5.0), NodeType::Standard, 1.0);
        assert_eq!(graph.closest_node(Vec3::ZERO, Vec3::ONE, true), Some(NodeId(0)));

        graph.set_enabled(NodeId(0), false).unwrap();
        graph.set_enabled(NodeId(1), false).unwrap();
        assert_eq!(graph.closest_node(Vec3::ZERO, Vec3::ONE, true), Some(NodeId(2)));
        assert_eq!(graph.closest_node(Vec3::ZERO, Vec3::ONE, false), Some(NodeId(0)));
    }

    #[test]
    fn closest_node_on_empty_graph() {
        let graph = NavGraph::new();
        assert_eq!(graph.closest_node(Vec3::ZERO, Vec3::ONE, false), None);
    }
}
