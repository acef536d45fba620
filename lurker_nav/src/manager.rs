// Graph manager: owns the waypoint graph, the rooms, and every agent's
// pending path.
//
// `NavManager` is the entry point for callers. It is built from a
// `NavScene` (or empty, then filled with `add_node` / `add_room`) and is
// usable once `rebuild_graph` has run. A rebuild recomputes everything that
// derives from node positions: type buckets, floors, stair costs, edges, and
// room membership. Between rebuilds only single edges (`add_edge`,
// `remove_edge`), `detach_node` and the enabled flag are patched.
//
// Planning: `plan` picks the agent's start node (nearest enabled node, with
// the vertical axis inflated so the agent's own floor wins), then either
// runs A* directly when start and destination share a floor, or hands the
// request to the `FloorRouter`. A same-floor plan that still changes floors
// is rejected. `start_path` stores a successful plan as the agent's path
// stack, replacing any previous one; a rejected plan leaves the old stack
// alone.
//
// Path stacks are `Vec`s with the next waypoint at the end. Nodes on a
// pending path carry the `selected` marker until popped by a navigator or
// drained by `finish_path`. The marker is shared by all agents, so it is a
// display hint rather than an ownership record.
//
// Rooms: index 0 is the world sentinel. Every room query below builds its
// candidate pool from the remaining rooms, so the sentinel is never offered
// as a destination. Exception sets are read, never modified.
//
// See also: `floor_router.rs` for cross-floor routes, `explore.rs` and
// `navigator.rs` for the per-agent layers that call into this.
//
// **Critical constraint: determinism.** All randomness comes from the
// manager's own `LurkerRng`, seeded from the config. Room pools are built in
// room order and node buckets in node order, so the same scene, config, and
// call sequence always produce the same plans and shuffles.

use crate::config::NavConfig;
use crate::error::{NavError, Result};
use crate::floor_router::{FloorRouter, GreedyStaircaseRouter, path_complexity};
use crate::graph::NavGraph;
use crate::room::{Room, random_room_color};
use crate::scene::{NavScene, RoomDesc};
use crate::search::{SearchParams, astar};
use crate::types::{AgentId, Floor, NodeId, NodeType, RoomId, Vec3};
use lurker_prng::LurkerRng;
use rustc_hash::FxHashSet;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

/// Shape problems `rebuild_graph` logs. Planning still runs; these predict
/// which requests will be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GraphWarning {
    /// Several floors but fewer than two stair nodes, so no staircase pair.
    UnpairedFloors { floors: usize, stairs: usize },
    /// Rooms exist but fewer than two interest nodes to search between them.
    SparseInterest { interest: usize },
}

pub struct NavManager {
    config: NavConfig,
    graph: NavGraph,
    interest_nodes: Vec<NodeId>,
    stair_nodes: Vec<NodeId>,
    rooms: Vec<Room>,
    router: Box<dyn FloorRouter>,
    rng: LurkerRng,
    paths: BTreeMap<AgentId, Vec<NodeId>>,
}

impl NavManager {
    /// Empty manager holding only the world room.
    pub fn new(config: NavConfig) -> Result<Self> {
        config.validate()?;
        let router = GreedyStaircaseRouter {
            max_legs: config.max_staircase_legs,
        };
        Ok(Self {
            rng: LurkerRng::new(config.rng_seed),
            config,
            graph: NavGraph::new(),
            interest_nodes: Vec::new(),
            stair_nodes: Vec::new(),
            rooms: vec![Room::world()],
            router: Box::new(router),
            paths: BTreeMap::new(),
        })
    }

    /// Build from a scene and run the first rebuild.
    pub fn from_scene(scene: &NavScene, config: NavConfig) -> Result<Self> {
        scene.validate()?;
        let mut manager = Self::new(config)?;
        for desc in &scene.nodes {
            let id = manager.add_node(desc.position, desc.node_type, desc.fetch_radius);
            if desc.enabled == Some(false) {
                manager.graph.node_mut(id).enabled = false;
            }
        }
        for desc in &scene.rooms {
            manager.add_room(desc)?;
        }
        manager.rebuild_graph();
        Ok(manager)
    }

    /// Swap the cross-floor routing strategy.
    pub fn with_router(mut self, router: Box<dyn FloorRouter>) -> Self {
        self.router = router;
        self
    }

    pub fn config(&self) -> &NavConfig {
        &self.config
    }

    pub fn graph(&self) -> &NavGraph {
        &self.graph
    }

    pub fn interest_nodes(&self) -> &[NodeId] {
        &self.interest_nodes
    }

    pub fn stair_nodes(&self) -> &[NodeId] {
        &self.stair_nodes
    }

    /// Add a waypoint. It has no edges and no floor until the next rebuild.
    pub fn add_node(&mut self, position: Vec3, node_type: NodeType, fetch_radius: Option<f32>) -> NodeId {
        let radius = fetch_radius.unwrap_or(self.config.default_fetch_radius);
        self.graph.add_node(position, node_type, radius)
    }

    /// Add a room. Its membership is empty until the next rebuild.
    pub fn add_room(&mut self, desc: &RoomDesc) -> Result<RoomId> {
        let id = RoomId(self.rooms.len() as u32);
        let mut room = Room::new(id, desc.name.clone(), desc.origin, desc.volumes.clone());
        room.room_type = desc.room_type;
        room.environment = desc.environment;
        room.radioactive = desc.radioactive;
        room.color = match desc.color {
            Some(color) => color,
            None => random_room_color(&mut self.rng),
        };
        if let Some(anchor) = desc.anchor {
            let anchor = NodeId(anchor);
            self.graph.check(anchor)?;
            room.anchor = Some(anchor);
        }
        self.rooms.push(room);
        Ok(id)
    }

    /// Move a waypoint. Floors, edges and room membership follow on the next
    /// rebuild.
    pub fn set_node_position(&mut self, id: NodeId, position: Vec3) -> Result<()> {
        self.graph.set_position(id, position)
    }

    /// Recompute buckets, floors, stair costs, edges and room membership.
    pub fn rebuild_graph(&mut self) {
        self.interest_nodes.clear();
        self.stair_nodes.clear();
        for node in self.graph.nodes() {
            match node.node_type {
                NodeType::Interest => self.interest_nodes.push(node.id),
                NodeType::Stairs => self.stair_nodes.push(node.id),
                _ => {}
            }
        }

        self.graph.fetch_neighbors(&self.config);
        self.fetch_rooms();

        info!(
            nodes = self.graph.node_count(),
            edges = self.graph.edge_count(),
            floors = self.floor_count(),
            rooms = self.rooms.len() - 1,
            "rebuilt navigation graph"
        );
        for warning in self.graph_warnings() {
            match warning {
                GraphWarning::UnpairedFloors { floors, stairs } => {
                    warn!(floors, stairs, "graph spans several floors but cannot pair any staircase")
                }
                GraphWarning::SparseInterest { interest } => {
                    warn!(interest, "graph has rooms but fewer than two interest nodes")
                }
            }
        }
    }

    fn floor_count(&self) -> usize {
        let floors: BTreeSet<Floor> = self.graph.nodes().iter().map(|n| n.floor).collect();
        floors.len()
    }

    /// Degenerate shapes in the graph as of the last rebuild.
    pub fn graph_warnings(&self) -> Vec<GraphWarning> {
        let mut warnings = Vec::new();
        let floors = self.floor_count();
        if floors > 1 && self.stair_nodes.len() < 2 {
            warnings.push(GraphWarning::UnpairedFloors {
                floors,
                stairs: self.stair_nodes.len(),
            });
        }
        if self.rooms.len() > 1 && self.interest_nodes.len() < 2 {
            warnings.push(GraphWarning::SparseInterest {
                interest: self.interest_nodes.len(),
            });
        }
        warnings
    }

    /// Recompute room membership without touching edges.
    pub fn fetch_rooms(&mut self) {
        let graph = &self.graph;
        for room in &mut self.rooms {
            room.fetch_nodes(graph);
        }
    }

    /// Disable a node and drop its edges, without a rebuild.
    pub fn detach_node(&mut self, id: NodeId) -> Result<()> {
        self.graph.detach_node(id)?;
        debug!(node = %id, "detached node");
        Ok(())
    }

    /// Link two nodes without a rebuild. See `NavGraph::add_edge`.
    pub fn add_edge(&mut self, a: NodeId, b: NodeId) -> Result<bool> {
        self.graph.add_edge(a, b)
    }

    /// Cut the edge between two nodes without a rebuild.
    pub fn remove_edge(&mut self, a: NodeId, b: NodeId) -> Result<bool> {
        let removed = self.graph.remove_edge(a, b)?;
        if removed {
            debug!(%a, %b, "removed edge");
        }
        Ok(removed)
    }

    pub fn set_node_enabled(&mut self, id: NodeId, enabled: bool) -> Result<()> {
        self.graph.set_enabled(id, enabled)
    }

    pub fn closest_node(&self, position: Vec3, scale: Vec3) -> Option<NodeId> {
        self.graph.closest_node(position, scale, false)
    }

    pub fn closest_enabled_node(&self, position: Vec3, scale: Vec3) -> Option<NodeId> {
        self.graph.closest_node(position, scale, true)
    }

    /// The node an agent standing at `position` starts walking from.
    pub fn start_node_for(&self, position: Vec3) -> Result<NodeId> {
        let scale = Vec3::new(1.0, self.config.start_node_vertical_scale, 1.0);
        self.closest_enabled_node(position, scale)
            .ok_or(NavError::NoEnabledNodes)
    }

    pub fn search_params(&self) -> SearchParams {
        SearchParams {
            vertical_weight: self.config.vertical_heuristic_weight,
            max_expansions: self.config.max_search_expansions,
        }
    }

    pub fn path_complexity(&self, nodes: &[NodeId]) -> usize {
        path_complexity(&self.graph, nodes)
    }

    /// Plan from the agent's start node to `destination` without storing
    /// anything. The returned path starts at the start node and ends at
    /// `destination`.
    pub fn plan(&self, origin: Vec3, destination: NodeId) -> Result<Vec<NodeId>> {
        self.graph.check(destination)?;
        let start = self.start_node_for(origin)?;
        self.plan_between(start, destination)
    }

    /// Node-to-node planning with the same-floor / cross-floor split.
    pub fn plan_between(&self, start: NodeId, destination: NodeId) -> Result<Vec<NodeId>> {
        self.graph.check(start)?;
        self.graph.check(destination)?;
        let params = self.search_params();
        let result = if self.graph.node(start).floor == self.graph.node(destination).floor {
            astar(&self.graph, start, destination, &params).and_then(|path| {
                match self.path_complexity(&path.nodes) {
                    0 => Ok(path.nodes),
                    complexity => Err(NavError::TooComplex { complexity }),
                }
            })
        } else {
            self.router
                .route(&self.graph, &self.stair_nodes, start, destination, &params)
        };
        if let Err(err) = &result {
            debug!(%start, %destination, %err, "plan rejected");
        }
        result
    }

    /// Plan and store the result as `agent`'s path, replacing any previous
    /// one. Returns the start node, which is also the top of the new stack.
    pub fn start_path(&mut self, agent: AgentId, origin: Vec3, destination: NodeId) -> Result<NodeId> {
        let path = self.plan(origin, destination)?;
        self.finish_path(agent);
        for &node in &path {
            self.graph.node_mut(node).selected = true;
        }
        let start = path[0];
        let mut stack = path;
        stack.reverse();
        self.paths.insert(agent, stack);
        Ok(start)
    }

    /// Next waypoint of `agent`'s path, or `None` once it is used up.
    pub fn pop_path(&mut self, agent: AgentId) -> Option<NodeId> {
        self.paths.get_mut(&agent)?.pop()
    }

    pub fn peek_path(&self, agent: AgentId) -> Option<NodeId> {
        self.paths.get(&agent)?.last().copied()
    }

    pub fn has_path(&self, agent: AgentId) -> bool {
        self.path_len(agent) > 0
    }

    pub fn path_len(&self, agent: AgentId) -> usize {
        self.paths.get(&agent).map_or(0, Vec::len)
    }

    /// Whether `node` is still ahead on `agent`'s path.
    pub fn path_contains(&self, agent: AgentId, node: NodeId) -> bool {
        self.paths.get(&agent).is_some_and(|stack| stack.contains(&node))
    }

    /// Drop `agent`'s remaining waypoints and clear their markers.
    pub fn finish_path(&mut self, agent: AgentId) {
        if let Some(stack) = self.paths.remove(&agent) {
            for node in stack {
                self.graph.node_mut(node).selected = false;
            }
        }
    }

    /// Clear the `selected` marker on one node. Unknown handles are ignored.
    pub fn deselect(&mut self, node: NodeId) {
        if let Some(n) = self.graph.get_mut(node) {
            n.selected = false;
        }
    }

    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    pub fn room(&self, id: RoomId) -> Result<&Room> {
        self.rooms.get(id.index()).ok_or(NavError::UnknownRoom(id))
    }

    /// First non-world room containing `point`, else the world room.
    pub fn room_at(&self, point: Vec3) -> RoomId {
        self.rooms
            .iter()
            .skip(1)
            .find(|r| r.contains_point(point))
            .map_or(RoomId::WORLD, |r| r.id)
    }

    fn room_pool(&self, exceptions: &FxHashSet<RoomId>) -> Vec<RoomId> {
        self.rooms
            .iter()
            .skip(1)
            .map(|r| r.id)
            .filter(|id| !exceptions.contains(id))
            .collect()
    }

    /// Uniformly random room outside `exceptions`.
    pub fn random_room(&mut self, exceptions: &FxHashSet<RoomId>) -> Option<RoomId> {
        let pool = self.room_pool(exceptions);
        self.rng.pick(pool.len()).map(|i| pool[i])
    }

    /// Every room outside `exceptions`, in random order.
    pub fn shuffled_rooms(&mut self, exceptions: &FxHashSet<RoomId>) -> Vec<RoomId> {
        let pool = self.room_pool(exceptions);
        self.rng.shuffle_by_removal(pool)
    }

    /// Rooms whose first volume is farther than `max_distance` from
    /// `origin`.
    pub fn rooms_beyond(&self, origin: NodeId, max_distance: f32) -> Result<Vec<RoomId>> {
        let position = self.graph.get(origin).ok_or(NavError::UnknownNode(origin))?.position;
        Ok(self
            .rooms
            .iter()
            .skip(1)
            .filter(|r| r.distance_to_bounds(position) > max_distance)
            .map(|r| r.id)
            .collect())
    }

    /// A random room within `max_distance` of `origin` whose anchor node is
    /// on `origin`'s floor and reachable without changing floors. Rooms
    /// without an anchor are skipped. `Ok(None)` once the pool is exhausted.
    pub fn random_zero_complexity_room(
        &mut self,
        origin: NodeId,
        max_distance: f32,
        exceptions: &FxHashSet<RoomId>,
    ) -> Result<Option<RoomId>> {
        let mut excluded = exceptions.clone();
        excluded.extend(self.rooms_beyond(origin, max_distance)?);
        let pool = self.shuffled_rooms(&excluded);

        let floor = self.graph.node(origin).floor;
        let params = self.search_params();
        for room in pool {
            let Some(anchor) = self.rooms[room.index()].anchor else {
                continue;
            };
            if self.graph.node(anchor).floor != floor {
                continue;
            }
            match astar(&self.graph, origin, anchor, &params) {
                Ok(path) if self.path_complexity(&path.nodes) == 0 => return Ok(Some(room)),
                Ok(_) => {}
                Err(err) if err.is_rejection() => {}
                Err(err) => return Err(err),
            }
        }
        Ok(None)
    }

    /// Reorder `room`'s interest nodes at random, store that order on the
    /// room, and return it.
    pub fn shuffle_interest_nodes(&mut self, room: RoomId) -> Result<Vec<NodeId>> {
        let target = self
            .rooms
            .get_mut(room.index())
            .ok_or(NavError::UnknownRoom(room))?;
        let shuffled = self
            .rng
            .shuffle_by_removal(std::mem::take(&mut target.interest_nodes));
        target.interest_nodes = shuffled.clone();
        Ok(shuffled)
    }
}

impl std::fmt::Debug for NavManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NavManager")
            .field("nodes", &self.graph.node_count())
            .field("rooms", &self.rooms.len())
            .field("agents_with_paths", &self.paths.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::room::RoomVolume;
    use crate::scene::NodeDesc;

    fn room_desc(name: &str, origin: Vec3, anchor: Option<u32>) -> RoomDesc {
        RoomDesc {
            name: name.into(),
            origin,
            volumes: vec![RoomVolume {
                scale: Vec3::new(4.0, 2.0, 4.0),
                ..RoomVolume::default()
            }],
            anchor,
            room_type: Default::default(),
            environment: Default::default(),
            radioactive: false,
            color: None,
        }
    }

    /// Ten nodes along X on floor 1, spacing 1, radius 1.5.
    fn corridor() -> NavManager {
        let nodes = (0..10)
            .map(|i| NodeDesc {
                fetch_radius: Some(1.5),
                ..NodeDesc::at(
                    Vec3::new(i as f32, 0.0, 0.0),
                    if i % 3 == 2 {
                        NodeType::Interest
                    } else {
                        NodeType::Standard
                    },
                )
            })
            .collect();
        let scene = NavScene {
            nodes,
            rooms: vec![
                room_desc("west", Vec3::new(1.0, 0.0, 0.0), Some(1)),
                room_desc("east", Vec3::new(7.0, 0.0, 0.0), Some(7)),
            ],
        };
        NavManager::from_scene(&scene, NavConfig::default()).unwrap()
    }

    #[test]
    fn from_scene_builds_buckets_and_rooms() {
        let m = corridor();
        assert_eq!(m.graph().node_count(), 10);
        assert_eq!(m.graph().edge_count(), 9);
        assert_eq!(m.interest_nodes(), &[NodeId(2), NodeId(5), NodeId(8)]);
        assert!(m.stair_nodes().is_empty());
        assert_eq!(m.rooms().len(), 3);
        assert!(m.rooms()[0].is_world);
        // West spans x in [-1, 3].
        assert_eq!(m.rooms()[1].nodes, vec![NodeId(0), NodeId(1), NodeId(2), NodeId(3)]);
        assert_eq!(m.rooms()[1].interest_nodes, vec![NodeId(2)]);
    }

    #[test]
    fn start_node_prefers_own_floor() {
        let mut m = NavManager::new(NavConfig::default()).unwrap();
        let above = m.add_node(Vec3::new(0.0, 2.0, 0.0), NodeType::Standard, None);
        let level = m.add_node(Vec3::new(4.0, 0.0, 0.0), NodeType::Standard, None);
        m.rebuild_graph();
        assert_eq!(m.closest_node(Vec3::ZERO, Vec3::ONE), Some(above));
        assert_eq!(m.start_node_for(Vec3::ZERO).unwrap(), level);
    }

    #[test]
    fn plan_includes_start_and_destination() {
        let m = corridor();
        let path = m.plan(Vec3::new(0.1, 0.0, 0.0), NodeId(4)).unwrap();
        assert_eq!(path, vec![NodeId(0), NodeId(1), NodeId(2), NodeId(3), NodeId(4)]);
    }

    #[test]
    fn plan_on_empty_graph_rejects() {
        let mut m = NavManager::new(NavConfig::default()).unwrap();
        let only = m.add_node(Vec3::ZERO, NodeType::Standard, None);
        m.rebuild_graph();
        m.set_node_enabled(only, false).unwrap();
        let err = m.plan(Vec3::ZERO, only).unwrap_err();
        assert!(matches!(err, NavError::NoEnabledNodes));
    }

    #[test]
    fn plan_to_unknown_node_is_contract_violation() {
        let m = corridor();
        let err = m.plan(Vec3::ZERO, NodeId(99)).unwrap_err();
        assert!(err.is_contract_violation());
    }

    #[test]
    fn start_path_stacks_and_marks() {
        let mut m = corridor();
        let agent = AgentId(1);
        let start = m.start_path(agent, Vec3::new(9.0, 0.0, 0.0), NodeId(6)).unwrap();
        assert_eq!(start, NodeId(9));
        assert_eq!(m.path_len(agent), 4);
        assert_eq!(m.peek_path(agent), Some(NodeId(9)));
        assert!(m.graph().node(NodeId(7)).selected);

        let popped: Vec<_> = std::iter::from_fn(|| m.pop_path(agent)).collect();
        assert_eq!(popped, vec![NodeId(9), NodeId(8), NodeId(7), NodeId(6)]);
        assert!(!m.has_path(agent));
        assert_eq!(m.pop_path(agent), None);
    }

    #[test]
    fn new_path_replaces_old_and_clears_markers() {
        let mut m = corridor();
        let agent = AgentId(1);
        m.start_path(agent, Vec3::ZERO, NodeId(3)).unwrap();
        m.start_path(agent, Vec3::new(9.0, 0.0, 0.0), NodeId(8)).unwrap();
        assert_eq!(m.path_len(agent), 2);
        assert!(!m.graph().node(NodeId(1)).selected);
        assert!(m.graph().node(NodeId(8)).selected);
    }

    #[test]
    fn rejected_plan_keeps_old_path() {
        let mut m = corridor();
        let agent = AgentId(1);
        m.start_path(agent, Vec3::ZERO, NodeId(3)).unwrap();
        m.detach_node(NodeId(5)).unwrap();
        let err = m.start_path(agent, Vec3::ZERO, NodeId(8)).unwrap_err();
        assert!(err.is_rejection());
        assert_eq!(m.path_len(agent), 4);
    }

    #[test]
    fn finish_path_drains_and_unmarks() {
        let mut m = corridor();
        let agent = AgentId(3);
        m.start_path(agent, Vec3::ZERO, NodeId(5)).unwrap();
        m.finish_path(agent);
        assert!(!m.has_path(agent));
        assert!(m.graph().nodes().iter().all(|n| !n.selected));
    }

    #[test]
    fn agents_keep_separate_stacks() {
        let mut m = corridor();
        m.start_path(AgentId(1), Vec3::ZERO, NodeId(2)).unwrap();
        m.start_path(AgentId(2), Vec3::new(9.0, 0.0, 0.0), NodeId(8)).unwrap();
        assert_eq!(m.path_len(AgentId(1)), 3);
        assert_eq!(m.path_len(AgentId(2)), 2);
        m.finish_path(AgentId(1));
        assert_eq!(m.path_len(AgentId(2)), 2);
    }

    #[test]
    fn room_pools_skip_world_and_exceptions() {
        let mut m = corridor();
        let mut exceptions = FxHashSet::default();
        let all = m.shuffled_rooms(&exceptions);
        assert_eq!(all.len(), 2);
        assert!(!all.contains(&RoomId::WORLD));

        exceptions.insert(RoomId(1));
        assert_eq!(m.shuffled_rooms(&exceptions), vec![RoomId(2)]);
        assert_eq!(m.random_room(&exceptions), Some(RoomId(2)));

        exceptions.insert(RoomId(2));
        assert_eq!(m.random_room(&exceptions), None);
        assert_eq!(exceptions.len(), 2);
    }

    #[test]
    fn room_at_falls_back_to_world() {
        let m = corridor();
        assert_eq!(m.room_at(Vec3::new(0.5, 0.0, 0.0)), RoomId(1));
        assert_eq!(m.room_at(Vec3::new(7.5, 0.0, 0.0)), RoomId(2));
        assert_eq!(m.room_at(Vec3::new(4.0, 0.0, 0.0)), RoomId::WORLD);
    }

    #[test]
    fn rooms_beyond_filters_by_first_volume() {
        let m = corridor();
        // West's box ends at x = 3, east's starts at x = 5.
        assert_eq!(m.rooms_beyond(NodeId(0), 4.0).unwrap(), vec![RoomId(2)]);
        assert!(m.rooms_beyond(NodeId(4), 1.5).unwrap().is_empty());
    }

    #[test]
    fn zero_complexity_room_respects_distance_and_reachability() {
        let mut m = corridor();
        let none = FxHashSet::default();
        assert_eq!(
            m.random_zero_complexity_room(NodeId(0), 4.0, &none).unwrap(),
            Some(RoomId(1))
        );

        // Cut the corridor: east's anchor is no longer reachable from node 0.
        m.detach_node(NodeId(4)).unwrap();
        for _ in 0..5 {
            assert_eq!(
                m.random_zero_complexity_room(NodeId(0), f32::MAX, &none).unwrap(),
                Some(RoomId(1))
            );
        }

        let mut exceptions = FxHashSet::default();
        exceptions.insert(RoomId(1));
        assert_eq!(
            m.random_zero_complexity_room(NodeId(0), f32::MAX, &exceptions).unwrap(),
            None
        );
    }

    #[test]
    fn shuffle_interest_nodes_is_a_stored_permutation() {
        let mut m = NavManager::new(NavConfig::default()).unwrap();
        for i in 0..6 {
            m.add_node(Vec3::new(i as f32 * 0.5, 0.0, 0.0), NodeType::Interest, None);
        }
        let room = m.add_room(&room_desc("big", Vec3::new(1.0, 0.0, 0.0), None)).unwrap();
        m.rebuild_graph();

        let shuffled = m.shuffle_interest_nodes(room).unwrap();
        let mut sorted = shuffled.clone();
        sorted.sort();
        assert_eq!(sorted, (0..6).map(NodeId).collect::<Vec<_>>());
        assert_eq!(m.room(room).unwrap().interest_nodes, shuffled);

        assert!(matches!(
            m.shuffle_interest_nodes(RoomId(9)),
            Err(NavError::UnknownRoom(RoomId(9)))
        ));
    }

    #[test]
    fn same_seed_same_shuffles() {
        let mut a = corridor();
        let mut b = corridor();
        let none = FxHashSet::default();
        for _ in 0..10 {
            assert_eq!(a.shuffled_rooms(&none), b.shuffled_rooms(&none));
        }
    }

    #[test]
    fn rebuild_is_idempotent() {
        let mut m = corridor();
        let before: Vec<_> = m.graph().edges().map(|e| e.nodes).collect();
        m.rebuild_graph();
        let after: Vec<_> = m.graph().edges().map(|e| e.nodes).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn single_edge_patches_hold_until_rebuild() {
        let mut m = corridor();
        assert!(m.remove_edge(NodeId(4), NodeId(5)).unwrap());
        assert!(!m.remove_edge(NodeId(4), NodeId(5)).unwrap());
        assert!(matches!(
            m.plan(Vec3::ZERO, NodeId(9)),
            Err(NavError::Unreachable { .. })
        ));

        assert!(m.add_edge(NodeId(4), NodeId(5)).unwrap());
        assert_eq!(m.plan(Vec3::ZERO, NodeId(9)).unwrap().len(), 10);

        m.remove_edge(NodeId(4), NodeId(5)).unwrap();
        m.rebuild_graph();
        assert!(m.graph().neighbors(NodeId(4)).contains(&NodeId(5)));

        assert!(m.add_edge(NodeId(4), NodeId(40)).unwrap_err().is_contract_violation());
    }

    #[test]
    fn path_contains_only_pending_nodes() {
        let mut m = corridor();
        let agent = AgentId(2);
        m.start_path(agent, Vec3::ZERO, NodeId(3)).unwrap();
        assert!(m.path_contains(agent, NodeId(0)));
        assert!(m.path_contains(agent, NodeId(3)));
        assert!(!m.path_contains(agent, NodeId(4)));
        assert!(!m.path_contains(AgentId(5), NodeId(0)));

        m.pop_path(agent);
        assert!(!m.path_contains(agent, NodeId(0)));
        assert!(m.path_contains(agent, NodeId(1)));
    }

    #[test]
    fn graph_warnings_flag_degenerate_shapes() {
        assert!(corridor().graph_warnings().is_empty());

        let mut m = NavManager::new(NavConfig::default()).unwrap();
        m.add_node(Vec3::ZERO, NodeType::Interest, None);
        m.add_node(Vec3::new(0.0, 3.0, 0.0), NodeType::Stairs, None);
        m.add_room(&room_desc("lonely", Vec3::ZERO, None)).unwrap();
        m.rebuild_graph();
        assert_eq!(
            m.graph_warnings(),
            vec![
                GraphWarning::UnpairedFloors { floors: 2, stairs: 1 },
                GraphWarning::SparseInterest { interest: 1 },
            ]
        );
    }

    #[test]
    fn empty_room_pool_is_none_not_an_error() {
        let mut m = NavManager::new(NavConfig::default()).unwrap();
        let origin = m.add_node(Vec3::ZERO, NodeType::Standard, None);
        m.rebuild_graph();
        let none = FxHashSet::default();
        assert_eq!(m.random_room(&none), None);
        assert!(m.shuffled_rooms(&none).is_empty());
        assert_eq!(m.random_zero_complexity_room(origin, f32::MAX, &none).unwrap(), None);
    }
}
