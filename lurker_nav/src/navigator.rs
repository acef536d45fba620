// Agent-side path follower.
//
// A `Navigator` walks one agent along the path stack the manager keeps for
// it. The agent's body is reached through two small traits: `PositionSource`
// reports where the agent is, `Locomotion` receives one target position at a
// time. Arrival is polled by the caller (`is_arrived_at_node`), which then
// calls `go_to_next_node`; the navigator itself never ticks.
//
// After `start_path` the start node has already been popped and is the
// current waypoint, so the stack holds only the waypoints still ahead.
//
// See also: `manager.rs` for planning and the path stacks, `explore.rs` for
// the room-search layer that drives a navigator.

use crate::error::{NavError, Result};
use crate::manager::NavManager;
use crate::types::{AgentId, NodeId, Vec3};

/// Anything that can report a world position.
pub trait PositionSource {
    fn position(&self) -> Vec3;
}

/// Movement controller that walks toward one target at a time.
pub trait Locomotion {
    fn go_to(&mut self, target: Vec3);
}

#[derive(Clone, Debug)]
pub struct Navigator {
    agent: AgentId,
    current: Option<NodeId>,
    goal: Option<NodeId>,
    /// Distance under which the current waypoint counts as reached.
    pub arrival_distance: f32,
}

impl Navigator {
    pub fn new(agent: AgentId, arrival_distance: f32) -> Self {
        Self {
            agent,
            current: None,
            goal: None,
            arrival_distance,
        }
    }

    /// Navigator using the manager's configured arrival distance.
    pub fn for_manager(agent: AgentId, manager: &NavManager) -> Self {
        Self::new(agent, manager.config().reach_node_distance)
    }

    pub fn agent(&self) -> AgentId {
        self.agent
    }

    /// Waypoint currently being walked to.
    pub fn current(&self) -> Option<NodeId> {
        self.current
    }

    pub fn goal(&self) -> Option<NodeId> {
        self.goal
    }

    /// Plan from the body's position to `goal` and start walking. On
    /// rejection nothing changes and the error is returned.
    pub fn start_path<B>(&mut self, manager: &mut NavManager, body: &mut B, goal: NodeId) -> Result<NodeId>
    where
        B: PositionSource + Locomotion,
    {
        let first = manager.start_path(self.agent, body.position(), goal)?;
        manager.pop_path(self.agent);
        let agent = self.agent;
        if let Some(previous) = self
            .current
            .filter(|&p| p != first && !manager.path_contains(agent, p))
        {
            manager.deselect(previous);
        }
        self.current = Some(first);
        self.goal = Some(goal);
        body.go_to(manager.graph().node(first).position);
        Ok(first)
    }

    /// `start_path` toward the enabled node nearest `destination`.
    pub fn start_path_to_position<B>(
        &mut self,
        manager: &mut NavManager,
        body: &mut B,
        destination: Vec3,
    ) -> Result<NodeId>
    where
        B: PositionSource + Locomotion,
    {
        let goal = manager
            .closest_enabled_node(destination, Vec3::ONE)
            .ok_or(NavError::NoEnabledNodes)?;
        self.start_path(manager, body, goal)
    }

    pub fn is_arrived_at_node(&self, manager: &NavManager, body: &impl PositionSource) -> bool {
        self.current
            .and_then(|c| manager.graph().get(c))
            .is_some_and(|n| n.position.distance(body.position()) < self.arrival_distance)
    }

    pub fn is_last_node(&self) -> bool {
        self.current.is_some() && self.current == self.goal
    }

    pub fn has_path(&self, manager: &NavManager) -> bool {
        manager.has_path(self.agent)
    }

    /// Leave the current waypoint behind and head for the next one. Returns
    /// the new waypoint, or `None` if the path is used up.
    pub fn go_to_next_node(&mut self, manager: &mut NavManager, body: &mut impl Locomotion) -> Option<NodeId> {
        if let Some(previous) = self.current {
            manager.deselect(previous);
        }
        self.current = manager.pop_path(self.agent);
        let next = self.current?;
        body.go_to(manager.graph().node(next).position);
        Some(next)
    }

    /// Drop the rest of the path and forget the goal.
    pub fn abandon(&mut self, manager: &mut NavManager) {
        manager.finish_path(self.agent);
        if let Some(current) = self.current.take() {
            manager.deselect(current);
        }
        self.goal = None;
    }
}
