// Room exploration: visit every interest node of a room in random order.
//
// A `RoomExplorer` is the per-agent search state layered on a `Navigator`.
// `set_room` loads the room's interest nodes, shuffled once, into a stack;
// `try_next_room_node` pops nodes until a path to one is accepted. A node is
// popped whether or not its path is accepted, so no node is tried twice in
// one visit. When the stack runs dry without an accepted path the explorer
// is `Exhausted` and the caller should pick another room
// (`search_random_room` does that loop).
//
//   Idle --set_room--> SearchingRoom(room) --stack empty, no path--> Exhausted
//                          ^                                           |
//                          +-----------------set_room------------------+
//
// Exceptions are rooms this agent should not be sent to. The room just
// searched is excluded from the next random pick for that one call only.

use crate::error::Result;
use crate::manager::NavManager;
use crate::navigator::{Locomotion, Navigator, PositionSource};
use crate::types::{NodeId, RoomId, Vec3};
use rustc_hash::FxHashSet;
use tracing::debug;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExploreState {
    #[default]
    Idle,
    SearchingRoom(RoomId),
    Exhausted,
}

#[derive(Clone, Debug, Default)]
pub struct RoomExplorer {
    exceptions: FxHashSet<RoomId>,
    current_room: Option<RoomId>,
    /// Interest nodes still to try, next on top.
    room_nodes: Vec<NodeId>,
    state: ExploreState,
}

impl RoomExplorer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ExploreState {
        self.state
    }

    pub fn current_room(&self) -> Option<RoomId> {
        self.current_room
    }

    pub fn exceptions(&self) -> &FxHashSet<RoomId> {
        &self.exceptions
    }

    pub fn add_exception(&mut self, room: RoomId) {
        self.exceptions.insert(room);
    }

    pub fn remove_exception(&mut self, room: RoomId) {
        self.exceptions.remove(&room);
    }

    pub fn nodes_to_search(&self) -> usize {
        self.room_nodes.len()
    }

    pub fn clear_nodes(&mut self) {
        self.room_nodes.clear();
    }

    /// Make `room` the active room and reload its shuffled interest nodes.
    pub fn set_room(&mut self, manager: &mut NavManager, room: RoomId) -> Result<()> {
        let mut order = manager.shuffle_interest_nodes(room)?;
        order.reverse();
        self.room_nodes = order;
        self.current_room = Some(room);
        self.state = ExploreState::SearchingRoom(room);
        Ok(())
    }

    /// Pop interest nodes until the navigator accepts a path to one.
    /// Returns that node, or `None` once the room is exhausted.
    pub fn try_next_room_node<B>(
        &mut self,
        manager: &mut NavManager,
        navigator: &mut Navigator,
        body: &mut B,
    ) -> Result<Option<NodeId>>
    where
        B: PositionSource + Locomotion,
    {
        while let Some(node) = self.room_nodes.pop() {
            match navigator.start_path(manager, body, node) {
                Ok(_) => return Ok(Some(node)),
                Err(err) if err.is_rejection() => {
                    debug!(%node, %err, "interest node rejected");
                }
                Err(err) => return Err(err),
            }
        }
        if let Some(room) = self.current_room {
            debug!(%room, "room exhausted");
        }
        self.state = ExploreState::Exhausted;
        Ok(None)
    }

    /// `set_room` followed by `try_next_room_node`.
    pub fn search_room<B>(
        &mut self,
        manager: &mut NavManager,
        navigator: &mut Navigator,
        body: &mut B,
        room: RoomId,
    ) -> Result<Option<NodeId>>
    where
        B: PositionSource + Locomotion,
    {
        self.set_room(manager, room)?;
        self.try_next_room_node(manager, navigator, body)
    }

    /// Search the room containing `point`, such as the source of a noise.
    /// Outside every room there is nothing to search and `None` is returned.
    pub fn search_room_at<B>(
        &mut self,
        manager: &mut NavManager,
        navigator: &mut Navigator,
        body: &mut B,
        point: Vec3,
    ) -> Result<Option<NodeId>>
    where
        B: PositionSource + Locomotion,
    {
        match manager.room_at(point) {
            RoomId::WORLD => Ok(None),
            room => self.search_room(manager, navigator, body, room),
        }
    }

    /// Try rooms in random order until one yields an accepted path. Returns
    /// the room now being searched.
    pub fn search_random_room<B>(
        &mut self,
        manager: &mut NavManager,
        navigator: &mut Navigator,
        body: &mut B,
    ) -> Result<Option<RoomId>>
    where
        B: PositionSource + Locomotion,
    {
        let candidates = manager.shuffled_rooms(&self.excluding_current());
        for room in candidates {
            if self.search_room(manager, navigator, body, room)?.is_some() {
                return Ok(Some(room));
            }
        }
        Ok(None)
    }

    /// Random room other than the exceptions and the current room.
    pub fn random_room(&self, manager: &mut NavManager) -> Option<RoomId> {
        manager.random_room(&self.excluding_current())
    }

    fn excluding_current(&self) -> FxHashSet<RoomId> {
        let mut excluded = self.exceptions.clone();
        excluded.extend(self.current_room);
        excluded
    }
}
