// Core handle and enum types shared across the navigation core.
//
// Nodes, rooms and agents are addressed by small integer handles rather than
// references. Nodes hold edges that name other nodes, and the graph is walked
// in both directions; handles into an arena keep that cyclic shape free of
// ownership questions and make a full rebuild a matter of clearing vectors.
//
// Positions use `glam::Vec3` (re-exported here). Y is up.

use serde::{Deserialize, Serialize};
use std::fmt;

pub use glam::Vec3;

/// Integer floor bucket derived from a node's height. See
/// `graph::floor_for_height`.
pub type Floor = i32;

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub u32);

        impl $name {
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}#{}", $label, self.0)
            }
        }
    };
}

handle!(
    /// Stable index of a node in `NavGraph`.
    NodeId,
    "node"
);
handle!(
    /// Index of a room in `NavManager::rooms`. `RoomId::WORLD` is the
    /// "outside every room" sentinel.
    RoomId,
    "room"
);
handle!(
    /// Identifies an agent that owns a path stack.
    AgentId,
    "agent"
);

impl RoomId {
    pub const WORLD: RoomId = RoomId(0);
}

/// Role of a waypoint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    #[default]
    Standard,
    /// Something worth looking at when searching a room.
    Interest,
    /// Entry/exit of a staircase; carries the stair traversal penalty.
    Stairs,
    /// Doorway out of a room.
    Exit,
}

/// Which way a staircase must lead.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StairDirection {
    Up,
    Down,
}

impl StairDirection {
    /// Direction that moves `current` toward `target`. Equal floors count as
    /// `Down`, matching the strict `current < target` test for `Up`.
    pub fn toward(current: Floor, target: Floor) -> Self {
        if current < target {
            StairDirection::Up
        } else {
            StairDirection::Down
        }
    }

    /// True if going from `from` to `to` moves in this direction.
    pub fn leads(self, from: Floor, to: Floor) -> bool {
        match self {
            StairDirection::Up => to > from,
            StairDirection::Down => to < from,
        }
    }
}

impl fmt::Display for StairDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StairDirection::Up => f.write_str("up"),
            StairDirection::Down => f.write_str("down"),
        }
    }
}
