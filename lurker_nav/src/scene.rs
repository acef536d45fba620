// JSON scene description: the waypoints and rooms a manager is built from.
//
// Nodes are identified by their position in `nodes`; a room's `anchor` is an
// index into that list. Optional fields fall back to `NavConfig` values or
// to the room defaults in `room.rs`.
//
// Example:
//
//     {
//       "nodes": [
//         { "position": [0, 0, 0] },
//         { "position": [2, 0, 0], "node_type": "interest" },
//         { "position": [4, 0, 0], "node_type": "stairs", "fetch_radius": 2.5 }
//       ],
//       "rooms": [
//         { "name": "Lab", "origin": [1, 0, 0], "anchor": 0,
//           "volumes": [{ "scale": [6, 3, 4] }] }
//       ]
//     }

use crate::error::{NavError, Result};
use crate::room::{RoomColor, RoomEnvironment, RoomType, RoomVolume};
use crate::types::{NodeType, Vec3};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavScene {
    pub nodes: Vec<NodeDesc>,
    pub rooms: Vec<RoomDesc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeDesc {
    pub position: Vec3,
    #[serde(default)]
    pub node_type: NodeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fetch_radius: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

impl NodeDesc {
    pub fn at(position: Vec3, node_type: NodeType) -> Self {
        Self {
            position,
            node_type,
            fetch_radius: None,
            enabled: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoomDesc {
    pub name: String,
    pub origin: Vec3,
    #[serde(default)]
    pub volumes: Vec<RoomVolume>,
    /// Index into `NavScene::nodes`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor: Option<u32>,
    #[serde(default)]
    pub room_type: RoomType,
    #[serde(default)]
    pub environment: RoomEnvironment,
    #[serde(default)]
    pub radioactive: bool,
    /// Randomised on load when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<RoomColor>,
}

impl NavScene {
    pub fn from_json(json: &str) -> Result<Self> {
        let scene: NavScene = serde_json::from_str(json)?;
        scene.validate()?;
        Ok(scene)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject anchors that point past the node list and non-finite input.
    pub fn validate(&self) -> Result<()> {
        for (i, node) in self.nodes.iter().enumerate() {
            if !node.position.is_finite() {
                return Err(NavError::Scene(format!("node {i} has a non-finite position")));
            }
            if let Some(r) = node.fetch_radius.filter(|r| r.is_nan() || *r <= 0.0) {
                return Err(NavError::Scene(format!(
                    "node {i} has fetch_radius {r}, expected a positive value"
                )));
            }
        }
        for room in &self.rooms {
            if let Some(anchor) = room.anchor.filter(|&a| a as usize >= self.nodes.len()) {
                return Err(NavError::Scene(format!(
                    "room {:?} anchors to node {anchor}, but the scene has {} nodes",
                    room.name,
                    self.nodes.len()
                )));
            }
        }
        Ok(())
    }
}
