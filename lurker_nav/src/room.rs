// Rooms: named groups of oriented boxes and the waypoints inside them.
//
// A room is anchored at `origin`; each `RoomVolume` is a box centred at
// `origin + offset`, rotated by Euler angles in degrees (Y-X-Z application
// order, Y outermost) and sized by `scale`. A point belongs to the room if it
// lies inside any of its volumes, boundaries included.
//
// Membership (`nodes`, `interest_nodes`, `exit_nodes`) is derived by
// `fetch_nodes` at rebuild time and is not kept in step with node moves.
// `interest_nodes` and `exit_nodes` are filtered views of `nodes`.
//
// The world room is the "outside every room" sentinel. It lives at index 0
// of the manager's room list, never collects nodes, and is never offered as
// an exploration target.
//
// See also: `manager.rs` for room pools and `room_at`, `explore.rs` for the
// per-agent room search built on `interest_nodes`.

use crate::graph::NavGraph;
use crate::types::{NodeId, NodeType, RoomId, Vec3};
use glam::{EulerRot, Mat3, Quat};
use lurker_prng::LurkerRng;
use serde::{Deserialize, Serialize};

/// One oriented box of a room, relative to the room's origin.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomVolume {
    pub offset: Vec3,
    /// Euler angles in degrees.
    pub rotation: Vec3,
    /// Full edge lengths of the box.
    pub scale: Vec3,
}

impl Default for RoomVolume {
    fn default() -> Self {
        Self {
            offset: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl RoomVolume {
    /// Volume given to a room declared without any.
    pub fn fallback() -> Self {
        Self {
            offset: Vec3::new(0.0, 1.0, 0.0),
            rotation: Vec3::ZERO,
            scale: Vec3::new(5.0, 3.0, 5.0),
        }
    }

    fn orientation(&self) -> Quat {
        Quat::from_euler(
            EulerRot::YXZ,
            self.rotation.y.to_radians(),
            self.rotation.x.to_radians(),
            self.rotation.z.to_radians(),
        )
    }

    /// Point-in-oriented-box test against this volume placed at `origin`.
    pub fn contains(&self, origin: Vec3, point: Vec3) -> bool {
        let local = self.orientation().inverse() * (point - (origin + self.offset));
        let half = self.scale * 0.5;
        local.abs().cmple(half).all()
    }

    /// World-axis bounding box of the rotated volume, as `(min, max)`.
    pub fn bounds(&self, origin: Vec3) -> (Vec3, Vec3) {
        let centre = origin + self.offset;
        let axes = Mat3::from_quat(self.orientation());
        let half = self.scale * 0.5;
        let extent = axes.x_axis.abs() * half.x + axes.y_axis.abs() * half.y + axes.z_axis.abs() * half.z;
        (centre - extent, centre + extent)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomType {
    #[default]
    Standard,
    Corridor,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomEnvironment {
    #[default]
    Cold,
    Hot,
    Freezing,
}

/// Linear RGB, each channel in `[0, 1]`.
pub type RoomColor = [f32; 3];

#[derive(Clone, Debug, Serialize)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    pub room_type: RoomType,
    pub environment: RoomEnvironment,
    pub radioactive: bool,
    pub color: RoomColor,
    pub origin: Vec3,
    pub volumes: Vec<RoomVolume>,
    /// Waypoint standing for the room as a whole, used when judging whether
    /// the room can be reached without changing floors.
    pub anchor: Option<NodeId>,
    pub is_world: bool,
    pub nodes: Vec<NodeId>,
    pub interest_nodes: Vec<NodeId>,
    pub exit_nodes: Vec<NodeId>,
}

impl Room {
    /// A room with no volumes is given `RoomVolume::fallback()`.
    pub fn new(id: RoomId, name: impl Into<String>, origin: Vec3, mut volumes: Vec<RoomVolume>) -> Self {
        if volumes.is_empty() {
            volumes.push(RoomVolume::fallback());
        }
        Self {
            id,
            name: name.into(),
            room_type: RoomType::default(),
            environment: RoomEnvironment::default(),
            radioactive: false,
            color: [1.0, 1.0, 1.0],
            origin,
            volumes,
            anchor: None,
            is_world: false,
            nodes: Vec::new(),
            interest_nodes: Vec::new(),
            exit_nodes: Vec::new(),
        }
    }

    pub fn world() -> Self {
        Self {
            id: RoomId::WORLD,
            name: "World".into(),
            room_type: RoomType::default(),
            environment: RoomEnvironment::default(),
            radioactive: false,
            color: [1.0, 1.0, 1.0],
            origin: Vec3::ZERO,
            volumes: Vec::new(),
            anchor: None,
            is_world: true,
            nodes: Vec::new(),
            interest_nodes: Vec::new(),
            exit_nodes: Vec::new(),
        }
    }

    pub fn contains_point(&self, point: Vec3) -> bool {
        !self.is_world && self.volumes.iter().any(|v| v.contains(self.origin, point))
    }

    /// Recompute membership from node positions. Disabled nodes are members
    /// too; reachability is decided at planning time.
    pub fn fetch_nodes(&mut self, graph: &NavGraph) {
        self.nodes.clear();
        self.interest_nodes.clear();
        self.exit_nodes.clear();
        if self.is_world {
            return;
        }
        for node in graph.nodes() {
            if !self.contains_point(node.position) {
                continue;
            }
            self.nodes.push(node.id);
            match node.node_type {
                NodeType::Interest => self.interest_nodes.push(node.id),
                NodeType::Exit => self.exit_nodes.push(node.id),
                _ => {}
            }
        }
    }

    /// Distance from `point` to the world-axis bounds of the first volume;
    /// zero inside. The world room is everywhere, so it reports zero.
    pub fn distance_to_bounds(&self, point: Vec3) -> f32 {
        let Some(first) = self.volumes.first() else {
            return 0.0;
        };
        let (min, max) = first.bounds(self.origin);
        point.distance(point.clamp(min, max))
    }
}

/// Random saturated colour: any hue, saturation in `[0.5, 1)`, any value.
pub fn random_room_color(rng: &mut LurkerRng) -> RoomColor {
    let hue = rng.next_f64() as f32;
    let saturation = 0.5 + 0.5 * rng.next_f64() as f32;
    let value = rng.next_f64() as f32;
    hsv_to_rgb(hue, saturation, value)
}

fn hsv_to_rgb(h: f32, s: f32, v: f32) -> RoomColor {
    let sector = (h * 6.0).floor();
    let f = h * 6.0 - sector;
    let p = v * (1.0 - s);
    let q = v * (1.0 - f * s);
    let t = v * (1.0 - (1.0 - f) * s);
    match sector as i32 % 6 {
        0 => [v, t, p],
        1 => [q, v, p],
        2 => [p, v, t],
        3 => [p, q, v],
        4 => [t, p, v],
        _ => [v, p, q],
    }
}
