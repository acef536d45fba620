// lurker_nav: waypoint navigation core for roaming agents.
//
// A weighted graph of waypoints spread over several floors, A* over that
// graph, a floor router that chains same-floor legs through staircases, and
// a room layer that sends agents to search rooms' interest points in random
// order. The crate does no rendering, steering or frame timing: callers give
// it positions and get back waypoints.
//
// Module overview:
// - `types.rs`:        NodeId / RoomId / AgentId handles, NodeType, StairDirection.
// - `error.rs`:        NavError (rejections vs. contract violations vs. bad input).
// - `config.rs`:       NavConfig: every tunable, loaded from JSON.
// - `graph.rs`:        NavGraph arena, edges, proximity rebuild, nearest-node queries.
// - `search.rs`:       A* with floor-biased heuristic and an expansion cap.
// - `floor_router.rs`: Path complexity, FloorRouter trait, greedy staircase routing.
// - `room.rs`:         Oriented-box rooms and their node membership.
// - `scene.rs`:        NavScene JSON format that a manager is built from.
// - `manager.rs`:      NavManager: graph owner, planning, per-agent path stacks, room pools.
// - `navigator.rs`:    Navigator: follows one agent's path via PositionSource / Locomotion.
// - `explore.rs`:      RoomExplorer: per-agent room search state machine.
// - `prng`:            Re-exported from `lurker_prng`: xoshiro256++ with SplitMix64 seeding.
//
// The library emits `tracing` events but never installs a subscriber; the
// `navplan` binary does.
//
// **Critical constraint: determinism.** Given the same scene, config and call
// sequence, every plan, shuffle and room pick is identical. Randomness comes
// only from the manager's seeded PRNG; iteration order is node order or room
// order, never hash order.

pub mod config;
pub mod error;
pub mod explore;
pub mod floor_router;
pub mod graph;
pub mod manager;
pub mod navigator;
pub use lurker_prng as prng;
pub mod room;
pub mod scene;
pub mod search;
pub mod types;
