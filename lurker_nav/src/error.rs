// Error type for the navigation core.
//
// Three families share one enum:
// - Rejections: the request was well-formed but no acceptable route exists
//   (unreachable goal, too many floor changes, missing staircase, search
//   budget exhausted). Callers treat these as "try something else".
// - Contract violations: the caller passed a handle that does not exist.
//   These are bugs on the calling side and are kept distinct so they are not
//   mistaken for an unreachable goal.
// - Input errors: malformed config or scene files.

use crate::types::{Floor, NodeId, RoomId, StairDirection};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NavError {
    #[error("no path from {start} to {goal}")]
    Unreachable { start: NodeId, goal: NodeId },

    #[error("path changes floor {complexity} time(s) where none are allowed")]
    TooComplex { complexity: usize },

    #[error("no staircase leading {direction} from floor {floor}")]
    MissingStaircase {
        floor: Floor,
        direction: StairDirection,
    },

    #[error("staircase routing did not reach floor {target} within {legs} legs")]
    StaircaseLoop { target: Floor, legs: usize },

    #[error("search gave up after {expansions} node expansions")]
    SearchLimit { expansions: usize },

    #[error("graph has no enabled nodes")]
    NoEnabledNodes,

    #[error("{0} does not exist in the graph")]
    UnknownNode(NodeId),

    #[error("{0} does not exist")]
    UnknownRoom(RoomId),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("invalid scene: {0}")]
    Scene(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl NavError {
    /// The plan was refused for a legitimate reason; pick another target.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            NavError::Unreachable { .. }
                | NavError::TooComplex { .. }
                | NavError::MissingStaircase { .. }
                | NavError::StaircaseLoop { .. }
                | NavError::SearchLimit { .. }
                | NavError::NoEnabledNodes
        )
    }

    /// The caller handed in a handle the core never issued.
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, NavError::UnknownNode(_) | NavError::UnknownRoom(_))
    }
}

pub type Result<T> = std::result::Result<T, NavError>;
