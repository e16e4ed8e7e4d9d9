#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Coarse classification of the track ahead of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TrackDirection {
    Straight,
    Left,
    Right,
    /// The relation between heading and track could not be established.
    Undefined,
}

impl TrackDirection {
    pub fn is_curve(self) -> bool {
        matches!(self, TrackDirection::Left | TrackDirection::Right)
    }
}

/// Precomputed direction data for one `(node, successor)` pair: the
/// classification and the last node index still part of the same straight or
/// curve segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DirectionData {
    pub direction: TrackDirection,
    pub last_node: usize,
}
