//! Read-only track graph adapter: spatial node lookup, track-local
//! coordinates, and precomputed curve-direction data.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod direction;
pub mod graph;
pub mod math;

pub use direction::{DirectionData, TrackDirection};
pub use graph::{TrackCoords, TrackError, TrackGraph, TrackNode, TrackNodeDesc};
pub use math::{normalize_angle, Vec2};
