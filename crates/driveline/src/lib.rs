//! Umbrella crate that re-exports the `driveline-*` building blocks.
//!
//! This crate is intended as a convenient entrypoint for users and as a home for docs.rs guides.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

#[cfg(feature = "core")]
#[cfg_attr(docsrs, doc(cfg(feature = "core")))]
pub use driveline_core as core;

#[cfg(feature = "track")]
#[cfg_attr(docsrs, doc(cfg(feature = "track")))]
pub use driveline_track as track;

#[cfg(feature = "pilot")]
#[cfg_attr(docsrs, doc(cfg(feature = "pilot")))]
pub use driveline_pilot as pilot;
