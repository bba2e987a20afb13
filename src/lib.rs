//! vidpress: queue-backed video compression service.
//!
//! The library crates do the heavy lifting: `vp-core` holds shared types,
//! config, and errors; `vp-db` the SQLite job store; `vp-av` the
//! ffmpeg/ffprobe layer.  This crate wires them into a polling worker and
//! delivery client.

pub mod context;
pub mod notify;
pub mod worker;
