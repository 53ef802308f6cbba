//! Block pipeline orchestrator for the Fringe simulation framework.
//!
//! Coordinates a time-sliced simulation across multiple compute
//! devices, overlapping the compute phase for block `b` with the
//! finalise-and-consume phase for block `b-1` using a two-phase
//! rendezvous per iteration. [`Pipeline`] owns the session: it spawns
//! one thread per device plus one finalizer thread, drives the
//! iteration loop, joins with explicit error propagation, and brackets
//! the run with the engine's session lifecycle calls.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod consume;
pub mod metrics;
pub mod pipeline;
pub mod role;

pub use config::{ConfigError, SessionConfig};
pub use consume::{ChannelConsumer, WriteSink};
pub use metrics::{RunMetrics, RunReport};
pub use pipeline::{Pipeline, RoleFailure, RunError};
pub use role::Role;
