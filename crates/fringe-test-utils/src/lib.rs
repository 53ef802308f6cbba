//! Reusable mock engines for Fringe development.
//!
//! Two standard engines for pipeline and barrier testing:
//!
//! - [`RecordingEngine`] — records every engine call in an event log
//!   and enforces the engine contract (complete compute phase before
//!   finalise, no double finalise, single live snapshot). Optional
//!   seeded timing jitter for stress runs.
//! - [`FailingEngine`] — wraps a [`RecordingEngine`] and fails
//!   deterministically at a chosen compute/finalise/write call.

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

mod engines;

pub use engines::{Event, FailingEngine, FailurePoint, MockBlock, MockHeader, RecordingEngine};
