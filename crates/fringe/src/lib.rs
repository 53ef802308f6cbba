//! Fringe: a pipelined multi-device block simulation orchestrator.
//!
//! This is the top-level facade crate that re-exports the public API
//! from the Fringe sub-crates. For most users, adding `fringe` as a
//! single dependency is sufficient.
//!
//! A run overlaps the compute phase for block `b` (one call per
//! device, on its own thread) with the finalise-and-consume phase for
//! block `b-1` (one finalizer thread), with a two-phase cancellable
//! rendezvous between iterations. The simulation engine itself is
//! opaque behind the [`prelude::BlockEngine`] trait; blocks are
//! disposed of through the [`prelude::BlockConsumer`] strategy
//! (persisted via the engine's sink by default).
//!
//! # Quick start
//!
//! ```rust
//! use std::sync::Arc;
//! use fringe::prelude::*;
//! use fringe_test_utils::RecordingEngine;
//!
//! // 32 time samples in blocks of 8: four blocks across two devices.
//! let engine = Arc::new(RecordingEngine::new(2));
//! let config = SessionConfig {
//!     device_count: 2,
//!     num_time_samples: 32,
//!     max_times_per_block: 8,
//! };
//! let report = Pipeline::new(Arc::clone(&engine), config)
//!     .unwrap()
//!     .run()
//!     .unwrap();
//! assert_eq!(report.header.blocks_finalized, 4);
//! assert_eq!(report.metrics.block_count, 4);
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `fringe-core` | IDs, engine errors, the engine and consumer traits |
//! | [`sync`] | `fringe-sync` | Cancellable rendezvous barrier |
//! | [`pipeline`] | `fringe-pipeline` | Session config, roles, the orchestrator, consumers |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types and traits (`fringe-core`).
///
/// Contains [`types::BlockId`], [`types::DeviceId`], the
/// [`types::EngineError`] taxonomy, and the [`types::BlockEngine`] /
/// [`types::BlockConsumer`] extension points.
pub use fringe_core as types;

/// Cancellable rendezvous barrier (`fringe-sync`).
///
/// [`sync::Barrier`] is the reusable N-party rendezvous the pipeline
/// cycles twice per iteration; it is public for callers building their
/// own phased coordination.
pub use fringe_sync as sync;

/// The pipeline orchestrator (`fringe-pipeline`).
///
/// [`pipeline::Pipeline`] owns a run: thread-per-device plus one
/// finalizer, explicit join with first-error-wins propagation, and the
/// engine's session lifecycle bracketing.
pub use fringe_pipeline as pipeline;

/// Common imports for typical Fringe usage.
///
/// ```rust
/// use fringe::prelude::*;
/// ```
pub mod prelude {
    // Core types and traits
    pub use fringe_core::{BlockConsumer, BlockEngine, BlockId, DeviceId, EngineError};

    // Synchronisation
    pub use fringe_sync::{Barrier, BarrierCancelled, BarrierWaitResult};

    // Pipeline
    pub use fringe_pipeline::{
        ChannelConsumer, ConfigError, Pipeline, Role, RoleFailure, RunError, RunMetrics,
        RunReport, SessionConfig, WriteSink,
    };
}
