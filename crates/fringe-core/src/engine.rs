//! The [`BlockEngine`] seam to the external simulation engine, and the
//! [`BlockConsumer`] customization point for disposing of finalised
//! blocks.
//!
//! The pipeline treats the engine as opaque: it only sequences calls.
//! Per-device simulation buffers live inside the engine; the pipeline
//! never sees them. The one artifact that crosses the seam is the
//! finalised block snapshot, which the engine hands over as an owned
//! value so that exactly one consume call can run per block and no two
//! snapshots are ever live at once.

use crate::error::EngineError;
use crate::id::{BlockId, DeviceId};

/// Interface to the external block-oriented simulation engine.
///
/// Implementations must be callable concurrently: during a run,
/// `compute_block` is invoked from every device thread while
/// `finalize_block` runs on the finalizer thread for the previous
/// block. The pipeline guarantees the ordering contract below; the
/// engine is expected to enforce its side of it.
///
/// # Contract
///
/// - `compute_block(b, d)` is called at most once per `(b, d)` pair,
///   and only between two work-unit cursor resets.
/// - `finalize_block(b)` is called after every device's
///   `compute_block(b, _)` has returned. Finalising a block whose
///   compute phase has not run since the previous finalisation is a
///   contract violation and must return an error, not stale data.
/// - `reset_work_units` is called exactly once per block boundary,
///   plus once before the first block. No compute call is in flight
///   while it runs.
/// - `session_init` and `session_shutdown` bracket the run; the header
///   returned by `session_shutdown` is the end-of-run artifact.
pub trait BlockEngine: Send + Sync {
    /// Owned handle to one finalised block.
    ///
    /// Produced by [`finalize_block`](Self::finalize_block) and handed
    /// to the consumer by value. The engine may keep only a single
    /// finalised block alive; handing out an owned handle per finalise
    /// models that as an ownership transfer.
    type Block: Send;

    /// End-of-run artifact returned by
    /// [`session_shutdown`](Self::session_shutdown).
    type Header: Send;

    /// Verify the session is fully configured, initialising it if
    /// necessary. Called once before any thread is spawned.
    fn session_init(&self) -> Result<(), EngineError>;

    /// Execute the compute phase for `block` on `device`.
    ///
    /// Mutates internal per-device simulation buffers. Blocking; the
    /// pipeline overlaps calls for the same block across devices.
    fn compute_block(&self, block: BlockId, device: DeviceId) -> Result<(), EngineError>;

    /// Merge per-device buffers for `block` into one finalised snapshot.
    fn finalize_block(&self, block: BlockId) -> Result<Self::Block, EngineError>;

    /// Reset the shared work-unit progress cursor.
    ///
    /// Infallible: the cursor is a progress counter, and the exclusive
    /// access window is guaranteed by the caller.
    fn reset_work_units(&self);

    /// Persist a finalised block to the configured output sink.
    fn write_block(&self, block: &Self::Block, index: BlockId) -> Result<(), EngineError>;

    /// Tear down the session and return the run header.
    ///
    /// Called exactly once, after all worker threads have joined.
    fn session_shutdown(&self) -> Result<Self::Header, EngineError>;
}

/// Strategy for disposing of each finalised block.
///
/// This is the pipeline's single customization point. The default
/// strategy persists blocks through [`BlockEngine::write_block`]; a
/// caller may substitute any other disposal (in-memory aggregation,
/// forwarding over a channel) by supplying a different implementation
/// at pipeline construction.
///
/// The consumer runs on the finalizer thread, one call at a time, in
/// strictly increasing block order. It takes the block by value: once
/// `consume` returns, the snapshot is gone and the engine is free to
/// reuse its finalise buffer.
pub trait BlockConsumer<E: BlockEngine>: Send {
    /// Dispose of one finalised block.
    fn consume(&mut self, engine: &E, block: E::Block, index: BlockId)
        -> Result<(), EngineError>;
}

impl<E, F> BlockConsumer<E> for F
where
    E: BlockEngine,
    F: FnMut(&E, E::Block, BlockId) -> Result<(), EngineError> + Send,
{
    fn consume(
        &mut self,
        engine: &E,
        block: E::Block,
        index: BlockId,
    ) -> Result<(), EngineError> {
        self(engine, block, index)
    }
}
