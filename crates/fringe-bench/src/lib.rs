//! Benchmark profiles and utilities for the Fringe block pipeline.
//!
//! Provides [`NoopEngine`], an engine whose every phase returns
//! immediately, so that benchmarks measure pipeline and rendezvous
//! overhead rather than simulation work, and [`session_profile`] for
//! building configs by device/block count.

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use fringe_core::{BlockEngine, BlockId, DeviceId, EngineError};
use fringe_pipeline::SessionConfig;

/// Engine that does no work: every phase succeeds instantly.
///
/// Running the pipeline over this engine measures pure orchestration
/// cost (thread spawn, two rendezvous per iteration, join).
#[derive(Debug, Default)]
pub struct NoopEngine;

impl BlockEngine for NoopEngine {
    type Block = ();
    type Header = ();

    fn session_init(&self) -> Result<(), EngineError> {
        Ok(())
    }
    fn compute_block(&self, _block: BlockId, _device: DeviceId) -> Result<(), EngineError> {
        Ok(())
    }
    fn finalize_block(&self, _block: BlockId) -> Result<(), EngineError> {
        Ok(())
    }
    fn reset_work_units(&self) {}
    fn write_block(&self, _block: &(), _index: BlockId) -> Result<(), EngineError> {
        Ok(())
    }
    fn session_shutdown(&self) -> Result<(), EngineError> {
        Ok(())
    }
}

/// Build a session sized to exactly `blocks` visibility blocks.
pub fn session_profile(device_count: usize, blocks: usize) -> SessionConfig {
    SessionConfig {
        device_count,
        num_time_samples: blocks * 8,
        max_times_per_block: 8,
    }
}
