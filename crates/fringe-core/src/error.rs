//! Engine error taxonomy.
//!
//! Every failure the external simulation engine can report is fatal for
//! the run: the failing role aborts, peers are unblocked via barrier
//! cancellation, and the error propagates through the orchestrator's
//! join step. There are no retries anywhere in the pipeline.

use std::error::Error;
use std::fmt;

use crate::id::{BlockId, DeviceId};

/// Fatal errors from the external simulation engine.
///
/// Each variant names the phase that failed and carries the engine's
/// own description of the failure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EngineError {
    /// The compute phase for a block failed on one device.
    Compute {
        /// Block being simulated when the engine failed.
        block: BlockId,
        /// Device the compute call was issued on.
        device: DeviceId,
        /// Engine-supplied description of the failure.
        reason: String,
    },
    /// The finalize phase (per-device buffer merge) failed.
    Finalize {
        /// Block being finalised.
        block: BlockId,
        /// Engine-supplied description of the failure.
        reason: String,
    },
    /// Persisting a finalised block to the output sink failed.
    Write {
        /// Block being written.
        block: BlockId,
        /// Engine-supplied description of the failure.
        reason: String,
    },
    /// A consumption strategy failed to dispose of a finalised block.
    Consume {
        /// Block being consumed.
        block: BlockId,
        /// Description of the failure.
        reason: String,
    },
    /// Session bracketing (init or shutdown) failed.
    Session {
        /// Description of the failure.
        reason: String,
    },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compute {
                block,
                device,
                reason,
            } => {
                write!(f, "compute failed for block {block} on device {device}: {reason}")
            }
            Self::Finalize { block, reason } => {
                write!(f, "finalize failed for block {block}: {reason}")
            }
            Self::Write { block, reason } => {
                write!(f, "write failed for block {block}: {reason}")
            }
            Self::Consume { block, reason } => {
                write!(f, "consume failed for block {block}: {reason}")
            }
            Self::Session { reason } => write!(f, "session error: {reason}"),
        }
    }
}

impl Error for EngineError {}
