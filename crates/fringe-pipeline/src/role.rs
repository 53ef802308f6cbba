//! Thread roles within a pipeline run.

use std::fmt;

use fringe_core::DeviceId;

/// The role a worker thread plays for the lifetime of one run.
///
/// Assigned once at spawn. Device workers execute the compute phase
/// for their device; the single finalizer finalises and consumes the
/// previous block and owns the work-unit cursor reset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    /// Executes `compute_block` for one device per block.
    Device(DeviceId),
    /// Finalises and consumes each block, resets the shared cursor.
    Finalizer,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Device(d) => write!(f, "device worker {d}"),
            Self::Finalizer => write!(f, "finalizer"),
        }
    }
}
