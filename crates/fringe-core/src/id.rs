//! Strongly-typed block and device identifiers.

use std::fmt;

/// Zero-based index of one visibility block within a session.
///
/// Blocks are the unit of pipelined work: a session with `M` blocks
/// simulates indices `0..M`, finalising each one exactly once.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub u64);

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for BlockId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// Zero-based index of one compute device.
///
/// A device may be a CPU core or an accelerator; the pipeline only
/// cares that each device executes the compute phase for every block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceId(pub u32);

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for DeviceId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}
