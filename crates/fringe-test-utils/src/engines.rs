//! Mock engine implementations.

use std::sync::Mutex;
use std::time::Duration;

use indexmap::IndexMap;
use rand_chacha::rand_core::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use fringe_core::{BlockEngine, BlockId, DeviceId, EngineError};

/// One recorded engine call, in global call order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    /// `session_init` was called.
    Init,
    /// A `compute_block` call was issued.
    ComputeStart {
        /// Block being computed.
        block: BlockId,
        /// Device the call was issued on.
        device: DeviceId,
    },
    /// A `compute_block` call returned.
    ComputeEnd {
        /// Block that was computed.
        block: BlockId,
        /// Device the call was issued on.
        device: DeviceId,
    },
    /// A `finalize_block` call was issued.
    FinalizeStart {
        /// Block being finalised.
        block: BlockId,
    },
    /// A `finalize_block` call returned successfully.
    FinalizeEnd {
        /// Block that was finalised.
        block: BlockId,
    },
    /// A finalised block was written to the sink.
    WriteBlock {
        /// Block that was written.
        block: BlockId,
    },
    /// The shared work-unit cursor was reset.
    CursorReset,
    /// `session_shutdown` was called.
    Shutdown,
}

/// Owned handle to one mock finalised block.
///
/// `sequence` identifies which finalise call produced this snapshot;
/// the engine rejects writes of any snapshot but the most recent one,
/// mimicking a single-buffered finalise area.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MockBlock {
    /// Block index this snapshot belongs to.
    pub index: BlockId,
    /// Monotonic finalise sequence number.
    pub sequence: u64,
}

/// End-of-run artifact from the mock engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MockHeader {
    /// Total successful finalise calls.
    pub blocks_finalized: usize,
    /// Total successful write calls.
    pub blocks_written: usize,
}

/// Per-block progress used for contract enforcement.
#[derive(Clone, Copy, Debug, Default)]
struct BlockProgress {
    /// Compute completions since the last finalise of this block.
    computes_since_finalize: usize,
    /// Whether this block has ever been finalised.
    finalized: bool,
}

/// Mutable engine state behind one lock.
struct Inner {
    initialized: bool,
    shut_down: bool,
    next_sequence: u64,
    /// Sequence of the only live snapshot, if any.
    live_sequence: Option<u64>,
    /// Insertion-ordered so assertions iterate blocks deterministically.
    blocks: IndexMap<BlockId, BlockProgress>,
    blocks_finalized: usize,
    blocks_written: usize,
}

/// Seeded per-call timing jitter.
struct Jitter {
    rng: Mutex<ChaCha8Rng>,
    max_micros: u64,
}

/// Mock engine that records every call and enforces the engine
/// contract.
///
/// Contract checks (all reported as [`EngineError`], never panics):
///
/// - Calls other than `session_init` fail before initialisation.
/// - `compute_block` fails for an out-of-range device.
/// - `finalize_block` fails unless every device has completed a
///   compute call for the block since its previous finalise — this
///   covers both an incomplete compute phase and a repeated finalise.
/// - `write_block` fails for any snapshot except the most recently
///   finalised one (single-buffered finalise area).
pub struct RecordingEngine {
    device_count: usize,
    log: Mutex<Vec<Event>>,
    inner: Mutex<Inner>,
    jitter: Option<Jitter>,
}

// Compile-time assertion: engines must be shareable across workers.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<RecordingEngine>();
    assert::<FailingEngine>();
};

impl RecordingEngine {
    /// Create a mock engine for `device_count` devices.
    pub fn new(device_count: usize) -> Self {
        Self {
            device_count,
            log: Mutex::new(Vec::new()),
            inner: Mutex::new(Inner {
                initialized: false,
                shut_down: false,
                next_sequence: 0,
                live_sequence: None,
                blocks: IndexMap::new(),
                blocks_finalized: 0,
                blocks_written: 0,
            }),
            jitter: None,
        }
    }

    /// Like [`new`](Self::new), but every compute and finalise call
    /// sleeps a seeded-random duration up to `max_micros`.
    ///
    /// Deterministic per seed in the sequence of sleeps drawn, though
    /// not in cross-thread interleaving — which is the point: jitter
    /// shakes out orderings the happy path never exercises.
    pub fn with_jitter(device_count: usize, seed: u64, max_micros: u64) -> Self {
        let mut engine = Self::new(device_count);
        engine.jitter = Some(Jitter {
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(seed)),
            max_micros,
        });
        engine
    }

    /// Snapshot of the event log so far, in global call order.
    pub fn events(&self) -> Vec<Event> {
        self.log.lock().unwrap().clone()
    }

    /// Number of devices this engine was built for.
    pub fn device_count(&self) -> usize {
        self.device_count
    }

    fn record(&self, event: Event) {
        self.log.lock().unwrap().push(event);
    }

    fn sleep_jitter(&self) {
        if let Some(jitter) = &self.jitter {
            // Modulo bias is irrelevant for a test sleep.
            let micros = jitter.rng.lock().unwrap().next_u64() % (jitter.max_micros + 1);
            std::thread::sleep(Duration::from_micros(micros));
        }
    }

    fn check_initialized(inner: &Inner, what: &str) -> Result<(), EngineError> {
        if !inner.initialized {
            return Err(EngineError::Session {
                reason: format!("{what} called before session init"),
            });
        }
        if inner.shut_down {
            return Err(EngineError::Session {
                reason: format!("{what} called after session shutdown"),
            });
        }
        Ok(())
    }
}

impl BlockEngine for RecordingEngine {
    type Block = MockBlock;
    type Header = MockHeader;

    fn session_init(&self) -> Result<(), EngineError> {
        self.record(Event::Init);
        let mut inner = self.inner.lock().unwrap();
        inner.initialized = true;
        Ok(())
    }

    fn compute_block(&self, block: BlockId, device: DeviceId) -> Result<(), EngineError> {
        if device.0 as usize >= self.device_count {
            return Err(EngineError::Compute {
                block,
                device,
                reason: format!("device out of range (have {})", self.device_count),
            });
        }
        self.record(Event::ComputeStart { block, device });
        self.sleep_jitter();
        {
            let mut inner = self.inner.lock().unwrap();
            Self::check_initialized(&inner, "compute").map_err(|_| EngineError::Compute {
                block,
                device,
                reason: "session not active".to_string(),
            })?;
            let progress = inner.blocks.entry(block).or_default();
            progress.computes_since_finalize += 1;
        }
        self.record(Event::ComputeEnd { block, device });
        Ok(())
    }

    fn finalize_block(&self, block: BlockId) -> Result<MockBlock, EngineError> {
        self.record(Event::FinalizeStart { block });
        self.sleep_jitter();
        let snapshot = {
            let mut inner = self.inner.lock().unwrap();
            Self::check_initialized(&inner, "finalize").map_err(|_| EngineError::Finalize {
                block,
                reason: "session not active".to_string(),
            })?;
            let device_count = self.device_count;
            let progress = inner.blocks.entry(block).or_default();
            if progress.computes_since_finalize != device_count {
                let got = progress.computes_since_finalize;
                let reason = if progress.finalized && got == 0 {
                    "already finalised without an intervening compute phase".to_string()
                } else {
                    format!("compute phase incomplete: {got} of {device_count} devices done")
                };
                return Err(EngineError::Finalize { block, reason });
            }
            progress.computes_since_finalize = 0;
            progress.finalized = true;
            let sequence = inner.next_sequence;
            inner.next_sequence += 1;
            // The previous snapshot, if any, is overwritten here.
            inner.live_sequence = Some(sequence);
            inner.blocks_finalized += 1;
            MockBlock {
                index: block,
                sequence,
            }
        };
        self.record(Event::FinalizeEnd { block });
        Ok(snapshot)
    }

    fn reset_work_units(&self) {
        self.record(Event::CursorReset);
    }

    fn write_block(&self, block: &MockBlock, index: BlockId) -> Result<(), EngineError> {
        {
            let mut inner = self.inner.lock().unwrap();
            Self::check_initialized(&inner, "write").map_err(|_| EngineError::Write {
                block: index,
                reason: "session not active".to_string(),
            })?;
            if inner.live_sequence != Some(block.sequence) {
                return Err(EngineError::Write {
                    block: index,
                    reason: "stale snapshot: a newer block has been finalised".to_string(),
                });
            }
            inner.blocks_written += 1;
        }
        self.record(Event::WriteBlock { block: index });
        Ok(())
    }

    fn session_shutdown(&self) -> Result<MockHeader, EngineError> {
        self.record(Event::Shutdown);
        let mut inner = self.inner.lock().unwrap();
        Self::check_initialized(&inner, "shutdown")?;
        inner.shut_down = true;
        Ok(MockHeader {
            blocks_finalized: inner.blocks_finalized,
            blocks_written: inner.blocks_written,
        })
    }
}

/// Where a [`FailingEngine`] injects its failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailurePoint {
    /// Fail the compute call for this block on this device.
    Compute {
        /// Block whose compute call fails.
        block: BlockId,
        /// Device whose compute call fails.
        device: DeviceId,
    },
    /// Fail the finalise call for this block.
    Finalize {
        /// Block whose finalise call fails.
        block: BlockId,
    },
    /// Fail the write call for this block.
    Write {
        /// Block whose write call fails.
        block: BlockId,
    },
}

/// Wraps a [`RecordingEngine`] and fails deterministically at one
/// chosen call; all other calls delegate to the inner engine.
pub struct FailingEngine {
    inner: RecordingEngine,
    point: FailurePoint,
}

impl FailingEngine {
    /// Create a failing engine for `device_count` devices.
    pub fn new(device_count: usize, point: FailurePoint) -> Self {
        Self {
            inner: RecordingEngine::new(device_count),
            point,
        }
    }

    /// The wrapped recording engine, for log inspection.
    pub fn recorder(&self) -> &RecordingEngine {
        &self.inner
    }
}

impl BlockEngine for FailingEngine {
    type Block = MockBlock;
    type Header = MockHeader;

    fn session_init(&self) -> Result<(), EngineError> {
        self.inner.session_init()
    }

    fn compute_block(&self, block: BlockId, device: DeviceId) -> Result<(), EngineError> {
        if self.point == (FailurePoint::Compute { block, device }) {
            return Err(EngineError::Compute {
                block,
                device,
                reason: "injected failure".to_string(),
            });
        }
        self.inner.compute_block(block, device)
    }

    fn finalize_block(&self, block: BlockId) -> Result<MockBlock, EngineError> {
        if self.point == (FailurePoint::Finalize { block }) {
            return Err(EngineError::Finalize {
                block,
                reason: "injected failure".to_string(),
            });
        }
        self.inner.finalize_block(block)
    }

    fn reset_work_units(&self) {
        self.inner.reset_work_units();
    }

    fn write_block(&self, block: &MockBlock, index: BlockId) -> Result<(), EngineError> {
        if self.point == (FailurePoint::Write { block: index }) {
            return Err(EngineError::Write {
                block: index,
                reason: "injected failure".to_string(),
            });
        }
        self.inner.write_block(block, index)
    }

    fn session_shutdown(&self) -> Result<MockHeader, EngineError> {
        self.inner.session_shutdown()
    }
}
