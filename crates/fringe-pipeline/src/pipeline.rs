//! The pipeline orchestrator and its iteration loop.
//!
//! # Architecture
//!
//! ```text
//! Device workers (N)                    Finalizer (1)
//!     |                                     |
//!     | compute_block(b, d)                 | finalize_block(b-1)
//!     |                                     | consumer.consume(b-1)
//!     |----------- rendezvous #1 -----------|
//!     |                                     | reset_work_units()
//!     |----------- rendezvous #2 -----------|
//!     | compute_block(b+1, d)               | finalize_block(b)
//! ```
//!
//! Every thread runs the same loop for `block_count + 1` iterations,
//! parameterized by role. The first rendezvous guarantees that all
//! compute calls for block `b` and the finalise+consume of block `b-1`
//! have returned; the second guarantees the cursor reset is visible
//! before any compute call for block `b+1`. A single rendezvous could
//! not bracket the finalizer's exclusive cursor reset between those
//! two points.
//!
//! On the first iteration there is nothing to finalise; on the last
//! there is nothing to compute. Any engine failure cancels the
//! rendezvous, so peers unblock with an error instead of hanging, and
//! the failure is reported from [`Pipeline::run`] after the join.

use std::fmt;
use std::panic::{catch_unwind, resume_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crossbeam_channel::Sender;
use smallvec::SmallVec;

use fringe_core::{BlockConsumer, BlockEngine, BlockId, DeviceId, EngineError};
use fringe_sync::Barrier;

use crate::config::{ConfigError, SessionConfig};
use crate::consume::WriteSink;
use crate::metrics::{RunMetrics, RunReport};
use crate::role::Role;

// ── Error types ────────────────────────────────────────────────────

/// One worker's fatal engine failure, attributed to its role.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoleFailure {
    /// Role of the thread that hit the error.
    pub role: Role,
    /// The engine error it reported.
    pub error: EngineError,
}

impl fmt::Display for RoleFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.role, self.error)
    }
}

/// Errors from [`Pipeline::run`].
///
/// All failures are terminal for the run; there are no retries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RunError {
    /// The engine rejected session initialisation; no thread was
    /// spawned.
    Init(EngineError),
    /// A worker thread could not be spawned. Already-running workers
    /// are cancelled and joined before this is returned.
    Spawn {
        /// Role the thread would have had.
        role: Role,
        /// Operating system error description.
        reason: String,
    },
    /// One or more workers reported a fatal engine error. The first
    /// recorded failure wins; any later ones are retained.
    Worker {
        /// The first failure recorded.
        first: RoleFailure,
        /// Failures recorded after the first, in arrival order.
        others: Vec<RoleFailure>,
    },
    /// A worker panicked. The panic was contained: the barrier was
    /// cancelled before the thread unwound, so peers did not hang.
    Panicked {
        /// Role of the panicking thread.
        role: Role,
    },
    /// The engine's session shutdown failed after a clean run.
    Shutdown(EngineError),
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init(e) => write!(f, "session init failed: {e}"),
            Self::Spawn { role, reason } => {
                write!(f, "failed to spawn {role} thread: {reason}")
            }
            Self::Worker { first, others } => {
                write!(f, "{first}")?;
                if !others.is_empty() {
                    write!(f, " ({} further failure(s) recorded)", others.len())?;
                }
                Ok(())
            }
            Self::Panicked { role } => write!(f, "{role} panicked"),
            Self::Shutdown(e) => write!(f, "session shutdown failed: {e}"),
        }
    }
}

impl std::error::Error for RunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Init(e) | Self::Shutdown(e) => Some(e),
            Self::Worker { first, .. } => Some(&first.error),
            _ => None,
        }
    }
}

// ── Pipeline ───────────────────────────────────────────────────────

/// Orchestrates one pipelined simulation run over an engine.
///
/// Owns the session configuration and the consumption strategy.
/// [`run()`](Self::run) consumes the pipeline: it spawns
/// `device_count + 1` worker threads, drives the iteration loop to
/// completion, joins every thread, and brackets the whole run with the
/// engine's session lifecycle calls.
///
/// # Example
///
/// ```ignore
/// let engine = Arc::new(MyEngine::open(settings)?);
/// let config = SessionConfig {
///     device_count: 2,
///     num_time_samples: 240,
///     max_times_per_block: 16,
/// };
/// let report = Pipeline::new(engine, config)?.run()?;
/// println!("wrote {} blocks", report.metrics.block_count);
/// ```
pub struct Pipeline<E: BlockEngine> {
    engine: Arc<E>,
    config: SessionConfig,
    consumer: Box<dyn BlockConsumer<E>>,
}

impl<E: BlockEngine + 'static> Pipeline<E> {
    /// Create a pipeline with the default [`WriteSink`] consumer.
    pub fn new(engine: Arc<E>, config: SessionConfig) -> Result<Self, ConfigError> {
        Self::with_consumer(engine, config, Box::new(WriteSink))
    }

    /// Create a pipeline with a caller-supplied consumption strategy.
    pub fn with_consumer(
        engine: Arc<E>,
        config: SessionConfig,
        consumer: Box<dyn BlockConsumer<E>>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            engine,
            config,
            consumer,
        })
    }

    /// The session configuration this pipeline will run with.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Execute the full pipelined run.
    ///
    /// Initialises the session, resets the work-unit cursor once,
    /// spawns one thread per device plus the finalizer, joins them all,
    /// and shuts the session down. Returns the engine's header wrapped
    /// in a [`RunReport`].
    ///
    /// # Errors
    ///
    /// Returns [`RunError`] if initialisation, any worker, or shutdown
    /// fails. Worker failures are attributed to their role; the first
    /// recorded failure wins and later ones are kept alongside it.
    pub fn run(self) -> Result<RunReport<E::Header>, RunError> {
        let Self {
            engine,
            config,
            consumer,
        } = self;

        engine.session_init().map_err(RunError::Init)?;

        let block_count = config.block_count();
        let device_count = config.device_count;

        // The first reset happens synchronously, before any worker can
        // observe the cursor.
        engine.reset_work_units();

        let barrier = Arc::new(Barrier::new(device_count + 1));
        let (fail_tx, fail_rx) = crossbeam_channel::unbounded::<RoleFailure>();
        let started = Instant::now();

        let mut handles: SmallVec<[(Role, JoinHandle<()>); 8]> = SmallVec::new();

        for d in 0..device_count {
            let device = DeviceId(d as u32);
            let role = Role::Device(device);
            let engine = Arc::clone(&engine);
            let worker_barrier = Arc::clone(&barrier);
            let fail_tx = fail_tx.clone();
            let spawned = thread::Builder::new()
                .name(format!("fringe-dev-{d}"))
                .spawn(move || {
                    run_contained(&worker_barrier, || {
                        device_loop(&*engine, &worker_barrier, &fail_tx, device, block_count);
                    });
                });
            match spawned {
                Ok(handle) => handles.push((role, handle)),
                Err(e) => {
                    barrier.cancel();
                    join_quietly(handles);
                    return Err(RunError::Spawn {
                        role,
                        reason: e.to_string(),
                    });
                }
            }
        }

        let spawned = {
            let engine = Arc::clone(&engine);
            let worker_barrier = Arc::clone(&barrier);
            let fail_tx = fail_tx.clone();
            let mut consumer = consumer;
            thread::Builder::new()
                .name("fringe-finalize".into())
                .spawn(move || {
                    run_contained(&worker_barrier, || {
                        finalizer_loop(
                            &*engine,
                            &worker_barrier,
                            &fail_tx,
                            consumer.as_mut(),
                            block_count,
                        );
                    });
                })
        };
        match spawned {
            Ok(handle) => handles.push((Role::Finalizer, handle)),
            Err(e) => {
                barrier.cancel();
                join_quietly(handles);
                return Err(RunError::Spawn {
                    role: Role::Finalizer,
                    reason: e.to_string(),
                });
            }
        }

        // Drop our sender so the failure channel drains finitely.
        drop(fail_tx);

        // A panicked worker has already cancelled the barrier inside
        // run_contained, so these joins cannot hang.
        let mut panicked: Option<Role> = None;
        for (role, handle) in handles {
            if handle.join().is_err() && panicked.is_none() {
                panicked = Some(role);
            }
        }
        let elapsed_ms = started.elapsed().as_millis() as u64;

        // Engine failures carry reasons, so they outrank panic
        // attribution when both occurred in one run.
        let mut failures: Vec<RoleFailure> = fail_rx.try_iter().collect();
        if !failures.is_empty() {
            let first = failures.remove(0);
            return Err(RunError::Worker {
                first,
                others: failures,
            });
        }
        if let Some(role) = panicked {
            return Err(RunError::Panicked { role });
        }

        let header = engine.session_shutdown().map_err(RunError::Shutdown)?;
        Ok(RunReport {
            header,
            metrics: RunMetrics {
                block_count,
                device_count,
                elapsed_ms,
            },
        })
    }
}

impl<E: BlockEngine> fmt::Debug for Pipeline<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("config", &self.config)
            .field("block_count", &self.config.block_count())
            .finish()
    }
}

// ── Worker loops ───────────────────────────────────────────────────

/// Run `body`, cancelling the barrier if it panics before re-raising.
///
/// The cancel must happen before the thread finishes unwinding:
/// otherwise peers blocked at the rendezvous would wait for an arrival
/// that never comes.
fn run_contained(barrier: &Barrier, body: impl FnOnce()) {
    if let Err(payload) = catch_unwind(AssertUnwindSafe(body)) {
        barrier.cancel();
        resume_unwind(payload);
    }
}

/// Iteration loop for one device worker.
fn device_loop<E: BlockEngine>(
    engine: &E,
    barrier: &Barrier,
    failures: &Sender<RoleFailure>,
    device: DeviceId,
    block_count: usize,
) {
    for b in 0..=block_count {
        // The extra iteration (b == block_count) performs no compute;
        // it exists so the finalizer can retire the last block.
        if b < block_count {
            if let Err(error) = engine.compute_block(BlockId(b as u64), device) {
                let _ = failures.send(RoleFailure {
                    role: Role::Device(device),
                    error,
                });
                barrier.cancel();
                return;
            }
        }

        // Rendezvous #1: every compute call for block b, and the
        // finalise+consume of block b-1, have returned.
        if barrier.wait().is_err() {
            return; // a peer failed; its error is already recorded
        }

        // The finalizer resets the work-unit cursor between the two
        // rendezvous.

        // Rendezvous #2: the reset is visible before any compute call
        // for block b+1.
        if barrier.wait().is_err() {
            return;
        }
    }
}

/// Iteration loop for the finalizer, which owns the consumer and the
/// shared cursor reset.
fn finalizer_loop<E: BlockEngine>(
    engine: &E,
    barrier: &Barrier,
    failures: &Sender<RoleFailure>,
    consumer: &mut dyn BlockConsumer<E>,
    block_count: usize,
) {
    for b in 0..=block_count {
        // Nothing to finalise on the first iteration.
        if b > 0 {
            let index = BlockId((b - 1) as u64);
            let result = engine
                .finalize_block(index)
                .and_then(|block| consumer.consume(engine, block, index));
            if let Err(error) = result {
                let _ = failures.send(RoleFailure {
                    role: Role::Finalizer,
                    error,
                });
                barrier.cancel();
                return;
            }
        }

        if barrier.wait().is_err() {
            return;
        }

        // Exclusive window: no device issues a compute call until the
        // second rendezvous releases.
        engine.reset_work_units();

        if barrier.wait().is_err() {
            return;
        }
    }
}

/// Join spawned workers after a spawn failure, discarding results.
/// The barrier is already cancelled, so every loop exits promptly.
fn join_quietly(handles: SmallVec<[(Role, JoinHandle<()>); 8]>) {
    for (_, handle) in handles {
        let _ = handle.join();
    }
}
