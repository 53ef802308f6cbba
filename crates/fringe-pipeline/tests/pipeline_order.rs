//! Ordering and call-count integration tests for the block pipeline.
//!
//! Every assertion here is against the global event log of a
//! [`RecordingEngine`]: compute/finalise overlap is real (the engine is
//! driven by the actual worker threads), but the recorded order is
//! total, so the pipeline's guarantees can be checked positionally.

use std::sync::{Arc, Mutex};

use fringe_core::{BlockId, EngineError};
use fringe_pipeline::{ChannelConsumer, Pipeline, RunReport, SessionConfig};
use fringe_test_utils::{Event, MockBlock, MockHeader, RecordingEngine};

/// Session sized so that `block_count()` equals `blocks` exactly.
fn config(device_count: usize, blocks: usize) -> SessionConfig {
    SessionConfig {
        device_count,
        num_time_samples: blocks * 8,
        max_times_per_block: 8,
    }
}

fn run_recorded(devices: usize, blocks: usize) -> (Arc<RecordingEngine>, RunReport<MockHeader>) {
    let engine = Arc::new(RecordingEngine::new(devices));
    let report = Pipeline::new(Arc::clone(&engine), config(devices, blocks))
        .unwrap()
        .run()
        .unwrap();
    (engine, report)
}

/// Positions of all events matching `pred`, in log order.
fn positions(events: &[Event], pred: impl Fn(&Event) -> bool) -> Vec<usize> {
    events
        .iter()
        .enumerate()
        .filter_map(|(i, e)| pred(e).then_some(i))
        .collect()
}

#[test]
fn run_finalises_and_writes_every_block_in_order() {
    let (engine, report) = run_recorded(3, 5);

    assert_eq!(report.header.blocks_finalized, 5);
    assert_eq!(report.header.blocks_written, 5);

    // Writes occur in strictly increasing block order.
    let written: Vec<BlockId> = engine
        .events()
        .iter()
        .filter_map(|e| match e {
            Event::WriteBlock { block } => Some(*block),
            _ => None,
        })
        .collect();
    assert_eq!(written, (0..5u64).map(BlockId).collect::<Vec<_>>());
}

#[test]
fn every_compute_completes_before_its_finalize() {
    let (engine, _) = run_recorded(4, 6);
    let events = engine.events();

    for b in 0..6u64 {
        let block = BlockId(b);
        let compute_ends = positions(&events, |e| {
            matches!(e, Event::ComputeEnd { block: eb, .. } if *eb == block)
        });
        assert_eq!(compute_ends.len(), 4, "block {b}: one compute end per device");

        let finalize_start = positions(&events, |e| {
            matches!(e, Event::FinalizeStart { block: eb } if *eb == block)
        });
        assert_eq!(finalize_start.len(), 1, "block {b}: exactly one finalise");

        let last_compute = *compute_ends.iter().max().unwrap();
        assert!(
            last_compute < finalize_start[0],
            "block {b}: finalise began at {} before the last compute ended at {last_compute}",
            finalize_start[0],
        );
    }
}

#[test]
fn cursor_reset_separates_consecutive_blocks() {
    let (engine, _) = run_recorded(2, 4);
    let events = engine.events();
    let resets = positions(&events, |e| matches!(e, Event::CursorReset));

    for b in 0..3u64 {
        let last_end = *positions(&events, |e| {
            matches!(e, Event::ComputeEnd { block, .. } if *block == BlockId(b))
        })
        .iter()
        .max()
        .unwrap();
        let first_next_start = *positions(&events, |e| {
            matches!(e, Event::ComputeStart { block, .. } if *block == BlockId(b + 1))
        })
        .iter()
        .min()
        .unwrap();

        assert!(
            resets.iter().any(|&r| last_end < r && r < first_next_start),
            "no cursor reset between block {b} computes (last at {last_end}) and \
             block {} computes (first at {first_next_start})",
            b + 1,
        );
    }
}

#[test]
fn cursor_reset_runs_once_per_boundary() {
    // One reset before the workers spawn, plus one per iteration
    // (block_count + 1 iterations).
    let (engine, _) = run_recorded(2, 4);
    let resets = positions(&engine.events(), |e| matches!(e, Event::CursorReset));
    assert_eq!(resets.len(), 4 + 2);
}

#[test]
fn empty_observation_runs_clean() {
    let (engine, report) = run_recorded(4, 0);
    let events = engine.events();

    assert_eq!(report.header.blocks_finalized, 0);
    assert_eq!(report.header.blocks_written, 0);
    assert_eq!(report.metrics.block_count, 0);
    assert!(positions(&events, |e| matches!(e, Event::ComputeStart { .. })).is_empty());
    assert!(positions(&events, |e| matches!(e, Event::FinalizeStart { .. })).is_empty());
    // The single compute-less iteration still cycles both rendezvous.
    assert_eq!(
        positions(&events, |e| matches!(e, Event::CursorReset)).len(),
        2
    );
}

#[test]
fn session_lifecycle_brackets_the_run() {
    let (engine, _) = run_recorded(2, 3);
    let events = engine.events();

    assert_eq!(events.first(), Some(&Event::Init));
    assert_eq!(events.last(), Some(&Event::Shutdown));
}

#[test]
fn two_device_two_block_trace() {
    // The canonical overlap: compute(1,*) runs concurrently with
    // finalise(0)+write(0), and nothing for block 0 is consumed before
    // both compute(0,*) calls have returned.
    let (engine, report) = run_recorded(2, 2);
    let events = engine.events();

    let written: Vec<BlockId> = events
        .iter()
        .filter_map(|e| match e {
            Event::WriteBlock { block } => Some(*block),
            _ => None,
        })
        .collect();
    assert_eq!(written, vec![BlockId(0), BlockId(1)]);

    for b in 0..2u64 {
        let compute_ends = positions(&events, |e| {
            matches!(e, Event::ComputeEnd { block, .. } if *block == BlockId(b))
        });
        let write = positions(&events, |e| {
            matches!(e, Event::WriteBlock { block } if *block == BlockId(b))
        });
        assert_eq!(compute_ends.len(), 2);
        assert!(compute_ends.iter().max().unwrap() < &write[0]);
    }

    assert_eq!(report.metrics.block_count, 2);
    assert_eq!(report.metrics.device_count, 2);
}

#[test]
fn channel_consumer_delivers_blocks_in_order() {
    let engine = Arc::new(RecordingEngine::new(2));
    let (tx, rx) = crossbeam_channel::unbounded::<(BlockId, MockBlock)>();

    let report = Pipeline::with_consumer(
        Arc::clone(&engine),
        config(2, 4),
        Box::new(ChannelConsumer::new(tx)),
    )
    .unwrap()
    .run()
    .unwrap();

    let received: Vec<BlockId> = rx.try_iter().map(|(index, _)| index).collect();
    assert_eq!(received, (0..4u64).map(BlockId).collect::<Vec<_>>());

    // The default write path was bypassed entirely.
    assert_eq!(report.header.blocks_written, 0);
    assert_eq!(report.header.blocks_finalized, 4);
}

#[test]
fn closure_consumer_observes_every_block_once() {
    let engine = Arc::new(RecordingEngine::new(3));
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);

    let consumer = move |_: &RecordingEngine, block: MockBlock, index: BlockId| {
        assert_eq!(block.index, index);
        sink.lock().unwrap().push(index);
        Ok::<(), EngineError>(())
    };

    Pipeline::with_consumer(Arc::clone(&engine), config(3, 5), Box::new(consumer))
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(
        *seen.lock().unwrap(),
        (0..5u64).map(BlockId).collect::<Vec<_>>()
    );
}

#[test]
fn config_is_visible_before_run() {
    let engine = Arc::new(RecordingEngine::new(2));
    let pipeline = Pipeline::new(Arc::clone(&engine), config(2, 7)).unwrap();
    assert_eq!(pipeline.config().device_count, 2);
    assert_eq!(pipeline.config().block_count(), 7);

    // No engine call has been made yet.
    assert!(engine.events().is_empty());
}
