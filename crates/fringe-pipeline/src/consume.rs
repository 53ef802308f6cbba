//! Built-in block consumption strategies.
//!
//! [`WriteSink`] is the default: it persists each finalised block
//! through the engine's configured output sink. [`ChannelConsumer`]
//! forwards blocks over a channel instead, for callers that aggregate
//! results in memory on another thread.

use crossbeam_channel::Sender;

use fringe_core::{BlockConsumer, BlockEngine, BlockId, EngineError};

// ── WriteSink ──────────────────────────────────────────────────────

/// Default consumer: persist each block via
/// [`BlockEngine::write_block`].
#[derive(Clone, Copy, Debug, Default)]
pub struct WriteSink;

impl<E: BlockEngine> BlockConsumer<E> for WriteSink {
    fn consume(
        &mut self,
        engine: &E,
        block: E::Block,
        index: BlockId,
    ) -> Result<(), EngineError> {
        engine.write_block(&block, index)
    }
}

// ── ChannelConsumer ────────────────────────────────────────────────

/// Forwards each finalised block over a crossbeam channel.
///
/// Blocks arrive at the receiver in strictly increasing index order.
/// If the receiver has been dropped, consumption fails and the run
/// aborts — a disappeared downstream is treated like any other fatal
/// sink error.
#[derive(Clone, Debug)]
pub struct ChannelConsumer<B> {
    tx: Sender<(BlockId, B)>,
}

impl<B> ChannelConsumer<B> {
    /// Wrap a channel sender as a consumer.
    pub fn new(tx: Sender<(BlockId, B)>) -> Self {
        Self { tx }
    }
}

impl<E: BlockEngine> BlockConsumer<E> for ChannelConsumer<E::Block> {
    fn consume(
        &mut self,
        _engine: &E,
        block: E::Block,
        index: BlockId,
    ) -> Result<(), EngineError> {
        self.tx
            .send((index, block))
            .map_err(|_| EngineError::Consume {
                block: index,
                reason: "block receiver dropped".to_string(),
            })
    }
}
