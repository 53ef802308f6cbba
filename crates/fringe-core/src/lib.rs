//! Core types and traits for the Fringe block pipeline.
//!
//! This is the leaf crate with zero dependencies. It defines the
//! fundamental abstractions used throughout the Fringe workspace:
//! block and device identifiers, the engine error taxonomy, and the
//! [`BlockEngine`] / [`BlockConsumer`] extension-point traits.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod engine;
pub mod error;
pub mod id;

pub use engine::{BlockConsumer, BlockEngine};
pub use error::EngineError;
pub use id::{BlockId, DeviceId};
