//! Cancellable rendezvous barrier for the Fringe block pipeline.
//!
//! Provides [`Barrier`], a reusable N-party rendezvous with an explicit
//! cancellation path: a failing participant calls
//! [`cancel()`](Barrier::cancel) instead of leaving its peers blocked
//! forever, and every current and future [`wait()`](Barrier::wait)
//! returns [`BarrierCancelled`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

mod barrier;

pub use barrier::{Barrier, BarrierCancelled, BarrierWaitResult};
