//! Cross-thread hand-off onto the render thread.
//!
//! Any thread may submit a [`DeferredTask`] through a [`DeferredSender`]. The
//! render thread drains the queue once per frame, after every layer has been
//! flushed, running tasks in submission order.

mod queue;

pub use queue::{DeferredQueue, DeferredSender, DeferredTask, SubmitError};
