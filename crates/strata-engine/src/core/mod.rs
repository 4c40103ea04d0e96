//! Core engine-facing contracts.
//!
//! This module defines the interface between the window runtime and the
//! application: lifecycle callbacks plus the per-frame context that drives a
//! [`RenderEngine`](crate::engine::RenderEngine) flush.

mod app;
mod ctx;

pub use app::{App, AppControl};
pub use ctx::{FrameCtx, WindowCtx};
