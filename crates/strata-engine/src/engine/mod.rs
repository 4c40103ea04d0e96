//! Render engine: layer table, enqueue entry points, and the per-frame flush.
//!
//! Lifecycle:
//! - construct with a [`SettingsResolver`](crate::settings::SettingsResolver)
//! - `initialize()` once the graphics context exists (negotiates capability)
//! - `enqueue*()` tasks during the frame, `flush()` once per tick
//!
//! Other threads reach the render thread only through
//! [`RenderEngine::run_on_render_thread`] or a [`DeferredSender`](crate::deferred::DeferredSender).

mod config;
mod render_engine;
mod stats;

pub use config::EngineConfig;
pub use render_engine::RenderEngine;
pub use stats::FlushStats;
