//! Strata engine crate.
//!
//! A layered render-task scheduler. Work is enqueued as [`task::RenderTask`]s
//! onto a fixed set of layers; once per frame the [`engine::RenderEngine`]
//! resolves each non-empty layer's transform, runs every task's
//! init/draw/cleanup sequence in order, clears the layers, and drains the
//! deferred queue of closures other threads handed to the render thread.
//!
//! The platform pieces (`window`, `device`, `core`) drive that flush from a
//! winit event loop against a wgpu [`backend::WgpuBackend`].

pub mod backend;
pub mod capability;
pub mod core;
pub mod deferred;
pub mod device;
pub mod engine;
pub mod error;
pub mod layer;
pub mod logging;
pub mod render;
pub mod settings;
pub mod task;
pub mod time;
pub mod window;
