//! Graphics backend seam.
//!
//! The engine never talks to a graphics API directly. It drives a [`Backend`]
//! for the handful of global operations it owns (one-time setup, version
//! query, blend/cull state) and hands the same backend to every render task.
//!
//! [`WgpuBackend`] is the production implementation.

mod wgpu_backend;

pub use wgpu_backend::{FrameTarget, PipelineKey, RasterState, WgpuBackend};

use anyhow::Result;

/// Global operations the render engine performs on the graphics context.
///
/// Only used from the render thread.
pub trait Backend {
    /// One-time backend preparation. Runs first during engine initialization.
    fn setup(&mut self) -> Result<()> {
        Ok(())
    }

    /// Loads shared assets (glyph atlases, fonts) needed by tasks. Runs after `setup`.
    fn prepare_assets(&mut self) -> Result<()> {
        Ok(())
    }

    /// Raw driver version string, `MAJOR.MINOR[.PATCH][suffix]` when known.
    fn driver_version(&self) -> Option<String>;

    /// Turns on alpha blending and alpha testing. Stays on for the rest of the frame.
    fn enable_blending(&mut self);

    /// Enables or disables back-face culling for subsequent tasks.
    fn set_culling(&mut self, enabled: bool);
}
