//! Render task contract.
//!
//! A task is one unit of drawable work. The engine drives every task through
//! three phases, always in this order within a frame:
//!
//! 1. [`RenderTask::init_rendering`] binds whatever GPU state the task needs,
//!    using the transform of the layer it was queued on
//! 2. [`RenderTask::draw`] records the draw commands
//! 3. [`RenderTask::cleanup_rendering`] puts shared state back to neutral
//!
//! Tasks must not rely on state left behind by the previous task.
//!
//! `B` is the backend the engine flushes against. Tasks are dropped once the
//! frame that executed them has finished with their layer.

use anyhow::Result;
use glam::Mat4;

use crate::capability::CapabilityLevel;

pub trait RenderTask<B: ?Sized> {
    fn init_rendering(
        &mut self,
        backend: &mut B,
        capability: CapabilityLevel,
        transform: &Mat4,
    ) -> Result<()>;

    fn draw(&mut self, backend: &mut B, capability: CapabilityLevel) -> Result<()>;

    fn cleanup_rendering(&mut self, backend: &mut B, capability: CapabilityLevel) -> Result<()>;
}

/// Runs all three phases of `task`.
///
/// If `init_rendering` fails, `draw` is skipped. `cleanup_rendering` is attempted
/// regardless so a failing task cannot leak state into the next one. The first
/// error wins.
pub(crate) fn run_phases<B: ?Sized>(
    task: &mut dyn RenderTask<B>,
    backend: &mut B,
    capability: CapabilityLevel,
    transform: &Mat4,
) -> Result<()> {
    let drawn = task
        .init_rendering(backend, capability, transform)
        .and_then(|()| task.draw(backend, capability));
    let cleaned = task.cleanup_rendering(backend, capability);
    drawn.and(cleaned)
}
