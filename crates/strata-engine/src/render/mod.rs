//! Built-in render tasks for the wgpu backend.
//!
//! Convention:
//! - geometry is submitted in the coordinate space of the layer it is queued on
//!   (world units for camera layers, framebuffer pixels for the HUD)
//! - the layer transform arrives in `init_rendering` and is uploaded as a uniform

pub mod tasks;
