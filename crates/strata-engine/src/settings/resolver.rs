use glam::Mat4;

use crate::error::ConfigError;
use crate::layer::{LayerId, LayerRole};

use super::{CameraProvider, FramebufferSizeProvider};

/// Transform and culling flag applied to every task of one layer for one frame.
///
/// Column-major, matching WGSL `mat4x4<f32>`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LayerSettings {
    pub transform: Mat4,
    pub culling: bool,
}

/// Computes [`LayerSettings`] for a layer at a point inside the current tick.
pub trait SettingsResolver {
    fn resolve(&self, layer: LayerId, time_fraction: f32) -> Result<LayerSettings, ConfigError>;
}

/// Resolver for the three built-in layer roles.
pub struct StandardResolver<C, F> {
    camera: C,
    framebuffer: F,
}

impl<C, F> StandardResolver<C, F>
where
    C: CameraProvider,
    F: FramebufferSizeProvider,
{
    pub fn new(camera: C, framebuffer: F) -> Self {
        Self {
            camera,
            framebuffer,
        }
    }
}

impl<C, F> SettingsResolver for StandardResolver<C, F>
where
    C: CameraProvider,
    F: FramebufferSizeProvider,
{
    fn resolve(&self, layer: LayerId, time_fraction: f32) -> Result<LayerSettings, ConfigError> {
        let role = layer.role().ok_or(ConfigError::UnsupportedLayer {
            index: layer.index(),
        })?;

        let transform = match role {
            // Pseudo-2D shares the camera so billboards line up with their world anchors.
            LayerRole::CameraView | LayerRole::Pseudo2d => {
                self.camera.model_view_projection(true, time_fraction)
            }
            LayerRole::Hud => {
                let (width, height) = self.framebuffer.framebuffer_size();
                hud_projection(width, height)
            }
        };

        Ok(LayerSettings {
            transform,
            culling: true,
        })
    }
}

/// Orthographic projection from framebuffer pixels to clip space.
///
/// Screen origin is top-left with +Y down: `(0, 0)` maps to clip `(-1, 1)` and
/// `(width, height)` to `(1, -1)`. Depth spans `[-1, 1]`.
pub fn hud_projection(width: u32, height: u32) -> Mat4 {
    Mat4::orthographic_rh_gl(0.0, width as f32, height as f32, 0.0, -1.0, 1.0)
}
