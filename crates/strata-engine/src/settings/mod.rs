//! Per-layer projection and culling.
//!
//! Every frame, each non-empty layer asks a [`SettingsResolver`] for its
//! [`LayerSettings`]. The standard resolver maps layer roles onto the host's
//! camera and framebuffer collaborators:
//!
//! - camera-view and pseudo-2D layers use the camera's model-view-projection
//! - the HUD layer uses a pixel-space orthographic projection
//!
//! Reserved slots have no case and resolve to [`ConfigError::UnsupportedLayer`].
//!
//! [`ConfigError::UnsupportedLayer`]: crate::error::ConfigError::UnsupportedLayer

mod provider;
mod resolver;

pub use provider::{CameraProvider, FramebufferSizeCell, FramebufferSizeProvider};
pub use resolver::{LayerSettings, SettingsResolver, StandardResolver, hud_projection};
