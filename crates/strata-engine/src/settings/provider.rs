use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use glam::Mat4;

/// Host camera: yields the model-view-projection for a point inside the current tick.
///
/// `include_translation` selects whether the camera position is applied; when
/// false the matrix only carries orientation and projection.
pub trait CameraProvider {
    fn model_view_projection(&self, include_translation: bool, time_fraction: f32) -> Mat4;
}

impl<F> CameraProvider for F
where
    F: Fn(bool, f32) -> Mat4,
{
    #[inline]
    fn model_view_projection(&self, include_translation: bool, time_fraction: f32) -> Mat4 {
        self(include_translation, time_fraction)
    }
}

/// Current framebuffer size in physical pixels.
pub trait FramebufferSizeProvider {
    fn framebuffer_size(&self) -> (u32, u32);
}

impl<F> FramebufferSizeProvider for F
where
    F: Fn() -> (u32, u32),
{
    #[inline]
    fn framebuffer_size(&self) -> (u32, u32) {
        self()
    }
}

/// Shareable framebuffer size slot.
///
/// The window runtime writes it on resize; the resolver reads it during flush.
/// Width and height are packed into one atomic so readers never see a torn pair.
#[derive(Debug, Clone, Default)]
pub struct FramebufferSizeCell(Arc<AtomicU64>);

impl FramebufferSizeCell {
    pub fn new(width: u32, height: u32) -> Self {
        let cell = Self::default();
        cell.set(width, height);
        cell
    }

    pub fn set(&self, width: u32, height: u32) {
        let packed = (u64::from(width) << 32) | u64::from(height);
        self.0.store(packed, Ordering::Relaxed);
    }

    pub fn get(&self) -> (u32, u32) {
        let packed = self.0.load(Ordering::Relaxed);
        ((packed >> 32) as u32, packed as u32)
    }
}

impl FramebufferSizeProvider for FramebufferSizeCell {
    #[inline]
    fn framebuffer_size(&self) -> (u32, u32) {
        self.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_round_trips_extremes() {
        let cell = FramebufferSizeCell::new(u32::MAX, 1);
        assert_eq!(cell.framebuffer_size(), (u32::MAX, 1));
        cell.set(1920, 1080);
        assert_eq!(cell.get(), (1920, 1080));
    }

    #[test]
    fn clones_share_the_slot() {
        let writer = FramebufferSizeCell::default();
        let reader = writer.clone();
        writer.set(800, 600);
        assert_eq!(reader.get(), (800, 600));
    }

    #[test]
    fn closures_are_providers() {
        let camera = |translate: bool, t: f32| {
            if translate {
                Mat4::from_translation(glam::Vec3::splat(t))
            } else {
                Mat4::IDENTITY
            }
        };
        assert_eq!(camera.model_view_projection(false, 0.5), Mat4::IDENTITY);
        assert_eq!((|| (3, 4)).framebuffer_size(), (3, 4));
    }
}
