use winit::window::{Window, WindowId};

use crate::backend::WgpuBackend;
use crate::device::{Gpu, GpuFrame, SurfaceErrorAction};
use crate::engine::RenderEngine;
use crate::time::TickTime;
use crate::window::RuntimeCtx;

use super::app::AppControl;

/// Per-window handles and immutable window metadata.
pub struct WindowCtx<'a> {
    pub id: WindowId,
    pub window: &'a Window,
}

impl<'a> WindowCtx<'a> {
    /// Framebuffer size in physical pixels.
    pub fn framebuffer_size(&self) -> (u32, u32) {
        let size = self.window.inner_size();
        (size.width, size.height)
    }
}

/// Per-frame context passed to `core::App::on_frame`.
///
/// Lifetimes:
/// - `'a` is the duration of the callback invocation
/// - `'w` is the window-borrow lifetime carried by `Gpu<'w>`
pub struct FrameCtx<'a, 'w> {
    pub window: WindowCtx<'a>,
    pub gpu: &'a mut Gpu<'w>,
    pub time: TickTime,
    pub runtime: &'a mut RuntimeCtx,
}

impl<'a, 'w> FrameCtx<'a, 'w> {
    /// Renders one frame through `engine`.
    ///
    /// Acquires the surface texture, clears it to `clear`, runs `pre_render`
    /// (the last chance to enqueue tasks for this frame), flushes the engine
    /// at this frame's time fraction, then presents.
    ///
    /// # Panics
    /// If `engine` has not been initialized.
    pub fn render_layers<F>(
        &mut self,
        engine: &mut RenderEngine<WgpuBackend>,
        backend: &mut WgpuBackend,
        clear: wgpu::Color,
        pre_render: F,
    ) -> AppControl
    where
        F: FnOnce(&mut RenderEngine<WgpuBackend>, &TickTime),
    {
        let mut frame = match self.gpu.begin_frame() {
            Ok(f) => f,
            Err(err) => {
                let action = self.gpu.handle_surface_error(err);
                if action == SurfaceErrorAction::Fatal {
                    log::error!("surface lost for good; exiting");
                    return AppControl::Exit;
                }
                return AppControl::Continue;
            }
        };

        // Clear pass, dropped before the encoder moves into the backend.
        {
            let _rpass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("strata clear"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
        }

        let GpuFrame {
            surface_texture,
            view,
            encoder,
        } = frame;

        backend.begin_frame(encoder, view);

        pre_render(engine, &self.time);
        let stats = engine.flush(backend, self.time.time_fraction);
        log::trace!("frame {}: {stats}", self.time.frame_index);

        let Some(encoder) = backend.end_frame() else {
            log::error!("frame encoder went missing during flush; dropping frame");
            return AppControl::Continue;
        };

        self.window.window.pre_present_notify();
        self.gpu.present(encoder, surface_texture);

        AppControl::Continue
    }
}
