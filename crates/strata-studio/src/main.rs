//! Strata studio: a small scene that exercises every engine layer.
//!
//! - a field of world-space quads on the camera layer, seen by a swaying camera
//! - marker quads on the pseudo-2D layer, sharing the camera transform
//! - a HUD strip whose bars are fed by a worker thread through the deferred queue

use std::f32::consts::FRAC_PI_4;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::thread;
use std::time::Duration;

use anyhow::Result;
use glam::{Mat4, Vec2, Vec3};
use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowId;

use strata_engine::backend::WgpuBackend;
use strata_engine::core::{App, AppControl, FrameCtx};
use strata_engine::deferred::DeferredSender;
use strata_engine::device::{Gpu, GpuInit};
use strata_engine::engine::RenderEngine;
use strata_engine::layer::LayerId;
use strata_engine::logging::{LoggingConfig, init_logging};
use strata_engine::render::tasks::{Quad, QuadTask};
use strata_engine::settings::{FramebufferSizeCell, StandardResolver};
use strata_engine::window::{Runtime, RuntimeConfig};

const CLEAR: wgpu::Color = wgpu::Color {
    r: 0.02,
    g: 0.02,
    b: 0.04,
    a: 1.0,
};

const PULSE_PERIOD: Duration = Duration::from_millis(250);
const HUD_BARS: u32 = 16;

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let config = RuntimeConfig {
        title: "strata studio".to_string(),
        ..Default::default()
    };

    Runtime::run(config, GpuInit::default(), Studio::new())
}

struct Studio {
    engine: RenderEngine<WgpuBackend>,
    backend: Option<WgpuBackend>,
    framebuffer: FramebufferSizeCell,
    /// Whole simulation ticks, read by the camera.
    tick: Arc<AtomicU64>,
    /// Bumped on the render thread by deferred closures.
    pulses: Arc<AtomicU32>,
}

impl Studio {
    fn new() -> Self {
        let framebuffer = FramebufferSizeCell::new(1, 1);
        let tick = Arc::new(AtomicU64::new(0));

        let camera = {
            let framebuffer = framebuffer.clone();
            let tick = Arc::clone(&tick);
            move |include_translation: bool, time_fraction: f32| {
                let (w, h) = framebuffer.get();
                let t = tick.load(Ordering::Relaxed) as f32 + time_fraction;
                sway_camera(t, w as f32 / h.max(1) as f32, include_translation)
            }
        };

        Self {
            engine: RenderEngine::new(StandardResolver::new(camera, framebuffer.clone())),
            backend: None,
            framebuffer,
            tick,
            pulses: Arc::new(AtomicU32::new(0)),
        }
    }
}

/// Camera swinging side to side in front of the XY plane.
fn sway_camera(t: f32, aspect: f32, include_translation: bool) -> Mat4 {
    let angle = 0.6 * (t * 0.05).sin();
    let eye = Vec3::new(angle.sin() * 8.0, 2.0, angle.cos() * 8.0);

    let view = if include_translation {
        Mat4::look_at_rh(eye, Vec3::ZERO, Vec3::Y)
    } else {
        Mat4::look_at_rh(Vec3::ZERO, -eye, Vec3::Y)
    };

    Mat4::perspective_rh(FRAC_PI_4, aspect, 0.1, 100.0) * view
}

fn spawn_pulse_worker(sender: DeferredSender, pulses: Arc<AtomicU32>) {
    thread::spawn(move || {
        loop {
            thread::sleep(PULSE_PERIOD);
            let pulses = Arc::clone(&pulses);
            let submitted = sender.submit(move || {
                pulses.fetch_add(1, Ordering::Relaxed);
            });
            if submitted.is_err() {
                log::debug!("render engine gone; pulse worker stopping");
                break;
            }
        }
    });
}

fn world_quads() -> QuadTask {
    let mut task = QuadTask::new(Vec::new());
    for row in 0..4 {
        for col in 0..6 {
            let x = -3.0 + col as f32;
            let y = -2.0 + row as f32;
            let shade = (row * 6 + col) as f32 / 24.0;
            task.push(Quad::new(
                Vec3::new(x, y, 0.0),
                Vec2::splat(0.9),
                [0.15 + 0.6 * shade, 0.35, 0.8 - 0.5 * shade, 1.0],
            ));
        }
    }
    task
}

fn markers() -> QuadTask {
    QuadTask::new(vec![
        Quad::new(Vec3::new(-3.1, 2.2, 0.5), Vec2::splat(0.3), [1.0, 0.8, 0.2, 0.8]),
        Quad::new(Vec3::new(2.8, 2.2, 0.5), Vec2::splat(0.3), [1.0, 0.8, 0.2, 0.8]),
    ])
}

fn hud(pulses: u32, (width, _height): (u32, u32)) -> QuadTask {
    let lit = pulses % (HUD_BARS + 1);
    let bar_w = 14.0;
    let gap = 4.0;

    let mut task = QuadTask::new(Vec::new()).screen_space();
    task.push(Quad::screen(
        0.0,
        0.0,
        width as f32,
        36.0,
        [0.0, 0.0, 0.0, 0.5],
    ));
    for i in 0..HUD_BARS {
        let color = if i < lit {
            [0.3, 0.9, 0.4, 1.0]
        } else {
            [0.3, 0.3, 0.3, 0.6]
        };
        task.push(Quad::screen(
            10.0 + i as f32 * (bar_w + gap),
            10.0,
            bar_w,
            16.0,
            color,
        ));
    }
    task
}

impl App for Studio {
    fn on_gpu_ready(&mut self, window_id: WindowId, gpu: &Gpu<'_>) -> AppControl {
        if self.backend.is_some() {
            log::warn!("window {window_id:?}: engine already bound to a GPU; ignoring");
            return AppControl::Continue;
        }

        let size = gpu.size();
        self.framebuffer.set(size.width, size.height);

        let mut backend = gpu.create_backend();
        match self.engine.initialize(&mut backend) {
            Ok(level) => log::info!("studio running at capability {level:?}"),
            Err(err) => {
                log::error!("render engine initialization failed: {err:#}");
                return AppControl::Exit;
            }
        }
        self.backend = Some(backend);

        spawn_pulse_worker(self.engine.deferred_sender(), Arc::clone(&self.pulses));
        AppControl::Continue
    }

    fn on_window_event(&mut self, _window_id: WindowId, event: &WindowEvent) -> AppControl {
        match event {
            WindowEvent::KeyboardInput { event, .. }
                if event.state == ElementState::Pressed
                    && event.physical_key == PhysicalKey::Code(KeyCode::Escape) =>
            {
                AppControl::Exit
            }
            _ => AppControl::Continue,
        }
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        let Some(backend) = self.backend.as_mut() else {
            return AppControl::Continue;
        };

        let size = ctx.window.framebuffer_size();
        if size.0 == 0 || size.1 == 0 {
            return AppControl::Continue;
        }
        self.framebuffer.set(size.0, size.1);
        self.tick.store(ctx.time.tick, Ordering::Relaxed);

        let pulses = self.pulses.load(Ordering::Relaxed);

        ctx.render_layers(&mut self.engine, backend, CLEAR, |engine, _time| {
            engine.enqueue(LayerId::CAMERA_VIEW, world_quads());
            engine.enqueue(LayerId::PSEUDO_2D, markers());
            engine.enqueue(LayerId::HUD, hud(pulses, size));
        })
    }
}
