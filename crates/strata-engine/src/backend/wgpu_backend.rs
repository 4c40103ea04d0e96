use std::collections::HashMap;

use anyhow::{Context, Result};

use super::Backend;

/// Encoder and color target for the frame currently being recorded.
pub struct FrameTarget {
    pub encoder: wgpu::CommandEncoder,
    pub view: wgpu::TextureView,
}

/// Fixed-function state the engine toggles between tasks.
///
/// wgpu bakes blend and cull state into pipelines, so tasks read this when
/// picking a pipeline from the cache.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct RasterState {
    pub blend: bool,
    pub alpha_test: bool,
    pub cull: bool,
}

impl RasterState {
    /// Fragments with alpha at or below this are discarded while alpha testing is on.
    pub const ALPHA_CUTOFF: f32 = 0.1;

    pub fn blend_state(self) -> Option<wgpu::BlendState> {
        self.blend.then_some(wgpu::BlendState::ALPHA_BLENDING)
    }

    pub fn cull_mode(self) -> Option<wgpu::Face> {
        self.cull.then_some(wgpu::Face::Back)
    }

    /// Cutoff uploaded to shaders. Negative disables the test.
    pub fn alpha_cutoff(self) -> f32 {
        if self.alpha_test { Self::ALPHA_CUTOFF } else { -1.0 }
    }
}

/// Cache key for render pipelines built by tasks.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct PipelineKey {
    /// Identifies the task kind (and its shader).
    pub label: &'static str,
    pub format: wgpu::TextureFormat,
    pub raster: RasterState,
    pub front_face: wgpu::FrontFace,
}

/// [`Backend`] over a wgpu device.
///
/// Lives as long as the window's GPU context. Each frame the runtime hands it
/// the frame's encoder and color view via [`begin_frame`](Self::begin_frame) and
/// takes the encoder back with [`end_frame`](Self::end_frame) for submission.
pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface_format: wgpu::TextureFormat,
    adapter_info: wgpu::AdapterInfo,

    raster: RasterState,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
    target: Option<FrameTarget>,
}

impl WgpuBackend {
    pub fn new(
        device: wgpu::Device,
        queue: wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        adapter_info: wgpu::AdapterInfo,
    ) -> Self {
        Self {
            device,
            queue,
            surface_format,
            adapter_info,
            raster: RasterState::default(),
            pipelines: HashMap::new(),
            target: None,
        }
    }

    #[inline]
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    #[inline]
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    #[inline]
    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_format
    }

    #[inline]
    pub fn raster_state(&self) -> RasterState {
        self.raster
    }

    pub fn adapter_info(&self) -> &wgpu::AdapterInfo {
        &self.adapter_info
    }

    /// Starts recording a frame into `encoder`, targeting `view`.
    pub fn begin_frame(&mut self, encoder: wgpu::CommandEncoder, view: wgpu::TextureView) {
        if self.target.is_some() {
            log::warn!("begin_frame called with a frame already in flight; discarding it");
        }
        self.raster = RasterState::default();
        self.target = Some(FrameTarget { encoder, view });
    }

    /// Ends the current frame and returns its encoder.
    pub fn end_frame(&mut self) -> Option<wgpu::CommandEncoder> {
        self.raster = RasterState::default();
        self.target.take().map(|t| t.encoder)
    }

    /// Target of the frame in flight.
    pub fn target_mut(&mut self) -> Result<&mut FrameTarget> {
        self.target
            .as_mut()
            .context("no frame in flight; tasks only run inside a flush")
    }

    /// Returns the cached pipeline for `key`, building it on first use.
    pub fn pipeline<F>(&mut self, key: PipelineKey, build: F) -> wgpu::RenderPipeline
    where
        F: FnOnce(&wgpu::Device, &PipelineKey) -> wgpu::RenderPipeline,
    {
        let device = &self.device;
        self.pipelines
            .entry(key)
            .or_insert_with(|| {
                log::debug!("building pipeline {key:?}");
                build(device, &key)
            })
            .clone()
    }

    /// Drops every cached pipeline, e.g. after the surface format changed.
    pub fn clear_pipelines(&mut self) {
        self.pipelines.clear();
    }
}

impl Backend for WgpuBackend {
    fn setup(&mut self) -> Result<()> {
        let info = &self.adapter_info;
        log::info!(
            "graphics adapter: {} ({:?}, {:?}), surface format {:?}",
            info.name,
            info.backend,
            info.device_type,
            self.surface_format
        );
        self.clear_pipelines();
        Ok(())
    }

    fn driver_version(&self) -> Option<String> {
        driver_version_string(&self.adapter_info.driver_info)
    }

    fn enable_blending(&mut self) {
        self.raster.blend = true;
        self.raster.alpha_test = true;
    }

    fn set_culling(&mut self, enabled: bool) {
        self.raster.cull = enabled;
    }
}

/// wgpu reports the GL version string as `driver_info` on the GL backend;
/// other backends carry the vendor driver string there.
fn driver_version_string(driver_info: &str) -> Option<String> {
    let trimmed = driver_info.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}
