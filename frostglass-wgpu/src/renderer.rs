//! Shared GPU state for every blur instance on one device.

use std::io;

use frostglass::PxSize;
use tracing::{info, warn};

use crate::{
    config::{PipelineCachePolicy, RendererConfig},
    error::RendererError,
    frame::BlurFrame,
    pipeline_cache::{initialize_cache, save_cache},
    pipelines::BlurPipelines,
};

/// Owns the device, the compiled blur programs and the optional pipeline
/// cache. Create one per device and hand out a [`BlurFrame`] per frame.
pub struct BlurRenderer {
    device: wgpu::Device,
    queue: wgpu::Queue,
    adapter_info: wgpu::AdapterInfo,
    format: wgpu::TextureFormat,
    pipelines: BlurPipelines,
    pipeline_cache: Option<wgpu::PipelineCache>,
    cache_policy: PipelineCachePolicy,
}

impl BlurRenderer {
    /// Builds the renderer on an existing device.
    pub fn new(
        device: wgpu::Device,
        queue: wgpu::Queue,
        adapter_info: wgpu::AdapterInfo,
        config: RendererConfig,
    ) -> Result<Self, RendererError> {
        let features = config.target_format.guaranteed_format_features(device.features());
        let renderable = features.allowed_usages.contains(
            wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        );
        let filterable = features
            .flags
            .contains(wgpu::TextureFormatFeatureFlags::FILTERABLE);
        if !renderable || !filterable {
            return Err(RendererError::UnsupportedFormat(config.target_format));
        }

        let pipeline_cache = initialize_cache(&device, &adapter_info, &config.pipeline_cache);
        let pipelines = BlurPipelines::new(&device, config.target_format, pipeline_cache.as_ref());
        info!(
            adapter = %adapter_info.name,
            backend = ?adapter_info.backend,
            format = ?config.target_format,
            pipeline_cache = pipeline_cache.is_some(),
            "blur renderer initialized"
        );

        Ok(Self {
            device,
            queue,
            adapter_info,
            format: config.target_format,
            pipelines,
            pipeline_cache,
            cache_policy: config.pipeline_cache,
        })
    }

    /// Opens a device without a surface and builds the renderer on it.
    pub async fn headless(config: RendererConfig) -> Result<Self, RendererError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await?;

        let required_features = if config.pipeline_cache.is_enabled() {
            adapter.features() & wgpu::Features::PIPELINE_CACHE
        } else {
            wgpu::Features::empty()
        };
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("frostglass_device"),
                required_features,
                required_limits: adapter.limits(),
                memory_hints: wgpu::MemoryHints::MemoryUsage,
                trace: wgpu::Trace::Off,
                experimental_features: wgpu::ExperimentalFeatures::default(),
            })
            .await?;

        Self::new(device, queue, adapter.get_info(), config)
    }

    /// The device targets are created on.
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// The queue recorded frames are submitted to.
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Information about the adapter backing the device.
    pub fn adapter_info(&self) -> &wgpu::AdapterInfo {
        &self.adapter_info
    }

    /// Format of every blur target and of compatible frame textures.
    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    /// The compiled blur programs.
    pub fn pipelines(&self) -> &BlurPipelines {
        &self.pipelines
    }

    /// The pipeline cache, when the policy and the adapter allow one.
    pub fn pipeline_cache(&self) -> Option<&wgpu::PipelineCache> {
        self.pipeline_cache.as_ref()
    }

    /// Starts recording blur work for a frame rendered into `frame`.
    pub fn begin_frame<'a>(
        &'a self,
        encoder: &'a mut wgpu::CommandEncoder,
        frame: &'a wgpu::Texture,
    ) -> BlurFrame<'a> {
        BlurFrame::new(self, encoder, frame)
    }

    /// Creates a texture the effect can render into and copy backdrops from.
    pub fn create_frame_texture(&self, size: PxSize) -> wgpu::Texture {
        self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("frostglass_frame"),
            size: wgpu::Extent3d {
                width: size.width.positive().max(1),
                height: size.height.positive().max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: self.format,
            usage: crate::target::TARGET_USAGES,
            view_formats: &[],
        })
    }

    /// Writes the pipeline cache to its configured directory, if any.
    pub fn save_pipeline_cache(&self) -> io::Result<()> {
        let (Some(cache), Some(dir)) = (&self.pipeline_cache, self.cache_policy.directory()) else {
            return Ok(());
        };
        save_cache(cache, &self.adapter_info, &dir)
    }

    /// Persists the pipeline cache and releases the device.
    pub fn shutdown(self) {
        if let Err(err) = self.save_pipeline_cache() {
            warn!(%err, "failed to save pipeline cache");
        }
    }
}
