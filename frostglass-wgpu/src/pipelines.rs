//! Render pipelines and uniform layouts shared by every blur instance.

use frostglass::{KernelPass, PxRect, PxSize};
use glam::{Vec2, Vec4};
use wgpu::{include_wgsl, util::DeviceExt};

/// Uniforms of `kernel.wgsl`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub(crate) struct KernelUniforms {
    direction: Vec2,
    texel_size: Vec2,
    sigma: f32,
    steps: u32,
    opacity: f32,
    _pad: f32,
}

impl KernelUniforms {
    pub(crate) fn new(pass: &KernelPass, src_size: PxSize) -> Self {
        let [width, height] = src_size.to_f32_arr2();
        Self {
            direction: Vec2::from_array(pass.axis.direction()),
            texel_size: Vec2::new(1.0 / width.max(1.0), 1.0 / height.max(1.0)),
            sigma: pass.sigma,
            steps: pass.steps,
            opacity: pass.opacity,
            _pad: 0.0,
        }
    }
}

/// Uniforms of `composite.wgsl`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub(crate) struct CompositeUniforms {
    rect: Vec4,
    brightness: f32,
    _pad: [f32; 3],
}

impl CompositeUniforms {
    /// Covers the whole destination.
    pub(crate) fn full(brightness: f32) -> Self {
        Self::covering(Vec4::new(-1.0, 1.0, 1.0, -1.0), brightness)
    }

    /// Covers `rect`, given in NDC as left, top, right, bottom.
    pub(crate) fn covering(rect: Vec4, brightness: f32) -> Self {
        Self {
            rect,
            brightness,
            _pad: [0.0; 3],
        }
    }
}

/// Maps a pixel rectangle of a `target`-sized attachment to NDC.
pub(crate) fn ndc_rect(rect: PxRect, target: PxSize) -> Vec4 {
    let [width, height] = target.to_f32_arr2();
    let width = width.max(1.0);
    let height = height.max(1.0);
    let left = rect.x.to_f32();
    let top = rect.y.to_f32();
    let right = left + rect.width.to_f32();
    let bottom = top + rect.height.to_f32();
    Vec4::new(
        left / width * 2.0 - 1.0,
        1.0 - top / height * 2.0,
        right / width * 2.0 - 1.0,
        1.0 - bottom / height * 2.0,
    )
}

/// Compiled blur programs, sampler and bind group layout.
pub struct BlurPipelines {
    bind_group_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    pub(crate) kernel: wgpu::RenderPipeline,
    pub(crate) resample: wgpu::RenderPipeline,
    pub(crate) brightness: wgpu::RenderPipeline,
    pub(crate) present: wgpu::RenderPipeline,
}

impl BlurPipelines {
    /// Compiles every program for targets of `format`.
    pub fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        pipeline_cache: Option<&wgpu::PipelineCache>,
    ) -> Self {
        let kernel_shader = device.create_shader_module(include_wgsl!("shaders/kernel.wgsl"));
        let composite_shader =
            device.create_shader_module(include_wgsl!("shaders/composite.wgsl"));

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("frostglass_linear_clamp_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("frostglass_bind_group_layout"),
            entries: &[
                // 0: source texture
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                // 1: bilinear sampler
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                // 2: per-draw uniforms
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("frostglass_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let build = |label: &str,
                     module: &wgpu::ShaderModule,
                     fragment: &str,
                     blend: wgpu::BlendState| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module,
                    entry_point: Some("vs_main"),
                    buffers: &[],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module,
                    entry_point: Some(fragment),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format,
                        blend: Some(blend),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState::default(),
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview_mask: None,
                cache: pipeline_cache,
            })
        };

        Self {
            kernel: build(
                "frostglass_kernel_pipeline",
                &kernel_shader,
                "fs_main",
                wgpu::BlendState::REPLACE,
            ),
            resample: build(
                "frostglass_resample_pipeline",
                &composite_shader,
                "fs_copy",
                wgpu::BlendState::REPLACE,
            ),
            brightness: build(
                "frostglass_brightness_pipeline",
                &composite_shader,
                "fs_brightness",
                wgpu::BlendState::REPLACE,
            ),
            present: build(
                "frostglass_present_pipeline",
                &composite_shader,
                "fs_copy",
                wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING,
            ),
            bind_group_layout,
            sampler,
        }
    }

    /// Binds `src` and a fresh uniform buffer holding `uniforms`.
    pub(crate) fn bind_group<U: bytemuck::Pod>(
        &self,
        device: &wgpu::Device,
        src: &wgpu::TextureView,
        uniforms: &U,
    ) -> wgpu::BindGroup {
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("frostglass_uniform_buffer"),
            contents: bytemuck::bytes_of(uniforms),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("frostglass_bind_group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(src),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: uniform_buffer.as_entire_binding(),
                },
            ],
        })
    }
}

#[cfg(test)]
mod tests {
    use frostglass::{Axis, Px};

    use super::*;

    #[test]
    fn kernel_uniforms_pack_pass() {
        let pass = KernelPass::new(Axis::Vertical, 10, 2, 3.0).with_opacity(0.25);
        let uniforms = KernelUniforms::new(&pass, PxSize::from_u32(200, 100));
        let words: &[f32] = bytemuck::cast_slice(bytemuck::bytes_of(&uniforms));

        assert_eq!(std::mem::size_of::<KernelUniforms>(), 32);
        assert_eq!(&words[0..4], &[0.0, 1.0, 1.0 / 200.0, 1.0 / 100.0]);
        assert_eq!(words[4], 5.0);
        assert_eq!(words[5].to_bits(), 15);
        assert_eq!(words[6], 0.25);
    }

    #[test]
    fn composite_uniforms_are_std140_sized() {
        assert_eq!(std::mem::size_of::<CompositeUniforms>(), 32);
        let uniforms = CompositeUniforms::full(0.5);
        let words: &[f32] = bytemuck::cast_slice(bytemuck::bytes_of(&uniforms));
        assert_eq!(&words[0..5], &[-1.0, 1.0, 1.0, -1.0, 0.5]);
    }

    #[test]
    fn ndc_rect_maps_pixels() {
        let frame = PxSize::from_u32(200, 100);
        let full = ndc_rect(PxRect::new(Px(0), Px(0), Px(200), Px(100)), frame);
        assert_eq!(full, Vec4::new(-1.0, 1.0, 1.0, -1.0));

        let quarter = ndc_rect(PxRect::new(Px(100), Px(50), Px(100), Px(50)), frame);
        assert_eq!(quarter, Vec4::new(0.0, 0.0, 1.0, -1.0));

        let off_screen = ndc_rect(PxRect::new(Px(-100), Px(0), Px(100), Px(100)), frame);
        assert_eq!(off_screen.x, -2.0);
    }
}
