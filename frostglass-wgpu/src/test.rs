//! Runs the blur programs on a software adapter and reads the frame back.
//! Every test returns early when no adapter is available.

use std::sync::mpsc;

use frostglass::{
    BlurEffect, BlurHost, BlurMode, CaptureRequest, HostNode, PaintOutcome, Px, PxPosition,
    PxRect, PxSize,
};

use crate::{BlurFrame, BlurRenderer, PipelineCachePolicy, RendererConfig, WgpuTarget};

const COLOR: [u8; 4] = [200, 100, 50, 255];
const FRAME: u32 = 64;

fn create_renderer() -> Option<BlurRenderer> {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::all(),
        ..Default::default()
    });
    let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::LowPower,
        compatible_surface: None,
        force_fallback_adapter: true,
    }))
    .ok()?;
    let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
        required_features: wgpu::Features::empty(),
        required_limits: wgpu::Limits::default(),
        label: None,
        memory_hints: wgpu::MemoryHints::MemoryUsage,
        trace: wgpu::Trace::Off,
        experimental_features: wgpu::ExperimentalFeatures::default(),
    }))
    .ok()?;
    let config = RendererConfig {
        pipeline_cache: PipelineCachePolicy::Disabled,
        ..RendererConfig::default()
    };
    BlurRenderer::new(device, queue, adapter.get_info(), config).ok()
}

fn solid_texture(renderer: &BlurRenderer, size: PxSize, rgba: [u8; 4]) -> wgpu::Texture {
    let texture = renderer.create_frame_texture(size);
    let width = size.width.positive();
    let height = size.height.positive();
    let data: Vec<u8> = rgba
        .iter()
        .copied()
        .cycle()
        .take((width * height * 4) as usize)
        .collect();
    renderer.queue().write_texture(
        texture.as_image_copy(),
        &data,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(width * 4),
            rows_per_image: Some(height),
        },
        texture.size(),
    );
    texture
}

fn read_back(renderer: &BlurRenderer, texture: &wgpu::Texture) -> Vec<u8> {
    let extent = texture.size();
    let row = extent.width * 4;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    let padded = row.div_ceil(align) * align;
    let buffer = renderer.device().create_buffer(&wgpu::BufferDescriptor {
        label: None,
        size: u64::from(padded) * u64::from(extent.height),
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });
    let mut encoder = renderer
        .device()
        .create_command_encoder(&wgpu::CommandEncoderDescriptor::default());
    encoder.copy_texture_to_buffer(
        texture.as_image_copy(),
        wgpu::TexelCopyBufferInfo {
            buffer: &buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(padded),
                rows_per_image: Some(extent.height),
            },
        },
        extent,
    );
    renderer.queue().submit(Some(encoder.finish()));

    let slice = buffer.slice(..);
    let (tx, rx) = mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    renderer
        .device()
        .poll(wgpu::PollType::wait_indefinitely())
        .expect("device poll");
    rx.recv().expect("map callback").expect("buffer map");

    let mapped = slice.get_mapped_range();
    let mut pixels = Vec::with_capacity((row * extent.height) as usize);
    for line in mapped.chunks_exact(padded as usize) {
        pixels.extend_from_slice(&line[..row as usize]);
    }
    drop(mapped);
    buffer.unmap();
    pixels
}

fn assert_pixel(pixels: &[u8], x: u32, y: u32, expected: [u8; 4]) {
    let start = ((y * FRAME + x) * 4) as usize;
    let actual = &pixels[start..start + 4];
    for (channel, (&got, &want)) in actual.iter().zip(expected.iter()).enumerate() {
        assert!(
            got.abs_diff(want) <= 2,
            "pixel ({x}, {y}) channel {channel}: got {actual:?}, expected {expected:?}"
        );
    }
}

struct SolidNode {
    origin: PxPosition,
    size: PxSize,
    opacity: u8,
    _content: wgpu::Texture,
    view: wgpu::TextureView,
}

impl SolidNode {
    fn new(renderer: &BlurRenderer, origin: PxPosition, size: PxSize, rgba: [u8; 4]) -> Self {
        let content = solid_texture(renderer, size, rgba);
        let view = content.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            origin,
            size,
            opacity: 255,
            _content: content,
            view,
        }
    }
}

impl HostNode for SolidNode {
    fn logical_size(&self) -> PxSize {
        self.size
    }

    fn transformed_position(&self) -> [f32; 2] {
        self.origin.to_f32_arr2()
    }

    fn transformed_size(&self) -> [f32; 2] {
        self.size.to_f32_arr2()
    }

    fn paint_opacity(&self) -> u8 {
        self.opacity
    }

    fn queue_redraw(&mut self) {}
}

impl<'a> BlurHost<BlurFrame<'a>> for SolidNode {
    fn paint_into(
        &mut self,
        device: &mut BlurFrame<'a>,
        target: &WgpuTarget,
        request: CaptureRequest,
    ) {
        let [width, height] = self.size.to_f32_arr2();
        let rect = PxRect::new(
            Px::ZERO,
            Px::ZERO,
            Px::saturating_from_f32((width * request.scale).ceil()),
            Px::saturating_from_f32((height * request.scale).ceil()),
        );
        device.blit_to_target(&self.view, target, rect);
    }

    fn continue_default_paint(&mut self, device: &mut BlurFrame<'a>) {
        device.blit_to_frame(&self.view, PxRect::from_position_size(self.origin, self.size));
    }
}

fn paint_once(
    renderer: &BlurRenderer,
    frame: &wgpu::Texture,
    effect: &mut BlurEffect<WgpuTarget, SolidNode>,
) -> PaintOutcome {
    let mut encoder = renderer
        .device()
        .create_command_encoder(&wgpu::CommandEncoderDescriptor::default());
    let outcome = {
        let mut blur_frame = renderer.begin_frame(&mut encoder, frame);
        blur_frame.set_node_origin(effect.host().origin);
        effect.paint(&mut blur_frame, true)
    };
    renderer.queue().submit(Some(encoder.finish()));
    outcome
}

#[test]
fn actor_blur_of_uniform_content_keeps_its_color() {
    let Some(renderer) = create_renderer() else {
        return;
    };
    let frame_size = PxSize::from_u32(FRAME, FRAME);
    let frame = solid_texture(&renderer, frame_size, [0, 0, 0, 255]);

    for sigma in [3, 10] {
        let node = SolidNode::new(&renderer, PxPosition::ZERO, frame_size, COLOR);
        let mut effect = BlurEffect::new(node);
        effect.set_sigma(sigma);
        let outcome = paint_once(&renderer, &frame, &mut effect);
        assert_eq!(outcome, PaintOutcome::Blurred { captured: true });

        let pixels = read_back(&renderer, &frame);
        assert_pixel(&pixels, FRAME / 2, FRAME / 2, COLOR);
        assert_pixel(&pixels, 1, 1, COLOR);
    }
}

#[test]
fn actor_opacity_is_applied_once() {
    let Some(renderer) = create_renderer() else {
        return;
    };
    let frame_size = PxSize::from_u32(FRAME, FRAME);
    let frame = solid_texture(&renderer, frame_size, [0, 0, 0, 255]);
    let mut node = SolidNode::new(&renderer, PxPosition::ZERO, frame_size, COLOR);
    node.opacity = 128;

    let mut effect = BlurEffect::new(node);
    effect.set_sigma(10);
    paint_once(&renderer, &frame, &mut effect);

    // Half-transparent premultiplied colour over opaque black.
    let pixels = read_back(&renderer, &frame);
    assert_pixel(&pixels, FRAME / 2, FRAME / 2, [100, 50, 25, 255]);
}

#[test]
fn background_blur_applies_brightness() {
    let Some(renderer) = create_renderer() else {
        return;
    };
    let frame_size = PxSize::from_u32(FRAME, FRAME);
    let frame = solid_texture(&renderer, frame_size, COLOR);
    let origin = PxPosition::new(Px::new(8), Px::new(8));
    let node = SolidNode::new(&renderer, origin, PxSize::from_u32(48, 48), [0, 0, 0, 0]);

    let mut effect = BlurEffect::new(node);
    effect.set_mode(BlurMode::Background);
    effect.set_sigma(10);
    effect.set_brightness(0.5).expect("finite brightness");
    let outcome = paint_once(&renderer, &frame, &mut effect);
    assert_eq!(outcome, PaintOutcome::Blurred { captured: true });

    let pixels = read_back(&renderer, &frame);
    assert_pixel(&pixels, FRAME / 2, FRAME / 2, [100, 50, 25, 255]);
    // Outside the node the frame is untouched.
    assert_pixel(&pixels, 2, 2, COLOR);
}
