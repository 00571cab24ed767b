//! A one-node scene: a patterned backdrop and a translucent panel on top.

use frostglass::{BlurHost, CaptureRequest, HostNode, Px, PxPosition, PxRect, PxSize};
use frostglass_wgpu::{BlurFrame, BlurRenderer, WgpuTarget};

/// Premultiplied RGBA8 pixels.
pub struct Pixels {
    pub size: PxSize,
    pub data: Vec<u8>,
}

impl Pixels {
    fn generate(size: PxSize, mut shade: impl FnMut(u32, u32) -> [f32; 4]) -> Self {
        let width = size.width.positive();
        let height = size.height.positive();
        let mut data = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            for x in 0..width {
                let [r, g, b, a] = shade(x, y);
                for channel in [r * a, g * a, b * a, a] {
                    data.push((channel.clamp(0.0, 1.0) * 255.0).round() as u8);
                }
            }
        }
        Self { size, data }
    }

    /// Checkerboard crossed by diagonal colour bands. High-frequency content
    /// makes the blur easy to see.
    pub fn backdrop(size: PxSize) -> Self {
        let [width, height] = size.to_f32_arr2();
        Self::generate(size, |x, y| {
            let check = if (x / 24 + y / 24) % 2 == 0 { 0.9 } else { 0.2 };
            let t = (x as f32 / width + y as f32 / height) * 0.5;
            let band = ((x + y) / 60) % 3;
            let tint = match band {
                0 => [1.0, 0.35, 0.3],
                1 => [0.3, 0.8, 0.4],
                _ => [0.3, 0.45, 1.0],
            };
            [
                check * tint[0] * (1.0 - t) + t * 0.2,
                check * tint[1],
                check * tint[2] * t + 0.1,
                1.0,
            ]
        })
    }

    /// Horizontal bars with a thin outline, mostly opaque.
    pub fn panel(size: PxSize) -> Self {
        let width = size.width.positive();
        let height = size.height.positive();
        Self::generate(size, |x, y| {
            let border = x < 4 || y < 4 || x + 4 >= width || y + 4 >= height;
            if border {
                return [1.0, 1.0, 1.0, 1.0];
            }
            let bar = (y / 20) % 2 == 0;
            if bar {
                [0.95, 0.85, 0.2, 0.8]
            } else {
                [0.1, 0.1, 0.15, 0.55]
            }
        })
    }

    /// Uploads the pixels into `texture`, which must have the same size.
    pub fn upload(&self, renderer: &BlurRenderer, texture: &wgpu::Texture) {
        let width = self.size.width.positive();
        let height = self.size.height.positive();
        renderer.queue().write_texture(
            texture.as_image_copy(),
            &self.data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(width * 4),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
    }
}

/// The node carrying the blur effect.
pub struct PanelNode {
    position: PxPosition,
    size: PxSize,
    opacity: u8,
    _content: wgpu::Texture,
    content_view: wgpu::TextureView,
    pub redraw_requests: usize,
}

impl PanelNode {
    pub fn new(renderer: &BlurRenderer, position: PxPosition, size: PxSize, opacity: u8) -> Self {
        let content = renderer.create_frame_texture(size);
        Pixels::panel(size).upload(renderer, &content);
        let content_view = content.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            position,
            size,
            opacity,
            _content: content,
            content_view,
            redraw_requests: 0,
        }
    }

    pub fn position(&self) -> PxPosition {
        self.position
    }
}

impl HostNode for PanelNode {
    fn logical_size(&self) -> PxSize {
        self.size
    }

    fn transformed_position(&self) -> [f32; 2] {
        self.position.to_f32_arr2()
    }

    fn transformed_size(&self) -> [f32; 2] {
        self.size.to_f32_arr2()
    }

    fn paint_opacity(&self) -> u8 {
        self.opacity
    }

    fn queue_redraw(&mut self) {
        self.redraw_requests += 1;
    }
}

impl<'a> BlurHost<BlurFrame<'a>> for PanelNode {
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
        device.blit_to_target(&self.content_view, target, rect);
    }

    fn continue_default_paint(&mut self, device: &mut BlurFrame<'a>) {
        let rect = PxRect::from_position_size(self.position, self.size);
        device.blit_to_frame(&self.content_view, rect);
    }
}
