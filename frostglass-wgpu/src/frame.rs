//! Per-frame [`RenderDevice`] over a wgpu command encoder.

use frostglass::{
    AllocationError, CaptureError, Destination, KernelPass, PxPosition, PxRect, PxSize,
    RenderDevice, RenderTarget, TargetSlot,
};
use tracing::trace;

use crate::{
    pipelines::{CompositeUniforms, KernelUniforms, ndc_rect},
    renderer::BlurRenderer,
    target::WgpuTarget,
};

/// Records blur work for one frame.
///
/// The frame texture must have been created with `COPY_SRC` and
/// `RENDER_ATTACHMENT` usage and in the renderer's target format, see
/// [`BlurRenderer::create_frame_texture`]. Nodes are placed by translation
/// only: [`Destination::Node`] rectangles are offset by the node origin set
/// with [`BlurFrame::set_node_origin`].
pub struct BlurFrame<'a> {
    renderer: &'a BlurRenderer,
    encoder: &'a mut wgpu::CommandEncoder,
    frame: &'a wgpu::Texture,
    frame_view: wgpu::TextureView,
    frame_size: PxSize,
    node_origin: PxPosition,
}

impl<'a> BlurFrame<'a> {
    pub(crate) fn new(
        renderer: &'a BlurRenderer,
        encoder: &'a mut wgpu::CommandEncoder,
        frame: &'a wgpu::Texture,
    ) -> Self {
        let extent = frame.size();
        Self {
            renderer,
            encoder,
            frame,
            frame_view: frame.create_view(&wgpu::TextureViewDescriptor::default()),
            frame_size: PxSize::from_u32(extent.width, extent.height),
            node_origin: PxPosition::ZERO,
        }
    }

    /// Sets the screen position of the node being painted.
    pub fn set_node_origin(&mut self, origin: PxPosition) {
        self.node_origin = origin;
    }

    /// Screen position of the node being painted.
    pub fn node_origin(&self) -> PxPosition {
        self.node_origin
    }

    /// The renderer this frame records for.
    pub fn renderer(&self) -> &'a BlurRenderer {
        self.renderer
    }

    /// The encoder blur work is recorded into, for hosts that paint their own
    /// content.
    pub fn encoder(&mut self) -> &mut wgpu::CommandEncoder {
        self.encoder
    }

    /// A view of the frame texture.
    pub fn frame_view(&self) -> &wgpu::TextureView {
        &self.frame_view
    }

    /// Draws `src` over `rect` of the frame with premultiplied alpha
    /// blending.
    pub fn blit_to_frame(&mut self, src: &wgpu::TextureView, rect: PxRect) {
        let uniforms = CompositeUniforms::covering(ndc_rect(rect, self.frame_size), 1.0);
        draw(
            self.encoder,
            self.renderer,
            &self.renderer.pipelines().present,
            src,
            &self.frame_view,
            &uniforms,
            wgpu::LoadOp::Load,
            "frostglass_blit_pass",
        );
    }

    /// Draws `src` over `rect` of `target` with premultiplied alpha blending.
    pub fn blit_to_target(&mut self, src: &wgpu::TextureView, target: &WgpuTarget, rect: PxRect) {
        let uniforms = CompositeUniforms::covering(ndc_rect(rect, target.size()), 1.0);
        draw(
            self.encoder,
            self.renderer,
            &self.renderer.pipelines().present,
            src,
            target.view(),
            &uniforms,
            wgpu::LoadOp::Load,
            "frostglass_blit_pass",
        );
    }

    fn screen_rect(&self, destination: Destination) -> PxRect {
        match destination {
            Destination::Screen(rect) => rect,
            Destination::Node(rect) => PxRect {
                x: rect.x.saturating_add(self.node_origin.x),
                y: rect.y.saturating_add(self.node_origin.y),
                ..rect
            },
        }
    }
}

impl RenderDevice for BlurFrame<'_> {
    type Target = WgpuTarget;

    fn frame_size(&self) -> PxSize {
        self.frame_size
    }

    fn create_target(
        &mut self,
        slot: TargetSlot,
        size: PxSize,
    ) -> Result<WgpuTarget, AllocationError> {
        WgpuTarget::new(self.renderer.device(), slot, size, self.renderer.format())
    }

    fn clear(&mut self, target: &WgpuTarget) {
        let _pass = self.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("frostglass_clear_pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.view(),
                depth_slice: None,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                    store: wgpu::StoreOp::Store,
                },
            })],
            ..Default::default()
        });
    }

    fn copy_backdrop(&mut self, region: PxRect, dst: &WgpuTarget) -> Result<(), CaptureError> {
        let frame_rect = PxRect::from_position_size(PxPosition::ZERO, self.frame_size);
        if frame_rect.intersection(&region) != Some(region) || dst.size() != region.size() {
            return Err(CaptureError::OutOfFrame {
                region: region.size(),
                frame: self.frame_size,
            });
        }
        if self.frame.format() != dst.texture().format() {
            return Err(CaptureError::Device(format!(
                "frame format {:?} does not match target format {:?}",
                self.frame.format(),
                dst.texture().format()
            )));
        }
        if !self.frame.usage().contains(wgpu::TextureUsages::COPY_SRC) {
            return Err(CaptureError::Device(
                "frame texture lacks COPY_SRC usage".to_string(),
            ));
        }

        self.encoder.copy_texture_to_texture(
            wgpu::TexelCopyTextureInfo {
                texture: self.frame,
                mip_level: 0,
                origin: wgpu::Origin3d {
                    x: region.x.positive(),
                    y: region.y.positive(),
                    z: 0,
                },
                aspect: wgpu::TextureAspect::All,
            },
            dst.texture().as_image_copy(),
            wgpu::Extent3d {
                width: region.width.positive(),
                height: region.height.positive(),
                depth_or_array_layers: 1,
            },
        );
        Ok(())
    }

    fn resample(&mut self, src: &WgpuTarget, dst: &WgpuTarget) {
        trace!(from = ?src.size(), to = ?dst.size(), "resample");
        draw(
            self.encoder,
            self.renderer,
            &self.renderer.pipelines().resample,
            src.view(),
            dst.view(),
            &CompositeUniforms::full(1.0),
            wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
            "frostglass_resample_pass",
        );
    }

    fn kernel_pass(&mut self, src: &WgpuTarget, dst: &WgpuTarget, pass: &KernelPass) {
        draw(
            self.encoder,
            self.renderer,
            &self.renderer.pipelines().kernel,
            src.view(),
            dst.view(),
            &KernelUniforms::new(pass, src.size()),
            wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
            "frostglass_kernel_pass",
        );
    }

    fn brightness_pass(&mut self, src: &WgpuTarget, dst: &WgpuTarget, brightness: f32) {
        draw(
            self.encoder,
            self.renderer,
            &self.renderer.pipelines().brightness,
            src.view(),
            dst.view(),
            &CompositeUniforms::full(brightness),
            wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
            "frostglass_brightness_pass",
        );
    }

    fn present(&mut self, src: &WgpuTarget, destination: Destination) {
        let rect = self.screen_rect(destination);
        self.blit_to_frame(src.view(), rect);
    }
}

#[allow(clippy::too_many_arguments)]
fn draw<U: bytemuck::Pod>(
    encoder: &mut wgpu::CommandEncoder,
    renderer: &BlurRenderer,
    pipeline: &wgpu::RenderPipeline,
    src: &wgpu::TextureView,
    dst: &wgpu::TextureView,
    uniforms: &U,
    load: wgpu::LoadOp<wgpu::Color>,
    label: &'static str,
) {
    let bind_group = renderer
        .pipelines()
        .bind_group(renderer.device(), src, uniforms);

    let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: dst,
            depth_slice: None,
            resolve_target: None,
            ops: wgpu::Operations {
                load,
                store: wgpu::StoreOp::Store,
            },
        })],
        ..Default::default()
    });
    rpass.set_pipeline(pipeline);
    rpass.set_bind_group(0, &bind_group, &[]);
    rpass.draw(0..6, 0..1);
}
