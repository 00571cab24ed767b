//! The scene-graph node an effect is attached to.

use crate::{device::RenderDevice, px::PxSize};

/// Parameters for painting the node into a capture target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureRequest {
    /// Uniform scale to apply to the node's content, `1 / factor`.
    pub scale: f32,
    /// Paint opacity to use instead of the node's own. Always fully opaque,
    /// since opacity is applied once during the horizontal pass.
    pub opacity: u8,
}

impl CaptureRequest {
    /// Request for a capture at working resolution `1 / factor`.
    pub fn at_factor(factor: u32) -> Self {
        Self {
            scale: 1.0 / factor.max(1) as f32,
            opacity: u8::MAX,
        }
    }
}

/// Device-independent queries against the host node.
pub trait HostNode {
    /// Size of the node's own allocation box, in pixels.
    fn logical_size(&self) -> PxSize;

    /// Top-left corner of the node's box after all transforms, in frame
    /// pixels. May be fractional.
    fn transformed_position(&self) -> [f32; 2];

    /// Size of the node's box after all transforms, in frame pixels.
    fn transformed_size(&self) -> [f32; 2];

    /// The opacity the node is painted with, including inherited opacity.
    fn paint_opacity(&self) -> u8;

    /// Asks the compositor to schedule another frame.
    fn queue_redraw(&mut self);
}

/// Painting hooks the effect calls during a frame on device `D`.
pub trait BlurHost<D: RenderDevice>: HostNode {
    /// Paints the node's content into `target` with `request` applied in
    /// place of the node's scale and opacity.
    fn paint_into(&mut self, device: &mut D, target: &D::Target, request: CaptureRequest);

    /// Paints the node as if no effect were attached.
    fn continue_default_paint(&mut self, device: &mut D);
}
