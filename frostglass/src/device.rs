//! The GPU operations the effect records each frame.
//!
//! A [`RenderDevice`] is handed to [`crate::effect::BlurEffect::paint`] for
//! the duration of one frame. Implementations record draws into whatever
//! command stream the renderer uses; nothing here waits for the GPU.

use crate::{
    error::{AllocationError, CaptureError},
    kernel::KernelPass,
    px::{PxRect, PxSize},
    target::TargetSlot,
};

/// A texture that can be rendered to and sampled from.
pub trait RenderTarget {
    /// Allocated size in pixels.
    fn size(&self) -> PxSize;
}

/// Where a finished blur is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    /// A rectangle in the node's local coordinate space. The device applies
    /// the node's transform, just as it would for the node's own paint.
    Node(PxRect),
    /// A rectangle in frame (screen) coordinates.
    Screen(PxRect),
}

/// Per-frame access to the GPU.
///
/// All draw operations sample `src` with bilinear filtering and clamp-to-edge
/// addressing and overwrite `dst` entirely.
pub trait RenderDevice {
    /// Render target type produced by this device.
    type Target: RenderTarget;

    /// Size of the frame currently being rendered.
    fn frame_size(&self) -> PxSize;

    /// Creates an uninitialized target of exactly `size`.
    fn create_target(
        &mut self,
        slot: TargetSlot,
        size: PxSize,
    ) -> Result<Self::Target, AllocationError>;

    /// Clears `target` to transparent black.
    fn clear(&mut self, target: &Self::Target);

    /// Copies `region` of the frame rendered so far into `dst` at 1:1 scale.
    fn copy_backdrop(&mut self, region: PxRect, dst: &Self::Target) -> Result<(), CaptureError>;

    /// Draws `src` scaled to cover `dst`.
    fn resample(&mut self, src: &Self::Target, dst: &Self::Target);

    /// Runs one separable Gaussian pass from `src` into `dst`.
    fn kernel_pass(&mut self, src: &Self::Target, dst: &Self::Target, pass: &KernelPass);

    /// Multiplies the RGB channels of `src` by `brightness` into `dst`.
    fn brightness_pass(&mut self, src: &Self::Target, dst: &Self::Target, brightness: f32);

    /// Draws `src` stretched over `destination` in the frame, blending over
    /// what is already there with premultiplied alpha.
    fn present(&mut self, src: &Self::Target, destination: Destination);
}
