//! In-memory [`RenderDevice`] and [`BlurHost`] for tests.
//!
//! [`RecordingDevice`] performs no rendering. It records every call as an
//! [`Op`], tracks how many of its targets are still alive and can be told to
//! fail allocations or backdrop copies.

use std::{cell::Cell, rc::Rc};

use crate::{
    device::{Destination, RenderDevice, RenderTarget},
    error::{AllocationError, CaptureError},
    host::{BlurHost, CaptureRequest, HostNode},
    kernel::KernelPass,
    px::{PxRect, PxSize},
    target::TargetSlot,
};

/// Identifier of a [`RecordingTarget`], unique per device.
pub type TargetId = u32;

/// One recorded call.
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    /// [`RenderDevice::create_target`] succeeded.
    CreateTarget {
        /// New target.
        id: TargetId,
        /// Requested slot.
        slot: TargetSlot,
        /// Requested size.
        size: PxSize,
    },
    /// [`RenderDevice::clear`].
    Clear {
        /// Cleared target.
        target: TargetId,
    },
    /// [`RenderDevice::copy_backdrop`] succeeded.
    CopyBackdrop {
        /// Frame region.
        region: PxRect,
        /// Destination target.
        dst: TargetId,
    },
    /// [`RenderDevice::resample`].
    Resample {
        /// Source target.
        src: TargetId,
        /// Destination target.
        dst: TargetId,
    },
    /// [`RenderDevice::kernel_pass`].
    KernelPass {
        /// Source target.
        src: TargetId,
        /// Destination target.
        dst: TargetId,
        /// Pass parameters.
        pass: KernelPass,
    },
    /// [`RenderDevice::brightness_pass`].
    BrightnessPass {
        /// Source target.
        src: TargetId,
        /// Destination target.
        dst: TargetId,
        /// RGB multiplier.
        brightness: f32,
    },
    /// [`RenderDevice::present`].
    Present {
        /// Presented target.
        src: TargetId,
        /// Where it was drawn.
        destination: Destination,
    },
    /// The host painted itself into a capture target.
    HostCapture {
        /// Capture target.
        target: TargetId,
        /// Request passed by the effect.
        request: CaptureRequest,
    },
    /// The host painted itself normally.
    DefaultPaint,
}

impl Op {
    /// Short name of the operation, handy for ordering assertions.
    pub fn kind(&self) -> &'static str {
        match self {
            Op::CreateTarget { .. } => "create_target",
            Op::Clear { .. } => "clear",
            Op::CopyBackdrop { .. } => "copy_backdrop",
            Op::Resample { .. } => "resample",
            Op::KernelPass { .. } => "kernel_pass",
            Op::BrightnessPass { .. } => "brightness_pass",
            Op::Present { .. } => "present",
            Op::HostCapture { .. } => "host_capture",
            Op::DefaultPaint => "default_paint",
        }
    }

    /// Returns `true` for draws that belong to the blur itself.
    pub fn is_blur_draw(&self) -> bool {
        matches!(
            self,
            Op::CopyBackdrop { .. }
                | Op::Resample { .. }
                | Op::KernelPass { .. }
                | Op::BrightnessPass { .. }
                | Op::Present { .. }
                | Op::HostCapture { .. }
        )
    }
}

#[derive(Debug)]
struct LiveGuard(Rc<Cell<usize>>);

impl Drop for LiveGuard {
    fn drop(&mut self) {
        self.0.set(self.0.get().saturating_sub(1));
    }
}

/// Target handed out by [`RecordingDevice`].
#[derive(Debug)]
pub struct RecordingTarget {
    id: TargetId,
    slot: TargetSlot,
    size: PxSize,
    _live: LiveGuard,
}

impl RecordingTarget {
    /// Device-unique identifier.
    pub fn id(&self) -> TargetId {
        self.id
    }

    /// Slot the target was created for.
    pub fn slot(&self) -> TargetSlot {
        self.slot
    }
}

impl RenderTarget for RecordingTarget {
    fn size(&self) -> PxSize {
        self.size
    }
}

/// A [`RenderDevice`] that records calls instead of rendering.
#[derive(Debug)]
pub struct RecordingDevice {
    frame_size: PxSize,
    ops: Vec<Op>,
    live: Rc<Cell<usize>>,
    next_id: TargetId,
    allocations: usize,
    failing_slot: Option<TargetSlot>,
    failing_backdrop: bool,
}

impl RecordingDevice {
    /// Creates a device rendering a frame of `frame_size`.
    pub fn new(frame_size: PxSize) -> Self {
        Self {
            frame_size,
            ops: Vec::new(),
            live: Rc::new(Cell::new(0)),
            next_id: 0,
            allocations: 0,
            failing_slot: None,
            failing_backdrop: false,
        }
    }

    /// Makes every allocation for `slot` fail until [`Self::clear_failures`].
    pub fn fail_allocation(&mut self, slot: TargetSlot) {
        self.failing_slot = Some(slot);
    }

    /// Makes every backdrop copy fail until [`Self::clear_failures`].
    pub fn fail_backdrop_copy(&mut self) {
        self.failing_backdrop = true;
    }

    /// Stops injecting failures.
    pub fn clear_failures(&mut self) {
        self.failing_slot = None;
        self.failing_backdrop = false;
    }

    /// Changes the frame size reported from now on.
    pub fn set_frame_size(&mut self, size: PxSize) {
        self.frame_size = size;
    }

    /// Records an operation on behalf of a host.
    pub fn record(&mut self, op: Op) {
        self.ops.push(op);
    }

    /// Every recorded operation.
    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    /// Returns and forgets the recorded operations.
    pub fn take_ops(&mut self) -> Vec<Op> {
        std::mem::take(&mut self.ops)
    }

    /// Number of recorded blur draws, see [`Op::is_blur_draw`].
    pub fn blur_draw_count(&self) -> usize {
        self.ops.iter().filter(|op| op.is_blur_draw()).count()
    }

    /// Number of targets created and not yet dropped.
    pub fn live_targets(&self) -> usize {
        self.live.get()
    }

    /// Number of successful allocations.
    pub fn allocations(&self) -> usize {
        self.allocations
    }
}

impl RenderDevice for RecordingDevice {
    type Target = RecordingTarget;

    fn frame_size(&self) -> PxSize {
        self.frame_size
    }

    fn create_target(
        &mut self,
        slot: TargetSlot,
        size: PxSize,
    ) -> Result<RecordingTarget, AllocationError> {
        if self.failing_slot == Some(slot) {
            return Err(AllocationError::Device(format!("injected failure for {slot}")));
        }
        let id = self.next_id;
        self.next_id += 1;
        self.allocations += 1;
        self.live.set(self.live.get() + 1);
        self.ops.push(Op::CreateTarget { id, slot, size });
        Ok(RecordingTarget {
            id,
            slot,
            size,
            _live: LiveGuard(self.live.clone()),
        })
    }

    fn clear(&mut self, target: &RecordingTarget) {
        self.ops.push(Op::Clear { target: target.id });
    }

    fn copy_backdrop(
        &mut self,
        region: PxRect,
        dst: &RecordingTarget,
    ) -> Result<(), CaptureError> {
        if self.failing_backdrop {
            return Err(CaptureError::Device("injected failure".to_string()));
        }
        let frame = PxRect::from_position_size(Default::default(), self.frame_size);
        if frame.intersection(&region) != Some(region) {
            return Err(CaptureError::OutOfFrame {
                region: region.size(),
                frame: self.frame_size,
            });
        }
        self.ops.push(Op::CopyBackdrop {
            region,
            dst: dst.id,
        });
        Ok(())
    }

    fn resample(&mut self, src: &RecordingTarget, dst: &RecordingTarget) {
        self.ops.push(Op::Resample {
            src: src.id,
            dst: dst.id,
        });
    }

    fn kernel_pass(&mut self, src: &RecordingTarget, dst: &RecordingTarget, pass: &KernelPass) {
        self.ops.push(Op::KernelPass {
            src: src.id,
            dst: dst.id,
            pass: *pass,
        });
    }

    fn brightness_pass(&mut self, src: &RecordingTarget, dst: &RecordingTarget, brightness: f32) {
        self.ops.push(Op::BrightnessPass {
            src: src.id,
            dst: dst.id,
            brightness,
        });
    }

    fn present(&mut self, src: &RecordingTarget, destination: Destination) {
        self.ops.push(Op::Present {
            src: src.id,
            destination,
        });
    }
}

/// A [`BlurHost`] with fixed geometry that counts the calls it receives.
#[derive(Debug, Clone)]
pub struct RecordingHost {
    /// Reported by [`HostNode::logical_size`].
    pub size: PxSize,
    /// Reported by [`HostNode::transformed_position`].
    pub position: [f32; 2],
    /// Reported by [`HostNode::transformed_size`]. Defaults to `size`.
    pub transformed_size: [f32; 2],
    /// Reported by [`HostNode::paint_opacity`].
    pub opacity: u8,
    /// Calls to [`BlurHost::paint_into`].
    pub captures: usize,
    /// Calls to [`BlurHost::continue_default_paint`].
    pub default_paints: usize,
    /// Calls to [`HostNode::queue_redraw`].
    pub redraws: usize,
}

impl RecordingHost {
    /// A fully opaque node of `size` at the frame origin.
    pub fn new(size: PxSize) -> Self {
        Self {
            size,
            position: [0.0, 0.0],
            transformed_size: size.to_f32_arr2(),
            opacity: u8::MAX,
            captures: 0,
            default_paints: 0,
            redraws: 0,
        }
    }

    /// Moves the node to `position` on screen.
    pub fn at(mut self, position: [f32; 2]) -> Self {
        self.position = position;
        self
    }
}

impl HostNode for RecordingHost {
    fn logical_size(&self) -> PxSize {
        self.size
    }

    fn transformed_position(&self) -> [f32; 2] {
        self.position
    }

    fn transformed_size(&self) -> [f32; 2] {
        self.transformed_size
    }

    fn paint_opacity(&self) -> u8 {
        self.opacity
    }

    fn queue_redraw(&mut self) {
        self.redraws += 1;
    }
}

impl BlurHost<RecordingDevice> for RecordingHost {
    fn paint_into(
        &mut self,
        device: &mut RecordingDevice,
        target: &RecordingTarget,
        request: CaptureRequest,
    ) {
        self.captures += 1;
        device.record(Op::HostCapture {
            target: target.id,
            request,
        });
    }

    fn continue_default_paint(&mut self, device: &mut RecordingDevice) {
        self.default_paints += 1;
        device.record(Op::DefaultPaint);
    }
}
