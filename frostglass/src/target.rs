//! Render target cache.
//!
//! Each effect instance owns one target per [`TargetSlot`]. Targets are
//! allocated lazily and survive across frames; a slot is only reallocated
//! when the size it must hold changes.

use std::fmt;

use tracing::debug;

use crate::{
    device::{RenderDevice, RenderTarget},
    error::AllocationError,
    px::PxSize,
};

/// Role of a cached render target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetSlot {
    /// The node (or resampled backdrop) at working resolution.
    Capture,
    /// Output of the vertical kernel pass.
    VerticalPass,
    /// Output of the horizontal kernel pass.
    HorizontalPass,
    /// Brightness-adjusted result, the one drawn back into the frame.
    Brightness,
    /// Full-resolution copy of the frame behind the node. Background mode
    /// only.
    Backdrop,
}

impl TargetSlot {
    /// Every slot, in allocation order.
    pub const ALL: [TargetSlot; 5] = [
        TargetSlot::Backdrop,
        TargetSlot::Capture,
        TargetSlot::VerticalPass,
        TargetSlot::HorizontalPass,
        TargetSlot::Brightness,
    ];

    fn index(self) -> usize {
        match self {
            TargetSlot::Backdrop => 0,
            TargetSlot::Capture => 1,
            TargetSlot::VerticalPass => 2,
            TargetSlot::HorizontalPass => 3,
            TargetSlot::Brightness => 4,
        }
    }

    /// Slots written by the blur passes that follow the capture.
    pub fn is_intermediate(self) -> bool {
        matches!(
            self,
            TargetSlot::VerticalPass | TargetSlot::HorizontalPass | TargetSlot::Brightness
        )
    }
}

impl fmt::Display for TargetSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TargetSlot::Capture => "capture",
            TargetSlot::VerticalPass => "vertical pass",
            TargetSlot::HorizontalPass => "horizontal pass",
            TargetSlot::Brightness => "brightness",
            TargetSlot::Backdrop => "backdrop",
        };
        f.write_str(name)
    }
}

/// What [`RenderTargetCache::ensure`] had to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ensured {
    /// The existing target already had the right size. Its content is intact.
    Reused,
    /// A new target was created. Its content is undefined.
    Allocated,
}

/// Lazily (re)allocated render targets, one per [`TargetSlot`].
#[derive(Debug)]
pub struct RenderTargetCache<T> {
    slots: [Option<T>; 5],
    allocations: u64,
}

impl<T> Default for RenderTargetCache<T> {
    fn default() -> Self {
        Self {
            slots: [None, None, None, None, None],
            allocations: 0,
        }
    }
}

impl<T: RenderTarget> RenderTargetCache<T> {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes sure `slot` holds a target of `floor(width / factor)` x
    /// `floor(height / factor)` pixels.
    ///
    /// The previous target is dropped before a replacement is requested, so a
    /// failed allocation leaves the slot empty and the next call retries.
    pub fn ensure<D>(
        &mut self,
        device: &mut D,
        slot: TargetSlot,
        width: u32,
        height: u32,
        factor: u32,
    ) -> Result<Ensured, AllocationError>
    where
        D: RenderDevice<Target = T>,
    {
        let size = PxSize::from_u32(width, height).div_floor(factor);
        let entry = &mut self.slots[slot.index()];

        if entry.as_ref().is_some_and(|target| target.size() == size) {
            return Ok(Ensured::Reused);
        }
        *entry = None;

        if size.is_empty() {
            return Err(AllocationError::EmptyExtent {
                width: size.width.positive(),
                height: size.height.positive(),
            });
        }

        let target = device.create_target(slot, size)?;
        debug!(
            %slot,
            width = size.width.raw(),
            height = size.height.raw(),
            factor,
            "allocated blur target"
        );
        *entry = Some(target);
        self.allocations += 1;
        Ok(Ensured::Allocated)
    }

    /// The target currently held by `slot`.
    pub fn get(&self, slot: TargetSlot) -> Option<&T> {
        self.slots[slot.index()].as_ref()
    }

    /// Returns `true` if `slot` holds a target.
    pub fn is_allocated(&self, slot: TargetSlot) -> bool {
        self.slots[slot.index()].is_some()
    }

    /// Drops the target held by `slot`, if any. Returns whether one was held.
    pub fn release(&mut self, slot: TargetSlot) -> bool {
        let released = self.slots[slot.index()].take().is_some();
        if released {
            debug!(%slot, "released blur target");
        }
        released
    }

    /// Drops every held target.
    pub fn release_all(&mut self) {
        for slot in TargetSlot::ALL {
            self.release(slot);
        }
    }

    /// Number of targets currently held.
    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Total number of successful allocations over the cache's lifetime.
    pub fn allocation_count(&self) -> u64 {
        self.allocations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingDevice;

    fn device() -> RecordingDevice {
        RecordingDevice::new(PxSize::from_u32(1920, 1080))
    }

    #[test]
    fn ensure_reuses_matching_size() {
        let mut device = device();
        let mut cache = RenderTargetCache::new();

        let first = cache.ensure(&mut device, TargetSlot::Capture, 1024, 768, 2);
        assert_eq!(first, Ok(Ensured::Allocated));
        assert_eq!(
            cache.get(TargetSlot::Capture).map(|t| t.size()),
            Some(PxSize::from_u32(512, 384))
        );

        let second = cache.ensure(&mut device, TargetSlot::Capture, 1025, 769, 2);
        assert_eq!(second, Ok(Ensured::Reused));
        assert_eq!(cache.allocation_count(), 1);
        assert_eq!(device.allocations(), 1);
    }

    #[test]
    fn ensure_reallocates_on_size_change() {
        let mut device = device();
        let mut cache = RenderTargetCache::new();

        cache
            .ensure(&mut device, TargetSlot::VerticalPass, 800, 600, 1)
            .expect("first allocation");
        let resized = cache.ensure(&mut device, TargetSlot::VerticalPass, 800, 600, 2);
        assert_eq!(resized, Ok(Ensured::Allocated));
        assert_eq!(cache.allocation_count(), 2);
        assert_eq!(device.live_targets(), 1);
    }

    #[test]
    fn failed_allocation_leaves_slot_empty() {
        let mut device = device();
        let mut cache = RenderTargetCache::new();

        cache
            .ensure(&mut device, TargetSlot::Backdrop, 400, 300, 1)
            .expect("first allocation");
        device.fail_allocation(TargetSlot::Backdrop);

        let result = cache.ensure(&mut device, TargetSlot::Backdrop, 500, 300, 1);
        assert!(matches!(result, Err(AllocationError::Device(_))));
        assert!(!cache.is_allocated(TargetSlot::Backdrop));
        assert_eq!(device.live_targets(), 0);

        device.clear_failures();
        let retry = cache.ensure(&mut device, TargetSlot::Backdrop, 500, 300, 1);
        assert_eq!(retry, Ok(Ensured::Allocated));
    }

    #[test]
    fn empty_extent_is_rejected() {
        let mut device = device();
        let mut cache = RenderTargetCache::new();

        let result = cache.ensure(&mut device, TargetSlot::Capture, 1, 64, 2);
        assert_eq!(
            result,
            Err(AllocationError::EmptyExtent {
                width: 0,
                height: 32
            })
        );
        assert_eq!(device.allocations(), 0);
    }

    #[test]
    fn release_is_idempotent() {
        let mut device = device();
        let mut cache = RenderTargetCache::new();
        for slot in TargetSlot::ALL {
            cache
                .ensure(&mut device, slot, 64, 64, 1)
                .expect("allocation");
        }
        assert_eq!(cache.live_count(), 5);
        assert_eq!(device.live_targets(), 5);

        assert!(cache.release(TargetSlot::Backdrop));
        assert!(!cache.release(TargetSlot::Backdrop));
        assert_eq!(device.live_targets(), 4);

        cache.release_all();
        cache.release_all();
        assert_eq!(cache.live_count(), 0);
        assert_eq!(device.live_targets(), 0);
    }

    #[test]
    fn slot_names() {
        assert_eq!(TargetSlot::HorizontalPass.to_string(), "horizontal pass");
        assert!(TargetSlot::Brightness.is_intermediate());
        assert!(!TargetSlot::Capture.is_intermediate());
    }
}
