//! Ordered draw calls of one blurred frame.
//!
//! ```text
//! [backdrop] --copy--> Backdrop --resample--+
//!                                           v
//! [node] ------------paint at 1/factor--> Capture
//!                                           |
//!                         vertical kernel   v
//!                                      VerticalPass
//!                  horizontal kernel x opacity |
//!                                           v
//!                                     HorizontalPass
//!                          rgb x brightness |
//!                                           v
//!                                       Brightness --present--> frame
//! ```

use smallvec::SmallVec;
use tracing::trace;

use crate::{
    config::BlurConfig,
    device::{Destination, RenderDevice, RenderTarget},
    error::{BlurError, BlurResult},
    kernel::{Axis, KernelPass},
    px::{PxRect, PxSize},
    target::{Ensured, RenderTargetCache, TargetSlot},
};

/// Targets checked by one [`BlurPipeline::ensure_targets`] call.
pub type EnsuredTargets = SmallVec<[(TargetSlot, Ensured); 5]>;

/// Per-frame blur parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlurParams {
    /// Sigma at full resolution.
    pub sigma: u32,
    /// Working-resolution divisor.
    pub factor: u32,
    /// Paint opacity in `[0, 1]`, folded into the horizontal pass.
    pub opacity: f32,
    /// RGB multiplier in `[0, 1]`.
    pub brightness: f32,
}

/// Records the capture, kernel, brightness and present passes against a
/// [`RenderDevice`].
#[derive(Debug, Clone, Copy)]
pub struct BlurPipeline {
    kernel_extent: f32,
}

impl BlurPipeline {
    /// Creates a pipeline using the kernel extent of `config`.
    pub fn new(config: &BlurConfig) -> Self {
        Self {
            kernel_extent: config.kernel_extent,
        }
    }

    /// The two separable passes for `params`, vertical first.
    pub fn kernel_passes(&self, params: &BlurParams) -> [KernelPass; 2] {
        [
            KernelPass::new(Axis::Vertical, params.sigma, params.factor, self.kernel_extent),
            KernelPass::new(
                Axis::Horizontal,
                params.sigma,
                params.factor,
                self.kernel_extent,
            )
            .with_opacity(params.opacity),
        ]
    }

    /// Ensures every target the frame needs for a source of `source` pixels.
    /// The backdrop target, when requested, stays at full resolution.
    pub fn ensure_targets<D: RenderDevice>(
        &self,
        device: &mut D,
        cache: &mut RenderTargetCache<D::Target>,
        source: PxSize,
        factor: u32,
        with_backdrop: bool,
    ) -> BlurResult<EnsuredTargets> {
        let width = source.width.positive();
        let height = source.height.positive();
        let mut ensured = EnsuredTargets::new();

        for slot in TargetSlot::ALL {
            let slot_factor = match slot {
                TargetSlot::Backdrop if !with_backdrop => continue,
                TargetSlot::Backdrop => 1,
                _ => factor,
            };
            let outcome = cache
                .ensure(device, slot, width, height, slot_factor)
                .map_err(|source| BlurError::Allocation { slot, source })?;
            ensured.push((slot, outcome));
        }
        Ok(ensured)
    }

    /// Copies `region` of the frame and resamples it into the capture target.
    pub fn capture_backdrop<D: RenderDevice>(
        &self,
        device: &mut D,
        cache: &RenderTargetCache<D::Target>,
        region: PxRect,
    ) -> BlurResult<()> {
        let backdrop = target(cache, TargetSlot::Backdrop)?;
        let capture = target(cache, TargetSlot::Capture)?;
        device.copy_backdrop(region, backdrop)?;
        trace!(?region, "copied backdrop");
        device.resample(backdrop, capture);
        Ok(())
    }

    /// Runs the vertical, horizontal and brightness passes over the capture.
    pub fn blur<D: RenderDevice>(
        &self,
        device: &mut D,
        cache: &RenderTargetCache<D::Target>,
        params: &BlurParams,
    ) -> BlurResult<()> {
        let capture = target(cache, TargetSlot::Capture)?;
        let vertical = target(cache, TargetSlot::VerticalPass)?;
        let horizontal = target(cache, TargetSlot::HorizontalPass)?;
        let brightness = target(cache, TargetSlot::Brightness)?;

        let [vertical_pass, horizontal_pass] = self.kernel_passes(params);
        trace!(sigma = vertical_pass.sigma, steps = vertical_pass.steps, "vertical pass");
        device.kernel_pass(capture, vertical, &vertical_pass);
        trace!(opacity = horizontal_pass.opacity, "horizontal pass");
        device.kernel_pass(vertical, horizontal, &horizontal_pass);
        trace!(brightness = params.brightness, "brightness pass");
        device.brightness_pass(horizontal, brightness, params.brightness);
        Ok(())
    }

    /// Draws the finished blur into the frame.
    pub fn present<D: RenderDevice>(
        &self,
        device: &mut D,
        cache: &RenderTargetCache<D::Target>,
        destination: Destination,
    ) -> BlurResult<()> {
        let result = target(cache, TargetSlot::Brightness)?;
        device.present(result, destination);
        Ok(())
    }
}

fn target<T: RenderTarget>(cache: &RenderTargetCache<T>, slot: TargetSlot) -> BlurResult<&T> {
    cache.get(slot).ok_or(BlurError::MissingTarget(slot))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        px::Px,
        testing::{Op, RecordingDevice},
    };

    fn params() -> BlurParams {
        BlurParams {
            sigma: 10,
            factor: 2,
            opacity: 0.5,
            brightness: 0.8,
        }
    }

    #[test]
    fn only_horizontal_pass_carries_opacity() {
        let pipeline = BlurPipeline::new(&BlurConfig::default());
        let [vertical, horizontal] = pipeline.kernel_passes(&params());
        assert_eq!(vertical.axis, Axis::Vertical);
        assert_eq!(vertical.opacity, 1.0);
        assert_eq!(vertical.steps, 15);
        assert_eq!(horizontal.axis, Axis::Horizontal);
        assert_eq!(horizontal.opacity, 0.5);
    }

    #[test]
    fn backdrop_slot_is_full_resolution() {
        let mut device = RecordingDevice::new(PxSize::from_u32(1920, 1080));
        let mut cache = RenderTargetCache::new();
        let pipeline = BlurPipeline::new(&BlurConfig::default());

        let ensured = pipeline
            .ensure_targets(&mut device, &mut cache, PxSize::from_u32(1024, 768), 2, true)
            .expect("targets");
        assert_eq!(ensured.len(), 5);
        assert!(ensured.iter().all(|(_, e)| *e == Ensured::Allocated));

        let backdrop = cache.get(TargetSlot::Backdrop).expect("backdrop");
        assert_eq!(backdrop.size(), PxSize::from_u32(1024, 768));
        let capture = cache.get(TargetSlot::Capture).expect("capture");
        assert_eq!(capture.size(), PxSize::from_u32(512, 384));

        let actor_only = pipeline
            .ensure_targets(&mut device, &mut cache, PxSize::from_u32(1024, 768), 2, false)
            .expect("targets");
        assert_eq!(actor_only.len(), 4);
        assert!(actor_only.iter().all(|(_, e)| *e == Ensured::Reused));
    }

    #[test]
    fn passes_run_in_order() {
        let mut device = RecordingDevice::new(PxSize::from_u32(1920, 1080));
        let mut cache = RenderTargetCache::new();
        let pipeline = BlurPipeline::new(&BlurConfig::default());
        let region = PxRect::new(Px(10), Px(10), Px(300), Px(300));

        pipeline
            .ensure_targets(&mut device, &mut cache, region.size(), 1, true)
            .expect("targets");
        device.take_ops();

        pipeline
            .capture_backdrop(&mut device, &cache, region)
            .expect("capture");
        pipeline
            .blur(&mut device, &cache, &BlurParams { factor: 1, ..params() })
            .expect("blur");
        pipeline
            .present(&mut device, &cache, Destination::Screen(region))
            .expect("present");

        let kinds: Vec<&str> = device.ops().iter().map(Op::kind).collect();
        assert_eq!(
            kinds,
            [
                "copy_backdrop",
                "resample",
                "kernel_pass",
                "kernel_pass",
                "brightness_pass",
                "present"
            ]
        );
    }

    #[test]
    fn missing_target_is_an_error() {
        let mut device = RecordingDevice::new(PxSize::from_u32(64, 64));
        let cache = RenderTargetCache::new();
        let pipeline = BlurPipeline::new(&BlurConfig::default());

        let result = pipeline.blur(&mut device, &cache, &params());
        assert_eq!(result, Err(BlurError::MissingTarget(TargetSlot::Capture)));
        assert!(device.ops().is_empty());
    }
}
