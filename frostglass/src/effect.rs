//! The blur effect attached to one scene-graph node.
//!
//! [`BlurEffect::paint`] is called in place of the node's own paint once per
//! frame. Depending on the cache state it captures the source, reruns the
//! blur passes or only presents the cached result. Every failure degrades to
//! an unblurred paint and the next frame starts over.

use tracing::{debug, warn};

use crate::{
    config::{BlurConfig, BlurMode, BlurSpec, SIGMA_LIMIT, sanitize_brightness},
    device::{Destination, RenderDevice, RenderTarget},
    downscale::DownscaleAdvisor,
    error::{BlurError, BlurResult, CaptureError, ConfigError},
    host::{BlurHost, CaptureRequest, HostNode},
    pipeline::{BlurParams, BlurPipeline},
    px::{PxPosition, PxRect, PxSize},
    state::{CacheState, EffectStateMachine, PaintWork},
    target::{RenderTargetCache, TargetSlot},
};

/// What a call to [`BlurEffect::paint`] did.
#[derive(Debug, Clone, PartialEq)]
pub enum PaintOutcome {
    /// Sigma is zero; the node painted itself without any blur work.
    Passthrough,
    /// The cached blur was presented without running any pass.
    Cached,
    /// The blur passes ran. `captured` is `true` when the source was
    /// captured again this frame.
    Blurred {
        /// Whether the capture stage ran.
        captured: bool,
    },
    /// Blurring failed and the node painted itself unblurred.
    Fallback(BlurError),
}

/// How this frame obtains the content to blur.
#[derive(Debug, Clone, Copy, PartialEq)]
enum CapturePlan {
    /// Paint the node into the capture target.
    Actor { size: PxSize },
    /// Copy `region` of the frame behind the node.
    Background { region: PxRect },
}

impl CapturePlan {
    fn source_size(&self) -> PxSize {
        match self {
            CapturePlan::Actor { size } => *size,
            CapturePlan::Background { region } => region.size(),
        }
    }

    fn destination(&self) -> Destination {
        match self {
            CapturePlan::Actor { size } => {
                Destination::Node(PxRect::from_position_size(PxPosition::ZERO, *size))
            }
            CapturePlan::Background { region } => Destination::Screen(*region),
        }
    }
}

/// A Gaussian blur with brightness applied to a node's content or to the
/// content behind it.
///
/// The effect owns its render targets; dropping it frees them.
#[derive(Debug)]
pub struct BlurEffect<T, H> {
    host: H,
    spec: BlurSpec,
    advisor: DownscaleAdvisor,
    pipeline: BlurPipeline,
    state: EffectStateMachine,
    cache: RenderTargetCache<T>,
    blurred_opacity: Option<u8>,
}

impl<T: RenderTarget, H: HostNode> BlurEffect<T, H> {
    /// Creates an actor-mode effect with sigma zero and the default
    /// configuration.
    pub fn new(host: H) -> Self {
        Self::build(host, &BlurConfig::default())
    }

    /// Creates an effect with custom thresholds.
    pub fn with_config(host: H, config: BlurConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(host, &config))
    }

    fn build(host: H, config: &BlurConfig) -> Self {
        Self {
            host,
            spec: BlurSpec::default(),
            advisor: DownscaleAdvisor::from_config(config),
            pipeline: BlurPipeline::new(config),
            state: EffectStateMachine::new(),
            cache: RenderTargetCache::new(),
            blurred_opacity: None,
        }
    }

    /// The host node.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Mutable access to the host node. Changes to its content or geometry
    /// must be followed by [`Self::invalidate`] or a dirty paint.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Current parameters.
    pub fn spec(&self) -> &BlurSpec {
        &self.spec
    }

    /// Current cache state.
    pub fn cache_state(&self) -> CacheState {
        self.state.state()
    }

    /// The render targets held by this instance.
    pub fn targets(&self) -> &RenderTargetCache<T> {
        &self.cache
    }

    /// Current mode.
    pub fn mode(&self) -> BlurMode {
        self.spec.mode
    }

    /// Switches between actor and background blur. Leaving background mode
    /// frees the backdrop target.
    pub fn set_mode(&mut self, mode: BlurMode) {
        if self.spec.mode == mode {
            return;
        }
        if self.spec.mode == BlurMode::Background {
            self.cache.release(TargetSlot::Backdrop);
        }
        debug!(from = ?self.spec.mode, to = ?mode, "blur mode changed");
        self.spec.mode = mode;
        self.state.invalidate_all();
        self.host.queue_redraw();
    }

    /// Current sigma in pixels.
    pub fn sigma(&self) -> u32 {
        self.spec.sigma
    }

    /// Sets the Gaussian standard deviation. Zero disables the blur; values
    /// above [`SIGMA_LIMIT`] are clamped to it.
    pub fn set_sigma(&mut self, sigma: u32) {
        let sigma = sigma.min(SIGMA_LIMIT);
        if self.spec.sigma == sigma {
            return;
        }
        self.spec.sigma = sigma;
        self.state.invalidate_all();
        self.host.queue_redraw();
    }

    /// Current brightness.
    pub fn brightness(&self) -> f32 {
        self.spec.brightness
    }

    /// Sets the brightness multiplier. Finite values are clamped to
    /// `[0, 1]`; non-finite values are rejected and leave the effect
    /// unchanged.
    pub fn set_brightness(&mut self, brightness: f32) -> Result<(), ConfigError> {
        let brightness = sanitize_brightness(brightness)?;
        if self.spec.brightness != brightness {
            self.spec.brightness = brightness;
            self.state.invalidate_blur();
            self.host.queue_redraw();
        }
        Ok(())
    }

    /// Applies mode, sigma and brightness together. Brightness is checked
    /// first, so a rejected value leaves every parameter unchanged.
    pub fn set_spec(&mut self, spec: BlurSpec) -> BlurResult<()> {
        let brightness = sanitize_brightness(spec.brightness)?;
        self.set_mode(spec.mode);
        self.set_sigma(spec.sigma);
        self.set_brightness(brightness)?;
        Ok(())
    }

    /// Marks the node's content or geometry as changed.
    pub fn invalidate(&mut self) {
        self.state.invalidate_all();
        self.host.queue_redraw();
    }

    /// Paints the node for this frame. `dirty` reports that the node's
    /// content changed since the previous paint.
    pub fn paint<D>(&mut self, device: &mut D, dirty: bool) -> PaintOutcome
    where
        D: RenderDevice<Target = T>,
        H: BlurHost<D>,
    {
        if self.spec.is_passthrough() {
            self.host.continue_default_paint(device);
            return PaintOutcome::Passthrough;
        }
        if dirty {
            self.state.invalidate_all();
        }

        let opacity = self.host.paint_opacity();
        if self.blurred_opacity != Some(opacity) {
            self.state.invalidate_blur();
        }

        match self.blur_frame(device, opacity) {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(error = %err, mode = ?self.spec.mode, "blur failed, painting unblurred");
                self.state.reset();
                self.blurred_opacity = None;
                self.host.continue_default_paint(device);
                PaintOutcome::Fallback(err)
            }
        }
    }

    fn capture_plan(&self, frame: PxSize) -> BlurResult<CapturePlan> {
        match self.spec.mode {
            BlurMode::Actor => Ok(CapturePlan::Actor {
                size: self.host.logical_size(),
            }),
            BlurMode::Background => {
                let on_screen = PxRect::enclosing(
                    self.host.transformed_position(),
                    self.host.transformed_size(),
                );
                let frame_rect = PxRect::from_position_size(PxPosition::ZERO, frame);
                let region = frame_rect.intersection(&on_screen).ok_or(
                    CaptureError::OutOfFrame {
                        region: on_screen.size(),
                        frame,
                    },
                )?;
                Ok(CapturePlan::Background { region })
            }
        }
    }

    fn blur_frame<D>(&mut self, device: &mut D, opacity: u8) -> BlurResult<PaintOutcome>
    where
        D: RenderDevice<Target = T>,
        H: BlurHost<D>,
    {
        let plan = self.capture_plan(device.frame_size())?;
        if let CapturePlan::Background { .. } = plan {
            self.state.invalidate_all();
        }

        let source = plan.source_size();
        let factor = self.advisor.factor(
            self.spec.sigma,
            source.width.positive(),
            source.height.positive(),
        );

        let ensured = self.pipeline.ensure_targets(
            device,
            &mut self.cache,
            source,
            factor,
            matches!(plan, CapturePlan::Background { .. }),
        )?;
        for (slot, outcome) in ensured {
            self.state.target_ensured(slot, outcome);
        }

        let work = self.state.required_work();
        let captured = work == PaintWork::CaptureAndBlur;
        if captured {
            self.capture(device, &plan, factor)?;
            self.state.mark_captured();
        }
        if work != PaintWork::Present {
            let params = BlurParams {
                sigma: self.spec.sigma,
                factor,
                opacity: f32::from(opacity) / 255.0,
                brightness: self.spec.brightness,
            };
            self.pipeline.blur(device, &self.cache, &params)?;
            self.state.mark_blurred();
            self.blurred_opacity = Some(opacity);
        }

        self.pipeline
            .present(device, &self.cache, plan.destination())?;
        if let CapturePlan::Background { .. } = plan {
            self.host.continue_default_paint(device);
        }

        Ok(match work {
            PaintWork::Present => PaintOutcome::Cached,
            _ => PaintOutcome::Blurred { captured },
        })
    }

    fn capture<D>(&mut self, device: &mut D, plan: &CapturePlan, factor: u32) -> BlurResult<()>
    where
        D: RenderDevice<Target = T>,
        H: BlurHost<D>,
    {
        match plan {
            CapturePlan::Actor { .. } => {
                let target = self
                    .cache
                    .get(TargetSlot::Capture)
                    .ok_or(BlurError::MissingTarget(TargetSlot::Capture))?;
                device.clear(target);
                self.host
                    .paint_into(device, target, CaptureRequest::at_factor(factor));
                Ok(())
            }
            CapturePlan::Background { region } => {
                self.pipeline.capture_backdrop(device, &self.cache, *region)
            }
        }
    }
}
