//! frostglass is a dynamic-resolution separable Gaussian blur for
//! retained-mode compositors.
//!
//! A [`BlurEffect`] is attached to one scene-graph node. Each frame the host
//! calls [`BlurEffect::paint`] instead of painting the node itself, and the
//! effect either blurs the node's own content ([`BlurMode::Actor`]) or
//! whatever was rendered behind it ([`BlurMode::Background`]).
//!
//! # Cost
//!
//! A direct Gaussian costs `O(sigma)` fetches per pixel and axis. frostglass
//! keeps this bounded in two ways:
//!
//! - large blurs run at a reduced working resolution chosen by
//!   [`DownscaleAdvisor`], then are upscaled bilinearly when presented;
//! - each fetch of the kernel program samples between two texels, so the
//!   hardware filter evaluates two Gaussian taps at once.
//!
//! Actor-mode results are cached across frames. Only a content change, a
//! new sigma or a new mode force a recapture; brightness and opacity changes
//! rerun the blur passes on the existing capture.
//!
//! # Backends
//!
//! The effect talks to the GPU through the [`RenderDevice`] trait. The
//! `frostglass-wgpu` crate provides a wgpu implementation; the `testing`
//! feature provides a recording implementation for unit tests.
//!
//! ```
//! # #[cfg(feature = "testing")] {
//! use frostglass::{
//!     BlurEffect, BlurMode, PaintOutcome, PxSize,
//!     testing::{RecordingDevice, RecordingHost},
//! };
//!
//! let mut device = RecordingDevice::new(PxSize::from_u32(1920, 1080));
//! let mut effect = BlurEffect::new(RecordingHost::new(PxSize::from_u32(640, 480)));
//! effect.set_mode(BlurMode::Actor);
//! effect.set_sigma(12);
//!
//! assert_eq!(effect.paint(&mut device, false), PaintOutcome::Blurred { captured: true });
//! assert_eq!(effect.paint(&mut device, false), PaintOutcome::Cached);
//! # }
//! ```

#![deny(missing_docs, clippy::unwrap_used)]

pub mod config;
pub mod device;
pub mod downscale;
pub mod effect;
pub mod error;
pub mod host;
pub mod kernel;
pub mod pipeline;
pub mod px;
pub mod state;
pub mod target;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use crate::{
    config::{BlurConfig, BlurMode, BlurSpec, SIGMA_LIMIT},
    device::{Destination, RenderDevice, RenderTarget},
    downscale::{DownscaleAdvisor, downscale_factor},
    effect::{BlurEffect, PaintOutcome},
    error::{AllocationError, BlurError, BlurResult, CaptureError, ConfigError},
    host::{BlurHost, CaptureRequest, HostNode},
    kernel::{Axis, GaussianKernel, KernelPass, KernelTap, MAX_KERNEL_STEPS},
    pipeline::{BlurParams, BlurPipeline},
    px::{Px, PxPosition, PxRect, PxSize},
    state::{CacheState, EffectStateMachine, PaintWork},
    target::{Ensured, RenderTargetCache, TargetSlot},
};
