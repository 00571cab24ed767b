//! Effect configuration.
//!
//! [`BlurSpec`] is the per-instance state the host mutates through the
//! effect's setters. [`BlurConfig`] holds the tunables of the
//! dynamic-resolution algorithm and is fixed for the lifetime of an effect.

use crate::error::ConfigError;

/// Largest per-pass sigma (in working-resolution pixels) before the effect
/// halves its working resolution.
pub const DEFAULT_MAX_SIGMA: f32 = 6.0;
/// Downscaling stops once either working dimension would drop to this size.
pub const DEFAULT_MIN_DOWNSCALE_SIZE: f32 = 256.0;
/// Kernel half-width in units of sigma.
pub const DEFAULT_KERNEL_EXTENT: f32 = 3.0;
/// Largest sigma, in pixels, the effect accepts. Larger values are clamped.
pub const SIGMA_LIMIT: u32 = 256;

/// What the effect blurs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BlurMode {
    /// Blur the node's own rendered content.
    #[default]
    Actor,
    /// Blur whatever is rendered behind the node.
    Background,
}

/// Mutable blur parameters of one effect instance.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlurSpec {
    /// Actor or background blur.
    pub mode: BlurMode,
    /// Gaussian standard deviation in pixels, at most [`SIGMA_LIMIT`]. The
    /// user-facing blur radius is `2 * sigma`. Zero disables the blur.
    pub sigma: u32,
    /// RGB multiplier applied after blurring, in `[0, 1]`.
    pub brightness: f32,
}

impl Default for BlurSpec {
    fn default() -> Self {
        Self {
            mode: BlurMode::Actor,
            sigma: 0,
            brightness: 1.0,
        }
    }
}

impl BlurSpec {
    /// Creates parameters with full brightness. `sigma` is clamped to
    /// [`SIGMA_LIMIT`].
    pub fn new(mode: BlurMode, sigma: u32) -> Self {
        Self {
            mode,
            sigma: sigma.min(SIGMA_LIMIT),
            brightness: 1.0,
        }
    }

    /// Returns `true` when painting should bypass the blur entirely.
    pub fn is_passthrough(&self) -> bool {
        self.sigma == 0
    }
}

/// Brings a brightness value into `[0, 1]`.
///
/// Finite values outside the range are clamped; NaN and infinities are
/// rejected.
///
/// ```
/// use frostglass::config::sanitize_brightness;
///
/// assert_eq!(sanitize_brightness(0.5), Ok(0.5));
/// assert_eq!(sanitize_brightness(1.7), Ok(1.0));
/// assert!(sanitize_brightness(f32::NAN).is_err());
/// ```
pub fn sanitize_brightness(value: f32) -> Result<f32, ConfigError> {
    if !value.is_finite() {
        return Err(ConfigError::NonFiniteBrightness(value));
    }
    Ok(value.clamp(0.0, 1.0))
}

/// Tunables of the dynamic-resolution blur.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BlurConfig {
    /// See [`DEFAULT_MAX_SIGMA`].
    pub max_sigma: f32,
    /// See [`DEFAULT_MIN_DOWNSCALE_SIZE`].
    pub min_downscale_size: f32,
    /// See [`DEFAULT_KERNEL_EXTENT`].
    pub kernel_extent: f32,
}

impl Default for BlurConfig {
    fn default() -> Self {
        Self {
            max_sigma: DEFAULT_MAX_SIGMA,
            min_downscale_size: DEFAULT_MIN_DOWNSCALE_SIZE,
            kernel_extent: DEFAULT_KERNEL_EXTENT,
        }
    }
}

impl BlurConfig {
    /// Checks that every tunable is finite and strictly positive.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("max_sigma", self.max_sigma),
            ("min_downscale_size", self.min_downscale_size),
            ("kernel_extent", self.kernel_extent),
        ];
        for (field, value) in fields {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::OutOfRange { field, value });
            }
        }
        Ok(())
    }
}
