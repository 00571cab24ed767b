//! Error types for the blur effect.
//!
//! None of these ever reach the host as a panic: a failed frame degrades to
//! painting the node without blur, see [`crate::effect::PaintOutcome`].

use thiserror::Error;

use crate::{px::PxSize, target::TargetSlot};

/// Failure to create the texture and framebuffer backing a render target.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AllocationError {
    /// The requested extent has a zero dimension.
    #[error("cannot allocate an empty {width}x{height} render target")]
    EmptyExtent {
        /// Requested width in pixels.
        width: u32,
        /// Requested height in pixels.
        height: u32,
    },
    /// The requested extent exceeds what the device supports.
    #[error("render target {width}x{height} exceeds the device limit of {limit}")]
    ExceedsLimit {
        /// Requested width in pixels.
        width: u32,
        /// Requested height in pixels.
        height: u32,
        /// Largest supported 2D texture dimension.
        limit: u32,
    },
    /// The driver refused the allocation.
    #[error("device failed to allocate render target: {0}")]
    Device(String),
}

/// Failure to copy the content behind a node out of the frame.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CaptureError {
    /// The source rectangle does not fit inside the frame being rendered.
    #[error("backdrop region {region:?} lies outside the {frame:?} frame")]
    OutOfFrame {
        /// Requested region size.
        region: PxSize,
        /// Size of the frame being rendered.
        frame: PxSize,
    },
    /// The device could not read from the frame.
    #[error("backdrop copy failed: {0}")]
    Device(String),
}

/// Rejected configuration values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Brightness must be a finite number.
    #[error("brightness must be finite, got {0}")]
    NonFiniteBrightness(f32),
    /// A tunable of [`crate::config::BlurConfig`] is out of range.
    #[error("invalid blur config: {field} = {value}")]
    OutOfRange {
        /// Name of the offending field.
        field: &'static str,
        /// The rejected value.
        value: f32,
    },
}

/// Umbrella error for one frame of blur work.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BlurError {
    /// A render target for `slot` could not be (re)allocated.
    #[error("failed to allocate the {slot} target")]
    Allocation {
        /// The cache slot that failed.
        slot: TargetSlot,
        /// The underlying allocation failure.
        #[source]
        source: AllocationError,
    },
    /// A pass ran before its target was allocated.
    #[error("the {0} target is not allocated")]
    MissingTarget(TargetSlot),
    /// The backdrop could not be captured.
    #[error("failed to capture the backdrop")]
    BackdropCapture(#[from] CaptureError),
    /// A configuration value was rejected.
    #[error(transparent)]
    InvalidConfiguration(#[from] ConfigError),
}

/// Result alias used across the crate.
pub type BlurResult<T> = Result<T, BlurError>;
