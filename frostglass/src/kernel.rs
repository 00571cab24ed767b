//! Gaussian kernel parameters and the CPU mirror of the kernel program.
//!
//! The GPU program never evaluates `exp` per sample. It seeds the centre
//! weight `g0 = 1 / (sqrt(2π)·σ)` and walks outward with the incremental
//! recurrence
//!
//! ```text
//! g[i + 1] = g[i] · r[i]
//! r[i + 1] = r[i] · exp(-1 / σ²),   r[0] = exp(-1 / (2σ²))
//! ```
//!
//! which reproduces `g0 · exp(-i² / (2σ²))` with two multiplies per tap.
//! Adjacent taps `i` and `i + 1` are merged into a single bilinear fetch
//! placed at `i + g[i+1] / (g[i] + g[i+1])`, so a kernel of `n` steps costs
//! `1 + 2·ceil(n / 2)` fetches instead of `1 + 2n`. Weights are normalized
//! by their running sum so truncating the tail keeps unit gain.
//!
//! [`GaussianKernel::taps`] performs exactly the arithmetic of the shader and
//! exists so the weights can be inspected and tested without a GPU.

use std::f32::consts::PI;

use smallvec::SmallVec;

/// Upper bound on kernel steps per side. The kernel program applies the
/// same bound, so a pass never loops longer than this.
pub const MAX_KERNEL_STEPS: u32 = 768;

/// Sampling direction of one separable pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Sample along X.
    Horizontal,
    /// Sample along Y.
    Vertical,
}

impl Axis {
    /// Unit step in texture space, `(1, 0)` or `(0, 1)`.
    pub fn direction(self) -> [f32; 2] {
        match self {
            Axis::Horizontal => [1.0, 0.0],
            Axis::Vertical => [0.0, 1.0],
        }
    }
}

/// Parameters of one separable blur draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KernelPass {
    /// Sampling direction.
    pub axis: Axis,
    /// Sigma in working-resolution pixels.
    pub sigma: f32,
    /// Number of kernel steps on each side of the centre.
    pub steps: u32,
    /// Multiplier applied to the pass output. Only the final pass carries the
    /// node's paint opacity; earlier passes use `1.0`.
    pub opacity: f32,
}

impl KernelPass {
    /// Builds a pass for a blur of `sigma` full-resolution pixels running at a
    /// working resolution divided by `factor`.
    ///
    /// ```
    /// use frostglass::kernel::{Axis, KernelPass};
    ///
    /// let pass = KernelPass::new(Axis::Vertical, 10, 2, 3.0);
    /// assert_eq!(pass.sigma, 5.0);
    /// assert_eq!(pass.steps, 15);
    /// ```
    pub fn new(axis: Axis, sigma: u32, factor: u32, extent: f32) -> Self {
        let sigma = sigma as f32 / factor.max(1) as f32;
        Self {
            axis,
            sigma,
            steps: steps_for_sigma(sigma, extent),
            opacity: 1.0,
        }
    }

    /// Returns the pass with `opacity` folded into its output.
    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity.clamp(0.0, 1.0);
        self
    }

    /// The kernel this pass evaluates.
    pub fn kernel(&self) -> GaussianKernel {
        GaussianKernel::new(self.sigma, self.steps)
    }
}

/// `ceil(extent · sigma)` kernel steps, zero for a degenerate sigma and at
/// most [`MAX_KERNEL_STEPS`].
pub fn steps_for_sigma(sigma: f32, extent: f32) -> u32 {
    if !(sigma > 0.0) || !(extent > 0.0) {
        return 0;
    }
    ((extent * sigma).ceil() as u32).min(MAX_KERNEL_STEPS)
}

/// One bilinear fetch of the kernel.
///
/// A tap with a non-zero offset is applied symmetrically at `+offset` and
/// `-offset`, each with `weight`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KernelTap {
    /// Distance from the centre in texels, fractional between the two merged
    /// integer taps.
    pub offset: f32,
    /// Normalized weight of a single fetch at this offset.
    pub weight: f32,
}

/// A truncated, normalized Gaussian kernel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussianKernel {
    sigma: f32,
    steps: u32,
}

impl GaussianKernel {
    /// Creates a kernel of `steps` steps per side.
    pub fn new(sigma: f32, steps: u32) -> Self {
        Self { sigma, steps }
    }

    /// Steps per side.
    pub fn steps(&self) -> u32 {
        self.steps
    }

    /// Texture fetches per output fragment.
    pub fn fetch_count(&self) -> u32 {
        1 + 2 * self.steps.div_ceil(2)
    }

    /// Computes the centre tap followed by the merged symmetric taps, in the
    /// same order and with the same recurrence as the GPU program.
    pub fn taps(&self) -> SmallVec<[KernelTap; 16]> {
        let mut taps = SmallVec::new();
        if !(self.sigma > 0.0) || self.steps == 0 {
            taps.push(KernelTap {
                offset: 0.0,
                weight: 1.0,
            });
            return taps;
        }

        let sigma_sq = self.sigma * self.sigma;
        let mut weight = 1.0 / ((2.0 * PI).sqrt() * self.sigma);
        let mut ratio = (-0.5 / sigma_sq).exp();
        let ratio_step = (-1.0 / sigma_sq).exp();

        let mut total = weight;
        taps.push(KernelTap {
            offset: 0.0,
            weight,
        });
        weight *= ratio;
        ratio *= ratio_step;

        let mut step = 1;
        while step <= self.steps {
            let near = weight;
            weight *= ratio;
            ratio *= ratio_step;
            let far = weight;
            weight *= ratio;
            ratio *= ratio_step;

            let subtotal = near + far;
            let offset = if subtotal > 0.0 {
                step as f32 + far / subtotal
            } else {
                step as f32
            };
            taps.push(KernelTap {
                offset,
                weight: subtotal,
            });
            total += 2.0 * subtotal;
            step += 2;
        }

        for tap in &mut taps {
            tap.weight /= total;
        }
        taps
    }

    /// Sum of all applied weights, counting symmetric taps twice.
    pub fn total_weight(&self) -> f32 {
        self.taps()
            .iter()
            .map(|tap| {
                if tap.offset == 0.0 {
                    tap.weight
                } else {
                    2.0 * tap.weight
                }
            })
            .sum()
    }
}
