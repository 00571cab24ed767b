//! Working-resolution selection.
//!
//! A separable Gaussian pass costs `O(sigma)` samples per pixel. Blurring at
//! half resolution with half the sigma and upscaling bilinearly looks the
//! same while costing a fraction of the fetches, so large blurs keep halving
//! their working resolution until sigma is small again or the surface gets
//! too coarse to upscale cleanly.

use crate::config::BlurConfig;

/// Chooses the downscale factor for a blur of `sigma` over a
/// `width` x `height` surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DownscaleAdvisor {
    max_sigma: f32,
    min_size: f32,
}

impl Default for DownscaleAdvisor {
    fn default() -> Self {
        Self::from_config(&BlurConfig::default())
    }
}

impl DownscaleAdvisor {
    /// Creates an advisor using the thresholds of `config`.
    pub fn from_config(config: &BlurConfig) -> Self {
        Self {
            max_sigma: config.max_sigma,
            min_size: config.min_downscale_size,
        }
    }

    /// Returns the power-of-two factor by which both dimensions are divided.
    ///
    /// ```
    /// use frostglass::downscale::DownscaleAdvisor;
    ///
    /// let advisor = DownscaleAdvisor::default();
    /// assert_eq!(advisor.factor(10, 1024, 768), 2);
    /// assert_eq!(advisor.factor(10, 200, 150), 1);
    /// ```
    pub fn factor(&self, sigma: u32, width: u32, height: u32) -> u32 {
        let sigma = sigma as f32;
        let width = width as f32;
        let height = height as f32;

        let mut factor: u32 = 1;
        loop {
            let f = factor as f32;
            let keep_going = sigma / f > self.max_sigma
                && width / f > self.min_size
                && height / f > self.min_size;
            if !keep_going {
                break;
            }
            match factor.checked_mul(2) {
                Some(next) => factor = next,
                None => break,
            }
        }
        factor
    }
}

/// Shorthand for [`DownscaleAdvisor::factor`] with the default thresholds.
pub fn downscale_factor(sigma: u32, width: u32, height: u32) -> u32 {
    DownscaleAdvisor::default().factor(sigma, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn halves_until_sigma_fits() {
        assert_eq!(downscale_factor(10, 1024, 768), 2);
        assert_eq!(downscale_factor(6, 4096, 4096), 1);
        assert_eq!(downscale_factor(7, 4096, 4096), 2);
        // 50 / 8 = 6.25 is still above the threshold.
        assert_eq!(downscale_factor(50, 4096, 4096), 16);
        assert_eq!(downscale_factor(48, 4096, 4096), 8);
    }

    #[test]
    fn size_floor_stops_downscaling() {
        assert_eq!(downscale_factor(10, 200, 150), 1);
        // 512 / 2 = 256 is no longer above the floor.
        assert_eq!(downscale_factor(100, 512, 4096), 2);
        assert_eq!(downscale_factor(100, 4096, 257), 2);
        assert_eq!(downscale_factor(100, 4096, 256), 1);
    }

    #[test]
    fn zero_sigma_never_downscales() {
        assert_eq!(downscale_factor(0, 8192, 8192), 1);
    }

    #[test]
    fn factor_is_power_of_two_and_terminates_correctly() {
        let advisor = DownscaleAdvisor::default();
        for sigma in [0u32, 1, 5, 6, 7, 12, 13, 25, 64, 200, 1000] {
            for (width, height) in [(1, 1), (255, 4000), (300, 300), (1920, 1080), (7680, 4320)]
            {
                let factor = advisor.factor(sigma, width, height);
                assert!(factor >= 1 && factor.is_power_of_two());
                let f = factor as f32;
                let min_side = width.min(height) as f32;
                assert!(
                    sigma as f32 / f <= 6.0 || min_side / f <= 256.0,
                    "sigma={sigma} size={width}x{height} factor={factor}"
                );
            }
        }
    }

    #[test]
    fn custom_thresholds() {
        let advisor = DownscaleAdvisor::from_config(&BlurConfig {
            max_sigma: 2.0,
            min_downscale_size: 64.0,
            ..BlurConfig::default()
        });
        assert_eq!(advisor.factor(10, 1024, 1024), 8);
    }
}
