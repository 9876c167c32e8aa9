//! Thresholds and constants of the edit operations.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Tunable constants for every operation.
///
/// Area thresholds are strict: a component is kept only when its pixel
/// count is greater than the threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// `blobs_from_mask` keeps components larger than this fraction of the
    /// reference area.
    pub mask_area_fraction: f64,
    pub cut_area_threshold: usize,
    pub refine_area_threshold: usize,
    pub crack_area_threshold: usize,
    pub import_area_threshold: usize,

    /// Half-width of the square marker painted around each split seed.
    pub split_marker_half_width: i32,
    /// Weight of the gradient term in the split elevation
    /// `(-distance + weight * gradient) / 2`.
    pub split_gradient_weight: f32,

    /// Smoothing applied to the crack field before flooding.
    pub crack_sigma: f32,
    /// Smoothing applied to the image patch before border refinement.
    pub refine_sigma: f32,
    /// Gaussian kernels are cut at this many standard deviations.
    pub gaussian_truncate: f32,

    pub refine_bias_strength: f32,
    pub refine_conservative: f32,
    pub refine_radius: i32,

    /// Margin around contour and stroke points of the edit-border working
    /// raster.
    pub edit_border_margin: i32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mask_area_fraction: 0.2,
            cut_area_threshold: 30,
            refine_area_threshold: 30,
            crack_area_threshold: 1000,
            import_area_threshold: 1000,
            split_marker_half_width: 39,
            split_gradient_weight: 100.0,
            crack_sigma: 2.0,
            refine_sigma: 1.5,
            gaussian_truncate: 4.0,
            refine_bias_strength: 0.0,
            refine_conservative: 0.07,
            refine_radius: 30,
            edit_border_margin: 4,
        }
    }
}

impl Config {
    /// Loads a YAML or JSON file (picked by extension); missing fields keep
    /// their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let config: Config = common::file_format::load_file(path)?;
        config.check().map_err(Error::Config)?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Validate configuration parameters.
    ///
    /// # Panics
    /// On any out-of-range value.
    pub fn validate(&self) {
        if let Err(reason) = self.check() {
            panic!("{reason}");
        }
    }

    fn check(&self) -> std::result::Result<(), String> {
        if !(self.mask_area_fraction >= 0.0 && self.mask_area_fraction.is_finite()) {
            return Err(format!(
                "mask_area_fraction must be non-negative, got {}",
                self.mask_area_fraction
            ));
        }
        if self.split_marker_half_width < 0 {
            return Err(format!(
                "split_marker_half_width must be non-negative, got {}",
                self.split_marker_half_width
            ));
        }
        let sigmas = [
            ("crack_sigma", self.crack_sigma),
            ("refine_sigma", self.refine_sigma),
        ];
        for (name, sigma) in sigmas {
            if !(sigma > 0.0) {
                return Err(format!("{name} must be positive, got {sigma}"));
            }
        }
        if !(self.gaussian_truncate > 0.0) {
            return Err(format!(
                "gaussian_truncate must be positive, got {}",
                self.gaussian_truncate
            ));
        }
        if !(0.0..=1.0).contains(&self.refine_conservative) {
            return Err(format!(
                "refine_conservative must be in [0, 1], got {}",
                self.refine_conservative
            ));
        }
        if self.refine_radius <= 0 {
            return Err(format!("refine_radius must be positive, got {}", self.refine_radius));
        }
        if self.edit_border_margin < 0 {
            return Err(format!(
                "edit_border_margin must be non-negative, got {}",
                self.edit_border_margin
            ));
        }
        Ok(())
    }
}
