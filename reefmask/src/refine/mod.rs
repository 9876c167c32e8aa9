//! Border refinement oracle.
//!
//! Refinement is an external optimization that moves a mask boundary toward
//! image edges. The engine only depends on the [`BorderRefiner`] contract;
//! [`UnavailableRefiner`] stands in where no implementation is installed,
//! and `NativeRefiner` (cargo feature `coraline`) binds the native library.

#[cfg(feature = "coraline")]
mod native;

#[cfg(feature = "coraline")]
pub use native::NativeRefiner;

use crate::raster::{Mask, RgbRaster};

#[derive(Debug, thiserror::Error)]
pub enum RefineError {
    #[error("No border refinement implementation is available")]
    Unavailable,
    #[error("Image is {image:?} but mask is {mask:?}")]
    SizeMismatch {
        image: (usize, usize),
        mask: (usize, usize),
    },
    #[error("Refinement failed: {0}")]
    Failed(String),
}

/// Rewrites `mask` in place so its boundary follows `image`.
///
/// `image` and `mask` have equal dimensions. `bias_strength` pulls the
/// result toward the input mask, `conservative` limits how far the border
/// may move, `grow` expands (positive) or shrinks (negative) the region, and
/// `radius` bounds the search band in pixels.
pub trait BorderRefiner {
    fn refine(
        &self,
        image: &RgbRaster,
        mask: &mut Mask,
        bias_strength: f32,
        conservative: f32,
        grow: f32,
        radius: f32,
    ) -> Result<(), RefineError>;
}

/// Refiner used when no native implementation is present; always fails
/// with [`RefineError::Unavailable`].
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableRefiner;

impl BorderRefiner for UnavailableRefiner {
    fn refine(
        &self,
        _image: &RgbRaster,
        _mask: &mut Mask,
        _bias_strength: f32,
        _conservative: f32,
        _grow: f32,
        _radius: f32,
    ) -> Result<(), RefineError> {
        Err(RefineError::Unavailable)
    }
}

