use std::os::raw::c_int;

use super::{BorderRefiner, RefineError};
use crate::raster::{Mask, RgbRaster};

#[link(name = "coraline")]
extern "C" {
    fn Coraline_segment(
        img: *mut u8,
        mask: *mut u8,
        w: c_int,
        h: c_int,
        lambda: f32,
        conservative: f32,
        grow: f32,
        radius: f32,
    );
}

/// Binding to `libcoraline`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeRefiner;

impl BorderRefiner for NativeRefiner {
    fn refine(
        &self,
        image: &RgbRaster,
        mask: &mut Mask,
        bias_strength: f32,
        conservative: f32,
        grow: f32,
        radius: f32,
    ) -> Result<(), RefineError> {
        if !image.same_size(mask) {
            return Err(RefineError::SizeMismatch {
                image: (image.width(), image.height()),
                mask: (mask.width(), mask.height()),
            });
        }
        let width = c_int::try_from(image.width())
            .map_err(|_| RefineError::Failed("image too wide".to_string()))?;
        let height = c_int::try_from(image.height())
            .map_err(|_| RefineError::Failed("image too tall".to_string()))?;

        // The library takes interleaved RGB and may write into it.
        let mut pixels: Vec<u8> = image.pixels().iter().flatten().copied().collect();

        // SAFETY: both buffers hold width * height pixels (3 bytes per image
        // pixel, 1 per mask pixel) and outlive the call.
        unsafe {
            Coraline_segment(
                pixels.as_mut_ptr(),
                mask.pixels_mut().as_mut_ptr(),
                width,
                height,
                bias_strength,
                conservative,
                grow,
                radius,
            );
        }

        for p in mask.pixels_mut() {
            *p = u8::from(*p != 0);
        }
        Ok(())
    }
}
