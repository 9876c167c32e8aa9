//! Image filters used by the edit operations.
//!
//! Separable Gaussian smoothing (nearest-edge), grayscale conversion, Sobel
//! gradient magnitude, Euclidean distance transform and tolerance flood
//! fill. Gaussian row and column passes run on rayon; results do not depend
//! on the thread count. Sobel and the distance transform wrap `imageproc`.

#[cfg(test)]
mod tests;

use image::{GrayImage, Luma};
use imageproc::distance_transform::euclidean_squared_distance_transform;
use imageproc::gradients::{horizontal_sobel, vertical_sobel};
use rayon::prelude::*;

use crate::labeling::Connectivity;
use crate::raster::{Mask, Raster, RgbRaster};

// Rows handed to one rayon task.
const ROWS_PER_CHUNK: usize = 8;

// ============================================================================
// Gaussian smoothing
// ============================================================================

/// Compute a normalized 1D Gaussian kernel.
///
/// The kernel radius is `round(truncate * sigma)`, so the kernel length is
/// `2 * radius + 1`.
pub fn gaussian_kernel_1d(sigma: f32, truncate: f32) -> Vec<f32> {
    assert!(sigma > 0.0, "Sigma must be positive");

    let radius = (truncate * sigma + 0.5) as usize;
    let two_sigma_sq = 2.0 * sigma * sigma;

    let mut kernel: Vec<f32> = (0..2 * radius + 1)
        .map(|i| {
            let x = i as f32 - radius as f32;
            (-x * x / two_sigma_sq).exp()
        })
        .collect();

    let sum: f32 = kernel.iter().sum();
    for v in &mut kernel {
        *v /= sum;
    }
    kernel
}

/// Separable Gaussian blur with nearest-edge extension, truncated at
/// `truncate` standard deviations.
pub fn gaussian_blur(input: &Raster<f32>, sigma: f32, truncate: f32) -> Raster<f32> {
    let width = input.width();
    let height = input.height();
    if input.is_empty() {
        return input.clone();
    }

    let kernel = gaussian_kernel_1d(sigma, truncate);
    let radius = kernel.len() / 2;
    let src = input.pixels();

    let mut temp = vec![0.0f32; width * height];
    temp.par_chunks_mut(width * ROWS_PER_CHUNK)
        .enumerate()
        .for_each(|(chunk_idx, out_chunk)| {
            let y_start = chunk_idx * ROWS_PER_CHUNK;
            for (local_y, out_row) in out_chunk.chunks_mut(width).enumerate() {
                let y = y_start + local_y;
                let in_row = &src[y * width..(y + 1) * width];
                for (x, out) in out_row.iter_mut().enumerate() {
                    let mut sum = 0.0f32;
                    for (k, &kval) in kernel.iter().enumerate() {
                        let sx = clamp_index(x as isize + k as isize - radius as isize, width);
                        sum += in_row[sx] * kval;
                    }
                    *out = sum;
                }
            }
        });

    let mut output = vec![0.0f32; width * height];
    output
        .par_chunks_mut(width * ROWS_PER_CHUNK)
        .enumerate()
        .for_each(|(chunk_idx, out_chunk)| {
            let y_start = chunk_idx * ROWS_PER_CHUNK;
            for (local_y, out_row) in out_chunk.chunks_mut(width).enumerate() {
                let y = y_start + local_y;
                for (x, out) in out_row.iter_mut().enumerate() {
                    let mut sum = 0.0f32;
                    for (k, &kval) in kernel.iter().enumerate() {
                        let sy = clamp_index(y as isize + k as isize - radius as isize, height);
                        sum += temp[sy * width + x] * kval;
                    }
                    *out = sum;
                }
            }
        });

    Raster::new(width, height, output)
}

/// Per-channel Gaussian blur of an RGB patch, rounded back to bytes.
pub fn gaussian_blur_rgb(input: &RgbRaster, sigma: f32, truncate: f32) -> RgbRaster {
    let channels: Vec<Raster<f32>> = (0..3)
        .map(|c| gaussian_blur(&input.map(|p| p[c] as f32), sigma, truncate))
        .collect();

    let pixels = (0..input.len())
        .map(|i| {
            let mut px = [0u8; 3];
            for (c, channel) in channels.iter().enumerate() {
                px[c] = channel[i].round().clamp(0.0, 255.0) as u8;
            }
            px
        })
        .collect();
    Raster::new(input.width(), input.height(), pixels)
}

#[inline]
fn clamp_index(i: isize, len: usize) -> usize {
    i.clamp(0, len as isize - 1) as usize
}

// ============================================================================
// Gradient
// ============================================================================

/// Luminance in `[0, 1]` with Rec. 709 weights.
pub fn rgb_to_gray(input: &RgbRaster) -> Raster<f32> {
    input.map(|&[r, g, b]| (0.2125 * r as f32 + 0.7154 * g as f32 + 0.0721 * b as f32) / 255.0)
}

/// Sobel gradient magnitude, `sqrt((gx² + gy²) / 2)`, with both kernels
/// normalized by 4. The input is quantized to 8 bits; borders replicate
/// the edge pixel.
pub fn sobel(input: &Raster<f32>) -> Raster<f32> {
    if input.is_empty() {
        return input.clone();
    }

    let gray = GrayImage::from_fn(input.width() as u32, input.height() as u32, |x, y| {
        let v = input[(x as usize, y as usize)];
        Luma([(v.clamp(0.0, 1.0) * 255.0).round() as u8])
    });
    let gx = horizontal_sobel(&gray);
    let gy = vertical_sobel(&gray);

    let scale = 4.0 * 255.0;
    let magnitude = gx
        .as_raw()
        .iter()
        .zip(gy.as_raw())
        .map(|(&h, &v)| {
            let (h, v) = (h as f32 / scale, v as f32 / scale);
            ((h * h + v * v) / 2.0).sqrt()
        })
        .collect();
    Raster::new(input.width(), input.height(), magnitude)
}

// ============================================================================
// Euclidean distance transform
// ============================================================================

/// Euclidean distance from every foreground pixel to the nearest
/// background pixel; background pixels are 0. Everything outside the
/// raster counts as background.
pub fn distance_transform(mask: &Mask) -> Raster<f32> {
    let width = mask.width();
    let height = mask.height();
    if mask.is_empty() {
        return Raster::new_default(width, height);
    }

    // Background seeds, with one background pixel of padding on every side.
    let seeds = GrayImage::from_fn(width as u32 + 2, height as u32 + 2, |x, y| {
        let (x, y) = (x as usize, y as usize);
        let inside = (1..=width).contains(&x) && (1..=height).contains(&y);
        let foreground = inside && mask[(x - 1, y - 1)] != 0;
        Luma([u8::from(!foreground)])
    });
    let squared = euclidean_squared_distance_transform(&seeds);

    let mut out = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            let d = squared.get_pixel(x as u32 + 1, y as u32 + 1)[0];
            out.push(d.sqrt() as f32);
        }
    }
    Raster::new(width, height, out)
}

// ============================================================================
// Flood fill
// ============================================================================

/// Pixels connected to `seed` whose value is within `tolerance` of the seed
/// value (inclusive). `seed` must lie inside the raster.
pub fn flood_fill(
    field: &Raster<f32>,
    seed: (usize, usize),
    tolerance: f32,
    connectivity: Connectivity,
) -> Mask {
    let width = field.width();
    let height = field.height();
    let mut filled = Mask::new_default(width, height);

    let reference = field[seed];
    let accepts = |v: f32| (v - reference).abs() <= tolerance;

    let neighbours: &[(isize, isize)] = match connectivity {
        Connectivity::Four => &[(1, 0), (-1, 0), (0, 1), (0, -1)],
        Connectivity::Eight => &[
            (1, 0),
            (-1, 0),
            (0, 1),
            (0, -1),
            (1, 1),
            (1, -1),
            (-1, 1),
            (-1, -1),
        ],
    };

    let mut stack = vec![seed];
    filled[seed] = 1;
    while let Some((x, y)) = stack.pop() {
        for &(dx, dy) in neighbours {
            let nx = x as isize + dx;
            let ny = y as isize + dy;
            if nx < 0 || ny < 0 || nx >= width as isize || ny >= height as isize {
                continue;
            }
            let n = (nx as usize, ny as usize);
            if filled[n] == 0 && accepts(field[n]) {
                filled[n] = 1;
                stack.push(n);
            }
        }
    }

    filled
}
