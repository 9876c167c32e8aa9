//! Tests for image filters.

use super::*;

fn approx(a: f32, b: f32, tol: f32) -> bool {
    (a - b).abs() <= tol
}

// ============================================================================
// Gaussian
// ============================================================================

#[test]
fn test_gaussian_kernel_normalized_and_sized() {
    for sigma in [0.5, 1.5, 2.0] {
        let kernel = gaussian_kernel_1d(sigma, 4.0);
        let sum: f32 = kernel.iter().sum();
        assert!(approx(sum, 1.0, 1e-5), "sum {sum} for sigma {sigma}");
        assert_eq!(kernel.len(), 2 * (4.0 * sigma + 0.5) as usize + 1);
    }
}

#[test]
#[should_panic(expected = "Sigma must be positive")]
fn test_gaussian_kernel_zero_sigma_panics() {
    gaussian_kernel_1d(0.0, 4.0);
}

#[test]
fn test_gaussian_blur_preserves_constant() {
    let input = Raster::new_filled(13, 7, 42.0f32);
    let out = gaussian_blur(&input, 2.0, 4.0);
    for &v in out.pixels() {
        assert!(approx(v, 42.0, 1e-3));
    }
}

#[test]
fn test_gaussian_blur_spreads_impulse_symmetrically() {
    let mut input = Raster::new_default(21, 21);
    input[(10, 10)] = 1.0f32;
    let out = gaussian_blur(&input, 1.5, 4.0);

    assert!(out[(10, 10)] < 1.0);
    assert!(approx(out[(9, 10)], out[(11, 10)], 1e-6));
    assert!(approx(out[(10, 9)], out[(10, 11)], 1e-6));
    let total: f32 = out.pixels().iter().sum();
    assert!(approx(total, 1.0, 1e-4));
}

#[test]
fn test_gaussian_blur_rgb_keeps_flat_color() {
    let input = RgbRaster::new_filled(5, 4, [10u8, 200, 77]);
    let out = gaussian_blur_rgb(&input, 1.5, 4.0);
    assert!(out.pixels().iter().all(|&p| p == [10, 200, 77]));
}

// ============================================================================
// Gradient
// ============================================================================

#[test]
fn test_gray_uses_luminance_weights() {
    let input = RgbRaster::new(3, 1, vec![[255, 255, 255], [0, 0, 0], [255, 0, 0]]);
    let gray = rgb_to_gray(&input);
    assert!(approx(gray[0], 1.0, 1e-3));
    assert_eq!(gray[1], 0.0);
    assert!(approx(gray[2], 0.2125, 1e-4));
}

#[test]
fn test_sobel_flat_is_zero_and_edge_responds() {
    let flat = Raster::new_filled(6, 6, 0.3f32);
    assert!(sobel(&flat).pixels().iter().all(|&v| v.abs() < 1e-6));

    // Vertical step between columns 2 and 3.
    let step = Raster::new(
        6,
        3,
        (0..18).map(|i| if i % 6 >= 3 { 1.0f32 } else { 0.0 }).collect(),
    );
    let edges = sobel(&step);
    let expected = 0.5f32.sqrt();
    assert!(approx(edges[(2, 1)], expected, 1e-5));
    assert!(approx(edges[(3, 1)], expected, 1e-5));
    assert!(edges[(0, 1)].abs() < 1e-6);
    assert!(edges[(5, 1)].abs() < 1e-6);
}

// ============================================================================
// Distance transform
// ============================================================================

#[test]
fn test_distance_to_nearest_background() {
    let mask = Mask::from_rows(&[
        [0u8, 0, 0, 0, 0],
        [0, 1, 1, 1, 0],
        [0, 1, 1, 1, 0],
        [0, 1, 1, 1, 0],
        [0, 0, 0, 0, 0],
    ]);
    let d = distance_transform(&mask);
    assert_eq!(d[(0, 0)], 0.0);
    assert!(approx(d[(1, 1)], 1.0, 1e-6));
    assert!(approx(d[(2, 2)], 2.0, 1e-6));
    assert!(approx(d[(2, 1)], 1.0, 1e-6));
}

#[test]
fn test_distance_treats_outside_as_background() {
    let mask = Mask::new_filled(5, 1, 1);
    let d = distance_transform(&mask);
    assert!(d.pixels().iter().all(|&v| approx(v, 1.0, 1e-6)));

    let block = Mask::new_filled(5, 5, 1);
    let d = distance_transform(&block);
    assert!(approx(d[(2, 2)], 3.0, 1e-6));
    assert!(approx(d[(0, 0)], 1.0, 1e-6));
}

#[test]
fn test_distance_is_euclidean() {
    // Single background pixel in the corner of a large block: diagonal
    // distances must not be Manhattan or Chebyshev.
    let mut mask = Mask::new_filled(9, 9, 1);
    mask[(4, 4)] = 0;
    let d = distance_transform(&mask);
    assert!(approx(d[(5, 5)], 2.0f32.sqrt(), 1e-6));
    assert!(approx(d[(4, 6)], 2.0, 1e-6));
    assert!(approx(d[(6, 5)], 5.0f32.sqrt(), 1e-6));
}

// ============================================================================
// Flood fill
// ============================================================================

#[test]
fn test_flood_respects_tolerance() {
    let field = Raster::new(5, 1, vec![0.0f32, 0.1, 0.2, 0.5, 0.15]);
    let filled = flood_fill(&field, (0, 0), 0.2, Connectivity::Eight);
    assert_eq!(filled.pixels(), &[1, 1, 1, 0, 0]);
}

#[test]
fn test_flood_connectivity() {
    let field = Raster::new(2, 2, vec![0.0f32, 9.0, 9.0, 0.0]);
    let four = flood_fill(&field, (0, 0), 0.5, Connectivity::Four);
    assert_eq!(four.count_nonzero(), 1);
    let eight = flood_fill(&field, (0, 0), 0.5, Connectivity::Eight);
    assert_eq!(eight.pixels(), &[1, 0, 0, 1]);
}
