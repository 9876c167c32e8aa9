//! Edit operations on blobs.
//!
//! Operations that create blobs return them to the caller (nothing is
//! inserted anywhere) and draw one id per created blob from the supplied
//! [`ProgressiveId`]. Operations that modify a blob go through
//! [`Blob::update_using_mask`] exactly once, and only when the result is
//! non-empty.

mod edit_border;

#[cfg(test)]
mod tests;

pub use edit_border::{edit_border, snap_stroke};

use glam::IVec2;

use crate::blob::{Blob, ProgressiveId};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::filters::{
    distance_transform, flood_fill, gaussian_blur, gaussian_blur_rgb, rgb_to_gray, sobel,
};
use crate::geometry::{draw_line, Bbox};
use crate::labeling::{Connectivity, LabelMap};
use crate::mask_algebra::{
    fill_holes, joint_box, paint_mask, paint_points, subtract as subtract_masks,
};
use crate::raster::{Mask, Raster, RgbRaster};
use crate::refine::BorderRefiner;
use crate::region::{label_and_filter, regions_from_labels, Region};
use crate::watershed::watershed;

/// Turns regions cut from a raster at `origin` into blobs with fresh ids,
/// inheriting class from `parent` when given.
fn blobs_from_regions(
    regions: &[Region],
    origin: IVec2,
    parent: Option<&Blob>,
    ids: &mut ProgressiveId,
) -> Vec<Blob> {
    regions
        .iter()
        .filter_map(|region| {
            let mut blob = Blob::from_region(ids.peek(), region, origin)?;
            ids.next_id();
            if let Some(parent) = parent {
                blob.inherit_class(parent);
            }
            Some(blob)
        })
        .collect()
}

// ============================================================================
// Creation from masks
// ============================================================================

/// Extracts blobs from a raw segmentation mask whose top-left pixel is
/// `origin`. Holes are filled, components use 8-connectivity, and only
/// components larger than `mask_area_fraction * reference_area` survive.
pub fn blobs_from_mask(
    raw: &Mask,
    origin: IVec2,
    reference_area: f64,
    config: &Config,
    ids: &mut ProgressiveId,
) -> Vec<Blob> {
    let filled = fill_holes(raw);
    let threshold = (config.mask_area_fraction * reference_area).max(0.0).floor() as usize;
    let regions = label_and_filter(&filled, threshold, Connectivity::Eight);
    let blobs = blobs_from_regions(&regions, origin, None, ids);

    tracing::debug!(
        created = blobs.len(),
        threshold,
        "extracted blobs from segmentation mask"
    );
    blobs
}

// ============================================================================
// Boolean operations
// ============================================================================

/// Merges all blobs into a copy of the first one (same id and attributes).
/// `None` for an empty input or an empty union.
pub fn union(blobs: &[&Blob]) -> Option<Blob> {
    let first = *blobs.first()?;
    let boxes: Vec<Bbox> = blobs.iter().map(|b| b.bbox()).collect();
    let bbox = joint_box(&boxes)?;
    let (w, h) = bbox.size();

    let mut mask = Mask::new_default(w, h);
    for blob in blobs {
        paint_mask(&mut mask, &bbox, blob.mask(), &blob.bbox(), 1);
    }

    let mut merged = first.clone();
    merged.update_using_mask(bbox, &mask).then_some(merged)
}

/// Removes `b` from `a`. Returns `false` and leaves `a` untouched when
/// nothing would remain.
pub fn subtract(a: &mut Blob, b: &Blob) -> bool {
    let (mask, bbox) = subtract_masks(a.mask(), &a.bbox(), b.mask(), &b.bbox());
    a.update_using_mask(bbox, &mask)
}

// ============================================================================
// Cut
// ============================================================================

/// Cuts `blob` along the strokes. Each stroke is densified into an
/// 8-connected chain, carved out of a copy of the mask, and the remainder
/// is labeled with 4-connectivity. Carved points strictly inside the mask
/// raster that were foreground then join the largest neighbouring label,
/// in stroke order. Pieces larger than the cut threshold become new blobs;
/// `blob` itself is left unchanged.
pub fn cut(
    blob: &Blob,
    strokes: &[Vec<IVec2>],
    config: &Config,
    ids: &mut ProgressiveId,
) -> Vec<Blob> {
    let points: Vec<IVec2> = strokes.iter().flat_map(|s| draw_line(s)).collect();
    if points.is_empty() {
        return Vec::new();
    }

    let bbox = blob.bbox();
    let original = blob.mask();
    let mut carved = original.clone();
    paint_points(&mut carved, &bbox, &points, 0);

    let mut labels = LabelMap::from_mask(&carved, Connectivity::Four);
    let w = original.width() as i32;
    let h = original.height() as i32;
    let origin = bbox.origin();

    for p in &points {
        let local = *p - origin;
        if local.x <= 0 || local.y <= 0 || local.x >= w - 1 || local.y >= h - 1 {
            continue;
        }
        let (x, y) = (local.x as usize, local.y as usize);
        if original[(x, y)] == 0 {
            continue;
        }
        let map = labels.labels_mut();
        let largest = map[(x + 1, y)]
            .max(map[(x - 1, y)])
            .max(map[(x, y + 1)])
            .max(map[(x, y - 1)]);
        map[(x, y)] = largest;
    }

    let regions = regions_from_labels(&labels, config.cut_area_threshold);
    let created = blobs_from_regions(&regions, origin, Some(blob), ids);
    tracing::debug!(blob = %blob.id(), created = created.len(), "cut blob");
    created
}

// ============================================================================
// Split
// ============================================================================

/// Copies the part of `image` under `bbox`; pixels outside the image read
/// as black.
fn crop_image(image: &RgbRaster, bbox: &Bbox) -> RgbRaster {
    let (w, h) = bbox.size();
    let mut crop = RgbRaster::new_default(w, h);
    for y in 0..h {
        for x in 0..w {
            if let Some(px) = image.get_signed(bbox.left + x as i32, bbox.top + y as i32) {
                crop[(x, y)] = px;
            }
        }
    }
    crop
}

/// Splits `blob` by marker watershed. Every seed (global point) paints a
/// square marker of side `2 * split_marker_half_width + 1`, clipped to the
/// blob box but not to the mask, so one square spanning two lobes stays one
/// marker; touching squares merge into one marker. The elevation combines the
/// negated distance transform of the mask with the image gradient. Every
/// flooded basin becomes a new blob, whatever its size.
pub fn split_blob(
    image: &RgbRaster,
    blob: &Blob,
    seeds: &[IVec2],
    config: &Config,
    ids: &mut ProgressiveId,
) -> Vec<Blob> {
    let bbox = blob.bbox();
    let mask = blob.mask();
    let (w, h) = bbox.size();
    let half = config.split_marker_half_width;

    let mut marker_mask = Mask::new_default(w, h);
    for seed in seeds {
        let local = *seed - bbox.origin();
        let x0 = (local.x - half).max(0);
        let y0 = (local.y - half).max(0);
        let x1 = (local.x + half).min(w as i32 - 1);
        let y1 = (local.y + half).min(h as i32 - 1);
        for y in y0..=y1 {
            for x in x0..=x1 {
                marker_mask[(x as usize, y as usize)] = 1;
            }
        }
    }
    let markers = LabelMap::from_mask(&marker_mask, Connectivity::Four);
    if markers.num_labels() == 0 {
        tracing::debug!(blob = %blob.id(), "split without markers inside the blob");
        return Vec::new();
    }

    let edges = sobel(&rgb_to_gray(&crop_image(image, &bbox)));
    let distance = distance_transform(mask);
    let weight = config.split_gradient_weight;
    let elevation = Raster::new(
        w,
        h,
        distance
            .pixels()
            .iter()
            .zip(edges.pixels())
            .map(|(&d, &e)| (-d + weight * e) / 2.0)
            .collect(),
    );

    let labels = watershed(&elevation, &markers, mask);
    let regions = regions_from_labels(&labels, 0);
    let created = blobs_from_regions(&regions, bbox.origin(), Some(blob), ids);
    tracing::debug!(
        blob = %blob.id(),
        markers = markers.num_labels(),
        created = created.len(),
        "split blob"
    );
    created
}

// ============================================================================
// Crack
// ============================================================================

/// Result of [`create_crack`].
#[derive(Debug, Clone, PartialEq)]
pub enum CrackOutcome {
    /// The carved mask, in the blob's local frame.
    Preview(Mask),
    /// Blobs extracted from the carved mask.
    Created(Vec<Blob>),
}

/// Carves a crack out of `blob`: `field` (same size as the blob mask) is
/// smoothed, flooded from the global `seed` with 8-connectivity and
/// `tolerance`, and the flooded pixels are removed from the mask.
pub fn create_crack(
    blob: &Blob,
    field: &Raster<f32>,
    seed: IVec2,
    tolerance: f32,
    preview: bool,
    config: &Config,
    ids: &mut ProgressiveId,
) -> Result<CrackOutcome> {
    let mask = blob.mask();
    if !field.same_size(mask) {
        return Err(Error::DimensionMismatch {
            what: "crack field",
            expected: (mask.width(), mask.height()),
            actual: (field.width(), field.height()),
        });
    }

    let local = seed - blob.bbox().origin();
    if !field.in_bounds(local.x, local.y) {
        return Err(Error::SeedOutOfBounds {
            x: seed.x,
            y: seed.y,
            width: field.width(),
            height: field.height(),
        });
    }

    let smoothed = gaussian_blur(field, config.crack_sigma, config.gaussian_truncate);
    let flood = flood_fill(
        &smoothed,
        (local.x as usize, local.y as usize),
        tolerance,
        Connectivity::Eight,
    );

    let pixels = mask
        .pixels()
        .iter()
        .zip(flood.pixels())
        .map(|(&m, &f)| u8::from(m != 0 && f == 0))
        .collect();
    let carved = Mask::new(mask.width(), mask.height(), pixels);

    if preview {
        return Ok(CrackOutcome::Preview(carved));
    }

    let regions = label_and_filter(&carved, config.crack_area_threshold, Connectivity::Eight);
    let created = blobs_from_regions(&regions, blob.bbox().origin(), Some(blob), ids);
    tracing::debug!(blob = %blob.id(), created = created.len(), "created crack");
    Ok(CrackOutcome::Created(created))
}

// ============================================================================
// Border refinement
// ============================================================================

/// Refines a proposal `mask` placed at `bbox` against the `image` patch
/// under the same box, then extracts 4-connected pieces larger than the
/// refinement threshold as new blobs with the class of `blob`.
///
/// Refiner failures propagate; no ids are drawn in that case.
#[allow(clippy::too_many_arguments)]
pub fn refine_border(
    blob: &Blob,
    bbox: Bbox,
    image: &RgbRaster,
    mask: &Mask,
    grow: f32,
    refiner: &dyn BorderRefiner,
    config: &Config,
    ids: &mut ProgressiveId,
) -> Result<Vec<Blob>> {
    if !image.same_size(mask) {
        return Err(Error::DimensionMismatch {
            what: "refinement mask",
            expected: (image.width(), image.height()),
            actual: (mask.width(), mask.height()),
        });
    }
    if bbox.size() != (mask.width(), mask.height()) {
        return Err(Error::DimensionMismatch {
            what: "refinement box",
            expected: (mask.width(), mask.height()),
            actual: bbox.size(),
        });
    }

    let smoothed = gaussian_blur_rgb(image, config.refine_sigma, config.gaussian_truncate);
    let mut refined = mask.clone();
    refiner.refine(
        &smoothed,
        &mut refined,
        config.refine_bias_strength,
        config.refine_conservative,
        grow,
        config.refine_radius as f32,
    )?;

    let regions = label_and_filter(&refined, config.refine_area_threshold, Connectivity::Four);
    let created = blobs_from_regions(&regions, bbox.origin(), Some(blob), ids);
    tracing::debug!(blob = %blob.id(), created = created.len(), grow, "refined border");
    Ok(created)
}
