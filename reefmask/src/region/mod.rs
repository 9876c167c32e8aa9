//! Region extraction: labeling plus area filtering into fixed-field
//! [`Region`] values.


use glam::DVec2;

use crate::contour::trace_contours;
use crate::geometry::{closed_length, Bbox};
use crate::labeling::{Connectivity, LabelMap};
use crate::raster::Mask;

/// One connected component cut out of a labeled raster.
///
/// `bbox` and `centroid` are relative to the raster that was labeled; the
/// caller translates them to global coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub mask: Mask,
    pub bbox: Bbox,
    pub area: usize,
    pub perimeter: f64,
    pub centroid: DVec2,
}

#[derive(Debug, Clone, Copy)]
struct Extent {
    min_x: usize,
    min_y: usize,
    max_x: usize,
    max_y: usize,
    area: usize,
    sum_x: f64,
    sum_y: f64,
}

impl Extent {
    fn empty() -> Self {
        Self {
            min_x: usize::MAX,
            min_y: usize::MAX,
            max_x: 0,
            max_y: 0,
            area: 0,
            sum_x: 0.0,
            sum_y: 0.0,
        }
    }

    #[inline]
    fn add(&mut self, x: usize, y: usize) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
        self.area += 1;
        self.sum_x += x as f64;
        self.sum_y += y as f64;
    }
}

/// Labels `mask` and returns every component with `area > area_threshold`,
/// in raster order of the component's first pixel.
pub fn label_and_filter(
    mask: &Mask,
    area_threshold: usize,
    connectivity: Connectivity,
) -> Vec<Region> {
    let labels = LabelMap::from_mask(mask, connectivity);
    regions_from_labels(&labels, area_threshold)
}

/// Builds regions from an already labeled raster (e.g. one that was
/// post-processed after labeling). Labels with no pixels are skipped.
pub fn regions_from_labels(labels: &LabelMap, area_threshold: usize) -> Vec<Region> {
    let mut extents = vec![Extent::empty(); labels.num_labels() + 1];
    let width = labels.width();

    for (idx, &l) in labels.labels().pixels().iter().enumerate() {
        if l != 0 {
            extents[l as usize].add(idx % width, idx / width);
        }
    }

    let mut regions = Vec::new();
    for (label, extent) in extents.iter().enumerate().skip(1) {
        if extent.area == 0 {
            continue;
        }
        if extent.area <= area_threshold {
            tracing::debug!(
                label,
                area = extent.area,
                area_threshold,
                "region below area threshold"
            );
            continue;
        }
        regions.push(cut_region(labels, label as u32, extent));
    }
    regions
}

fn cut_region(labels: &LabelMap, label: u32, extent: &Extent) -> Region {
    let w = extent.max_x - extent.min_x + 1;
    let h = extent.max_y - extent.min_y + 1;
    let mut mask = Mask::new_default(w, h);

    for y in 0..h {
        let row = labels.labels().row(extent.min_y + y);
        for x in 0..w {
            if row[extent.min_x + x] == label {
                mask[(x, y)] = 1;
            }
        }
    }

    let bbox = Bbox::new(extent.min_y as i32, extent.min_x as i32, w as i32, h as i32);
    let perimeter = closed_length(&trace_contours(&mask, &bbox).outer);
    let n = extent.area as f64;

    Region {
        mask,
        bbox,
        area: extent.area,
        perimeter,
        centroid: DVec2::new(extent.sum_x / n, extent.sum_y / n),
    }
}
