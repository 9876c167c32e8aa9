//! Border contours and their rasterization.
//!
//! Contours come from `imageproc`'s border follower (Suzuki-Abe): closed,
//! 8-connected chains of region pixels. An outer contour runs along the
//! outside of a component; a hole contour runs along the region pixels that
//! surround a 4-connected background hole.
//!
//! Filling an outer contour (polygon interior plus the chain) gives back the
//! component with its holes filled. Filling a hole contour and clearing the
//! chain gives back the hole.


use glam::IVec2;
use hashbrown::HashSet;
use image::{GrayImage, Luma};
use imageproc::contours::{find_contours, BorderType};
use imageproc::drawing::draw_polygon_mut;
use imageproc::point::Point;

use crate::geometry::Bbox;
use crate::labeling::{Connectivity, LabelMap};
use crate::mask_algebra::points_box;
use crate::raster::Mask;

/// Outer contour plus one inner contour per hole, in global coordinates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Contours {
    pub outer: Vec<IVec2>,
    pub inner: Vec<Vec<IVec2>>,
}

/// Where a point lies relative to a contour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointLocation {
    Inside,
    On,
    Outside,
}

// ============================================================================
// Tracing
// ============================================================================

/// Traces the outer contour and the hole contours of `mask`, placed at
/// `bbox`.
///
/// When the mask holds several 8-connected components the outer contour
/// follows the largest (first in raster order among equal areas); holes of
/// every component are reported.
pub fn trace_contours(mask: &Mask, bbox: &Bbox) -> Contours {
    let mut contours = Contours::default();

    let components = LabelMap::from_mask(mask, Connectivity::Eight);
    if components.num_labels() == 0 {
        return contours;
    }

    let areas = components.areas();
    let mut largest = 1u32;
    for label in 2..=components.num_labels() {
        if areas[label] > areas[largest as usize] {
            largest = label as u32;
        }
    }

    let origin = bbox.origin();
    for contour in find_contours::<i32>(&mask.to_gray_image()) {
        match contour.border_type {
            BorderType::Outer => {
                let on_largest = contour
                    .points
                    .first()
                    .is_some_and(|p| components.get(p.x as usize, p.y as usize) == largest);
                if on_largest && contours.outer.is_empty() {
                    contours.outer = to_chain(&contour.points, origin);
                }
            }
            BorderType::Hole => contours.inner.push(to_chain(&contour.points, origin)),
        }
    }

    contours
}

/// Global chain without a repeated closing point.
fn to_chain(points: &[Point<i32>], origin: IVec2) -> Vec<IVec2> {
    let mut chain: Vec<IVec2> = points
        .iter()
        .map(|p| IVec2::new(p.x, p.y) + origin)
        .collect();
    while chain.len() > 1 && chain.first() == chain.last() {
        chain.pop();
    }
    chain
}

// ============================================================================
// Rasterization
// ============================================================================

/// Rasterizes a closed contour into a mask covering `bbox`: the polygon
/// through the pixel centers is filled and the chain itself is set. Parts
/// outside `bbox` are clipped.
pub fn fill_contour(contour: &[IVec2], bbox: &Bbox) -> Mask {
    let (w, h) = bbox.size();
    if contour.is_empty() || w == 0 || h == 0 {
        return Mask::new_default(w, h);
    }

    let origin = bbox.origin();
    let mut polygon: Vec<Point<i32>> = contour
        .iter()
        .map(|p| {
            let local = *p - origin;
            Point::new(local.x, local.y)
        })
        .collect();
    // draw_polygon_mut rejects an explicitly closed ring.
    while polygon.len() > 1 && polygon.first() == polygon.last() {
        polygon.pop();
    }

    let mut canvas = GrayImage::new(w as u32, h as u32);
    if polygon.len() > 1 {
        draw_polygon_mut(&mut canvas, &polygon, Luma([1u8]));
    }

    let mut mask = Mask::from_gray_image(&canvas);
    for p in &polygon {
        mask.set_signed(p.x, p.y, 1);
    }
    mask
}

/// Rasterizes the hole enclosed by a hole contour: the contour fill with
/// the chain cleared.
pub fn fill_hole(contour: &[IVec2], bbox: &Bbox) -> Mask {
    let mut mask = fill_contour(contour, bbox);
    let origin = bbox.origin();
    for p in contour {
        let local = *p - origin;
        mask.set_signed(local.x, local.y, 0);
    }
    mask
}

/// Point-location index over one contour.
pub struct ContourRegion {
    bbox: Bbox,
    fill: Mask,
    ring: HashSet<IVec2>,
}

impl ContourRegion {
    /// `None` for an empty contour.
    pub fn new(contour: &[IVec2]) -> Option<Self> {
        let bbox = points_box(contour, 0)?;
        Some(Self {
            bbox,
            fill: fill_contour(contour, &bbox),
            ring: contour.iter().copied().collect(),
        })
    }

    pub fn locate(&self, p: IVec2) -> PointLocation {
        if self.ring.contains(&p) {
            return PointLocation::On;
        }
        let local = p - self.bbox.origin();
        match self.fill.get_signed(local.x, local.y) {
            Some(1) => PointLocation::Inside,
            _ => PointLocation::Outside,
        }
    }
}
