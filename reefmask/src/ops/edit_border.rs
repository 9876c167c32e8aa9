//! Border editing by strokes snapped to a contour.

use glam::IVec2;

use crate::blob::Blob;
use crate::config::Config;
use crate::contour::{fill_contour, fill_hole, ContourRegion, PointLocation};
use crate::geometry::{draw_line, Bbox};
use crate::labeling::{Connectivity, LabelMap};
use crate::mask_algebra::{crop_to_content, fill_holes, paint_mask, paint_points, points_box};
use crate::raster::Mask;
use crate::region::regions_from_labels;

/// Trims a densified stroke to the part that interacts with the contour.
///
/// Points are classified as inside, on, or outside the contour. A contact
/// is either a maximal run of `On` points or a direct inside/outside step.
/// With two or more contacts the stroke is kept from the first contact to
/// the last; with a single contact that is an `On` run of at least two
/// points, that run is kept. Anything else does not snap.
pub fn snap_stroke<'a>(region: &ContourRegion, stroke: &'a [IVec2]) -> Option<&'a [IVec2]> {
    let locations: Vec<PointLocation> = stroke.iter().map(|&p| region.locate(p)).collect();
    let n = locations.len();

    // Inclusive index ranges.
    let mut contacts: Vec<(usize, usize)> = Vec::new();
    let mut i = 0;
    while i < n {
        if locations[i] == PointLocation::On {
            let start = i;
            while i + 1 < n && locations[i + 1] == PointLocation::On {
                i += 1;
            }
            contacts.push((start, i));
        } else if i + 1 < n
            && locations[i + 1] != PointLocation::On
            && locations[i + 1] != locations[i]
        {
            contacts.push((i, i + 1));
        }
        i += 1;
    }

    match contacts.as_slice() {
        [] => None,
        [(start, end)] => {
            (locations[*start] == PointLocation::On && end > start).then(|| &stroke[*start..=*end])
        }
        [(first, _), .., (_, last)] => Some(&stroke[*first..=*last]),
    }
}

struct ContourEdit {
    mask: Mask,
    bbox: Bbox,
    snapped: bool,
}

/// Which side of the chain an edit works on.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Side {
    /// The region enclosed by an outer contour, chain included.
    Outer,
    /// The hole enclosed by an inner contour, chain excluded.
    Hole,
}

fn rasterize(contour: &[IVec2], bbox: &Bbox, side: Side) -> Mask {
    match side {
        Side::Outer => fill_contour(contour, bbox),
        Side::Hole => fill_hole(contour, bbox),
    }
}

/// Rebuilds the area enclosed by one contour after applying the strokes.
/// `None` when the contour is empty or nothing remains.
fn edit_contour(
    contour: &[IVec2],
    strokes: &[Vec<IVec2>],
    side: Side,
    margin: i32,
) -> Option<ContourEdit> {
    let region = ContourRegion::new(contour)?;
    let arcs: Vec<&[IVec2]> = strokes
        .iter()
        .filter_map(|stroke| snap_stroke(&region, stroke))
        .collect();
    let snapped: Vec<IVec2> = arcs.iter().flat_map(|arc| arc.iter().copied()).collect();

    let contour_box = points_box(contour, margin)?;

    let Some(snapped_box) = points_box(&snapped, margin) else {
        let mask = rasterize(contour, &contour_box, side);
        let (mask, bbox) = crop_to_content(&mask, &contour_box)?;
        return Some(ContourEdit {
            mask,
            bbox,
            snapped: false,
        });
    };

    let bbox = contour_box.union(&snapped_box);
    let mut mask = rasterize(contour, &bbox, side);
    paint_points(&mut mask, &bbox, &snapped, 1);
    let mut mask = fill_holes(&mask);

    // Stroke pixels become border. An arc that only runs along the chain
    // leaves the chain as it was: kept for an outer region, left out of a
    // hole.
    for arc in &arcs {
        let on_chain = arc.iter().all(|&p| region.locate(p) == PointLocation::On);
        if side == Side::Hole || !on_chain {
            paint_points(&mut mask, &bbox, arc, 0);
        }
    }

    // Keep the largest piece; equal areas resolve to the first label in
    // raster order.
    let labels = LabelMap::from_mask(&mask, Connectivity::Four);
    let regions = regions_from_labels(&labels, 0);
    let mut largest = regions.first()?;
    for region in &regions[1..] {
        if region.area > largest.area {
            largest = region;
        }
    }

    Some(ContourEdit {
        mask: largest.mask.clone(),
        bbox: largest.bbox.translated(bbox.origin()),
        snapped: true,
    })
}

/// Reshapes `blob` with border strokes.
///
/// The outer contour and each inner contour are edited independently: the
/// snapped strokes are painted onto the rasterized region (for an inner
/// contour, its hole), enclosed gaps are filled, the stroke pixels are
/// cleared and the largest remaining 4-connected piece is kept. Edited
/// holes are then removed from the outer region. Returns whether the blob
/// changed; if no stroke snaps to any contour or nothing remains, the blob
/// is left as it was.
pub fn edit_border(blob: &mut Blob, strokes: &[Vec<IVec2>], config: &Config) -> bool {
    let strokes: Vec<Vec<IVec2>> = strokes
        .iter()
        .map(|s| draw_line(s))
        .filter(|s| !s.is_empty())
        .collect();
    if strokes.is_empty() {
        return false;
    }

    let margin = config.edit_border_margin;
    let Some(outer) = edit_contour(blob.contour(), &strokes, Side::Outer, margin) else {
        tracing::debug!(blob = %blob.id(), "edit border left nothing of the outer contour");
        return false;
    };

    let mut snapped = outer.snapped;
    let mut mask = outer.mask;
    let bbox = outer.bbox;

    for contour in blob.inner_contours() {
        if let Some(inner) = edit_contour(contour, &strokes, Side::Hole, margin) {
            snapped |= inner.snapped;
            paint_mask(&mut mask, &bbox, &inner.mask, &inner.bbox, 0);
        }
    }

    if !snapped {
        tracing::debug!(blob = %blob.id(), "no stroke snapped to the border");
        return false;
    }

    let Some((mask, bbox)) = crop_to_content(&mask, &bbox) else {
        tracing::debug!(blob = %blob.id(), "edit border left an empty mask");
        return false;
    };
    if bbox == blob.bbox() && &mask == blob.mask() {
        return false;
    }

    blob.update_using_mask(bbox, &mask)
}
