//! Boolean and paint primitives on masks anchored at global boxes.
//!
//! A mask is always paired with the [`Bbox`] that places its top-left pixel
//! in image coordinates. Combining functions allocate a fresh raster over
//! the joint box; the `paint_*` helpers write into a caller-owned working
//! raster and silently skip anything that falls outside it.


use glam::IVec2;

use crate::geometry::Bbox;
use crate::raster::Mask;

/// Minimal box covering all `boxes`, `None` for an empty slice.
pub fn joint_box(boxes: &[Bbox]) -> Option<Bbox> {
    let (first, rest) = boxes.split_first()?;
    Some(rest.iter().fold(*first, |acc, b| acc.union(b)))
}

/// Zero raster sized to the joint box of `a` and `b`.
pub fn joint_mask(a: &Bbox, b: &Bbox) -> (Mask, Bbox) {
    let bbox = a.union(b);
    let (w, h) = bbox.size();
    (Mask::new_default(w, h), bbox)
}

/// Sets `dest` to `value` wherever `src` is 1, translating by the offset
/// between the two boxes. Not commutative: `value` overwrites whatever
/// `dest` held.
pub fn paint_mask(dest: &mut Mask, dest_box: &Bbox, src: &Mask, src_box: &Bbox, value: u8) {
    let offset = src_box.origin() - dest_box.origin();

    for y in 0..src.height() {
        let dy = y as i32 + offset.y;
        if dy < 0 || dy as usize >= dest.height() {
            continue;
        }
        let row = src.row(y);
        for (x, &pixel) in row.iter().enumerate() {
            if pixel == 1 {
                dest.set_signed(x as i32 + offset.x, dy, value);
            }
        }
    }
}

/// `A AND NOT B` over the joint box of both masks.
pub fn subtract(mask_a: &Mask, box_a: &Bbox, mask_b: &Mask, box_b: &Bbox) -> (Mask, Bbox) {
    let (mut mask, bbox) = joint_mask(box_a, box_b);
    paint_mask(&mut mask, &bbox, mask_a, box_a, 1);
    paint_mask(&mut mask, &bbox, mask_b, box_b, 0);
    (mask, bbox)
}

/// Sets every global point to `value`; points outside the raster are
/// skipped.
pub fn paint_points(mask: &mut Mask, bbox: &Bbox, points: &[IVec2], value: u8) {
    let origin = bbox.origin();
    for p in points {
        let local = *p - origin;
        mask.set_signed(local.x, local.y, value);
    }
}

/// Inclusive bounding box of `points` grown by `margin` on every side.
pub fn points_box(points: &[IVec2], margin: i32) -> Option<Bbox> {
    let first = *points.first()?;
    let (min, max) = points
        .iter()
        .fold((first, first), |(min, max), p| (min.min(*p), max.max(*p)));

    Some(Bbox::new(
        min.y - margin,
        min.x - margin,
        max.x - min.x + 1 + 2 * margin,
        max.y - min.y + 1 + 2 * margin,
    ))
}

/// Fills background regions that are not 4-connected to the raster border.
///
/// Background uses 4-connectivity, so an 8-connected foreground ring
/// (diagonal steps included) encloses its interior.
pub fn fill_holes(mask: &Mask) -> Mask {
    let w = mask.width();
    let h = mask.height();
    if w == 0 || h == 0 {
        return mask.clone();
    }
    let mut outside = vec![false; w * h];
    let mut stack: Vec<usize> = Vec::new();

    let seed = |idx: usize, outside: &mut [bool], stack: &mut Vec<usize>| {
        if mask[idx] == 0 && !outside[idx] {
            outside[idx] = true;
            stack.push(idx);
        }
    };

    for x in 0..w {
        seed(x, &mut outside, &mut stack);
        if h > 1 {
            seed((h - 1) * w + x, &mut outside, &mut stack);
        }
    }
    for y in 0..h {
        seed(y * w, &mut outside, &mut stack);
        if w > 1 {
            seed(y * w + w - 1, &mut outside, &mut stack);
        }
    }

    while let Some(idx) = stack.pop() {
        let x = idx % w;
        let y = idx / w;
        if x > 0 {
            seed(idx - 1, &mut outside, &mut stack);
        }
        if x + 1 < w {
            seed(idx + 1, &mut outside, &mut stack);
        }
        if y > 0 {
            seed(idx - w, &mut outside, &mut stack);
        }
        if y + 1 < h {
            seed(idx + w, &mut outside, &mut stack);
        }
    }

    let pixels = outside.iter().map(|&o| u8::from(!o)).collect();
    Mask::new(w, h, pixels)
}

/// Crops `mask` to the tight box of its set pixels. `None` if nothing is
/// set.
pub fn crop_to_content(mask: &Mask, bbox: &Bbox) -> Option<(Mask, Bbox)> {
    let mut min_x = usize::MAX;
    let mut min_y = usize::MAX;
    let mut max_x = 0usize;
    let mut max_y = 0usize;

    for y in 0..mask.height() {
        for (x, &p) in mask.row(y).iter().enumerate() {
            if p != 0 {
                min_x = min_x.min(x);
                max_x = max_x.max(x);
                min_y = min_y.min(y);
                max_y = max_y.max(y);
            }
        }
    }

    if min_x == usize::MAX {
        return None;
    }

    let w = max_x - min_x + 1;
    let h = max_y - min_y + 1;
    let mut pixels = Vec::with_capacity(w * h);
    for y in min_y..=max_y {
        pixels.extend(mask.row(y)[min_x..=max_x].iter().map(|&p| u8::from(p != 0)));
    }

    let cropped = Bbox::new(
        bbox.top + min_y as i32,
        bbox.left + min_x as i32,
        w as i32,
        h as i32,
    );
    Some((Mask::new(w, h, pixels), cropped))
}
