//! Boxes and point sequences in global pixel coordinates.

use glam::IVec2;
use imageproc::drawing::BresenhamLineIter;
use serde::{Deserialize, Serialize};

/// Axis-aligned box anchored in global image coordinates.
///
/// `top`/`left` is the first covered pixel; `width`/`height` count pixels,
/// so the covered columns are `left..left + width`. Coordinates are signed
/// because working rasters grown by a margin may start left of or above the
/// image origin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bbox {
    pub top: i32,
    pub left: i32,
    pub width: i32,
    pub height: i32,
}

impl Bbox {
    #[inline]
    pub const fn new(top: i32, left: i32, width: i32, height: i32) -> Self {
        Self {
            top,
            left,
            width,
            height,
        }
    }

    /// Exclusive right edge.
    #[inline]
    pub const fn right(&self) -> i32 {
        self.left + self.width
    }

    /// Exclusive bottom edge.
    #[inline]
    pub const fn bottom(&self) -> i32 {
        self.top + self.height
    }

    /// Top-left pixel as an `(x, y)` point.
    #[inline]
    pub const fn origin(&self) -> IVec2 {
        IVec2::new(self.left, self.top)
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    #[inline]
    pub const fn area(&self) -> i64 {
        if self.is_empty() {
            0
        } else {
            self.width as i64 * self.height as i64
        }
    }

    #[inline]
    pub const fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.left && x < self.right() && y >= self.top && y < self.bottom()
    }

    /// Smallest box covering both.
    pub fn union(&self, other: &Bbox) -> Bbox {
        let top = self.top.min(other.top);
        let left = self.left.min(other.left);
        let bottom = self.bottom().max(other.bottom());
        let right = self.right().max(other.right());
        Bbox::new(top, left, right - left, bottom - top)
    }

    /// Same extent moved by `offset` (x, y).
    #[inline]
    pub fn translated(&self, offset: IVec2) -> Bbox {
        Bbox::new(
            self.top + offset.y,
            self.left + offset.x,
            self.width,
            self.height,
        )
    }

    /// Raster dimensions `(width, height)` as unsigned sizes.
    #[inline]
    pub fn size(&self) -> (usize, usize) {
        (self.width.max(0) as usize, self.height.max(0) as usize)
    }
}

/// Densifies a polyline into the 8-connected pixel chain visiting every
/// vertex, using Bresenham segments. Consecutive duplicates are dropped; a
/// single point yields itself and an empty slice yields nothing.
pub fn draw_line(points: &[IVec2]) -> Vec<IVec2> {
    let mut out: Vec<IVec2> = Vec::with_capacity(points.len() * 2);
    let Some(&first) = points.first() else {
        return out;
    };
    out.push(first);

    for pair in points.windows(2) {
        let (from, to) = (pair[0], pair[1]);
        let mut segment: Vec<IVec2> =
            BresenhamLineIter::new((from.x as f32, from.y as f32), (to.x as f32, to.y as f32))
                .map(|(x, y)| IVec2::new(x, y))
                .collect();
        // The iterator walks steep or leftward segments from the far end.
        if segment.first() != Some(&from) {
            segment.reverse();
        }
        for p in segment {
            if out.last() != Some(&p) {
                out.push(p);
            }
        }
    }

    out
}

/// Length of the closed polyline through `points`.
pub fn closed_length(points: &[IVec2]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }
    let mut length = 0.0;
    for (i, p) in points.iter().enumerate() {
        let q = points[(i + 1) % points.len()];
        length += (*p - q).as_dvec2().length();
    }
    length
}
