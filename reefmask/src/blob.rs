//! The annotated region entity.

use glam::{DVec2, IVec2};
use serde::{Deserialize, Serialize};

use crate::contour::trace_contours;
use crate::geometry::{closed_length, Bbox};
use crate::labels::{EMPTY, EMPTY_COLOR};
use crate::mask_algebra::crop_to_content;
use crate::raster::Mask;
use crate::region::Region;

common::progressive_id_type!(BlobId);
common::progressive_id_type!(GroupId);

/// Monotonic blob id source. Ids are never reused, also after removals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressiveId {
    next: u64,
}

impl ProgressiveId {
    pub fn starting_at(next: u64) -> Self {
        Self { next }
    }

    /// Id the next call to [`ProgressiveId::next_id`] will return.
    #[inline]
    pub fn peek(&self) -> BlobId {
        BlobId::from_raw(self.next)
    }

    pub fn next_id(&mut self) -> BlobId {
        let id = BlobId::from_raw(self.next);
        self.next += 1;
        id
    }
}

/// A single annotated region: local mask anchored at `bbox`, traced
/// contours and the metrics derived from them.
///
/// The geometric fields are private and only change together through
/// [`Blob::update_using_mask`].
#[derive(Debug, Clone, PartialEq)]
pub struct Blob {
    id: BlobId,
    bbox: Bbox,
    mask: Mask,
    contour: Vec<IVec2>,
    inner_contours: Vec<Vec<IVec2>>,
    area: usize,
    perimeter: f64,
    centroid: DVec2,
    pub(crate) group: Option<GroupId>,

    pub class_name: String,
    pub class_color: [u8; 3],
    pub instance_name: String,
    pub note: String,
    pub visible: bool,
}

impl Blob {
    /// Builds a blob from a mask placed at `bbox`; the mask is cropped to its
    /// set pixels. `None` if nothing is set.
    pub fn from_mask(id: BlobId, bbox: Bbox, mask: &Mask) -> Option<Blob> {
        let mut blob = Blob {
            id,
            bbox: Bbox::default(),
            mask: Mask::new_default(0, 0),
            contour: Vec::new(),
            inner_contours: Vec::new(),
            area: 0,
            perimeter: 0.0,
            centroid: DVec2::ZERO,
            group: None,
            class_name: EMPTY.to_string(),
            class_color: EMPTY_COLOR,
            instance_name: Self::default_instance_name(id),
            note: String::new(),
            visible: true,
        };
        blob.update_using_mask(bbox, mask).then_some(blob)
    }

    /// Builds a blob from a region cut out of a raster whose top-left pixel
    /// sits at `origin`.
    pub fn from_region(id: BlobId, region: &Region, origin: IVec2) -> Option<Blob> {
        Self::from_mask(id, region.bbox.translated(origin), &region.mask)
    }

    pub fn default_instance_name(id: BlobId) -> String {
        format!("coral{id}")
    }

    /// Replaces the mask and recomputes bbox, contours, area, perimeter and
    /// centroid. An empty mask leaves the blob untouched and returns `false`.
    pub fn update_using_mask(&mut self, bbox: Bbox, mask: &Mask) -> bool {
        debug_assert_eq!(bbox.size(), (mask.width(), mask.height()));

        let Some((mask, bbox)) = crop_to_content(mask, &bbox) else {
            return false;
        };

        let contours = trace_contours(&mask, &bbox);

        let mut area = 0usize;
        let mut sum = DVec2::ZERO;
        for y in 0..mask.height() {
            for (x, &p) in mask.row(y).iter().enumerate() {
                if p != 0 {
                    area += 1;
                    sum += DVec2::new(x as f64, y as f64);
                }
            }
        }

        self.perimeter = closed_length(&contours.outer);
        self.contour = contours.outer;
        self.inner_contours = contours.inner;
        self.centroid = sum / area as f64 + bbox.origin().as_dvec2();
        self.area = area;
        self.bbox = bbox;
        self.mask = mask;
        true
    }

    /// Copies class name and color from `other`.
    pub fn inherit_class(&mut self, other: &Blob) {
        self.class_name.clone_from(&other.class_name);
        self.class_color = other.class_color;
    }

    /// Whether the global pixel `(x, y)` is set in the mask.
    pub fn contains(&self, x: i32, y: i32) -> bool {
        self.mask
            .get_signed(x - self.bbox.left, y - self.bbox.top)
            .is_some_and(|v| v != 0)
    }

    #[inline]
    pub fn id(&self) -> BlobId {
        self.id
    }

    #[inline]
    pub fn bbox(&self) -> Bbox {
        self.bbox
    }

    #[inline]
    pub fn mask(&self) -> &Mask {
        &self.mask
    }

    #[inline]
    pub fn contour(&self) -> &[IVec2] {
        &self.contour
    }

    #[inline]
    pub fn inner_contours(&self) -> &[Vec<IVec2>] {
        &self.inner_contours
    }

    #[inline]
    pub fn area(&self) -> usize {
        self.area
    }

    #[inline]
    pub fn perimeter(&self) -> f64 {
        self.perimeter
    }

    #[inline]
    pub fn centroid(&self) -> DVec2 {
        self.centroid
    }

    #[inline]
    pub fn group(&self) -> Option<GroupId> {
        self.group
    }
}
