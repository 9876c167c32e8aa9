//! The annotation registry: blobs in creation order, groups, class labels
//! and the progressive id counter.
//!
//! Edit operations are exposed as methods that look blobs up by id. Blobs
//! they create are returned to the caller and only become part of the
//! annotation through [`Annotation::add_blob`].

mod io;

pub use io::DATA_TABLE_HEADER;


use glam::{DVec2, IVec2};

use crate::blob::{Blob, BlobId, GroupId, ProgressiveId};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::geometry::Bbox;
use crate::labels::LabelRegistry;
use crate::ops::{self, CrackOutcome};
use crate::raster::{Mask, Raster, RgbRaster};
use crate::refine::BorderRefiner;

/// A named cluster of blobs.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    id: GroupId,
    members: Vec<BlobId>,
    centroid: DVec2,
}

impl Group {
    #[inline]
    pub fn id(&self) -> GroupId {
        self.id
    }

    #[inline]
    pub fn members(&self) -> &[BlobId] {
        &self.members
    }

    /// Pixel mean over all member masks.
    #[inline]
    pub fn centroid(&self) -> DVec2 {
        self.centroid
    }

    pub fn instance_name(id: GroupId) -> String {
        format!("coral-group-{id}")
    }
}

/// Summary of blob areas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AreaStatistics {
    pub count: usize,
    pub min: usize,
    pub max: usize,
    /// Population standard deviation.
    pub std_dev: f64,
}

#[derive(Debug, Clone)]
pub struct Annotation {
    blobs: Vec<Blob>,
    groups: Vec<Group>,
    next_group: u64,
    ids: ProgressiveId,
    labels: LabelRegistry,
    config: Config,
}

impl Default for Annotation {
    fn default() -> Self {
        Self::new(LabelRegistry::default(), Config::default())
    }
}

impl Annotation {
    pub fn new(labels: LabelRegistry, config: Config) -> Self {
        config.validate();
        Self {
            blobs: Vec::new(),
            groups: Vec::new(),
            next_group: 1,
            ids: ProgressiveId::default(),
            labels,
            config,
        }
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    pub fn labels(&self) -> &LabelRegistry {
        &self.labels
    }

    #[inline]
    pub fn labels_mut(&mut self) -> &mut LabelRegistry {
        &mut self.labels
    }

    /// Id the next created blob will receive.
    #[inline]
    pub fn next_blob_id(&self) -> BlobId {
        self.ids.peek()
    }

    // ========================================================================
    // Blobs
    // ========================================================================

    #[inline]
    pub fn blobs(&self) -> &[Blob] {
        &self.blobs
    }

    pub fn blob(&self, id: BlobId) -> Option<&Blob> {
        self.blobs.iter().find(|b| b.id() == id)
    }

    pub fn blob_mut(&mut self, id: BlobId) -> Option<&mut Blob> {
        self.blobs.iter_mut().find(|b| b.id() == id)
    }

    fn get(&self, id: BlobId) -> Result<&Blob> {
        find(&self.blobs, id)
    }

    /// Appends a blob created by one of this annotation's operations.
    pub fn add_blob(&mut self, blob: Blob) {
        debug_assert!(self.blob(blob.id()).is_none(), "duplicate blob id {}", blob.id());
        tracing::debug!(blob = %blob.id(), area = blob.area(), "added blob");
        self.blobs.push(blob);
    }

    /// Removes a blob, also from its group. The id is never reissued.
    pub fn remove_blob(&mut self, id: BlobId) -> Result<Blob> {
        let index = self
            .blobs
            .iter()
            .position(|b| b.id() == id)
            .ok_or(Error::UnknownBlob(id))?;
        let blob = self.blobs.remove(index);

        if let Some(group_id) = blob.group() {
            if let Some(group) = self.groups.iter_mut().find(|g| g.id == group_id) {
                group.members.retain(|&m| m != id);
            }
            self.refresh_group(group_id);
        }

        tracing::debug!(blob = %id, "removed blob");
        Ok(blob)
    }

    /// Smallest-area blob whose mask contains the point.
    pub fn clicked_blob(&self, x: i32, y: i32) -> Option<&Blob> {
        let mut selected: Option<&Blob> = None;
        for blob in self.blobs.iter().filter(|b| b.contains(x, y)) {
            if selected.is_none_or(|s| blob.area() < s.area()) {
                selected = Some(blob);
            }
        }
        selected
    }

    /// Count, extremes and spread of blob areas; `None` without blobs.
    pub fn statistics(&self) -> Option<AreaStatistics> {
        let areas: Vec<usize> = self.blobs.iter().map(Blob::area).collect();
        let count = areas.len();
        let min = *areas.iter().min()?;
        let max = *areas.iter().max()?;

        let mean = areas.iter().sum::<usize>() as f64 / count as f64;
        let variance = areas
            .iter()
            .map(|&a| (a as f64 - mean).powi(2))
            .sum::<f64>()
            / count as f64;

        let stats = AreaStatistics {
            count,
            min,
            max,
            std_dev: variance.sqrt(),
        };
        tracing::info!(
            count = stats.count,
            min = stats.min,
            max = stats.max,
            std_dev = stats.std_dev,
            "blob area statistics"
        );
        Some(stats)
    }

    // ========================================================================
    // Groups
    // ========================================================================

    #[inline]
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.groups.iter().find(|g| g.id == id)
    }

    /// Groups the given blobs under a fresh group id. Blobs already in
    /// another group leave it first. An empty member list is rejected
    /// before an id is drawn.
    pub fn add_group(&mut self, members: &[BlobId]) -> Result<GroupId> {
        if members.is_empty() {
            return Err(Error::EmptyGroup);
        }
        for &id in members {
            self.get(id)?;
        }

        let id = GroupId::from_raw(self.next_group);
        self.next_group += 1;

        let mut unique: Vec<BlobId> = Vec::with_capacity(members.len());
        for &member in members {
            if !unique.contains(&member) {
                unique.push(member);
            }
        }

        let mut previous = Vec::new();
        for &member in &unique {
            if let Some(blob) = self.blob_mut(member) {
                if let Some(old) = blob.group.replace(id) {
                    previous.push(old);
                }
                blob.instance_name = Group::instance_name(id);
            }
        }
        for group in &mut self.groups {
            group.members.retain(|m| !unique.contains(m));
        }
        for old in previous {
            self.refresh_group(old);
        }

        self.groups.push(Group {
            id,
            members: unique,
            centroid: DVec2::ZERO,
        });
        self.refresh_group(id);

        tracing::debug!(group = %id, members = members.len(), "added group");
        Ok(id)
    }

    /// Dissolves a group; its members go back to their own names.
    pub fn remove_group(&mut self, id: GroupId) -> Result<()> {
        let index = self
            .groups
            .iter()
            .position(|g| g.id == id)
            .ok_or(Error::UnknownGroup(id))?;
        let group = self.groups.remove(index);

        for member in group.members {
            if let Some(blob) = self.blob_mut(member) {
                blob.group = None;
                blob.instance_name = Blob::default_instance_name(member);
            }
        }
        tracing::debug!(group = %id, "removed group");
        Ok(())
    }

    /// Recomputes a group's centroid; a group left without members is
    /// dropped.
    fn refresh_group(&mut self, id: GroupId) {
        let Some(index) = self.groups.iter().position(|g| g.id == id) else {
            return;
        };

        let mut sum = DVec2::ZERO;
        let mut n = 0usize;
        for member in &self.groups[index].members {
            if let Some(blob) = self.blobs.iter().find(|b| b.id() == *member) {
                sum += blob.centroid() * blob.area() as f64;
                n += blob.area();
            }
        }

        if n == 0 {
            self.groups.remove(index);
            return;
        }
        self.groups[index].centroid = sum / n as f64;
    }

    // ========================================================================
    // Edit operations
    // ========================================================================

    /// See [`ops::blobs_from_mask`].
    pub fn blobs_from_mask(&mut self, raw: &Mask, origin: IVec2, reference_area: f64) -> Vec<Blob> {
        ops::blobs_from_mask(raw, origin, reference_area, &self.config, &mut self.ids)
    }

    /// Union of the given blobs as a copy of the first. Nothing is modified.
    pub fn union(&self, ids: &[BlobId]) -> Result<Option<Blob>> {
        let blobs = ids.iter().map(|&id| self.get(id)).collect::<Result<Vec<_>>>()?;
        Ok(ops::union(&blobs))
    }

    /// Removes `b` from `a` in place.
    pub fn subtract(&mut self, a: BlobId, b: BlobId) -> Result<bool> {
        let b = self.get(b)?.clone();
        let blob = self.blob_mut(a).ok_or(Error::UnknownBlob(a))?;
        let changed = ops::subtract(blob, &b);
        let group = blob.group();
        if let Some(group) = group.filter(|_| changed) {
            self.refresh_group(group);
        }
        Ok(changed)
    }

    pub fn cut(&mut self, id: BlobId, strokes: &[Vec<IVec2>]) -> Result<Vec<Blob>> {
        let blob = find(&self.blobs, id)?;
        Ok(ops::cut(blob, strokes, &self.config, &mut self.ids))
    }

    pub fn split_blob(
        &mut self,
        image: &RgbRaster,
        id: BlobId,
        seeds: &[IVec2],
    ) -> Result<Vec<Blob>> {
        let blob = find(&self.blobs, id)?;
        Ok(ops::split_blob(image, blob, seeds, &self.config, &mut self.ids))
    }

    pub fn create_crack(
        &mut self,
        id: BlobId,
        field: &Raster<f32>,
        seed: IVec2,
        tolerance: f32,
        preview: bool,
    ) -> Result<CrackOutcome> {
        let blob = find(&self.blobs, id)?;
        ops::create_crack(blob, field, seed, tolerance, preview, &self.config, &mut self.ids)
    }

    pub fn edit_border(&mut self, id: BlobId, strokes: &[Vec<IVec2>]) -> Result<bool> {
        let config = self.config.clone();
        let blob = self.blob_mut(id).ok_or(Error::UnknownBlob(id))?;
        let changed = ops::edit_border(blob, strokes, &config);
        let group = blob.group();
        if let Some(group) = group.filter(|_| changed) {
            self.refresh_group(group);
        }
        Ok(changed)
    }

    pub fn refine_border(
        &mut self,
        id: BlobId,
        bbox: Bbox,
        image: &RgbRaster,
        mask: &Mask,
        grow: f32,
        refiner: &dyn BorderRefiner,
    ) -> Result<Vec<Blob>> {
        let blob = find(&self.blobs, id)?;
        ops::refine_border(blob, bbox, image, mask, grow, refiner, &self.config, &mut self.ids)
    }
}

/// Lookup that borrows only the blob list.
fn find(blobs: &[Blob], id: BlobId) -> Result<&Blob> {
    blobs
        .iter()
        .find(|b| b.id() == id)
        .ok_or(Error::UnknownBlob(id))
}
