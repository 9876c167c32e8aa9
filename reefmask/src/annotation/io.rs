//! Label-map import and data-table export.

use std::io::Write;
use std::path::Path;

use glam::IVec2;
use hashbrown::HashMap;
use image::imageops::{self, FilterType};

use super::Annotation;
use crate::blob::Blob;
use crate::error::{Error, Result};
use crate::labeling::{Connectivity, LabelMap};
use crate::labels::{EMPTY, EMPTY_COLOR};
use crate::raster::{Raster, RgbRaster};
use crate::region::regions_from_labels;

/// Header of the exported data table. The first column holds the instance
/// name.
pub const DATA_TABLE_HEADER: [&str; 7] = [
    "Instance name",
    "Class name",
    "Centroid x",
    "Centroid y",
    "Coral area",
    "Coral perimeter",
    "Coral note",
];

#[inline]
fn pack_color([r, g, b]: [u8; 3]) -> u32 {
    u32::from(r) | (u32::from(g) << 8) | (u32::from(b) << 16)
}

impl Annotation {
    /// Turns a color-coded label map into blobs.
    ///
    /// Each color is a class; touching pixels of one color (4-connected) form
    /// a candidate and those above the import threshold become blobs anchored
    /// at the map origin. Black is background. A color with no matching
    /// label yields an `Empty` blob.
    pub fn import_label_map(&mut self, map: &RgbRaster) -> Vec<Blob> {
        let codes: Raster<u32> = map.map(|&c| pack_color(c));
        let labels = LabelMap::from_codes(&codes, Connectivity::Four);
        let regions = regions_from_labels(&labels, self.config.import_area_threshold);

        let mut classes: HashMap<[u8; 3], (String, [u8; 3])> = HashMap::new();
        let mut blobs = Vec::with_capacity(regions.len());

        for region in &regions {
            let Some(x) = region.mask.row(0).iter().position(|&p| p != 0) else {
                continue;
            };
            let first = region.bbox.origin() + IVec2::new(x as i32, 0);
            let color = *map.get(first.x as usize, first.y as usize);

            let (name, class_color) = classes
                .entry(color)
                .or_insert_with(|| match self.labels.by_color(color) {
                    Some(label) => (label.name.clone(), label.color),
                    None => (EMPTY.to_string(), EMPTY_COLOR),
                })
                .clone();

            let id = self.ids.peek();
            if let Some(mut blob) = Blob::from_region(id, region, IVec2::ZERO) {
                self.ids.next_id();
                blob.class_name = name;
                blob.class_color = class_color;
                blobs.push(blob);
            }
        }

        tracing::info!(
            candidates = labels.num_labels(),
            imported = blobs.len(),
            "imported label map"
        );
        blobs
    }

    /// Loads a label-map image, resamples it to `reference_size` (nearest
    /// neighbour, so no blended colors appear) and imports it.
    pub fn import_label_map_file(
        &mut self,
        path: &Path,
        reference_size: (usize, usize),
    ) -> Result<Vec<Blob>> {
        let image = image::open(path)
            .map_err(|source| Error::ImageLoad {
                path: path.to_path_buf(),
                source,
            })?
            .to_rgb8();

        let (w, h) = (reference_size.0 as u32, reference_size.1 as u32);
        let image = if image.dimensions() == (w, h) {
            image
        } else {
            tracing::debug!(
                from = ?image.dimensions(),
                to = ?(w, h),
                "resizing label map"
            );
            imageops::resize(&image, w, h, FilterType::Nearest)
        };

        Ok(self.import_label_map(&RgbRaster::from_rgb_image(&image)))
    }

    /// Writes one tab-separated row per visible blob. `scale` is the pixel
    /// size in millimetres; areas are reported in cm² and perimeters in cm.
    pub fn export_data_table(&self, scale: f64, mut writer: impl Write) -> Result<()> {
        writeln!(writer, "{}", DATA_TABLE_HEADER.join("\t"))?;

        let mut rows = 0usize;
        for blob in self.blobs.iter().filter(|b| b.visible) {
            let centroid = blob.centroid();
            writeln!(
                writer,
                "{}\t{}\t{:.1}\t{:.1}\t{:.2}\t{:.1}\t{}",
                blob.instance_name,
                blob.class_name,
                centroid.x,
                centroid.y,
                blob.area() as f64 * scale * scale / 100.0,
                blob.perimeter() * scale / 10.0,
                blob.note.replace(['\t', '\n'], " "),
            )?;
            rows += 1;
        }
        writer.flush()?;

        tracing::info!(rows, scale, "exported data table");
        Ok(())
    }
}
