//! Marker-controlled watershed on a scalar elevation surface.
//!
//! Pixels are flooded in order of increasing elevation; among equal
//! elevations the pixel queued first wins. A pixel takes the label of the
//! neighbour that queued it and is never relabeled.


use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::labeling::LabelMap;
use crate::raster::{Mask, Raster};

#[derive(Debug, Clone, Copy)]
struct QueuedPixel {
    elevation: f32,
    age: u64,
    index: usize,
}

impl PartialEq for QueuedPixel {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueuedPixel {}

impl PartialOrd for QueuedPixel {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueuedPixel {
    // Reversed so the max-heap pops the lowest (elevation, age) first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .elevation
            .total_cmp(&self.elevation)
            .then_with(|| other.age.cmp(&self.age))
    }
}

/// Floods `elevation` from the labeled `markers`, restricted to pixels where
/// `mask` is set. Marker pixels outside the mask are ignored; mask pixels
/// unreachable from any marker stay 0.
///
/// Uses 4-neighbour adjacency.
pub fn watershed(elevation: &Raster<f32>, markers: &LabelMap, mask: &Mask) -> LabelMap {
    let width = elevation.width();
    let height = elevation.height();
    assert!(
        markers.width() == width && markers.height() == height && mask.same_size(elevation),
        "watershed inputs must share dimensions"
    );

    let mut labels: Raster<u32> = Raster::new_default(width, height);
    let mut heap = BinaryHeap::new();
    let mut age = 0u64;

    for (index, &label) in markers.labels().pixels().iter().enumerate() {
        if label != 0 && mask[index] != 0 {
            labels[index] = label;
            heap.push(QueuedPixel {
                elevation: elevation[index],
                age,
                index,
            });
            age += 1;
        }
    }

    while let Some(QueuedPixel { index, .. }) = heap.pop() {
        let x = index % width;
        let y = index / width;
        let label = labels[index];

        let mut visit = |n: usize| {
            if labels[n] == 0 && mask[n] != 0 {
                labels[n] = label;
                heap.push(QueuedPixel {
                    elevation: elevation[n],
                    age,
                    index: n,
                });
                age += 1;
            }
        };

        if y > 0 {
            visit(index - width);
        }
        if x > 0 {
            visit(index - 1);
        }
        if x + 1 < width {
            visit(index + 1);
        }
        if y + 1 < height {
            visit(index + width);
        }
    }

    LabelMap::from_raw(labels, markers.num_labels())
}
