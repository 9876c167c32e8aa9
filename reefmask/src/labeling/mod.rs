//! Connected component labeling using run-length encoding and union-find.
//!
//! Rows are scanned into runs of equal-keyed foreground pixels; runs in
//! adjacent rows that touch (under the chosen connectivity) and carry the
//! same key are merged. Binary masks use a single key, label maps decoded
//! from color images use the packed color as key so that touching regions
//! of different classes stay apart.
//!
//! Final labels are numbered `1..=num_labels` in raster order of each
//! component's first pixel. Callers rely on that ordering for deterministic
//! tie-breaks.


use crate::raster::{Mask, Raster};

/// Pixel connectivity for connected component labeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum Connectivity {
    /// Only horizontal and vertical neighbors: (x±1, y) and (x, y±1).
    Four,
    /// Diagonal neighbors are connected too. Maximum connectivity in 2D.
    #[default]
    Eight,
}

// ============================================================================
// Run-Length Encoding
// ============================================================================

/// A horizontal run of foreground pixels sharing one key.
#[derive(Debug, Clone, Copy)]
struct Run<K> {
    start: u32, // Starting x coordinate (inclusive)
    end: u32,   // Ending x coordinate (exclusive)
    key: K,
    label: u32, // Provisional label
}

impl<K> Run<K> {
    /// Search window in the previous row, end exclusive.
    #[inline]
    fn search_window(&self, connectivity: Connectivity) -> (u32, u32) {
        match connectivity {
            Connectivity::Four => (self.start, self.end),
            Connectivity::Eight => (self.start.saturating_sub(1), self.end + 1),
        }
    }
}

#[inline]
fn runs_connected<K: PartialEq>(prev: &Run<K>, curr: &Run<K>, connectivity: Connectivity) -> bool {
    let touching = match connectivity {
        Connectivity::Four => prev.start < curr.end && prev.end > curr.start,
        Connectivity::Eight => prev.start < curr.end + 1 && prev.end + 1 > curr.start,
    };
    touching && prev.key == curr.key
}

/// Splits one row into runs. `key` returns `None` for background.
fn extract_runs<T, K: PartialEq + Copy>(
    row: &[T],
    key: &impl Fn(&T) -> Option<K>,
    runs: &mut Vec<Run<K>>,
) {
    let mut open: Option<Run<K>> = None;

    for (x, pixel) in row.iter().enumerate() {
        let k = key(pixel);
        match (&mut open, k) {
            (Some(run), Some(k)) if run.key == k => {}
            (slot, k) => {
                if let Some(mut run) = slot.take() {
                    run.end = x as u32;
                    runs.push(run);
                }
                *slot = k.map(|key| Run {
                    start: x as u32,
                    end: x as u32,
                    key,
                    label: 0,
                });
            }
        }
    }

    if let Some(mut run) = open {
        run.end = row.len() as u32;
        runs.push(run);
    }
}

// ============================================================================
// LabelMap
// ============================================================================

/// A 2D label map from connected component analysis.
///
/// Each pixel holds the label of its component (0 for background,
/// `1..=num_labels` for components).
#[derive(Debug, Clone)]
pub struct LabelMap {
    labels: Raster<u32>,
    num_labels: usize,
}

impl LabelMap {
    /// Labels the non-zero pixels of a binary mask.
    pub fn from_mask(mask: &Mask, connectivity: Connectivity) -> Self {
        Self::from_keys(mask, connectivity, |&v| (v != 0).then_some(()))
    }

    /// Labels a packed color-code raster: equal non-zero codes that touch
    /// form one component, code 0 is background.
    pub fn from_codes(codes: &Raster<u32>, connectivity: Connectivity) -> Self {
        Self::from_keys(codes, connectivity, |&c| (c != 0).then_some(c))
    }

    /// Generic labeling where `key` maps a pixel to its component key, or
    /// `None` for background.
    pub fn from_keys<T, K: PartialEq + Copy>(
        raster: &Raster<T>,
        connectivity: Connectivity,
        key: impl Fn(&T) -> Option<K>,
    ) -> Self {
        let width = raster.width();
        let height = raster.height();
        let mut labels = Raster::new_filled(width, height, 0u32);

        if width == 0 || height == 0 {
            return Self {
                labels,
                num_labels: 0,
            };
        }

        let num_labels = label_sequential(raster, &key, &mut labels, connectivity);
        Self { labels, num_labels }
    }

    /// Wraps labels produced elsewhere (watershed output, repaired maps).
    pub fn from_raw(labels: Raster<u32>, num_labels: usize) -> Self {
        Self { labels, num_labels }
    }

    /// Number of connected components (excluding background).
    #[inline]
    pub fn num_labels(&self) -> usize {
        self.num_labels
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.labels.width()
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.labels.height()
    }

    #[inline]
    pub fn labels(&self) -> &Raster<u32> {
        &self.labels
    }

    /// Mutable access for post-processing passes. Callers must keep values
    /// within `0..=num_labels`.
    #[inline]
    pub fn labels_mut(&mut self) -> &mut Raster<u32> {
        &mut self.labels
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u32 {
        *self.labels.get(x, y)
    }

    /// Pixel count per label, indexed by label (index 0 is background).
    pub fn areas(&self) -> Vec<usize> {
        let mut areas = vec![0usize; self.num_labels + 1];
        for &l in self.labels.pixels() {
            areas[l as usize] += 1;
        }
        areas
    }
}

impl std::ops::Index<usize> for LabelMap {
    type Output = u32;

    #[inline]
    fn index(&self, idx: usize) -> &Self::Output {
        &self.labels[idx]
    }
}

// ============================================================================
// Sequential labeling
// ============================================================================

fn label_sequential<T, K: PartialEq + Copy>(
    raster: &Raster<T>,
    key: &impl Fn(&T) -> Option<K>,
    labels: &mut Raster<u32>,
    connectivity: Connectivity,
) -> usize {
    let width = raster.width();
    let height = raster.height();

    let mut uf = UnionFind::new();
    let mut prev_runs: Vec<Run<K>> = Vec::with_capacity(width / 4);
    let mut curr_runs: Vec<Run<K>> = Vec::with_capacity(width / 4);

    for y in 0..height {
        curr_runs.clear();
        extract_runs(raster.row(y), key, &mut curr_runs);

        if curr_runs.is_empty() {
            prev_runs.clear();
            continue;
        }

        let mut prev_idx = 0;
        for run in &mut curr_runs {
            let (search_start, search_end) = run.search_window(connectivity);

            // Skip runs that end before our search window
            while prev_idx < prev_runs.len() && prev_runs[prev_idx].end <= search_start {
                prev_idx += 1;
            }

            let mut assigned_label = None;
            let mut check_idx = prev_idx;
            while check_idx < prev_runs.len() && prev_runs[check_idx].start < search_end {
                let prev_run = &prev_runs[check_idx];
                if runs_connected(prev_run, run, connectivity) {
                    match assigned_label {
                        Some(label) if label != prev_run.label => {
                            uf.union(label, prev_run.label);
                        }
                        None => assigned_label = Some(prev_run.label),
                        _ => {}
                    }
                }
                check_idx += 1;
            }

            run.label = assigned_label.unwrap_or_else(|| uf.make_set());

            let row_start = y * width;
            for x in run.start..run.end {
                labels[row_start + x as usize] = run.label;
            }
        }

        std::mem::swap(&mut prev_runs, &mut curr_runs);
    }

    uf.flatten_labels(labels.pixels_mut())
}

// ============================================================================
// Union-Find
// ============================================================================

struct UnionFind {
    parent: Vec<u32>,
}

impl UnionFind {
    fn new() -> Self {
        Self { parent: Vec::new() }
    }

    /// Create a new set and return its label.
    fn make_set(&mut self) -> u32 {
        let label = self.parent.len() as u32 + 1;
        self.parent.push(label);
        label
    }

    /// Find root with iterative path compression (two-pass).
    #[inline]
    fn find(&mut self, label: u32) -> u32 {
        // First pass: find root
        let mut root = label;
        loop {
            let parent = self.parent[(root - 1) as usize];
            if parent == root {
                break;
            }
            root = parent;
        }

        // Second pass: compress path
        let mut current = label;
        while current != root {
            let idx = (current - 1) as usize;
            current = self.parent[idx];
            self.parent[idx] = root;
        }
        root
    }

    /// Union two sets (smaller root wins, so a root is always the earliest
    /// label of its set).
    fn union(&mut self, a: u32, b: u32) {
        let root_a = self.find(a);
        let root_b = self.find(b);
        if root_a != root_b {
            let (smaller, larger) = if root_a < root_b {
                (root_a, root_b)
            } else {
                (root_b, root_a)
            };
            self.parent[(larger - 1) as usize] = smaller;
        }
    }

    /// Renumber roots to sequential 1..n (in order of first provisional
    /// label) and rewrite the buffer.
    fn flatten_labels(&mut self, labels: &mut [u32]) -> usize {
        if self.parent.is_empty() {
            return 0;
        }

        let n = self.parent.len();
        let mut root_to_final = vec![0u32; n + 1];
        let mut label_map = vec![0u32; n + 1];
        let mut num_labels = 0u32;
        for label in 1..=n as u32 {
            let root = self.find(label);
            if root_to_final[root as usize] == 0 {
                num_labels += 1;
                root_to_final[root as usize] = num_labels;
            }
            label_map[label as usize] = root_to_final[root as usize];
        }

        for l in labels.iter_mut() {
            if *l != 0 {
                *l = label_map[*l as usize];
            }
        }

        num_labels as usize
    }
}
