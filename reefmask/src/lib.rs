//! Reefmask - region algebra for coral-reef orthomosaic annotation.
//!
//! Blobs are binary masks anchored in global image coordinates together with
//! their traced contours and metrics. The crate provides:
//! - Blob creation from segmentation masks and color-coded label maps
//! - Boolean operations (union, subtract)
//! - Stroke-driven edits (cut, border editing)
//! - Seeded splitting (watershed) and crack carving (flood fill)
//! - Border refinement through a pluggable [`BorderRefiner`]
//! - An [`Annotation`] registry with groups, statistics and data-table export
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use reefmask::{Annotation, Config, LabelRegistry};
//!
//! let mut annotation = Annotation::new(LabelRegistry::default(), Config::default());
//! let blobs = annotation.import_label_map_file("labels.png".as_ref(), (4000, 3000))?;
//! for blob in blobs {
//!     annotation.add_blob(blob);
//! }
//! annotation.export_data_table(1.0, std::io::stdout())?;
//! ```

pub mod annotation;
mod blob;
mod config;
pub mod contour;
mod error;
pub(crate) mod filters;
mod geometry;
pub(crate) mod labeling;
mod labels;
pub(crate) mod mask_algebra;
pub mod ops;
mod raster;
pub mod refine;
pub(crate) mod region;
pub(crate) mod watershed;

// ============================================================================
// Core types
// ============================================================================

pub use blob::{Blob, BlobId, GroupId, ProgressiveId};
pub use geometry::{draw_line, Bbox};
pub use raster::{Mask, Raster, RgbRaster};

// ============================================================================
// Registry and configuration
// ============================================================================

pub use annotation::{Annotation, AreaStatistics, Group, DATA_TABLE_HEADER};
pub use config::Config;
pub use error::{Error, Result};
pub use labels::{Label, LabelRegistry, BACKGROUND, BACKGROUND_COLOR, EMPTY, EMPTY_COLOR};

// ============================================================================
// Operations
// ============================================================================

pub use labeling::{Connectivity, LabelMap};
pub use ops::CrackOutcome;
pub use refine::{BorderRefiner, RefineError, UnavailableRefiner};
