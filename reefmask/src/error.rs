//! Error types for region operations.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::blob::{BlobId, GroupId};
use crate::refine::RefineError;

/// Errors returned by blob operations and the annotation registry.
///
/// Operations whose only failure is an empty result report it through
/// `Option`, `bool` or an empty `Vec` instead.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Dimension mismatch for {what}: expected {expected:?}, got {actual:?}")]
    DimensionMismatch {
        what: &'static str,
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("Unknown blob {0}")]
    UnknownBlob(BlobId),

    #[error("Unknown group {0}")]
    UnknownGroup(GroupId),

    #[error("A group needs at least one member")]
    EmptyGroup,

    #[error("Label '{0}' is reserved")]
    ReservedLabel(String),

    #[error("Seed ({x}, {y}) lies outside the {width}x{height} field")]
    SeedOutOfBounds {
        x: i32,
        y: i32,
        width: usize,
        height: usize,
    },

    #[error("Border refinement failed: {0}")]
    Refinement(#[from] RefineError),

    #[error("Failed to load image '{path}': {source}")]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to load configuration: {0}")]
    ConfigFile(#[from] common::SerdeFormatError),
}

pub type Result<T> = std::result::Result<T, Error>;
