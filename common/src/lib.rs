#[macro_use]
pub mod macros;
pub mod file_format;
pub mod log_setup;

pub use file_format::{FileExtensionError, SerdeFormat, SerdeFormatError};
