use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum FileExtensionError {
    #[error("Failed to get file extension")]
    MissingFileExtension,
    #[error("Unsupported file extension for file: {0}")]
    UnsupportedFileExtension(String),
}

pub type FileFormatResult<T> = Result<T, FileExtensionError>;

#[derive(Debug, thiserror::Error)]
pub enum SerdeFormatError {
    #[error(transparent)]
    Extension(#[from] FileExtensionError),
    #[error("Failed to read '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("YAML serialization failed")]
    Yaml(#[from] serde_yml::Error),
    #[error("JSON serialization failed")]
    Json(#[from] serde_json::Error),
}

pub type SerdeFormatResult<T> = Result<T, SerdeFormatError>;

pub fn get_file_extension(filename: &str) -> Option<&str> {
    Path::new(filename)
        .extension()
        .and_then(|os_str| os_str.to_str())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SerdeFormat {
    Yaml,
    Json,
}

impl SerdeFormat {
    pub fn from_file_name(file_name: &str) -> FileFormatResult<Self> {
        let ext = get_file_extension(file_name).ok_or(FileExtensionError::MissingFileExtension)?;

        if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") {
            Ok(Self::Yaml)
        } else if ext.eq_ignore_ascii_case("json") {
            Ok(Self::Json)
        } else {
            Err(FileExtensionError::UnsupportedFileExtension(
                file_name.to_string(),
            ))
        }
    }

    pub fn serialize<T: Serialize>(self, value: &T) -> SerdeFormatResult<String> {
        match self {
            Self::Yaml => Ok(serde_yml::to_string(value)?),
            Self::Json => Ok(serde_json::to_string_pretty(value)?),
        }
    }

    pub fn deserialize<T: DeserializeOwned>(self, serialized: &str) -> SerdeFormatResult<T> {
        match self {
            Self::Yaml => Ok(serde_yml::from_str(serialized)?),
            Self::Json => Ok(serde_json::from_str(serialized)?),
        }
    }
}

/// Reads and deserializes a file, picking the format from its extension.
pub fn load_file<T: DeserializeOwned>(path: &Path) -> SerdeFormatResult<T> {
    let name = path.to_string_lossy();
    let format = SerdeFormat::from_file_name(&name)?;
    let text = std::fs::read_to_string(path).map_err(|source| SerdeFormatError::Read {
        path: name.to_string(),
        source,
    })?;
    format.deserialize(&text)
}
