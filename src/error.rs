//! Error types for extraction and comparison

use std::path::PathBuf;
use thiserror::Error;

/// Result type for audit operations
pub type Result<T> = std::result::Result<T, AuditError>;

/// Fatal conditions raised while extracting or comparing interfaces.
///
/// Compatibility findings are never errors; they travel as report data.
#[derive(Error, Debug)]
pub enum AuditError {
    /// An interface file could not be read.
    #[error("Failed to read '{path}': {source}")]
    Extraction {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A Cap'n Proto `import` statement named a file that does not exist.
    #[error("Import not found: {import} (from {from})")]
    ImportResolution { import: String, from: PathBuf },

    /// libclang or the host compiler is missing or unusable.
    #[error("Toolchain unavailable: {0}")]
    Toolchain(String),

    /// The file extension maps to no known interface format.
    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(PathBuf),

    /// The two inputs belong to different format families.
    #[error("Cannot compare '{old}' against '{new}': different interface formats")]
    FormatMismatch { old: PathBuf, new: PathBuf },

    #[error("Config error: {0}")]
    Config(#[from] serde_yaml::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}
