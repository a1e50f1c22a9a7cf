//! core/error.rs
//!
//! One error enum for the whole crate.
//! Variants are grouped the same way callers reason about failures:
//! - file-level (bad extension, missing file, corrupt container)
//! - field-level, per format (the targeted container can't hold the field)
//! - field-level, library-wide (unknown field / no container can hold it)
//! - value-level (wrong shape, bad rating, bad date)
//! - configuration (conflicting options)
//! - external tool failures (flac)

use std::path::PathBuf;

use thiserror::Error;

use super::fields::{Field, Format, ValueShape};

/// Result type alias for metasync operations
pub type Result<T> = std::result::Result<T, MetaError>;

#[derive(Debug, Error)]
pub enum MetaError {
    /// The file extension has no declared format list
    #[error("unsupported file extension: {0:?}")]
    UnsupportedExtension(String),

    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// The container bytes could not be interpreted
    #[error("corrupted file {}: {reason}", path.display())]
    Corrupted { path: PathBuf, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ID3 codec error: {0}")]
    Id3(#[from] id3::Error),

    #[error("FLAC metadata codec error: {0}")]
    Flac(#[from] metaflac::Error),

    /// The targeted container format cannot represent this field
    #[error("field {field} is not supported by format {format}")]
    FieldNotSupportedByFormat { field: Field, format: Format },

    /// No format applicable to the file can represent this field
    #[error("field {0} is not supported by any format of this file")]
    FieldNotSupportedAnywhere(Field),

    #[error("unknown metadata field: {0:?}")]
    UnknownField(String),

    #[error("field {field} expects a {expected} value")]
    InvalidValueShape { field: Field, expected: ValueShape },

    #[error("invalid rating {value}: {reason}")]
    InvalidRating { value: u32, reason: String },

    #[error("invalid release date {0:?}: expected YYYY or YYYY-MM-DD")]
    InvalidDate(String),

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: Field, reason: String },

    #[error("conflicting options: {0}")]
    ConflictingOptions(String),

    /// An explicit format was requested that the file type never carries
    #[error("format {format} is not applicable to .{extension} files")]
    FormatNotApplicable { format: Format, extension: String },

    #[error("external tool error: {0}")]
    ExternalTool(String),
}

/// Coarse classification of [`MetaError`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    File,
    FormatField,
    LibraryField,
    Value,
    Configuration,
    Tool,
}

impl MetaError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MetaError::UnsupportedExtension(_)
            | MetaError::FileNotFound(_)
            | MetaError::Corrupted { .. }
            | MetaError::Io(_)
            | MetaError::Id3(_)
            | MetaError::Flac(_) => ErrorKind::File,
            MetaError::FieldNotSupportedByFormat { .. } => ErrorKind::FormatField,
            MetaError::FieldNotSupportedAnywhere(_) | MetaError::UnknownField(_) => {
                ErrorKind::LibraryField
            }
            MetaError::InvalidValueShape { .. }
            | MetaError::InvalidRating { .. }
            | MetaError::InvalidDate(_)
            | MetaError::InvalidValue { .. } => ErrorKind::Value,
            MetaError::ConflictingOptions(_) | MetaError::FormatNotApplicable { .. } => {
                ErrorKind::Configuration
            }
            MetaError::ExternalTool(_) => ErrorKind::Tool,
        }
    }

    pub(crate) fn corrupted(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        MetaError::Corrupted {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
