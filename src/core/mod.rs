//! core/mod.rs
//!
//! The public surface:
//! - Unified read (whole map or one field) with per-extension precedence
//! - Unified write under a strategy, or strict single-format write
//! - Structural delete, header introspection, the full diagnostic view
//! - FLAC checksum state and repair
//!
//! Every call opens the file, parses what it needs and lets go.
//! Nothing is cached between calls, so two calls on the same path always
//! see the bytes currently on disk.

pub mod audio_file;
pub mod error;
pub mod fields;
pub mod flac;
pub mod multi_value;
pub mod options;
pub mod rating;
pub mod riff;
pub(crate) mod tags;
pub mod types;

use std::path::{Path, PathBuf};

use audio_file::AudioFile;
use error::Result;
use fields::{Field, Format};
use flac::ChecksumState;
use options::{FlacToolConfig, ReadOptions, WriteOptions};
use types::{FieldValue, FullMetadata, HeaderInfo, UnifiedMetadata, WriteReport};

/// Read every field, first format in precedence order winning per field.
///
/// With `options.format` set, only that format is read.
pub fn read_metadata(path: impl AsRef<Path>, options: &ReadOptions) -> Result<UnifiedMetadata> {
    let file = AudioFile::open(path)?;
    tags::read::read_metadata(&file, options)
}

/// Read one field.
///
/// - `Ok(None)`: some format could hold it, none does
/// - `FieldNotSupportedAnywhere`: no format of this file type can hold it
pub fn read_field(path: impl AsRef<Path>, field: Field, options: &ReadOptions) -> Result<Option<FieldValue>> {
    let file = AudioFile::open(path)?;
    tags::read::read_field(&file, field, options)
}

/// Write `metadata`; `None` entries delete their field.
///
/// Formats other than the target are handled per `options.strategy`.
/// Their failures are reported in the returned [`WriteReport`], not raised.
pub fn write_metadata(
    path: impl AsRef<Path>,
    metadata: &UnifiedMetadata,
    options: &WriteOptions,
) -> Result<WriteReport> {
    let file = AudioFile::open(path)?;
    let report = tags::write::write_metadata(&file, metadata, options)?;
    if report.failures().next().is_some() {
        tracing::warn!(path = %file.path().display(), "metadata written with per-format failures");
    }
    Ok(report)
}

/// Structurally remove one format (or all of them).
/// `true` if anything was removed.
pub fn delete_metadata(path: impl AsRef<Path>, format: Option<Format>) -> Result<bool> {
    let file = AudioFile::open(path)?;
    let formats: Vec<Format> = match format {
        Some(f) => {
            file.ensure_applicable(f)?;
            vec![f]
        }
        None => file.formats().to_vec(),
    };

    let mut removed = false;
    for format in formats {
        let adapter = tags::adapter_for(format, &file, tags::AdapterContext::default());
        if adapter.delete_all()? {
            tracing::debug!(path = %file.path().display(), %format, "removed tag container");
            removed = true;
        }
    }
    Ok(removed)
}

pub fn header_info(path: impl AsRef<Path>, format: Format) -> Result<HeaderInfo> {
    let file = AudioFile::open(path)?;
    tags::read::header_info(&file, format)
}

/// Merged map, every format's own view and header, and stream parameters.
pub fn full_metadata(path: impl AsRef<Path>, options: &ReadOptions) -> Result<FullMetadata> {
    let file = AudioFile::open(path)?;
    tags::read::full_metadata(&file, options)
}

pub fn flac_checksum_state(path: impl AsRef<Path>, tool: &FlacToolConfig) -> Result<ChecksumState> {
    let file = AudioFile::open(path)?;
    flac::checksum_state(&file, tool)
}

/// Re-encode into `<stem>.repaired.flac` next to the original.
/// The original file is never modified.
pub fn repair_flac_checksum(path: impl AsRef<Path>, tool: &FlacToolConfig) -> Result<PathBuf> {
    let file = AudioFile::open(path)?;
    flac::repair_checksum(&file, tool)
}
