//! core/tags/read.rs
//! Unified reads across every format a file may carry.
//!
//! - Precedence is the extension's format order: first non-absent value wins.
//! - A format that can't hold a field is skipped; only when none can does
//!   the read fail with `FieldNotSupportedAnywhere`.
//! - An explicit format bypasses precedence entirely.

use std::collections::BTreeMap;

use super::super::audio_file::AudioFile;
use super::super::error::{MetaError, Result};
use super::super::fields::{Field, Format};
use super::super::options::ReadOptions;
use super::super::types::{FieldRead, FieldValue, FormatView, FullMetadata, HeaderInfo, UnifiedMetadata};
use super::{AdapterContext, adapter_for};

impl From<&ReadOptions> for AdapterContext {
    fn from(options: &ReadOptions) -> Self {
        Self {
            rating_max: options.rating_max,
            id3v2_version: options.id3v2_version,
        }
    }
}

/// Fold `found` under `into`, keeping values already there.
fn merge_lower_precedence(into: &mut UnifiedMetadata, found: &UnifiedMetadata) {
    for (field, value) in found.iter() {
        if let Some(v) = value {
            if into.get(field).is_none() {
                into.insert(field, Some(v.clone()));
            }
        }
    }
}

pub(crate) fn read_metadata(file: &AudioFile, options: &ReadOptions) -> Result<UnifiedMetadata> {
    let ctx = AdapterContext::from(options);
    if let Some(format) = options.format {
        file.ensure_applicable(format)?;
        return adapter_for(format, file, ctx).read_all();
    }

    let mut out = UnifiedMetadata::new();
    for format in file.formats() {
        let found = adapter_for(*format, file, ctx).read_all()?;
        tracing::debug!(%format, fields = found.len(), "read format");
        merge_lower_precedence(&mut out, &found);
    }
    Ok(out)
}

pub(crate) fn read_field(
    file: &AudioFile,
    field: Field,
    options: &ReadOptions,
) -> Result<Option<FieldValue>> {
    let ctx = AdapterContext::from(options);
    if let Some(format) = options.format {
        file.ensure_applicable(format)?;
        return match adapter_for(format, file, ctx).read_field(field)? {
            FieldRead::Unsupported => Err(MetaError::FieldNotSupportedByFormat { field, format }),
            read => Ok(read.into_value()),
        };
    }

    let mut supported = false;
    for format in file.formats() {
        match adapter_for(*format, file, ctx).read_field(field)? {
            FieldRead::Present(value) => return Ok(Some(value)),
            FieldRead::Absent => supported = true,
            FieldRead::Unsupported => {
                tracing::trace!(%format, %field, "format cannot hold field, skipping");
            }
        }
    }

    if supported {
        Ok(None)
    } else {
        Err(MetaError::FieldNotSupportedAnywhere(field))
    }
}

pub(crate) fn header_info(file: &AudioFile, format: Format) -> Result<HeaderInfo> {
    file.ensure_applicable(format)?;
    adapter_for(format, file, AdapterContext::default()).header_info()
}

/// Every format's header and fields, the merged view, and stream parameters.
pub(crate) fn full_metadata(file: &AudioFile, options: &ReadOptions) -> Result<FullMetadata> {
    let ctx = AdapterContext::from(options);
    let mut unified = UnifiedMetadata::new();
    let mut formats = BTreeMap::new();

    for format in file.formats() {
        let adapter = adapter_for(*format, file, ctx);
        let header = adapter.header_info()?;
        let metadata = if header.present {
            adapter.read_all()?
        } else {
            UnifiedMetadata::new()
        };
        merge_lower_precedence(&mut unified, &metadata);
        formats.insert(*format, FormatView { header, metadata });
    }

    Ok(FullMetadata {
        unified,
        formats,
        technical: file.technical_info()?,
    })
}
