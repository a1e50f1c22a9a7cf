//! core/tags/mod.rs
//!
//! Format adapters and the code that orchestrates them.
//!
//! - [`TagAdapter`] is the one contract every container format implements
//! - [`adapter_for`] maps a [`Format`] to its adapter (closed set, plain match)
//! - `read` holds the unified precedence reader
//! - `write` holds the strategy-driven writer
//!
//! The slot helpers at the bottom are what keeps adapters small: a container
//! hands over the raw text slots it found for a field, and gets back a typed
//! value (and the reverse on write).

mod id3v1;
mod id3v2;
pub(crate) mod read;
mod riff_info;
pub(crate) mod util;
mod vorbis;
pub(crate) mod write;

use chrono::NaiveDate;

use super::audio_file::AudioFile;
use super::error::{MetaError, Result};
use super::fields::{Field, Format, Id3v2Version, ValueShape};
use super::multi_value;
use super::rating;
use super::types::{FieldRead, FieldValue, HeaderInfo, UnifiedMetadata};

/// Per-call settings every adapter needs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct AdapterContext {
    pub rating_max: Option<u32>,
    pub id3v2_version: Id3v2Version,
}

/// Uniform contract over the four container formats.
///
/// Every method re-reads the file; adapters keep no parsed state between calls.
pub(crate) trait TagAdapter {
    fn format(&self) -> Format;

    /// Every supported field the container currently holds.
    fn read_all(&self) -> Result<UnifiedMetadata>;

    fn read_field(&self, field: Field) -> Result<FieldRead> {
        if !self.format().supports(field) {
            return Ok(FieldRead::Unsupported);
        }
        Ok(match self.read_all()?.get(field) {
            Some(v) => FieldRead::Present(v.clone()),
            None => FieldRead::Absent,
        })
    }

    /// Apply `metadata`: values replace, `None` entries delete, fields not
    /// mentioned are left alone. Fails with `FieldNotSupportedByFormat` if
    /// any field can't be represented.
    fn write(&self, metadata: &UnifiedMetadata) -> Result<()>;

    /// Structurally remove the container. `true` if there was one.
    fn delete_all(&self) -> Result<bool>;

    fn header_info(&self) -> Result<HeaderInfo>;
}

pub(crate) fn adapter_for<'a>(
    format: Format,
    file: &'a AudioFile,
    ctx: AdapterContext,
) -> Box<dyn TagAdapter + 'a> {
    match format {
        Format::Id3v1 => Box::new(id3v1::Id3v1Adapter::new(file, ctx)),
        Format::Id3v2 => Box::new(id3v2::Id3v2Adapter::new(file, ctx)),
        Format::Vorbis => Box::new(vorbis::VorbisAdapter::new(file, ctx)),
        Format::RiffInfo => Box::new(riff_info::RiffInfoAdapter::new(file, ctx)),
    }
}

/// Everything an adapter checks before touching bytes:
/// support, shapes, and value rules.
pub(crate) fn check_writable(
    format: Format,
    metadata: &UnifiedMetadata,
    ctx: &AdapterContext,
) -> Result<()> {
    if let Some(field) = metadata.fields().find(|f| !format.supports(*f)) {
        return Err(MetaError::FieldNotSupportedByFormat { field, format });
    }
    validate_values(metadata, ctx.rating_max)?;
    if let (Some(FieldValue::Integer(v)), Some(profile)) = (
        metadata.get(Field::Rating),
        rating::write_profile(format),
    ) {
        rating::to_raw(*v, ctx.rating_max, profile)?;
    }
    Ok(())
}

/// Format-independent value checks (shape, rating scale, date).
pub(crate) fn validate_values(metadata: &UnifiedMetadata, rating_max: Option<u32>) -> Result<()> {
    metadata.check_shapes()?;
    if let Some(FieldValue::Integer(v)) = metadata.get(Field::Rating) {
        rating::validate(*v, rating_max)?;
    }
    if let Some(FieldValue::Text(date)) = metadata.get(Field::ReleaseDate) {
        validate_date(date)?;
    }
    Ok(())
}

/// `YYYY` or a real `YYYY-MM-DD` calendar date.
pub(crate) fn validate_date(date: &str) -> Result<()> {
    let d = date.trim();
    let is_year = d.len() == 4 && d.bytes().all(|b| b.is_ascii_digit());
    if is_year || (d.len() == 10 && NaiveDate::parse_from_str(d, "%Y-%m-%d").is_ok()) {
        Ok(())
    } else {
        Err(MetaError::InvalidDate(date.to_string()))
    }
}

/// Typed value -> physical slots for `format`. Empty result means "remove".
///
/// Ratings are converted through the format's write profile; lists are
/// either one slot per value or packed with the multi-value codec.
pub(crate) fn value_to_slots(
    field: Field,
    value: Option<&FieldValue>,
    format: Format,
    ctx: &AdapterContext,
) -> Result<Vec<String>> {
    let Some(value) = value else {
        return Ok(Vec::new());
    };
    Ok(match value {
        FieldValue::Text(s) => {
            let s = s.trim();
            if s.is_empty() { Vec::new() } else { vec![s.to_string()] }
        }
        FieldValue::Integer(n) if field == Field::Rating => {
            let profile = rating::write_profile(format).ok_or(MetaError::FieldNotSupportedByFormat {
                field,
                format,
            })?;
            vec![rating::to_raw(*n, ctx.rating_max, profile)?.to_string()]
        }
        FieldValue::Integer(n) => vec![n.to_string()],
        FieldValue::List(values) => {
            if format.has_repeated_slots(ctx.id3v2_version) {
                multi_value::sanitize(values)
            } else {
                multi_value::join(values).into_iter().collect()
            }
        }
    })
}

/// Physical slots -> typed value. `None` when nothing usable is there.
pub(crate) fn slots_to_value<S: AsRef<str>>(
    field: Field,
    slots: &[S],
    format: Format,
    ctx: &AdapterContext,
) -> Option<FieldValue> {
    let first = || {
        slots
            .iter()
            .map(|s| s.as_ref().trim())
            .find(|s| !s.is_empty())
    };
    match field.shape() {
        ValueShape::Text => first().map(|s| FieldValue::Text(s.to_string())),
        ValueShape::Integer => {
            let raw = util::parse_tag_u32(first()?)?;
            if field == Field::Rating {
                decode_rating(raw, format, ctx).map(FieldValue::Integer)
            } else {
                Some(FieldValue::Integer(raw))
            }
        }
        ValueShape::TextList => multi_value::parse_slots(slots).map(FieldValue::List),
    }
}

pub(crate) fn decode_rating(raw: u32, format: Format, ctx: &AdapterContext) -> Option<u32> {
    let value = rating::from_raw(raw, ctx.rating_max, rating::read_profiles(format));
    if value.is_none() {
        tracing::debug!(%format, raw, "rating value matches no known profile");
    }
    value
}
