//! core/types.rs
//!
//! Data types shared between the adapters, the orchestrator and callers.
//!
//! Rule of thumb:
//! - These structs are "boring bags of data"
//! - No file I/O, no tag parsing
//! - Serializable, so diagnostic tooling can dump them as JSON

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::error::{MetaError, Result};
use super::fields::{Field, Format, ValueShape};

/// One field value. The variant must match [`Field::shape`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Integer(u32),
    List(Vec<String>),
}

impl FieldValue {
    pub fn shape(&self) -> ValueShape {
        match self {
            FieldValue::Text(_) => ValueShape::Text,
            FieldValue::Integer(_) => ValueShape::Integer,
            FieldValue::List(_) => ValueShape::TextList,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<u32> {
        match self {
            FieldValue::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            FieldValue::List(v) => Some(v),
            _ => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<u32> for FieldValue {
    fn from(n: u32) -> Self {
        FieldValue::Integer(n)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(v: Vec<String>) -> Self {
        FieldValue::List(v)
    }
}

impl From<Vec<&str>> for FieldValue {
    fn from(v: Vec<&str>) -> Self {
        FieldValue::List(v.into_iter().map(str::to_owned).collect())
    }
}

/// Field -> value map used by every read and write.
///
/// An entry holding `None` is an instruction: "delete this field" on write.
/// Reads never produce `None` entries; a field missing from the source is
/// simply not in the map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnifiedMetadata {
    entries: BTreeMap<Field, Option<FieldValue>>,
}

impl UnifiedMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, field: Field, value: impl Into<FieldValue>) -> &mut Self {
        self.entries.insert(field, Some(value.into()));
        self
    }

    /// Record a delete instruction for `field`.
    pub fn remove(&mut self, field: Field) -> &mut Self {
        self.entries.insert(field, None);
        self
    }

    pub(crate) fn insert(&mut self, field: Field, value: Option<FieldValue>) {
        self.entries.insert(field, value);
    }

    /// The value for `field`, if one is present (delete instructions read as absent).
    pub fn get(&self, field: Field) -> Option<&FieldValue> {
        self.entries.get(&field).and_then(Option::as_ref)
    }

    pub fn contains(&self, field: Field) -> bool {
        self.entries.contains_key(&field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, Option<&FieldValue>)> {
        self.entries.iter().map(|(f, v)| (*f, v.as_ref()))
    }

    pub fn fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.entries.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copy of this map keeping only the fields `format` can hold.
    pub(crate) fn retain_supported(&self, format: Format) -> (UnifiedMetadata, Vec<Field>) {
        let mut kept = UnifiedMetadata::new();
        let mut dropped = Vec::new();
        for (field, value) in &self.entries {
            if format.supports(*field) {
                kept.entries.insert(*field, value.clone());
            } else {
                dropped.push(*field);
            }
        }
        (kept, dropped)
    }

    /// Reject values whose variant doesn't match the field's declared shape.
    pub(crate) fn check_shapes(&self) -> Result<()> {
        for (field, value) in &self.entries {
            if let Some(v) = value {
                if v.shape() != field.shape() {
                    return Err(MetaError::InvalidValueShape {
                        field: *field,
                        expected: field.shape(),
                    });
                }
            }
        }
        Ok(())
    }
}

impl FromIterator<(Field, FieldValue)> for UnifiedMetadata {
    fn from_iter<I: IntoIterator<Item = (Field, FieldValue)>>(iter: I) -> Self {
        let mut out = UnifiedMetadata::new();
        for (field, value) in iter {
            out.set(field, value);
        }
        out
    }
}

/// Result of probing one format for one field.
///
/// `Unsupported` is not an error: the unified reader skips it and only
/// complains when every applicable format says so.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldRead {
    Present(FieldValue),
    Absent,
    Unsupported,
}

impl FieldRead {
    pub fn into_value(self) -> Option<FieldValue> {
        match self {
            FieldRead::Present(v) => Some(v),
            _ => None,
        }
    }
}

/// Structural summary of one container inside a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderInfo {
    pub format: Format,
    pub present: bool,
    /// e.g. "2.4.0" for ID3v2, "1.1" for ID3v1, vendor string for Vorbis
    pub version: Option<String>,
    /// Size in bytes of the container region
    pub size: u64,
    pub flags: Vec<String>,
    /// Frame ids / comment keys / INFO keys, in file order
    pub entries: Vec<String>,
    /// Byte offset of the container inside the file
    pub offset: Option<u64>,
}

impl HeaderInfo {
    pub(crate) fn absent(format: Format) -> Self {
        Self {
            format,
            present: false,
            version: None,
            size: 0,
            flags: Vec::new(),
            entries: Vec::new(),
            offset: None,
        }
    }
}

/// What happened to one format during a unified write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum OutcomeStatus {
    Written,
    /// A snapshot was written back (PRESERVE)
    Restored,
    /// Structurally removed (CLEANUP)
    Deleted,
    Skipped(String),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormatOutcome {
    pub format: Format,
    pub status: OutcomeStatus,
}

/// Returned by every unified write.
///
/// Writes across formats are not atomic: a `Failed` outcome for a
/// non-target format means the file is only partially synchronized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteReport {
    pub target: Format,
    pub outcomes: Vec<FormatOutcome>,
    pub warnings: Vec<String>,
}

impl WriteReport {
    pub(crate) fn new(target: Format) -> Self {
        Self {
            target,
            outcomes: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub(crate) fn record(&mut self, format: Format, status: OutcomeStatus) {
        self.outcomes.push(FormatOutcome { format, status });
    }

    pub(crate) fn warn(&mut self, message: String) {
        tracing::warn!("{message}");
        self.warnings.push(message);
    }

    pub fn status_of(&self, format: Format) -> Option<&OutcomeStatus> {
        self.outcomes
            .iter()
            .rev()
            .find(|o| o.format == format)
            .map(|o| &o.status)
    }

    pub fn failures(&self) -> impl Iterator<Item = &FormatOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, OutcomeStatus::Failed(_)))
    }
}

/// Stream parameters probed from the audio data.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TechnicalInfo {
    pub duration_ms: Option<u64>,
    pub sample_rate: Option<u32>,
    pub channels: Option<u16>,
    pub bits_per_sample: Option<u32>,
    pub bitrate_kbps: Option<u32>,
    pub file_size: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormatView {
    pub header: HeaderInfo,
    pub metadata: UnifiedMetadata,
}

/// Composite view: unified metadata, each container on its own, and the
/// stream parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FullMetadata {
    pub unified: UnifiedMetadata,
    pub formats: BTreeMap<Format, FormatView>,
    pub technical: TechnicalInfo,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delete_instruction_is_distinct_from_missing() {
        let mut m = UnifiedMetadata::new();
        m.remove(Field::Title);
        assert!(m.contains(Field::Title));
        assert!(m.get(Field::Title).is_none());
        assert!(!m.contains(Field::Album));
    }

    #[test]
    fn shape_mismatch_is_rejected() {
        let mut m = UnifiedMetadata::new();
        m.set(Field::Artists, "Solo Artist");
        let err = m.check_shapes().unwrap_err();
        assert!(matches!(
            err,
            MetaError::InvalidValueShape {
                field: Field::Artists,
                expected: ValueShape::TextList
            }
        ));
    }

    #[test]
    fn retain_supported_reports_dropped_fields() {
        let mut m = UnifiedMetadata::new();
        m.set(Field::Title, "Song").set(Field::Rating, 4u32);
        let (kept, dropped) = m.retain_supported(Format::Id3v1);
        assert_eq!(kept.len(), 1);
        assert_eq!(dropped, vec![Field::Rating]);
    }

    #[test]
    fn serializes_with_canonical_names() {
        let mut m = UnifiedMetadata::new();
        m.set(Field::AlbumArtists, vec!["A", "B"]).set(Field::Bpm, 120u32);
        let json = serde_json::to_string(&m).unwrap();
        assert_eq!(json, r#"{"ALBUM_ARTISTS":["A","B"],"BPM":120}"#);
        let back: UnifiedMetadata = serde_json::from_str(&json).unwrap();
        assert_eq!(back, m);
    }
}
