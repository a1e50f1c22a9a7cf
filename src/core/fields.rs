//! core/fields.rs
//!
//! The field registry: the closed set of canonical fields, their value shapes,
//! the four container formats, and which format can hold which field.
//!
//! Pure lookups. No I/O here.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::{MetaError, Result};

/// Shape of the value a field carries. Fixed across every format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueShape {
    Text,
    Integer,
    TextList,
}

impl fmt::Display for ValueShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ValueShape::Text => "text",
            ValueShape::Integer => "integer",
            ValueShape::TextList => "list of text",
        })
    }
}

/// Canonical metadata fields exposed uniformly across containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Field {
    Title,
    Artists,
    Album,
    AlbumArtists,
    GenresNames,
    Rating,
    Language,
    ReleaseDate,
    TrackNumber,
    Bpm,
    Composers,
    Publisher,
    Copyright,
    Lyrics,
    Comment,
    #[serde(rename = "REPLAYGAIN")]
    ReplayGain,
    ArchivalLocation,
}

impl Field {
    pub const ALL: [Field; 17] = [
        Field::Title,
        Field::Artists,
        Field::Album,
        Field::AlbumArtists,
        Field::GenresNames,
        Field::Rating,
        Field::Language,
        Field::ReleaseDate,
        Field::TrackNumber,
        Field::Bpm,
        Field::Composers,
        Field::Publisher,
        Field::Copyright,
        Field::Lyrics,
        Field::Comment,
        Field::ReplayGain,
        Field::ArchivalLocation,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Field::Title => "TITLE",
            Field::Artists => "ARTISTS",
            Field::Album => "ALBUM",
            Field::AlbumArtists => "ALBUM_ARTISTS",
            Field::GenresNames => "GENRES_NAMES",
            Field::Rating => "RATING",
            Field::Language => "LANGUAGE",
            Field::ReleaseDate => "RELEASE_DATE",
            Field::TrackNumber => "TRACK_NUMBER",
            Field::Bpm => "BPM",
            Field::Composers => "COMPOSERS",
            Field::Publisher => "PUBLISHER",
            Field::Copyright => "COPYRIGHT",
            Field::Lyrics => "LYRICS",
            Field::Comment => "COMMENT",
            Field::ReplayGain => "REPLAYGAIN",
            Field::ArchivalLocation => "ARCHIVAL_LOCATION",
        }
    }

    pub fn shape(self) -> ValueShape {
        match self {
            Field::Artists | Field::AlbumArtists | Field::GenresNames | Field::Composers => {
                ValueShape::TextList
            }
            Field::Rating | Field::TrackNumber | Field::Bpm => ValueShape::Integer,
            _ => ValueShape::Text,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Field {
    type Err = MetaError;

    /// Parse a canonical field name. Anything outside the closed set is
    /// reported as unknown to the library.
    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Field::ALL
            .into_iter()
            .find(|f| f.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| MetaError::UnknownField(s.to_string()))
    }
}

/// The four container formats. The set is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Format {
    /// Legacy 128-byte trailer
    Id3v1,
    /// Frame-based header (2.3 / 2.4)
    Id3v2,
    /// FLAC VORBIS_COMMENT block
    Vorbis,
    /// LIST/INFO chunk inside a RIFF WAVE container
    RiffInfo,
}

const ID3V1_FIELDS: &[Field] = &[
    Field::Title,
    Field::Artists,
    Field::Album,
    Field::GenresNames,
    Field::ReleaseDate,
    Field::TrackNumber,
    Field::Comment,
];

const ID3V2_FIELDS: &[Field] = &[
    Field::Title,
    Field::Artists,
    Field::Album,
    Field::AlbumArtists,
    Field::GenresNames,
    Field::Rating,
    Field::Language,
    Field::ReleaseDate,
    Field::TrackNumber,
    Field::Bpm,
    Field::Composers,
    Field::Publisher,
    Field::Copyright,
    Field::Lyrics,
    Field::Comment,
    Field::ReplayGain,
];

const VORBIS_FIELDS: &[Field] = ID3V2_FIELDS;

const RIFF_INFO_FIELDS: &[Field] = &[
    Field::Title,
    Field::Artists,
    Field::Album,
    Field::AlbumArtists,
    Field::GenresNames,
    Field::Rating,
    Field::Language,
    Field::ReleaseDate,
    Field::TrackNumber,
    Field::Composers,
    Field::Copyright,
    Field::Comment,
    Field::ArchivalLocation,
];

impl Format {
    pub const ALL: [Format; 4] = [Format::Id3v1, Format::Id3v2, Format::Vorbis, Format::RiffInfo];

    pub fn as_str(self) -> &'static str {
        match self {
            Format::Id3v1 => "ID3v1",
            Format::Id3v2 => "ID3v2",
            Format::Vorbis => "Vorbis",
            Format::RiffInfo => "RIFF INFO",
        }
    }

    /// Fields this format can both read and write.
    pub fn supported_fields(self) -> &'static [Field] {
        match self {
            Format::Id3v1 => ID3V1_FIELDS,
            Format::Id3v2 => ID3V2_FIELDS,
            Format::Vorbis => VORBIS_FIELDS,
            Format::RiffInfo => RIFF_INFO_FIELDS,
        }
    }

    pub fn supports(self, field: Field) -> bool {
        self.supported_fields().contains(&field)
    }

    /// Whether a list field can occupy more than one physical slot.
    pub(crate) fn has_repeated_slots(self, id3v2_version: Id3v2Version) -> bool {
        match self {
            Format::Id3v1 | Format::RiffInfo => false,
            Format::Id3v2 => id3v2_version == Id3v2Version::V24,
            Format::Vorbis => true,
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// ID3v2 minor version used when writing frames.
///
/// - 2.3: UTF-16 text, multiple values packed into one string
/// - 2.4: UTF-8 text, multiple values NUL-separated inside one frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Id3v2Version {
    #[default]
    V23,
    V24,
}

impl Id3v2Version {
    pub fn as_str(self) -> &'static str {
        match self {
            Id3v2Version::V23 => "2.3",
            Id3v2Version::V24 => "2.4",
        }
    }
}

const MP3_FORMATS: &[Format] = &[Format::Id3v2, Format::Id3v1];
const FLAC_FORMATS: &[Format] = &[Format::Vorbis, Format::Id3v2, Format::Id3v1];
const WAV_FORMATS: &[Format] = &[Format::RiffInfo, Format::Id3v1];

/// Ordered formats a file type may carry.
/// First entry is the default write target and wins unified reads.
pub fn formats_for_extension(extension: &str) -> Result<&'static [Format]> {
    match extension.to_ascii_lowercase().as_str() {
        "mp3" => Ok(MP3_FORMATS),
        "flac" => Ok(FLAC_FORMATS),
        "wav" => Ok(WAV_FORMATS),
        _ => Err(MetaError::UnsupportedExtension(extension.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_field_round_trips_through_its_name() {
        for field in Field::ALL {
            assert_eq!(field.as_str().parse::<Field>().unwrap(), field);
        }
        assert_eq!("album_artists".parse::<Field>().unwrap(), Field::AlbumArtists);
    }

    #[test]
    fn unknown_field_name_is_a_library_error() {
        let err = "MOOD".parse::<Field>().unwrap_err();
        assert!(matches!(err, MetaError::UnknownField(ref s) if s == "MOOD"));
    }

    #[test]
    fn shapes_are_declared_once() {
        assert_eq!(Field::Artists.shape(), ValueShape::TextList);
        assert_eq!(Field::Rating.shape(), ValueShape::Integer);
        assert_eq!(Field::Title.shape(), ValueShape::Text);
    }

    #[test]
    fn support_matrix() {
        assert!(Format::Id3v2.supports(Field::Rating));
        assert!(!Format::Id3v1.supports(Field::Rating));
        assert!(Format::RiffInfo.supports(Field::ArchivalLocation));
        assert!(!Format::Vorbis.supports(Field::ArchivalLocation));
    }

    #[test]
    fn extension_order_is_precedence() {
        assert_eq!(formats_for_extension("MP3").unwrap()[0], Format::Id3v2);
        assert_eq!(formats_for_extension("flac").unwrap()[0], Format::Vorbis);
        assert_eq!(formats_for_extension("wav").unwrap()[0], Format::RiffInfo);
        assert!(matches!(
            formats_for_extension("ogg"),
            Err(MetaError::UnsupportedExtension(_))
        ));
    }
}
