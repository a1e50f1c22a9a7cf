//! core/tags/id3v1.rs
//! Legacy 128-byte `TAG` trailer.
//!
//! - Parsing goes through `id3::v1`; the crate has no v1 writer, so the
//!   128 bytes are laid out here.
//! - Every field is one fixed-width Latin-1 slot, so lists are always packed.
//! - Writing merges onto whatever trailer is already there.

use std::io::Cursor;

use super::super::audio_file::AudioFile;
use super::super::error::{MetaError, Result};
use super::super::fields::{Field, Format};
use super::super::multi_value;
use super::super::types::{FieldValue, HeaderInfo, UnifiedMetadata};
use super::util::latin1_fixed;
use super::{AdapterContext, TagAdapter, check_writable, slots_to_value, value_to_slots};

const TAG_LEN: usize = 128;

/// Genre byte -> name (ID3v1 list plus the Winamp extensions).
pub const GENRES: [&str; 126] = [
    "Blues", "Classic Rock", "Country", "Dance", "Disco", "Funk", "Grunge", "Hip-Hop", "Jazz",
    "Metal", "New Age", "Oldies", "Other", "Pop", "R&B", "Rap", "Reggae", "Rock", "Techno",
    "Industrial", "Alternative", "Ska", "Death Metal", "Pranks", "Soundtrack", "Euro-Techno",
    "Ambient", "Trip-Hop", "Vocal", "Jazz+Funk", "Fusion", "Trance", "Classical", "Instrumental",
    "Acid", "House", "Game", "Sound Clip", "Gospel", "Noise", "AlternRock", "Bass", "Soul",
    "Punk", "Space", "Meditative", "Instrumental Pop", "Instrumental Rock", "Ethnic", "Gothic",
    "Darkwave", "Techno-Industrial", "Electronic", "Pop-Folk", "Eurodance", "Dream",
    "Southern Rock", "Comedy", "Cult", "Gangsta", "Top 40", "Christian Rap", "Pop/Funk",
    "Jungle", "Native American", "Cabaret", "New Wave", "Psychadelic", "Rave", "Showtunes",
    "Trailer", "Lo-Fi", "Tribal", "Acid Punk", "Acid Jazz", "Polka", "Retro", "Musical",
    "Rock & Roll", "Hard Rock", "Folk", "Folk-Rock", "National Folk", "Swing", "Fast Fusion",
    "Bebob", "Latin", "Revival", "Celtic", "Bluegrass", "Avantgarde", "Gothic Rock",
    "Progressive Rock", "Psychedelic Rock", "Symphonic Rock", "Slow Rock", "Big Band", "Chorus",
    "Easy Listening", "Acoustic", "Humour", "Speech", "Chanson", "Opera", "Chamber Music",
    "Sonata", "Symphony", "Booty Bass", "Primus", "Porn Groove", "Satire", "Slow Jam", "Club",
    "Tango", "Samba", "Folklore", "Ballad", "Power Ballad", "Rhythmic Soul", "Freestyle", "Duet",
    "Punk Rock", "Drum Solo", "A capella", "Euro-House", "Dance Hall",
];

const NO_GENRE: u8 = 255;

pub(crate) struct Id3v1Adapter<'a> {
    file: &'a AudioFile,
    ctx: AdapterContext,
}

impl<'a> Id3v1Adapter<'a> {
    pub(crate) fn new(file: &'a AudioFile, ctx: AdapterContext) -> Self {
        Self { file, ctx }
    }

    fn slot(&self, field: Field, raw: &str) -> Option<FieldValue> {
        let raw = raw.trim_end_matches('\0');
        slots_to_value(field, &[raw], Format::Id3v1, &self.ctx)
    }
}

fn trailer_at(bytes: &[u8]) -> Option<usize> {
    let at = bytes.len().checked_sub(TAG_LEN)?;
    (&bytes[at..at + 3] == b"TAG").then_some(at)
}

fn genre_id(name: &str) -> Option<u8> {
    GENRES
        .iter()
        .position(|g| g.eq_ignore_ascii_case(name.trim()))
        .and_then(|i| u8::try_from(i).ok())
}

/// Lay out a v1.1 trailer from a fully merged map.
fn encode(metadata: &UnifiedMetadata) -> Result<Vec<u8>> {
    let text = |field: Field| -> String {
        match metadata.get(field) {
            Some(FieldValue::Text(s)) => s.trim().to_string(),
            Some(FieldValue::List(v)) => multi_value::join(v).unwrap_or_default(),
            _ => String::new(),
        }
    };

    let track = match metadata.get(Field::TrackNumber) {
        Some(FieldValue::Integer(n)) => Some(u8::try_from(*n).map_err(|_| MetaError::InvalidValue {
            field: Field::TrackNumber,
            reason: format!("{n} does not fit the one-byte ID3v1 track slot"),
        })?),
        _ => None,
    };

    let genre = match metadata.get(Field::GenresNames) {
        Some(FieldValue::List(v)) => match v.iter().find(|g| !g.trim().is_empty()) {
            Some(name) => genre_id(name).unwrap_or_else(|| {
                tracing::debug!(genre = %name, "genre has no ID3v1 code");
                NO_GENRE
            }),
            None => NO_GENRE,
        },
        _ => NO_GENRE,
    };

    let year: String = text(Field::ReleaseDate).chars().take(4).collect();

    let mut out = Vec::with_capacity(TAG_LEN);
    out.extend_from_slice(b"TAG");
    out.extend(latin1_fixed(&text(Field::Title), 30));
    out.extend(latin1_fixed(&text(Field::Artists), 30));
    out.extend(latin1_fixed(&text(Field::Album), 30));
    out.extend(latin1_fixed(&year, 4));
    match track {
        Some(n) => {
            out.extend(latin1_fixed(&text(Field::Comment), 28));
            out.push(0);
            out.push(n);
        }
        None => out.extend(latin1_fixed(&text(Field::Comment), 30)),
    }
    out.push(genre);
    Ok(out)
}

impl TagAdapter for Id3v1Adapter<'_> {
    fn format(&self) -> Format {
        Format::Id3v1
    }

    fn read_all(&self) -> Result<UnifiedMetadata> {
        let bytes = self.file.read_bytes()?;
        if trailer_at(&bytes).is_none() {
            return Ok(UnifiedMetadata::new());
        }
        let tag = id3::v1::Tag::read_from(Cursor::new(bytes.as_slice()))?;

        let mut out = UnifiedMetadata::new();
        let mut put = |field: Field, value: Option<FieldValue>| {
            if value.is_some() {
                out.insert(field, value);
            }
        };
        put(Field::Title, self.slot(Field::Title, &tag.title));
        put(Field::Artists, self.slot(Field::Artists, &tag.artist));
        put(Field::Album, self.slot(Field::Album, &tag.album));
        put(Field::ReleaseDate, self.slot(Field::ReleaseDate, &tag.year));
        put(Field::Comment, self.slot(Field::Comment, &tag.comment));
        put(
            Field::TrackNumber,
            tag.track.filter(|n| *n > 0).map(|n| FieldValue::Integer(n.into())),
        );
        // table names are whole values ("Pop/Funk"), never split
        let genre = GENRES.get(usize::from(tag.genre_id)).copied();
        put(
            Field::GenresNames,
            genre.map(|g| FieldValue::List(vec![g.to_string()])),
        );
        Ok(out)
    }

    fn write(&self, metadata: &UnifiedMetadata) -> Result<()> {
        check_writable(Format::Id3v1, metadata, &self.ctx)?;

        let mut merged = self.read_all()?;
        for (field, value) in metadata.iter() {
            // blank values count as deletions
            let slots = value_to_slots(field, value, Format::Id3v1, &self.ctx)?;
            merged.insert(field, value.filter(|_| !slots.is_empty()).cloned());
        }
        let merged: UnifiedMetadata = merged
            .iter()
            .filter_map(|(f, v)| Some((f, v?.clone())))
            .collect();

        let mut bytes = self.file.read_bytes()?;
        if let Some(at) = trailer_at(&bytes) {
            bytes.truncate(at);
        }
        if !merged.is_empty() {
            bytes.extend(encode(&merged)?);
        }
        tracing::debug!(path = %self.file.path().display(), fields = merged.len(), "writing ID3v1 trailer");
        self.file.write_bytes(&bytes)
    }

    fn delete_all(&self) -> Result<bool> {
        let mut bytes = self.file.read_bytes()?;
        let Some(at) = trailer_at(&bytes) else {
            return Ok(false);
        };
        bytes.truncate(at);
        self.file.write_bytes(&bytes)?;
        Ok(true)
    }

    fn header_info(&self) -> Result<HeaderInfo> {
        let bytes = self.file.read_bytes()?;
        let Some(at) = trailer_at(&bytes) else {
            return Ok(HeaderInfo::absent(Format::Id3v1));
        };
        let tag = &bytes[at..];
        let v11 = tag[125] == 0 && tag[126] != 0;
        let entries = self.read_all()?.fields().map(|f| f.to_string()).collect();
        Ok(HeaderInfo {
            format: Format::Id3v1,
            present: true,
            version: Some(if v11 { "1.1" } else { "1.0" }.to_string()),
            size: TAG_LEN as u64,
            flags: Vec::new(),
            entries,
            offset: Some(at as u64),
        })
    }
}
