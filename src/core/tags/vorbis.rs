//! core/tags/vorbis.rs
//! VORBIS_COMMENT block of a FLAC stream.
//!
//! - `metaflac` parses and serializes the metadata blocks.
//! - The stream does not always start at byte 0, so the block range is
//!   located with the FLAC helpers and spliced back between the untouched
//!   prefix and the audio frames.
//! - One comment entry per list value; keys are matched case-insensitively.

use metaflac::BlockType;

use super::super::audio_file::AudioFile;
use super::super::error::{MetaError, Result};
use super::super::fields::{Field, Format};
use super::super::flac;
use super::super::types::{HeaderInfo, UnifiedMetadata};
use super::{AdapterContext, TagAdapter, check_writable, slots_to_value, value_to_slots};

fn key_for(field: Field) -> Option<&'static str> {
    Some(match field {
        Field::Title => "TITLE",
        Field::Artists => "ARTIST",
        Field::Album => "ALBUM",
        Field::AlbumArtists => "ALBUMARTIST",
        Field::GenresNames => "GENRE",
        Field::Rating => "RATING",
        Field::Language => "LANGUAGE",
        Field::ReleaseDate => "DATE",
        Field::TrackNumber => "TRACKNUMBER",
        Field::Bpm => "BPM",
        Field::Composers => "COMPOSER",
        Field::Publisher => "PUBLISHER",
        Field::Copyright => "COPYRIGHT",
        Field::Lyrics => "LYRICS",
        Field::Comment => "COMMENT",
        Field::ReplayGain => "REPLAYGAIN_TRACK_GAIN",
        Field::ArchivalLocation => return None,
    })
}

/// Parsed metadata plus where it sits in the file.
struct FlacLayout {
    tag: metaflac::Tag,
    marker: usize,
    audio_start: usize,
}

pub(crate) struct VorbisAdapter<'a> {
    file: &'a AudioFile,
    ctx: AdapterContext,
}

impl<'a> VorbisAdapter<'a> {
    pub(crate) fn new(file: &'a AudioFile, ctx: AdapterContext) -> Self {
        Self { file, ctx }
    }

    fn layout(&self, bytes: &[u8]) -> Result<FlacLayout> {
        let marker = flac::find_marker(bytes)
            .ok_or_else(|| MetaError::corrupted(self.file.path(), "no fLaC marker found"))?;
        let audio_start =
            flac::metadata_end(bytes, marker).map_err(|r| MetaError::corrupted(self.file.path(), r))?;
        let mut reader = &bytes[marker..audio_start];
        let tag = metaflac::Tag::read_from(&mut reader)?;
        Ok(FlacLayout {
            tag,
            marker,
            audio_start,
        })
    }

    fn store(&self, bytes: &[u8], mut layout: FlacLayout) -> Result<()> {
        let mut out = Vec::with_capacity(bytes.len() + 512);
        out.extend_from_slice(&bytes[..layout.marker]);
        layout.tag.write_to(&mut out)?;
        out.extend_from_slice(&bytes[layout.audio_start..]);
        self.file.write_bytes(&out)
    }
}

/// All values stored under `key`, whatever its case in the file.
fn values_for<'t>(tag: &'t metaflac::Tag, key: &str) -> Vec<&'t str> {
    let Some(vc) = tag.vorbis_comments() else {
        return Vec::new();
    };
    vc.comments
        .iter()
        .filter(|(k, _)| k.eq_ignore_ascii_case(key))
        .flat_map(|(_, v)| v.iter().map(String::as_str))
        .collect()
}

impl TagAdapter for VorbisAdapter<'_> {
    fn format(&self) -> Format {
        Format::Vorbis
    }

    fn read_all(&self) -> Result<UnifiedMetadata> {
        let bytes = self.file.read_bytes()?;
        let layout = self.layout(&bytes)?;

        let mut out = UnifiedMetadata::new();
        for field in Format::Vorbis.supported_fields() {
            let Some(key) = key_for(*field) else { continue };
            let slots = values_for(&layout.tag, key);
            if let Some(value) = slots_to_value(*field, &slots, Format::Vorbis, &self.ctx) {
                out.insert(*field, Some(value));
            }
        }
        Ok(out)
    }

    fn write(&self, metadata: &UnifiedMetadata) -> Result<()> {
        check_writable(Format::Vorbis, metadata, &self.ctx)?;

        let bytes = self.file.read_bytes()?;
        let mut layout = self.layout(&bytes)?;
        let vc = layout.tag.vorbis_comments_mut();

        for (field, value) in metadata.iter() {
            let Some(key) = key_for(field) else { continue };
            let slots = value_to_slots(field, value, Format::Vorbis, &self.ctx)?;
            vc.comments.retain(|k, _| !k.eq_ignore_ascii_case(key));
            if !slots.is_empty() {
                vc.comments.insert(key.to_string(), slots);
            }
        }

        tracing::debug!(path = %self.file.path().display(), "writing VORBIS_COMMENT block");
        self.store(&bytes, layout)
    }

    fn delete_all(&self) -> Result<bool> {
        let bytes = self.file.read_bytes()?;
        let mut layout = self.layout(&bytes)?;
        if layout.tag.vorbis_comments().is_none() {
            return Ok(false);
        }
        layout.tag.remove_blocks(BlockType::VorbisComment);
        self.store(&bytes, layout)?;
        Ok(true)
    }

    fn header_info(&self) -> Result<HeaderInfo> {
        let bytes = self.file.read_bytes()?;
        let layout = self.layout(&bytes)?;
        let blocks = flac::metadata_blocks(&bytes, layout.marker)
            .map_err(|r| MetaError::corrupted(self.file.path(), r))?;
        let Some(block) = blocks.iter().find(|b| b.kind == flac::VORBIS_COMMENT) else {
            return Ok(HeaderInfo::absent(Format::Vorbis));
        };

        let (vendor, mut entries) = match layout.tag.vorbis_comments() {
            Some(vc) => (
                vc.vendor_string.clone(),
                vc.comments.keys().cloned().collect::<Vec<_>>(),
            ),
            None => (String::new(), Vec::new()),
        };
        entries.sort();

        Ok(HeaderInfo {
            format: Format::Vorbis,
            present: true,
            version: (!vendor.is_empty()).then_some(vendor),
            size: (block.length + 4) as u64,
            flags: if block.is_last { vec!["last_block".to_string()] } else { Vec::new() },
            entries,
            offset: Some(block.offset as u64),
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::core::flac::test_support::{id3v2_prefix, minimal_flac};
    use crate::core::types::FieldValue;
    use super::*;

    fn flac_file(dir: &tempfile::TempDir, prefix: bool) -> AudioFile {
        let path = dir.path().join("t.flac");
        let mut bytes = if prefix { id3v2_prefix() } else { Vec::new() };
        bytes.extend(minimal_flac([7; 16]));
        bytes.extend_from_slice(&[0xff, 0xf8, 0x69, 0x08]); // stand-in frame bytes
        std::fs::write(&path, bytes).unwrap();
        AudioFile::open(&path).unwrap()
    }

    #[test]
    fn one_entry_per_value() {
        let dir = tempfile::tempdir().unwrap();
        let file = flac_file(&dir, false);
        let adapter = VorbisAdapter::new(&file, AdapterContext::default());

        let mut m = UnifiedMetadata::new();
        m.set(Field::Artists, vec!["Artist One", "Artist Two"])
            .set(Field::Title, "Two Hands");
        adapter.write(&m).unwrap();

        let bytes = file.read_bytes().unwrap();
        let layout = adapter.layout(&bytes).unwrap();
        assert_eq!(values_for(&layout.tag, "artist"), vec!["Artist One", "Artist Two"]);
        assert!(bytes.ends_with(&[0xff, 0xf8, 0x69, 0x08]));

        let back = adapter.read_all().unwrap();
        assert_eq!(
            back.get(Field::Artists),
            Some(&FieldValue::from(vec!["Artist One", "Artist Two"]))
        );
    }

    #[test]
    fn foreign_prefix_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let file = flac_file(&dir, true);
        let adapter = VorbisAdapter::new(&file, AdapterContext::default());

        let mut m = UnifiedMetadata::new();
        m.set(Field::Album, "Kept");
        adapter.write(&m).unwrap();

        let bytes = file.read_bytes().unwrap();
        assert!(bytes.starts_with(&id3v2_prefix()));
        assert_eq!(
            adapter.read_all().unwrap().get(Field::Album),
            Some(&FieldValue::from("Kept"))
        );
        assert_eq!(flac::stored_checksum(&bytes).unwrap(), [7; 16]);
    }

    #[test]
    fn delete_removes_block() {
        let dir = tempfile::tempdir().unwrap();
        let file = flac_file(&dir, false);
        let adapter = VorbisAdapter::new(&file, AdapterContext::default());
        assert!(!adapter.header_info().unwrap().present);

        let mut m = UnifiedMetadata::new();
        m.set(Field::Comment, "x");
        adapter.write(&m).unwrap();
        let info = adapter.header_info().unwrap();
        assert!(info.present);
        assert_eq!(info.entries, vec!["COMMENT".to_string()]);

        assert!(adapter.delete_all().unwrap());
        assert!(!adapter.header_info().unwrap().present);
        assert!(adapter.read_all().unwrap().is_empty());
    }

    #[test]
    fn not_a_flac_stream() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.flac");
        std::fs::write(&path, b"RIFF0000WAVE").unwrap();
        let file = AudioFile::open(&path).unwrap();
        let err = VorbisAdapter::new(&file, AdapterContext::default())
            .read_all()
            .unwrap_err();
        assert!(matches!(err, MetaError::Corrupted { .. }));
    }
}
