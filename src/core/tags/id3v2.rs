//! core/tags/id3v2.rs
//! Frame-based ID3v2 header at the start of the file (MP3, or prepended to FLAC).
//!
//! - Frames are parsed and serialized by the `id3` crate; this file only
//!   decides which frame carries which field.
//! - v2.4 keeps list values as NUL-separated strings inside one frame;
//!   v2.3 gets a single delimited string.
//! - The tag is spliced in front of the untouched remainder of the file.

use std::io::Cursor;

use id3::frame::{Comment, Content, ExtendedText, Lyrics, Popularimeter};
use id3::{Frame, Tag, TagLike, Version};

use super::super::audio_file::AudioFile;
use super::super::error::Result;
use super::super::fields::{Field, Format, Id3v2Version};
use super::super::types::{FieldValue, HeaderInfo, UnifiedMetadata};
use super::util::{Id3v2Header, parse_slash_pair_u32};
use super::{AdapterContext, TagAdapter, check_writable, decode_rating, slots_to_value, value_to_slots};

/// Fields that live in a plain T*** text frame.
const TEXT_FRAMES: &[(Field, &str)] = &[
    (Field::Title, "TIT2"),
    (Field::Artists, "TPE1"),
    (Field::Album, "TALB"),
    (Field::AlbumArtists, "TPE2"),
    (Field::GenresNames, "TCON"),
    (Field::Language, "TLAN"),
    (Field::Bpm, "TBPM"),
    (Field::Composers, "TCOM"),
    (Field::Publisher, "TPUB"),
    (Field::Copyright, "TCOP"),
];

const POPM_USER: &str = "Windows Media Player 9 Series";
const REPLAYGAIN_DESC: &str = "REPLAYGAIN_TRACK_GAIN";

pub(crate) struct Id3v2Adapter<'a> {
    file: &'a AudioFile,
    ctx: AdapterContext,
}

impl<'a> Id3v2Adapter<'a> {
    pub(crate) fn new(file: &'a AudioFile, ctx: AdapterContext) -> Self {
        Self { file, ctx }
    }

    /// The parsed tag (if any) and the byte length it occupies.
    fn load(&self, bytes: &[u8]) -> Result<Option<(Tag, usize)>> {
        let Some(header) = Id3v2Header::parse(bytes) else {
            return Ok(None);
        };
        let tag = Tag::read_from2(Cursor::new(bytes))?;
        Ok(Some((tag, header.total_len().min(bytes.len()))))
    }

    fn value(&self, field: Field, slots: &[String]) -> Option<FieldValue> {
        slots_to_value(field, slots, Format::Id3v2, &self.ctx)
    }

    fn metadata_from(&self, tag: &Tag) -> UnifiedMetadata {
        let mut out = UnifiedMetadata::new();
        let mut put = |field: Field, value: Option<FieldValue>| {
            if value.is_some() {
                out.insert(field, value);
            }
        };

        for (field, id) in TEXT_FRAMES {
            put(*field, self.value(*field, &text_slots(tag, id)));
        }

        let (track, _) = parse_slash_pair_u32(text_frame(tag, "TRCK").as_deref());
        put(Field::TrackNumber, track.map(FieldValue::Integer));
        put(Field::ReleaseDate, read_date(tag).map(FieldValue::Text));

        let rating = tag
            .frames()
            .find_map(|f| match f.content() {
                Content::Popularimeter(p) => Some(u32::from(p.rating)),
                _ => None,
            })
            .and_then(|raw| decode_rating(raw, Format::Id3v2, &self.ctx));
        put(Field::Rating, rating.map(FieldValue::Integer));

        let comment = tag
            .comments()
            .find(|c| c.description.is_empty())
            .or_else(|| tag.comments().next())
            .map(|c| vec![c.text.clone()])
            .unwrap_or_default();
        put(Field::Comment, self.value(Field::Comment, &comment));

        let lyrics = tag.lyrics().next().map(|l| vec![l.text.clone()]).unwrap_or_default();
        put(Field::Lyrics, self.value(Field::Lyrics, &lyrics));

        let gain = tag
            .extended_texts()
            .find(|t| t.description.eq_ignore_ascii_case(REPLAYGAIN_DESC))
            .map(|t| vec![t.value.clone()])
            .unwrap_or_default();
        put(Field::ReplayGain, self.value(Field::ReplayGain, &gain));

        out
    }

    fn apply(&self, tag: &mut Tag, field: Field, value: Option<&FieldValue>) -> Result<()> {
        let slots = value_to_slots(field, value, Format::Id3v2, &self.ctx)?;

        if let Some((_, id)) = TEXT_FRAMES.iter().find(|(f, _)| *f == field) {
            set_text_slots(tag, id, &slots);
            return Ok(());
        }

        match field {
            Field::TrackNumber => {
                let (_, total) = parse_slash_pair_u32(text_frame(tag, "TRCK").as_deref());
                let n = slots.first().and_then(|s| s.parse::<u32>().ok());
                set_slash_pair(tag, "TRCK", n, total);
            }
            Field::ReleaseDate => set_date(tag, slots.first().map(String::as_str), self.ctx.id3v2_version),
            Field::Rating => {
                let _ = tag.remove("POPM");
                if let Some(raw) = slots.first().and_then(|s| s.parse::<u8>().ok()) {
                    let popm = Popularimeter {
                        user: POPM_USER.to_string(),
                        rating: raw,
                        counter: 0,
                    };
                    tag.add_frame(Frame::with_content("POPM", Content::Popularimeter(popm)));
                }
            }
            Field::Comment => {
                tag.remove_comment(Some(""), None);
                if let Some(text) = slots.first() {
                    tag.add_frame(Comment {
                        lang: "eng".to_string(),
                        description: String::new(),
                        text: text.clone(),
                    });
                }
            }
            Field::Lyrics => {
                let _ = tag.remove("USLT");
                if let Some(text) = slots.first() {
                    tag.add_frame(Lyrics {
                        lang: "eng".to_string(),
                        description: String::new(),
                        text: text.clone(),
                    });
                }
            }
            Field::ReplayGain => {
                tag.remove_extended_text(Some(REPLAYGAIN_DESC), None);
                if let Some(gain) = slots.first() {
                    let txxx = ExtendedText {
                        description: REPLAYGAIN_DESC.to_string(),
                        value: gain.clone(),
                    };
                    tag.add_frame(Frame::with_content("TXXX", Content::ExtendedText(txxx)));
                }
            }
            _ => {}
        }
        Ok(())
    }
}

impl TagAdapter for Id3v2Adapter<'_> {
    fn format(&self) -> Format {
        Format::Id3v2
    }

    fn read_all(&self) -> Result<UnifiedMetadata> {
        let bytes = self.file.read_bytes()?;
        Ok(match self.load(&bytes)? {
            Some((tag, _)) => self.metadata_from(&tag),
            None => UnifiedMetadata::new(),
        })
    }

    fn write(&self, metadata: &UnifiedMetadata) -> Result<()> {
        check_writable(Format::Id3v2, metadata, &self.ctx)?;

        let bytes = self.file.read_bytes()?;
        let (mut tag, tag_len) = self.load(&bytes)?.unwrap_or_else(|| (Tag::new(), 0));

        for (field, value) in metadata.iter() {
            self.apply(&mut tag, field, value)?;
        }
        if !metadata.contains(Field::ReleaseDate) {
            // re-home an existing date into the frames of the version being written
            let date = read_date(&tag);
            set_date(&mut tag, date.as_deref(), self.ctx.id3v2_version);
        }

        let mut out = Vec::with_capacity(bytes.len() + 1024);
        if tag.frames().next().is_some() {
            tag.write_to(&mut out, version(self.ctx.id3v2_version))?;
        }
        out.extend_from_slice(&bytes[tag_len..]);

        tracing::debug!(
            path = %self.file.path().display(),
            version = self.ctx.id3v2_version.as_str(),
            "writing ID3v2 tag"
        );
        self.file.write_bytes(&out)
    }

    fn delete_all(&self) -> Result<bool> {
        let bytes = self.file.read_bytes()?;
        let Some(header) = Id3v2Header::parse(&bytes) else {
            return Ok(false);
        };
        let len = header.total_len().min(bytes.len());
        self.file.write_bytes(&bytes[len..])?;
        Ok(true)
    }

    fn header_info(&self) -> Result<HeaderInfo> {
        let bytes = self.file.read_bytes()?;
        let Some(header) = Id3v2Header::parse(&bytes) else {
            return Ok(HeaderInfo::absent(Format::Id3v2));
        };
        let entries = match Tag::read_from2(Cursor::new(bytes.as_slice())) {
            Ok(tag) => tag.frames().map(|f| f.id().to_string()).collect(),
            Err(e) => {
                tracing::debug!(error = %e, "ID3v2 frames could not be listed");
                Vec::new()
            }
        };
        Ok(HeaderInfo {
            format: Format::Id3v2,
            present: true,
            version: Some(format!("2.{}.{}", header.major, header.revision)),
            size: header.total_len() as u64,
            flags: header.flag_names(),
            entries,
            offset: Some(0),
        })
    }
}

fn version(v: Id3v2Version) -> Version {
    match v {
        Id3v2Version::V23 => Version::Id3v23,
        Id3v2Version::V24 => Version::Id3v24,
    }
}

fn text_frame(tag: &Tag, id: &str) -> Option<String> {
    match tag.get(id)?.content() {
        Content::Text(s) => Some(s.clone()),
        _ => None,
    }
}

/// Physical slots of a text frame: v2.4 separates values with NUL.
///
/// Older tags hold one delimited string, but `id3` turns the `/` in
/// multi-value frames into NUL on load; those pieces are glued back into
/// the single slot that was stored.
fn text_slots(tag: &Tag, id: &str) -> Vec<String> {
    let Some(text) = text_frame(tag, id) else {
        return Vec::new();
    };
    match tag.version() {
        Version::Id3v24 => text.split('\0').map(str::to_string).collect(),
        _ => vec![text.replace('\0', "/")],
    }
}

fn set_text_slots(tag: &mut Tag, id: &str, slots: &[String]) {
    if slots.is_empty() {
        let _ = tag.remove(id);
    } else {
        tag.set_text(id, slots.join("\0"));
    }
}

/// TRCK as "n" or "n/total" (or removed)
fn set_slash_pair(tag: &mut Tag, id: &str, n: Option<u32>, total: Option<u32>) {
    match n {
        None => {
            let _ = tag.remove(id);
        }
        Some(n) => match total {
            Some(t) => tag.set_text(id, format!("{n}/{t}")),
            None => tag.set_text(id, n.to_string()),
        },
    }
}

/// `YYYY` or `YYYY-MM-DD` from TDRC, or from TYER + TDAT (DDMM).
fn read_date(tag: &Tag) -> Option<String> {
    if let Some(tdrc) = text_frame(tag, "TDRC") {
        return normalize_date(&tdrc);
    }
    let year = text_frame(tag, "TYER").and_then(|y| normalize_date(&y))?;
    let ddmm = text_frame(tag, "TDAT").filter(|d| d.len() == 4 && d.bytes().all(|b| b.is_ascii_digit()));
    Some(match ddmm {
        Some(d) => format!("{year}-{}-{}", &d[2..4], &d[..2]),
        None => year,
    })
}

fn normalize_date(s: &str) -> Option<String> {
    let s = s.trim();
    if s.len() >= 10 && super::validate_date(&s[..10]).is_ok() {
        Some(s[..10].to_string())
    } else if s.len() >= 4 && s.is_char_boundary(4) && s[..4].bytes().all(|b| b.is_ascii_digit()) {
        Some(s[..4].to_string())
    } else {
        None
    }
}

fn set_date(tag: &mut Tag, date: Option<&str>, v: Id3v2Version) {
    for id in ["TDRC", "TYER", "TDAT"] {
        let _ = tag.remove(id);
    }
    let Some(date) = date else { return };
    match v {
        Id3v2Version::V24 => tag.set_text("TDRC", date),
        Id3v2Version::V23 => {
            tag.set_text("TYER", &date[..4.min(date.len())]);
            if date.len() == 10 {
                tag.set_text("TDAT", format!("{}{}", &date[8..10], &date[5..7]));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mp3(dir: &tempfile::TempDir) -> AudioFile {
        let path = dir.path().join("t.mp3");
        std::fs::write(&path, [0xffu8, 0xfb, 0x90, 0x00].repeat(64)).unwrap();
        AudioFile::open(&path).unwrap()
    }

    fn ctx(v: Id3v2Version) -> AdapterContext {
        AdapterContext {
            rating_max: Some(10),
            id3v2_version: v,
        }
    }

    #[test]
    fn writes_before_audio_and_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let file = mp3(&dir);
        let audio = file.read_bytes().unwrap();
        let adapter = Id3v2Adapter::new(&file, ctx(Id3v2Version::V23));

        let mut m = UnifiedMetadata::new();
        m.set(Field::Title, "Night Drive")
            .set(Field::Rating, 7u32)
            .set(Field::ReleaseDate, "2003-08-14")
            .set(Field::TrackNumber, 4u32)
            .set(Field::Comment, "first pressing")
            .set(Field::ReplayGain, "-6.20 dB");
        adapter.write(&m).unwrap();

        let bytes = file.read_bytes().unwrap();
        assert_eq!(&bytes[..3], b"ID3");
        assert_eq!(bytes[3], 3);
        assert!(bytes.ends_with(&audio));

        let back = adapter.read_all().unwrap();
        assert_eq!(back.get(Field::Title), Some(&FieldValue::from("Night Drive")));
        assert_eq!(back.get(Field::Rating), Some(&FieldValue::Integer(7)));
        assert_eq!(back.get(Field::ReleaseDate), Some(&FieldValue::from("2003-08-14")));
        assert_eq!(back.get(Field::TrackNumber), Some(&FieldValue::Integer(4)));
        assert_eq!(back.get(Field::Comment), Some(&FieldValue::from("first pressing")));
        assert_eq!(back.get(Field::ReplayGain), Some(&FieldValue::from("-6.20 dB")));
    }

    #[test]
    fn v24_keeps_list_values_in_separate_slots() {
        let dir = tempfile::tempdir().unwrap();
        let file = mp3(&dir);
        let adapter = Id3v2Adapter::new(&file, ctx(Id3v2Version::V24));

        let mut m = UnifiedMetadata::new();
        m.set(Field::Artists, vec!["AC/DC", "Artist Two"]);
        adapter.write(&m).unwrap();

        let back = adapter.read_all().unwrap();
        assert_eq!(
            back.get(Field::Artists),
            Some(&FieldValue::from(vec!["AC/DC", "Artist Two"]))
        );
        let info = adapter.header_info().unwrap();
        assert_eq!(info.version.as_deref(), Some("2.4.0"));
        assert!(info.entries.contains(&"TPE1".to_string()));
    }

    #[test]
    fn v23_list_keeps_slashes_inside_values() {
        let dir = tempfile::tempdir().unwrap();
        let file = mp3(&dir);
        let adapter = Id3v2Adapter::new(&file, ctx(Id3v2Version::V23));

        let mut m = UnifiedMetadata::new();
        m.set(Field::Artists, vec!["Slash/Name", "Plain"])
            .set(Field::Composers, vec!["One/Two"]);
        adapter.write(&m).unwrap();

        let back = adapter.read_all().unwrap();
        assert_eq!(
            back.get(Field::Artists),
            Some(&FieldValue::from(vec!["Slash/Name", "Plain"]))
        );
        // a lone value is still one slot, so "/" splits it
        assert_eq!(
            back.get(Field::Composers),
            Some(&FieldValue::from(vec!["One", "Two"]))
        );
    }

    #[test]
    fn popm_uses_wide_non_proportional_table() {
        let dir = tempfile::tempdir().unwrap();
        let file = mp3(&dir);
        let adapter = Id3v2Adapter::new(&file, ctx(Id3v2Version::V23));
        let mut m = UnifiedMetadata::new();
        m.set(Field::Rating, 2u32);
        adapter.write(&m).unwrap();

        let tag = Tag::read_from_path(file.path()).unwrap();
        let popm = tag
            .frames()
            .find_map(|f| match f.content() {
                Content::Popularimeter(p) => Some(p.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(popm.rating, 1);
        assert_eq!(popm.user, POPM_USER);
    }

    #[test]
    fn track_total_survives_number_change() {
        let dir = tempfile::tempdir().unwrap();
        let file = mp3(&dir);
        let mut tag = Tag::new();
        tag.set_text("TRCK", "3/12");
        tag.write_to_path(file.path(), Version::Id3v23).unwrap();

        let adapter = Id3v2Adapter::new(&file, ctx(Id3v2Version::V23));
        let mut m = UnifiedMetadata::new();
        m.set(Field::TrackNumber, 5u32);
        adapter.write(&m).unwrap();

        let tag = Tag::read_from_path(file.path()).unwrap();
        assert_eq!(text_frame(&tag, "TRCK").as_deref(), Some("5/12"));
    }

    #[test]
    fn delete_leaves_audio_only() {
        let dir = tempfile::tempdir().unwrap();
        let file = mp3(&dir);
        let audio = file.read_bytes().unwrap();
        let adapter = Id3v2Adapter::new(&file, ctx(Id3v2Version::V23));
        let mut m = UnifiedMetadata::new();
        m.set(Field::Album, "Gone Soon");
        adapter.write(&m).unwrap();

        assert!(adapter.delete_all().unwrap());
        assert_eq!(file.read_bytes().unwrap(), audio);
        assert!(!adapter.delete_all().unwrap());
        assert!(!adapter.header_info().unwrap().present);
    }

    #[test]
    fn dates_normalize() {
        assert_eq!(normalize_date("2001-02-03T10:00").as_deref(), Some("2001-02-03"));
        assert_eq!(normalize_date("1987").as_deref(), Some("1987"));
        assert_eq!(normalize_date("circa"), None);
    }
}
