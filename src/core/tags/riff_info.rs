//! core/tags/riff_info.rs
//! RIFF `LIST`/`INFO` entries of a WAVE file, via the raw chunk editor.

use super::super::audio_file::AudioFile;
use super::super::error::Result;
use super::super::fields::{Field, Format};
use super::super::riff::{InfoList, RiffInfoEditor};
use super::super::types::{HeaderInfo, UnifiedMetadata};
use super::{AdapterContext, TagAdapter, check_writable, slots_to_value, value_to_slots};

fn key_for(field: Field) -> Option<&'static [u8; 4]> {
    Some(match field {
        Field::Title => b"INAM",
        Field::Artists => b"IART",
        Field::Album => b"IPRD",
        Field::AlbumArtists => b"IAAR",
        Field::GenresNames => b"IGNR",
        Field::Rating => b"IRTD",
        Field::Language => b"ILNG",
        Field::ReleaseDate => b"ICRD",
        Field::TrackNumber => b"IPRT",
        Field::Composers => b"IMUS",
        Field::Copyright => b"ICOP",
        Field::Comment => b"ICMT",
        Field::ArchivalLocation => b"IARL",
        _ => return None,
    })
}

pub(crate) struct RiffInfoAdapter<'a> {
    file: &'a AudioFile,
    ctx: AdapterContext,
}

impl<'a> RiffInfoAdapter<'a> {
    pub(crate) fn new(file: &'a AudioFile, ctx: AdapterContext) -> Self {
        Self { file, ctx }
    }

    fn editor(&self) -> Result<RiffInfoEditor> {
        RiffInfoEditor::from_bytes(self.file.path(), self.file.read_bytes()?)
    }
}

impl TagAdapter for RiffInfoAdapter<'_> {
    fn format(&self) -> Format {
        Format::RiffInfo
    }

    fn read_all(&self) -> Result<UnifiedMetadata> {
        let mut out = UnifiedMetadata::new();
        let Some(list) = self.editor()?.info() else {
            return Ok(out);
        };
        for field in Format::RiffInfo.supported_fields() {
            let Some(key) = key_for(*field) else { continue };
            let slots = list.values(key);
            if let Some(value) = slots_to_value(*field, &slots, Format::RiffInfo, &self.ctx) {
                out.insert(*field, Some(value));
            }
        }
        Ok(out)
    }

    fn write(&self, metadata: &UnifiedMetadata) -> Result<()> {
        check_writable(Format::RiffInfo, metadata, &self.ctx)?;

        let mut editor = self.editor()?;
        let mut list = editor.info().unwrap_or_else(InfoList::new);
        for (field, value) in metadata.iter() {
            let Some(key) = key_for(field) else { continue };
            let slots = value_to_slots(field, value, Format::RiffInfo, &self.ctx)?;
            list.set(key, &slots);
        }
        editor.replace_info(&list);
        self.file.write_bytes(editor.bytes())
    }

    fn delete_all(&self) -> Result<bool> {
        let mut editor = self.editor()?;
        if !editor.remove_info() {
            return Ok(false);
        }
        self.file.write_bytes(editor.bytes())?;
        Ok(true)
    }

    fn header_info(&self) -> Result<HeaderInfo> {
        let editor = self.editor()?;
        let (Some(span), Some(list)) = (editor.info_span(), editor.info()) else {
            return Ok(HeaderInfo::absent(Format::RiffInfo));
        };
        Ok(HeaderInfo {
            format: Format::RiffInfo,
            present: true,
            version: None,
            size: (span.end - span.start) as u64,
            flags: Vec::new(),
            entries: list.entries().iter().map(|e| e.key_str()).collect(),
            offset: Some(span.start as u64),
        })
    }
}
