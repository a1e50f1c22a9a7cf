//! core/riff.rs
//!
//! Raw editor for the `LIST`/`INFO` chunk of a RIFF WAVE file.
//!
//! Layout handled here (all sizes little-endian u32):
//!
//! ```text
//! "RIFF" <size> "WAVE"
//!   <chunk id> <size> <data> [pad byte if size is odd]
//!   ...
//!   "LIST" <size> "INFO"
//!     <key> <size> <value bytes> 0x00 [pad byte if size is odd]
//!     ...
//! [trailing bytes outside the RIFF chunk, e.g. an ID3v1 trailer]
//! ```
//!
//! Entries are kept in file order and the same key may appear more than once.
//! Rewrites reproduce the NUL terminator and pad bytes exactly; several
//! players refuse files where they're missing.

use std::path::{Path, PathBuf};

use super::error::{MetaError, Result};
use super::tags::util::decode_text_bytes;

const RIFF: &[u8; 4] = b"RIFF";
const WAVE: &[u8; 4] = b"WAVE";
const LIST: &[u8; 4] = b"LIST";
const INFO: &[u8; 4] = b"INFO";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoEntry {
    pub key: [u8; 4],
    pub value: String,
}

impl InfoEntry {
    pub fn new(key: &[u8; 4], value: impl Into<String>) -> Self {
        Self {
            key: *key,
            value: value.into(),
        }
    }

    pub fn key_str(&self) -> String {
        String::from_utf8_lossy(&self.key).into_owned()
    }

    /// Size field value: text bytes plus the NUL terminator.
    fn data_len(&self) -> usize {
        self.value.len() + 1
    }
}

/// Ordered INFO entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InfoList {
    entries: Vec<InfoEntry>,
}

impl InfoList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[InfoEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every value stored under `key`, in file order.
    pub fn values(&self, key: &[u8; 4]) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| &e.key == key)
            .map(|e| e.value.as_str())
            .collect()
    }

    pub fn push(&mut self, key: &[u8; 4], value: impl Into<String>) {
        self.entries.push(InfoEntry::new(key, value));
    }

    /// Replace every `key` entry with `values`, one entry each.
    ///
    /// New entries take the position of the first old one; an unseen key is
    /// appended. An empty `values` removes the key.
    pub fn set(&mut self, key: &[u8; 4], values: &[String]) {
        let position = self.entries.iter().position(|e| &e.key == key);
        self.entries.retain(|e| &e.key != key);
        let at = position.unwrap_or(self.entries.len()).min(self.entries.len());
        for (i, value) in values.iter().enumerate() {
            self.entries.insert(at + i, InfoEntry::new(key, value.clone()));
        }
    }

    pub fn remove(&mut self, key: &[u8; 4]) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| &e.key != key);
        before != self.entries.len()
    }

    /// Full `LIST` chunk bytes, header included.
    pub fn encode(&self) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(INFO);
        for entry in &self.entries {
            let len = entry.data_len();
            body.extend_from_slice(&entry.key);
            body.extend_from_slice(&(len as u32).to_le_bytes());
            body.extend_from_slice(entry.value.as_bytes());
            body.push(0);
            if len % 2 == 1 {
                body.push(0);
            }
        }

        let mut out = Vec::with_capacity(body.len() + 8);
        out.extend_from_slice(LIST);
        out.extend_from_slice(&(body.len() as u32).to_le_bytes());
        out.extend_from_slice(&body);
        out
    }

    fn decode(data: &[u8]) -> Self {
        let mut entries = Vec::new();
        let mut pos = 0;
        while pos + 8 <= data.len() {
            let mut key = [0u8; 4];
            key.copy_from_slice(&data[pos..pos + 4]);
            let len = read_u32(data, pos + 4) as usize;
            let start = pos + 8;
            let end = (start + len).min(data.len());
            let raw = &data[start..end];
            let text = match raw.iter().position(|b| *b == 0) {
                Some(nul) => &raw[..nul],
                None => raw,
            };
            entries.push(InfoEntry {
                key,
                value: decode_text_bytes(text),
            });
            pos = start + len + (len & 1);
        }
        Self { entries }
    }
}

/// Byte range of a chunk, header and pad byte included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkSpan {
    pub start: usize,
    pub end: usize,
}

/// A WAVE file's bytes plus the positions the editor cares about.
#[derive(Debug, Clone)]
pub struct RiffInfoEditor {
    path: PathBuf,
    bytes: Vec<u8>,
    /// One past the last byte covered by the RIFF size field
    riff_end: usize,
    info: Option<ChunkSpan>,
}

impl RiffInfoEditor {
    pub fn from_bytes(path: &Path, bytes: Vec<u8>) -> Result<Self> {
        if bytes.len() < 12 || &bytes[..4] != RIFF || &bytes[8..12] != WAVE {
            return Err(MetaError::corrupted(path, "not a RIFF WAVE file"));
        }
        let declared = read_u32(&bytes, 4) as usize;
        let riff_end = (8 + declared).min(bytes.len());

        let mut info = None;
        let mut pos = 12;
        while pos + 8 <= riff_end {
            let size = read_u32(&bytes, pos + 4) as usize;
            let data_start = pos + 8;
            let end = (data_start + size + (size & 1)).min(riff_end);
            if info.is_none()
                && &bytes[pos..pos + 4] == LIST
                && bytes.get(data_start..data_start + 4) == Some(INFO.as_slice())
            {
                info = Some(ChunkSpan { start: pos, end });
            }
            if data_start + size > riff_end {
                tracing::debug!(path = %path.display(), chunk_at = pos, "chunk runs past RIFF end");
                break;
            }
            pos = end;
        }

        Ok(Self {
            path: path.to_path_buf(),
            bytes,
            riff_end,
            info,
        })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn info_span(&self) -> Option<ChunkSpan> {
        self.info
    }

    /// Parsed INFO entries, `None` when the file has no INFO list.
    pub fn info(&self) -> Option<InfoList> {
        let span = self.info?;
        let size = read_u32(&self.bytes, span.start + 4) as usize;
        let data_end = (span.start + 8 + size).min(span.end).max(span.start + 12);
        Some(InfoList::decode(&self.bytes[span.start + 12..data_end]))
    }

    /// Write `list` in place of the current INFO chunk (or append one at the
    /// end of the RIFF chunk). An empty list removes the chunk.
    pub fn replace_info(&mut self, list: &InfoList) {
        if list.is_empty() {
            self.remove_info();
            return;
        }
        let encoded = list.encode();
        let start = match self.info {
            Some(span) => {
                self.splice(span.start, span.end, &encoded);
                span.start
            }
            None => {
                let at = self.riff_end;
                // chunks start on even offsets
                let pad: &[u8] = if at % 2 == 1 { &[0] } else { &[] };
                self.splice(at, at, &[pad, encoded.as_slice()].concat());
                at + pad.len()
            }
        };
        self.info = Some(ChunkSpan {
            start,
            end: start + encoded.len(),
        });
    }

    /// Structurally remove the INFO chunk. Returns whether one existed.
    pub fn remove_info(&mut self) -> bool {
        let Some(span) = self.info.take() else {
            return false;
        };
        self.splice(span.start, span.end, &[]);
        true
    }

    fn splice(&mut self, start: usize, end: usize, with: &[u8]) {
        self.bytes.splice(start..end, with.iter().copied());
        let removed = end - start;
        self.riff_end = self.riff_end + with.len() - removed;
        let riff_size = (self.riff_end - 8) as u32;
        self.bytes[4..8].copy_from_slice(&riff_size.to_le_bytes());
        tracing::debug!(path = %self.path.display(), riff_size, "rewrote RIFF INFO list");
    }
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    let mut b = [0u8; 4];
    if let Some(slice) = bytes.get(at..at + 4) {
        b.copy_from_slice(slice);
    }
    u32::from_le_bytes(b)
}


#[cfg(test)]
mod tests {
    use super::test_support::minimal_wav;
    use super::*;

    fn editor(bytes: Vec<u8>) -> RiffInfoEditor {
        RiffInfoEditor::from_bytes(Path::new("t.wav"), bytes).unwrap()
    }

    #[test]
    fn rejects_non_riff() {
        let err = RiffInfoEditor::from_bytes(Path::new("x.wav"), b"ID3 nope".to_vec()).unwrap_err();
        assert!(matches!(err, MetaError::Corrupted { .. }));
    }

    #[test]
    fn encode_is_byte_exact() {
        let mut list = InfoList::new();
        list.push(b"INAM", "Song"); // 4 + NUL = 5 -> padded
        list.push(b"IART", "Abc"); // 3 + NUL = 4 -> no pad
        let bytes = list.encode();

        let expected: Vec<u8> = [
            b"LIST".as_slice(),
            &30u32.to_le_bytes(),
            b"INFO",
            b"INAM",
            &5u32.to_le_bytes(),
            b"Song\0\0",
            b"IART",
            &4u32.to_le_bytes(),
            b"Abc\0",
        ]
        .concat();
        assert_eq!(bytes, expected);
    }

    #[test]
    fn append_then_read_back() {
        let original = minimal_wav(11);
        let mut ed = editor(original.clone());
        assert!(ed.info().is_none());

        let mut list = InfoList::new();
        list.push(b"IART", "One");
        list.push(b"IART", "Two");
        list.push(b"INAM", "Title");
        ed.replace_info(&list);

        let bytes = ed.into_bytes();
        let declared = u32::from_le_bytes(bytes[4..8].try_into().unwrap()) as usize;
        assert_eq!(declared + 8, bytes.len());
        assert_eq!(&bytes[8..original.len()], &original[8..]);

        let again = editor(bytes);
        let info = again.info().unwrap();
        assert_eq!(info.values(b"IART"), vec!["One", "Two"]);
        assert_eq!(info.values(b"INAM"), vec!["Title"]);
    }

    #[test]
    fn replace_keeps_trailing_bytes_outside_riff() {
        let mut bytes = minimal_wav(4);
        let riff_len = bytes.len();
        bytes.extend_from_slice(b"TAGtrailer");

        let mut ed = editor(bytes);
        let mut list = InfoList::new();
        list.push(b"ICMT", "hello");
        ed.replace_info(&list);
        let out = ed.into_bytes();

        assert!(out.ends_with(b"TAGtrailer"));
        let declared = u32::from_le_bytes(out[4..8].try_into().unwrap()) as usize;
        assert_eq!(declared + 8, out.len() - b"TAGtrailer".len());
        assert!(declared + 8 > riff_len);
    }

    #[test]
    fn set_replaces_in_place_and_remove_drops_chunk() {
        let mut list = InfoList::new();
        list.push(b"INAM", "Old");
        list.push(b"IART", "A");
        list.push(b"ICMT", "c");
        list.set(b"IART", &["X".to_string(), "Y".to_string()]);
        let keys: Vec<String> = list.entries().iter().map(InfoEntry::key_str).collect();
        assert_eq!(keys, vec!["INAM", "IART", "IART", "ICMT"]);

        let original = minimal_wav(6);
        let mut ed = editor(original.clone());
        ed.replace_info(&list);
        assert!(ed.info_span().is_some());
        assert!(ed.remove_info());
        assert_eq!(ed.bytes(), &original[..]);
        assert!(!ed.remove_info());
    }

    #[test]
    fn latin1_values_decode() {
        let mut list_bytes = b"INFO".to_vec();
        list_bytes.extend_from_slice(b"INAM");
        list_bytes.extend_from_slice(&5u32.to_le_bytes());
        list_bytes.extend_from_slice(b"caf\xe9\0\0");
        let list = InfoList::decode(&list_bytes[4..]);
        assert_eq!(list.values(b"INAM"), vec!["café"]);
    }
}
