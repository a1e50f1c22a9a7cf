//! core/tags/util.rs
//! Small parsing helpers shared by the format adapters.

/// Parse strings like:
/// - "3" -> (Some(3), None)
/// - "3/12" -> (Some(3), Some(12))
pub(crate) fn parse_slash_pair_u32(s: Option<&str>) -> (Option<u32>, Option<u32>) {
    let Some(s) = s else { return (None, None) };
    let s = s.trim();
    if s.is_empty() {
        return (None, None);
    }

    let mut parts = s.split('/');
    let a = parts.next().and_then(|p| p.trim().parse::<u32>().ok());
    let b = parts.next().and_then(|p| p.trim().parse::<u32>().ok());
    (a, b)
}

/// Best-effort integer from tag text.
/// Accepts "120", "120.4" (rounded), "3/12" (leading number).
pub(crate) fn parse_tag_u32(s: &str) -> Option<u32> {
    let s = s.trim();
    if let (Some(n), _) = parse_slash_pair_u32(Some(s)) {
        return Some(n);
    }
    let f = s.parse::<f64>().ok()?;
    if f.is_finite() && f >= 0.0 && f <= f64::from(u32::MAX) {
        Some(f.round() as u32)
    } else {
        None
    }
}

/// Decode a synchsafe 28-bit integer (ID3v2 header sizes).
pub(crate) fn decode_synchsafe(bytes: [u8; 4]) -> u32 {
    bytes
        .iter()
        .fold(0u32, |acc, &b| (acc << 7) | u32::from(b & 0x7f))
}

/// The 10-byte ID3v2 header at the start of `bytes`, if there is one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Id3v2Header {
    pub major: u8,
    pub revision: u8,
    pub flags: u8,
    /// Tag size excluding the 10-byte header (and footer)
    pub size: u32,
}

impl Id3v2Header {
    pub(crate) fn parse(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < 10 || &bytes[..3] != b"ID3" {
            return None;
        }
        Some(Self {
            major: bytes[3],
            revision: bytes[4],
            flags: bytes[5],
            size: decode_synchsafe([bytes[6], bytes[7], bytes[8], bytes[9]]),
        })
    }

    /// Total bytes the tag occupies, footer included.
    pub(crate) fn total_len(&self) -> usize {
        let footer = if self.flags & 0x10 != 0 { 10 } else { 0 };
        10 + self.size as usize + footer
    }

    pub(crate) fn flag_names(&self) -> Vec<String> {
        let mut out = Vec::new();
        if self.flags & 0x80 != 0 {
            out.push("unsynchronisation".to_string());
        }
        if self.flags & 0x40 != 0 {
            out.push("extended_header".to_string());
        }
        if self.flags & 0x20 != 0 {
            out.push("experimental".to_string());
        }
        if self.flags & 0x10 != 0 {
            out.push("footer".to_string());
        }
        out
    }
}

/// Decode tag bytes that may be UTF-8 or Latin-1.
pub(crate) fn decode_text_bytes(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| char::from(b)).collect(),
    }
}

/// Encode into Latin-1, replacing unrepresentable chars with '?', truncated to `len` bytes.
pub(crate) fn latin1_fixed(s: &str, len: usize) -> Vec<u8> {
    let mut out: Vec<u8> = s
        .chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .take(len)
        .collect();
    out.resize(len, 0);
    out
}
