//! Small synthetic media files. None of them carry real audio frames except
//! the WAV, which is produced by `hound`.

use std::path::PathBuf;

use tempfile::TempDir;

/// Bytes that look like MPEG frame headers; enough for tag containers.
pub fn mp3_file(dir: &TempDir, name: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, [0xffu8, 0xfb, 0x90, 0x64].repeat(256)).unwrap();
    path
}

/// `fLaC` + a last-flagged STREAMINFO carrying `md5`, then a few stand-in
/// frame bytes. Optionally preceded by an ID3v2 tag.
pub fn flac_bytes(md5: [u8; 16], with_id3v2: bool) -> Vec<u8> {
    let mut out = if with_id3v2 { id3v2_prefix() } else { Vec::new() };
    out.extend_from_slice(b"fLaC");
    out.extend_from_slice(&[0x80, 0x00, 0x00, 34]);
    out.extend_from_slice(&4096u16.to_be_bytes());
    out.extend_from_slice(&4096u16.to_be_bytes());
    out.extend_from_slice(&[0; 6]);
    out.extend_from_slice(&[0x0a, 0xc4, 0x42, 0xf0, 0, 0, 0, 0]);
    out.extend_from_slice(&md5);
    out.extend_from_slice(&[0xff, 0xf8, 0x69, 0x08, 0x00, 0x00]);
    out
}

pub fn flac_file(dir: &TempDir, name: &str, md5: [u8; 16], with_id3v2: bool) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, flac_bytes(md5, with_id3v2)).unwrap();
    path
}

/// ID3v2.3 tag with one TIT2 frame whose text contains `fLaC`.
pub fn id3v2_prefix() -> Vec<u8> {
    let text = b"\x00fLaC in the title";
    let mut frame = Vec::new();
    frame.extend_from_slice(b"TIT2");
    frame.extend_from_slice(&(text.len() as u32).to_be_bytes());
    frame.extend_from_slice(&[0, 0]);
    frame.extend_from_slice(text);

    let mut out = Vec::new();
    out.extend_from_slice(b"ID3\x03\x00\x00");
    out.extend_from_slice(&[0, 0, 0, frame.len() as u8]);
    out.extend_from_slice(&frame);
    out
}

/// Half a second of a 440 Hz tone, 16-bit mono at 8 kHz.
pub fn wav_file(dir: &TempDir, name: &str) -> PathBuf {
    let path = dir.path().join(name);
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 8000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&path, spec).unwrap();
    for i in 0..4000 {
        let t = i as f32 / 8000.0;
        let sample = (t * 440.0 * 2.0 * std::f32::consts::PI).sin();
        writer.write_sample((sample * i16::MAX as f32 * 0.5) as i16).unwrap();
    }
    writer.finalize().unwrap();
    path
}
