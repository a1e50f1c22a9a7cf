//! core/flac.rs
//!
//! FLAC stream-level helpers: find the `fLaC` marker (which is not always at
//! byte 0, some tools prepend an ID3v2 tag), walk metadata block headers,
//! read the STREAMINFO MD5, and check / repair it with the external `flac`
//! tool.
//!
//! Repair never touches the original file. It writes `<stem>.repaired.flac`
//! next to it and returns that path.

use std::ffi::OsStr;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use serde::Serialize;

use super::audio_file::AudioFile;
use super::error::{MetaError, Result};
use super::options::FlacToolConfig;
use super::tags::util::Id3v2Header;

pub const MARKER: &[u8; 4] = b"fLaC";

/// marker (4) + block header (1 type byte + 3 length bytes) + 18 bytes of
/// STREAMINFO fields before the MD5
pub const MD5_OFFSET: usize = 4 + 4 + 18;
pub const MD5_LEN: usize = 16;

const STREAMINFO: u8 = 0;
pub(crate) const VORBIS_COMMENT: u8 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChecksumState {
    Valid,
    Mismatched,
    /// All sixteen bytes are zero: the encoder never filled it in
    Unset,
}

/// One metadata block header, positions relative to the start of the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
    pub kind: u8,
    pub is_last: bool,
    /// Offset of the 4-byte block header
    pub offset: usize,
    /// Body length in bytes
    pub length: usize,
}

impl BlockHeader {
    pub fn end(&self) -> usize {
        self.offset + 4 + self.length
    }
}

/// Locate the stream marker.
///
/// A leading ID3v2 tag is skipped by its declared size first so marker-like
/// bytes inside its frames can't match; the scan then runs forward.
pub fn find_marker(bytes: &[u8]) -> Option<usize> {
    let start = Id3v2Header::parse(bytes)
        .map(|h| h.total_len())
        .filter(|len| *len <= bytes.len())
        .unwrap_or(0);

    bytes[start..]
        .windows(MARKER.len())
        .position(|w| w == MARKER)
        .map(|p| p + start)
        .or_else(|| {
            // declared ID3 size was wrong; fall back to a scan from zero
            bytes.windows(MARKER.len()).position(|w| w == MARKER)
        })
}

/// Walk block headers from the marker until the last-block flag.
pub fn metadata_blocks(bytes: &[u8], marker: usize) -> std::result::Result<Vec<BlockHeader>, String> {
    let mut out = Vec::new();
    let mut pos = marker + MARKER.len();

    loop {
        let Some(header) = bytes.get(pos..pos + 4) else {
            return Err(format!("metadata block header truncated at byte {pos}"));
        };
        let block = BlockHeader {
            kind: header[0] & 0x7f,
            is_last: header[0] & 0x80 != 0,
            offset: pos,
            length: u32::from_be_bytes([0, header[1], header[2], header[3]]) as usize,
        };
        if block.end() > bytes.len() {
            return Err(format!("metadata block at byte {pos} runs past end of file"));
        }
        out.push(block);
        if block.is_last {
            return Ok(out);
        }
        pos = block.end();
    }
}

/// Where the audio frames begin.
pub fn metadata_end(bytes: &[u8], marker: usize) -> std::result::Result<usize, String> {
    metadata_blocks(bytes, marker)?
        .last()
        .map(BlockHeader::end)
        .ok_or_else(|| "no metadata blocks".to_string())
}

/// The MD5 stored in STREAMINFO.
pub fn stored_checksum(bytes: &[u8]) -> std::result::Result<[u8; MD5_LEN], String> {
    let marker = find_marker(bytes).ok_or_else(|| "no fLaC marker found".to_string())?;
    let kind = bytes
        .get(marker + MARKER.len())
        .map(|b| b & 0x7f)
        .ok_or_else(|| "file ends after fLaC marker".to_string())?;
    if kind != STREAMINFO {
        return Err(format!("first metadata block is type {kind}, expected STREAMINFO"));
    }

    let start = marker + MD5_OFFSET;
    let slice = bytes
        .get(start..start + MD5_LEN)
        .ok_or_else(|| "STREAMINFO truncated before MD5".to_string())?;
    let mut md5 = [0u8; MD5_LEN];
    md5.copy_from_slice(slice);
    Ok(md5)
}

pub fn is_unset(md5: &[u8; MD5_LEN]) -> bool {
    md5.iter().all(|b| *b == 0)
}

/// Valid / mismatched / unset.
///
/// Unset is decided from the stored bytes alone. Otherwise `flac --test`
/// decodes the stream and recomputes the MD5.
pub fn checksum_state(file: &AudioFile, tool: &FlacToolConfig) -> Result<ChecksumState> {
    let bytes = file.read_bytes()?;
    let md5 = stored_checksum(&bytes).map_err(|r| MetaError::corrupted(file.path(), r))?;
    if is_unset(&md5) {
        tracing::debug!(path = %file.path().display(), "FLAC MD5 is unset");
        return Ok(ChecksumState::Unset);
    }

    let output = run_flac(
        tool,
        &[
            OsStr::new("--test"),
            OsStr::new("--silent"),
            file.path().as_os_str(),
        ],
    )?;
    if output.status.success() {
        return Ok(ChecksumState::Valid);
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    if stderr.contains("MD5 signature mismatch") {
        Ok(ChecksumState::Mismatched)
    } else {
        Err(MetaError::ExternalTool(format!(
            "flac --test failed: {}",
            stderr.trim()
        )))
    }
}

/// Path the repaired copy of `path` is written to.
pub fn repaired_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "repaired".to_string());
    path.with_file_name(format!("{stem}.repaired.flac"))
}

/// Re-encode through `flac` so it computes a fresh MD5, then strip any
/// ID3v1 trailer from the result. Returns the new file's path.
pub fn repair_checksum(file: &AudioFile, tool: &FlacToolConfig) -> Result<PathBuf> {
    let bytes = file.read_bytes()?;
    if find_marker(&bytes).is_none() {
        return Err(MetaError::corrupted(file.path(), "no fLaC marker found"));
    }

    let out = repaired_path(file.path());
    let output = run_flac(
        tool,
        &[
            OsStr::new("--force"),
            OsStr::new("--silent"),
            OsStr::new("--output-name"),
            out.as_os_str(),
            file.path().as_os_str(),
        ],
    )?;
    if !output.status.success() {
        let _ = std::fs::remove_file(&out);
        return Err(MetaError::ExternalTool(format!(
            "flac re-encode failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    let repaired = AudioFile::open(&out)?;
    let mut new_bytes = repaired.read_bytes()?;
    if strip_id3v1_trailer(&mut new_bytes) {
        tracing::debug!(path = %out.display(), "removed ID3v1 trailer added by re-encode");
        repaired.write_bytes(&new_bytes)?;
    }

    tracing::info!(from = %file.path().display(), to = %out.display(), "FLAC checksum repaired");
    Ok(out)
}

/// Drop a trailing 128-byte `TAG` block. Returns whether one was removed.
pub(crate) fn strip_id3v1_trailer(bytes: &mut Vec<u8>) -> bool {
    if bytes.len() >= 128 && &bytes[bytes.len() - 128..bytes.len() - 125] == b"TAG" {
        bytes.truncate(bytes.len() - 128);
        true
    } else {
        false
    }
}

/// Run the flac binary with a wall-clock timeout.
fn run_flac(tool: &FlacToolConfig, args: &[&OsStr]) -> Result<Output> {
    let binary = tool.resolve_binary()?;
    let mut command = Command::new(&binary);
    command.args(args);
    run_with_deadline(command, tool.timeout())
}

/// Run `command` to completion or until `timeout` passes.
///
/// Both pipes are drained on their own threads while the child runs so a
/// chatty process never stalls on a full pipe.
fn run_with_deadline(mut command: Command, timeout: Duration) -> Result<Output> {
    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| MetaError::ExternalTool(format!("failed to execute flac: {e}")))?;

    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    let deadline = Instant::now() + timeout;
    let status = loop {
        match child.try_wait()? {
            Some(status) => break status,
            None if Instant::now() >= deadline => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(MetaError::ExternalTool(format!(
                    "flac timed out after {}s",
                    timeout.as_secs()
                )));
            }
            None => thread::sleep(Duration::from_millis(20)),
        }
    };

    Ok(Output {
        status,
        stdout: collect(stdout)?,
        stderr: collect(stderr)?,
    })
}

type Drain = Option<thread::JoinHandle<std::io::Result<Vec<u8>>>>;

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Drain {
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            pipe.read_to_end(&mut buf)?;
            Ok(buf)
        })
    })
}

fn collect(handle: Drain) -> Result<Vec<u8>> {
    match handle {
        Some(handle) => handle
            .join()
            .map_err(|_| MetaError::ExternalTool("flac output reader panicked".to_string()))?
            .map_err(Into::into),
        None => Ok(Vec::new()),
    }
}
