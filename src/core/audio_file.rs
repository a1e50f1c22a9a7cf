//! core/audio_file.rs
//!
//! Thin per-file facade: path, extension, format list, raw bytes, and the
//! stream parameters Symphonia can probe.
//!
//! Nothing here is cached. Every call goes back to the file on disk.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSourceStream, MediaSourceStreamOptions};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::units::TimeBase;

use super::error::{MetaError, Result};
use super::fields::{Format, formats_for_extension};
use super::types::TechnicalInfo;

#[derive(Debug, Clone)]
pub struct AudioFile {
    path: PathBuf,
    extension: String,
    formats: &'static [Format],
}

impl AudioFile {
    /// Check the file exists and its extension has a format list.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(MetaError::FileNotFound(path.to_path_buf()));
        }
        let extension = path
            .extension()
            .and_then(|s| s.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        let formats = formats_for_extension(&extension)?;

        Ok(Self {
            path: path.to_path_buf(),
            extension,
            formats,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Formats in precedence order; the first one is the default write target.
    pub fn formats(&self) -> &'static [Format] {
        self.formats
    }

    pub fn default_format(&self) -> Format {
        self.formats[0]
    }

    /// Error unless `format` is one this file type can carry.
    pub fn ensure_applicable(&self, format: Format) -> Result<()> {
        if self.formats.contains(&format) {
            Ok(())
        } else {
            Err(MetaError::FormatNotApplicable {
                format,
                extension: self.extension.clone(),
            })
        }
    }

    pub fn read_bytes(&self) -> Result<Vec<u8>> {
        Ok(std::fs::read(&self.path)?)
    }

    /// Replace the file contents. Goes through a temp file in the same
    /// directory and a rename, so a crash leaves either old or new bytes.
    pub fn write_bytes(&self, bytes: &[u8]) -> Result<()> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| MetaError::Io(e.error))?;
        Ok(())
    }

    pub fn file_size(&self) -> Result<u64> {
        Ok(std::fs::metadata(&self.path)?.len())
    }

    /// Probe stream parameters. Unknown values stay `None`; a file Symphonia
    /// can't probe still yields its size.
    pub fn technical_info(&self) -> Result<TechnicalInfo> {
        let file_size = self.file_size()?;
        let mut info = TechnicalInfo {
            file_size,
            ..TechnicalInfo::default()
        };

        let file = File::open(&self.path)?;
        let mss = MediaSourceStream::new(Box::new(file), MediaSourceStreamOptions::default());

        let mut hint = Hint::new();
        hint.with_extension(&self.extension);

        let probed = match symphonia::default::get_probe().format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        ) {
            Ok(p) => p,
            Err(e) => {
                tracing::debug!(path = %self.path.display(), error = %e, "stream probe failed");
                return Ok(info);
            }
        };

        let Some(track) = probed.format.default_track() else {
            return Ok(info);
        };
        let params = &track.codec_params;

        info.sample_rate = params.sample_rate;
        info.channels = params.channels.map(|c| c.count() as u16);
        info.bits_per_sample = params.bits_per_sample;
        info.duration_ms = duration_from_params(params.time_base, params.n_frames);
        info.bitrate_kbps = info
            .duration_ms
            .filter(|ms| *ms > 0)
            .map(|ms| ((file_size * 8) / ms) as u32);

        Ok(info)
    }
}

fn duration_from_params(time_base: Option<TimeBase>, n_frames: Option<u64>) -> Option<u64> {
    let tb = time_base?;
    let frames = n_frames?;

    let t = tb.calc_time(frames);
    // Time is { seconds: u64, frac: f64 } in symphonia 0.5.x.
    let ms = (t.seconds as f64 * 1000.0) + (t.frac * 1000.0);
    Some(ms.round() as u64)
}
