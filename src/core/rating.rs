//! core/rating.rs
//!
//! Converting between a caller-facing rating scale (0..=max) and the raw
//! integers each format/tool stores.
//!
//! Every profile is an 11-entry table indexed by half-star position
//! (0 = no stars, 10 = five stars).

use super::error::{MetaError, Result};
use super::fields::Format;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatingProfile {
    pub name: &'static str,
    /// Largest raw value the profile uses
    pub scale: u32,
    pub table: [Option<u32>; 11],
}

/// Windows Media Player / MusicBee style POPM values.
pub const BASE_255_NON_PROPORTIONAL: RatingProfile = RatingProfile {
    name: "base-255-non-proportional",
    scale: 255,
    table: [
        Some(0),
        Some(13),
        Some(1),
        Some(54),
        Some(64),
        Some(118),
        Some(128),
        Some(186),
        Some(196),
        Some(242),
        Some(255),
    ],
};

/// Percentage scale, 10 per half star.
pub const BASE_100_PROPORTIONAL: RatingProfile = RatingProfile {
    name: "base-100-proportional",
    scale: 100,
    table: [
        Some(0),
        Some(10),
        Some(20),
        Some(30),
        Some(40),
        Some(50),
        Some(60),
        Some(70),
        Some(80),
        Some(90),
        Some(100),
    ],
};

/// Traktor style: proportional 0..255 but with no encoding for zero stars.
pub const BASE_255_PROPORTIONAL_NO_ZERO: RatingProfile = RatingProfile {
    name: "base-255-proportional-no-zero",
    scale: 255,
    table: [
        None,
        Some(26),
        Some(51),
        Some(77),
        Some(102),
        Some(128),
        Some(153),
        Some(179),
        Some(204),
        Some(230),
        Some(255),
    ],
};

const ID3V2_READ: &[RatingProfile] = &[BASE_255_NON_PROPORTIONAL, BASE_255_PROPORTIONAL_NO_ZERO];
const PERCENT_READ: &[RatingProfile] = &[BASE_100_PROPORTIONAL, BASE_255_NON_PROPORTIONAL];

/// Profile used when writing `format`'s rating slot.
pub fn write_profile(format: Format) -> Option<&'static RatingProfile> {
    match format {
        Format::Id3v2 => Some(&BASE_255_NON_PROPORTIONAL),
        Format::Vorbis | Format::RiffInfo => Some(&BASE_100_PROPORTIONAL),
        Format::Id3v1 => None,
    }
}

/// Profiles a raw value from `format` may come from, in match priority.
pub fn read_profiles(format: Format) -> &'static [RatingProfile] {
    match format {
        Format::Id3v2 => ID3V2_READ,
        Format::Vorbis | Format::RiffInfo => PERCENT_READ,
        Format::Id3v1 => &[],
    }
}

impl RatingProfile {
    pub fn raw_for_index(&self, index: usize) -> Option<u32> {
        self.table.get(index).copied().flatten()
    }

    pub fn index_of(&self, raw: u32) -> Option<usize> {
        self.table.iter().position(|entry| *entry == Some(raw))
    }
}

/// The 0..=255 scale POPM and most players use internally. A caller asking
/// for it speaks raw values and is not held to half-star steps.
pub const RAW_SCALE: u32 = 255;

/// Check a caller value against the normalized scale without touching a profile.
///
/// `max = None` means the caller speaks raw values; only the upper bound of
/// the target profile applies then, so that check lives in [`to_raw`].
pub fn validate(value: u32, max: Option<u32>) -> Result<()> {
    let Some(max) = max else { return Ok(()) };
    if max == 0 {
        return Err(MetaError::InvalidRating {
            value,
            reason: "rating scale max must be positive".to_string(),
        });
    }
    if value > max {
        return Err(MetaError::InvalidRating {
            value,
            reason: format!("exceeds scale max {max}"),
        });
    }
    // value must be a whole number of tenths of max (half-star steps)
    if max != RAW_SCALE && (u64::from(value) * 10) % u64::from(max) != 0 {
        return Err(MetaError::InvalidRating {
            value,
            reason: format!("not a multiple of {max}/10"),
        });
    }
    Ok(())
}

/// Normalized (or raw, when `max` is `None`) value -> raw integer for `profile`.
///
/// On the raw scale a profile of the same width takes the value as is;
/// anything else goes through the nearest half-star index.
pub fn to_raw(value: u32, max: Option<u32>, profile: &RatingProfile) -> Result<u32> {
    let Some(max) = max else {
        if value > profile.scale {
            return Err(MetaError::InvalidRating {
                value,
                reason: format!("raw value exceeds {} scale {}", profile.name, profile.scale),
            });
        }
        return Ok(value);
    };

    validate(value, Some(max))?;
    if max == RAW_SCALE && profile.scale == RAW_SCALE {
        return Ok(value);
    }

    let index = (f64::from(value) * 10.0 / f64::from(max)).round().clamp(0.0, 10.0) as usize;
    profile.raw_for_index(index).ok_or_else(|| MetaError::InvalidRating {
        value,
        reason: format!("{} has no encoding for half-star index {index}", profile.name),
    })
}

/// Raw integer -> caller scale. `None` when no candidate profile knows the value.
///
/// Without `max` the raw value is handed back untouched, and so is a value
/// whose matching profile is already on the caller's scale.
pub fn from_raw(raw: u32, max: Option<u32>, profiles: &[RatingProfile]) -> Option<u32> {
    let Some(max) = max else { return Some(raw) };
    let (profile, index) = profiles
        .iter()
        .find_map(|p| p.index_of(raw).map(|index| (p, index)))?;
    if max == RAW_SCALE && profile.scale == RAW_SCALE {
        return Some(raw);
    }
    Some(((index as f64) * f64::from(max) / 10.0).round() as u32)
}
