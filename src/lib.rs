//! metasync
//!
//! Reads and writes audio metadata kept in several tag containers of the
//! same file (ID3v1, ID3v2, FLAC Vorbis comments, RIFF INFO) through one
//! field model, and checks / repairs FLAC stream checksums.

pub mod core;

pub use crate::core::audio_file::AudioFile;
pub use crate::core::error::{ErrorKind, MetaError, Result};
pub use crate::core::fields::{Field, Format, Id3v2Version, ValueShape};
pub use crate::core::flac::ChecksumState;
pub use crate::core::options::{FlacToolConfig, ReadOptions, WriteOptions, WriteStrategy};
pub use crate::core::types::{
    FieldValue, FormatOutcome, FormatView, FullMetadata, HeaderInfo, OutcomeStatus, TechnicalInfo,
    UnifiedMetadata, WriteReport,
};
pub use crate::core::{
    delete_metadata, flac_checksum_state, full_metadata, header_info, read_field, read_metadata,
    repair_flac_checksum, write_metadata,
};
