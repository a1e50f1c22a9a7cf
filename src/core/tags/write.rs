//! core/tags/write.rs
//! Writes across co-resident formats.
//!
//! - Options and values are checked before any byte is written.
//! - An explicit format is strict: one adapter, unsupported fields are errors.
//! - Otherwise the extension's first format is the target and the strategy
//!   decides what happens to the others:
//!   - `Sync`: mirror the map onto every other format already in the file
//!   - `Preserve`: snapshot the others, write the target, write the snapshots back
//!   - `Cleanup`: structurally delete the others, then write the target
//! - Non-target failures never abort the call; they land in the report.

use super::super::audio_file::AudioFile;
use super::super::error::{MetaError, Result};
use super::super::fields::Format;
use super::super::options::{WriteOptions, WriteStrategy};
use super::super::types::{OutcomeStatus, UnifiedMetadata, WriteReport};
use super::{AdapterContext, TagAdapter, adapter_for, validate_values};

impl From<&WriteOptions> for AdapterContext {
    fn from(options: &WriteOptions) -> Self {
        Self {
            rating_max: options.rating_max,
            id3v2_version: options.id3v2_version,
        }
    }
}

pub(crate) fn write_metadata(
    file: &AudioFile,
    metadata: &UnifiedMetadata,
    options: &WriteOptions,
) -> Result<WriteReport> {
    options.validate()?;
    validate_values(metadata, options.rating_max)?;
    let ctx = AdapterContext::from(options);

    if let Some(format) = options.format {
        file.ensure_applicable(format)?;
        adapter_for(format, file, ctx).write(metadata)?;
        let mut report = WriteReport::new(format);
        report.record(format, OutcomeStatus::Written);
        return Ok(report);
    }

    let target = file.default_format();
    let strategy = options.strategy.unwrap_or_default();
    let mut report = WriteReport::new(target);

    // decided up front so a policy failure happens before anything is touched
    let target_map = supported_subset(target, metadata, options.fail_on_unsupported_field, &mut report)?;
    let target_adapter = adapter_for(target, file, ctx);
    let others: Vec<Box<dyn TagAdapter + '_>> = file
        .formats()
        .iter()
        .filter(|f| **f != target)
        .map(|f| adapter_for(*f, file, ctx))
        .collect();

    tracing::debug!(path = %file.path().display(), %target, ?strategy, "writing metadata");

    match strategy {
        WriteStrategy::Sync => {
            write_target(target_adapter.as_ref(), &target_map, &mut report)?;
            for adapter in &others {
                sync_one(adapter.as_ref(), metadata, options, &mut report);
            }
        }
        WriteStrategy::Preserve => {
            let snapshots: Vec<_> = others
                .iter()
                .map(|adapter| snapshot(adapter.as_ref()))
                .collect();
            write_target(target_adapter.as_ref(), &target_map, &mut report)?;
            for (adapter, snap) in others.iter().zip(snapshots) {
                restore(adapter.as_ref(), snap, &mut report);
            }
        }
        WriteStrategy::Cleanup => {
            for adapter in &others {
                let format = adapter.format();
                match adapter.delete_all() {
                    Ok(true) => report.record(format, OutcomeStatus::Deleted),
                    Ok(false) => report.record(format, OutcomeStatus::Skipped("not present".into())),
                    Err(e) => fail(&mut report, format, &e),
                }
            }
            write_target(target_adapter.as_ref(), &target_map, &mut report)?;
        }
    }

    Ok(report)
}

/// Apply the unsupported-field policy for one format.
fn supported_subset(
    format: Format,
    metadata: &UnifiedMetadata,
    fail_on_unsupported: bool,
    report: &mut WriteReport,
) -> Result<UnifiedMetadata> {
    let (kept, dropped) = metadata.retain_supported(format);
    if let Some(field) = dropped.first() {
        if fail_on_unsupported {
            return Err(MetaError::FieldNotSupportedByFormat {
                field: *field,
                format,
            });
        }
        let names: Vec<_> = dropped.iter().map(|f| f.as_str()).collect();
        report.warn(format!("{format}: dropped unsupported fields {}", names.join(", ")));
    }
    Ok(kept)
}

fn write_target(adapter: &dyn TagAdapter, map: &UnifiedMetadata, report: &mut WriteReport) -> Result<()> {
    let format = adapter.format();
    if map.is_empty() {
        report.record(format, OutcomeStatus::Skipped("no supported fields to write".into()));
        return Ok(());
    }
    adapter.write(map)?;
    report.record(format, OutcomeStatus::Written);
    Ok(())
}

fn is_present(adapter: &dyn TagAdapter) -> Result<bool> {
    Ok(adapter.header_info()?.present)
}

fn sync_one(
    adapter: &dyn TagAdapter,
    metadata: &UnifiedMetadata,
    options: &WriteOptions,
    report: &mut WriteReport,
) {
    let format = adapter.format();
    let result = (|| -> Result<OutcomeStatus> {
        if !is_present(adapter)? {
            return Ok(OutcomeStatus::Skipped("not present".into()));
        }
        let map = if options.fail_on_unsupported_field {
            metadata.clone()
        } else {
            supported_subset(format, metadata, false, report)?
        };
        if map.is_empty() {
            return Ok(OutcomeStatus::Skipped("no supported fields to write".into()));
        }
        adapter.write(&map)?;
        Ok(OutcomeStatus::Written)
    })();

    match result {
        Ok(status) => report.record(format, status),
        Err(e) => fail(report, format, &e),
    }
}

/// Current contents of a format that exists in the file, `None` if it doesn't.
fn snapshot(adapter: &dyn TagAdapter) -> Result<Option<UnifiedMetadata>> {
    if !is_present(adapter)? {
        return Ok(None);
    }
    adapter.read_all().map(Some)
}

fn restore(adapter: &dyn TagAdapter, snap: Result<Option<UnifiedMetadata>>, report: &mut WriteReport) {
    let format = adapter.format();
    let status = match snap {
        Ok(None) => Ok(OutcomeStatus::Skipped("not present".into())),
        Ok(Some(map)) if map.is_empty() => Ok(OutcomeStatus::Skipped("nothing to restore".into())),
        Ok(Some(map)) => adapter.write(&map).map(|()| OutcomeStatus::Restored),
        Err(e) => Err(e),
    };
    match status {
        Ok(status) => report.record(format, status),
        Err(e) => fail(report, format, &e),
    }
}

fn fail(report: &mut WriteReport, format: Format, error: &MetaError) {
    report.warn(format!("{format}: {error}"));
    report.record(format, OutcomeStatus::Failed(error.to_string()));
}
