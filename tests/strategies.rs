//! Cross-format write strategies, structural delete and the full view.

mod common;

use common::{flac_file, mp3_file, wav_file};
use metasync::{
    Field, FieldValue, Format, MetaError, OutcomeStatus, ReadOptions, UnifiedMetadata,
    WriteOptions, WriteStrategy, delete_metadata, full_metadata, header_info, read_field,
    read_metadata, write_metadata,
};

fn only(format: Format) -> ReadOptions {
    ReadOptions {
        format: Some(format),
        ..ReadOptions::default()
    }
}

fn explicit(format: Format) -> WriteOptions {
    WriteOptions {
        format: Some(format),
        ..WriteOptions::default()
    }
}

fn strategy(strategy: WriteStrategy) -> WriteOptions {
    WriteOptions {
        strategy: Some(strategy),
        ..WriteOptions::default()
    }
}

fn title(value: &str) -> UnifiedMetadata {
    let mut m = UnifiedMetadata::new();
    m.set(Field::Title, value);
    m
}

/// MP3 carrying both an ID3v2 header and an ID3v1 trailer.
fn mp3_with_both(dir: &tempfile::TempDir) -> std::path::PathBuf {
    let path = mp3_file(dir, "both.mp3");
    write_metadata(&path, &title("old v2"), &explicit(Format::Id3v2)).unwrap();
    let mut v1 = title("old v1");
    v1.set(Field::Album, "v1 album");
    write_metadata(&path, &v1, &explicit(Format::Id3v1)).unwrap();
    path
}

#[test]
fn cleanup_removes_the_other_formats() {
    let dir = tempfile::tempdir().unwrap();
    let path = mp3_with_both(&dir);
    assert!(header_info(&path, Format::Id3v1).unwrap().present);

    let report = write_metadata(&path, &title("fresh"), &strategy(WriteStrategy::Cleanup)).unwrap();
    assert_eq!(report.status_of(Format::Id3v1), Some(&OutcomeStatus::Deleted));
    assert_eq!(report.status_of(Format::Id3v2), Some(&OutcomeStatus::Written));

    for field in [Field::Title, Field::Album] {
        assert_eq!(read_field(&path, field, &only(Format::Id3v1)).unwrap(), None);
    }
    assert!(!header_info(&path, Format::Id3v1).unwrap().present);
    assert_eq!(
        read_field(&path, Field::Title, &only(Format::Id3v2)).unwrap(),
        Some(FieldValue::from("fresh"))
    );
}

#[test]
fn sync_mirrors_onto_present_formats() {
    let dir = tempfile::tempdir().unwrap();
    let path = mp3_with_both(&dir);

    let mut m = title("same everywhere");
    m.set(Field::Lyrics, "only ID3v2 can hold these");
    let report = write_metadata(&path, &m, &WriteOptions::default()).unwrap();

    assert_eq!(report.status_of(Format::Id3v2), Some(&OutcomeStatus::Written));
    assert_eq!(report.status_of(Format::Id3v1), Some(&OutcomeStatus::Written));
    assert!(report.warnings.iter().any(|w| w.starts_with("ID3v1") && w.contains("LYRICS")));

    for format in [Format::Id3v2, Format::Id3v1] {
        assert_eq!(
            read_field(&path, Field::Title, &only(format)).unwrap(),
            Some(FieldValue::from("same everywhere")),
            "{format}"
        );
    }
    // untouched field in the trailer survives
    assert_eq!(
        read_field(&path, Field::Album, &only(Format::Id3v1)).unwrap(),
        Some(FieldValue::from("v1 album"))
    );
}

#[test]
fn sync_does_not_create_missing_formats() {
    let dir = tempfile::tempdir().unwrap();
    let path = mp3_file(&dir, "a.mp3");

    let report = write_metadata(&path, &title("t"), &WriteOptions::default()).unwrap();
    assert!(matches!(report.status_of(Format::Id3v1), Some(OutcomeStatus::Skipped(_))));
    assert!(!header_info(&path, Format::Id3v1).unwrap().present);
}

#[test]
fn sync_failure_in_another_format_is_reported_not_raised() {
    let dir = tempfile::tempdir().unwrap();
    let path = mp3_with_both(&dir);

    let mut m = UnifiedMetadata::new();
    m.set(Field::TrackNumber, 300u32);
    let report = write_metadata(&path, &m, &WriteOptions::default()).unwrap();

    assert_eq!(report.status_of(Format::Id3v2), Some(&OutcomeStatus::Written));
    assert!(matches!(report.status_of(Format::Id3v1), Some(OutcomeStatus::Failed(_))));
    assert_eq!(report.failures().count(), 1);
    assert_eq!(
        read_field(&path, Field::TrackNumber, &ReadOptions::default()).unwrap(),
        Some(FieldValue::Integer(300))
    );
}

#[test]
fn preserve_puts_sibling_tags_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = flac_file(&dir, "a.flac", [3; 16], false);
    let mut id3 = title("id3 title");
    id3.set(Field::Bpm, 90u32);
    write_metadata(&path, &id3, &explicit(Format::Id3v2)).unwrap();

    let report = write_metadata(&path, &title("vorbis title"), &strategy(WriteStrategy::Preserve)).unwrap();
    assert_eq!(report.target, Format::Vorbis);
    assert_eq!(report.status_of(Format::Vorbis), Some(&OutcomeStatus::Written));
    assert_eq!(report.status_of(Format::Id3v2), Some(&OutcomeStatus::Restored));
    assert!(matches!(report.status_of(Format::Id3v1), Some(OutcomeStatus::Skipped(_))));

    let id3_now = read_metadata(&path, &only(Format::Id3v2)).unwrap();
    assert_eq!(id3_now.get(Field::Title), Some(&FieldValue::from("id3 title")));
    assert_eq!(id3_now.get(Field::Bpm), Some(&FieldValue::Integer(90)));
    assert_eq!(
        read_field(&path, Field::Title, &ReadOptions::default()).unwrap(),
        Some(FieldValue::from("vorbis title"))
    );
}

#[test]
fn strategy_with_explicit_format_is_a_configuration_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = wav_file(&dir, "a.wav");
    let options = WriteOptions {
        strategy: Some(WriteStrategy::Sync),
        format: Some(Format::RiffInfo),
        ..WriteOptions::default()
    };
    let err = write_metadata(&path, &title("x"), &options).unwrap_err();
    assert!(matches!(err, MetaError::ConflictingOptions(_)));
}

#[test]
fn delete_everything_or_one_format() {
    let dir = tempfile::tempdir().unwrap();
    let path = mp3_with_both(&dir);

    assert!(delete_metadata(&path, Some(Format::Id3v1)).unwrap());
    assert!(!header_info(&path, Format::Id3v1).unwrap().present);
    assert!(header_info(&path, Format::Id3v2).unwrap().present);

    assert!(delete_metadata(&path, None).unwrap());
    assert!(!delete_metadata(&path, None).unwrap());
    assert!(read_metadata(&path, &ReadOptions::default()).unwrap().is_empty());

    let err = delete_metadata(&path, Some(Format::RiffInfo)).unwrap_err();
    assert!(matches!(err, MetaError::FormatNotApplicable { .. }));
}

#[test]
fn full_view_of_a_wav() {
    let dir = tempfile::tempdir().unwrap();
    let path = wav_file(&dir, "tone.wav");

    let mut m = title("Tone");
    m.set(Field::ArchivalLocation, "Box 12").set(Field::GenresNames, vec!["Test", "Signal"]);
    write_metadata(&path, &m, &WriteOptions::default()).unwrap();

    let full = full_metadata(&path, &ReadOptions::default()).unwrap();
    assert_eq!(full.unified.get(Field::Title), Some(&FieldValue::from("Tone")));

    let riff = &full.formats[&Format::RiffInfo];
    assert!(riff.header.present);
    assert_eq!(riff.header.entries, vec!["INAM", "IGNR", "IARL"]);
    assert_eq!(
        riff.metadata.get(Field::GenresNames),
        Some(&FieldValue::from(vec!["Test", "Signal"]))
    );
    assert!(!full.formats[&Format::Id3v1].header.present);

    assert_eq!(full.technical.sample_rate, Some(8000));
    assert_eq!(full.technical.channels, Some(1));
    assert_eq!(full.technical.duration_ms, Some(500));

    let json = serde_json::to_value(&full).unwrap();
    assert_eq!(json["unified"]["ARCHIVAL_LOCATION"], "Box 12");
}
