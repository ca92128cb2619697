// Copyright (c) 2024 Harry [Majored] [hello@majored.pw]
// MIT License (https://github.com/Majored/rs-zip-stream/blob/main/LICENSE)

use crate::error::ZipError;
use crate::spec::extra_field::{parse_extra_fields, ExtraField, ExtraFieldAsBytes, Zip64ExtraField};
use crate::timestamp::ExtendedTimestamps;

use chrono::DateTime;

#[test]
fn zip64_local_record_is_twenty_bytes() {
    let field = ExtraField::Zip64(Zip64ExtraField {
        uncompressed_size: Some(24),
        compressed_size: Some(18),
        header_offset: None,
    });

    let bytes = field.as_bytes();
    assert_eq!(bytes.len(), 20);
    assert_eq!(field.count_bytes(), 20);
    assert_eq!(&bytes[0..2], &0x0001u16.to_le_bytes());
    assert_eq!(&bytes[2..4], &16u16.to_le_bytes());
    assert_eq!(&bytes[4..12], &24u64.to_le_bytes());
    assert_eq!(&bytes[12..20], &18u64.to_le_bytes());
}

#[test]
fn zip64_central_record_adds_the_header_offset() {
    let field = ExtraField::Zip64(Zip64ExtraField {
        uncompressed_size: Some(24),
        compressed_size: Some(18),
        header_offset: Some(0x1_0000_0001),
    });

    let bytes = field.as_bytes();
    assert_eq!(bytes.len(), 28);
    assert_eq!(&bytes[2..4], &24u16.to_le_bytes());
    assert_eq!(&bytes[20..28], &0x1_0000_0001u64.to_le_bytes());
}

#[test]
fn zip64_record_round_trips() {
    let field = Zip64ExtraField {
        uncompressed_size: Some(u64::from(u32::MAX) + 7),
        compressed_size: Some(42),
        header_offset: None,
    };

    let bytes = ExtraField::Zip64(field.clone()).as_bytes();
    let parsed = parse_extra_fields(&bytes).unwrap();
    assert_eq!(parsed, vec![ExtraField::Zip64(field)]);
}

#[test]
fn timestamp_record_round_trips_partial_sets() {
    let instant = |seconds| DateTime::from_timestamp(seconds, 0).unwrap();

    let cases = [
        ExtendedTimestamps::new().modified(instant(1_650_000_000)),
        ExtendedTimestamps::new().accessed(instant(1_650_000_001)).created(instant(1_650_000_002)),
        ExtendedTimestamps::new()
            .modified(instant(1_650_000_000))
            .accessed(instant(1_650_000_001))
            .created(instant(1_650_000_002)),
    ];

    for timestamps in cases {
        let bytes = ExtraField::Timestamp(timestamps).as_bytes();
        let parsed = parse_extra_fields(&bytes).unwrap();
        assert_eq!(parsed, vec![ExtraField::Timestamp(timestamps)]);
    }
}

#[test]
fn timestamp_record_length_tracks_set_fields() {
    let instant = DateTime::from_timestamp(1_650_000_000, 0).unwrap();

    let one = ExtraField::Timestamp(ExtendedTimestamps::new().modified(instant));
    assert_eq!(one.as_bytes().len(), 9);
    assert_eq!(one.as_bytes()[4], 0x1);

    let two = ExtraField::Timestamp(ExtendedTimestamps::new().accessed(instant).created(instant));
    assert_eq!(two.as_bytes().len(), 13);
    assert_eq!(two.as_bytes()[4], 0x6);
}

#[test]
fn timestamp_record_tolerates_fewer_instants_than_flagged() {
    // Central directory records habitually flag all three instants but store only the first.
    let mut bytes = vec![0x55, 0x54, 5, 0, 0x7];
    bytes.extend_from_slice(&1_650_000_000i32.to_le_bytes());

    let parsed = parse_extra_fields(&bytes).unwrap();
    let expected = ExtendedTimestamps::new().modified(DateTime::from_timestamp(1_650_000_000, 0).unwrap());
    assert_eq!(parsed, vec![ExtraField::Timestamp(expected)]);
}

#[test]
fn unknown_tags_are_skipped() {
    let mut bytes = vec![0x99, 0x09, 3, 0, 0xaa, 0xbb, 0xcc];
    bytes.extend_from_slice(&ExtraField::Zip64(Zip64ExtraField {
        uncompressed_size: Some(1),
        compressed_size: Some(2),
        header_offset: None,
    })
    .as_bytes());

    let parsed = parse_extra_fields(&bytes).unwrap();
    assert_eq!(parsed.len(), 1);
    assert!(matches!(parsed[0], ExtraField::Zip64(_)));
}

#[test]
fn trailing_bytes_shorter_than_a_record_header_are_ignored() {
    let mut bytes = ExtraField::Zip64(Zip64ExtraField {
        uncompressed_size: Some(1),
        compressed_size: Some(2),
        header_offset: None,
    })
    .as_bytes();
    bytes.extend_from_slice(&[0x00, 0x00, 0x01]);

    assert_eq!(parse_extra_fields(&bytes).unwrap().len(), 1);
}

#[test]
fn overrunning_record_length_fails() {
    // Declares 32 payload bytes but carries only 8.
    let mut bytes = vec![0x01, 0x00, 32, 0];
    bytes.extend_from_slice(&7u64.to_le_bytes());

    let err = parse_extra_fields(&bytes).unwrap_err();
    assert!(matches!(err, ZipError::InvalidExtraField));
}
