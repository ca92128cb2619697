// Copyright (c) 2024 Harry [Majored] [hello@majored.pw]
// MIT License (https://github.com/Majored/rs-zip-stream/blob/main/LICENSE)

//! Codecs for the TLV records this crate understands within a header's extra field area: the
//! zip64 extended information field and the InfoZip extended timestamp field.

use crate::error::{Result, ZipError};
use crate::spec::consts::{EXTENDED_TIMESTAMP_EXTRA_FIELD_ID, ZIP64_EXTRA_FIELD_ID};
use crate::timestamp::{self, ExtendedTimestamps};

/// An extended information field for zip64.
///
/// Local file headers carry both sizes; central directory headers additionally carry the local
/// file header offset. The emitted record length follows from which fields are present.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Zip64ExtraField {
    pub uncompressed_size: Option<u64>,
    pub compressed_size: Option<u64>,
    pub header_offset: Option<u64>,
}

/// A recognised extra field record. Unrecognised tags are skipped at parse time and never
/// re-emitted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExtraField {
    Zip64(Zip64ExtraField),
    Timestamp(ExtendedTimestamps),
}

pub(crate) trait ExtraFieldAsBytes {
    fn as_bytes(&self) -> Vec<u8>;

    fn count_bytes(&self) -> usize;
}

impl ExtraFieldAsBytes for &[ExtraField] {
    fn as_bytes(&self) -> Vec<u8> {
        let mut buffer = Vec::new();
        for field in self.iter() {
            buffer.append(&mut field.as_bytes());
        }
        buffer
    }

    fn count_bytes(&self) -> usize {
        self.iter().map(|field| field.count_bytes()).sum()
    }
}

impl ExtraFieldAsBytes for ExtraField {
    fn as_bytes(&self) -> Vec<u8> {
        match self {
            ExtraField::Zip64(field) => field.as_bytes(),
            ExtraField::Timestamp(field) => timestamp_field_as_bytes(field),
        }
    }

    fn count_bytes(&self) -> usize {
        match self {
            ExtraField::Zip64(field) => field.count_bytes(),
            ExtraField::Timestamp(field) => timestamp_field_count_bytes(field),
        }
    }
}

impl Zip64ExtraField {
    fn content_size(&self) -> usize {
        let fields = [self.uncompressed_size, self.compressed_size, self.header_offset];
        fields.iter().filter(|field| field.is_some()).count() * 8
    }
}

impl ExtraFieldAsBytes for Zip64ExtraField {
    fn as_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.count_bytes());
        bytes.extend_from_slice(&ZIP64_EXTRA_FIELD_ID.to_le_bytes());
        bytes.extend_from_slice(&(self.content_size() as u16).to_le_bytes());
        if let Some(uncompressed_size) = self.uncompressed_size {
            bytes.extend_from_slice(&uncompressed_size.to_le_bytes());
        }
        if let Some(compressed_size) = self.compressed_size {
            bytes.extend_from_slice(&compressed_size.to_le_bytes());
        }
        if let Some(header_offset) = self.header_offset {
            bytes.extend_from_slice(&header_offset.to_le_bytes());
        }

        bytes
    }

    fn count_bytes(&self) -> usize {
        4 + self.content_size()
    }
}

const MODIFIED_BIT: u8 = 0x1;
const ACCESSED_BIT: u8 = 0x2;
const CREATED_BIT: u8 = 0x4;

fn timestamp_field_as_bytes(timestamps: &ExtendedTimestamps) -> Vec<u8> {
    let mut flags = 0u8;
    let mut seconds = Vec::with_capacity(12);

    let ordered = [
        (MODIFIED_BIT, &timestamps.modified),
        (ACCESSED_BIT, &timestamps.accessed),
        (CREATED_BIT, &timestamps.created),
    ];
    for (bit, instant) in ordered {
        if let Some(instant) = instant {
            flags |= bit;
            seconds.extend_from_slice(&timestamp::to_unix_seconds(instant).to_le_bytes());
        }
    }

    let mut bytes = Vec::with_capacity(5 + seconds.len());
    bytes.extend_from_slice(&EXTENDED_TIMESTAMP_EXTRA_FIELD_ID.to_le_bytes());
    bytes.extend_from_slice(&((1 + seconds.len()) as u16).to_le_bytes());
    bytes.push(flags);
    bytes.append(&mut seconds);

    bytes
}

fn timestamp_field_count_bytes(timestamps: &ExtendedTimestamps) -> usize {
    let set = [timestamps.modified, timestamps.accessed, timestamps.created];
    5 + set.iter().filter(|instant| instant.is_some()).count() * 4
}

/// Parse a zip64 extra field from its record payload.
///
/// Fields are positional: uncompressed size, compressed size, then the local file header offset,
/// each present only while payload bytes remain. This writer always emits both sizes, so a
/// sentinel-gated parse is unnecessary.
fn zip64_field_from_bytes(data: &[u8]) -> Zip64ExtraField {
    let mut field = Zip64ExtraField::default();
    let mut chunks = data.chunks_exact(8);

    field.uncompressed_size = chunks.next().map(|bytes| u64::from_le_bytes(bytes.try_into().unwrap()));
    field.compressed_size = chunks.next().map(|bytes| u64::from_le_bytes(bytes.try_into().unwrap()));
    field.header_offset = chunks.next().map(|bytes| u64::from_le_bytes(bytes.try_into().unwrap()));

    field
}

/// Parse an extended timestamp field from its record payload.
///
/// Each instant is taken only while its flag bit is set and four payload bytes remain; central
/// directory records habitually advertise more instants than they store.
fn timestamp_field_from_bytes(data: &[u8]) -> ExtendedTimestamps {
    let mut timestamps = ExtendedTimestamps::default();
    let Some((&flags, mut rest)) = data.split_first() else {
        return timestamps;
    };

    for (bit, slot) in [
        (MODIFIED_BIT, &mut timestamps.modified),
        (ACCESSED_BIT, &mut timestamps.accessed),
        (CREATED_BIT, &mut timestamps.created),
    ] {
        if flags & bit != 0 {
            let Some((seconds, tail)) = rest.split_first_chunk::<4>() else {
                break;
            };
            *slot = timestamp::from_unix_seconds(i32::from_le_bytes(*seconds));
            rest = tail;
        }
    }

    timestamps
}

/// Walk the TLV records of an extra field area, collecting the recognised ones.
///
/// Iteration stops when fewer than four bytes remain. A record whose declared length overruns
/// the area fails with [`ZipError::InvalidExtraField`].
pub(crate) fn parse_extra_fields(data: &[u8]) -> Result<Vec<ExtraField>> {
    let mut fields = Vec::new();
    let mut rest = data;

    while rest.len() >= 4 {
        let header_id = u16::from_le_bytes(rest[0..2].try_into().unwrap());
        let data_size = u16::from_le_bytes(rest[2..4].try_into().unwrap()) as usize;
        let payload = rest.get(4..4 + data_size).ok_or(ZipError::InvalidExtraField)?;

        match header_id {
            ZIP64_EXTRA_FIELD_ID => fields.push(ExtraField::Zip64(zip64_field_from_bytes(payload))),
            EXTENDED_TIMESTAMP_EXTRA_FIELD_ID => {
                fields.push(ExtraField::Timestamp(timestamp_field_from_bytes(payload)))
            }
            _ => {}
        }

        rest = &rest[4 + data_size..];
    }

    Ok(fields)
}
