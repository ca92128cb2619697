// Copyright (c) 2024 Harry [Majored] [hello@majored.pw]
// MIT License (https://github.com/Majored/rs-zip-stream/blob/main/LICENSE)

use crate::error::ZipError;
use crate::partial::PartialReader;
use crate::tests::{chunk_stream, init_logger};

use futures_lite::stream::StreamExt;

fn three_by_three() -> PartialReader<crate::partial::ChunkSource<impl futures_lite::stream::Stream<Item = std::io::Result<bytes::Bytes>> + Unpin>> {
    PartialReader::from_stream(chunk_stream(vec![vec![1, 2, 3], vec![4, 5, 6], vec![7, 8, 9]]))
}

#[tokio::test]
async fn sequencing_across_chunk_boundaries() {
    init_logger();
    let mut reader = three_by_three();

    assert_eq!(&reader.read_amount_strict(2).await.unwrap()[..], &[1, 2]);
    assert_eq!(&reader.read_amount(5).await.unwrap()[..], &[3, 4, 5, 6, 7]);
    assert_eq!(&reader.read_amount_strict(2).await.unwrap()[..], &[8, 9]);
    assert!(reader.read_amount(5).await.unwrap().is_empty());
}

#[tokio::test]
async fn limited_read_serves_leftover_before_upstream() {
    init_logger();
    let mut reader = three_by_three();

    // The first bounded read splits the first chunk and buffers its tail.
    assert_eq!(&reader.limited_read(2).await.unwrap().unwrap()[..], &[1, 2]);
    // The tail must be served before any further upstream read, even under a larger bound.
    assert_eq!(&reader.limited_read(5).await.unwrap().unwrap()[..], &[3]);
    assert_eq!(&reader.limited_read(5).await.unwrap().unwrap()[..], &[4, 5, 6]);
}

#[tokio::test]
async fn limited_read_never_yields_empty_chunks() {
    init_logger();
    let mut reader = PartialReader::from_stream(chunk_stream(vec![vec![], vec![1], vec![], vec![2]]));

    assert_eq!(&reader.limited_read(4).await.unwrap().unwrap()[..], &[1]);
    assert_eq!(&reader.limited_read(4).await.unwrap().unwrap()[..], &[2]);
    assert!(reader.limited_read(4).await.unwrap().is_none());
}

#[tokio::test]
async fn read_amount_strict_fails_on_early_end() {
    init_logger();
    let mut reader = PartialReader::from_stream(chunk_stream(vec![vec![1, 2, 3]]));

    let err = reader.read_amount_strict(5).await.unwrap_err();
    assert!(matches!(err, ZipError::UnexpectedEnd));
}

#[tokio::test]
async fn skip_amount_repositions_and_stops_at_end() {
    init_logger();
    let mut reader = three_by_three();

    assert_eq!(reader.skip_amount(4).await.unwrap(), 4);
    assert_eq!(&reader.read_amount(5).await.unwrap()[..], &[5, 6, 7, 8, 9]);

    let mut reader = three_by_three();
    assert_eq!(reader.skip_amount(100).await.unwrap(), 9);
}

#[tokio::test]
async fn stream_amount_yields_exactly_the_region() {
    init_logger();
    let mut reader = three_by_three();

    let mut sub = reader.stream_amount(7);
    let mut collected = Vec::new();
    while let Some(chunk) = sub.next().await {
        collected.extend_from_slice(&chunk.unwrap());
    }
    assert_eq!(collected, &[1, 2, 3, 4, 5, 6, 7]);

    assert_eq!(&reader.limited_read(5).await.unwrap().unwrap()[..], &[8, 9]);
}

#[tokio::test]
async fn stream_amount_cancel_skips_the_remainder() {
    init_logger();
    let mut reader = three_by_three();

    let mut sub = reader.stream_amount(7);
    assert_eq!(&sub.next().await.unwrap().unwrap()[..], &[1, 2, 3]);
    assert_eq!(sub.remaining(), 4);
    assert_eq!(sub.cancel().await.unwrap(), 4);

    assert_eq!(&reader.limited_read(5).await.unwrap().unwrap()[..], &[8, 9]);
}

#[tokio::test]
async fn stream_amount_ends_short_when_upstream_does() {
    init_logger();
    let mut reader = PartialReader::from_stream(chunk_stream(vec![vec![1, 2, 3]]));

    let mut sub = reader.stream_amount(10);
    let mut collected = Vec::new();
    while let Some(chunk) = sub.next().await {
        collected.extend_from_slice(&chunk.unwrap());
    }
    assert_eq!(collected, &[1, 2, 3]);
    assert_eq!(reader.take_sub_remaining(), 0);
}

#[tokio::test]
async fn byob_variant_sequencing() {
    init_logger();
    let data: Vec<u8> = (1..=9).collect();
    let mut reader = PartialReader::from_reader(&data[..]);

    assert_eq!(&reader.read_amount_strict(2).await.unwrap()[..], &[1, 2]);
    assert_eq!(&reader.read_amount(5).await.unwrap()[..], &[3, 4, 5, 6, 7]);
    assert_eq!(&reader.read_amount_strict(2).await.unwrap()[..], &[8, 9]);
    assert!(reader.read_amount(5).await.unwrap().is_empty());
}

#[tokio::test]
async fn byob_variant_bounds_each_read() {
    init_logger();
    let data: Vec<u8> = (1..=9).collect();
    let mut reader = PartialReader::from_reader(&data[..]);

    // The destination buffer bounds the read, so exactly `max` bytes come back and nothing is
    // buffered behind the caller's back.
    assert_eq!(&reader.limited_read(4).await.unwrap().unwrap()[..], &[1, 2, 3, 4]);
    assert_eq!(&reader.limited_read(4).await.unwrap().unwrap()[..], &[5, 6, 7, 8]);
    assert_eq!(&reader.limited_read(4).await.unwrap().unwrap()[..], &[9]);
    assert!(reader.limited_read(4).await.unwrap().is_none());
}

#[tokio::test]
async fn cancel_fails_further_operations() {
    init_logger();
    let mut reader = three_by_three();

    reader.cancel();
    let err = reader.read_amount(1).await.unwrap_err();
    assert!(matches!(err, ZipError::Aborted));
}

#[tokio::test]
async fn upstream_error_propagates() {
    init_logger();
    let chunks: Vec<std::io::Result<bytes::Bytes>> = vec![
        Ok(bytes::Bytes::from_static(&[1, 2])),
        Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset")),
    ];
    let mut reader = PartialReader::from_stream(futures_lite::stream::iter(chunks));

    assert_eq!(&reader.read_amount_strict(2).await.unwrap()[..], &[1, 2]);
    let err = reader.read_amount(1).await.unwrap_err();
    assert!(matches!(err, ZipError::Io(_)));
}
