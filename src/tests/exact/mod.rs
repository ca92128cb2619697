// Copyright (c) 2024 Harry [Majored] [hello@majored.pw]
// MIT License (https://github.com/Majored/rs-zip-stream/blob/main/LICENSE)

use crate::error::{Result, ZipError};
use crate::exact::ExactBytes;
use crate::tests::{chunk_stream, init_logger};

use bytes::Bytes;
use futures_lite::stream::{Stream, StreamExt};

async fn pipe<S>(mut stream: ExactBytes<S>) -> Result<Vec<u8>>
where
    S: Stream<Item = std::io::Result<Bytes>> + Unpin,
{
    let mut piped = Vec::new();
    while let Some(chunk) = stream.next().await {
        piped.extend_from_slice(&chunk?);
    }
    Ok(piped)
}

fn one_through_nine() -> impl Stream<Item = std::io::Result<Bytes>> + Unpin {
    chunk_stream(vec![vec![1, 2, 3], vec![4, 5, 6], vec![7, 8, 9]])
}

#[tokio::test]
async fn passes_through_an_exact_count() {
    init_logger();

    let piped = pipe(ExactBytes::new(one_through_nine(), 9)).await.unwrap();
    assert_eq!(piped, (1..=9).collect::<Vec<u8>>());
}

#[tokio::test]
async fn fails_on_end_of_input_short_of_size() {
    init_logger();

    let err = pipe(ExactBytes::new(one_through_nine(), 10)).await.unwrap_err();
    assert!(matches!(err, ZipError::ByteCountMismatch { expected: 10, actual: 9 }));
}

#[tokio::test]
async fn fails_on_the_first_byte_past_size() {
    init_logger();

    let err = pipe(ExactBytes::new(one_through_nine(), 8)).await.unwrap_err();
    assert!(matches!(err, ZipError::ByteCountMismatch { expected: 8, actual: 9 }));
}

#[tokio::test]
async fn is_the_identity_on_chunk_boundaries() {
    init_logger();

    // Prefixes up to the declared size flow through unmodified, chunking preserved.
    let mut stream = ExactBytes::new(one_through_nine(), 9);
    assert_eq!(&stream.next().await.unwrap().unwrap()[..], &[1, 2, 3]);
    assert_eq!(&stream.next().await.unwrap().unwrap()[..], &[4, 5, 6]);
    assert_eq!(&stream.next().await.unwrap().unwrap()[..], &[7, 8, 9]);
    assert!(stream.next().await.is_none());
}
