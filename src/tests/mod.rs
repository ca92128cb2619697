// Copyright (c) 2024 Harry [Majored] [hello@majored.pw]
// MIT License (https://github.com/Majored/rs-zip-stream/blob/main/LICENSE)

pub(crate) mod exact;
pub(crate) mod extra_field;
pub(crate) mod partial;
pub(crate) mod roundtrip;

use std::io::Write;

use bytes::Bytes;
use futures_lite::stream;

pub(crate) fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// An upstream which yields the given chunks verbatim, then ends.
pub(crate) fn chunk_stream(
    chunks: Vec<Vec<u8>>,
) -> impl stream::Stream<Item = std::io::Result<Bytes>> + Unpin {
    stream::iter(chunks.into_iter().map(|chunk| Ok(Bytes::from(chunk))).collect::<Vec<_>>())
}

/// Splits `data` into `size`-byte chunks, deliberately misaligned with any ZIP frame boundary.
pub(crate) fn chunked(data: &[u8], size: usize) -> Vec<Vec<u8>> {
    data.chunks(size).map(|chunk| chunk.to_vec()).collect()
}

/// Compresses `data` as a bare DEFLATE stream, the form ZIP stores for method 8.
pub(crate) fn deflate(data: &[u8]) -> Vec<u8> {
    let mut encoder = flate2::write::DeflateEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(data).expect("failed to deflate");
    encoder.finish().expect("failed to finish deflate stream")
}
