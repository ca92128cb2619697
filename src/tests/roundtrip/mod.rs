// Copyright (c) 2024 Harry [Majored] [hello@majored.pw]
// MIT License (https://github.com/Majored/rs-zip-stream/blob/main/LICENSE)

use crate::read::{ZipEntry, ZipStreamReader};
use crate::tests::{chunk_stream, chunked, deflate, init_logger};
use crate::write::{FileData, ZipStreamWriter};
use crate::ExtendedTimestamps;

use chrono::DateTime;
use futures_lite::io::AsyncReadExt;

#[tokio::test]
async fn directory_and_files_survive_a_round_trip() {
    init_logger();

    let created = DateTime::from_timestamp(1_640_000_000, 0).unwrap();
    let accessed = DateTime::from_timestamp(1_650_000_000, 0).unwrap();
    let dir_timestamps = ExtendedTimestamps::new().created(created).accessed(accessed);

    let mut writer = ZipStreamWriter::new(Vec::<u8>::new());
    writer.write_directory("some-subdir/", dir_timestamps).await.unwrap();

    let contents: Vec<Vec<u8>> =
        (0..5).map(|index| format!("Contents of item-{index} here!").into_bytes()).collect();
    for (index, content) in contents.iter().enumerate() {
        let body = FileData::Stored {
            size: content.len() as u64,
            crc32: crc32fast::hash(content),
            data: chunk_stream(chunked(content, 10)),
        };
        writer.write_file(&format!("item-{index}"), ExtendedTimestamps::new(), body).await.unwrap();
    }
    let bytes = writer.close().await.unwrap();

    // Feed the archive back through chunk boundaries that align with nothing.
    let mut reader = ZipStreamReader::from_chunk_stream(chunk_stream(chunked(&bytes, 13)));

    let entry = reader.next_entry().await.unwrap().unwrap();
    let ZipEntry::Directory(dir) = entry else { panic!("expected the directory first") };
    assert_eq!(dir.name(), "some-subdir/");
    assert_eq!(dir.timestamps().creation(), Some(created));
    assert_eq!(dir.timestamps().last_accessed(), Some(accessed));
    assert_eq!(dir.timestamps().last_modified(), None);

    for (index, content) in contents.iter().enumerate() {
        let entry = reader.next_entry().await.unwrap().unwrap();
        let ZipEntry::File(mut file) = entry else { panic!("expected a file entry") };

        assert_eq!(file.name(), format!("item-{index}"));
        assert_eq!(file.uncompressed_size(), 24);
        assert_eq!(file.compressed_size(), 24);
        assert_eq!(file.crc32(), crc32fast::hash(content));
        assert!(file.timestamps().is_empty());

        let mut body = file.body().stream().unwrap();
        let mut read = Vec::new();
        body.read_to_end(&mut read).await.unwrap();
        assert_eq!(&read, content);
        assert_eq!(body.computed_crc32(), file.crc32());
    }

    assert!(reader.next_entry().await.unwrap().is_none(), "central directory ends the stream");
}

#[tokio::test]
async fn a_deflated_entry_survives_a_round_trip() {
    init_logger();

    let content = b"Deflate round trip content. Deflate round trip content.".repeat(20);
    let compressed = deflate(&content);

    let mut writer = ZipStreamWriter::new(Vec::<u8>::new());
    let body = FileData::Deflated {
        uncompressed_size: content.len() as u64,
        compressed_size: compressed.len() as u64,
        crc32: crc32fast::hash(&content),
        data: chunk_stream(chunked(&compressed, 17)),
    };
    writer.write_file("repeated.txt", ExtendedTimestamps::new(), body).await.unwrap();
    let bytes = writer.close().await.unwrap();

    let mut reader = ZipStreamReader::from_chunk_stream(chunk_stream(chunked(&bytes, 19)));
    let entry = reader.next_entry().await.unwrap().unwrap();
    let ZipEntry::File(mut file) = entry else { panic!("expected a file entry") };

    assert_eq!(file.uncompressed_size(), content.len() as u64);
    assert_eq!(file.compressed_size(), compressed.len() as u64);

    let mut body = file.body().stream().unwrap();
    let mut read = Vec::new();
    body.read_to_end(&mut read).await.unwrap();
    assert_eq!(read, content);
    assert_eq!(body.computed_crc32(), crc32fast::hash(&content));
    drop(file);

    assert!(reader.next_entry().await.unwrap().is_none());
}

#[tokio::test]
async fn draining_some_entries_leaves_the_rest_readable() {
    init_logger();

    let mut writer = ZipStreamWriter::new(Vec::<u8>::new());
    for index in 0..3 {
        let content = format!("entry number {index}").into_bytes();
        let body = FileData::Stored {
            size: content.len() as u64,
            crc32: crc32fast::hash(&content),
            data: chunk_stream(vec![content]),
        };
        writer.write_file(&format!("entry-{index}"), ExtendedTimestamps::new(), body).await.unwrap();
    }
    let bytes = writer.close().await.unwrap();

    // Skip the first two bodies, then read the third in full via the BYOB source.
    let mut reader = ZipStreamReader::from_reader(&bytes[..]);
    for index in 0..2 {
        let entry = reader.next_entry().await.unwrap().unwrap();
        let ZipEntry::File(mut file) = entry else { panic!("expected a file entry") };
        assert_eq!(file.name(), format!("entry-{index}"));
        file.body().drain().await.unwrap();
    }

    let entry = reader.next_entry().await.unwrap().unwrap();
    let ZipEntry::File(mut file) = entry else { panic!("expected a file entry") };
    let mut read = Vec::new();
    file.body().stream().unwrap().read_to_end(&mut read).await.unwrap();
    assert_eq!(read, b"entry number 2");
}
