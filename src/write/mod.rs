// Copyright (c) 2024 Harry [Majored] [hello@majored.pw]
// MIT License (https://github.com/Majored/rs-zip-stream/blob/main/LICENSE)

//! A ZIP writer which emits an archive into a sink as entries are produced.
//!
//! # API Design
//! The writer buffers nothing beyond the entry currently piping: each entry's local file header
//! is written as soon as the entry is supplied, its body is forwarded chunk by chunk, and only
//! the small per-entry records needed to later render the central directory are retained. The
//! writer never compresses data itself — a deflated entry is written from caller-supplied,
//! already-deflated bytes together with the sizes and CRC-32 the caller declares. Declared
//! sizes are enforced exactly; a body that runs long or short fails the archive rather than
//! corrupting it.
//!
//! Every entry is written in ZIP64 form: the 32-bit header size fields carry sentinels and the
//! real sizes live in the zip64 extra field, so sizes past 4 GiB need no special casing.
//!
//! # Example
//! ```no_run
//! # use zip_stream::error::Result;
//! # use zip_stream::write::{FileData, ZipStreamWriter};
//! # use zip_stream::ExtendedTimestamps;
//! # use bytes::Bytes;
//! #
//! # async fn run() -> Result<()> {
//! let mut writer = ZipStreamWriter::new(Vec::<u8>::new());
//!
//! let content = Bytes::from_static(b"This is an example file.");
//! let body = FileData::Stored {
//!     size: content.len() as u64,
//!     crc32: crc32fast::hash(&content),
//!     data: futures_lite::stream::once(Ok(content)),
//! };
//! writer.write_file("foo.txt", ExtendedTimestamps::new(), body).await?;
//!
//! let bytes = writer.close().await?;
//! #   Ok(())
//! # }
//! ```

pub(crate) mod io;

use crate::error::{Result, ZipError};
use crate::exact::ExactBytes;
use crate::spec::compression::Compression;
use crate::spec::consts::{
    CDH_SIGNATURE, EOCDR_SIGNATURE, LFH_SIGNATURE, NON_ZIP64_MAX_NUM_FILES, NON_ZIP64_MAX_SIZE,
    ZIP64_EOCDL_SIGNATURE, ZIP64_EOCDR_SIGNATURE, ZIP64_VERSION,
};
use crate::spec::extra_field::{ExtraField, ExtraFieldAsBytes, Zip64ExtraField};
use crate::spec::header::{
    CentralDirectoryHeader, EndOfCentralDirectoryHeader, LocalFileHeader, Zip64EndOfCentralDirectoryLocator,
    Zip64EndOfCentralDirectoryRecord,
};
use crate::timestamp::ExtendedTimestamps;

use self::io::OffsetWriter;

use bytes::Bytes;
use futures_lite::io::{AsyncWrite, AsyncWriteExt};
use futures_lite::stream::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;

/// The body of a file entry on the write side.
///
/// The byte stream supplies the on-wire bytes: raw content for `Stored`, already-deflated bytes
/// for `Deflated`. Either way the caller declares the sizes and the CRC-32 of the uncompressed
/// content up front, since both are written ahead of the body.
pub enum FileData<S> {
    Stored { size: u64, crc32: u32, data: S },
    Deflated { uncompressed_size: u64, compressed_size: u64, crc32: u32, data: S },
}

/// What the writer remembers about a written entry in order to render its central directory
/// header at close time.
struct CentralDirectoryEntry {
    filename: Vec<u8>,
    compression: Compression,
    crc32: u32,
    uncompressed_size: u64,
    compressed_size: u64,
    timestamps: ExtendedTimestamps,
    lfh_offset: u64,
}

/// A ZIP writer which emits entries into an [`AsyncWrite`] sink as they are supplied.
///
/// # Note
/// - [`ZipStreamWriter::close()`] must be called before the writer goes out of scope.
pub struct ZipStreamWriter<W> {
    writer: OffsetWriter<W>,
    cd_entries: Option<Vec<CentralDirectoryEntry>>,
    entries_written: u64,
    abort: Option<CancellationToken>,
}

impl<W> ZipStreamWriter<W>
where
    W: AsyncWrite + Unpin,
{
    /// Constructs a new ZIP writer over a sink.
    pub fn new(writer: W) -> Self {
        Self { writer: OffsetWriter::new(writer), cd_entries: Some(Vec::new()), entries_written: 0, abort: None }
    }

    /// Omits the central directory and its trailing records from the archive.
    ///
    /// The result remains decodable by this crate's streaming reader but not by random-access
    /// decoders, which locate entries through the central directory.
    pub fn without_central_directory(mut self) -> Self {
        self.cd_entries = None;
        self
    }

    /// Registers an abort signal checked before every write.
    pub fn with_abort(mut self, token: CancellationToken) -> Self {
        self.abort = Some(token);
        self
    }

    /// Returns the number of entries written so far.
    pub fn entries_written(&self) -> u64 {
        self.entries_written
    }

    fn check_abort(&self) -> Result<()> {
        if self.abort.as_ref().is_some_and(|token| token.is_cancelled()) {
            return Err(ZipError::Aborted);
        }
        Ok(())
    }

    /// Writes a directory entry. The name must end with `/` by ZIP convention; this writer does
    /// not enforce or append it.
    pub async fn write_directory(&mut self, name: &str, timestamps: ExtendedTimestamps) -> Result<()> {
        self.write_local_header(name, timestamps, Compression::Stored, 0, 0, 0).await?;
        self.entries_written += 1;

        tracing::debug!(name = %name, "wrote directory entry");
        Ok(())
    }

    /// Writes a file entry, piping its body straight through to the sink.
    ///
    /// The body is checked against the declared on-wire length as it flows; a mismatch fails
    /// with [`ZipError::ByteCountMismatch`] and poisons the archive.
    pub async fn write_file<S>(&mut self, name: &str, timestamps: ExtendedTimestamps, data: FileData<S>) -> Result<()>
    where
        S: Stream<Item = std::io::Result<Bytes>> + Unpin,
    {
        let (compression, uncompressed_size, compressed_size, crc32, body) = match data {
            FileData::Stored { size, crc32, data } => (Compression::Stored, size, size, crc32, data),
            FileData::Deflated { uncompressed_size, compressed_size, crc32, data } => {
                (Compression::Deflate, uncompressed_size, compressed_size, crc32, data)
            }
        };

        self.write_local_header(name, timestamps, compression, crc32, uncompressed_size, compressed_size).await?;

        let mut body = ExactBytes::new(body, compressed_size);
        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            self.check_abort()?;
            self.writer.write_all(&chunk).await?;
        }

        self.entries_written += 1;
        tracing::debug!(name = %name, compressed_size, uncompressed_size, "wrote file entry");
        Ok(())
    }

    async fn write_local_header(
        &mut self,
        name: &str,
        timestamps: ExtendedTimestamps,
        compression: Compression,
        crc32: u32,
        uncompressed_size: u64,
        compressed_size: u64,
    ) -> Result<()> {
        self.check_abort()?;

        let filename = name.as_bytes();
        if filename.len() > u16::MAX as usize {
            return Err(ZipError::FilenameTooLong(filename.len()));
        }

        let mut extra_fields = vec![ExtraField::Zip64(Zip64ExtraField {
            uncompressed_size: Some(uncompressed_size),
            compressed_size: Some(compressed_size),
            header_offset: None,
        })];
        if !timestamps.is_empty() {
            extra_fields.push(ExtraField::Timestamp(timestamps));
        }
        let extra = extra_fields.as_slice().as_bytes();

        let header = LocalFileHeader {
            version: ZIP64_VERSION,
            flags: 0,
            compression: compression.into(),
            mod_time: 0,
            mod_date: 0,
            crc: crc32,
            compressed_size: NON_ZIP64_MAX_SIZE,
            uncompressed_size: NON_ZIP64_MAX_SIZE,
            file_name_length: filename.len() as u16,
            extra_field_length: extra.len() as u16,
        };

        let lfh_offset = self.writer.offset();
        self.writer.write_all(&LFH_SIGNATURE.to_le_bytes()).await?;
        self.writer.write_all(&header.as_slice()).await?;
        self.writer.write_all(filename).await?;
        self.writer.write_all(&extra).await?;

        if let Some(entries) = self.cd_entries.as_mut() {
            entries.push(CentralDirectoryEntry {
                filename: filename.to_vec(),
                compression,
                crc32,
                uncompressed_size,
                compressed_size,
                timestamps,
                lfh_offset,
            });
        }

        Ok(())
    }

    async fn write_central_header(&mut self, entry: &CentralDirectoryEntry) -> Result<()> {
        let mut extra_fields = vec![ExtraField::Zip64(Zip64ExtraField {
            uncompressed_size: Some(entry.uncompressed_size),
            compressed_size: Some(entry.compressed_size),
            header_offset: Some(entry.lfh_offset),
        })];
        if !entry.timestamps.is_empty() {
            extra_fields.push(ExtraField::Timestamp(entry.timestamps));
        }
        let extra = extra_fields.as_slice().as_bytes();

        let header = CentralDirectoryHeader {
            v_made_by: ZIP64_VERSION,
            v_needed: ZIP64_VERSION,
            flags: 0,
            compression: entry.compression.into(),
            mod_time: 0,
            mod_date: 0,
            crc: entry.crc32,
            compressed_size: NON_ZIP64_MAX_SIZE,
            uncompressed_size: NON_ZIP64_MAX_SIZE,
            file_name_length: entry.filename.len() as u16,
            extra_field_length: extra.len() as u16,
            file_comment_length: 0,
            disk_start: 0,
            inter_attr: 0,
            exter_attr: 0,
            lh_offset: NON_ZIP64_MAX_SIZE,
        };

        self.writer.write_all(&CDH_SIGNATURE.to_le_bytes()).await?;
        self.writer.write_all(&header.as_slice()).await?;
        self.writer.write_all(&entry.filename).await?;
        self.writer.write_all(&extra).await?;

        Ok(())
    }

    /// Consumes this ZIP writer and completes all closing tasks.
    ///
    /// Unless the central directory was omitted, this includes writing all central directory
    /// headers, the zip64 end of central directory record and locator, and the end of central
    /// directory record. The sink is then closed and handed back.
    ///
    /// Failure to call this function before going out of scope would result in a corrupted ZIP
    /// file.
    pub async fn close(mut self) -> Result<W> {
        self.check_abort()?;

        if let Some(entries) = self.cd_entries.take() {
            let cd_offset = self.writer.offset();
            for entry in &entries {
                self.check_abort()?;
                self.write_central_header(entry).await?;
            }
            let cd_size = self.writer.offset() - cd_offset;
            let eocdr_offset = self.writer.offset();
            let num_entries = entries.len() as u64;

            let eocdr = Zip64EndOfCentralDirectoryRecord {
                size_of_record: 44,
                version_made_by: ZIP64_VERSION,
                version_needed: ZIP64_VERSION,
                disk_number: 0,
                disk_number_start_of_cd: 0,
                num_entries_on_disk: num_entries,
                num_entries,
                directory_size: cd_size,
                directory_offset: cd_offset,
            };
            self.writer.write_all(&ZIP64_EOCDR_SIGNATURE.to_le_bytes()).await?;
            self.writer.write_all(&eocdr.as_slice()).await?;

            let locator =
                Zip64EndOfCentralDirectoryLocator { eocdr_disk: 0, eocdr_offset, total_disks: 1 };
            self.writer.write_all(&ZIP64_EOCDL_SIGNATURE.to_le_bytes()).await?;
            self.writer.write_all(&locator.as_slice()).await?;

            // The classic record carries only sentinels; readers are pushed to the zip64 pair
            // above.
            let eocd = EndOfCentralDirectoryHeader {
                disk_num: 0,
                start_cent_dir_disk: 0,
                num_of_entries_disk: NON_ZIP64_MAX_NUM_FILES,
                num_of_entries: NON_ZIP64_MAX_NUM_FILES,
                size_cent_dir: NON_ZIP64_MAX_SIZE,
                cent_dir_offset: NON_ZIP64_MAX_SIZE,
                file_comm_length: 0,
            };
            self.writer.write_all(&EOCDR_SIGNATURE.to_le_bytes()).await?;
            self.writer.write_all(&eocd.as_slice()).await?;
        }

        self.writer.close().await?;
        tracing::debug!(entries = self.entries_written, bytes = self.writer.offset(), "zip stream closed");

        Ok(self.writer.into_inner())
    }
}
