// Copyright (c) 2024 Harry [Majored] [hello@majored.pw]
// MIT License (https://github.com/Majored/rs-zip-stream/blob/main/LICENSE)

//! Fixed-size ZIP header structures. The general purpose flag is kept as a raw word since this
//! crate only ever writes zero and only masks for the bits it refuses on read.

pub struct LocalFileHeader {
    pub version: u16,
    pub flags: u16,
    pub compression: u16,
    pub mod_time: u16,
    pub mod_date: u16,
    pub crc: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub file_name_length: u16,
    pub extra_field_length: u16,
}

pub struct CentralDirectoryHeader {
    pub v_made_by: u16,
    pub v_needed: u16,
    pub flags: u16,
    pub compression: u16,
    pub mod_time: u16,
    pub mod_date: u16,
    pub crc: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub file_name_length: u16,
    pub extra_field_length: u16,
    pub file_comment_length: u16,
    pub disk_start: u16,
    pub inter_attr: u16,
    pub exter_attr: u32,
    pub lh_offset: u32,
}

pub struct Zip64EndOfCentralDirectoryRecord {
    /// The size of this record, not counting the signature and this field itself.
    pub size_of_record: u64,
    pub version_made_by: u16,
    pub version_needed: u16,
    pub disk_number: u32,
    pub disk_number_start_of_cd: u32,
    pub num_entries_on_disk: u64,
    pub num_entries: u64,
    pub directory_size: u64,
    pub directory_offset: u64,
}

pub struct Zip64EndOfCentralDirectoryLocator {
    pub eocdr_disk: u32,
    pub eocdr_offset: u64,
    pub total_disks: u32,
}

pub struct EndOfCentralDirectoryHeader {
    pub disk_num: u16,
    pub start_cent_dir_disk: u16,
    pub num_of_entries_disk: u16,
    pub num_of_entries: u16,
    pub size_cent_dir: u32,
    pub cent_dir_offset: u32,
    pub file_comm_length: u16,
}
