// Copyright (c) 2024 Harry [Majored] [hello@majored.pw]
// MIT License (https://github.com/Majored/rs-zip-stream/blob/main/LICENSE)

// Local file header constants
pub const LFH_SIGNATURE: u32 = 0x4034b50;
/// The length of the fixed local file header, including the signature.
pub const LFH_LENGTH: usize = 30;

// Central directory header constants
pub const CDH_SIGNATURE: u32 = 0x2014b50;

// End of central directory record constants
pub const EOCDR_SIGNATURE: u32 = 0x6054b50;
pub const ZIP64_EOCDR_SIGNATURE: u32 = 0x6064b50;
pub const ZIP64_EOCDL_SIGNATURE: u32 = 0x7064b50;

/// The contents of a 32-bit header field when one must reference the zip64 extra field instead.
pub const NON_ZIP64_MAX_SIZE: u32 = 0xFFFFFFFF;
/// The contents of a 16-bit entry count when one must reference the zip64 record instead.
pub const NON_ZIP64_MAX_NUM_FILES: u16 = 0xFFFF;

/// The version this crate always writes and the highest it will read.
pub const ZIP64_VERSION: u16 = 45;

/// General purpose flag bits this crate refuses: traditional encryption (0), data descriptor (3),
/// patch data (5), and strong encryption (6).
pub const UNSUPPORTED_FLAG_MASK: u16 = 0x1 | 0x8 | 0x20 | 0x40;

// Extra field header ids
pub const ZIP64_EXTRA_FIELD_ID: u16 = 0x0001;
pub const EXTENDED_TIMESTAMP_EXTRA_FIELD_ID: u16 = 0x5455;
