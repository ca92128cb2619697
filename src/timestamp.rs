// Copyright (c) 2024 Harry [Majored] [hello@majored.pw]
// MIT License (https://github.com/Majored/rs-zip-stream/blob/main/LICENSE)

use chrono::{DateTime, Utc};

/// The optional modify/access/create instants carried by an entry's extended timestamp field.
///
/// Instants are stored on the wire as signed 32-bit UNIX seconds, so values outside roughly
/// 1901..=2038 are silently truncated on write.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExtendedTimestamps {
    pub(crate) modified: Option<DateTime<Utc>>,
    pub(crate) accessed: Option<DateTime<Utc>>,
    pub(crate) created: Option<DateTime<Utc>>,
}

impl ExtendedTimestamps {
    /// Constructs a new set of timestamps with no instants set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the last modification instant.
    pub fn modified(mut self, instant: DateTime<Utc>) -> Self {
        self.modified = Some(instant);
        self
    }

    /// Sets the last access instant.
    pub fn accessed(mut self, instant: DateTime<Utc>) -> Self {
        self.accessed = Some(instant);
        self
    }

    /// Sets the creation instant.
    pub fn created(mut self, instant: DateTime<Utc>) -> Self {
        self.created = Some(instant);
        self
    }

    /// Returns the last modification instant, if set.
    pub fn last_modified(&self) -> Option<DateTime<Utc>> {
        self.modified
    }

    /// Returns the last access instant, if set.
    pub fn last_accessed(&self) -> Option<DateTime<Utc>> {
        self.accessed
    }

    /// Returns the creation instant, if set.
    pub fn creation(&self) -> Option<DateTime<Utc>> {
        self.created
    }

    /// Returns whether no instant is set at all.
    pub fn is_empty(&self) -> bool {
        self.modified.is_none() && self.accessed.is_none() && self.created.is_none()
    }
}

pub(crate) fn to_unix_seconds(instant: &DateTime<Utc>) -> i32 {
    instant.timestamp() as i32
}

pub(crate) fn from_unix_seconds(seconds: i32) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(seconds.into(), 0)
}
