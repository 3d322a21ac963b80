use std::fmt;

use serde::{Deserialize, Serialize};

use crate::oid::Oid;

/// Identifies a stored object by content hash and declared size.
///
/// A pointer is produced once per object and never changes. Any number of
/// repositories may hold the same pointer; the content behind it is shared.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pointer {
    pub oid: Oid,
    pub size: u64,
}

impl Pointer {
    pub fn new(oid: Oid, size: u64) -> Self {
        Self { oid, size }
    }

    /// Build the pointer for in-memory content.
    pub fn from_content(data: &[u8]) -> Self {
        Self {
            oid: Oid::of(data),
            size: data.len() as u64,
        }
    }
}

impl fmt::Display for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.oid, self.size)
    }
}
