use std::pin::Pin;

use async_trait::async_trait;
use depot_types::{OidHasher, Pointer};
use tokio::io::AsyncRead;

use crate::error::{StoreError, StoreResult};

/// A boxed, owned byte stream positioned somewhere inside a stored object.
pub type ObjectReader = Pin<Box<dyn AsyncRead + Send>>;

/// Content-addressed large object store.
///
/// All implementations must satisfy these invariants:
/// - Objects are immutable once written; the oid is the SHA-256 of the content.
/// - `put` of an oid that already exists succeeds without consuming the reader.
/// - A `put` in progress is never observable through `exists` or `open`.
/// - Concurrent reads are always safe.
/// - All I/O errors are propagated, never silently ignored.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Whether an object with this oid has been durably stored.
    async fn exists(&self, pointer: &Pointer) -> StoreResult<bool>;

    /// Store the full contents of `reader` under the pointer's oid.
    ///
    /// The content is checked against the pointer's size and oid before it
    /// is published. On mismatch nothing is stored and
    /// [`StoreError::SizeMismatch`] or [`StoreError::HashMismatch`] is returned.
    async fn put(
        &self,
        pointer: &Pointer,
        reader: &mut (dyn AsyncRead + Send + Unpin),
    ) -> StoreResult<()>;

    /// Open the object for sequential reading starting `offset` bytes in.
    ///
    /// `offset` may equal the object size, which yields an empty stream.
    /// Returns [`StoreError::NotFound`] if the object is absent and
    /// [`StoreError::InvalidOffset`] if `offset` is past the end.
    async fn open(&self, pointer: &Pointer, offset: u64) -> StoreResult<ObjectReader>;

    /// Whether the object exists and its stored size matches the pointer.
    async fn verify(&self, pointer: &Pointer) -> StoreResult<bool>;
}

/// Check a finished upload against its declared pointer.
pub(crate) fn check_upload(pointer: &Pointer, hasher: OidHasher) -> StoreResult<()> {
    if hasher.len() != pointer.size {
        return Err(StoreError::SizeMismatch {
            oid: pointer.oid,
            expected: pointer.size,
            actual: hasher.len(),
        });
    }
    let computed = hasher.finalize();
    if computed != pointer.oid {
        return Err(StoreError::HashMismatch {
            expected: pointer.oid,
            computed,
        });
    }
    Ok(())
}
