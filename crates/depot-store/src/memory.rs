use std::collections::HashMap;
use std::io::Cursor;
use std::sync::RwLock;

use async_trait::async_trait;
use bytes::Bytes;
use depot_types::{Oid, OidHasher, Pointer};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::{StoreError, StoreResult};
use crate::traits::{check_upload, ContentStore, ObjectReader};

/// In-memory, HashMap-based content store.
///
/// Intended for tests and embedding. Objects are held as [`Bytes`] behind a
/// `RwLock`, so opening an object is a cheap reference-counted slice. The lock
/// is never held across an await point.
pub struct InMemoryContentStore {
    objects: RwLock<HashMap<Oid, Bytes>>,
}

impl InMemoryContentStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
        }
    }

    /// Number of objects currently stored.
    pub fn len(&self) -> usize {
        self.objects.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.objects.read().expect("lock poisoned").is_empty()
    }

    /// Total bytes across all stored objects.
    pub fn total_bytes(&self) -> u64 {
        self.objects
            .read()
            .expect("lock poisoned")
            .values()
            .map(|data| data.len() as u64)
            .sum()
    }

    fn get(&self, oid: &Oid) -> Option<Bytes> {
        self.objects.read().expect("lock poisoned").get(oid).cloned()
    }
}

impl Default for InMemoryContentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentStore for InMemoryContentStore {
    async fn exists(&self, pointer: &Pointer) -> StoreResult<bool> {
        let map = self.objects.read().expect("lock poisoned");
        Ok(map.contains_key(&pointer.oid))
    }

    async fn put(
        &self,
        pointer: &Pointer,
        reader: &mut (dyn AsyncRead + Send + Unpin),
    ) -> StoreResult<()> {
        if self.exists(pointer).await? {
            tracing::debug!(oid = %pointer.oid, "object already stored");
            return Ok(());
        }

        // Read one byte past the declared size so oversized uploads are caught
        // without buffering an unbounded stream.
        let mut data = Vec::new();
        reader
            .take(pointer.size.saturating_add(1))
            .read_to_end(&mut data)
            .await?;

        let mut hasher = OidHasher::new();
        hasher.update(&data);
        check_upload(pointer, hasher)?;

        let mut map = self.objects.write().expect("lock poisoned");
        map.entry(pointer.oid).or_insert_with(|| Bytes::from(data));
        Ok(())
    }

    async fn open(&self, pointer: &Pointer, offset: u64) -> StoreResult<ObjectReader> {
        let data = self.get(&pointer.oid).ok_or(StoreError::NotFound(pointer.oid))?;
        let size = data.len() as u64;
        if offset > size {
            return Err(StoreError::InvalidOffset {
                oid: pointer.oid,
                offset,
                size,
            });
        }
        Ok(Box::pin(Cursor::new(data.slice(offset as usize..))))
    }

    async fn verify(&self, pointer: &Pointer) -> StoreResult<bool> {
        Ok(self
            .get(&pointer.oid)
            .is_some_and(|data| data.len() as u64 == pointer.size))
    }
}

impl std::fmt::Debug for InMemoryContentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.len();
        f.debug_struct("InMemoryContentStore")
            .field("object_count", &count)
            .finish()
    }
}
