//! Local filesystem content store.

use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use depot_types::{Oid, OidHasher, Pointer};
use tokio::fs;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tracing::instrument;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::pointer::COPY_BUF_SIZE;
use crate::traits::{check_upload, ContentStore, ObjectReader};

/// Directory under the root that holds in-flight uploads.
const TMP_DIR: &str = "tmp";

/// Content store backed by a sharded directory tree.
///
/// Objects live at `<root>/ab/cd/abcd...`. Uploads are written to
/// `<root>/tmp/<uuid>`, fsynced, verified, and then renamed into place, so a
/// reader either sees the complete object or nothing at all. The temporary
/// directory sits under the same root to keep the rename on one filesystem.
pub struct FilesystemContentStore {
    root: PathBuf,
}

impl FilesystemContentStore {
    /// Open (or create) a store rooted at `root`.
    pub async fn new(root: impl AsRef<Path>) -> StoreResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(root.join(TMP_DIR)).await?;
        Ok(Self { root })
    }

    /// The root directory of this store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, oid: &Oid) -> PathBuf {
        self.root.join(oid.shard_path())
    }

    fn temp_path(&self) -> PathBuf {
        self.root.join(TMP_DIR).join(Uuid::now_v7().to_string())
    }

    /// Stream `reader` into `temp`, checking it against `pointer`.
    async fn write_temp(
        &self,
        temp: &Path,
        pointer: &Pointer,
        reader: &mut (dyn AsyncRead + Send + Unpin),
    ) -> StoreResult<()> {
        let mut file = fs::File::create(temp).await?;
        let mut hasher = OidHasher::new();
        let mut buf = vec![0u8; COPY_BUF_SIZE];
        loop {
            let n = reader.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
            if hasher.len() > pointer.size {
                return Err(StoreError::SizeMismatch {
                    oid: pointer.oid,
                    expected: pointer.size,
                    actual: hasher.len(),
                });
            }
            file.write_all(&buf[..n]).await?;
        }
        file.sync_all().await?;
        check_upload(pointer, hasher)
    }

    async fn publish(&self, temp: &Path, pointer: &Pointer) -> StoreResult<()> {
        let dest = self.object_path(&pointer.oid);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).await?;
        }
        // A concurrent put may already have published this oid; the rename
        // replaces it with identical bytes.
        fs::rename(temp, &dest).await?;
        Ok(())
    }

    async fn file_len(&self, oid: &Oid) -> StoreResult<Option<u64>> {
        match fs::metadata(self.object_path(oid)).await {
            Ok(meta) if meta.is_file() => Ok(Some(meta.len())),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Io(e)),
        }
    }
}

#[async_trait]
impl ContentStore for FilesystemContentStore {
    #[instrument(skip(self), fields(backend = "filesystem", oid = %pointer.oid))]
    async fn exists(&self, pointer: &Pointer) -> StoreResult<bool> {
        Ok(self.file_len(&pointer.oid).await?.is_some())
    }

    #[instrument(skip(self, reader), fields(backend = "filesystem", oid = %pointer.oid, size = pointer.size))]
    async fn put(
        &self,
        pointer: &Pointer,
        reader: &mut (dyn AsyncRead + Send + Unpin),
    ) -> StoreResult<()> {
        if self.exists(pointer).await? {
            tracing::debug!("object already stored");
            return Ok(());
        }

        let temp = self.temp_path();
        let result = match self.write_temp(&temp, pointer, reader).await {
            Ok(()) => self.publish(&temp, pointer).await,
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            if let Err(cleanup) = fs::remove_file(&temp).await {
                if cleanup.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(path = %temp.display(), error = %cleanup, "failed to remove temporary upload");
                }
            }
            return Err(e);
        }

        tracing::info!("object published");
        Ok(())
    }

    #[instrument(skip(self), fields(backend = "filesystem", oid = %pointer.oid))]
    async fn open(&self, pointer: &Pointer, offset: u64) -> StoreResult<ObjectReader> {
        let path = self.object_path(&pointer.oid);
        let mut file = fs::File::open(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StoreError::NotFound(pointer.oid)
            } else {
                StoreError::Io(e)
            }
        })?;

        let size = file.metadata().await?.len();
        if offset > size {
            return Err(StoreError::InvalidOffset {
                oid: pointer.oid,
                offset,
                size,
            });
        }
        if offset > 0 {
            file.seek(SeekFrom::Start(offset)).await?;
        }
        Ok(Box::pin(file))
    }

    #[instrument(skip(self), fields(backend = "filesystem", oid = %pointer.oid))]
    async fn verify(&self, pointer: &Pointer) -> StoreResult<bool> {
        Ok(self.file_len(&pointer.oid).await? == Some(pointer.size))
    }
}

impl std::fmt::Debug for FilesystemContentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilesystemContentStore")
            .field("root", &self.root)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    async fn new_store() -> (TempDir, FilesystemContentStore) {
        let dir = TempDir::new().unwrap();
        let store = FilesystemContentStore::new(dir.path()).await.unwrap();
        (dir, store)
    }

    async fn read_all(store: &FilesystemContentStore, pointer: &Pointer, offset: u64) -> Vec<u8> {
        let mut reader = store.open(pointer, offset).await.unwrap();
        let mut out = Vec::new();
        reader.read_to_end(&mut out).await.unwrap();
        out
    }

    fn tmp_entries(store: &FilesystemContentStore) -> usize {
        std::fs::read_dir(store.root().join(TMP_DIR)).unwrap().count()
    }

    #[tokio::test]
    async fn put_and_read_back() {
        let (_dir, store) = new_store().await;
        let content = b"hello filesystem";
        let pointer = Pointer::from_content(content);

        assert!(!store.exists(&pointer).await.unwrap());
        store.put(&pointer, &mut &content[..]).await.unwrap();
        assert!(store.exists(&pointer).await.unwrap());
        assert_eq!(read_all(&store, &pointer, 0).await, content);
    }

    #[tokio::test]
    async fn object_is_sharded_on_disk() {
        let (_dir, store) = new_store().await;
        let pointer = Pointer::from_content(b"layout");
        store.put(&pointer, &mut &b"layout"[..]).await.unwrap();

        let hex = pointer.oid.to_hex();
        let expected = store.root().join(&hex[0..2]).join(&hex[2..4]).join(&hex);
        assert!(expected.is_file());
        assert_eq!(tmp_entries(&store), 0);
    }

    #[tokio::test]
    async fn open_seeks_to_offset() {
        let (_dir, store) = new_store().await;
        let content = b"123456789\n";
        let pointer = Pointer::from_content(content);
        store.put(&pointer, &mut &content[..]).await.unwrap();

        assert_eq!(read_all(&store, &pointer, 1).await, b"23456789\n");
        assert!(read_all(&store, &pointer, 10).await.is_empty());
        let err = store.open(&pointer, 11).await.err().unwrap();
        assert!(matches!(err, StoreError::InvalidOffset { size: 10, .. }));
    }

    #[tokio::test]
    async fn open_missing_is_not_found() {
        let (_dir, store) = new_store().await;
        let err = store
            .open(&Pointer::from_content(b"nope"), 0)
            .await
            .err()
            .unwrap();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn rejected_upload_leaves_nothing_behind() {
        let (_dir, store) = new_store().await;
        let pointer = Pointer::from_content(b"declared");

        let err = store.put(&pointer, &mut &b"tampered"[..]).await.unwrap_err();
        assert!(matches!(err, StoreError::HashMismatch { .. }));
        let err = store.put(&pointer, &mut &b"short"[..]).await.unwrap_err();
        assert!(matches!(err, StoreError::SizeMismatch { .. }));
        let err = store
            .put(&pointer, &mut &b"declared and then some"[..])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::SizeMismatch { .. }));

        assert!(!store.exists(&pointer).await.unwrap());
        assert_eq!(tmp_entries(&store), 0);
    }

    #[tokio::test]
    async fn second_put_is_a_noop() {
        let (_dir, store) = new_store().await;
        let pointer = Pointer::from_content(b"once");
        store.put(&pointer, &mut &b"once"[..]).await.unwrap();
        // Content is not re-read, so even a wrong body succeeds.
        store.put(&pointer, &mut &b"ignored"[..]).await.unwrap();
        assert_eq!(read_all(&store, &pointer, 0).await, b"once");
    }

    #[tokio::test]
    async fn concurrent_puts_converge() {
        let (_dir, store) = new_store().await;
        let store = Arc::new(store);
        let content: Vec<u8> = (0..200_000).map(|i| (i % 251) as u8).collect();
        let pointer = Pointer::from_content(&content);

        let handles: Vec<_> = (0..6)
            .map(|_| {
                let store = Arc::clone(&store);
                let content = content.clone();
                tokio::spawn(async move { store.put(&pointer, &mut content.as_slice()).await })
            })
            .collect();
        for h in handles {
            h.await.unwrap().unwrap();
        }

        assert!(store.verify(&pointer).await.unwrap());
        assert_eq!(read_all(&store, &pointer, 0).await, content);
        assert_eq!(tmp_entries(&store), 0);
    }

    #[tokio::test]
    async fn readers_never_see_partial_upload() {
        let (_dir, store) = new_store().await;
        let store = Arc::new(store);
        let content: Vec<u8> = (0..32 * 1024).map(|i| (i % 251) as u8).collect();
        let pointer = Pointer::from_content(&content);
        let (mut writer, mut reader) = tokio::io::duplex(64);

        let uploader = {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.put(&pointer, &mut reader).await })
        };

        let half = content.len() / 2;
        writer.write_all(&content[..half]).await.unwrap();
        while tmp_entries(&store) == 0 {
            tokio::task::yield_now().await;
        }
        assert!(!store.exists(&pointer).await.unwrap());
        assert!(!store.verify(&pointer).await.unwrap());
        assert!(store.open(&pointer, 0).await.err().unwrap().is_not_found());

        writer.write_all(&content[half..]).await.unwrap();
        drop(writer);
        uploader.await.unwrap().unwrap();

        assert_eq!(read_all(&store, &pointer, 0).await, content);
        assert_eq!(tmp_entries(&store), 0);
    }

    #[tokio::test]
    async fn verify_compares_size() {
        let (_dir, store) = new_store().await;
        let pointer = Pointer::from_content(b"verify me");
        assert!(!store.verify(&pointer).await.unwrap());
        store.put(&pointer, &mut &b"verify me"[..]).await.unwrap();
        assert!(store.verify(&pointer).await.unwrap());
        assert!(!store.verify(&Pointer::new(pointer.oid, 1)).await.unwrap());
    }

    #[tokio::test]
    async fn reopen_existing_root() {
        let dir = TempDir::new().unwrap();
        let pointer = Pointer::from_content(b"persisted");
        {
            let store = FilesystemContentStore::new(dir.path()).await.unwrap();
            store.put(&pointer, &mut &b"persisted"[..]).await.unwrap();
        }
        let store = FilesystemContentStore::new(dir.path()).await.unwrap();
        assert!(store.exists(&pointer).await.unwrap());
    }
}
