use sha2::{Digest, Sha256};

use crate::oid::Oid;

/// Incremental SHA-256 hasher that also counts the bytes it has seen.
///
/// Stores feed uploads through this while writing them out so the digest and
/// size can be checked against the declared pointer before publishing.
#[derive(Clone, Default)]
pub struct OidHasher {
    inner: Sha256,
    len: u64,
}

impl OidHasher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed more content.
    pub fn update(&mut self, data: &[u8]) {
        self.inner.update(data);
        self.len += data.len() as u64;
    }

    /// Number of bytes fed so far.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Consume the hasher and return the oid of everything fed.
    pub fn finalize(self) -> Oid {
        let mut digest = [0u8; 32];
        digest.copy_from_slice(&self.inner.finalize());
        Oid::from_digest(digest)
    }
}

impl std::fmt::Debug for OidHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OidHasher").field("len", &self.len).finish()
    }
}
