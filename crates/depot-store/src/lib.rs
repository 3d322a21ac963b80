//! Content-addressed large object storage for Depot.
//!
//! Objects are keyed by the SHA-256 [`Oid`](depot_types::Oid) carried in a
//! [`Pointer`](depot_types::Pointer). The store holds exactly one copy of each
//! object regardless of how many repositories reference it.
//!
//! # Storage Backends
//!
//! All backends implement the [`ContentStore`] trait:
//!
//! - [`InMemoryContentStore`] -- `HashMap`-based store for tests and embedding
//! - [`FilesystemContentStore`] -- sharded directory tree on local disk
//!
//! # Design Rules
//!
//! 1. Objects are immutable once written.
//! 2. `put` verifies size and digest against the pointer before publishing.
//! 3. A partially written object is never visible to `exists` or `open`.
//! 4. Concurrent reads are always safe; concurrent puts of one oid converge.
//! 5. All I/O errors are propagated, never silently ignored.

pub mod error;
pub mod filesystem;
pub mod memory;
pub mod pointer;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use filesystem::FilesystemContentStore;
pub use memory::InMemoryContentStore;
pub use pointer::generate_pointer;
pub use traits::{ContentStore, ObjectReader};
