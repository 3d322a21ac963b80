//! Synchronization of user accounts from external login sources.
//!
//! A pass walks the configured sources in order and hands each eligible one
//! to its backend. Cancellation is cooperative: the token is checked between
//! sources, never in the middle of one.

pub mod error;
pub mod source;
pub mod sync;

pub use error::{SyncError, SyncResult};
pub use source::{
    LoginSource, SourceConfig, SourceRegistry, StaticSourceRegistry, SynchronizableSource,
};
pub use sync::{sync_external_users, SyncReport};
