//! HTTP server for Depot large objects.
//!
//! Serves content-addressed objects to LFS clients with single-range
//! `Range` support and optional gzip transport encoding. Bodies are streamed
//! straight from the [`ContentStore`](depot_store::ContentStore) in bounded
//! chunks; no object is ever held in memory whole.

pub mod config;
pub mod encoding;
pub mod error;
pub mod handler;
pub mod metadata;
pub mod range;
pub mod router;
pub mod server;
pub mod state;

pub use config::{CompressionConfig, ServerConfig};
pub use encoding::TransportEncoder;
pub use error::{ServerError, ServerResult};
pub use handler::ServingDecision;
pub use metadata::{Catalog, InMemoryMetaStore, MetaStore, RepoRef};
pub use range::{RangeOutcome, Window};
pub use server::DepotServer;
pub use state::AppState;
