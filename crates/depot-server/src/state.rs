use std::sync::Arc;

use depot_store::ContentStore;

use crate::config::CompressionConfig;
use crate::encoding::TransportEncoder;
use crate::metadata::MetaStore;

/// Shared state handed to every request.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ContentStore>,
    pub meta: Arc<dyn MetaStore>,
    pub encoder: TransportEncoder,
}

impl AppState {
    pub fn new(
        store: Arc<dyn ContentStore>,
        meta: Arc<dyn MetaStore>,
        compression: &CompressionConfig,
    ) -> Self {
        Self {
            store,
            meta,
            encoder: TransportEncoder::new(compression),
        }
    }
}
