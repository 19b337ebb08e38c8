pub mod memory;

use std::sync::Arc;

use parking_lot::RwLock;

pub use memory::{fold_case, ApiIndex, IndexMetadata, IndexStats, IngestSummary, MethodHit};

/// Index shared between the indexing path (write lock per ingest/clear) and
/// any number of concurrent readers.
pub type SharedIndex = Arc<RwLock<ApiIndex>>;

pub fn shared_index(index: ApiIndex) -> SharedIndex {
    Arc::new(RwLock::new(index))
}
