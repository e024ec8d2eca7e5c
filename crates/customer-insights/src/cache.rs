//! In-memory cache of cleaned datasets.
//!
//! Loading and imputing a dataset is the expensive part of every view, so
//! results are kept per source identity and shared behind an `Arc`.

use crate::error::Result;
use crate::pipeline::Pipeline;
use crate::source::DataSource;
use crate::types::PipelineResult;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Thread-safe cache of pipeline results keyed by [`DataSource::identity`].
///
/// The lock is held while a missing entry is loaded, so concurrent callers
/// asking for the same source wait for the first load instead of repeating it.
#[derive(Default)]
pub struct DatasetCache {
    entries: Mutex<HashMap<String, Arc<PipelineResult>>>,
}

static_assertions::assert_impl_all!(DatasetCache: Send, Sync);

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cleaned dataset for `source`, loading and imputing it on
    /// first use.
    ///
    /// Failed loads are not cached.
    pub fn get_or_load(
        &self,
        source: &DataSource,
        pipeline: &Pipeline,
    ) -> Result<Arc<PipelineResult>> {
        let key = source.identity();
        let mut entries = self.entries.lock();

        if let Some(hit) = entries.get(&key) {
            debug!("Cache hit for {}", key);
            return Ok(Arc::clone(hit));
        }

        info!("Cache miss for {}, loading", key);
        let result = Arc::new(pipeline.run(source)?);
        entries.insert(key, Arc::clone(&result));
        Ok(result)
    }

    /// Cached result for `source`, if any.
    pub fn get(&self, source: &DataSource) -> Option<Arc<PipelineResult>> {
        self.entries.lock().get(&source.identity()).cloned()
    }

    /// Drop the cached entry for `source`. Returns whether one existed.
    pub fn invalidate(&self, source: &DataSource) -> bool {
        self.entries.lock().remove(&source.identity()).is_some()
    }

    /// Drop every cached entry.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
