use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::cache::image::Image;
use crate::cache::key::ImageKey;

/// Key-to-entry lookup contract of the external cache container.
///
/// Eviction policy, memory accounting and the at-most-one-concurrent-producer
/// guarantee per key all live behind this boundary.
pub trait ImageCache: Send + Sync {
    /// Look up the entry for `key`, if present.
    fn get(&self, key: &ImageKey) -> Option<Arc<Image>>;
    /// Store an entry under its own key.
    fn insert(&self, image: Arc<Image>);
}

/// Unbounded in-memory cache, sufficient for tests and local renders.
#[derive(Default)]
pub struct MemoryImageCache {
    entries: Mutex<HashMap<ImageKey, Arc<Image>>>,
}

impl MemoryImageCache {
    /// New empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// True when no entry is stored.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<ImageKey, Arc<Image>>> {
        match self.entries.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl ImageCache for MemoryImageCache {
    fn get(&self, key: &ImageKey) -> Option<Arc<Image>> {
        self.lock().get(key).cloned()
    }

    fn insert(&self, image: Arc<Image>) {
        self.lock().insert(*image.key(), image);
    }
}
