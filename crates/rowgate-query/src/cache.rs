//! Memoization of parsed accessor descriptors.
//!
//! Parsing walks an ordered regex table, so repeated dispatch of the same
//! accessor name caches the resulting descriptor keyed by the name.

use crate::accessor::{AccessorDescriptor, parse};
use rowgate_core::Result;
use std::collections::HashMap;
use std::time::Instant;

/// A cached parsed descriptor.
#[derive(Debug, Clone)]
struct CachedDescriptor {
    descriptor: AccessorDescriptor,
    /// When this entry was last accessed.
    last_used: Instant,
    /// Number of times this descriptor has been served.
    hit_count: u64,
}

/// LRU-style cache of parsed accessor descriptors.
///
/// When the cache exceeds `max_size`, the least-recently-used entry is
/// evicted. Names that fail to parse are not cached.
///
/// # Example
///
/// ```
/// use rowgate_query::AccessorCache;
///
/// let mut cache = AccessorCache::new(100);
/// let first = cache.get_or_parse("getByName").unwrap();
/// let second = cache.get_or_parse("getByName").unwrap();
/// assert_eq!(first, second);
/// assert_eq!(cache.len(), 1);
/// ```
#[derive(Debug)]
pub struct AccessorCache {
    cache: HashMap<String, CachedDescriptor>,
    max_size: usize,
}

impl AccessorCache {
    /// Create a new cache with the given maximum number of entries.
    #[must_use]
    pub fn new(max_size: usize) -> Self {
        Self {
            cache: HashMap::with_capacity(max_size.min(256)),
            max_size,
        }
    }

    /// Get a cached descriptor or parse and insert it.
    pub fn get_or_parse(&mut self, name: &str) -> Result<AccessorDescriptor> {
        if let Some(entry) = self.cache.get_mut(name) {
            entry.last_used = Instant::now();
            entry.hit_count += 1;
            return Ok(entry.descriptor.clone());
        }

        let descriptor = parse(name)?;
        if self.cache.len() >= self.max_size {
            self.evict_lru();
        }
        self.cache.insert(
            name.to_string(),
            CachedDescriptor {
                descriptor: descriptor.clone(),
                last_used: Instant::now(),
                hit_count: 1,
            },
        );
        Ok(descriptor)
    }

    /// Check if a name is cached.
    pub fn contains(&self, name: &str) -> bool {
        self.cache.contains_key(name)
    }

    /// Number of cached descriptors.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Clear all cached descriptors.
    pub fn clear(&mut self) {
        self.cache.clear();
    }

    /// Evict the least-recently-used entry.
    fn evict_lru(&mut self) {
        if let Some(lru_key) = self
            .cache
            .iter()
            .min_by_key(|(_, entry)| entry.last_used)
            .map(|(key, _)| key.clone())
        {
            self.cache.remove(&lru_key);
        }
    }
}

impl Default for AccessorCache {
    fn default() -> Self {
        Self::new(1024)
    }
}
