//! Time-bounded cache of text-blocked area codes.
//!
//! # Invariants
//! - A cached set is served while `0 <= now - cached_at < ttl`.
//! - Policy writes do not invalidate the cache; a change can take up to one
//!   TTL to reach the classifier.
//! - Failed refreshes are never cached.

use crate::config::EngineConfig;
use std::collections::BTreeSet;

#[derive(Debug, Clone)]
struct CachedCodes {
    codes: BTreeSet<String>,
    cached_at_ms: i64,
}

/// Text-blocked area codes with a fixed time-to-live.
#[derive(Debug, Clone)]
pub struct ClassificationCache {
    ttl_ms: i64,
    entry: Option<CachedCodes>,
}

impl Default for ClassificationCache {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl ClassificationCache {
    pub const fn new(ttl_ms: i64) -> Self {
        Self {
            ttl_ms,
            entry: None,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.text_cache_ttl_ms)
    }

    pub fn ttl_ms(&self) -> i64 {
        self.ttl_ms
    }

    /// Returns the cached set if still fresh at `now_ms`, otherwise runs
    /// `load` and caches its result.
    ///
    /// A failing `load` yields the empty set and leaves the cache empty.
    pub fn get<E>(
        &mut self,
        now_ms: i64,
        load: impl FnOnce() -> Result<BTreeSet<String>, E>,
    ) -> BTreeSet<String> {
        if let Some(entry) = &self.entry {
            let age_ms = now_ms - entry.cached_at_ms;
            if (0..self.ttl_ms).contains(&age_ms) {
                return entry.codes.clone();
            }
        }

        match load() {
            Ok(codes) => {
                self.entry = Some(CachedCodes {
                    codes: codes.clone(),
                    cached_at_ms: now_ms,
                });
                codes
            }
            Err(_) => {
                self.entry = None;
                BTreeSet::new()
            }
        }
    }

    /// Drops the cached set so the next `get` reloads.
    pub fn clear(&mut self) {
        self.entry = None;
    }

    pub fn cached_at_ms(&self) -> Option<i64> {
        self.entry.as_ref().map(|entry| entry.cached_at_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::ClassificationCache;
    use std::collections::BTreeSet;

    fn codes(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn fresh_entry_skips_loader() {
        let mut cache = ClassificationCache::new(60_000);
        let first = cache.get(1_000, || Ok::<_, ()>(codes(&["206"])));
        let second = cache.get(2_000, || -> Result<BTreeSet<String>, ()> {
            panic!("loader must not run while fresh")
        });
        assert_eq!(first, second);
    }

    #[test]
    fn expiry_boundary_is_exclusive() {
        let mut cache = ClassificationCache::new(60_000);
        cache.get(0, || Ok::<_, ()>(codes(&["206"])));

        let at_ttl = cache.get(60_000, || Ok::<_, ()>(codes(&["415"])));
        assert_eq!(at_ttl, codes(&["415"]));
        assert_eq!(cache.cached_at_ms(), Some(60_000));
    }

    #[test]
    fn failed_load_is_empty_and_not_cached() {
        let mut cache = ClassificationCache::new(60_000);
        let failed = cache.get(0, || Err::<BTreeSet<String>, _>("store down"));
        assert!(failed.is_empty());
        assert_eq!(cache.cached_at_ms(), None);

        let recovered = cache.get(1, || Ok::<_, ()>(codes(&["206"])));
        assert_eq!(recovered, codes(&["206"]));
    }

    #[test]
    fn clock_moving_backwards_forces_reload() {
        let mut cache = ClassificationCache::new(60_000);
        cache.get(10_000, || Ok::<_, ()>(codes(&["206"])));
        let reloaded = cache.get(5_000, || Ok::<_, ()>(codes(&["415"])));
        assert_eq!(reloaded, codes(&["415"]));
    }
}
