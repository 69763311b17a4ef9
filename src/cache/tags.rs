//! Tag → key secondary index.
//!
//! Every miss write registers its key under the tags its context collected,
//! so a single tag invalidation can delete all entries sharing that label
//! without a pattern scan. The index is in-process and tracks each key's
//! expiry: expired keys are pruned every [`PRUNE_EVERY`] registrations and
//! by [`TagRegistry::prune_expired`], so it stays bounded by the live entries
//! even when the store expires them server-side.

use crate::cache::types::CacheKey;
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tracing::debug;

/// Registrations between opportunistic prunes
pub const PRUNE_EVERY: usize = 256;

#[derive(Debug)]
struct Registration {
    tags: Vec<String>,
    expires_at: Instant,
}

impl Registration {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

#[derive(Debug, Default)]
pub struct TagRegistry {
    tag_to_keys: DashMap<String, HashSet<CacheKey>>,
    key_to_tags: DashMap<CacheKey, Registration>,
    registrations: AtomicUsize,
}

impl TagRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a key under each of `tags` for as long as the entry lives.
    ///
    /// Re-registering a key replaces its previous tags and expiry.
    pub fn register<'a, I>(&self, key: &str, tags: I, ttl: Duration)
    where
        I: IntoIterator<Item = &'a String>,
    {
        let tags: Vec<String> = tags.into_iter().cloned().collect();
        let expires_at = Instant::now() + ttl;

        if let Some(previous) = self.key_to_tags.insert(
            key.to_string(),
            Registration {
                tags: tags.clone(),
                expires_at,
            },
        ) {
            for tag in previous.tags.iter().filter(|t| !tags.contains(t)) {
                self.unlink(tag, key);
            }
        }

        for tag in tags {
            self.tag_to_keys
                .entry(tag)
                .or_default()
                .insert(key.to_string());
        }

        if self.registrations.fetch_add(1, Ordering::Relaxed) % PRUNE_EVERY == PRUNE_EVERY - 1 {
            self.prune_expired();
        }
    }

    /// Keys currently registered under a tag
    pub fn keys_for_tag(&self, tag: &str) -> HashSet<CacheKey> {
        self.tag_to_keys
            .get(tag)
            .map(|keys| keys.clone())
            .unwrap_or_default()
    }

    /// Remove a tag and return the keys it covered.
    ///
    /// Keys whose registration expired are included: a remote store may keep
    /// them slightly longer than the local clock says, and deleting a
    /// missing key is harmless.
    pub fn take_tag(&self, tag: &str) -> HashSet<CacheKey> {
        let keys = self
            .tag_to_keys
            .remove(tag)
            .map(|(_, keys)| keys)
            .unwrap_or_default();

        for key in &keys {
            self.forget_key(key);
        }
        keys
    }

    /// Drop a key from each of its own tags, removing tags left empty
    pub fn forget_key(&self, key: &str) {
        if let Some((_, registration)) = self.key_to_tags.remove(key) {
            for tag in &registration.tags {
                self.unlink(tag, key);
            }
        }
    }

    /// Forget every key whose entry has expired. Returns how many were dropped.
    pub fn prune_expired(&self) -> usize {
        let now = Instant::now();
        let expired: Vec<CacheKey> = self
            .key_to_tags
            .iter()
            .filter(|entry| entry.value().is_expired(now))
            .map(|entry| entry.key().clone())
            .collect();

        let mut pruned = 0;
        for key in &expired {
            // Skip keys re-registered since the scan above
            let still_expired = self
                .key_to_tags
                .get(key)
                .map(|r| r.is_expired(now))
                .unwrap_or(false);
            if still_expired {
                self.forget_key(key);
                pruned += 1;
            }
        }

        if pruned > 0 {
            debug!("Pruned {} expired keys from the tag index", pruned);
        }
        pruned
    }

    /// Number of tracked tags
    pub fn tag_count(&self) -> usize {
        self.tag_to_keys.len()
    }

    /// Number of tracked keys
    pub fn key_count(&self) -> usize {
        self.key_to_tags.len()
    }

    pub fn clear(&self) {
        self.tag_to_keys.clear();
        self.key_to_tags.clear();
    }

    fn unlink(&self, tag: &str, key: &str) {
        if let Some(mut keys) = self.tag_to_keys.get_mut(tag) {
            keys.remove(key);
        }
        self.tag_to_keys.remove_if(tag, |_, keys| keys.is_empty());
    }
}

/// Periodically prune expired keys from the tag index
pub async fn start_tag_pruning(tags: std::sync::Arc<TagRegistry>, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    ticker.tick().await;

    loop {
        ticker.tick().await;
        tags.prune_expired();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LONG: Duration = Duration::from_secs(300);

    fn tags(list: &[&str]) -> Vec<String> {
        list.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = TagRegistry::new();
        registry.register("profile:u1", &tags(&["profile", "profile:u1"]), LONG);
        registry.register("profile:u2", &tags(&["profile", "profile:u2"]), LONG);

        assert_eq!(registry.keys_for_tag("profile").len(), 2);
        assert_eq!(
            registry.keys_for_tag("profile:u1"),
            HashSet::from(["profile:u1".to_string()])
        );
        assert!(registry.keys_for_tag("balance").is_empty());
    }

    #[test]
    fn test_take_tag_removes_mapping() {
        let registry = TagRegistry::new();
        registry.register("profile:u1", &tags(&["profile", "profile:u1"]), LONG);

        let keys = registry.take_tag("profile:u1");
        assert_eq!(keys.len(), 1);
        assert!(registry.take_tag("profile:u1").is_empty());
        // The key left its other tags too
        assert_eq!(registry.tag_count(), 0);
        assert_eq!(registry.key_count(), 0);
    }

    #[test]
    fn test_forget_key_prunes_empty_tags() {
        let registry = TagRegistry::new();
        registry.register("profile:u1", &tags(&["profile", "profile:u1"]), LONG);
        registry.register("profile:u2", &tags(&["profile"]), LONG);

        registry.forget_key("profile:u1");

        assert_eq!(registry.tag_count(), 1);
        assert_eq!(
            registry.keys_for_tag("profile"),
            HashSet::from(["profile:u2".to_string()])
        );
    }

    #[test]
    fn test_reregistering_replaces_tags() {
        let registry = TagRegistry::new();
        registry.register("stats", &tags(&["stats", "stats:daily"]), LONG);
        registry.register("stats", &tags(&["stats"]), LONG);

        assert!(registry.keys_for_tag("stats:daily").is_empty());
        assert_eq!(registry.tag_count(), 1);
        assert_eq!(registry.key_count(), 1);
    }

    #[test]
    fn test_expired_keys_leave_the_index() {
        let registry = TagRegistry::new();
        for i in 0..1000 {
            let key = format!("profile:u{}", i);
            registry.register(&key, &tags(&["profile", key.as_str()]), Duration::from_millis(20));
        }
        registry.register("stats", &tags(&["stats"]), LONG);

        std::thread::sleep(Duration::from_millis(60));
        registry.prune_expired();

        assert_eq!(registry.key_count(), 1);
        assert_eq!(registry.tag_count(), 1);
        assert!(registry.keys_for_tag("profile").is_empty());
        assert!(registry.keys_for_tag("stats").contains("stats"));
    }

    #[test]
    fn test_registration_prunes_periodically() {
        let registry = TagRegistry::new();
        for i in 0..PRUNE_EVERY - 1 {
            let key = format!("balance:u{}", i);
            registry.register(&key, &tags(&["balance", key.as_str()]), Duration::ZERO);
        }
        assert_eq!(registry.key_count(), PRUNE_EVERY - 1);

        registry.register("stats", &tags(&["stats"]), LONG);

        assert_eq!(registry.key_count(), 1);
        assert_eq!(registry.tag_count(), 1);
    }

    #[tokio::test]
    async fn test_pruning_task() {
        let registry = std::sync::Arc::new(TagRegistry::new());
        registry.register("balance:u1", &tags(&["balance"]), Duration::from_millis(10));

        let task = tokio::spawn(start_tag_pruning(registry.clone(), Duration::from_millis(20)));
        tokio::time::sleep(Duration::from_millis(150)).await;
        task.abort();

        assert_eq!(registry.key_count(), 0);
    }
}
