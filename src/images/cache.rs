//! Image Cache
//!
//! Process-wide store mapping a semantic fingerprint to a generated image.
//! Entries are placement-agnostic and immutable; the only eviction is LRU
//! once the entry ceiling is reached.

use chrono::{DateTime, Utc};
use moka::policy::EvictionPolicy;
use moka::sync::Cache;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::types::{ImageContext, ImageResult, ImageStyle, PlacementSize};

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub image: ImageResult,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let lookups = self.hits + self.misses;
        if lookups == 0 {
            0.0
        } else {
            self.hits as f64 / lookups as f64
        }
    }
}

pub struct ImageCache {
    cache: Cache<String, Arc<CacheEntry>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ImageCache {
    pub fn new(max_entries: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_entries)
            .eviction_policy(EvictionPolicy::lru())
            .build();

        Self {
            cache,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Deterministic key over the normalized semantic fields. Field order
    /// and case/whitespace differences do not change the key.
    pub fn fingerprint(
        style: ImageStyle,
        context: &ImageContext,
        size: &PlacementSize,
        description: &str,
    ) -> String {
        let mut fields = BTreeMap::new();
        fields.insert("style", normalize(style.as_str()));
        fields.insert("grade", normalize(&context.grade));
        fields.insert("subject", normalize(&context.subject));
        fields.insert("size", normalize(size.as_str()));
        fields.insert("description", normalize(description));
        fields.insert(
            "theme",
            normalize(context.theme.as_deref().unwrap_or_default()),
        );

        let mut hasher = Sha256::new();
        for (key, value) in &fields {
            hasher.update(key.as_bytes());
            hasher.update(b"=");
            hasher.update(value.as_bytes());
            hasher.update(b"\n");
        }
        format!("{:x}", hasher.finalize())
    }

    /// Look up an image, counting the hit or miss
    pub fn get(&self, key: &str) -> Option<ImageResult> {
        match self.cache.get(key) {
            Some(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.image.clone())
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Store a real image. Placeholders are never cached.
    pub fn insert(&self, key: String, image: &ImageResult) {
        if image.is_placeholder() {
            return;
        }
        let entry = CacheEntry {
            image: ImageResult {
                placement_id: None,
                ..image.clone()
            },
            created_at: Utc::now(),
        };
        self.cache.insert(key, Arc::new(entry));
    }

    pub fn entry(&self, key: &str) -> Option<Arc<CacheEntry>> {
        self.cache.get(key)
    }

    /// Apply deferred bookkeeping, including capacity eviction
    pub fn run_pending_tasks(&self) {
        self.cache.run_pending_tasks();
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.run_pending_tasks();
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.cache.entry_count(),
        }
    }

    pub fn clear(&self) {
        self.cache.invalidate_all();
    }
}

fn normalize(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PLACEHOLDER_PREFIX;
    use proptest::prelude::*;

    fn context(theme: Option<&str>) -> ImageContext {
        ImageContext {
            grade: "3".to_string(),
            subject: "Science".to_string(),
            theme: theme.map(String::from),
        }
    }

    fn image(data: &str) -> ImageResult {
        ImageResult {
            base64_data: data.to_string(),
            media_type: "image/png".to_string(),
            width: 1024,
            height: 1024,
            placement_id: Some("q1".to_string()),
        }
    }

    #[test]
    fn test_fingerprint_normalizes_case_and_whitespace() {
        let a = ImageCache::fingerprint(
            ImageStyle::Cartoon,
            &context(Some("Space")),
            &PlacementSize::Small,
            "A   red planet",
        );
        let b = ImageCache::fingerprint(
            ImageStyle::Cartoon,
            &ImageContext {
                grade: " 3 ".to_string(),
                subject: "science".to_string(),
                theme: Some("space".to_string()),
            },
            &PlacementSize::from("SMALL".to_string()),
            "a red planet ",
        );
        assert_eq!(a, b);
    }

    #[test]
    fn test_fingerprint_distinguishes_fields() {
        let base = ImageCache::fingerprint(
            ImageStyle::Cartoon,
            &context(None),
            &PlacementSize::Small,
            "a red planet",
        );
        let other_style = ImageCache::fingerprint(
            ImageStyle::Realistic,
            &context(None),
            &PlacementSize::Small,
            "a red planet",
        );
        let other_theme = ImageCache::fingerprint(
            ImageStyle::Cartoon,
            &context(Some("ocean")),
            &PlacementSize::Small,
            "a red planet",
        );
        assert_ne!(base, other_style);
        assert_ne!(base, other_theme);
    }

    #[test]
    fn test_hit_miss_accounting() {
        let cache = ImageCache::new(10);
        assert!(cache.get("k").is_none());
        cache.insert("k".to_string(), &image("abcd"));

        let hit = cache.get("k").unwrap();
        assert_eq!(hit.base64_data, "abcd");
        assert_eq!(hit.placement_id, None);
        assert!(cache.entry("k").is_some());

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_placeholders_not_cached() {
        let cache = ImageCache::new(10);
        cache.insert("k".to_string(), &image(&format!("{}PHN2Zz4=", PLACEHOLDER_PREFIX)));
        assert!(cache.get("k").is_none());
    }

    #[test]
    fn test_least_recently_used_evicted_at_capacity() {
        let cache = ImageCache::new(2);
        cache.insert("a".to_string(), &image("aaaa"));
        cache.insert("b".to_string(), &image("bbbb"));
        cache.run_pending_tasks();

        assert!(cache.get("a").is_some());
        cache.run_pending_tasks();

        cache.insert("c".to_string(), &image("cccc"));
        cache.run_pending_tasks();

        assert!(cache.entry("b").is_none());
        assert!(cache.entry("a").is_some());
        assert!(cache.entry("c").is_some());
        assert_eq!(cache.stats().entries, 2);
    }

    #[test]
    fn test_clear() {
        let cache = ImageCache::new(10);
        cache.insert("a".to_string(), &image("aaaa"));
        cache.clear();
        assert!(cache.get("a").is_none());
    }

    proptest! {
        #[test]
        fn prop_fingerprint_stable_under_padding(desc in "[a-z]{1,8}( [a-z]{1,8}){0,4}") {
            let ctx = context(None);
            let plain = ImageCache::fingerprint(ImageStyle::Diagram, &ctx, &PlacementSize::Wide, &desc);
            let padded = format!("  {}  ", desc.to_uppercase().replace(' ', "   "));
            let noisy = ImageCache::fingerprint(ImageStyle::Diagram, &ctx, &PlacementSize::Wide, &padded);
            prop_assert_eq!(plain.len(), 64);
            prop_assert_eq!(plain, noisy);
        }
    }
}
