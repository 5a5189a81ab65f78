use std::collections::HashMap;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::estimate::PriceEstimate;
use crate::form::{Answers, Form};

/// Most entries kept on disk. Storing past this evicts the oldest.
pub const MAX_ENTRIES: usize = 500;

/// Estimates computed earlier, keyed by form and answer set.
///
/// An entry is only valid for the form and guide versions it was computed
/// under; bumping either version turns every existing entry into a miss.
/// The cache holds at most [`MAX_ENTRIES`] entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimateCache {
    pub version: u32,
    #[serde(default)]
    pub entries: HashMap<String, CachedEstimate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedEstimate {
    pub form_version: u32,
    pub guide_version: u32,
    pub computed_at: DateTime<Utc>,
    pub estimate: PriceEstimate,
}

impl Default for EstimateCache {
    fn default() -> Self {
        Self::new()
    }
}

impl EstimateCache {
    /// Create a new empty cache with version 1
    pub fn new() -> Self {
        Self {
            version: 1,
            entries: HashMap::new(),
        }
    }

    /// Key for a form's answer set: the form id followed by the answers as
    /// canonical JSON (answers are an ordered map, so equal sets give equal
    /// keys).
    pub fn key(form: &Form, answers: &Answers) -> Result<String> {
        let encoded = serde_json::to_string(answers).context("Failed to encode answers")?;
        Ok(format!("{}:{}", form.id, encoded))
    }

    /// Cached estimate for `key`, if it was computed under these versions.
    pub fn lookup(&self, key: &str, form_version: u32, guide_version: u32) -> Option<&PriceEstimate> {
        self.entries
            .get(key)
            .filter(|entry| entry.form_version == form_version && entry.guide_version == guide_version)
            .map(|entry| &entry.estimate)
    }

    /// Insert an estimate, then evict the oldest entries beyond [`MAX_ENTRIES`].
    pub fn store(&mut self, key: String, form_version: u32, estimate: PriceEstimate) {
        self.entries.insert(
            key,
            CachedEstimate {
                form_version,
                guide_version: estimate.guide_version,
                computed_at: Utc::now(),
                estimate,
            },
        );
        self.evict_oldest(MAX_ENTRIES);
    }

    /// Drop the entries with the oldest `computed_at` until at most `keep`
    /// remain. Returns the number of entries removed.
    pub fn evict_oldest(&mut self, keep: usize) -> usize {
        if self.entries.len() <= keep {
            return 0;
        }

        let mut by_age: Vec<(DateTime<Utc>, String)> = self
            .entries
            .iter()
            .map(|(key, entry)| (entry.computed_at, key.clone()))
            .collect();
        by_age.sort();

        let excess = self.entries.len() - keep;
        for (_, key) in by_age.into_iter().take(excess) {
            self.entries.remove(&key);
        }
        excess
    }

    /// Drop entries for `form_id` computed under other versions.
    /// Returns the number of entries removed.
    pub fn prune_stale(&mut self, form_id: &str, form_version: u32, guide_version: u32) -> usize {
        let prefix = format!("{}:", form_id);
        let before = self.entries.len();
        self.entries.retain(|key, entry| {
            !key.starts_with(&prefix)
                || (entry.form_version == form_version && entry.guide_version == guide_version)
        });
        before - self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::AnswerValue;
    use crate::pricing::EstimationMode;

    fn form(id: &str) -> Form {
        Form {
            id: id.into(),
            title: None,
            version: 1,
            published: true,
            questions: vec![],
        }
    }

    fn sample_estimate(guide_version: u32, amount: f64) -> PriceEstimate {
        PriceEstimate {
            mode: EstimationMode::Range,
            show_to_customer: true,
            currency: "USD".into(),
            min: Some(amount),
            max: Some(amount),
            applied_rules: vec![],
            disclaimer: None,
            guide_version,
            warnings: vec![],
            rules_evaluated: 0,
        }
    }

    fn answers(area: f64) -> Answers {
        [("area".to_string(), AnswerValue::Number(area))]
            .into_iter()
            .collect()
    }

    #[test]
    fn test_key_is_stable_and_distinct() {
        let f = form("cleaning");
        let a = EstimateCache::key(&f, &answers(10.0)).unwrap();
        let b = EstimateCache::key(&f, &answers(10.0)).unwrap();
        let c = EstimateCache::key(&f, &answers(11.0)).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.starts_with("cleaning:"));
    }

    #[test]
    fn test_lookup_hit() {
        let mut cache = EstimateCache::new();
        cache.store("k".into(), 1, sample_estimate(3, 120.0));
        let hit = cache.lookup("k", 1, 3).unwrap();
        assert_eq!(hit.min, Some(120.0));
    }

    #[test]
    fn test_guide_version_bump_misses() {
        let mut cache = EstimateCache::new();
        cache.store("k".into(), 1, sample_estimate(3, 120.0));
        assert!(cache.lookup("k", 1, 4).is_none());
        assert!(cache.lookup("k", 2, 3).is_none());
        assert!(cache.lookup("other", 1, 3).is_none());
    }

    #[test]
    fn test_prune_stale() {
        let mut cache = EstimateCache::new();
        cache.store("cleaning:{}".into(), 1, sample_estimate(3, 1.0));
        cache.store("cleaning:{\"a\":1}".into(), 1, sample_estimate(4, 2.0));
        cache.store("gardening:{}".into(), 1, sample_estimate(1, 3.0));

        let removed = cache.prune_stale("cleaning", 1, 4);
        assert_eq!(removed, 1);
        assert_eq!(cache.entries.len(), 2);
        assert!(cache.entries.contains_key("gardening:{}"));
    }

    #[test]
    fn test_evict_oldest_keeps_newest() {
        let mut cache = EstimateCache::new();
        let now = Utc::now();
        for (i, key) in ["a", "b", "c", "d"].iter().enumerate() {
            cache.store(key.to_string(), 1, sample_estimate(1, i as f64));
            if let Some(entry) = cache.entries.get_mut(*key) {
                entry.computed_at = now - chrono::Duration::minutes(10 - i as i64);
            }
        }

        assert_eq!(cache.evict_oldest(2), 2);
        let mut kept: Vec<&str> = cache.entries.keys().map(String::as_str).collect();
        kept.sort();
        assert_eq!(kept, vec!["c", "d"]);
        assert_eq!(cache.evict_oldest(2), 0);
    }

    #[test]
    fn test_store_caps_entry_count() {
        let mut cache = EstimateCache::new();
        for i in 0..MAX_ENTRIES + 25 {
            cache.store(format!("cleaning:{}", i), 1, sample_estimate(1, i as f64));
        }
        assert_eq!(cache.entries.len(), MAX_ENTRIES);
        let last = format!("cleaning:{}", MAX_ENTRIES + 24);
        assert!(cache.lookup(&last, 1, 1).is_some());
    }
}
