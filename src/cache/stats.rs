//! Cache Statistics Module
//!
//! Diagnostic snapshot of one region's entries plus the hit/miss counters
//! kept by a store instance.

use serde::Serialize;

// == Entry Stats ==
/// One stored entry as seen by the stats scan.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryStats {
    /// Full namespaced storage key
    pub key: String,
    /// Seconds since the entry was written, rounded
    pub age_seconds: u64,
    /// Serialized size in KiB, rounded
    #[serde(rename = "sizeKB")]
    pub size_kb: u64,
}

impl EntryStats {
    pub fn new(key: impl Into<String>, age_ms: u64, size_bytes: usize) -> Self {
        Self {
            key: key.into(),
            age_seconds: (age_ms as f64 / 1000.0).round() as u64,
            size_kb: (size_bytes as f64 / 1024.0).round() as u64,
        }
    }
}

// == Cache Stats ==
/// Read-only snapshot returned by `get_stats`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    /// Region the snapshot was taken for
    pub region: String,
    /// Number of entries found for the region
    pub total_entries: usize,
    pub entries: Vec<EntryStats>,
    /// Reads served from cache by this store instance
    pub hits: u64,
    /// Reads that found nothing usable
    pub misses: u64,
    pub hit_rate: f64,
}

// == Counters ==
/// Hit/miss tallies for a single store instance.
#[derive(Debug, Clone, Copy, Default)]
pub struct Counters {
    pub hits: u64,
    pub misses: u64,
}

impl Counters {
    // == Record Hit ==
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    // == Record Miss ==
    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if nothing was read yet.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_stats_rounding() {
        let stats = EntryStats::new("v1_BR_k", 1_499, 1_535);
        assert_eq!(stats.age_seconds, 1);
        assert_eq!(stats.size_kb, 1);

        let stats = EntryStats::new("v1_BR_k", 1_500, 512);
        assert_eq!(stats.age_seconds, 2);
        assert_eq!(stats.size_kb, 1);

        let stats = EntryStats::new("v1_BR_k", 0, 100);
        assert_eq!(stats.size_kb, 0);
    }

    #[test]
    fn test_stats_wire_names() {
        let stats = CacheStats {
            region: "BR".to_string(),
            total_entries: 1,
            entries: vec![EntryStats::new("v1_BR_k", 2_000, 2_048)],
            ..Default::default()
        };
        let json = serde_json::to_value(&stats).unwrap();

        assert_eq!(json["region"], "BR");
        assert_eq!(json["totalEntries"], 1);
        assert_eq!(json["entries"][0]["key"], "v1_BR_k");
        assert_eq!(json["entries"][0]["ageSeconds"], 2);
        assert_eq!(json["entries"][0]["sizeKB"], 2);
    }

    #[test]
    fn test_hit_rate_no_requests() {
        assert_eq!(Counters::default().hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let mut counters = Counters::default();
        counters.record_hit();
        counters.record_miss();
        assert_eq!(counters.hit_rate(), 0.5);
    }
}
