use super::{CacheKey, SeriesRecord};
use ahash::AHashMap;
use std::collections::BTreeMap;

/// Fetched series, keyed by cache key. Values are opaque; only timestamps are read.
#[derive(Debug, Clone, Default)]
pub struct SeriesStore {
    series: AHashMap<CacheKey, Vec<SeriesRecord>>,
}

impl SeriesStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges `records` into the series for `key`, keeping it sorted by timestamp. A record
    /// whose timestamp is already stored replaces the stored one. Returns the number of
    /// records written.
    pub fn merge(&mut self, key: &CacheKey, records: Vec<SeriesRecord>) -> usize {
        let written = records.len();
        let existing = self.series.remove(key).unwrap_or_default();
        let mut by_time: BTreeMap<i64, SeriesRecord> = existing
            .into_iter()
            .map(|record| (record.timestamp, record))
            .collect();
        for record in records {
            by_time.insert(record.timestamp, record);
        }
        self.series
            .insert(key.clone(), by_time.into_values().collect());
        written
    }

    pub fn get(&self, key: &CacheKey) -> Option<&[SeriesRecord]> {
        self.series.get(key).map(Vec::as_slice)
    }

    /// The oldest stored timestamp, used as the cursor for backfilling further history.
    pub fn earliest(&self, key: &CacheKey) -> Option<i64> {
        self.get(key)
            .and_then(|records| records.first())
            .map(|r| r.timestamp)
    }

    pub fn remove(&mut self, key: &CacheKey) -> Option<Vec<SeriesRecord>> {
        self.series.remove(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &CacheKey> {
        self.series.keys()
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}
