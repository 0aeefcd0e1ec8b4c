//! In-memory store implementation.

use super::{
    Condition, Document, IndexDef, Key, RangeFilter, SortRange, StorageStats, Store, StoreError,
    StoreResult, UpdateExpr, WriteRequest, MAX_BATCH_SIZE,
};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::collections::{BTreeMap, BTreeSet};
use std::ops::RangeInclusive;
use std::sync::atomic::{AtomicU64, Ordering};

/// Entries of one secondary index: index partition → ordered (sort value, record key).
type IndexEntries = FxHashMap<String, BTreeSet<(u64, Key)>>;

#[derive(Debug, Default)]
struct Tables {
    records: BTreeMap<String, BTreeMap<String, Document>>,
    indexes: FxHashMap<String, IndexEntries>,
}

/// In-memory store backed by ordered maps behind a single lock.
///
/// Every trait call takes the lock once, so each call is atomic and
/// conditional writes behave like a real conditional-write store under
/// concurrent callers.
#[derive(Debug)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    index_defs: Vec<IndexDef>,
    max_batch_size: usize,
    ops_count: AtomicU64,
}

impl MemoryStore {
    /// Create a store with the `QueryByZoom` index.
    pub fn new() -> Self {
        Self::with_indexes(vec![IndexDef::query_by_zoom()])
    }

    pub fn with_indexes(index_defs: Vec<IndexDef>) -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            index_defs,
            max_batch_size: MAX_BATCH_SIZE,
            ops_count: AtomicU64::new(0),
        }
    }

    /// Override the batch ceiling (tests use small values to force chunking).
    pub fn with_max_batch_size(mut self, max: usize) -> Self {
        assert!(max > 0, "Batch size must be greater than zero");
        self.max_batch_size = max;
        self
    }

    fn record_op(&self) {
        self.ops_count.fetch_add(1, Ordering::Relaxed);
    }

    fn check_batch(&self, size: usize) -> StoreResult<()> {
        if size > self.max_batch_size {
            return Err(StoreError::BatchTooLarge {
                size,
                max: self.max_batch_size,
            });
        }
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Tables {
    fn get(&self, key: &Key) -> Option<&Document> {
        self.records
            .get(&key.partition)
            .and_then(|sorts| sorts.get(&key.sort))
    }

    fn insert(&mut self, defs: &[IndexDef], key: Key, doc: Document) {
        if let Some(old) = self.get(&key).cloned() {
            self.unindex(defs, &key, &old);
        }
        self.index(defs, &key, &doc);
        self.records
            .entry(key.partition)
            .or_default()
            .insert(key.sort, doc);
    }

    fn remove(&mut self, defs: &[IndexDef], key: &Key) -> Option<Document> {
        let sorts = self.records.get_mut(&key.partition)?;
        let old = sorts.remove(&key.sort)?;
        if sorts.is_empty() {
            self.records.remove(&key.partition);
        }
        self.unindex(defs, key, &old);
        Some(old)
    }

    fn index(&mut self, defs: &[IndexDef], key: &Key, doc: &Document) {
        for def in defs {
            if let Some((partition, sort)) = index_entry(def, doc) {
                self.indexes
                    .entry(def.name.clone())
                    .or_default()
                    .entry(partition)
                    .or_default()
                    .insert((sort, key.clone()));
            }
        }
    }

    fn unindex(&mut self, defs: &[IndexDef], key: &Key, doc: &Document) {
        for def in defs {
            if let Some((partition, sort)) = index_entry(def, doc)
                && let Some(entries) = self.indexes.get_mut(&def.name)
                && let Some(set) = entries.get_mut(&partition)
            {
                set.remove(&(sort, key.clone()));
                if set.is_empty() {
                    entries.remove(&partition);
                }
            }
        }
    }
}

fn index_entry(def: &IndexDef, doc: &Document) -> Option<(String, u64)> {
    let partition = doc.get(&def.partition_attr)?.as_str()?;
    let sort = doc.get(&def.sort_attr)?.as_u64()?;
    Some((partition.to_string(), sort))
}

fn check(condition: Option<&Condition>, current: Option<&Document>) -> StoreResult<()> {
    match condition {
        Some(c) if !c.evaluate(current) => Err(StoreError::ConditionFailed),
        _ => Ok(()),
    }
}

impl Store for MemoryStore {
    fn get(&self, key: &Key) -> StoreResult<Option<Document>> {
        self.record_op();
        Ok(self.tables.read().get(key).cloned())
    }

    fn put(&self, doc: Document, condition: Option<&Condition>) -> StoreResult<()> {
        self.record_op();
        let key = Key::from_document(&doc)?;
        let mut tables = self.tables.write();
        check(condition, tables.get(&key))?;
        tables.insert(&self.index_defs, key, doc);
        Ok(())
    }

    fn update(
        &self,
        key: &Key,
        update: &UpdateExpr,
        condition: Option<&Condition>,
    ) -> StoreResult<Document> {
        self.record_op();
        let mut tables = self.tables.write();
        let current = tables.get(key).cloned();
        check(condition, current.as_ref())?;

        let mut doc = current.unwrap_or_else(|| {
            let mut fresh = Document::new();
            key.stamp(&mut fresh);
            fresh
        });
        update.apply(&mut doc)?;
        tables.insert(&self.index_defs, key.clone(), doc.clone());
        Ok(doc)
    }

    fn delete(&self, key: &Key, condition: Option<&Condition>) -> StoreResult<Option<Document>> {
        self.record_op();
        let mut tables = self.tables.write();
        check(condition, tables.get(key))?;
        Ok(tables.remove(&self.index_defs, key))
    }

    fn query_partition(&self, partition: &str, range: &SortRange) -> StoreResult<Vec<Document>> {
        self.record_op();
        let tables = self.tables.read();
        let Some(sorts) = tables.records.get(partition) else {
            return Ok(Vec::new());
        };

        let docs = match range {
            SortRange::All => sorts.values().cloned().collect(),
            SortRange::Prefix(prefix) => sorts
                .range::<String, _>(prefix.clone()..)
                .take_while(|(sort, _)| sort.starts_with(prefix.as_str()))
                .map(|(_, doc)| doc.clone())
                .collect(),
            SortRange::Between(low, high) => {
                if low > high {
                    Vec::new()
                } else {
                    sorts
                        .range::<String, _>(low.clone()..=high.clone())
                        .map(|(_, doc)| doc.clone())
                        .collect()
                }
            }
        };
        Ok(docs)
    }

    fn query_index(
        &self,
        index: &str,
        partition: &str,
        range: RangeInclusive<u64>,
        filters: &[RangeFilter],
    ) -> StoreResult<Vec<Document>> {
        self.record_op();
        if !self.index_defs.iter().any(|def| def.name == index) {
            return Err(StoreError::Backend(format!("Unknown index \"{}\"", index)));
        }

        let tables = self.tables.read();
        let Some(entries) = tables
            .indexes
            .get(index)
            .and_then(|entries| entries.get(partition))
        else {
            return Ok(Vec::new());
        };

        let (min, max) = (*range.start(), *range.end());
        let docs = entries
            .range((min, Key::default())..)
            .take_while(|(sort, _)| *sort <= max)
            .filter_map(|(_, key)| tables.get(key))
            .filter(|doc| filters.iter().all(|f| f.matches(doc)))
            .cloned()
            .collect();
        Ok(docs)
    }

    fn batch_write(&self, requests: &[WriteRequest]) -> StoreResult<()> {
        self.record_op();
        self.check_batch(requests.len())?;

        // Validate keys up front so a malformed request leaves the batch unapplied
        let mut keyed = Vec::with_capacity(requests.len());
        for request in requests {
            match request {
                WriteRequest::Put(doc) => keyed.push((Key::from_document(doc)?, Some(doc))),
                WriteRequest::Delete(key) => keyed.push((key.clone(), None)),
            }
        }

        let mut tables = self.tables.write();
        for (key, doc) in keyed {
            match doc {
                Some(doc) => tables.insert(&self.index_defs, key, doc.clone()),
                None => {
                    tables.remove(&self.index_defs, &key);
                }
            }
        }
        Ok(())
    }

    fn batch_get(&self, keys: &[Key]) -> StoreResult<Vec<Document>> {
        self.record_op();
        self.check_batch(keys.len())?;
        let tables = self.tables.read();
        Ok(keys
            .iter()
            .filter_map(|key| tables.get(key).cloned())
            .collect())
    }

    fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }

    fn stats(&self) -> StoreResult<StorageStats> {
        let tables = self.tables.read();
        Ok(StorageStats {
            record_count: tables.records.values().map(BTreeMap::len).sum(),
            index_entry_count: tables
                .indexes
                .values()
                .flat_map(|entries| entries.values())
                .map(BTreeSet::len)
                .sum(),
            operations_count: self.ops_count.load(Ordering::Relaxed),
        })
    }
}
