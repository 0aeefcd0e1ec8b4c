//! Key-range store abstraction for geotile
//!
//! The engine never talks to a database directly. Everything goes through the
//! [`Store`] trait: point gets and puts with conditions, conditional updates
//! with atomic increments, partition range queries, a numeric secondary index,
//! and batched reads and writes with a fixed size ceiling. Records are JSON
//! documents keyed by their `partition` and `sort` attributes.

use serde_json::Value;
use std::cmp::Ordering;
use std::ops::RangeInclusive;
use thiserror::Error;

mod memory;

pub use memory::MemoryStore;

/// A stored record. Always carries the `partition` and `sort` attributes.
pub type Document = serde_json::Map<String, Value>;

pub const PARTITION_ATTR: &str = "partition";
pub const SORT_ATTR: &str = "sort";

/// Most requests a single `batch_write` / `batch_get` call may carry.
pub const MAX_BATCH_SIZE: usize = 25;

/// Name of the secondary index ordering tiles by Morton key within `domainId:zoom`.
pub const QUERY_BY_ZOOM: &str = "QueryByZoom";

/// Errors reported by a store implementation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Conditional check failed")]
    ConditionFailed,

    #[error("Batch of {size} requests exceeds the limit of {max}")]
    BatchTooLarge { size: usize, max: usize },

    #[error("Record is missing key attribute \"{0}\"")]
    MissingKey(&'static str),

    #[error("Backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Primary key of a record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Key {
    pub partition: String,
    pub sort: String,
}

impl Key {
    pub fn new(partition: impl Into<String>, sort: impl Into<String>) -> Self {
        Self {
            partition: partition.into(),
            sort: sort.into(),
        }
    }

    /// Extract the key attributes of a document.
    pub fn from_document(doc: &Document) -> StoreResult<Self> {
        let partition = doc
            .get(PARTITION_ATTR)
            .and_then(Value::as_str)
            .ok_or(StoreError::MissingKey(PARTITION_ATTR))?;
        let sort = doc
            .get(SORT_ATTR)
            .and_then(Value::as_str)
            .ok_or(StoreError::MissingKey(SORT_ATTR))?;
        Ok(Self::new(partition, sort))
    }

    /// Write the key attributes into a document.
    pub fn stamp(&self, doc: &mut Document) {
        doc.insert(PARTITION_ATTR.to_string(), Value::from(self.partition.clone()));
        doc.insert(SORT_ATTR.to_string(), Value::from(self.sort.clone()));
    }
}

/// Predicate evaluated against the stored record before a write.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// No record exists under the key
    NotExists,
    /// A record exists under the key
    Exists,
    /// Attribute equals the value
    Equals(String, Value),
    /// List attribute contains the value (or string attribute contains the substring)
    Contains(String, Value),
    All(Vec<Condition>),
}

impl Condition {
    pub fn equals(attr: impl Into<String>, value: impl Into<Value>) -> Self {
        Condition::Equals(attr.into(), value.into())
    }

    pub fn contains(attr: impl Into<String>, value: impl Into<Value>) -> Self {
        Condition::Contains(attr.into(), value.into())
    }

    pub fn and(self, other: Condition) -> Self {
        match self {
            Condition::All(mut conditions) => {
                conditions.push(other);
                Condition::All(conditions)
            }
            first => Condition::All(vec![first, other]),
        }
    }

    pub fn evaluate(&self, current: Option<&Document>) -> bool {
        match self {
            Condition::NotExists => current.is_none(),
            Condition::Exists => current.is_some(),
            Condition::Equals(attr, expected) => current
                .and_then(|doc| doc.get(attr))
                .is_some_and(|actual| values_equal(actual, expected)),
            Condition::Contains(attr, needle) => match current.and_then(|doc| doc.get(attr)) {
                Some(Value::Array(values)) => values.iter().any(|v| values_equal(v, needle)),
                Some(Value::String(s)) => needle.as_str().is_some_and(|n| s.contains(n)),
                _ => false,
            },
            Condition::All(conditions) => conditions.iter().all(|c| c.evaluate(current)),
        }
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x == y,
            _ => x.as_f64().partial_cmp(&y.as_f64()) == Some(Ordering::Equal),
        },
        _ => a == b,
    }
}

/// Field sets plus atomic numeric increments applied in one `update` call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateExpr {
    pub set: Document,
    pub increments: Vec<(String, i64)>,
}

impl UpdateExpr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, attr: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set.insert(attr.into(), value.into());
        self
    }

    pub fn increment(mut self, attr: impl Into<String>, delta: i64) -> Self {
        self.increments.push((attr.into(), delta));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.increments.is_empty()
    }

    /// Apply to a document in place. Missing counters start at zero.
    pub fn apply(&self, doc: &mut Document) -> StoreResult<()> {
        for (attr, value) in &self.set {
            if attr == PARTITION_ATTR || attr == SORT_ATTR {
                return Err(StoreError::Backend(format!(
                    "Cannot modify key attribute \"{}\"",
                    attr
                )));
            }
            doc.insert(attr.clone(), value.clone());
        }

        for (attr, delta) in &self.increments {
            let current = match doc.get(attr) {
                None | Some(Value::Null) => 0,
                Some(value) => value.as_i64().ok_or_else(|| {
                    StoreError::Backend(format!("Attribute \"{}\" is not an integer", attr))
                })?,
            };
            let next = current.checked_add(*delta).ok_or_else(|| {
                StoreError::Backend(format!("Attribute \"{}\" overflowed", attr))
            })?;
            doc.insert(attr.clone(), Value::from(next));
        }

        Ok(())
    }
}

/// Sort-key selection within one partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortRange {
    All,
    Prefix(String),
    Between(String, String),
}

impl SortRange {
    pub fn contains(&self, sort: &str) -> bool {
        match self {
            SortRange::All => true,
            SortRange::Prefix(prefix) => sort.starts_with(prefix.as_str()),
            SortRange::Between(low, high) => low.as_str() <= sort && sort <= high.as_str(),
        }
    }
}

/// Inclusive bounds on an integer attribute, checked after an index scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeFilter {
    pub attr: String,
    pub min: i64,
    pub max: i64,
}

impl RangeFilter {
    pub fn new(attr: impl Into<String>, min: i64, max: i64) -> Self {
        Self {
            attr: attr.into(),
            min,
            max,
        }
    }

    pub fn matches(&self, doc: &Document) -> bool {
        doc.get(&self.attr)
            .and_then(Value::as_i64)
            .is_some_and(|v| self.min <= v && v <= self.max)
    }
}

/// One entry of a `batch_write` call.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteRequest {
    Put(Document),
    Delete(Key),
}

/// Secondary index over a string partition attribute and an unsigned sort attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDef {
    pub name: String,
    pub partition_attr: String,
    pub sort_attr: String,
}

impl IndexDef {
    pub fn new(
        name: impl Into<String>,
        partition_attr: impl Into<String>,
        sort_attr: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            partition_attr: partition_attr.into(),
            sort_attr: sort_attr.into(),
        }
    }

    /// `indexedDomain` → `morton`, the index every tile record lands in.
    pub fn query_by_zoom() -> Self {
        Self::new(QUERY_BY_ZOOM, "indexedDomain", "morton")
    }
}

/// Store statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StorageStats {
    /// Total number of records
    pub record_count: usize,
    /// Total number of secondary index entries
    pub index_entry_count: usize,
    /// Number of calls served
    pub operations_count: u64,
}

/// Contract of the backing key-range store.
///
/// Each call is atomic on its own. Nothing spans calls: a sequence of writes
/// can be interrupted between any two of them, and sibling batches of one
/// logical change are independent.
pub trait Store: Send + Sync {
    /// Get a record by key
    fn get(&self, key: &Key) -> StoreResult<Option<Document>>;

    /// Insert or replace a record if `condition` holds for the current one
    fn put(&self, doc: Document, condition: Option<&Condition>) -> StoreResult<()>;

    /// Apply an update if `condition` holds, creating the record when absent.
    /// Returns the record as stored after the update.
    fn update(
        &self,
        key: &Key,
        update: &UpdateExpr,
        condition: Option<&Condition>,
    ) -> StoreResult<Document>;

    /// Delete a record if `condition` holds and return the old value if it existed
    fn delete(&self, key: &Key, condition: Option<&Condition>) -> StoreResult<Option<Document>>;

    /// All records of a partition whose sort key falls in `range`, ordered by sort key
    fn query_partition(&self, partition: &str, range: &SortRange) -> StoreResult<Vec<Document>>;

    /// Records of a secondary index partition with sort value in `range`,
    /// ordered by that value and narrowed by `filters`
    fn query_index(
        &self,
        index: &str,
        partition: &str,
        range: RangeInclusive<u64>,
        filters: &[RangeFilter],
    ) -> StoreResult<Vec<Document>>;

    /// Unconditional puts and deletes, at most `max_batch_size()` per call
    fn batch_write(&self, requests: &[WriteRequest]) -> StoreResult<()>;

    /// Fetch records by key, at most `max_batch_size()` per call. Missing keys are skipped.
    fn batch_get(&self, keys: &[Key]) -> StoreResult<Vec<Document>>;

    /// Largest batch the store accepts
    fn max_batch_size(&self) -> usize {
        MAX_BATCH_SIZE
    }

    /// Get store statistics
    fn stats(&self) -> StoreResult<StorageStats>;
}
