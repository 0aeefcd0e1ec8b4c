//! Optimistic concurrency on top of the store's conditional writes.
//!
//! Every mutable record carries a `version`. A write names the version it was
//! based on and succeeds only while the stored version still matches; the
//! store bumps the version in the same call.

use super::keys::{OWNERS_ATTR, VERSION_ATTR};
use crate::error::{GeoTileError, Result};
use crate::storage::{Condition, Document, Key, Store, StoreError, UpdateExpr};
use serde_json::Value;

/// Apply `update` to the record at `key` if its version equals `expected`,
/// incrementing the version. With `owner`, the record's owners must also
/// contain that user.
pub(crate) fn update_versioned<S: Store>(
    store: &S,
    key: &Key,
    expected: u64,
    update: UpdateExpr,
    owner: Option<&str>,
    what: &str,
) -> Result<Document> {
    let mut condition = Condition::equals(VERSION_ATTR, expected);
    if let Some(user) = owner {
        condition = condition.and(Condition::contains(OWNERS_ATTR, user));
    }
    let update = update.increment(VERSION_ATTR, 1);

    match store.update(key, &update, Some(&condition)) {
        Ok(doc) => Ok(doc),
        Err(StoreError::ConditionFailed) => Err(classify_failure(store, key, expected, owner, what)?),
        Err(e) => Err(e.into()),
    }
}

/// Put `doc` only if no record exists under its key.
pub(crate) fn create_unique<S: Store>(store: &S, doc: Document, what: &str) -> Result<()> {
    match store.put(doc, Some(&Condition::NotExists)) {
        Ok(()) => Ok(()),
        Err(StoreError::ConditionFailed) => {
            Err(GeoTileError::Conflict(format!("{} already exists", what)))
        }
        Err(e) => Err(e.into()),
    }
}

/// Delete the record at `key` and return it. The record must exist, and with
/// `expected` its version must match.
pub(crate) fn delete_versioned<S: Store>(
    store: &S,
    key: &Key,
    expected: Option<u64>,
    what: &str,
) -> Result<Document> {
    let condition = match expected {
        Some(version) => Condition::equals(VERSION_ATTR, version),
        None => Condition::Exists,
    };

    match store.delete(key, Some(&condition)) {
        Ok(Some(old)) => Ok(old),
        Ok(None) => Err(GeoTileError::NotFound(format!("{} not found", what))),
        Err(StoreError::ConditionFailed) => match expected {
            Some(version) => Err(classify_failure(store, key, version, None, what)?),
            None => Err(GeoTileError::NotFound(format!("{} not found", what))),
        },
        Err(e) => Err(e.into()),
    }
}

/// Re-read a record after a failed conditional write to tell apart a missing
/// record, a non-owner and a stale version.
fn classify_failure<S: Store>(
    store: &S,
    key: &Key,
    expected: u64,
    owner: Option<&str>,
    what: &str,
) -> Result<GeoTileError> {
    let Some(current) = store.get(key)? else {
        return Ok(GeoTileError::NotFound(format!("{} not found", what)));
    };

    if let Some(user) = owner {
        let is_owner = current
            .get(OWNERS_ATTR)
            .and_then(Value::as_array)
            .is_some_and(|owners| owners.iter().any(|o| o.as_str() == Some(user)));
        if !is_owner {
            return Ok(GeoTileError::Forbidden(format!(
                "{} is not an owner of {}",
                user, what
            )));
        }
    }

    let stored = current.get(VERSION_ATTR).and_then(Value::as_u64);
    Ok(GeoTileError::Conflict(match stored {
        Some(stored) => format!(
            "{} version {} does not match stored version {}",
            what, expected, stored
        ),
        None => format!("{} has no version", what),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use serde_json::json;

    fn seed(store: &MemoryStore) -> Key {
        let key = Key::new("_domain", "parks");
        let mut doc = json!({"version": 1, "owners": ["alice"], "name": "Parks"})
            .as_object()
            .cloned()
            .unwrap();
        key.stamp(&mut doc);
        store.put(doc, None).unwrap();
        key
    }

    #[test]
    fn test_update_bumps_version() {
        let store = MemoryStore::new();
        let key = seed(&store);

        let doc = update_versioned(
            &store,
            &key,
            1,
            UpdateExpr::new().set("name", "Gardens"),
            Some("alice"),
            "domain parks",
        )
        .unwrap();
        assert_eq!(doc["version"], 2);
        assert_eq!(doc["name"], "Gardens");
    }

    #[test]
    fn test_failure_classification() {
        let store = MemoryStore::new();
        let key = seed(&store);

        let stale = update_versioned(&store, &key, 7, UpdateExpr::new(), Some("alice"), "d");
        assert!(matches!(stale, Err(GeoTileError::Conflict(_))));

        let stranger = update_versioned(&store, &key, 1, UpdateExpr::new(), Some("bob"), "d");
        assert!(matches!(stranger, Err(GeoTileError::Forbidden(_))));

        let missing = Key::new("_domain", "nope");
        let absent = update_versioned(&store, &missing, 1, UpdateExpr::new(), None, "d");
        assert!(matches!(absent, Err(GeoTileError::NotFound(_))));
        assert!(store.get(&missing).unwrap().is_none());

        // Failed writes leave the version untouched
        assert_eq!(store.get(&key).unwrap().unwrap()["version"], 1);
    }

    #[test]
    fn test_create_unique() {
        let store = MemoryStore::new();
        let key = Key::new("p", "s");
        let mut doc = Document::new();
        key.stamp(&mut doc);

        create_unique(&store, doc.clone(), "record").unwrap();
        let err = create_unique(&store, doc, "record").unwrap_err();
        assert!(err.is_conflict());
    }

    #[test]
    fn test_delete_versioned() {
        let store = MemoryStore::new();
        let key = seed(&store);

        let err = delete_versioned(&store, &key, Some(3), "d").unwrap_err();
        assert!(err.is_conflict());
        let old = delete_versioned(&store, &key, Some(1), "d").unwrap();
        assert_eq!(old["name"], "Parks");

        assert!(delete_versioned(&store, &key, None, "d").unwrap_err().is_not_found());
        assert!(delete_versioned(&store, &key, Some(1), "d").unwrap_err().is_not_found());
    }
}
