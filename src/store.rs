//! # Key-Value Store Abstraction
//!
//! Everything the application persists goes through the `KeyValueStore` trait.
//! The trait exposes the handful of primitives the record protocol needs, so
//! that handlers can be given any backend through axum state instead of a
//! process-wide client.
//!
//! ## Storage Model
//!
//! ```text
//! <kind>:autoID            string  next ID to hand out
//! <kind>:<id>              hash    one record
//! doctor-patient:<id>      set     patient IDs linked to a doctor
//! db_initiated             string  counters have been seeded
//! stats:start_ts           string  unix seconds of the first request
//! stats:requests           string  running request count
//! ```
//!
//! ## Implementations
//!
//! - **RedisStore**: the production backend, see `redis_store`
//! - **InMemoryStore**: a `Mutex<BTreeMap>` fake with Redis semantics, used by
//!   tests and for running without a server
//!
//! ## Usage Examples
//!
//! ```rust
//! use hospital_records::{InMemoryStore, KeyValueStore};
//!
//! let store = InMemoryStore::new();
//! let rt = tokio::runtime::Runtime::new().unwrap();
//!
//! // The first allocation for a fresh counter hands out "1".
//! assert_eq!(rt.block_on(store.allocate_id("hospital:autoID")).unwrap(), "1");
//! let counter = rt.block_on(store.get("hospital:autoID")).unwrap();
//! assert_eq!(counter.as_deref(), Some("2"));
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::{Record, StoreError};

/// Shared handle to the store, as held in axum state.
pub type SharedStore = Arc<dyn KeyValueStore>;

/// Trait defining the key-value primitives the record protocol is built on.
///
/// Implementors must be safe to share across request tasks. Every method is a
/// single request/response with the backend; nothing is retried.
///
/// # Error Handling
///
/// - `Unavailable`: the backend could not be reached
/// - `Internal`: the backend replied with something unexpected, e.g. a key
///   holding the wrong type of value
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Atomically hands out the next ID from the counter at `counter_key`.
    ///
    /// A missing counter is initialised to `1`. The value before the increment
    /// is returned and the counter is left one higher, so the first call
    /// returns `"1"` and leaves `2` behind.
    async fn allocate_id(&self, counter_key: &str) -> Result<String, StoreError>;

    /// Reads a string value.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Writes a string value, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Writes a string value only if the key is absent. Returns whether it was written.
    async fn set_nx(&self, key: &str, value: &str) -> Result<bool, StoreError>;

    /// Increments an integer value (missing counts as `0`) and returns the new value.
    async fn incr(&self, key: &str) -> Result<i64, StoreError>;

    /// Writes `fields` into the hash at `key` and returns the hash's field
    /// count, read back in the same round-trip.
    async fn write_hash(&self, key: &str, fields: &[(String, String)])
    -> Result<usize, StoreError>;

    /// Reads every field of the hash at `key`. Missing keys yield an empty record.
    async fn read_hash(&self, key: &str) -> Result<Record, StoreError>;

    /// Runs one step of an incremental key scan.
    ///
    /// Start with cursor `0`; the scan is complete when the returned cursor is
    /// `0` again. A page may be empty while the scan is still in progress.
    async fn scan(
        &self,
        cursor: u64,
        pattern: &str,
        count: usize,
    ) -> Result<(u64, Vec<String>), StoreError>;

    /// Adds `member` to the set at `key`. Returns whether it was newly added.
    async fn add_to_set(&self, key: &str, member: &str) -> Result<bool, StoreError>;

    /// Reads the members of the set at `key`, in no particular order.
    async fn set_members(&self, key: &str) -> Result<Vec<String>, StoreError>;

    /// Returns the cardinality of the set at `key`.
    async fn set_len(&self, key: &str) -> Result<usize, StoreError>;
}

/////////////////////////////////////////// InMemoryStore //////////////////////////////////////////////

#[derive(Debug, Clone)]
enum Value {
    Str(String),
    Hash(BTreeMap<String, String>),
    Set(BTreeSet<String>),
}

fn wrong_type(key: &str) -> StoreError {
    StoreError::Internal(format!(
        "WRONGTYPE Operation against key {} holding the wrong kind of value",
        key
    ))
}

fn parse_counter(key: &str, value: &str) -> Result<i64, StoreError> {
    value.parse::<i64>().map_err(|_| {
        StoreError::Internal(format!("value at {} is not an integer or out of range", key))
    })
}

fn increment(value: i64) -> Result<i64, StoreError> {
    value
        .checked_add(1)
        .ok_or_else(|| StoreError::Internal("increment or decrement would overflow".to_string()))
}

/// Matches `key` against a glob pattern in which `*` stands for any run of characters.
fn glob_match(pattern: &str, key: &str) -> bool {
    let parts: Vec<&str> = pattern.split('*').collect();
    if parts.len() == 1 {
        return pattern == key;
    }
    let first = parts[0];
    let last = parts[parts.len() - 1];
    let Some(mut rest) = key.strip_prefix(first) else {
        return false;
    };
    for part in &parts[1..parts.len() - 1] {
        match rest.find(part) {
            Some(idx) => rest = &rest[idx + part.len()..],
            None => return false,
        }
    }
    rest.len() >= last.len() && rest.ends_with(last)
}

/// Thread-safe in-memory implementation of `KeyValueStore`.
///
/// Values are typed the way Redis types them (string, hash, set) and using a
/// key as the wrong type is an error. Scans are paged over the sorted key
/// space. The store can be switched into an unreachable state to exercise
/// connectivity handling.
///
/// # Examples
///
/// ```rust
/// use hospital_records::{InMemoryStore, KeyValueStore, StoreError};
///
/// let store = InMemoryStore::new();
/// store.set_unavailable(true);
///
/// let rt = tokio::runtime::Runtime::new().unwrap();
/// let result = rt.block_on(store.get("db_initiated"));
/// assert!(matches!(result, Err(StoreError::Unavailable(_))));
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStore {
    entries: Mutex<BTreeMap<String, Value>>,
    unavailable: AtomicBool,
}

impl InMemoryStore {
    /// Creates an empty, reachable store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call fail with `StoreError::Unavailable` (or succeed again).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Deletes a key of any type. Returns whether it existed.
    pub fn remove(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.entries()?.remove(key).is_some())
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.entries()?.len())
    }

    /// True when no keys are stored.
    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.entries()?.is_empty())
    }

    fn entries(&self) -> Result<MutexGuard<'_, BTreeMap<String, Value>>, StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("Connection refused".to_string()));
        }
        self.entries
            .lock()
            .map_err(|_| StoreError::Internal("in-memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    async fn allocate_id(&self, counter_key: &str) -> Result<String, StoreError> {
        let mut entries = self.entries()?;
        let current = match entries.get(counter_key) {
            Some(Value::Str(value)) => value.clone(),
            Some(_) => return Err(wrong_type(counter_key)),
            None => "1".to_string(),
        };
        let next = increment(parse_counter(counter_key, &current)?)?;
        entries.insert(counter_key.to_string(), Value::Str(next.to_string()));
        Ok(current)
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match self.entries()?.get(key) {
            Some(Value::Str(value)) => Ok(Some(value.clone())),
            Some(_) => Err(wrong_type(key)),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries()?
            .insert(key.to_string(), Value::Str(value.to_string()));
        Ok(())
    }

    async fn set_nx(&self, key: &str, value: &str) -> Result<bool, StoreError> {
        let mut entries = self.entries()?;
        if entries.contains_key(key) {
            return Ok(false);
        }
        entries.insert(key.to_string(), Value::Str(value.to_string()));
        Ok(true)
    }

    async fn incr(&self, key: &str) -> Result<i64, StoreError> {
        let mut entries = self.entries()?;
        let current = match entries.get(key) {
            Some(Value::Str(value)) => parse_counter(key, value)?,
            Some(_) => return Err(wrong_type(key)),
            None => 0,
        };
        let next = increment(current)?;
        entries.insert(key.to_string(), Value::Str(next.to_string()));
        Ok(next)
    }

    async fn write_hash(
        &self,
        key: &str,
        fields: &[(String, String)],
    ) -> Result<usize, StoreError> {
        if fields.is_empty() {
            return Err(StoreError::Internal(
                "wrong number of arguments for 'hset' command".to_string(),
            ));
        }
        let mut entries = self.entries()?;
        let hash = entries
            .entry(key.to_string())
            .or_insert_with(|| Value::Hash(BTreeMap::new()));
        let Value::Hash(hash) = hash else {
            return Err(wrong_type(key));
        };
        for (field, value) in fields {
            hash.insert(field.clone(), value.clone());
        }
        Ok(hash.len())
    }

    async fn read_hash(&self, key: &str) -> Result<Record, StoreError> {
        match self.entries()?.get(key) {
            Some(Value::Hash(hash)) => Ok(hash
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect()),
            Some(_) => Err(wrong_type(key)),
            None => Ok(Record::new()),
        }
    }

    async fn scan(
        &self,
        cursor: u64,
        pattern: &str,
        count: usize,
    ) -> Result<(u64, Vec<String>), StoreError> {
        let entries = self.entries()?;
        let start = usize::try_from(cursor).unwrap_or(usize::MAX);
        let count = count.max(1);
        let keys: Vec<String> = entries
            .keys()
            .skip(start)
            .take(count)
            .filter(|key| glob_match(pattern, key))
            .cloned()
            .collect();
        let consumed = start.saturating_add(count);
        let next = if consumed >= entries.len() {
            0
        } else {
            consumed as u64
        };
        Ok((next, keys))
    }

    async fn add_to_set(&self, key: &str, member: &str) -> Result<bool, StoreError> {
        let mut entries = self.entries()?;
        let set = entries
            .entry(key.to_string())
            .or_insert_with(|| Value::Set(BTreeSet::new()));
        let Value::Set(set) = set else {
            return Err(wrong_type(key));
        };
        Ok(set.insert(member.to_string()))
    }

    async fn set_members(&self, key: &str) -> Result<Vec<String>, StoreError> {
        match self.entries()?.get(key) {
            Some(Value::Set(set)) => Ok(set.iter().cloned().collect()),
            Some(_) => Err(wrong_type(key)),
            None => Ok(Vec::new()),
        }
    }

    async fn set_len(&self, key: &str) -> Result<usize, StoreError> {
        match self.entries()?.get(key) {
            Some(Value::Set(set)) => Ok(set.len()),
            Some(_) => Err(wrong_type(key)),
            None => Ok(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glob_matches_prefix_patterns() {
        assert!(glob_match("hospital:*", "hospital:1"));
        assert!(glob_match("hospital:*", "hospital:autoID"));
        assert!(glob_match("hospital:*", "hospital:"));
        assert!(!glob_match("hospital:*", "hospitals:1"));
        assert!(!glob_match("doctor:*", "doctor-patient:1"));
        assert!(glob_match("*:autoID", "doctor:autoID"));
        assert!(glob_match("a*b*c", "a--b--c"));
        assert!(!glob_match("a*b*c", "a--c--b"));
        assert!(glob_match("exact", "exact"));
    }

    #[tokio::test]
    async fn allocate_id_returns_value_before_increment() {
        let store = InMemoryStore::new();
        assert_eq!(store.allocate_id("patient:autoID").await.unwrap(), "1");
        assert_eq!(store.allocate_id("patient:autoID").await.unwrap(), "2");
        assert_eq!(
            store.get("patient:autoID").await.unwrap().as_deref(),
            Some("3")
        );

        store.set("doctor:autoID", "1").await.unwrap();
        assert_eq!(store.allocate_id("doctor:autoID").await.unwrap(), "1");
        assert_eq!(
            store.get("doctor:autoID").await.unwrap().as_deref(),
            Some("2")
        );
    }

    #[tokio::test]
    async fn allocate_id_rejects_non_integer_counter() {
        let store = InMemoryStore::new();
        store.set("hospital:autoID", "abc").await.unwrap();
        let err = store.allocate_id("hospital:autoID").await.unwrap_err();
        assert!(matches!(err, StoreError::Internal(_)));
    }

    #[tokio::test]
    async fn write_hash_reports_total_field_count() {
        let store = InMemoryStore::new();
        let fields = vec![
            ("a".to_string(), "1".to_string()),
            ("b".to_string(), "".to_string()),
        ];
        assert_eq!(store.write_hash("h:1", &fields).await.unwrap(), 2);

        let more = vec![("c".to_string(), "3".to_string())];
        assert_eq!(store.write_hash("h:1", &more).await.unwrap(), 3);

        let record = store.read_hash("h:1").await.unwrap();
        assert_eq!(record.get("b").map(String::as_str), Some(""));
        assert!(store.read_hash("h:2").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn counters_refuse_to_overflow() {
        let store = InMemoryStore::new();
        let max = i64::MAX.to_string();
        store.set("hospital:autoID", &max).await.unwrap();
        store.set("stats:requests", &max).await.unwrap();

        let err = store.allocate_id("hospital:autoID").await.unwrap_err();
        assert_eq!(
            err,
            StoreError::Internal("increment or decrement would overflow".to_string())
        );
        assert!(matches!(
            store.incr("stats:requests").await,
            Err(StoreError::Internal(_))
        ));

        assert_eq!(store.get("hospital:autoID").await.unwrap(), Some(max));
        store.set("doctor:autoID", "1").await.unwrap();
        assert_eq!(store.allocate_id("doctor:autoID").await.unwrap(), "1");
    }

    #[tokio::test]
    async fn wrong_type_is_internal_error() {
        let store = InMemoryStore::new();
        store.set("k", "v").await.unwrap();
        assert!(matches!(
            store.read_hash("k").await,
            Err(StoreError::Internal(_))
        ));
        assert!(matches!(
            store.add_to_set("k", "1").await,
            Err(StoreError::Internal(_))
        ));
    }

    #[tokio::test]
    async fn scan_pages_through_every_key() {
        let store = InMemoryStore::new();
        for i in 0..25 {
            store.set(&format!("k:{}", i), "x").await.unwrap();
        }
        store.set("other", "x").await.unwrap();

        let mut cursor = 0;
        let mut seen = Vec::new();
        let mut pages = 0;
        loop {
            let (next, keys) = store.scan(cursor, "k:*", 10).await.unwrap();
            seen.extend(keys);
            pages += 1;
            if next == 0 {
                break;
            }
            cursor = next;
        }
        assert_eq!(pages, 3);
        assert_eq!(seen.len(), 25);
        assert!(!seen.contains(&"other".to_string()));
    }

    #[tokio::test]
    async fn sets_are_idempotent() {
        let store = InMemoryStore::new();
        assert!(store.add_to_set("s", "1").await.unwrap());
        assert!(!store.add_to_set("s", "1").await.unwrap());
        assert_eq!(store.set_len("s").await.unwrap(), 1);
        assert_eq!(store.set_len("missing").await.unwrap(), 0);
        assert!(store.set_members("missing").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn set_nx_and_incr() {
        let store = InMemoryStore::new();
        assert!(store.set_nx("stats:start_ts", "100").await.unwrap());
        assert!(!store.set_nx("stats:start_ts", "200").await.unwrap());
        assert_eq!(
            store.get("stats:start_ts").await.unwrap().as_deref(),
            Some("100")
        );
        assert_eq!(store.incr("stats:requests").await.unwrap(), 1);
        assert_eq!(store.incr("stats:requests").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn unavailable_store_refuses_everything() {
        let store = InMemoryStore::new();
        store.set("k", "v").await.unwrap();
        store.set_unavailable(true);
        assert!(matches!(
            store.get("k").await,
            Err(StoreError::Unavailable(_))
        ));
        assert!(matches!(
            store.scan(0, "*", 10).await,
            Err(StoreError::Unavailable(_))
        ));
        store.set_unavailable(false);
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
    }
}
