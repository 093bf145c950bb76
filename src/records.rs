//! # Record Persistence Protocol
//!
//! Every entity kind is stored the same way: an auto-ID counter at
//! `<kind>:autoID` hands out dense sequential IDs, and each record is a hash at
//! `<kind>:<id>` that is verified after writing. Listings enumerate records by
//! scanning the kind's key prefix with an incremental cursor.
//!
//! ```text
//! allocate_id ──► "<kind>:<id>" ──► write_entity (HSET + HLEN)
//!                                        │
//! list_entities ◄── scan "<kind>:*" ◄────┘
//!                   keep numeric suffixes, sort by value, HGETALL each
//! ```
//!
//! ID allocation and the record write are two separate store calls. A crash
//! between them leaves an ID with no record; listings simply never see it.

use std::collections::HashSet;

use crate::entity::{DB_INITIATED_KEY, cmp_numeric, numeric_suffix, scan_pattern};
use crate::{EntityKind, KeyValueStore, Record, StoreError};

/// Keys requested per scan step.
pub const SCAN_COUNT: usize = 200;

/// Atomically issues the next ID for `kind`.
///
/// The first ID ever issued for a kind is `"1"`; concurrent callers never
/// receive the same ID because the allocation runs inside the store.
pub async fn allocate_id(
    store: &dyn KeyValueStore,
    kind: EntityKind,
) -> Result<String, StoreError> {
    store.allocate_id(&kind.counter_key()).await
}

/// Writes `fields` as a hash at `key` and verifies the stored field count.
///
/// Returns `StoreError::Integrity` when the count read back differs from
/// `expected_field_count`, which points at a lost write or a stale record
/// under the same key rather than at bad input.
pub async fn write_entity(
    store: &dyn KeyValueStore,
    key: &str,
    fields: &[(String, String)],
    expected_field_count: usize,
) -> Result<(), StoreError> {
    let actual = store.write_hash(key, fields).await?;
    if actual != expected_field_count {
        return Err(StoreError::Integrity {
            key: key.to_string(),
            expected: expected_field_count,
            actual,
        });
    }
    Ok(())
}

/// Allocates an ID for `kind` and writes a full record under it.
///
/// Every schema field is written; fields missing from `values` are stored as
/// empty strings so the record always carries the complete schema.
pub async fn create_entity(
    store: &dyn KeyValueStore,
    kind: EntityKind,
    values: &Record,
) -> Result<String, StoreError> {
    let id = allocate_id(store, kind).await?;
    let fields: Vec<(String, String)> = kind
        .fields()
        .iter()
        .map(|field| {
            let value = values.get(*field).cloned().unwrap_or_default();
            (field.to_string(), value)
        })
        .collect();
    write_entity(store, &kind.record_key(&id), &fields, kind.fields().len()).await?;
    tracing::debug!(%kind, %id, "created record");
    Ok(id)
}

/// Looks up one record. An absent or empty hash is reported as `None`.
pub async fn fetch_entity(
    store: &dyn KeyValueStore,
    kind: EntityKind,
    id: &str,
) -> Result<Option<Record>, StoreError> {
    let record = store.read_hash(&kind.record_key(id)).await?;
    Ok(if record.is_empty() { None } else { Some(record) })
}

/// Collects every key matching `pattern` by walking the scan cursor to completion.
///
/// The store may report a key more than once during a scan, so callers that
/// count must deduplicate.
pub async fn scan_keys(
    store: &dyn KeyValueStore,
    pattern: &str,
) -> Result<Vec<String>, StoreError> {
    let mut keys = Vec::new();
    let mut cursor = 0;
    loop {
        let (next, page) = store.scan(cursor, pattern, SCAN_COUNT).await?;
        keys.extend(page);
        if next == 0 {
            break;
        }
        cursor = next;
    }
    Ok(keys)
}

/// Returns the IDs of every `<prefix>:<digits>` key, deduplicated and in ascending numeric order.
pub async fn numeric_ids(
    store: &dyn KeyValueStore,
    prefix: &str,
) -> Result<Vec<String>, StoreError> {
    let keys = scan_keys(store, &scan_pattern(prefix)).await?;
    let mut seen = HashSet::new();
    let mut ids: Vec<String> = keys
        .iter()
        .filter_map(|key| numeric_suffix(key, prefix))
        .filter(|id| seen.insert(id.to_string()))
        .map(str::to_string)
        .collect();
    ids.sort_by(|a, b| cmp_numeric(a, b).then_with(|| a.cmp(b)));
    Ok(ids)
}

/// Lists every record of `kind` in ascending ID order.
///
/// Records that disappear between the scan and the fetch are skipped.
pub async fn list_entities(
    store: &dyn KeyValueStore,
    kind: EntityKind,
) -> Result<Vec<Record>, StoreError> {
    let mut records = Vec::new();
    for id in numeric_ids(store, kind.prefix()).await? {
        if let Some(record) = fetch_entity(store, kind, &id).await? {
            records.push(record);
        }
    }
    Ok(records)
}

/// Counts the records of `kind` without fetching them.
pub async fn count_entities(
    store: &dyn KeyValueStore,
    kind: EntityKind,
) -> Result<usize, StoreError> {
    Ok(numeric_ids(store, kind.prefix()).await?.len())
}

/// Seeds every auto-ID counter to `1` unless this was done before.
///
/// Returns whether seeding happened.
pub async fn init_db(store: &dyn KeyValueStore) -> Result<bool, StoreError> {
    if store.get(DB_INITIATED_KEY).await?.is_some() {
        return Ok(false);
    }
    for kind in EntityKind::ALL {
        store.set(&kind.counter_key(), "1").await?;
    }
    store.set(DB_INITIATED_KEY, "1").await?;
    tracing::info!("seeded auto-ID counters");
    Ok(true)
}
