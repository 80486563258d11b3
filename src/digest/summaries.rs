use crate::digest::storage::{KEY_SAVED_SUMMARIES, SyncStorage};
use crate::error::DigestError;
use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRecord {
    pub title: String,
    pub url: String,
    pub text: String,
    /// Epoch milliseconds.
    pub timestamp: u64,
}

fn decode(value: Option<Value>) -> Result<Vec<SummaryRecord>> {
    let Some(value) = value else {
        return Ok(Vec::new());
    };
    serde_json::from_value(value).map_err(|err| {
        anyhow!(DigestError::StorageCorrupt(format!(
            "{KEY_SAVED_SUMMARIES}: {err}"
        )))
    })
}

fn encode(records: &[SummaryRecord]) -> Result<Value> {
    Ok(serde_json::to_value(records)?)
}

fn prepend_bounded(records: &mut Vec<SummaryRecord>, record: SummaryRecord, max_len: usize) {
    records.insert(0, record);
    records.truncate(max_len);
}

fn remove_at(records: &mut Vec<SummaryRecord>, index: usize) -> Result<SummaryRecord> {
    if index >= records.len() {
        return Err(anyhow!(DigestError::IndexOutOfRange {
            index,
            len: records.len(),
        }));
    }
    Ok(records.remove(index))
}

/// Most recent first.
pub fn list(storage: &SyncStorage) -> Result<Vec<SummaryRecord>> {
    decode(storage.get(KEY_SAVED_SUMMARIES)?)
}

pub fn get(storage: &SyncStorage, index: usize) -> Result<SummaryRecord> {
    let mut records = list(storage)?;
    remove_at(&mut records, index)
}

/// Prepend `record` and keep at most `max_len` entries. Returns the new length.
pub fn save(storage: &SyncStorage, record: SummaryRecord, max_len: usize) -> Result<usize> {
    let mut stored_len = 0usize;
    storage.update(KEY_SAVED_SUMMARIES, |current| {
        let mut records = decode(current)?;
        prepend_bounded(&mut records, record, max_len);
        stored_len = records.len();
        Ok(Some(encode(&records)?))
    })?;
    Ok(stored_len)
}

pub fn delete(storage: &SyncStorage, index: usize) -> Result<SummaryRecord> {
    let mut removed = None;
    storage.update(KEY_SAVED_SUMMARIES, |current| {
        let mut records = decode(current)?;
        removed = Some(remove_at(&mut records, index)?);
        Ok(Some(encode(&records)?))
    })?;
    removed.ok_or_else(|| anyhow!(DigestError::IndexOutOfRange { index, len: 0 }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn record(n: u64) -> SummaryRecord {
        SummaryRecord {
            title: format!("Page {n}"),
            url: format!("https://example.com/{n}"),
            text: format!("• summary {n}"),
            timestamp: 1_700_000_000_000 + n,
        }
    }

    #[test]
    fn saving_past_the_bound_evicts_the_oldest() {
        let tmp = tempdir().expect("tempdir");
        let storage = SyncStorage::open(tmp.path().join("sync_storage.json"));

        for n in 1..=51 {
            save(&storage, record(n), 50).expect("save");
        }

        let records = list(&storage).expect("list");
        assert_eq!(records.len(), 50);
        assert_eq!(records[0], record(51));
        assert_eq!(records[49], record(2));
        assert!(!records.contains(&record(1)));
    }

    #[test]
    fn delete_keeps_relative_order_of_the_rest() {
        let tmp = tempdir().expect("tempdir");
        let storage = SyncStorage::open(tmp.path().join("sync_storage.json"));
        for n in 1..=4 {
            save(&storage, record(n), 50).expect("save");
        }

        let removed = delete(&storage, 1).expect("delete");
        assert_eq!(removed, record(3));

        let records = list(&storage).expect("list");
        assert_eq!(records, vec![record(4), record(2), record(1)]);
    }

    #[test]
    fn delete_out_of_range_leaves_store_unchanged() {
        let tmp = tempdir().expect("tempdir");
        let storage = SyncStorage::open(tmp.path().join("sync_storage.json"));
        save(&storage, record(1), 50).expect("save");

        let err = delete(&storage, 3).expect_err("out of range");
        assert!(matches!(
            err.downcast_ref::<DigestError>(),
            Some(DigestError::IndexOutOfRange { index: 3, len: 1 })
        ));
        assert_eq!(list(&storage).expect("list").len(), 1);
    }

    #[test]
    fn get_reads_without_mutating() {
        let tmp = tempdir().expect("tempdir");
        let storage = SyncStorage::open(tmp.path().join("sync_storage.json"));
        save(&storage, record(1), 50).expect("save");
        save(&storage, record(2), 50).expect("save");

        assert_eq!(get(&storage, 1).expect("get"), record(1));
        assert_eq!(list(&storage).expect("list").len(), 2);
    }

    #[test]
    fn records_use_the_stored_field_names() {
        let value = serde_json::to_value(record(7)).expect("encode");
        assert_eq!(value["title"], "Page 7");
        assert_eq!(value["timestamp"], 1_700_000_000_007u64);
    }
}
