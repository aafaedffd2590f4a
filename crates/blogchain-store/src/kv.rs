//! Ordered key/value access inside one SQLite transaction.
//!
//! [`StoreTx`] is the only handle services get to state. Raw methods work on
//! bytes; the `*_record` helpers add bincode encoding, and the counter
//! helpers store fixed-width big-endian integers.

use rusqlite::{params, OptionalExtension, Transaction};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Result, StoreError};

/// A key and its raw value, as returned by scans.
pub type Entry = (Vec<u8>, Vec<u8>);

pub struct StoreTx<'conn> {
    tx: Transaction<'conn>,
}

impl<'conn> StoreTx<'conn> {
    pub(crate) fn new(tx: Transaction<'conn>) -> Self {
        Self { tx }
    }

    pub(crate) fn commit(self) -> Result<()> {
        self.tx.commit()?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Raw bytes
    // ------------------------------------------------------------------

    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let value = self
            .tx
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, Vec<u8>>(0)
            })
            .optional()?;
        Ok(value)
    }

    pub fn has(&self, key: &[u8]) -> Result<bool> {
        let found = self
            .tx
            .query_row("SELECT 1 FROM kv WHERE key = ?1", params![key], |_| Ok(()))
            .optional()?;
        Ok(found.is_some())
    }

    pub fn set(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        self.tx.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    /// Delete a key. Returns `true` if it existed.
    pub fn delete(&mut self, key: &[u8]) -> Result<bool> {
        let affected = self
            .tx
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(affected > 0)
    }

    /// Walk the keys under `prefix` in ascending order.
    ///
    /// `from` moves the lower bound forward (it is inclusive); `offset` skips
    /// that many entries after the lower bound; `limit` caps the result.
    pub fn scan_prefix(
        &self,
        prefix: &[u8],
        from: Option<&[u8]>,
        offset: u64,
        limit: Option<u64>,
    ) -> Result<Vec<Entry>> {
        let lower = match from {
            Some(start) if start > prefix => start,
            _ => prefix,
        };
        let limit = limit.map_or(-1, |n| i64::try_from(n).unwrap_or(i64::MAX));
        let offset = i64::try_from(offset).unwrap_or(i64::MAX);

        let mut entries = Vec::new();
        match prefix_successor(prefix) {
            Some(upper) => {
                let mut stmt = self.tx.prepare_cached(
                    "SELECT key, value FROM kv
                     WHERE key >= ?1 AND key < ?2
                     ORDER BY key ASC
                     LIMIT ?3 OFFSET ?4",
                )?;
                let rows = stmt.query_map(params![lower, upper, limit, offset], row_to_entry)?;
                for row in rows {
                    entries.push(row?);
                }
            }
            None => {
                let mut stmt = self.tx.prepare_cached(
                    "SELECT key, value FROM kv
                     WHERE key >= ?1
                     ORDER BY key ASC
                     LIMIT ?2 OFFSET ?3",
                )?;
                let rows = stmt.query_map(params![lower, limit, offset], row_to_entry)?;
                for row in rows {
                    entries.push(row?);
                }
            }
        }

        tracing::trace!(
            prefix = %String::from_utf8_lossy(prefix),
            count = entries.len(),
            "prefix scan"
        );
        Ok(entries)
    }

    /// Every key under `prefix`, in order.
    pub fn keys_with_prefix(&self, prefix: &[u8]) -> Result<Vec<Vec<u8>>> {
        Ok(self
            .scan_prefix(prefix, None, 0, None)?
            .into_iter()
            .map(|(k, _)| k)
            .collect())
    }

    /// Number of keys under `prefix`.
    pub fn count_prefix(&self, prefix: &[u8]) -> Result<u64> {
        let count: i64 = match prefix_successor(prefix) {
            Some(upper) => self.tx.query_row(
                "SELECT COUNT(*) FROM kv WHERE key >= ?1 AND key < ?2",
                params![prefix, upper],
                |row| row.get(0),
            )?,
            None => self.tx.query_row(
                "SELECT COUNT(*) FROM kv WHERE key >= ?1",
                params![prefix],
                |row| row.get(0),
            )?,
        };
        Ok(u64::try_from(count).unwrap_or(0))
    }

    // ------------------------------------------------------------------
    // Typed helpers
    // ------------------------------------------------------------------

    pub fn get_record<T: DeserializeOwned>(&self, key: &[u8]) -> Result<Option<T>> {
        match self.get(key)? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn set_record<T: Serialize>(&mut self, key: &[u8], record: &T) -> Result<()> {
        let bytes = bincode::serialize(record)?;
        self.set(key, &bytes)
    }

    /// Existence-only index entry.
    pub fn set_marker(&mut self, key: &[u8]) -> Result<()> {
        self.set(key, &[])
    }

    pub fn get_u64(&self, key: &[u8]) -> Result<Option<u64>> {
        match self.get(key)? {
            Some(bytes) => {
                let arr: [u8; 8] = bytes.as_slice().try_into().map_err(|_| {
                    StoreError::Corrupt(format!(
                        "counter '{}' is {} bytes, expected 8",
                        String::from_utf8_lossy(key),
                        bytes.len()
                    ))
                })?;
                Ok(Some(u64::from_be_bytes(arr)))
            }
            None => Ok(None),
        }
    }

    pub fn set_u64(&mut self, key: &[u8], value: u64) -> Result<()> {
        self.set(key, &value.to_be_bytes())
    }
}

fn row_to_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<Entry> {
    Ok((row.get(0)?, row.get(1)?))
}

/// Smallest key greater than every key starting with `prefix`, or `None` if
/// the prefix is all `0xFF` bytes (the range is then unbounded above).
pub fn prefix_successor(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut upper = prefix.to_vec();
    while let Some(last) = upper.pop() {
        if last < 0xFF {
            upper.push(last + 1);
            return Some(upper);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    #[test]
    fn test_prefix_successor() {
        assert_eq!(prefix_successor(b"ab"), Some(b"ac".to_vec()));
        assert_eq!(prefix_successor(&[0x01, 0xFF]), Some(vec![0x02]));
        assert_eq!(prefix_successor(&[0xFF, 0xFF]), None);
    }

    #[test]
    fn test_scan_stays_inside_prefix() {
        let mut db = Database::open_in_memory().unwrap();
        db.transact(|tx| {
            tx.set_marker(b"a/1")?;
            tx.set_marker(b"a/2")?;
            tx.set_marker(b"a/3")?;
            tx.set_marker(b"ab/1")?;
            tx.set_marker(b"b/1")
        })
        .unwrap();

        db.read(|tx| {
            let keys = tx.keys_with_prefix(b"a/")?;
            assert_eq!(keys, vec![b"a/1".to_vec(), b"a/2".to_vec(), b"a/3".to_vec()]);
            assert_eq!(tx.count_prefix(b"a/")?, 3);

            let page = tx.scan_prefix(b"a/", None, 1, Some(1))?;
            assert_eq!(page[0].0, b"a/2".to_vec());

            let from = tx.scan_prefix(b"a/", Some(&b"a/3"[..]), 0, None)?;
            assert_eq!(from.len(), 1);
            Ok::<_, StoreError>(())
        })
        .unwrap();
    }

    #[test]
    fn test_records_and_counters() {
        let mut db = Database::open_in_memory().unwrap();
        db.transact(|tx| {
            tx.set_record(b"rec", &("hello".to_string(), 7u32))?;
            tx.set_u64(b"ctr", 42)?;
            assert!(tx.delete(b"ctr")?);
            assert!(!tx.delete(b"ctr")?);
            tx.set_u64(b"ctr", 43)
        })
        .unwrap();

        db.read(|tx| {
            let rec: Option<(String, u32)> = tx.get_record(b"rec")?;
            assert_eq!(rec, Some(("hello".to_string(), 7)));
            assert_eq!(tx.get_u64(b"ctr")?, Some(43));
            assert!(tx.has(b"rec")?);
            assert!(!tx.has(b"nope")?);
            Ok::<_, StoreError>(())
        })
        .unwrap();
    }

    #[test]
    fn test_corrupt_counter_reported() {
        let mut db = Database::open_in_memory().unwrap();
        db.transact(|tx| tx.set(b"ctr", b"abc")).unwrap();
        let err = db.read(|tx| tx.get_u64(b"ctr")).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt(_)));
    }
}
