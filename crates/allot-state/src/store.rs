//! StateStore — redb-backed record persistence for allot.
//!
//! Provides typed CRUD operations over counter and bucket-set records.
//! All values are JSON-serialized into redb's `&[u8]` value columns. The
//! store supports both on-disk and in-memory backends (the latter for
//! testing and dry runs).

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition, TableHandle};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use allot_core::ResourceKind;

use crate::error::{StateError, StateResult};
use crate::tables::*;
use crate::types::*;

/// Convert any `Display` error into a `StateError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StateError::$variant(e.to_string())
    };
}

type Table = TableDefinition<'static, &'static str, &'static [u8]>;

/// Thread-safe state store backed by redb.
#[derive(Clone)]
pub struct StateStore {
    db: Arc<Database>,
}

impl StateStore {
    /// Open (or create) a persistent state store at the given path.
    pub fn open(path: &Path) -> StateResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!(?path, "state store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory state store.
    pub fn open_in_memory() -> StateResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory state store opened");
        Ok(store)
    }

    /// Create all tables if they don't exist yet.
    fn ensure_tables(&self) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(COUNTERS).map_err(map_err!(Table))?;
        txn.open_table(BUCKETS).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    // ── Generic record access ──────────────────────────────────────

    fn put<T: Serialize>(&self, table: Table, key: &str, record: &T) -> StateResult<()> {
        let value = serde_json::to_vec(record).map_err(|source| StateError::Encode {
            name: key.to_string(),
            source,
        })?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(table).map_err(map_err!(Table))?;
            table
                .insert(key, value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    fn get<T: DeserializeOwned>(&self, table: Table, key: &str) -> StateResult<Option<T>> {
        let table_name = table.name().to_string();
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(table).map_err(map_err!(Table))?;
        match table.get(key).map_err(map_err!(Read))? {
            Some(guard) => decode(&table_name, key, guard.value()).map(Some),
            None => Ok(None),
        }
    }

    /// Every record in `table`, in key order.
    fn list<T: DeserializeOwned>(&self, table: Table) -> StateResult<Vec<T>> {
        let table_name = table.name().to_string();
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(table).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (key, value) = entry.map_err(map_err!(Read))?;
            results.push(decode(&table_name, key.value(), value.value())?);
        }
        Ok(results)
    }

    fn delete(&self, table: Table, key: &str) -> StateResult<bool> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let existed;
        {
            let mut table = txn.open_table(table).map_err(map_err!(Table))?;
            existed = table.remove(key).map_err(map_err!(Write))?.is_some();
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(existed)
    }

    // ── Counters ───────────────────────────────────────────────────

    /// Insert or replace a counter record.
    pub fn put_counter(&self, record: &CounterRecord) -> StateResult<()> {
        self.put(COUNTERS, &record.name, record)?;
        debug!(name = %record.name, last_value = record.assignment.last_value, "counter stored");
        Ok(())
    }

    /// Get a counter record by name.
    pub fn get_counter(&self, name: &str) -> StateResult<Option<CounterRecord>> {
        self.get(COUNTERS, name)
    }

    /// Get a counter record by name, failing if it does not exist.
    pub fn require_counter(&self, name: &str) -> StateResult<CounterRecord> {
        self.get_counter(name)?
            .ok_or_else(|| StateError::NotFound {
                kind: ResourceKind::Counter,
                name: name.to_string(),
            })
    }

    /// List all counter records, ordered by name.
    pub fn list_counters(&self) -> StateResult<Vec<CounterRecord>> {
        self.list(COUNTERS)
    }

    /// Delete a counter record. Returns true if it existed.
    pub fn delete_counter(&self, name: &str) -> StateResult<bool> {
        let existed = self.delete(COUNTERS, name)?;
        debug!(%name, existed, "counter deleted");
        Ok(existed)
    }

    // ── Buckets ────────────────────────────────────────────────────

    /// Insert or replace a bucket-set record.
    pub fn put_buckets(&self, record: &BucketsRecord) -> StateResult<()> {
        self.put(BUCKETS, &record.name, record)?;
        debug!(name = %record.name, capacities = ?record.buckets.capacities(), "buckets stored");
        Ok(())
    }

    /// Get a bucket-set record by name.
    pub fn get_buckets(&self, name: &str) -> StateResult<Option<BucketsRecord>> {
        self.get(BUCKETS, name)
    }

    /// Get a bucket-set record by name, failing if it does not exist.
    pub fn require_buckets(&self, name: &str) -> StateResult<BucketsRecord> {
        self.get_buckets(name)?
            .ok_or_else(|| StateError::NotFound {
                kind: ResourceKind::Buckets,
                name: name.to_string(),
            })
    }

    /// List all bucket-set records, ordered by name.
    pub fn list_buckets(&self) -> StateResult<Vec<BucketsRecord>> {
        self.list(BUCKETS)
    }

    /// Delete a bucket-set record. Returns true if it existed.
    pub fn delete_buckets(&self, name: &str) -> StateResult<bool> {
        let existed = self.delete(BUCKETS, name)?;
        debug!(%name, existed, "buckets deleted");
        Ok(existed)
    }

    // ── Whole store ────────────────────────────────────────────────

    /// Every stored record of every kind.
    pub fn snapshot(&self) -> StateResult<Snapshot> {
        Ok(Snapshot {
            counters: self.list_counters()?,
            buckets: self.list_buckets()?,
        })
    }
}

fn decode<T: DeserializeOwned>(table: &str, name: &str, bytes: &[u8]) -> StateResult<T> {
    serde_json::from_slice(bytes).map_err(|source| StateError::Corrupt {
        table: table.to_string(),
        name: name.to_string(),
        source,
    })
}
