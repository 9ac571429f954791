use std::path::Path;
use std::sync::Arc;

use redb::{Database, TableDefinition};
use tracing::debug;

use crate::error::StoreError;
use crate::traits::{Association, AssociationStore};

const TABLE: TableDefinition<&str, &str> = TableDefinition::new("associations");

/// RedbStore is an AssociationStore backed by redb, an embedded pure-Rust
/// key-value database. Opening the database doubles as the connectivity
/// check: a store that cannot be opened fails at construction, not on
/// first use.
pub struct RedbStore {
    db: Arc<Database>,
}

impl RedbStore {
    /// Open or create a redb database at the given path.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let db = Database::create(path).map_err(|e| StoreError::Unavailable(e.to_string()))?;

        // Ensure the table exists by doing a write transaction.
        let write_txn = db
            .begin_write()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        {
            let _table = write_txn
                .open_table(TABLE)
                .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        }
        write_txn
            .commit()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        debug!(path = %path.display(), "opened association store");

        Ok(Self { db: Arc::new(db) })
    }
}

impl AssociationStore for RedbStore {
    fn all(&self) -> Result<Vec<Association>, StoreError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        let table = read_txn
            .open_table(TABLE)
            .map_err(|e| StoreError::Storage(e.to_string()))?;

        let mut records = Vec::new();
        let iter = table
            .range(""..)
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        for entry in iter {
            let (key, value) = entry.map_err(|e| StoreError::Storage(e.to_string()))?;
            records.push(Association {
                user_uuid: key.value().to_string(),
                external_id: value.value().to_string(),
            });
        }

        Ok(records)
    }

    fn get(&self, user_uuid: &str) -> Result<Option<String>, StoreError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        let table = read_txn
            .open_table(TABLE)
            .map_err(|e| StoreError::Storage(e.to_string()))?;

        match table.get(user_uuid) {
            Ok(Some(value)) => Ok(Some(value.value().to_string())),
            Ok(None) => Ok(None),
            Err(e) => Err(StoreError::Storage(e.to_string())),
        }
    }

    fn set(&self, user_uuid: &str, external_id: &str) -> Result<(), StoreError> {
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        {
            let mut table = write_txn
                .open_table(TABLE)
                .map_err(|e| StoreError::Storage(e.to_string()))?;
            table
                .insert(user_uuid, external_id)
                .map_err(|e| StoreError::Storage(e.to_string()))?;
        }
        write_txn
            .commit()
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        Ok(())
    }

    fn delete(&self, user_uuid: &str) -> Result<(), StoreError> {
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        {
            let mut table = write_txn
                .open_table(TABLE)
                .map_err(|e| StoreError::Storage(e.to_string()))?;
            table
                .remove(user_uuid)
                .map_err(|e| StoreError::Storage(e.to_string()))?;
        }
        write_txn
            .commit()
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = RedbStore::open(&dir.path().join("associations.redb")).unwrap();

        store.set("uuid-1", "ext-42").unwrap();
        assert_eq!(store.get("uuid-1").unwrap(), Some("ext-42".to_string()));

        let records = store.all().unwrap();
        assert_eq!(
            records,
            vec![Association {
                user_uuid: "uuid-1".to_string(),
                external_id: "ext-42".to_string(),
            }]
        );

        store.delete("uuid-1").unwrap();
        assert_eq!(store.get("uuid-1").unwrap(), None);
        assert!(store.all().unwrap().is_empty());
    }

    #[test]
    fn persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("associations.redb");

        {
            let store = RedbStore::open(&path).unwrap();
            store.set("uuid-1", "ext-42").unwrap();
        }

        let store = RedbStore::open(&path).unwrap();
        assert_eq!(store.get("uuid-1").unwrap(), Some("ext-42".to_string()));
    }

    #[test]
    fn delete_missing_key_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let store = RedbStore::open(&dir.path().join("associations.redb")).unwrap();

        store.delete("uuid-absent").unwrap();
        assert!(store.all().unwrap().is_empty());
    }

    #[test]
    fn set_overwrites_existing_value() {
        let dir = tempfile::tempdir().unwrap();
        let store = RedbStore::open(&dir.path().join("associations.redb")).unwrap();

        store.set("uuid-1", "ext-42").unwrap();
        store.set("uuid-1", "ext-43").unwrap();

        assert_eq!(store.get("uuid-1").unwrap(), Some("ext-43".to_string()));
        assert_eq!(store.all().unwrap().len(), 1);
    }
}
