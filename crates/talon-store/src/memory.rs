use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::error::StoreError;
use crate::traits::{Association, AssociationStore};

/// MemoryStore keeps the association table in process memory. Intended for
/// tests and ephemeral deployments; contents are lost on drop.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, String>>, StoreError> {
        self.records
            .lock()
            .map_err(|_| StoreError::Storage("association table lock poisoned".to_string()))
    }
}

impl AssociationStore for MemoryStore {
    fn all(&self) -> Result<Vec<Association>, StoreError> {
        let records = self.lock()?;
        Ok(records
            .iter()
            .map(|(user_uuid, external_id)| Association {
                user_uuid: user_uuid.clone(),
                external_id: external_id.clone(),
            })
            .collect())
    }

    fn get(&self, user_uuid: &str) -> Result<Option<String>, StoreError> {
        Ok(self.lock()?.get(user_uuid).cloned())
    }

    fn set(&self, user_uuid: &str, external_id: &str) -> Result<(), StoreError> {
        self.lock()?
            .insert(user_uuid.to_string(), external_id.to_string());
        Ok(())
    }

    fn delete(&self, user_uuid: &str) -> Result<(), StoreError> {
        self.lock()?.remove(user_uuid);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let store = MemoryStore::new();

        store.set("uuid-1", "ext-42").unwrap();
        store.set("uuid-2", "ext-43").unwrap();

        assert_eq!(store.get("uuid-1").unwrap(), Some("ext-42".to_string()));
        assert_eq!(store.all().unwrap().len(), 2);

        store.delete("uuid-1").unwrap();
        assert_eq!(store.get("uuid-1").unwrap(), None);
    }
}
