//! In-process store: ordered map guarded by a lock, ids from a sequence advanced under that lock.

use super::Dao;
use crate::entity::{EntityId, PersistentEntity};
use crate::error::StoreError;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::RwLock;

pub struct MemoryDao<E> {
    rows: RwLock<BTreeMap<EntityId, E>>,
    next_id: AtomicI64,
}

impl<E> Default for MemoryDao<E> {
    fn default() -> Self {
        Self::starting_at(1)
    }
}

impl<E: PersistentEntity> MemoryDao<E> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<E> MemoryDao<E> {
    /// Store whose first assigned id is `first_id`.
    pub fn starting_at(first_id: EntityId) -> Self {
        MemoryDao {
            rows: RwLock::new(BTreeMap::new()),
            next_id: AtomicI64::new(i64::from(first_id)),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned() -> StoreError {
    StoreError::Unavailable("memory store lock poisoned".into())
}

#[async_trait]
impl<E: PersistentEntity> Dao<E> for MemoryDao<E> {
    async fn save_or_update(&self, mut entity: E) -> Result<E, StoreError> {
        let now = Utc::now();
        let mut rows = self.rows.write().map_err(|_| poisoned())?;
        match entity.id() {
            None => {
                let next = self.next_id.load(Ordering::SeqCst);
                let id = EntityId::try_from(next).map_err(|_| StoreError::IdsExhausted(E::ENTITY_NAME))?;
                self.next_id.store(next + 1, Ordering::SeqCst);
                let base = entity.base_mut();
                base.id = Some(id);
                base.created = Some(now);
                base.modified = Some(now);
                rows.insert(id, entity.clone());
                tracing::debug!(entity = E::ENTITY_NAME, id, "inserted");
            }
            Some(id) => {
                let existing = rows.get(&id).ok_or(StoreError::NotFound {
                    entity: E::ENTITY_NAME,
                    id,
                })?;
                let created = existing.base().created.or(Some(now));
                let base = entity.base_mut();
                base.created = created;
                base.modified = Some(now);
                rows.insert(id, entity.clone());
                tracing::debug!(entity = E::ENTITY_NAME, id, "updated");
            }
        }
        Ok(entity)
    }

    async fn delete(&self, entity: &E) -> Result<(), StoreError> {
        let id = entity.id().ok_or(StoreError::Transient(E::ENTITY_NAME))?;
        let mut rows = self.rows.write().map_err(|_| poisoned())?;
        rows.remove(&id).ok_or(StoreError::NotFound {
            entity: E::ENTITY_NAME,
            id,
        })?;
        tracing::debug!(entity = E::ENTITY_NAME, id, "deleted");
        Ok(())
    }

    async fn find_by_id(&self, id: EntityId) -> Result<Option<E>, StoreError> {
        let rows = self.rows.read().map_err(|_| poisoned())?;
        Ok(rows.get(&id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<E>, StoreError> {
        let rows = self.rows.read().map_err(|_| poisoned())?;
        Ok(rows.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::PersistentObject;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct Note {
        #[serde(flatten)]
        base: PersistentObject,
        text: String,
    }

    crate::impl_persistent_entity!(Note, "note");

    fn note(text: &str) -> Note {
        Note {
            base: PersistentObject::default(),
            text: text.into(),
        }
    }

    #[tokio::test]
    async fn insert_assigns_sequential_ids_and_timestamps() {
        let dao = MemoryDao::starting_at(42);
        let a = dao.save_or_update(note("a")).await.unwrap();
        let b = dao.save_or_update(note("b")).await.unwrap();
        assert_eq!(a.id(), Some(42));
        assert_eq!(b.id(), Some(43));
        assert!(a.base.created.is_some());
        assert_eq!(a.base.created, a.base.modified);
        assert_eq!(dao.find_by_id(42).await.unwrap(), Some(a));
    }

    #[tokio::test]
    async fn update_keeps_id_and_created() {
        let dao = MemoryDao::new();
        let saved = dao.save_or_update(note("first")).await.unwrap();
        let mut edited = saved.clone();
        edited.text = "second".into();
        edited.base.created = None;
        let updated = dao.save_or_update(edited).await.unwrap();
        assert_eq!(updated.id(), saved.id());
        assert_eq!(updated.base.created, saved.base.created);
        assert_eq!(dao.len(), 1);
        assert_eq!(dao.find_by_id(1).await.unwrap().unwrap().text, "second");
    }

    #[tokio::test]
    async fn update_of_unknown_id_is_not_found() {
        let dao: MemoryDao<Note> = MemoryDao::new();
        let ghost = note("ghost").with_id(Some(9));
        let err = dao.save_or_update(ghost).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { id: 9, .. }));
        assert!(dao.is_empty());
    }

    #[tokio::test]
    async fn delete_transient_and_missing() {
        let dao: MemoryDao<Note> = MemoryDao::new();
        assert!(matches!(dao.delete(&note("t")).await, Err(StoreError::Transient(_))));
        assert!(matches!(
            dao.delete(&note("m").with_id(Some(5))).await,
            Err(StoreError::NotFound { .. })
        ));
        let saved = dao.save_or_update(note("x")).await.unwrap();
        dao.delete(&saved).await.unwrap();
        assert_eq!(dao.load_by_id(saved.id().unwrap()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn id_sequence_stops_at_max() {
        let dao = MemoryDao::starting_at(i32::MAX);
        let last = dao.save_or_update(note("last")).await.unwrap();
        assert_eq!(last.id(), Some(i32::MAX));
        let err = dao.save_or_update(note("one more")).await.unwrap_err();
        assert!(matches!(err, StoreError::IdsExhausted("note")));
        assert_eq!(dao.len(), 1);
    }

    #[tokio::test]
    async fn find_all_is_ordered_by_id() {
        let dao = MemoryDao::new();
        for t in ["c", "a", "b"] {
            dao.save_or_update(note(t)).await.unwrap();
        }
        let texts: Vec<_> = dao.find_all().await.unwrap().into_iter().map(|n| n.text).collect();
        assert_eq!(texts, vec!["c", "a", "b"]);
    }
}
