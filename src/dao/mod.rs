//! Data-access capability for one entity type, plus in-memory and PostgreSQL implementations.

mod memory;
mod postgres;

pub use memory::MemoryDao;
pub use postgres::PgDao;

use crate::entity::{EntityId, PersistentEntity};
use crate::error::StoreError;
use async_trait::async_trait;

/// Store operations for entity type `E`. Each call is one unit of work; callers never hold a
/// transaction across calls, and failures (including concurrent-modification conflicts) are
/// returned as-is rather than retried.
#[async_trait]
pub trait Dao<E: PersistentEntity>: Send + Sync {
    /// Insert a transient entity (assigning its id) or update a persistent one in place.
    async fn save_or_update(&self, entity: E) -> Result<E, StoreError>;

    async fn delete(&self, entity: &E) -> Result<(), StoreError>;

    async fn find_by_id(&self, id: EntityId) -> Result<Option<E>, StoreError>;

    /// Reference to the record with this id. Implementations may skip materializing it, so the
    /// result can be stale; stores without lazy references just fetch.
    async fn load_by_id(&self, id: EntityId) -> Result<Option<E>, StoreError> {
        self.find_by_id(id).await
    }

    /// All records, ordered by id.
    async fn find_all(&self) -> Result<Vec<E>, StoreError>;

    /// Stop tracking `entity`. Stores without a session have nothing to detach.
    fn evict(&self, entity: &E) {
        tracing::trace!(entity = E::ENTITY_NAME, id = ?entity.id(), "evict");
    }
}
