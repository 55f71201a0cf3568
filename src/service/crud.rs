//! Generic CRUD over a [`Dao`], guarded by an [`AuthorizationPolicy`].

use crate::dao::Dao;
use crate::entity::{EntityId, PersistentEntity};
use crate::error::ServiceError;
use crate::security::{AuthorizationPolicy, Permission, Principal};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Service operations the entity routes depend on. Every call carries the acting principal.
#[async_trait]
pub trait EntityService<E: PersistentEntity>: Send + Sync {
    /// Needs super-admin, CREATE for transient entities, or UPDATE for persistent ones.
    async fn save_or_update(&self, principal: &Principal, entity: E) -> Result<E, ServiceError>;

    /// Merge the top-level fields of `patch` onto `entity`, then save. Needs super-admin or UPDATE.
    async fn update_partial(&self, principal: &Principal, entity: E, patch: &Value) -> Result<E, ServiceError>;

    /// `None` when absent; otherwise the result needs super-admin or READ.
    async fn find_by_id(&self, principal: &Principal, id: EntityId) -> Result<Option<E>, ServiceError>;

    /// Like `find_by_id`, but the store may hand back an unmaterialized reference.
    async fn load_by_id(&self, principal: &Principal, id: EntityId) -> Result<Option<E>, ServiceError>;

    /// Everything the principal may READ, in store order.
    async fn find_all(&self, principal: &Principal) -> Result<Vec<E>, ServiceError>;

    async fn delete(&self, principal: &Principal, entity: E) -> Result<(), ServiceError>;

    /// Transient copy of `entity` (needs READ on the source); saved under a new id when `persist`.
    async fn clone_entity(&self, principal: &Principal, entity: E, persist: bool) -> Result<E, ServiceError>;
}

pub struct CrudService<E, D> {
    dao: Arc<D>,
    policy: AuthorizationPolicy<E>,
}

impl<E, D> Clone for CrudService<E, D> {
    fn clone(&self) -> Self {
        CrudService {
            dao: Arc::clone(&self.dao),
            policy: self.policy.clone(),
        }
    }
}

impl<E: PersistentEntity, D: Dao<E>> CrudService<E, D> {
    pub fn new(dao: Arc<D>, policy: AuthorizationPolicy<E>) -> Self {
        CrudService { dao, policy }
    }

    pub fn dao(&self) -> &Arc<D> {
        &self.dao
    }

    pub fn policy(&self) -> &AuthorizationPolicy<E> {
        &self.policy
    }

    fn save_permission(entity: &E) -> Permission {
        if entity.is_transient() {
            Permission::Create
        } else {
            Permission::Update
        }
    }
}

/// Overwrite fields of `target` with those present in `patch`. Identity fields are never merged.
pub fn merge_patch<E: PersistentEntity>(target: &E, patch: &Value) -> Result<E, ServiceError> {
    let fields = patch.as_object().ok_or_else(|| {
        ServiceError::Deserialize(serde::de::Error::custom("patch document must be a JSON object"))
    })?;
    let mut merged = serde_json::to_value(target).map_err(ServiceError::Deserialize)?;
    let Value::Object(current) = &mut merged else {
        return Err(ServiceError::Deserialize(serde::de::Error::custom(format!(
            "{} does not serialize to a JSON object",
            E::ENTITY_NAME
        ))));
    };
    for (key, value) in fields {
        if matches!(key.as_str(), "id" | "created" | "modified") {
            continue;
        }
        current.insert(key.clone(), value.clone());
    }
    serde_json::from_value(merged).map_err(ServiceError::Deserialize)
}

#[async_trait]
impl<E: PersistentEntity, D: Dao<E>> EntityService<E> for CrudService<E, D> {
    async fn save_or_update(&self, principal: &Principal, entity: E) -> Result<E, ServiceError> {
        self.policy
            .pre_authorize(principal, &entity, Self::save_permission(&entity))?;
        tracing::debug!(entity = E::ENTITY_NAME, id = ?entity.id(), "save_or_update");
        Ok(self.dao.save_or_update(entity).await?)
    }

    async fn update_partial(&self, principal: &Principal, entity: E, patch: &Value) -> Result<E, ServiceError> {
        self.policy.pre_authorize(principal, &entity, Permission::Update)?;
        let merged = merge_patch(&entity, patch)?;
        self.save_or_update(principal, merged).await
    }

    async fn find_by_id(&self, principal: &Principal, id: EntityId) -> Result<Option<E>, ServiceError> {
        tracing::debug!(entity = E::ENTITY_NAME, id, "find_by_id");
        let found = self.dao.find_by_id(id).await?;
        self.policy.post_authorize(principal, found, Permission::Read)
    }

    async fn load_by_id(&self, principal: &Principal, id: EntityId) -> Result<Option<E>, ServiceError> {
        tracing::debug!(entity = E::ENTITY_NAME, id, "load_by_id");
        let found = self.dao.load_by_id(id).await?;
        self.policy.post_authorize(principal, found, Permission::Read)
    }

    async fn find_all(&self, principal: &Principal) -> Result<Vec<E>, ServiceError> {
        tracing::debug!(entity = E::ENTITY_NAME, "find_all");
        let all = self.dao.find_all().await?;
        Ok(self.policy.post_filter(principal, all, Permission::Read))
    }

    async fn delete(&self, principal: &Principal, entity: E) -> Result<(), ServiceError> {
        self.policy.pre_authorize(principal, &entity, Permission::Delete)?;
        tracing::debug!(entity = E::ENTITY_NAME, id = ?entity.id(), "delete");
        Ok(self.dao.delete(&entity).await?)
    }

    async fn clone_entity(&self, principal: &Principal, entity: E, persist: bool) -> Result<E, ServiceError> {
        self.policy.pre_authorize(principal, &entity, Permission::Read)?;
        self.dao.evict(&entity);
        let source_id = entity.id();
        let copy = entity.detached();
        if !persist {
            return Ok(copy);
        }
        let saved = self.dao.save_or_update(copy).await?;
        tracing::debug!(entity = E::ENTITY_NAME, from = ?source_id, to = ?saved.id(), "cloned");
        Ok(saved)
    }
}
