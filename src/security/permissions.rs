//! Permission evaluators: the per-object half of the authorization policy.

use super::{Permission, Principal};
use crate::entity::{EntityId, PersistentEntity};
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

/// Decides whether `principal` may perform `permission` on `entity`. Evaluated synchronously.
pub trait PermissionEvaluator<E>: Send + Sync {
    fn has_permission(&self, principal: &Principal, entity: &E, permission: Permission) -> bool;
}

/// Grants everything. Useful when only the super-admin role matters or for local development.
#[derive(Clone, Copy, Debug, Default)]
pub struct AllowAll;

impl<E> PermissionEvaluator<E> for AllowAll {
    fn has_permission(&self, _principal: &Principal, _entity: &E, _permission: Permission) -> bool {
        true
    }
}

/// Grants nothing; only the super-admin role gets through.
#[derive(Clone, Copy, Debug, Default)]
pub struct DenyAll;

impl<E> PermissionEvaluator<E> for DenyAll {
    fn has_permission(&self, _principal: &Principal, _entity: &E, _permission: Permission) -> bool {
        false
    }
}

/// Evaluator backed by a closure.
pub struct FnEvaluator<F>(pub F);

impl<E, F> PermissionEvaluator<E> for FnEvaluator<F>
where
    F: Fn(&Principal, &E, Permission) -> bool + Send + Sync,
{
    fn has_permission(&self, principal: &Principal, entity: &E, permission: Permission) -> bool {
        (self.0)(principal, entity, permission)
    }
}

/// Who a grant applies to.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Grantee {
    User(String),
    Role(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct GrantKey {
    grantee: Grantee,
    entity: String,
    /// `None`: every instance of the entity type, transient ones included.
    id: Option<EntityId>,
}

/// Runtime-editable grant table keyed by grantee, entity type and optionally entity id.
#[derive(Debug, Default)]
pub struct PermissionTable {
    grants: RwLock<HashMap<GrantKey, HashSet<Permission>>>,
}

impl PermissionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant `permissions` on every instance of `entity`.
    pub fn grant_type(&self, grantee: Grantee, entity: &str, permissions: &[Permission]) {
        self.grant(
            GrantKey {
                grantee,
                entity: entity.to_string(),
                id: None,
            },
            permissions,
        );
    }

    /// Grant `permissions` on the single record `entity`/`id`.
    pub fn grant_instance(&self, grantee: Grantee, entity: &str, id: EntityId, permissions: &[Permission]) {
        self.grant(
            GrantKey {
                grantee,
                entity: entity.to_string(),
                id: Some(id),
            },
            permissions,
        );
    }

    /// Remove all grants held on the single record `entity`/`id` (e.g. after it was deleted).
    pub fn revoke_instance(&self, entity: &str, id: EntityId) {
        match self.grants.write() {
            Ok(mut grants) => grants.retain(|k, _| !(k.entity == entity && k.id == Some(id))),
            Err(_) => tracing::warn!(entity, id, "permission table lock poisoned; revoke skipped"),
        }
    }

    fn grant(&self, key: GrantKey, permissions: &[Permission]) {
        match self.grants.write() {
            Ok(mut grants) => grants.entry(key).or_default().extend(permissions.iter().copied()),
            Err(_) => tracing::warn!("permission table lock poisoned; grant skipped"),
        }
    }

    /// True when the principal (by name or any of its roles) holds `permission` on the type or the id.
    pub fn permits(&self, principal: &Principal, entity: &str, id: Option<EntityId>, permission: Permission) -> bool {
        let grants = match self.grants.read() {
            Ok(g) => g,
            Err(_) => {
                tracing::warn!("permission table lock poisoned; denying");
                return false;
            }
        };
        let grantees = std::iter::once(Grantee::User(principal.name.clone()))
            .chain(principal.roles.iter().cloned().map(Grantee::Role));
        for grantee in grantees {
            let scopes = std::iter::once(None).chain(id.map(Some));
            for scope in scopes {
                let key = GrantKey {
                    grantee: grantee.clone(),
                    entity: entity.to_string(),
                    id: scope,
                };
                if grants.get(&key).is_some_and(|p| p.contains(&permission)) {
                    return true;
                }
            }
        }
        false
    }
}

impl<E: PersistentEntity> PermissionEvaluator<E> for PermissionTable {
    fn has_permission(&self, principal: &Principal, entity: &E, permission: Permission) -> bool {
        self.permits(principal, E::ENTITY_NAME, entity.id(), permission)
    }
}
