//! Pre/post authorization around service calls. Explicit calls instead of interception:
//! the service passes the principal, the target (or result) and the required permission.

use super::{Permission, PermissionEvaluator, Principal};
use crate::entity::PersistentEntity;
use crate::error::ServiceError;
use std::sync::Arc;

pub const DEFAULT_SUPER_ADMIN_ROLE: &str = "ROLE_SUPERADMIN";

pub struct AuthorizationPolicy<E> {
    super_admin_role: String,
    evaluator: Arc<dyn PermissionEvaluator<E>>,
}

impl<E> Clone for AuthorizationPolicy<E> {
    fn clone(&self) -> Self {
        AuthorizationPolicy {
            super_admin_role: self.super_admin_role.clone(),
            evaluator: Arc::clone(&self.evaluator),
        }
    }
}

impl<E: PersistentEntity> AuthorizationPolicy<E> {
    pub fn new(super_admin_role: impl Into<String>, evaluator: Arc<dyn PermissionEvaluator<E>>) -> Self {
        AuthorizationPolicy {
            super_admin_role: super_admin_role.into(),
            evaluator,
        }
    }

    pub fn super_admin_role(&self) -> &str {
        &self.super_admin_role
    }

    pub fn is_super_admin(&self, principal: &Principal) -> bool {
        principal.has_role(&self.super_admin_role)
    }

    /// Super-admin role or the evaluator's verdict.
    pub fn is_permitted(&self, principal: &Principal, entity: &E, permission: Permission) -> bool {
        self.is_super_admin(principal) || self.evaluator.has_permission(principal, entity, permission)
    }

    /// Check before an operation, against its input.
    pub fn pre_authorize(&self, principal: &Principal, entity: &E, permission: Permission) -> Result<(), ServiceError> {
        if self.is_permitted(principal, entity, permission) {
            Ok(())
        } else {
            Err(self.denied(principal, entity, permission))
        }
    }

    /// Check after an operation, against its result. Nothing found means nothing to authorize.
    pub fn post_authorize(
        &self,
        principal: &Principal,
        result: Option<E>,
        permission: Permission,
    ) -> Result<Option<E>, ServiceError> {
        match result {
            Some(entity) => {
                self.pre_authorize(principal, &entity, permission)?;
                Ok(Some(entity))
            }
            None => Ok(None),
        }
    }

    /// Keep only the elements the principal may access, in their original order.
    pub fn post_filter(&self, principal: &Principal, entities: Vec<E>, permission: Permission) -> Vec<E> {
        if self.is_super_admin(principal) {
            return entities;
        }
        let total = entities.len();
        let kept: Vec<E> = entities
            .into_iter()
            .filter(|e| self.evaluator.has_permission(principal, e, permission))
            .collect();
        if kept.len() < total {
            tracing::debug!(
                principal = %principal.name,
                entity = E::ENTITY_NAME,
                %permission,
                filtered = total - kept.len(),
                "post-filter removed entities"
            );
        }
        kept
    }

    fn denied(&self, principal: &Principal, entity: &E, permission: Permission) -> ServiceError {
        tracing::warn!(
            principal = %principal.name,
            entity = E::ENTITY_NAME,
            id = ?entity.id(),
            %permission,
            "access denied"
        );
        ServiceError::AccessDenied {
            entity: E::ENTITY_NAME,
            permission,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::PersistentObject;
    use crate::security::{DenyAll, Grantee, PermissionTable};
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct Doc {
        #[serde(flatten)]
        base: PersistentObject,
    }

    crate::impl_persistent_entity!(Doc, "doc");

    fn doc(id: i32) -> Doc {
        Doc {
            base: PersistentObject::with_id(id),
        }
    }

    #[test]
    fn super_admin_bypasses_evaluator() {
        let deny: Arc<dyn PermissionEvaluator<Doc>> = Arc::new(DenyAll);
        let policy = AuthorizationPolicy::new(DEFAULT_SUPER_ADMIN_ROLE, deny);
        let admin = Principal::new("root").with_role(DEFAULT_SUPER_ADMIN_ROLE);
        assert!(policy.pre_authorize(&admin, &doc(1), Permission::Delete).is_ok());

        let user = Principal::new("joe");
        let err = policy.pre_authorize(&user, &doc(1), Permission::Delete).unwrap_err();
        assert!(err.is_access_denied());
    }

    #[test]
    fn post_authorize_on_nothing_is_allowed() {
        let deny: Arc<dyn PermissionEvaluator<Doc>> = Arc::new(DenyAll);
        let policy = AuthorizationPolicy::new(DEFAULT_SUPER_ADMIN_ROLE, deny);
        let out = policy.post_authorize(&Principal::anonymous(), None, Permission::Read).unwrap();
        assert!(out.is_none());
    }

    #[test]
    fn post_filter_keeps_order_of_permitted() {
        let table = Arc::new(PermissionTable::new());
        table.grant_instance(Grantee::User("joe".into()), "doc", 1, &[Permission::Read]);
        table.grant_instance(Grantee::User("joe".into()), "doc", 3, &[Permission::Read]);
        let evaluator: Arc<dyn PermissionEvaluator<Doc>> = table;
        let policy = AuthorizationPolicy::new(DEFAULT_SUPER_ADMIN_ROLE, evaluator);
        let kept = policy.post_filter(&Principal::new("joe"), vec![doc(3), doc(2), doc(1)], Permission::Read);
        let ids: Vec<_> = kept.iter().map(|d| d.id()).collect();
        assert_eq!(ids, vec![Some(3), Some(1)]);
    }
}
