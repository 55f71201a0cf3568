//! Assemble the HTTP application: entity routes under an API prefix, common routes, middleware.

use crate::config::AppConfig;
use crate::dao::Dao;
use crate::entity::PersistentEntity;
use crate::routes::entity_routes;
use crate::security::{AuthorizationPolicy, PermissionEvaluator};
use crate::service::{CrudService, EntityService};
use crate::state::{EntityState, RouteOptions};
use axum::Router;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

/// Collects entity routes that share a super-admin role and route options.
pub struct ApiBuilder {
    super_admin_role: String,
    options: RouteOptions,
    router: Router,
}

impl ApiBuilder {
    pub fn new(super_admin_role: impl Into<String>, options: RouteOptions) -> Self {
        ApiBuilder {
            super_admin_role: super_admin_role.into(),
            options,
            router: Router::new(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.super_admin_role.clone(), config.route_options())
    }

    /// Expose `E` at `/{path_segment}` through a [`CrudService`] over `dao`.
    pub fn entity<E, D>(self, path_segment: &str, dao: Arc<D>, evaluator: Arc<dyn PermissionEvaluator<E>>) -> Self
    where
        E: PersistentEntity,
        D: Dao<E> + 'static,
    {
        let policy = AuthorizationPolicy::new(self.super_admin_role.clone(), evaluator);
        let service: Arc<dyn EntityService<E>> = Arc::new(CrudService::new(dao, policy));
        self.service(path_segment, service)
    }

    /// Expose `E` through any [`EntityService`] implementation.
    pub fn service<E: PersistentEntity>(mut self, path_segment: &str, service: Arc<dyn EntityService<E>>) -> Self {
        tracing::info!(entity = E::ENTITY_NAME, path = path_segment, "registering entity routes");
        let state = EntityState::new(service).with_options(self.options);
        self.router = self.router.merge(entity_routes(path_segment, state));
        self
    }

    pub fn build(self) -> Router {
        self.router
    }
}

/// Request tracing and body size limit around the whole application.
pub fn with_middleware(router: Router, body_limit: usize) -> Router {
    router.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(RequestBodyLimitLayer::new(body_limit)),
    )
}
