//! Per-entity route state: the service the handlers call and how failures are reported.

use crate::entity::PersistentEntity;
use crate::service::EntityService;
use std::sync::Arc;

#[derive(Clone, Copy, Debug)]
pub struct RouteOptions {
    /// Report an authorization denial on an id route as 404, so callers cannot probe for existence.
    pub conceal_denied: bool,
}

impl Default for RouteOptions {
    fn default() -> Self {
        RouteOptions { conceal_denied: true }
    }
}

pub struct EntityState<E> {
    pub service: Arc<dyn EntityService<E>>,
    pub options: RouteOptions,
}

impl<E> Clone for EntityState<E> {
    fn clone(&self) -> Self {
        EntityState {
            service: Arc::clone(&self.service),
            options: self.options,
        }
    }
}

impl<E: PersistentEntity> EntityState<E> {
    pub fn new(service: Arc<dyn EntityService<E>>) -> Self {
        EntityState {
            service,
            options: RouteOptions::default(),
        }
    }

    pub fn with_options(mut self, options: RouteOptions) -> Self {
        self.options = options;
        self
    }
}
