//! CRUD REST SDK: generic entity services with pre/post authorization, exposed over axum.

pub mod app;
pub mod config;
pub mod dao;
pub mod entity;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod response;
pub mod routes;
pub mod security;
pub mod service;
pub mod state;
pub mod store;

pub use app::{with_middleware, ApiBuilder};
pub use config::AppConfig;
pub use dao::{Dao, MemoryDao, PgDao};
pub use entity::{EntityId, PersistentEntity, PersistentObject};
pub use error::{AppError, ConfigError, ServiceError, StoreError};
pub use extractors::CurrentPrincipal;
pub use response::{error_body, JSON_UTF8};
pub use routes::{common_routes, common_routes_with_ready, entity_routes};
pub use security::{AuthorizationPolicy, Permission, PermissionEvaluator, Principal};
pub use service::{CrudService, EntityService};
pub use state::{EntityState, RouteOptions};
pub use store::{ensure_database_exists, ensure_schema};
