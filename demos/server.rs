//! Demo server: exposes an `Application` entity at /api/v1/applications.
//! Uses PostgreSQL when DATABASE_URL is set, otherwise an in-memory store.
//!
//! Callers identify themselves with `X-User-Name` and `X-User-Roles` headers:
//! ROLE_USER may read, ROLE_EDITOR may also create, update and delete, and the
//! super-admin role (SUPER_ADMIN_ROLE, default ROLE_SUPERADMIN) may do anything.

use crud_rest_sdk::security::{Grantee, PermissionTable};
use crud_rest_sdk::{
    common_routes, common_routes_with_ready, ensure_database_exists, ensure_schema, impl_persistent_entity,
    with_middleware, ApiBuilder, AppConfig, MemoryDao, Permission, PermissionEvaluator, PersistentObject, PgDao,
};
use axum::Router;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Application {
    #[serde(flatten)]
    base: PersistentObject,
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    open: bool,
    #[serde(default = "default_active")]
    active: bool,
}

fn default_active() -> bool {
    true
}

impl_persistent_entity!(Application, "application");

fn demo_permissions() -> Arc<PermissionTable> {
    let table = PermissionTable::new();
    table.grant_type(Grantee::Role("ROLE_USER".into()), "application", &[Permission::Read]);
    table.grant_type(
        Grantee::Role("ROLE_EDITOR".into()),
        "application",
        &[Permission::Create, Permission::Read, Permission::Update, Permission::Delete],
    );
    Arc::new(table)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("crud_rest_sdk=info,tower_http=info")),
        )
        .init();

    let config = AppConfig::from_env()?;
    let evaluator: Arc<dyn PermissionEvaluator<Application>> = demo_permissions();
    let builder = ApiBuilder::from_config(&config);

    let (api, common) = match &config.database_url {
        Some(url) => {
            ensure_database_exists(url).await?;
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(5)
                .connect(url)
                .await?;
            ensure_schema(&pool, &config.schema).await?;
            let dao = PgDao::<Application>::new(pool.clone(), &config.schema)?;
            dao.ensure_table().await?;
            (
                builder.entity("applications", Arc::new(dao), evaluator),
                common_routes_with_ready(pool),
            )
        }
        None => {
            tracing::warn!("DATABASE_URL not set; entities are kept in memory");
            (
                builder.entity("applications", Arc::new(MemoryDao::<Application>::new()), evaluator),
                common_routes(),
            )
        }
    };

    let app = Router::new().merge(common).nest("/api/v1", api.build());
    let app = with_middleware(app, config.body_limit);

    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
