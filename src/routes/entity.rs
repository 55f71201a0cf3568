//! Entity CRUD routes for one entity type, mounted at `/{path_segment}`.

use crate::entity::PersistentEntity;
use crate::handlers::entity::{clone_entity, create, delete, list, read, update, update_partial};
use crate::state::EntityState;
use axum::{routing::get, routing::post, Router};

pub fn entity_routes<E: PersistentEntity>(path_segment: &str, state: EntityState<E>) -> Router {
    let base = format!("/{}", path_segment.trim_matches('/'));
    Router::new()
        .route(&base, get(list::<E>).post(create::<E>))
        .route(
            &format!("{}/:id", base),
            get(read::<E>)
                .put(update::<E>)
                .patch(update_partial::<E>)
                .delete(delete::<E>),
        )
        .route(&format!("{}/:id/clone", base), post(clone_entity::<E>))
        .with_state(state)
}
