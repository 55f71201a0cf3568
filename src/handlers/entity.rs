//! Entity CRUD handlers: list, read, create, update, partial update, delete, clone.
//!
//! Failures follow the route table: service failures on create are 400, on id routes 404.
//! Authorization denials are 403, except on id routes with `conceal_denied`, where they look
//! exactly like a missing record.

use crate::entity::{EntityId, PersistentEntity};
use crate::error::{AppError, ServiceError};
use crate::extractors::CurrentPrincipal;
use crate::response::{no_content, success_created, success_ok};
use crate::state::{EntityState, RouteOptions};
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    response::Response,
    Json,
};
use serde::Deserialize;
use serde_json::Value;

fn parse_id(id_str: &str) -> Result<EntityId, AppError> {
    id_str
        .trim()
        .parse()
        .map_err(|_| AppError::BadRequest(format!("invalid id: {}", id_str)))
}

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    let Json(value) = body?;
    Ok(value)
}

fn not_found<E: PersistentEntity>(id: EntityId) -> AppError {
    AppError::NotFound(format!("{} {}", E::ENTITY_NAME, id))
}

/// Failure on a route addressing an existing id.
fn id_route_error<E: PersistentEntity>(
    options: RouteOptions,
    op: &'static str,
    id: EntityId,
    err: ServiceError,
) -> AppError {
    tracing::warn!(entity = E::ENTITY_NAME, op, id, error = %err, "request failed");
    match err {
        ServiceError::AccessDenied { .. } if !options.conceal_denied => AppError::Service(err),
        ServiceError::Deserialize(e) => AppError::BadRequest(e.to_string()),
        _ => not_found::<E>(id),
    }
}

/// GET /{type}
pub async fn list<E: PersistentEntity>(
    State(state): State<EntityState<E>>,
    CurrentPrincipal(principal): CurrentPrincipal,
) -> Result<Response, AppError> {
    let all = state.service.find_all(&principal).await?;
    Ok(success_ok(&all))
}

/// GET /{type}/{id}
pub async fn read<E: PersistentEntity>(
    State(state): State<EntityState<E>>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path(id_str): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_id(&id_str)?;
    let found = state
        .service
        .find_by_id(&principal, id)
        .await
        .map_err(|e| id_route_error::<E>(state.options, "read", id, e))?
        .ok_or_else(|| not_found::<E>(id))?;
    Ok(success_ok(&found))
}

/// POST /{type}: payload must be transient.
pub async fn create<E: PersistentEntity>(
    State(state): State<EntityState<E>>,
    CurrentPrincipal(principal): CurrentPrincipal,
    body: Result<Json<E>, JsonRejection>,
) -> Result<Response, AppError> {
    let entity = json_body(body)?;
    if let Some(id) = entity.id() {
        return Err(AppError::BadRequest(format!(
            "{} payload must not carry an id (got {})",
            E::ENTITY_NAME,
            id
        )));
    }
    let saved = state
        .service
        .save_or_update(&principal, entity)
        .await
        .map_err(|err| {
            tracing::warn!(entity = E::ENTITY_NAME, op = "create", error = %err, "request failed");
            if err.is_access_denied() {
                AppError::Service(err)
            } else {
                AppError::BadRequest(err.to_string())
            }
        })?;
    Ok(success_created(&saved))
}

/// PUT /{type}/{id}: payload id must equal the path id.
pub async fn update<E: PersistentEntity>(
    State(state): State<EntityState<E>>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path(id_str): Path<String>,
    body: Result<Json<E>, JsonRejection>,
) -> Result<Response, AppError> {
    let id = parse_id(&id_str)?;
    let entity = json_body(body)?;
    if entity.id() != Some(id) {
        return Err(AppError::BadRequest(format!(
            "payload id {:?} does not match path id {}",
            entity.id(),
            id
        )));
    }
    let updated = state
        .service
        .save_or_update(&principal, entity)
        .await
        .map_err(|e| id_route_error::<E>(state.options, "update", id, e))?;
    Ok(success_ok(&updated))
}

/// PATCH /{type}/{id}: merge the fields present in the body onto the stored entity.
pub async fn update_partial<E: PersistentEntity>(
    State(state): State<EntityState<E>>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path(id_str): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, AppError> {
    let id = parse_id(&id_str)?;
    let patch = json_body(body)?;
    let fields = patch
        .as_object()
        .ok_or_else(|| AppError::BadRequest("body must be a JSON object".into()))?;
    match fields.get("id") {
        None | Some(Value::Null) => {}
        Some(v) if v.as_i64() == Some(i64::from(id)) => {}
        Some(v) => {
            return Err(AppError::BadRequest(format!(
                "payload id {} does not match path id {}",
                v, id
            )))
        }
    }
    let current = state
        .service
        .find_by_id(&principal, id)
        .await
        .map_err(|e| id_route_error::<E>(state.options, "update_partial", id, e))?
        .ok_or_else(|| not_found::<E>(id))?;
    let merged = state
        .service
        .update_partial(&principal, current, &patch)
        .await
        .map_err(|e| id_route_error::<E>(state.options, "update_partial", id, e))?;
    Ok(success_ok(&merged))
}

/// DELETE /{type}/{id}
pub async fn delete<E: PersistentEntity>(
    State(state): State<EntityState<E>>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path(id_str): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_id(&id_str)?;
    let entity = state
        .service
        .load_by_id(&principal, id)
        .await
        .map_err(|e| id_route_error::<E>(state.options, "delete", id, e))?
        .ok_or_else(|| not_found::<E>(id))?;
    state
        .service
        .delete(&principal, entity)
        .await
        .map_err(|e| id_route_error::<E>(state.options, "delete", id, e))?;
    Ok(no_content())
}

#[derive(Debug, Deserialize)]
pub struct CloneParams {
    #[serde(default = "default_persist")]
    pub persist: bool,
}

fn default_persist() -> bool {
    true
}

/// POST /{type}/{id}/clone?persist=bool: 201 with the new record, or 200 with a transient copy.
pub async fn clone_entity<E: PersistentEntity>(
    State(state): State<EntityState<E>>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path(id_str): Path<String>,
    query: Result<Query<CloneParams>, QueryRejection>,
) -> Result<Response, AppError> {
    let id = parse_id(&id_str)?;
    let Query(params) = query?;
    let source = state
        .service
        .find_by_id(&principal, id)
        .await
        .map_err(|e| id_route_error::<E>(state.options, "clone", id, e))?
        .ok_or_else(|| not_found::<E>(id))?;
    let copy = state
        .service
        .clone_entity(&principal, source, params.persist)
        .await
        .map_err(|e| id_route_error::<E>(state.options, "clone", id, e))?;
    if params.persist {
        Ok(success_created(&copy))
    } else {
        Ok(success_ok(&copy))
    }
}
