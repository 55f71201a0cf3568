//! PostgreSQL store: one JSONB table per entity type. The identity block lives in real columns
//! (`id`, `created`, `modified`); every other field is kept in `payload`.

use super::Dao;
use crate::entity::{EntityId, PersistentEntity};
use crate::error::{ConfigError, StoreError};
use crate::store::{qualified_table, validate_identifier};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;
use std::marker::PhantomData;

const IDENTITY_FIELDS: [&str; 3] = ["id", "created", "modified"];

type Row = (EntityId, Value, DateTime<Utc>, DateTime<Utc>);

pub struct PgDao<E> {
    pool: PgPool,
    table: String,
    _entity: PhantomData<fn() -> E>,
}

impl<E: PersistentEntity> PgDao<E> {
    /// Dao for `E` stored in `schema`.`E::ENTITY_NAME`. Identifiers are validated; the table is not created.
    pub fn new(pool: PgPool, schema: &str) -> Result<Self, ConfigError> {
        Self::with_table(pool, schema, E::ENTITY_NAME)
    }

    pub fn with_table(pool: PgPool, schema: &str, table: &str) -> Result<Self, ConfigError> {
        validate_identifier(schema)?;
        validate_identifier(table)?;
        Ok(PgDao {
            pool,
            table: qualified_table(schema, table),
            _entity: PhantomData,
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// CREATE TABLE IF NOT EXISTS. The schema must already exist (see [`crate::store::ensure_schema`]).
    pub async fn ensure_table(&self) -> Result<(), StoreError> {
        let ddl = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                id SERIAL PRIMARY KEY,
                payload JSONB NOT NULL,
                created TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                modified TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
            self.table
        );
        sqlx::query(&ddl)
            .execute(&self.pool)
            .await
            .map_err(StoreError::from_sqlx)?;
        Ok(())
    }

    fn payload_of(entity: &E) -> Result<Value, StoreError> {
        let mut value = serde_json::to_value(entity)?;
        if let Value::Object(map) = &mut value {
            for field in IDENTITY_FIELDS {
                map.remove(field);
            }
        }
        Ok(value)
    }

    fn entity_from_row((id, payload, created, modified): Row) -> Result<E, StoreError> {
        let mut map = match payload {
            Value::Object(m) => m,
            other => {
                return Err(StoreError::Serialization(serde::de::Error::custom(format!(
                    "{} row {}: payload is {}, expected an object",
                    E::ENTITY_NAME,
                    id,
                    json_kind(&other)
                ))))
            }
        };
        map.insert("id".into(), Value::from(id));
        map.insert("created".into(), serde_json::to_value(created)?);
        map.insert("modified".into(), serde_json::to_value(modified)?);
        Ok(serde_json::from_value(Value::Object(map))?)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[async_trait]
impl<E: PersistentEntity> Dao<E> for PgDao<E> {
    async fn save_or_update(&self, mut entity: E) -> Result<E, StoreError> {
        let payload = Self::payload_of(&entity)?;
        match entity.id() {
            None => {
                let sql = format!(
                    "INSERT INTO {} (payload) VALUES ($1) RETURNING id, created, modified",
                    self.table
                );
                tracing::debug!(sql = %sql, "query");
                let (id, created, modified): (EntityId, DateTime<Utc>, DateTime<Utc>) = sqlx::query_as(&sql)
                    .bind(&payload)
                    .fetch_one(&self.pool)
                    .await
                    .map_err(StoreError::from_sqlx)?;
                let base = entity.base_mut();
                base.id = Some(id);
                base.created = Some(created);
                base.modified = Some(modified);
            }
            Some(id) => {
                let sql = format!(
                    "UPDATE {} SET payload = $2, modified = NOW() WHERE id = $1 RETURNING created, modified",
                    self.table
                );
                tracing::debug!(sql = %sql, id, "query");
                let row: Option<(DateTime<Utc>, DateTime<Utc>)> = sqlx::query_as(&sql)
                    .bind(id)
                    .bind(&payload)
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(StoreError::from_sqlx)?;
                let (created, modified) = row.ok_or(StoreError::NotFound {
                    entity: E::ENTITY_NAME,
                    id,
                })?;
                let base = entity.base_mut();
                base.created = Some(created);
                base.modified = Some(modified);
            }
        }
        Ok(entity)
    }

    async fn delete(&self, entity: &E) -> Result<(), StoreError> {
        let id = entity.id().ok_or(StoreError::Transient(E::ENTITY_NAME))?;
        let sql = format!("DELETE FROM {} WHERE id = $1", self.table);
        tracing::debug!(sql = %sql, id, "query");
        let done = sqlx::query(&sql)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(StoreError::from_sqlx)?;
        if done.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                entity: E::ENTITY_NAME,
                id,
            });
        }
        Ok(())
    }

    async fn find_by_id(&self, id: EntityId) -> Result<Option<E>, StoreError> {
        let sql = format!(
            "SELECT id, payload, created, modified FROM {} WHERE id = $1",
            self.table
        );
        tracing::debug!(sql = %sql, id, "query");
        let row: Option<Row> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(StoreError::from_sqlx)?;
        row.map(Self::entity_from_row).transpose()
    }

    async fn find_all(&self) -> Result<Vec<E>, StoreError> {
        let sql = format!(
            "SELECT id, payload, created, modified FROM {} ORDER BY id",
            self.table
        );
        tracing::debug!(sql = %sql, "query");
        let rows: Vec<Row> = sqlx::query_as(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(StoreError::from_sqlx)?;
        rows.into_iter().map(Self::entity_from_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::PersistentObject;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Debug, Serialize, Deserialize)]
    struct Tag {
        #[serde(flatten)]
        base: PersistentObject,
        name: String,
    }

    crate::impl_persistent_entity!(Tag, "tag");

    type TagDao = PgDao<Tag>;

    #[test]
    fn row_rebuilds_identity_from_columns() {
        let now = Utc::now();
        let payload = serde_json::json!({ "name": "a", "id": 999 });
        let entity = TagDao::entity_from_row((7, payload, now, now)).unwrap();
        assert_eq!(entity.id(), Some(7));
        assert_eq!(entity.base.created, Some(now));
        assert_eq!(entity.name, "a");
    }

    #[test]
    fn non_object_payload_is_reported() {
        let now = Utc::now();
        let err = TagDao::entity_from_row((7, serde_json::json!([1, 2]), now, now)).unwrap_err();
        assert!(matches!(err, StoreError::Serialization(_)));
        assert!(err.to_string().contains("an array"));
    }

    #[test]
    fn payload_drops_identity_fields() {
        let entity = Tag {
            base: PersistentObject::with_id(3),
            name: "b".into(),
        };
        let payload = TagDao::payload_of(&entity).unwrap();
        assert_eq!(payload, serde_json::json!({ "name": "b" }));
    }
}
