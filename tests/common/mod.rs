#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, Response};
use axum::Router;
use crud_rest_sdk::security::Permission;
use crud_rest_sdk::{
    impl_persistent_entity, EntityId, EntityService, PersistentObject, Principal, ServiceError, StoreError,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Mutex;
use tower::ServiceExt;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestModel {
    #[serde(flatten)]
    pub base: PersistentObject,
    #[serde(default)]
    pub test_value: Option<String>,
}

impl_persistent_entity!(TestModel, "test_model");

pub fn with_value(value: &str) -> TestModel {
    TestModel {
        base: PersistentObject::default(),
        test_value: Some(value.to_string()),
    }
}

pub fn with_id_and_value(id: EntityId, value: &str) -> TestModel {
    TestModel {
        base: PersistentObject::with_id(id),
        test_value: Some(value.to_string()),
    }
}

pub fn boom() -> ServiceError {
    ServiceError::Store(StoreError::Unavailable("boom".into()))
}

pub fn denied(permission: Permission) -> ServiceError {
    ServiceError::AccessDenied {
        entity: "test_model",
        permission,
    }
}

/// Scripted service that records every call, standing in for a real `CrudService`.
#[derive(Default)]
pub struct MockService {
    pub calls: Mutex<Vec<&'static str>>,
    pub all: Vec<TestModel>,
    pub found: Option<TestModel>,
    pub find_error: Option<fn() -> ServiceError>,
    pub saved: Option<TestModel>,
    pub save_error: Option<fn() -> ServiceError>,
    pub delete_error: Option<fn() -> ServiceError>,
}

impl MockService {
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn times(&self, call: &str) -> usize {
        self.calls().iter().filter(|c| **c == call).count()
    }

    fn record(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
    }

    fn find(&self) -> Result<Option<TestModel>, ServiceError> {
        match self.find_error {
            Some(err) => Err(err()),
            None => Ok(self.found.clone()),
        }
    }
}

#[async_trait]
impl EntityService<TestModel> for MockService {
    async fn save_or_update(&self, _principal: &Principal, entity: TestModel) -> Result<TestModel, ServiceError> {
        self.record("save_or_update");
        match self.save_error {
            Some(err) => Err(err()),
            None => Ok(self.saved.clone().unwrap_or(entity)),
        }
    }

    async fn update_partial(
        &self,
        _principal: &Principal,
        entity: TestModel,
        patch: &Value,
    ) -> Result<TestModel, ServiceError> {
        self.record("update_partial");
        if let Some(err) = self.save_error {
            return Err(err());
        }
        crud_rest_sdk::service::merge_patch(&entity, patch)
    }

    async fn find_by_id(&self, _principal: &Principal, _id: EntityId) -> Result<Option<TestModel>, ServiceError> {
        self.record("find_by_id");
        self.find()
    }

    async fn load_by_id(&self, _principal: &Principal, _id: EntityId) -> Result<Option<TestModel>, ServiceError> {
        self.record("load_by_id");
        self.find()
    }

    async fn find_all(&self, _principal: &Principal) -> Result<Vec<TestModel>, ServiceError> {
        self.record("find_all");
        Ok(self.all.clone())
    }

    async fn delete(&self, _principal: &Principal, _entity: TestModel) -> Result<(), ServiceError> {
        self.record("delete");
        match self.delete_error {
            Some(err) => Err(err()),
            None => Ok(()),
        }
    }

    async fn clone_entity(
        &self,
        _principal: &Principal,
        entity: TestModel,
        persist: bool,
    ) -> Result<TestModel, ServiceError> {
        self.record("clone_entity");
        let copy = crud_rest_sdk::PersistentEntity::detached(entity);
        Ok(if persist {
            crud_rest_sdk::PersistentEntity::with_id(copy, Some(1000))
        } else {
            copy
        })
    }
}

pub struct TestResponse {
    pub status: axum::http::StatusCode,
    pub content_type: Option<String>,
    pub body: Value,
}

pub async fn send(app: &Router, request: Request<Body>) -> TestResponse {
    let response: Response<Body> = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .map(|v| v.to_str().unwrap().to_string());
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    TestResponse {
        status,
        content_type,
        body,
    }
}

pub fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

pub fn delete(uri: &str) -> Request<Body> {
    Request::delete(uri).body(Body::empty()).unwrap()
}

pub fn json(method: &str, uri: &str, body: &impl Serialize) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}

pub fn as_user(mut request: Request<Body>, principal: Principal) -> Request<Body> {
    request.extensions_mut().insert(principal);
    request
}
