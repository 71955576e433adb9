#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, Response, request::Parts};
use paperframe::prelude::*;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::sync::Mutex;

pub const CLIENT_HEADERS: [(&str, &str); 3] = [
    ("x-paperframe-client", "tests"),
    ("x-paperframe-client-version", "1.0.0"),
    ("x-paperframe-client-api-version", "1"),
];

/// Rows keyed by id, shared by every collection opened on it.
#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<BTreeMap<String, Value>>,
}

impl MemoryStore {
    pub fn insert(&self, id: &str, row: Value) {
        self.rows.lock().unwrap().insert(id.to_string(), row);
    }

    pub fn get(&self, id: &str) -> Option<Value> {
        self.rows.lock().unwrap().get(id).cloned()
    }

    pub fn all(&self) -> Vec<Value> {
        self.rows.lock().unwrap().values().cloned().collect()
    }
}

#[derive(Default)]
pub struct MemoryDriver {
    store: Arc<MemoryStore>,
}

#[async_trait]
impl Driver for MemoryDriver {
    async fn initialize(&mut self) -> anyhow::Result<()> {
        self.store.insert("42", json!({ "id": "42", "name": "sprocket" }));
        Ok(())
    }

    fn client(&self) -> DriverClient {
        self.store.clone()
    }
}

pub struct Widgets {
    store: Arc<MemoryStore>,
}

impl Widgets {
    pub fn blueprint() -> CollectionBlueprint {
        CollectionBlueprint::auto("widget").driver("memory", |client: DriverClient| Widgets {
            store: client.downcast::<MemoryStore>().unwrap_or_default(),
        })
    }
}

pub struct WidgetController {
    widgets: Arc<Widgets>,
    acl: RouteAclTable,
}

impl WidgetController {
    pub fn descriptor() -> ControllerDescriptor {
        ControllerDescriptor::new("widget", "/widgets", |config: ControllerConfig| {
            let widgets = config
                .open_collection("widget")?
                .driver::<Widgets>()
                .ok_or_else(|| anyhow::anyhow!("widget collection has no memory implementation"))?;

            let mut acl = RouteAclTable::new();
            acl.insert(Action::Show, RouteAcl::PUBLIC);
            acl.insert(Action::Create, RouteAcl::PROTECTED);
            acl.insert(Action::Destroy, RouteAcl::PROTECTED);
            Ok(WidgetController { widgets, acl })
        })
        .dependencies(["database"])
    }
}

#[async_trait]
impl Controller for WidgetController {
    fn capabilities(&self) -> Capabilities {
        Capabilities::new()
            .handler(Action::Index)
            .hooked(Action::Create)
            .handler(Action::Show)
            .handler(Action::Destroy)
    }

    fn route_acl(&self) -> Option<&RouteAclTable> {
        Some(&self.acl)
    }

    async fn before(&self, _: Action, _: &RequestScope, mut params: ControllerParams) -> ActionResult<ControllerParams> {
        let name = params
            .body
            .get("name")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| {
                paperframe::common::response::GR_REQUEST_VALIDATION_FAILED.with_message("name is required")
            })?;
        params.before = Some(json!({ "name": name }));
        Ok(params)
    }

    async fn handle(&self, action: Action, scope: &RequestScope, params: ControllerParams) -> ActionResult<()> {
        match action {
            Action::Index => {
                let session = params.session.unwrap_or(Value::Null);
                scope.respond(
                    StatusCode::OK,
                    0,
                    json!({ "widgets": self.widgets.store.all(), "session": session }),
                );
            }
            Action::Create => {
                let name = params.before.unwrap_or_default()["name"].clone();
                let row = json!({ "id": "43", "name": name });
                self.widgets.store.insert("43", row.clone());
                scope.respond(StatusCode::CREATED, 0, row);
            }
            Action::Show => {
                let id = params.parameters.get("widgetId").cloned().unwrap_or_default();
                let row = self
                    .widgets
                    .store
                    .get(&id)
                    .ok_or(paperframe::common::response::GR_RESOURCE_NOT_FOUND)?;
                scope.push_event_data("widgetId", json!(id));
                scope.respond(StatusCode::OK, 0, row);
            }
            _ => return Err(ActionError::Fatal(anyhow::anyhow!("storage offline"))),
        }
        Ok(())
    }
}

pub fn shop() -> ModuleDefinition {
    ModuleDefinition::new("shop").controller(WidgetController::descriptor())
}

pub fn config() -> ConfigService {
    ConfigService::empty()
        .with("SERVER_COLLECTIONS", "widget")
        .with("SERVER_MODULES", "shop")
        .with("DATABASE_DRIVER", "memory")
}

/// Accepts `Bearer <secret>` and turns it into `{ "sub": "tester" }`.
pub struct BearerVerifier;

#[async_trait]
impl TokenVerifier for BearerVerifier {
    async fn verify(&self, secret: &str, parts: &Parts) -> std::result::Result<Option<Value>, VerifierError> {
        let header = parts.headers.get("authorization").and_then(|value| value.to_str().ok());
        match header {
            Some(value) if value == format!("Bearer {secret}") => Ok(Some(json!({ "sub": "tester" }))),
            Some(_) => Err(VerifierError::unauthorized("jwt malformed")),
            None => Err(VerifierError::unauthorized("no authorization header")),
        }
    }
}

pub async fn router(verifier: bool) -> Router {
    let mut builder = Router::builder()
        .config(config())
        .dirname("/srv/shop")
        .database_driver("memory", DriverFactory::of::<MemoryDriver>())
        .collection("widget", Widgets::blueprint())
        .module(shop());
    if verifier {
        builder = builder
            .token_verifier(Arc::new(BearerVerifier))
            .token_secret("s3cret");
    }

    let mut router = builder.build().unwrap();
    router.initialize().await.unwrap();
    router
}

/// A request without the client headers.
pub fn request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    build(Request::builder().method(method).uri(uri), body)
}

/// A request carrying the required client headers.
pub fn client_request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    for (name, value) in CLIENT_HEADERS {
        builder = builder.header(name, value);
    }
    build(builder, body)
}

fn build(builder: axum::http::request::Builder, body: Option<Value>) -> Request<Body> {
    match body {
        Some(value) => builder
            .header("content-type", "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn read_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn read_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
