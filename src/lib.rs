//! # Paperframe
//!
//! A convention-based HTTP API router for Rust, built on axum.
//!
//! An application is described by configuration and by extensions registered
//! under conventional names: collections (data models), modules (groups of
//! controllers), service providers and database drivers. At startup the
//! [`Router`] loads them, instantiates every controller with its declared
//! dependencies and binds each implemented CRUD action to its conventional
//! verb and path.
//!
//! ## Features
//!
//! - **Convention-based routing**: `index`, `create`, `show`, `update` and
//!   `destroy` map to `GET /`, `POST /`, `GET /:<resource>Id`,
//!   `PUT /:<resource>Id` and `DELETE /:<resource>Id`
//! - **Extension loading**: local definitions override external packages
//! - **Service providers**: memoized, initialized once, injected by name
//! - **Request lifecycle**: required client headers, optional before hooks,
//!   one domain event per request
//! - **Authorization gate**: per-action ACLs checked by a pluggable token
//!   verifier
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use paperframe::prelude::*;
//!
//! struct Widgets;
//!
//! #[async_trait]
//! impl Controller for Widgets {
//!     fn capabilities(&self) -> Capabilities {
//!         Capabilities::new().handler(Action::Show)
//!     }
//!
//!     async fn handle(&self, _: Action, scope: &RequestScope, params: ControllerParams) -> ActionResult<()> {
//!         let id = params.parameters.get("widgetId").cloned().unwrap_or_default();
//!         scope.respond(StatusCode::OK, 0, serde_json::json!({ "id": id }));
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let shop = ModuleDefinition::new("shop")
//!         .controller(ControllerDescriptor::new("widget", "/widgets", |_| Ok(Widgets)));
//!
//!     // SERVER_COLLECTIONS="" SERVER_MODULES=shop
//!     let mut router = Router::builder().module(shop).build()?;
//!     router.initialize().await?;
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//!     axum::serve(listener, router.app()?).await?;
//!     Ok(())
//! }
//! ```

pub mod collection;
pub mod common;
pub mod config;
pub mod controller;
pub mod database;
pub mod di;
pub mod dispatch;
pub mod error;
pub mod extension;
pub mod guard;
pub mod messaging;
pub mod module;
pub mod router;
pub mod routing;

// Re-export core types
pub use config::ConfigService;
pub use error::{PaperframeError, Result};
pub use router::{Registries, Router, RouterBuilder};

// Re-export commonly used types from dependencies
pub use async_trait::async_trait;
pub use axum;

/// Prelude module for convenient imports
///
/// ```
/// use paperframe::prelude::*;
/// ```
pub mod prelude {
    pub use crate::collection::{Collection, CollectionBlueprint, Collections};
    pub use crate::common::{Envelope, GenericResponse, Reply};
    pub use crate::config::ConfigService;
    pub use crate::controller::{
        Action, ActionError, ActionResult, Capabilities, Controller, ControllerConfig, ControllerDescriptor,
        ControllerParams, RouteAcl, RouteAclTable,
    };
    pub use crate::database::{Driver, DriverClient, DriverFactory};
    pub use crate::di::{ProviderContext, ServiceProvider, ServiceProviderFactory};
    pub use crate::dispatch::RequestScope;
    pub use crate::error::{PaperframeError, Result};
    pub use crate::guard::{TokenVerifier, VerifierError};
    pub use crate::messaging::{Event, EventBus, EventId, EventListener, EventPackage};
    pub use crate::module::ModuleDefinition;
    pub use crate::router::Router;
    pub use async_trait::async_trait;
    pub use axum::http::StatusCode;
    pub use std::sync::Arc;
}
