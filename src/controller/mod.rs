//! Controllers and what the router needs to know about them.
//!
//! A controller is described once by a [`ControllerDescriptor`] (resource
//! name, mount route, dependency names and a factory) and instantiated once
//! at startup. Everything that belongs to a single request travels in the
//! [`RequestScope`](crate::dispatch::RequestScope) and [`ControllerParams`]
//! handed to each call, never on the controller itself, so one instance
//! serves any number of concurrent requests.

mod params;
mod registry;

pub use params::{ControllerParams, Parameters, RequestContext, Session};
pub use registry::{ControllerRegistry, ControllerTable, RegisteredController};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use strum::IntoEnumIterator;
use strum_macros::{AsRefStr, Display, EnumIter};
use thiserror::Error;

use crate::collection::{Collection, Collections};
use crate::common::GenericResponse;
use crate::database::{DATABASE_PROVIDER, DatabaseServiceProvider};
use crate::di::{Container, ServiceProvider};
use crate::dispatch::RequestScope;
use crate::messaging::{EventId, EventPackage};

/// The five conventional CRUD actions, in canonical order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    AsRefStr,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Index = 0,
    Create = 1,
    Show = 2,
    Update = 3,
    Destroy = 4,
}

impl Action {
    pub fn all() -> impl Iterator<Item = Action> {
        Action::iter()
    }
}

/// Whether, and how, a controller implements an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActionSlot {
    /// No route is bound for the action.
    #[default]
    Missing,
    Handler,
    /// The before-hook runs ahead of the handler.
    HookedHandler,
}

impl ActionSlot {
    pub fn is_defined(&self) -> bool {
        !matches!(self, Self::Missing)
    }

    pub fn has_before_hook(&self) -> bool {
        matches!(self, Self::HookedHandler)
    }
}

/// The actions a controller implements.
///
/// ```
/// use paperframe::controller::{Action, ActionSlot, Capabilities};
///
/// let caps = Capabilities::new().handler(Action::Index).hooked(Action::Create);
/// assert_eq!(caps.slot(Action::Create), ActionSlot::HookedHandler);
/// assert_eq!(caps.slot(Action::Destroy), ActionSlot::Missing);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    slots: [ActionSlot; 5],
}

impl Capabilities {
    pub fn new() -> Self {
        Self::default()
    }

    /// All five actions, without before-hooks.
    pub fn crud() -> Self {
        Action::all().fold(Self::new(), Self::handler)
    }

    pub fn handler(self, action: Action) -> Self {
        self.with(action, ActionSlot::Handler)
    }

    pub fn hooked(self, action: Action) -> Self {
        self.with(action, ActionSlot::HookedHandler)
    }

    pub fn with(mut self, action: Action, slot: ActionSlot) -> Self {
        self.slots[action as usize] = slot;
        self
    }

    pub fn slot(&self, action: Action) -> ActionSlot {
        self.slots[action as usize]
    }

    pub fn defined(&self) -> impl Iterator<Item = Action> + '_ {
        Action::all().filter(|action| self.slot(*action).is_defined())
    }
}

/// Access rule for one action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RouteAcl {
    pub protected: bool,
}

impl RouteAcl {
    pub const PROTECTED: RouteAcl = RouteAcl { protected: true };
    pub const PUBLIC: RouteAcl = RouteAcl { protected: false };
}

/// Per-action access rules declared by one controller.
pub type RouteAclTable = BTreeMap<Action, RouteAcl>;

/// Access rules of every controller that declares any, keyed by resource.
pub type RoutesAcl = BTreeMap<String, RouteAclTable>;

/// Why a before-hook or handler stopped the request.
#[derive(Debug, Error)]
pub enum ActionError {
    /// An expected refusal, answered with the given response.
    #[error("{0}")]
    Rejected(GenericResponse),

    #[error(transparent)]
    Fatal(#[from] anyhow::Error),
}

impl From<GenericResponse> for ActionError {
    fn from(response: GenericResponse) -> Self {
        Self::Rejected(response)
    }
}

pub type ActionResult<T> = std::result::Result<T, ActionError>;

/// A resource controller.
///
/// ```
/// use paperframe::controller::*;
/// use paperframe::dispatch::RequestScope;
/// use paperframe::async_trait;
/// use axum::http::StatusCode;
///
/// struct Widgets;
///
/// #[async_trait]
/// impl Controller for Widgets {
///     fn capabilities(&self) -> Capabilities {
///         Capabilities::new().handler(Action::Show)
///     }
///
///     async fn handle(
///         &self,
///         action: Action,
///         scope: &RequestScope,
///         params: ControllerParams,
///     ) -> ActionResult<()> {
///         let id = params.parameters.get("widgetId").cloned().unwrap_or_default();
///         scope.respond(StatusCode::OK, 0, serde_json::json!({ "id": id }));
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Controller: Send + Sync + 'static {
    fn capabilities(&self) -> Capabilities;

    /// Explicit access rules. Actions without an entry are unprotected when
    /// routes are bound.
    fn route_acl(&self) -> Option<&RouteAclTable> {
        None
    }

    /// Event pattern this controller listens to, e.g. `API.USER.*`.
    fn event_listener(&self) -> Option<&str> {
        None
    }

    async fn on_event(&self, event: &EventId, package: &EventPackage) -> anyhow::Result<()> {
        let _ = (event, package);
        Ok(())
    }

    /// Runs ahead of the handler for actions registered as
    /// [`ActionSlot::HookedHandler`]. The returned params replace the
    /// original ones.
    async fn before(
        &self,
        action: Action,
        scope: &RequestScope,
        params: ControllerParams,
    ) -> ActionResult<ControllerParams> {
        let _ = (action, scope);
        Ok(params)
    }

    async fn handle(&self, action: Action, scope: &RequestScope, params: ControllerParams) -> ActionResult<()>;
}

/// What a controller factory receives.
#[derive(Clone)]
pub struct ControllerConfig {
    /// Only the dependencies the descriptor declared.
    pub dependencies: Container,
    pub collections: Collections,
}

impl ControllerConfig {
    pub fn dependency<T: ServiceProvider>(&self, name: &str) -> crate::Result<Arc<T>> {
        self.dependencies.resolve::<T>(name)
    }

    /// Open a collection against the driver of the `database` dependency.
    pub fn open_collection(&self, name: &str) -> anyhow::Result<Collection> {
        let blueprint = self
            .collections
            .get(name)
            .ok_or_else(|| anyhow::anyhow!("Collection {name} is not loaded"))?;
        let database = self.dependency::<DatabaseServiceProvider>(DATABASE_PROVIDER)?;
        let driver = database
            .driver()
            .ok_or_else(|| anyhow::anyhow!("Database provider has no driver"))?;
        blueprint.open(driver)
    }
}

type ControllerFactory = Arc<dyn Fn(ControllerConfig) -> anyhow::Result<Arc<dyn Controller>> + Send + Sync>;

/// Static description of a controller: what it serves, where, and what it
/// needs.
#[derive(Clone)]
pub struct ControllerDescriptor {
    pub resource: String,
    pub route: String,
    pub dependencies: Vec<String>,
    factory: ControllerFactory,
}

impl ControllerDescriptor {
    pub fn new<C, F>(resource: impl Into<String>, route: impl Into<String>, make: F) -> Self
    where
        C: Controller,
        F: Fn(ControllerConfig) -> anyhow::Result<C> + Send + Sync + 'static,
    {
        Self {
            resource: resource.into(),
            route: route.into(),
            dependencies: Vec::new(),
            factory: Arc::new(move |config| Ok(Arc::new(make(config)?) as Arc<dyn Controller>)),
        }
    }

    pub fn dependencies<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.dependencies = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn instantiate(&self, config: ControllerConfig) -> anyhow::Result<Arc<dyn Controller>> {
        (self.factory)(config)
    }
}

impl fmt::Debug for ControllerDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerDescriptor")
            .field("resource", &self.resource)
            .field("route", &self.route)
            .field("dependencies", &self.dependencies)
            .finish_non_exhaustive()
    }
}
