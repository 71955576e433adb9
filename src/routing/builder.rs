use axum::http::Method;
use std::fmt;
use std::sync::Arc;

use super::{PathTemplate, routing_table};
use crate::controller::{Action, ActionSlot, Controller, ControllerTable, Parameters, RouteAcl};
use crate::error::{PaperframeError, Result};

/// Copies (or converts) one raw path parameter into the request's
/// parameters.
pub type ParamHook = Arc<dyn Fn(&str, &mut Parameters) + Send + Sync>;

/// A route bound to a controller action.
#[derive(Clone)]
pub struct BoundRoute {
    pub resource: String,
    pub action: Action,
    pub verb: Method,
    /// Mount route plus action suffix, e.g. `/widgets/:widgetId`.
    pub uri: String,
    pub template: PathTemplate,
    pub acl: RouteAcl,
    pub slot: ActionSlot,
    pub controller: Arc<dyn Controller>,
}

impl BoundRoute {
    /// Whether this route answers `method`. `HEAD` is served by `GET` routes.
    pub fn accepts(&self, method: &Method) -> bool {
        self.verb == *method || (*method == Method::HEAD && self.verb == Method::GET)
    }
}

impl fmt::Debug for BoundRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundRoute")
            .field("resource", &self.resource)
            .field("action", &self.action)
            .field("verb", &self.verb)
            .field("uri", &self.uri)
            .field("acl", &self.acl)
            .field("slot", &self.slot)
            .finish_non_exhaustive()
    }
}

/// Bound routes in binding order, plus the parameter hooks shared by all of
/// them.
#[derive(Clone, Default)]
pub struct RouteTable {
    routes: Vec<BoundRoute>,
    param_hooks: Vec<(String, ParamHook)>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the hook for parameter `name`. Only the first registration for
    /// a name counts; later ones return `false`.
    pub fn param(&mut self, name: impl Into<String>, hook: ParamHook) -> bool {
        let name = name.into();
        if self.param_hooks.iter().any(|(existing, _)| *existing == name) {
            return false;
        }
        tracing::debug!(param = %name, "registered parameter hook");
        self.param_hooks.push((name, hook));
        true
    }

    pub fn has_param(&self, name: &str) -> bool {
        self.param_hooks.iter().any(|(existing, _)| existing == name)
    }

    pub fn bind(&mut self, route: BoundRoute) {
        self.routes.push(route);
    }

    pub fn routes(&self) -> &[BoundRoute] {
        &self.routes
    }

    pub fn get(&self, index: usize) -> Option<&BoundRoute> {
        self.routes.get(index)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Every route whose path matches, whatever its verb.
    pub fn match_path<'a, 'p>(&'a self, path: &'p str) -> impl Iterator<Item = (usize, &'a BoundRoute)> + 'p
    where
        'a: 'p,
    {
        self.routes
            .iter()
            .enumerate()
            .filter(move |(_, route)| route.template.captures(path).is_some())
    }

    /// The first route matching both `method` and `path`.
    pub fn resolve(&self, method: &Method, path: &str) -> Option<(usize, &BoundRoute)> {
        self.match_path(path).find(|(_, route)| route.accepts(method))
    }

    /// Run the parameter hooks over the raw values captured for `route`.
    /// Parameters without a hook are left out.
    pub fn coerce(&self, route: &BoundRoute, raw: &Parameters) -> Parameters {
        let mut parameters = Parameters::new();
        for name in route.template.params() {
            let Some(value) = raw.get(&name) else {
                continue;
            };
            if let Some((_, hook)) = self.param_hooks.iter().find(|(hooked, _)| *hooked == name) {
                hook(value, &mut parameters);
            }
        }
        parameters
    }
}

/// Access rule for `action` on a controller: its own entry, or unprotected.
pub fn route_acl(action: Action, controller: &dyn Controller) -> RouteAcl {
    controller
        .route_acl()
        .and_then(|table| table.get(&action))
        .copied()
        .unwrap_or_default()
}

fn copy_param(name: String) -> ParamHook {
    Arc::new(move |value: &str, parameters: &mut Parameters| {
        parameters.insert(name.clone(), value.to_string());
    })
}

/// Bind the conventional routes of every registered controller, in
/// registration order and canonical action order. Actions a controller does
/// not implement get no route. Returns how many routes were bound, or a
/// configuration error for a route axum cannot serve.
pub fn build_routes(controllers: &ControllerTable, table: &mut RouteTable) -> Result<usize> {
    let mut bound = 0;

    for entry in controllers.iter() {
        let capabilities = entry.instance.capabilities();

        for routing in routing_table(&entry.resource) {
            let slot = capabilities.slot(routing.name);
            if !slot.is_defined() {
                continue;
            }

            let uri = format!("{}{}", entry.route, routing.suffix);
            tracing::debug!(
                action = %routing.name,
                resource = %entry.resource,
                uri = %uri,
                "initializing route handler"
            );

            let template = PathTemplate::parse(&uri);
            if let Some(conflict) = template.axum_conflict() {
                return Err(PaperframeError::configuration(format!(
                    "Route {uri} of controller {} cannot be served: {conflict}",
                    entry.resource
                )));
            }
            for name in template.params() {
                table.param(name.clone(), copy_param(name));
            }

            table.bind(BoundRoute {
                resource: entry.resource.clone(),
                action: routing.name,
                verb: routing.verb,
                uri,
                template,
                acl: route_acl(routing.name, entry.instance.as_ref()),
                slot,
                controller: Arc::clone(&entry.instance),
            });
            bound += 1;
        }
    }

    Ok(bound)
}
