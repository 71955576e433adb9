use axum::middleware;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::collection::{CollectionBlueprint, Collections};
use crate::config::{ConfigService, RouterConfig};
use crate::controller::{ControllerRegistry, ControllerTable, RoutesAcl};
use crate::database::{DATABASE_PROVIDER, DatabaseServiceProvider, DriverFactory};
use crate::di::{Container, DependencyResolver, ProviderContext, ServiceProviderFactory};
use crate::dispatch::Dispatcher;
use crate::error::{PaperframeError, Result};
use crate::extension::{ExtensionKind, ExtensionLocator, ExtensionRegistry};
use crate::guard::{AuthorizationGate, TokenVerifier, authorization, authorization_errors};
use crate::messaging::EventBus;
use crate::module::ModuleDefinition;
use crate::routing::{RouteTable, axum_router, build_routes};

/// The extension tables a router loads from.
pub struct Registries {
    pub collections: ExtensionRegistry<CollectionBlueprint>,
    pub modules: ExtensionRegistry<ModuleDefinition>,
    pub service_providers: ExtensionRegistry<ServiceProviderFactory>,
    pub database_drivers: ExtensionRegistry<DriverFactory>,
}

impl Registries {
    fn new(locator: &ExtensionLocator) -> Self {
        let mut service_providers = ExtensionRegistry::new(ExtensionKind::ServiceProvider);
        service_providers.register_symbol(
            locator.builtin(ExtensionKind::ServiceProvider, DATABASE_PROVIDER),
            DatabaseServiceProvider::factory(),
        );

        Self {
            collections: ExtensionRegistry::new(ExtensionKind::Collection),
            modules: ExtensionRegistry::new(ExtensionKind::Module),
            service_providers,
            database_drivers: ExtensionRegistry::new(ExtensionKind::DatabaseDriver),
        }
    }
}

type Registration = Box<dyn FnOnce(&mut Registries, &ExtensionLocator) + Send>;

/// Builder for [`Router`].
#[derive(Default)]
pub struct RouterBuilder {
    config: Option<ConfigService>,
    dirname: Option<String>,
    verifier: Option<Arc<dyn TokenVerifier>>,
    secret: Option<String>,
    events: Option<EventBus>,
    registrations: Vec<Registration>,
}

impl RouterBuilder {
    /// Configuration source. Defaults to a snapshot of the environment.
    pub fn config(mut self, config: ConfigService) -> Self {
        self.config = Some(config);
        self
    }

    /// Base of the local extension keys, overriding `SERVICE_DIRNAME`.
    pub fn dirname(mut self, dirname: impl Into<String>) -> Self {
        self.dirname = Some(dirname.into());
        self
    }

    pub fn token_verifier(mut self, verifier: Arc<dyn TokenVerifier>) -> Self {
        self.verifier = Some(verifier);
        self
    }

    pub fn token_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into());
        self
    }

    pub fn event_bus(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    /// Register extensions under explicit keys.
    pub fn extensions<F>(mut self, register: F) -> Self
    where
        F: FnOnce(&mut Registries, &ExtensionLocator) + Send + 'static,
    {
        self.registrations.push(Box::new(register));
        self
    }

    /// A local collection, `<dirname>/Collections/<Name>`.
    pub fn collection(self, name: impl Into<String>, blueprint: CollectionBlueprint) -> Self {
        let name = name.into();
        self.extensions(move |registries, locator| {
            registries
                .collections
                .register_symbol(locator.local(ExtensionKind::Collection, &name), blueprint);
        })
    }

    /// A collection package, `<prefix>-collection-<name>`.
    pub fn collection_package(self, name: impl Into<String>, blueprint: CollectionBlueprint) -> Self {
        let name = name.into();
        self.extensions(move |registries, locator| {
            registries
                .collections
                .register_symbol(locator.package(ExtensionKind::Collection, &name), blueprint);
        })
    }

    /// A local module, `<dirname>/Modules/<Name>`.
    pub fn module(self, module: ModuleDefinition) -> Self {
        self.extensions(move |registries, locator| {
            let key = locator.local(ExtensionKind::Module, &module.name);
            registries.modules.register_symbol(key, module);
        })
    }

    /// A module package, `<prefix>-module-<name>`.
    pub fn module_package(self, module: ModuleDefinition) -> Self {
        self.extensions(move |registries, locator| {
            let key = locator.package(ExtensionKind::Module, &module.name);
            registries.modules.register_symbol(key, module);
        })
    }

    /// A local service provider, `<dirname>/ServiceProviders/<Name>`.
    pub fn service_provider(self, name: impl Into<String>, factory: ServiceProviderFactory) -> Self {
        let name = name.into();
        self.extensions(move |registries, locator| {
            registries
                .service_providers
                .register_symbol(locator.local(ExtensionKind::ServiceProvider, &name), factory);
        })
    }

    /// A local database driver, `<dirname>/ServiceProviders/Database/Drivers/<Id>`.
    pub fn database_driver(self, id: impl Into<String>, factory: DriverFactory) -> Self {
        let id = id.into();
        self.extensions(move |registries, locator| {
            registries
                .database_drivers
                .register_symbol(locator.local(ExtensionKind::DatabaseDriver, &id), factory);
        })
    }

    pub fn build(self) -> Result<Router> {
        let config = self.config.unwrap_or_else(ConfigService::new);
        let mut settings = RouterConfig::from_config(&config);
        if let Some(dirname) = self.dirname {
            settings.dirname = dirname;
        }

        let verifier = match (self.verifier, self.secret) {
            (Some(_), None) => {
                return Err(PaperframeError::configuration(
                    "With a token verifier specified, a token secret is also required.",
                ));
            }
            (Some(verifier), Some(secret)) => Some((verifier, Arc::<str>::from(secret))),
            (None, _) => None,
        };

        let locator = ExtensionLocator::new(settings.dirname.clone(), settings.prefix.clone());
        let mut registries = Registries::new(&locator);
        for register in self.registrations {
            register(&mut registries, &locator);
        }

        let events = self.events.unwrap_or_default();
        let dispatcher = Arc::new(Dispatcher::new(events.clone(), &settings.prefix));

        Ok(Router {
            config,
            settings,
            locator,
            events,
            dispatcher,
            verifier,
            registries,
            state: None,
        })
    }
}

struct Initialized {
    collections: Collections,
    modules: Vec<String>,
    controllers: ControllerTable,
    providers: Container,
    routes: Arc<RouteTable>,
}

/// Loads collections and modules, instantiates controllers and binds their
/// routes.
///
/// ```no_run
/// use paperframe::{ConfigService, Router};
///
/// # async fn run() -> anyhow::Result<()> {
/// let mut router = Router::builder()
///     .config(ConfigService::new())
///     .build()?;
/// router.initialize().await?;
///
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
/// axum::serve(listener, router.app()?).await?;
/// # Ok(())
/// # }
/// ```
pub struct Router {
    config: ConfigService,
    settings: RouterConfig,
    locator: ExtensionLocator,
    events: EventBus,
    dispatcher: Arc<Dispatcher>,
    verifier: Option<(Arc<dyn TokenVerifier>, Arc<str>)>,
    registries: Registries,
    state: Option<Initialized>,
}

impl Router {
    pub fn builder() -> RouterBuilder {
        RouterBuilder::default()
    }

    pub async fn initialize(&mut self) -> Result<()> {
        if self.state.is_some() {
            return Err(PaperframeError::configuration("Router is already initialized."));
        }

        let names = self.settings.collections.clone().ok_or_else(|| {
            PaperframeError::configuration("No collections specified. Please set SERVER_COLLECTIONS correctly!")
        })?;
        let collections = self.load_collections(&names)?;

        let names = self.settings.modules.clone().ok_or_else(|| {
            PaperframeError::configuration("No modules specified. Please set SERVER_MODULES correctly!")
        })?;
        let modules = self.load_modules(&names)?;

        let context = ProviderContext {
            events: self.events.clone(),
            config: self.config.clone(),
            locator: self.locator.clone(),
            drivers: Arc::new(self.registries.database_drivers.clone()),
        };
        let mut resolver = DependencyResolver::new(self.registries.service_providers.clone(), context);

        let mut controllers = ControllerTable::new();
        let mut registry = ControllerRegistry::new(&mut resolver, collections.clone(), self.events.clone());
        for module in &modules {
            tracing::debug!(module = %module.name, "initializing controllers for module");
            registry.register(&module.controllers, &mut controllers).await?;
        }

        let mut routes = RouteTable::new();
        let bound = build_routes(&controllers, &mut routes)?;

        tracing::info!(
            collections = collections.len(),
            modules = modules.len(),
            controllers = controllers.len(),
            routes = bound,
            "router initialized"
        );

        self.state = Some(Initialized {
            collections,
            modules: modules.into_iter().map(|module| module.name).collect(),
            controllers,
            providers: resolver.providers().clone(),
            routes: Arc::new(routes),
        });
        Ok(())
    }

    fn load_collections(&self, names: &[String]) -> Result<Collections> {
        let mut table = BTreeMap::new();
        for name in names {
            if name.is_empty() {
                tracing::debug!("not initializing collection, because it is empty");
                continue;
            }
            tracing::debug!(collection = %name, "initializing collection");

            let kind = ExtensionKind::Collection;
            let blueprint = self
                .registries
                .collections
                .resolve(&self.locator.local(kind, name), &self.locator.package(kind, name), None)
                .and_then(|extension| extension.into_default())
                .ok_or_else(|| PaperframeError::not_found(kind, name.as_str()))?;
            table.insert(name.clone(), blueprint);
        }
        Ok(Collections::new(table))
    }

    fn load_modules(&self, names: &[String]) -> Result<Vec<ModuleDefinition>> {
        let mut modules: Vec<ModuleDefinition> = Vec::new();
        for name in names {
            if name.is_empty() {
                tracing::debug!("not initializing module, because it is empty");
                continue;
            }
            tracing::debug!(module = %name, "initializing module");

            let kind = ExtensionKind::Module;
            let module = self
                .registries
                .modules
                .resolve(&self.locator.local(kind, name), &self.locator.package(kind, name), None)
                .and_then(|extension| extension.into_default())
                .ok_or_else(|| PaperframeError::not_found(kind, name.as_str()))?;

            match modules.iter_mut().find(|loaded| loaded.name == module.name) {
                Some(loaded) => *loaded = module,
                None => modules.push(module),
            }
        }
        Ok(modules)
    }

    fn state(&self) -> Result<&Initialized> {
        self.state.as_ref().ok_or(PaperframeError::NotInitialized)
    }

    /// The bound routes as an axum router, without authorization.
    pub fn routes(&self) -> Result<axum::Router> {
        let state = self.state()?;
        Ok(axum_router(Arc::clone(&state.routes), Arc::clone(&self.dispatcher)))
    }

    /// Access rules of every controller that declares any, keyed by resource.
    pub fn routes_acl(&self) -> Result<RoutesAcl> {
        Ok(self.state()?.controllers.routes_acl())
    }

    pub fn authorization_gate(&self) -> Result<AuthorizationGate> {
        let state = self.state()?;
        let gate = AuthorizationGate::new(Arc::clone(&state.routes), state.controllers.routes_acl());
        Ok(match &self.verifier {
            Some((verifier, secret)) => gate.with_verifier(Arc::clone(verifier), Arc::clone(secret)),
            None => gate,
        })
    }

    /// Routes behind the authorization gate and its error translation.
    pub fn app(&self) -> Result<axum::Router> {
        let gate = self.authorization_gate()?;
        Ok(self
            .routes()?
            .layer(middleware::from_fn_with_state(gate, authorization))
            .layer(middleware::from_fn(authorization_errors)))
    }

    pub fn is_initialized(&self) -> bool {
        self.state.is_some()
    }

    pub fn settings(&self) -> &RouterConfig {
        &self.settings
    }

    pub fn config(&self) -> &ConfigService {
        &self.config
    }

    pub fn locator(&self) -> &ExtensionLocator {
        &self.locator
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn route_table(&self) -> Option<&RouteTable> {
        self.state.as_ref().map(|state| state.routes.as_ref())
    }

    pub fn controllers(&self) -> Option<&ControllerTable> {
        self.state.as_ref().map(|state| &state.controllers)
    }

    pub fn collections(&self) -> Option<&Collections> {
        self.state.as_ref().map(|state| &state.collections)
    }

    pub fn modules(&self) -> Option<&[String]> {
        self.state.as_ref().map(|state| state.modules.as_slice())
    }

    /// Service providers initialized during startup.
    pub fn providers(&self) -> Option<&Container> {
        self.state.as_ref().map(|state| &state.providers)
    }
}
