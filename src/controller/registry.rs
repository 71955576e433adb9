use async_trait::async_trait;
use std::sync::Arc;

use super::{Controller, ControllerConfig, ControllerDescriptor, RoutesAcl};
use crate::collection::Collections;
use crate::di::DependencyResolver;
use crate::error::{PaperframeError, Result};
use crate::messaging::{EventBus, EventId, EventListener, EventPackage};

/// A live controller and where it is mounted.
#[derive(Clone)]
pub struct RegisteredController {
    pub resource: String,
    pub route: String,
    pub instance: Arc<dyn Controller>,
}

/// Registered controllers in registration order, one per resource.
#[derive(Clone, Default)]
pub struct ControllerTable {
    entries: Vec<RegisteredController>,
}

impl ControllerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a controller. A controller already registered for the same resource
    /// is replaced in place and returned.
    pub fn insert(&mut self, entry: RegisteredController) -> Option<RegisteredController> {
        match self.entries.iter_mut().find(|e| e.resource == entry.resource) {
            Some(existing) => Some(std::mem::replace(existing, entry)),
            None => {
                self.entries.push(entry);
                None
            }
        }
    }

    pub fn get(&self, resource: &str) -> Option<&RegisteredController> {
        self.entries.iter().find(|e| e.resource == resource)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegisteredController> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Access rules of the controllers that declare any.
    pub fn routes_acl(&self) -> RoutesAcl {
        self.entries
            .iter()
            .filter_map(|entry| {
                entry
                    .instance
                    .route_acl()
                    .map(|acl| (entry.resource.clone(), acl.clone()))
            })
            .collect()
    }
}

/// Instantiates controllers from their descriptors.
pub struct ControllerRegistry<'a> {
    resolver: &'a mut DependencyResolver,
    collections: Collections,
    events: EventBus,
}

impl<'a> ControllerRegistry<'a> {
    pub fn new(resolver: &'a mut DependencyResolver, collections: Collections, events: EventBus) -> Self {
        Self {
            resolver,
            collections,
            events,
        }
    }

    /// Register `descriptors` into `table`, in order.
    pub async fn register(&mut self, descriptors: &[ControllerDescriptor], table: &mut ControllerTable) -> Result<()> {
        for descriptor in descriptors {
            let entry = self.instantiate(descriptor).await?;
            if let Some(previous) = table.insert(entry) {
                tracing::warn!(
                    resource = %previous.resource,
                    route = %previous.route,
                    "controller replaced by a later registration for the same resource"
                );
            }
        }
        Ok(())
    }

    async fn instantiate(&mut self, descriptor: &ControllerDescriptor) -> Result<RegisteredController> {
        let dependencies = if descriptor.dependencies.is_empty() {
            Default::default()
        } else {
            tracing::debug!(resource = %descriptor.resource, "initializing dependencies for controller");
            self.resolver.resolve_all(&descriptor.dependencies).await?
        };

        if descriptor.resource.is_empty() {
            return Err(PaperframeError::MissingResource {
                route: descriptor.route.clone(),
            });
        }
        if descriptor.route.is_empty() {
            return Err(PaperframeError::MissingRoute {
                resource: descriptor.resource.clone(),
            });
        }

        let config = ControllerConfig {
            dependencies,
            collections: self.collections.clone(),
        };
        let instance = descriptor
            .instantiate(config)
            .map_err(|err| PaperframeError::ControllerConstruction {
                resource: descriptor.resource.clone(),
                message: format!("{err:#}"),
            })?;

        if let Some(pattern) = instance.event_listener() {
            tracing::debug!(resource = %descriptor.resource, pattern, "controller subscribed to events");
            self.events.on(
                pattern,
                Arc::new(ControllerListener {
                    controller: Arc::clone(&instance),
                }),
            );
        }

        Ok(RegisteredController {
            resource: descriptor.resource.clone(),
            route: descriptor.route.clone(),
            instance,
        })
    }
}

struct ControllerListener {
    controller: Arc<dyn Controller>,
}

#[async_trait]
impl EventListener for ControllerListener {
    async fn on_event(&self, event: &EventId, package: &EventPackage) -> anyhow::Result<()> {
        self.controller.on_event(event, package).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigService;
    use crate::controller::{Action, ActionResult, Capabilities, ControllerParams, RouteAcl, RouteAclTable};
    use crate::database::DriverFactory;
    use crate::di::{ProviderContext, ServiceProvider, ServiceProviderFactory};
    use crate::dispatch::RequestScope;
    use crate::extension::{ExtensionKind, ExtensionLocator, ExtensionRegistry};
    use crate::messaging::EventDataTable;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::mpsc;

    struct Stub {
        acl: Option<RouteAclTable>,
        listen: Option<String>,
        seen: Option<mpsc::UnboundedSender<String>>,
    }

    #[async_trait]
    impl Controller for Stub {
        fn capabilities(&self) -> Capabilities {
            Capabilities::new().handler(Action::Index)
        }

        fn route_acl(&self) -> Option<&RouteAclTable> {
            self.acl.as_ref()
        }

        fn event_listener(&self) -> Option<&str> {
            self.listen.as_deref()
        }

        async fn on_event(&self, event: &EventId, _package: &EventPackage) -> anyhow::Result<()> {
            if let Some(seen) = &self.seen {
                seen.send(event.to_string())?;
            }
            Ok(())
        }

        async fn handle(&self, _: Action, _: &RequestScope, _: ControllerParams) -> ActionResult<()> {
            Ok(())
        }
    }

    fn stub(resource: &str, route: &str) -> ControllerDescriptor {
        ControllerDescriptor::new(resource, route, |_| {
            Ok(Stub {
                acl: None,
                listen: None,
                seen: None,
            })
        })
    }

    struct Shared;

    impl ServiceProvider for Shared {}

    fn resolver(initialized: Arc<AtomicUsize>) -> DependencyResolver {
        let mut registry = ExtensionRegistry::new(ExtensionKind::ServiceProvider);
        registry.register_symbol(
            "app/ServiceProviders/Shared",
            ServiceProviderFactory::new(move || {
                initialized.fetch_add(1, Ordering::SeqCst);
                Shared
            }),
        );
        let context = ProviderContext {
            events: EventBus::new(),
            config: ConfigService::empty(),
            locator: ExtensionLocator::new("app", "paperframe"),
            drivers: Arc::new(ExtensionRegistry::<DriverFactory>::new(ExtensionKind::DatabaseDriver)),
        };
        DependencyResolver::new(registry, context)
    }

    #[tokio::test]
    async fn test_shared_dependency_across_controllers() {
        let initialized = Arc::new(AtomicUsize::new(0));
        let mut resolver = resolver(initialized.clone());
        let mut table = ControllerTable::new();

        let descriptors = [
            stub("widget", "/widgets").dependencies(["shared"]),
            stub("gadget", "/gadgets").dependencies(["shared"]),
        ];
        ControllerRegistry::new(&mut resolver, Collections::default(), EventBus::new())
            .register(&descriptors, &mut table)
            .await
            .unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(initialized.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_resource_or_route() {
        let mut resolver = resolver(Arc::new(AtomicUsize::new(0)));
        let mut table = ControllerTable::new();
        let mut registry = ControllerRegistry::new(&mut resolver, Collections::default(), EventBus::new());

        let err = registry.register(&[stub("", "/widgets")], &mut table).await.unwrap_err();
        assert!(matches!(err, PaperframeError::MissingResource { .. }));

        let err = registry.register(&[stub("widget", "")], &mut table).await.unwrap_err();
        assert!(matches!(err, PaperframeError::MissingRoute { .. }));
        assert!(table.is_empty());
    }

    #[tokio::test]
    async fn test_factory_failure() {
        let mut resolver = resolver(Arc::new(AtomicUsize::new(0)));
        let mut table = ControllerTable::new();
        let broken = ControllerDescriptor::new("widget", "/widgets", |_| -> anyhow::Result<Stub> {
            anyhow::bail!("collection widget missing")
        });

        let err = ControllerRegistry::new(&mut resolver, Collections::default(), EventBus::new())
            .register(&[broken], &mut table)
            .await
            .unwrap_err();
        assert!(matches!(err, PaperframeError::ControllerConstruction { .. }));
    }

    #[tokio::test]
    async fn test_duplicate_resource_overwrites_in_place() {
        let mut resolver = resolver(Arc::new(AtomicUsize::new(0)));
        let mut table = ControllerTable::new();

        let descriptors = [
            stub("widget", "/widgets"),
            stub("gadget", "/gadgets"),
            stub("widget", "/v2/widgets"),
        ];
        ControllerRegistry::new(&mut resolver, Collections::default(), EventBus::new())
            .register(&descriptors, &mut table)
            .await
            .unwrap();

        let routes: Vec<&str> = table.iter().map(|e| e.route.as_str()).collect();
        assert_eq!(routes, vec!["/v2/widgets", "/gadgets"]);
    }

    #[tokio::test]
    async fn test_routes_acl_only_lists_declaring_controllers() {
        let mut resolver = resolver(Arc::new(AtomicUsize::new(0)));
        let mut table = ControllerTable::new();

        let guarded = ControllerDescriptor::new("account", "/accounts", |_| {
            let mut acl = RouteAclTable::new();
            acl.insert(Action::Index, RouteAcl::PUBLIC);
            Ok(Stub {
                acl: Some(acl),
                listen: None,
                seen: None,
            })
        });
        ControllerRegistry::new(&mut resolver, Collections::default(), EventBus::new())
            .register(&[guarded, stub("widget", "/widgets")], &mut table)
            .await
            .unwrap();

        let acl = table.routes_acl();
        assert_eq!(acl.len(), 1);
        assert_eq!(acl["account"][&Action::Index], RouteAcl::PUBLIC);
    }

    #[tokio::test]
    async fn test_event_listener_subscription() {
        let mut resolver = resolver(Arc::new(AtomicUsize::new(0)));
        let mut table = ControllerTable::new();
        let events = EventBus::new();
        let (tx, mut rx) = mpsc::unbounded_channel();

        let audit = ControllerDescriptor::new("audit", "/audit", move |_| {
            Ok(Stub {
                acl: None,
                listen: Some("API.WIDGET.*".to_string()),
                seen: Some(tx.clone()),
            })
        });
        ControllerRegistry::new(&mut resolver, Collections::default(), events.clone())
            .register(&[audit], &mut table)
            .await
            .unwrap();

        assert_eq!(events.listener_count("API.WIDGET.SHOW"), 1);
        events.emit(&EventId::api("widget", "show"), EventPackage::new(EventDataTable::new()));
        assert_eq!(rx.recv().await.unwrap(), "API.WIDGET.SHOW");
    }
}
