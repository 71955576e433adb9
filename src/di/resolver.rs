use crate::di::{Container, ProviderContext, ProviderHandle, ServiceProviderFactory};
use crate::error::{PaperframeError, Result};
use crate::extension::{ExtensionKind, ExtensionRegistry};

/// Resolves named dependencies to initialized service providers.
///
/// Each provider is looked up as `<dirname>/ServiceProviders/<Name>`, then as
/// the `<prefix>-serviceprovider-<name>` package, then among the built-ins.
/// Resolved providers are cached, so a name is initialized at most once per
/// resolver no matter how many controllers ask for it.
pub struct DependencyResolver {
    providers: Container,
    registry: ExtensionRegistry<ServiceProviderFactory>,
    context: ProviderContext,
}

impl DependencyResolver {
    pub fn new(registry: ExtensionRegistry<ServiceProviderFactory>, context: ProviderContext) -> Self {
        Self {
            providers: Container::new(),
            registry,
            context,
        }
    }

    /// Every provider initialized so far.
    pub fn providers(&self) -> &Container {
        &self.providers
    }

    /// Resolve `names` in order and return them as one container.
    pub async fn resolve_all<S: AsRef<str>>(&mut self, names: &[S]) -> Result<Container> {
        let mut resolved = Container::new();
        for name in names {
            let name = name.as_ref();
            let handle = match self.providers.get(name) {
                Some(handle) => handle,
                None => {
                    let handle = self.initialize(name).await?;
                    self.providers.register(name, handle.clone());
                    handle
                }
            };
            resolved.register(name, handle);
        }

        Ok(resolved)
    }

    async fn initialize(&self, name: &str) -> Result<ProviderHandle> {
        tracing::debug!(dependency = name, "initializing new dependency");

        let locator = &self.context.locator;
        let kind = ExtensionKind::ServiceProvider;
        let factory = self
            .registry
            .resolve(
                &locator.local(kind, name),
                &locator.package(kind, name),
                Some(&locator.builtin(kind, name)),
            )
            .and_then(|extension| extension.into_default())
            .ok_or_else(|| PaperframeError::not_found(kind, name))?;

        factory
            .build(self.context.clone())
            .await
            .map_err(|err| PaperframeError::ProviderInitialization {
                name: name.to_string(),
                message: format!("{err:#}"),
            })
    }
}
