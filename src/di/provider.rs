use async_trait::async_trait;
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::config::ConfigService;
use crate::database::DriverFactory;
use crate::extension::{ExtensionLocator, ExtensionRegistry};
use crate::messaging::EventBus;

pub(crate) type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// A singleton dependency injected into controllers by name.
///
/// # Example
/// ```
/// use paperframe::di::{ProviderContext, ServiceProvider};
/// use paperframe::async_trait;
///
/// #[derive(Default)]
/// struct Mailer {
///     relay: String,
/// }
///
/// #[async_trait]
/// impl ServiceProvider for Mailer {
///     async fn initialize(&mut self, context: &ProviderContext) -> anyhow::Result<()> {
///         self.relay = context.config.get("MAIL_RELAY").unwrap_or_default();
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait ServiceProvider: Send + Sync + 'static {
    /// Runs once, before the provider is handed to any controller. An error
    /// aborts router startup.
    async fn initialize(&mut self, context: &ProviderContext) -> anyhow::Result<()> {
        let _ = context;
        Ok(())
    }
}

/// What a provider gets to see while initializing.
#[derive(Clone)]
pub struct ProviderContext {
    pub events: EventBus,
    pub config: ConfigService,
    pub locator: ExtensionLocator,
    pub drivers: Arc<ExtensionRegistry<DriverFactory>>,
}

/// An initialized provider, type-erased.
#[derive(Clone)]
pub struct ProviderHandle {
    instance: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl ProviderHandle {
    pub fn new<T: ServiceProvider>(provider: Arc<T>) -> Self {
        Self {
            instance: provider,
            type_name: std::any::type_name::<T>(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn downcast<T: ServiceProvider>(&self) -> Option<Arc<T>> {
        self.instance.clone().downcast::<T>().ok()
    }
}

impl fmt::Debug for ProviderHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ProviderHandle").field(&self.type_name).finish()
    }
}

type BuildFn = Arc<dyn Fn(ProviderContext) -> BoxFuture<anyhow::Result<ProviderHandle>> + Send + Sync>;

/// Constructs and initializes one kind of provider.
#[derive(Clone)]
pub struct ServiceProviderFactory {
    build: BuildFn,
}

impl ServiceProviderFactory {
    pub fn new<T, F>(make: F) -> Self
    where
        T: ServiceProvider,
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self {
            build: Arc::new(move |context| {
                let mut provider = make();
                Box::pin(async move {
                    provider.initialize(&context).await?;
                    Ok(ProviderHandle::new(Arc::new(provider)))
                })
            }),
        }
    }

    pub fn of<T: ServiceProvider + Default>() -> Self {
        Self::new(T::default)
    }

    pub async fn build(&self, context: ProviderContext) -> anyhow::Result<ProviderHandle> {
        (self.build)(context).await
    }
}
