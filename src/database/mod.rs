//! The built-in `database` service provider and the driver seam behind it.

use async_trait::async_trait;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::config::DATABASE_DRIVER;
use crate::di::{BoxFuture, ProviderContext, ServiceProvider, ServiceProviderFactory};
use crate::extension::ExtensionKind;

/// Name under which the database provider is available to controllers.
pub const DATABASE_PROVIDER: &str = "database";

/// Whatever a driver hands to collections: a connection pool, a client, an
/// in-memory store.
pub type DriverClient = Arc<dyn Any + Send + Sync>;

/// A database backend.
#[async_trait]
pub trait Driver: Send + Sync + 'static {
    async fn initialize(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    fn client(&self) -> DriverClient;
}

type BuildFn = Arc<dyn Fn() -> BoxFuture<anyhow::Result<DriverClient>> + Send + Sync>;

/// Constructs and initializes one kind of driver.
#[derive(Clone)]
pub struct DriverFactory {
    build: BuildFn,
}

impl DriverFactory {
    pub fn new<D, F>(make: F) -> Self
    where
        D: Driver,
        F: Fn() -> D + Send + Sync + 'static,
    {
        Self {
            build: Arc::new(move || {
                let mut driver = make();
                Box::pin(async move {
                    driver.initialize().await?;
                    Ok(driver.client())
                })
            }),
        }
    }

    pub fn of<D: Driver + Default>() -> Self {
        Self::new(D::default)
    }

    pub async fn build(&self) -> anyhow::Result<DriverClient> {
        (self.build)().await
    }
}

/// The initialized driver as seen by collections.
#[derive(Clone)]
pub struct DriverHandle {
    pub id: String,
    pub client: DriverClient,
}

impl DriverHandle {
    pub fn client<C: Send + Sync + 'static>(&self) -> Option<Arc<C>> {
        self.client.clone().downcast::<C>().ok()
    }
}

impl fmt::Debug for DriverHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriverHandle").field("id", &self.id).finish_non_exhaustive()
    }
}

/// Connects the driver named by `DATABASE_DRIVER`.
#[derive(Default)]
pub struct DatabaseServiceProvider {
    driver: Option<DriverHandle>,
}

impl DatabaseServiceProvider {
    pub fn factory() -> ServiceProviderFactory {
        ServiceProviderFactory::of::<Self>()
    }

    pub fn driver(&self) -> Option<&DriverHandle> {
        self.driver.as_ref()
    }
}

#[async_trait]
impl ServiceProvider for DatabaseServiceProvider {
    async fn initialize(&mut self, context: &ProviderContext) -> anyhow::Result<()> {
        tracing::debug!("initializing database provider");

        let Some(id) = context.config.get(DATABASE_DRIVER) else {
            anyhow::bail!("Database: No driver defined! Please set {DATABASE_DRIVER} in your environment first.");
        };

        let kind = ExtensionKind::DatabaseDriver;
        let factory = context
            .drivers
            .resolve(&context.locator.local(kind, &id), &context.locator.package(kind, &id), None)
            .and_then(|extension| extension.into_default())
            .ok_or_else(|| anyhow::anyhow!("Database: Driver {id} could not be initialized."))?;

        let client = factory.build().await?;
        tracing::info!(driver = %id, "database driver ready");
        self.driver = Some(DriverHandle { id, client });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigService;
    use crate::extension::{ExtensionLocator, ExtensionRegistry};
    use crate::messaging::EventBus;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryDriver {
        store: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Driver for MemoryDriver {
        async fn initialize(&mut self) -> anyhow::Result<()> {
            self.store.lock().unwrap().push("ready".to_string());
            Ok(())
        }

        fn client(&self) -> DriverClient {
            self.store.clone()
        }
    }

    fn context(config: ConfigService) -> ProviderContext {
        let mut drivers = ExtensionRegistry::new(ExtensionKind::DatabaseDriver);
        drivers.register_symbol(
            "app/ServiceProviders/Database/Drivers/Memory",
            DriverFactory::of::<MemoryDriver>(),
        );
        ProviderContext {
            events: EventBus::new(),
            config,
            locator: ExtensionLocator::new("app", "paperframe"),
            drivers: Arc::new(drivers),
        }
    }

    #[tokio::test]
    async fn test_driver_is_resolved_and_initialized() {
        let context = context(ConfigService::empty().with(DATABASE_DRIVER, "MEMORY"));
        let mut provider = DatabaseServiceProvider::default();
        provider.initialize(&context).await.unwrap();

        let driver = provider.driver().unwrap();
        assert_eq!(driver.id, "MEMORY");
        let store = driver.client::<Mutex<Vec<String>>>().unwrap();
        assert_eq!(store.lock().unwrap().as_slice(), ["ready".to_string()]);
    }

    #[tokio::test]
    async fn test_missing_driver_setting() {
        let mut provider = DatabaseServiceProvider::default();
        let err = provider
            .initialize(&context(ConfigService::empty()))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("No driver defined"));
        assert!(provider.driver().is_none());
    }

    #[tokio::test]
    async fn test_unknown_driver() {
        let context = context(ConfigService::empty().with(DATABASE_DRIVER, "postgres"));
        let mut provider = DatabaseServiceProvider::default();
        let err = provider.initialize(&context).await.unwrap_err();
        assert!(err.to_string().contains("postgres"));
    }
}
