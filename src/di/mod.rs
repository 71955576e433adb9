mod container;
mod provider;
mod resolver;

pub use container::Container;
pub use provider::{ProviderContext, ProviderHandle, ServiceProvider, ServiceProviderFactory};
pub(crate) use provider::BoxFuture;
pub use resolver::DependencyResolver;
