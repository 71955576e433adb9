//! Extension discovery.
//!
//! Collections, modules, service providers and database drivers are looked up
//! by name in an [`ExtensionRegistry`]: a static table, filled in at startup,
//! that maps *keys* to loaders. Keys follow the directory convention
//! (`<dirname>/<Category>/<Name>`, see [`ExtensionLocator`]) for local
//! extensions and the package convention (`<prefix>-<category>-<name>`) for
//! external ones, so "local override, external fallback" stays an explicit,
//! ordered lookup instead of filesystem scanning.

mod locator;

pub use locator::{ExtensionLocator, capitalize, upper_first};

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use strum_macros::Display;

/// The category an extension belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum ExtensionKind {
    Collection,
    Module,
    #[strum(to_string = "Service provider")]
    ServiceProvider,
    #[strum(to_string = "Database driver")]
    DatabaseDriver,
}

impl ExtensionKind {
    /// Directory segment used for local keys.
    pub fn directory(&self) -> &'static str {
        match self {
            Self::Collection => "Collections",
            Self::Module => "Modules",
            Self::ServiceProvider => "ServiceProviders",
            Self::DatabaseDriver => "ServiceProviders/Database/Drivers",
        }
    }

    /// Category segment used for external package names.
    pub fn package_category(&self) -> &'static str {
        match self {
            Self::Collection => "collection",
            Self::Module => "module",
            Self::ServiceProvider => "serviceprovider",
            Self::DatabaseDriver => "database-driver",
        }
    }
}

/// What a loader hands back: either the value itself or a module of named
/// exports.
#[derive(Clone)]
pub enum Extension<T> {
    Symbol(T),
    Exports(Vec<(String, T)>),
}

impl<T> Extension<T> {
    pub fn exports<N: Into<String>>(exports: impl IntoIterator<Item = (N, T)>) -> Self {
        Self::Exports(exports.into_iter().map(|(n, v)| (n.into(), v)).collect())
    }

    /// A module exporting exactly one symbol named like the target (compared
    /// case-insensitively) is replaced by that symbol. Anything else is
    /// returned unchanged.
    pub fn unwrap_single(self, basename: &str) -> Self {
        match self {
            Self::Exports(mut exports)
                if exports.len() == 1 && exports[0].0.eq_ignore_ascii_case(basename) =>
            {
                let (_, symbol) = exports.remove(0);
                Self::Symbol(symbol)
            }
            other => other,
        }
    }

    /// The usable value: the symbol itself, or the export named `default`.
    pub fn into_default(self) -> Option<T> {
        match self {
            Self::Symbol(symbol) => Some(symbol),
            Self::Exports(exports) => exports
                .into_iter()
                .find(|(name, _)| name == "default")
                .map(|(_, symbol)| symbol),
        }
    }

    pub fn is_symbol(&self) -> bool {
        matches!(self, Self::Symbol(_))
    }
}

impl<T> fmt::Debug for Extension<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Symbol(_) => f.write_str("Symbol"),
            Self::Exports(exports) => f
                .debug_list()
                .entries(exports.iter().map(|(name, _)| name))
                .finish(),
        }
    }
}

type Loader<T> = Arc<dyn Fn() -> anyhow::Result<Extension<T>> + Send + Sync>;

/// Keyed table of extension loaders for one [`ExtensionKind`].
#[derive(Clone)]
pub struct ExtensionRegistry<T> {
    kind: ExtensionKind,
    entries: HashMap<String, Loader<T>>,
}

impl<T: Clone + Send + Sync + 'static> ExtensionRegistry<T> {
    pub fn new(kind: ExtensionKind) -> Self {
        Self {
            kind,
            entries: HashMap::new(),
        }
    }

    pub fn kind(&self) -> ExtensionKind {
        self.kind
    }

    /// Register a ready extension under `key`.
    pub fn register(&mut self, key: impl Into<String>, extension: Extension<T>) -> &mut Self {
        self.register_with(key, move || Ok(extension.clone()))
    }

    /// Register a bare symbol under `key`.
    pub fn register_symbol(&mut self, key: impl Into<String>, symbol: T) -> &mut Self {
        self.register(key, Extension::Symbol(symbol))
    }

    /// Register a loader that runs on every lookup and may fail.
    pub fn register_with<F>(&mut self, key: impl Into<String>, loader: F) -> &mut Self
    where
        F: Fn() -> anyhow::Result<Extension<T>> + Send + Sync + 'static,
    {
        self.entries.insert(key.into(), Arc::new(loader));
        self
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Resolve an extension: `local` first, then the `external` package name,
    /// then `fallback` if given. The first hit wins. Misses and loader failures
    /// are logged and reported as `None`; whether that is fatal is up to the
    /// caller.
    pub fn resolve(&self, local: &str, external: &str, fallback: Option<&str>) -> Option<Extension<T>> {
        if let Some(extension) = self.load(local) {
            return Some(extension.unwrap_single(basename(local)));
        }

        if let Some(extension) = self.load(external) {
            return Some(extension);
        }

        let fallback = fallback?;
        self.load(fallback)
            .map(|extension| extension.unwrap_single(basename(fallback)))
    }

    fn load(&self, key: &str) -> Option<Extension<T>> {
        let Some(loader) = self.entries.get(key) else {
            tracing::debug!(kind = %self.kind, key, "extension not found");
            return None;
        };

        match loader() {
            Ok(extension) => {
                tracing::debug!(kind = %self.kind, key, "extension loaded");
                Some(extension)
            }
            Err(err) => {
                tracing::error!(kind = %self.kind, key, error = %format!("{err:#}"), "extension failed to load");
                None
            }
        }
    }
}

fn basename(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}
