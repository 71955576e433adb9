use super::ExtensionKind;

/// Root of the keys for extensions shipped with the framework itself.
pub const BUILTIN_ROOT: &str = "@paperframe";

/// Computes registry keys from the naming conventions.
#[derive(Debug, Clone)]
pub struct ExtensionLocator {
    dirname: String,
    prefix: String,
}

impl ExtensionLocator {
    pub fn new(dirname: impl Into<String>, prefix: impl Into<String>) -> Self {
        let dirname = dirname.into();
        let dirname = match dirname.trim_end_matches('/') {
            "" if dirname.starts_with('/') => "/".to_string(),
            "" => ".".to_string(),
            trimmed => trimmed.to_string(),
        };

        Self {
            dirname,
            prefix: prefix.into(),
        }
    }

    pub fn dirname(&self) -> &str {
        &self.dirname
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// `<dirname>/<Category>/<Name>`
    pub fn local(&self, kind: ExtensionKind, name: &str) -> String {
        join(&self.dirname, kind, name)
    }

    /// `@paperframe/<Category>/<Name>`
    pub fn builtin(&self, kind: ExtensionKind, name: &str) -> String {
        join(BUILTIN_ROOT, kind, name)
    }

    /// `<prefix>-<category>-<name>`
    pub fn package(&self, kind: ExtensionKind, name: &str) -> String {
        format!("{}-{}-{}", self.prefix, kind.package_category(), name)
    }
}

fn join(root: &str, kind: ExtensionKind, name: &str) -> String {
    let name = match kind {
        ExtensionKind::DatabaseDriver => capitalize(name),
        _ => upper_first(name),
    };
    let root = root.trim_end_matches('/');
    format!("{}/{}/{}", root, kind.directory(), name)
}

/// `"userGroup"` -> `"UserGroup"`
pub fn upper_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `"mongoDB"` -> `"Mongodb"`
pub fn capitalize(name: &str) -> String {
    upper_first(&name.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_keys() {
        let locator = ExtensionLocator::new("/srv/app/", "paperframe");
        assert_eq!(
            locator.local(ExtensionKind::Collection, "user"),
            "/srv/app/Collections/User"
        );
        assert_eq!(
            locator.local(ExtensionKind::Module, "shopCart"),
            "/srv/app/Modules/ShopCart"
        );
        assert_eq!(
            locator.local(ExtensionKind::ServiceProvider, "database"),
            "/srv/app/ServiceProviders/Database"
        );
        assert_eq!(
            locator.local(ExtensionKind::DatabaseDriver, "mongoDB"),
            "/srv/app/ServiceProviders/Database/Drivers/Mongodb"
        );
    }

    #[test]
    fn test_builtin_and_package_keys() {
        let locator = ExtensionLocator::new(".", "acme");
        assert_eq!(
            locator.builtin(ExtensionKind::ServiceProvider, "database"),
            "@paperframe/ServiceProviders/Database"
        );
        assert_eq!(
            locator.package(ExtensionKind::Collection, "user"),
            "acme-collection-user"
        );
        assert_eq!(
            locator.package(ExtensionKind::DatabaseDriver, "memory"),
            "acme-database-driver-memory"
        );
    }

    #[test]
    fn test_root_dirname_is_preserved() {
        assert_eq!(ExtensionLocator::new("/", "p").dirname(), "/");
        assert_eq!(ExtensionLocator::new("", "p").dirname(), ".");
    }

    #[test]
    fn test_case_helpers() {
        assert_eq!(upper_first(""), "");
        assert_eq!(upper_first("widget"), "Widget");
        assert_eq!(capitalize("WIDGET"), "Widget");
    }
}
