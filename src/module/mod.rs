use crate::controller::ControllerDescriptor;

/// A named group of controllers, registered under `<dirname>/Modules/<Name>`
/// or as a `<prefix>-module-<name>` package.
///
/// # Example
/// ```no_run
/// use paperframe::controller::ControllerDescriptor;
/// use paperframe::module::ModuleDefinition;
///
/// fn widgets() -> ControllerDescriptor {
///     # unimplemented!()
/// }
///
/// let shop = ModuleDefinition::new("shop").controller(widgets());
/// ```
#[derive(Clone, Debug)]
pub struct ModuleDefinition {
    pub name: String,
    pub controllers: Vec<ControllerDescriptor>,
}

impl ModuleDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            controllers: Vec::new(),
        }
    }

    pub fn controller(mut self, descriptor: ControllerDescriptor) -> Self {
        self.controllers.push(descriptor);
        self
    }

    pub fn with_controllers(mut self, controllers: impl IntoIterator<Item = ControllerDescriptor>) -> Self {
        self.controllers.extend(controllers);
        self
    }
}
