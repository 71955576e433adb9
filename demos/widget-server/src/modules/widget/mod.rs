pub mod controller;
pub mod model;
pub mod repository;

pub use controller::WidgetController;

use paperframe::module::ModuleDefinition;

pub fn module() -> ModuleDefinition {
    ModuleDefinition::new("widget").controller(WidgetController::descriptor())
}
