use paperframe::prelude::*;

/// Logs every widget event. Serves no routes of its own.
pub struct AuditController;

#[async_trait]
impl Controller for AuditController {
    fn capabilities(&self) -> Capabilities {
        Capabilities::new()
    }

    fn event_listener(&self) -> Option<&str> {
        Some("API.WIDGET.*")
    }

    async fn on_event(&self, event: &EventId, package: &EventPackage) -> anyhow::Result<()> {
        tracing::info!(%event, at = %package.timestamp, keys = ?package.data.keys().collect::<Vec<_>>(), "audit");
        Ok(())
    }

    async fn handle(&self, _: Action, _: &RequestScope, _: ControllerParams) -> ActionResult<()> {
        Ok(())
    }
}

pub fn module() -> ModuleDefinition {
    ModuleDefinition::new("audit").controller(ControllerDescriptor::new("audit", "/audit", |_| Ok(AuditController)))
}
