use paperframe::common::response::{GR_REQUEST_VALIDATION_FAILED, GR_RESOURCE_NOT_FOUND};
use paperframe::common::status::RS_OK;
use paperframe::prelude::*;
use serde_json::json;
use uuid::Uuid;

use super::model::{CreateWidgetRequest, Widget};
use super::repository::WidgetRepository;

pub struct WidgetController {
    repository: Arc<WidgetRepository>,
    acl: RouteAclTable,
}

impl WidgetController {
    pub fn descriptor() -> ControllerDescriptor {
        ControllerDescriptor::new("widget", "/widgets", |config: ControllerConfig| {
            let repository = config
                .open_collection("widget")?
                .driver::<WidgetRepository>()
                .ok_or_else(|| anyhow::anyhow!("widget collection has no memory implementation"))?;

            let mut acl = RouteAclTable::new();
            acl.insert(Action::Index, RouteAcl::PUBLIC);
            acl.insert(Action::Show, RouteAcl::PUBLIC);
            acl.insert(Action::Create, RouteAcl::PROTECTED);
            acl.insert(Action::Destroy, RouteAcl::PROTECTED);

            Ok(WidgetController { repository, acl })
        })
        .dependencies(["database"])
    }
}

#[async_trait]
impl Controller for WidgetController {
    fn capabilities(&self) -> Capabilities {
        Capabilities::new()
            .handler(Action::Index)
            .hooked(Action::Create)
            .handler(Action::Show)
            .handler(Action::Destroy)
    }

    fn route_acl(&self) -> Option<&RouteAclTable> {
        Some(&self.acl)
    }

    async fn before(&self, _: Action, _: &RequestScope, mut params: ControllerParams) -> ActionResult<ControllerParams> {
        let request: CreateWidgetRequest = serde_json::from_value(params.body.clone())
            .map_err(|e| GR_REQUEST_VALIDATION_FAILED.with_message(e.to_string()))?;
        if request.name.trim().is_empty() {
            return Err(GR_REQUEST_VALIDATION_FAILED.with_message("name must not be empty").into());
        }

        params.before = Some(json!({ "name": request.name.trim(), "price": request.price }));
        Ok(params)
    }

    async fn handle(&self, action: Action, scope: &RequestScope, params: ControllerParams) -> ActionResult<()> {
        match action {
            Action::Index => {
                scope.respond(StatusCode::OK, RS_OK, json!(self.repository.find_all()));
            }
            Action::Create => {
                let fields = params.before.unwrap_or_default();
                let widget = Widget {
                    id: Uuid::new_v4().to_string(),
                    name: fields["name"].as_str().unwrap_or_default().to_string(),
                    price: fields["price"].as_f64().unwrap_or_default(),
                };
                self.repository.save(&widget);
                scope.push_event_data("widgetId", json!(widget.id));
                scope.respond(StatusCode::CREATED, RS_OK, json!(widget));
            }
            Action::Show => {
                let id = params.parameters.get("widgetId").cloned().unwrap_or_default();
                let widget = self.repository.find_by_id(&id).ok_or(GR_RESOURCE_NOT_FOUND)?;
                scope.push_event_data("widgetId", json!(id));
                scope.respond(StatusCode::OK, RS_OK, json!(widget));
            }
            Action::Destroy => {
                let id = params.parameters.get("widgetId").cloned().unwrap_or_default();
                if !self.repository.delete(&id) {
                    return Err(GR_RESOURCE_NOT_FOUND.into());
                }
                scope.push_event_data("widgetId", json!(id));
            }
            Action::Update => return Err(ActionError::Fatal(anyhow::anyhow!("update is not implemented"))),
        }
        Ok(())
    }
}
