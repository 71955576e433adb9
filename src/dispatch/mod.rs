//! Per-request orchestration.
//!
//! A request moves through `HeaderCheck -> BeforeHook -> Handler -> EventEmit`.
//! Any stage can stop it; the dispatcher records where and why and leaves
//! the wire to the HTTP layer.

mod headers;
mod scope;

pub use headers::RequiredHeaders;
pub use scope::RequestScope;

use axum::http::StatusCode;
use strum_macros::Display;
use tracing::Instrument;
use uuid::Uuid;

use crate::common::response::GR_REQUEST_VALIDATION_FAILED;
use crate::common::{GenericResponse, Reply};
use crate::controller::{ActionError, ControllerParams, RequestContext};
use crate::messaging::{EventBus, EventId, EventPackage};
use crate::routing::BoundRoute;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Stage {
    HeaderCheck,
    BeforeHook,
    Handler,
}

/// How a dispatch ended.
#[derive(Debug)]
pub enum Disposition {
    Success,
    /// A structured refusal.
    Rejected { stage: Stage, reason: GenericResponse },
    /// An unexpected error.
    Fatal { stage: Stage, error: anyhow::Error },
}

#[derive(Debug)]
pub struct DispatchOutcome {
    pub request_id: Uuid,
    pub event_id: EventId,
    pub disposition: Disposition,
    /// What the controller (or the header check) staged as the answer.
    pub reply: Option<Reply>,
}

impl DispatchOutcome {
    pub fn succeeded(&self) -> bool {
        matches!(self.disposition, Disposition::Success)
    }
}

/// Runs bound routes.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    events: EventBus,
    headers: RequiredHeaders,
}

impl Dispatcher {
    pub fn new(events: EventBus, prefix: &str) -> Self {
        Self {
            events,
            headers: RequiredHeaders::new(prefix),
        }
    }

    pub fn required_headers(&self) -> &RequiredHeaders {
        &self.headers
    }

    pub async fn dispatch(&self, route: &BoundRoute, request: RequestContext) -> DispatchOutcome {
        let scope = RequestScope::new(&route.resource, route.action, self.events.clone())
            .with_client(request.remote_addr, request.user_agent().map(str::to_string));
        let span = tracing::debug_span!(
            "dispatch",
            request_id = %scope.request_id,
            resource = %route.resource,
            action = %route.action,
        );

        let disposition = self.run(route, &scope, request).instrument(span).await;

        DispatchOutcome {
            request_id: scope.request_id,
            event_id: scope.event_id.clone(),
            disposition,
            reply: scope.take_reply(),
        }
    }

    async fn run(&self, route: &BoundRoute, scope: &RequestScope, request: RequestContext) -> Disposition {
        if let Err(message) = self.headers.check(&request.headers, Some(&route.acl)) {
            tracing::error!(%message, "request rejected");
            scope.reply(Reply::text(StatusCode::BAD_REQUEST, message.clone()));
            return Disposition::Rejected {
                stage: Stage::HeaderCheck,
                reason: GR_REQUEST_VALIDATION_FAILED.with_message(message),
            };
        }

        tracing::debug!(
            remote_addr = ?scope.remote_addr,
            user_agent = ?scope.user_agent,
            method = %route.verb,
            uri = %route.uri,
            "calling action"
        );

        let mut params = ControllerParams::from_request(&request);
        if tracing::enabled!(tracing::Level::DEBUG) {
            tracing::debug!(params = %serde_json::to_string(&params).unwrap_or_default(), "controller parameters");
        }

        if route.slot.has_before_hook() {
            match route.controller.before(route.action, scope, params).await {
                Ok(transformed) => params = transformed,
                Err(err) => return failed(Stage::BeforeHook, err),
            }
        }

        if let Err(err) = route.controller.handle(route.action, scope, params).await {
            return failed(Stage::Handler, err);
        }

        let data = scope.read_event_data();
        self.events.emit(&scope.event_id, EventPackage::new(data));

        Disposition::Success
    }
}

fn failed(stage: Stage, err: ActionError) -> Disposition {
    match err {
        ActionError::Rejected(reason) => {
            tracing::error!(%stage, %reason, "request rejected");
            Disposition::Rejected { stage, reason }
        }
        ActionError::Fatal(error) => {
            tracing::error!(%stage, error = %format!("{error:#}"), "request failed");
            Disposition::Fatal { stage, error }
        }
    }
}
