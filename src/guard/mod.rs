//! Route authorization.
//!
//! The gate maps an inbound request back to the `{resource, action}` it will
//! be dispatched to and decides whether the configured [`TokenVerifier`] has
//! to run. Only an explicit `protected: false` entry in the controllers'
//! ACLs skips verification; an action without an entry is verified.

mod layer;

pub use layer::{authorization, authorization_errors};

use async_trait::async_trait;
use axum::{
    http::{Method, StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

use crate::common::Reply;
use crate::common::status::RS_TOKEN_INVALID;
use crate::controller::{Action, RoutesAcl, Session};
use crate::routing::{RouteTable, routing_table};

/// A rejection from a [`TokenVerifier`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct VerifierError {
    pub status: StatusCode,
    pub message: String,
}

impl VerifierError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }
}

/// Marks a response as produced by a verifier rejection, so
/// [`authorization_errors`] can tell it apart from a controller's own reply.
#[derive(Debug, Clone, Copy)]
pub struct VerifierRejection(pub StatusCode);

impl IntoResponse for VerifierError {
    fn into_response(self) -> Response {
        let mut response = (self.status, self.message).into_response();
        response.extensions_mut().insert(VerifierRejection(self.status));
        response
    }
}

/// Checks the credentials on a request, e.g. a bearer JWT.
///
/// `Ok(Some(claims))` admits the request and attaches the claims as its
/// [`Session`]; `Ok(None)` admits it without a session.
#[async_trait]
pub trait TokenVerifier: Send + Sync + 'static {
    async fn verify(&self, secret: &str, parts: &Parts) -> Result<Option<Value>, VerifierError>;
}

/// The gate's verdict for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// No verifier configured: everything passes.
    Unconfigured,
    /// No bound route matches; left to the router.
    Unmatched,
    /// The action is explicitly unprotected.
    Unprotected { resource: String, action: Action },
    /// The verifier must run. `action` is `None` when no conventional action
    /// fits the matched route.
    Verify { resource: String, action: Option<Action> },
}

#[derive(Clone)]
pub struct AuthorizationGate {
    routes: Arc<RouteTable>,
    routes_acl: Arc<RoutesAcl>,
    verifier: Option<(Arc<dyn TokenVerifier>, Arc<str>)>,
}

impl AuthorizationGate {
    pub fn new(routes: Arc<RouteTable>, routes_acl: RoutesAcl) -> Self {
        Self {
            routes,
            routes_acl: Arc::new(routes_acl),
            verifier: None,
        }
    }

    pub fn with_verifier(mut self, verifier: Arc<dyn TokenVerifier>, secret: impl Into<Arc<str>>) -> Self {
        self.verifier = Some((verifier, secret.into()));
        self
    }

    pub fn has_verifier(&self) -> bool {
        self.verifier.is_some()
    }

    pub fn decide(&self, method: &Method, path: &str) -> GateDecision {
        if self.verifier.is_none() {
            return GateDecision::Unconfigured;
        }

        let Some((_, route)) = self.routes.resolve(method, path) else {
            return GateDecision::Unmatched;
        };

        let resource = route.resource.clone();
        let action = routing_table(&resource)
            .into_iter()
            .find(|entry| entry.verb == *method && route.uri.ends_with(&entry.suffix))
            .map(|entry| entry.name);

        let explicitly_public = action
            .and_then(|action| self.routes_acl.get(&resource)?.get(&action))
            .is_some_and(|acl| !acl.protected);

        match action {
            Some(action) if explicitly_public => GateDecision::Unprotected { resource, action },
            action => GateDecision::Verify { resource, action },
        }
    }

    /// Decide, run the verifier when needed and attach the resulting session.
    pub async fn admit(&self, parts: &mut Parts) -> Result<GateDecision, VerifierError> {
        let decision = self.decide(&parts.method, parts.uri.path());

        if let GateDecision::Verify { resource, action } = &decision {
            if let Some((verifier, secret)) = &self.verifier {
                tracing::debug!(%resource, action = ?action, "verifying request");
                if let Some(claims) = verifier.verify(secret, parts).await? {
                    parts.extensions.insert(Session(claims));
                }
            }
        }

        Ok(decision)
    }
}

/// The reply for a rejected token: HTTP 401 with
/// `{code: RS_TOKEN_INVALID, response: "Invalid token", timestamp}`.
pub fn invalid_token() -> Reply {
    Reply::envelope(
        StatusCode::UNAUTHORIZED,
        RS_TOKEN_INVALID,
        Value::String("Invalid token".to_string()),
    )
}

/// Translate a verifier rejection: `401` becomes [`invalid_token`], anything
/// else is handed back unchanged.
pub fn translate_verifier_error(err: VerifierError) -> Result<Reply, VerifierError> {
    if err.status == StatusCode::UNAUTHORIZED {
        Ok(invalid_token())
    } else {
        Err(err)
    }
}
