//! Turns a [`RouteTable`] into an axum router.

use axum::{
    Router,
    body::Bytes,
    extract::{ConnectInfo, FromRequestParts, Path, Query, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{MethodFilter, MethodRouter},
};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::Arc;

use super::RouteTable;
use crate::common::response::{GR_INTERNAL_ERROR, GR_REQUEST_VALIDATION_FAILED};
use crate::controller::{Parameters, RequestContext, Session};
use crate::dispatch::{Disposition, DispatchOutcome, Dispatcher};

/// Largest request body accepted, in bytes.
pub const BODY_LIMIT: usize = 2 * 1024 * 1024;

pub(crate) fn axum_router(table: Arc<RouteTable>, dispatcher: Arc<Dispatcher>) -> Router {
    let mut paths: Vec<(String, Vec<(MethodFilter, usize)>)> = Vec::new();
    let mut shapes: HashMap<String, String> = HashMap::new();
    let mut taken: HashSet<(String, String)> = HashSet::new();

    for (index, route) in table.routes().iter().enumerate() {
        if let Some(conflict) = route.template.axum_conflict() {
            tracing::warn!(uri = %route.uri, %conflict, "route cannot be served");
            continue;
        }

        let path = route.template.axum_path();

        // Two templates of the same shape but different parameter names
        // cannot coexist in axum; the earlier one answers.
        let shape = route.template.shape();
        match shapes.get(&shape) {
            Some(existing) if *existing != path => {
                tracing::warn!(uri = %route.uri, shadowed_by = %existing, "route shadowed");
                continue;
            }
            Some(_) => {}
            None => {
                shapes.insert(shape.clone(), path.clone());
            }
        }

        if !taken.insert((shape, route.verb.to_string())) {
            tracing::warn!(uri = %route.uri, verb = %route.verb, "route already bound");
            continue;
        }

        let Ok(filter) = MethodFilter::try_from(route.verb.clone()) else {
            tracing::warn!(uri = %route.uri, verb = %route.verb, "unsupported verb");
            continue;
        };

        for path in route.template.axum_paths() {
            match paths.iter_mut().find(|(p, _)| *p == path) {
                Some((_, methods)) => methods.push((filter, index)),
                None => paths.push((path, vec![(filter, index)])),
            }
        }
    }

    paths.into_iter().fold(Router::new(), |router, (path, methods)| {
        let methods = methods
            .into_iter()
            .fold(MethodRouter::new(), |methods, (filter, index)| {
                let table = Arc::clone(&table);
                let dispatcher = Arc::clone(&dispatcher);
                methods.on(filter, move |request: Request| serve(table, dispatcher, index, request))
            });
        router.route(&path, methods)
    })
}

async fn serve(table: Arc<RouteTable>, dispatcher: Arc<Dispatcher>, index: usize, request: Request) -> Response {
    let Some(route) = table.get(index) else {
        return GR_INTERNAL_ERROR.to_reply().into_response();
    };

    let (mut parts, body) = request.into_parts();

    let raw = if route.template.params().is_empty() {
        Parameters::new()
    } else {
        match Path::<Parameters>::from_request_parts(&mut parts, &()).await {
            Ok(Path(raw)) => raw,
            Err(rejection) => {
                return GR_REQUEST_VALIDATION_FAILED
                    .with_message(rejection.body_text())
                    .to_reply()
                    .into_response();
            }
        }
    };
    let parameters = table.coerce(route, &raw);

    let query = Query::<BTreeMap<String, String>>::try_from_uri(&parts.uri)
        .map(|Query(query)| query)
        .unwrap_or_default();

    let body = match axum::body::to_bytes(body, BODY_LIMIT).await {
        Ok(bytes) => match parse_body(&bytes) {
            Some(body) => body,
            None => {
                return GR_REQUEST_VALIDATION_FAILED
                    .with_message("Request body is not valid JSON.")
                    .to_reply()
                    .into_response();
            }
        },
        Err(err) => {
            tracing::error!(error = %err, "failed to read request body");
            return GR_REQUEST_VALIDATION_FAILED
                .with_message("Request body could not be read.")
                .to_reply()
                .into_response();
        }
    };

    let request = RequestContext {
        method: parts.method,
        path: parts.uri.path().to_string(),
        query,
        parameters,
        body,
        session: parts.extensions.get::<Session>().map(|session| session.0.clone()),
        remote_addr: parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr),
        headers: parts.headers,
    };

    finalize(dispatcher.dispatch(route, request).await)
}

fn parse_body(bytes: &Bytes) -> Option<Value> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Some(Value::Null);
    }
    serde_json::from_slice(bytes).ok()
}

fn finalize(outcome: DispatchOutcome) -> Response {
    if let Some(reply) = outcome.reply {
        return reply.into_response();
    }

    match outcome.disposition {
        Disposition::Success => StatusCode::NO_CONTENT.into_response(),
        Disposition::Rejected { reason, .. } => reason.to_reply().into_response(),
        Disposition::Fatal { .. } => GR_INTERNAL_ERROR.to_reply().into_response(),
    }
}
