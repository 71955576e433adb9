use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, header::USER_AGENT};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::net::SocketAddr;

/// Path parameters captured for a request, e.g. `widgetId -> "42"`.
pub type Parameters = BTreeMap<String, String>;

/// Verified session data, attached to the request by the authorization gate.
#[derive(Debug, Clone, PartialEq)]
pub struct Session(pub Value);

/// Everything the transport knows about an inbound request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub query: BTreeMap<String, String>,
    pub parameters: Parameters,
    pub body: Value,
    pub session: Option<Value>,
    pub remote_addr: Option<SocketAddr>,
}

impl RequestContext {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            query: BTreeMap::new(),
            parameters: Parameters::new(),
            body: Value::Null,
            session: None,
            remote_addr: None,
        }
    }

    /// Add a header. Invalid names or values are ignored.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (HeaderName::try_from(name), HeaderValue::try_from(value)) {
            self.headers.insert(name, value);
        }
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    pub fn parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = body;
        self
    }

    pub fn session(mut self, session: Value) -> Self {
        self.session = Some(session);
        self
    }

    pub fn remote_addr(mut self, addr: SocketAddr) -> Self {
        self.remote_addr = Some(addr);
        self
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.headers.get(USER_AGENT).and_then(|v| v.to_str().ok())
    }
}

/// The value handed to before-hooks and handlers.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ControllerParams {
    pub session: Option<Value>,
    /// Free slot for before-hooks to pass data on to the handler.
    pub before: Option<Value>,
    pub parameters: Parameters,
    pub query: BTreeMap<String, String>,
    pub headers: BTreeMap<String, String>,
    pub body: Value,
}

impl ControllerParams {
    pub fn from_request(request: &RequestContext) -> Self {
        // Header names in a HeaderMap are already lowercase.
        let headers = request
            .headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();

        Self {
            session: request.session.clone(),
            before: None,
            parameters: request.parameters.clone(),
            query: request.query.clone(),
            headers,
            body: request.body.clone(),
        }
    }
}
