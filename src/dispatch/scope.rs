use axum::http::StatusCode;
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::sync::{Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

use crate::common::Reply;
use crate::controller::Action;
use crate::messaging::{EventBus, EventDataTable, EventId};

/// Per-request context handed to before-hooks and handlers.
///
/// The identity fields are fixed for the request. Event data and the reply
/// are staged here and picked up by the dispatcher once the handler returns.
#[derive(Debug)]
pub struct RequestScope {
    pub request_id: Uuid,
    pub resource: String,
    pub action: Action,
    pub event_id: EventId,
    pub remote_addr: Option<SocketAddr>,
    pub user_agent: Option<String>,
    events: EventBus,
    staged: Mutex<EventDataTable>,
    reply: Mutex<Option<Reply>>,
}

impl RequestScope {
    pub fn new(resource: &str, action: Action, events: EventBus) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            resource: resource.to_string(),
            action,
            event_id: EventId::api(resource, action.as_ref()),
            remote_addr: None,
            user_agent: None,
            events,
            staged: Mutex::new(EventDataTable::new()),
            reply: Mutex::new(None),
        }
    }

    pub fn with_client(mut self, remote_addr: Option<SocketAddr>, user_agent: Option<String>) -> Self {
        self.remote_addr = remote_addr;
        self.user_agent = user_agent;
        self
    }

    /// The router's event bus, for publishing beyond the automatic event.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Stage `value` under `key` in the event emitted after the handler.
    pub fn push_event_data(&self, key: impl Into<String>, value: Value) {
        lock(&self.staged).insert(key.into(), value);
    }

    /// Take everything staged so far.
    pub fn read_event_data(&self) -> EventDataTable {
        std::mem::take(&mut *lock(&self.staged))
    }

    /// Answer with the envelope `{code, response, timestamp}` and record it as
    /// the `response` event data.
    pub fn respond(&self, status: StatusCode, code: i64, response: Value) {
        let reply = Reply::envelope(status, code, response);
        if let Some(envelope) = reply.envelope_body() {
            self.push_event_data(
                "response",
                json!({ "status": status.as_u16(), "body": envelope }),
            );
        }
        *lock(&self.reply) = Some(reply);
    }

    /// Answer with a prepared reply. Nothing is staged for the event.
    pub fn reply(&self, reply: Reply) {
        *lock(&self.reply) = Some(reply);
    }

    pub fn take_reply(&self) -> Option<Reply> {
        lock(&self.reply).take()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
