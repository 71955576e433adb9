//! In-memory publish/subscribe with dotted topics.
//!
//! Topics look like `API.WIDGET.SHOW`. Subscription patterns may use `*` for
//! exactly one segment and `**` for any number of segments (including none),
//! so `API.WIDGET.*` sees every widget action and `API.**` sees everything the
//! router emits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Listener count per pattern above which subscriptions are reported.
pub const MAX_LISTENERS: usize = 512;

const TAP_CAPACITY: usize = 256;

/// Data staged by a controller during one request.
pub type EventDataTable = BTreeMap<String, Value>;

/// A topic of the form `SOURCE.RESOURCE.ACTION`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    pub fn new(source: &str, resource: &str, action: &str) -> Self {
        Self(format!(
            "{}.{}.{}",
            source.to_uppercase(),
            resource.to_uppercase(),
            action.to_uppercase()
        ))
    }

    /// Event id for a completed API action: `API.<RESOURCE>.<ACTION>`.
    pub fn api(resource: &str, action: &str) -> Self {
        Self::new("API", resource, action)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EventId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventPackage {
    pub data: EventDataTable,
    pub timestamp: DateTime<Utc>,
}

impl EventPackage {
    pub fn new(data: EventDataTable) -> Self {
        Self {
            data,
            timestamp: Utc::now(),
        }
    }
}

/// An emitted event as seen by taps.
#[derive(Debug, Clone)]
pub struct Event {
    pub id: EventId,
    pub package: EventPackage,
}

/// Something that reacts to emitted events.
///
/// Listeners run on their own task; an `Err` is logged and goes nowhere else.
#[async_trait]
pub trait EventListener: Send + Sync + 'static {
    async fn on_event(&self, event: &EventId, package: &EventPackage) -> anyhow::Result<()>;
}

/// A simple in-memory event bus
#[derive(Clone)]
pub struct EventBus {
    // Pattern -> listeners subscribed under it
    subscriptions: Arc<DashMap<String, Vec<Arc<dyn EventListener>>>>,
    tap: broadcast::Sender<Arc<Event>>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("patterns", &self.subscriptions.len())
            .finish_non_exhaustive()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (tap, _) = broadcast::channel(TAP_CAPACITY);
        Self {
            subscriptions: Arc::new(DashMap::new()),
            tap,
        }
    }

    /// Subscribe `listener` to every topic matching `pattern`.
    pub fn on(&self, pattern: impl Into<String>, listener: Arc<dyn EventListener>) {
        let pattern = pattern.into();
        let mut listeners = self.subscriptions.entry(pattern.clone()).or_default();
        listeners.push(listener);
        if listeners.len() > MAX_LISTENERS {
            tracing::warn!(
                pattern = %pattern,
                count = listeners.len(),
                "possible listener leak: more than {} listeners for one pattern",
                MAX_LISTENERS
            );
        }
    }

    /// Number of listeners whose pattern matches `topic`.
    pub fn listener_count(&self, topic: &str) -> usize {
        self.subscriptions
            .iter()
            .filter(|entry| topic_matches(entry.key(), topic))
            .map(|entry| entry.value().len())
            .sum()
    }

    /// Receive a copy of every emitted event, regardless of pattern.
    pub fn tap(&self) -> broadcast::Receiver<Arc<Event>> {
        self.tap.subscribe()
    }

    /// Emit an event. Matching listeners are spawned and not awaited; the
    /// return value is how many were notified.
    pub fn emit(&self, id: &EventId, package: EventPackage) -> usize {
        let listeners: Vec<Arc<dyn EventListener>> = self
            .subscriptions
            .iter()
            .filter(|entry| topic_matches(entry.key(), id.as_str()))
            .flat_map(|entry| entry.value().clone())
            .collect();

        let event = Arc::new(Event {
            id: id.clone(),
            package,
        });
        // No receivers is fine.
        let _ = self.tap.send(Arc::clone(&event));

        if listeners.is_empty() {
            return 0;
        }

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(event = %id, "no async runtime available, listeners not notified");
            return 0;
        };

        let notified = listeners.len();
        for listener in listeners {
            let event = Arc::clone(&event);
            runtime.spawn(async move {
                if let Err(err) = listener.on_event(&event.id, &event.package).await {
                    tracing::error!(event = %event.id, error = %format!("{err:#}"), "event listener failed");
                }
            });
        }

        tracing::debug!(event = %id, listeners = notified, "event emitted");
        notified
    }
}

/// Whether a dotted `topic` matches a subscription `pattern`.
pub fn topic_matches(pattern: &str, topic: &str) -> bool {
    let pattern: Vec<&str> = pattern.split('.').collect();
    let topic: Vec<&str> = topic.split('.').collect();
    segments_match(&pattern, &topic)
}

fn segments_match(pattern: &[&str], topic: &[&str]) -> bool {
    match pattern.split_first() {
        None => topic.is_empty(),
        Some((&"**", rest)) => (0..=topic.len()).any(|skip| segments_match(rest, &topic[skip..])),
        Some((head, rest)) => match topic.split_first() {
            Some((segment, remaining)) => {
                (*head == "*" || head == segment) && segments_match(rest, remaining)
            }
            None => false,
        },
    }
}
