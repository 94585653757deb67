use anyhow::Result;
use std::sync::Arc;

use crate::{Config, Node};

/// A widget hosted on the dashboard.
///
/// The host calls `on_start` once, `on_render` whenever it wants a fresh
/// fragment, and `on_notify` for every notification broadcast to modules.
pub trait HostModule: Send {
    /// Unique identifier for this module
    fn id(&self) -> &str;

    /// Human-readable name
    fn name(&self) -> &str;

    /// Start the module with the given context
    fn on_start(&mut self, ctx: &ModuleContext) -> Result<()>;

    /// Produce the module's current render tree
    fn on_render(&self) -> Node;

    /// Receive a notification sent by the host or another module
    fn on_notify(&mut self, notification: &Notification);
}

/// Context provided to modules when they start
pub struct ModuleContext {
    pub config: Arc<Config>,
}

impl ModuleContext {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }
}

/// Notifications the host broadcasts to modules
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// All modules have produced their first fragment
    DomObjectsCreated,
    /// Indoor temperature reading from a sensor module
    IndoorTemperature(f64),
    /// Anything else, passed through by name
    Other {
        name: String,
        payload: serde_json::Value,
    },
}

impl Notification {
    /// Parse a `NAME [payload]` line as sent on the host's control input.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let (name, payload) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (line, ""),
        };

        match name {
            "DOM_OBJECTS_CREATED" => Some(Self::DomObjectsCreated),
            "INDOOR_TEMPERATURE" => payload.parse().ok().map(Self::IndoorTemperature),
            _ => Some(Self::Other {
                name: name.to_string(),
                payload: serde_json::from_str(payload)
                    .unwrap_or_else(|_| serde_json::Value::String(payload.to_string())),
            }),
        }
    }
}
