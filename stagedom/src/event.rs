use serde_json::Value;

use crate::element::NodeId;

/// Events that are delivered to their target only.
const NON_BUBBLING: &[&str] = &["focus", "blur", "mouseenter", "mouseleave"];

/// Whether an event with this name propagates to ancestors by default.
pub fn bubbles_by_default(name: &str) -> bool {
    !NON_BUBBLING.contains(&name)
}

/// A named event travelling through the document.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub name: String,
    /// Node the event was dispatched on.
    pub target: NodeId,
    /// Node whose listener is currently running. Equals `target` before dispatch.
    pub current_target: NodeId,
    /// Optional payload, e.g. a dropdown pair index.
    pub payload: Option<Value>,
    pub bubbles: bool,
}

impl Event {
    pub fn new(name: impl Into<String>, target: NodeId) -> Self {
        let name = name.into();
        Self {
            bubbles: bubbles_by_default(&name),
            name,
            target,
            current_target: target,
            payload: None,
        }
    }

    pub fn with_payload(mut self, payload: impl Into<Value>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    pub fn bubbles(mut self, bubbles: bool) -> Self {
        self.bubbles = bubbles;
        self
    }

    /// Payload interpreted as an index, if it is a non-negative integer.
    pub fn index(&self) -> Option<usize> {
        self.payload
            .as_ref()
            .and_then(Value::as_u64)
            .and_then(|n| usize::try_from(n).ok())
    }
}
