//! Native document events

use serde_json::Value;

use super::Element;

/// Identifier of a registered event listener, unique per document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub(crate) u64);

/// An event dispatched through the document
///
/// Dispatch fills in `target` and, for each element on the bubbling path,
/// `current_target`.
#[derive(Debug, Clone)]
pub struct DomEvent {
    event_type: String,
    detail: Option<Value>,
    pub(crate) target: Option<Element>,
    pub(crate) current_target: Option<Element>,
}

impl DomEvent {
    /// Create an event of the given type (`click`, `pointerdown`, ...)
    #[must_use]
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            detail: None,
            target: None,
            current_target: None,
        }
    }

    /// Attach a payload, the equivalent of `CustomEvent.detail`
    #[must_use]
    pub fn with_detail(mut self, detail: Value) -> Self {
        self.detail = Some(detail);
        self
    }

    /// Event type
    #[must_use]
    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// Payload, if any
    #[must_use]
    pub const fn detail(&self) -> Option<&Value> {
        self.detail.as_ref()
    }

    /// Element the event was dispatched on
    #[must_use]
    pub const fn target(&self) -> Option<&Element> {
        self.target.as_ref()
    }

    /// Element whose listener is currently running
    #[must_use]
    pub const fn current_target(&self) -> Option<&Element> {
        self.current_target.as_ref()
    }
}
