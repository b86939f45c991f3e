//! Native event forwarding

use serde_json::Value;
use std::sync::Arc;
use tracing::trace;

use super::{RegisteredEvent, Template, TemplateState};
use crate::config::EventConfig;
use crate::dom::{DomEvent, Element};

/// A native event forwarded by a template
#[derive(Debug, Clone)]
pub struct EventCallback {
    /// The native event
    pub event: DomEvent,
    /// Template whose binding fired
    pub template: Template,
    /// Selector the binding was registered for (`#id` or tag name for
    /// parent bindings)
    pub selector: String,
    /// Event detail, when the event carried one
    pub payload: Option<Value>,
}

impl Template {
    /// Bind the configured native events, replacing previous bindings
    ///
    /// A `true` event binds on the parent element and reports the parent's
    /// `#id` (or tag name) as selector. A selector map binds on every element
    /// under the parent matching each enabled selector, retrying with a `#`
    /// prefix when nothing matches. Selectors that match nothing are skipped.
    pub(crate) fn register_events(&self) {
        let mut state = self.inner.state.lock();
        remove_bindings(&mut state);
        if state.disposed {
            return;
        }
        let Some(parent) = state.parent.clone() else {
            return;
        };

        let mut registered = Vec::new();
        for (event_type, config) in &state.configuration.events {
            match config {
                EventConfig::Enabled(false) => {}
                EventConfig::Enabled(true) => {
                    let selector = parent
                        .id()
                        .map_or_else(|| parent.tag_name(), |id| format!("#{id}"));
                    registered.push(self.bind(&parent, event_type, selector));
                }
                EventConfig::Selectors(selectors) => {
                    for selector in selectors.iter().filter(|(_, on)| **on).map(|(s, _)| s) {
                        let mut reported = selector.clone();
                        let mut elements = parent.query_selector_all(selector);
                        if elements.is_empty() && !selector.starts_with('#') {
                            reported = format!("#{selector}");
                            elements = parent.query_selector_all(&reported);
                        }
                        for element in elements {
                            registered.push(self.bind(&element, event_type, reported.clone()));
                        }
                    }
                }
            }
        }

        trace!(template = %self.name(), bindings = registered.len(), "registered native events");
        state.registered_events = registered;
    }

    fn bind(&self, element: &Element, event_type: &str, selector: String) -> RegisteredEvent {
        let template = Arc::downgrade(&self.inner);
        let listener = element.add_event_listener(event_type, move |event: &DomEvent| {
            let Some(inner) = template.upgrade() else {
                return;
            };
            let template = Template { inner };
            template.inner.on_event_triggered.notify(&EventCallback {
                event: event.clone(),
                template: template.clone(),
                selector: selector.clone(),
                payload: event.detail().cloned(),
            });
        });
        RegisteredEvent {
            element: element.clone(),
            listener,
        }
    }
}

/// Remove every binding registered by a template
pub(super) fn remove_bindings(state: &mut TemplateState) {
    for binding in state.registered_events.drain(..) {
        binding.element.remove_event_listener(binding.listener);
    }
}
