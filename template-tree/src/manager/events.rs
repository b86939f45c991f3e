//! Callback registration for forwarded native events

use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::trace;

use crate::observable::{Observable, Subscription};
use crate::template::EventCallback;

/// Handle identifying one registered callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallbackId(u64);

type Handler = Arc<dyn Fn(&EventCallback) + Send + Sync>;

struct Registration {
    id: CallbackId,
    template: String,
    event_type: Option<String>,
    selector: Option<String>,
    handler: Handler,
}

impl Registration {
    fn matches(&self, data: &EventCallback) -> bool {
        self.template == data.template.name()
            && self.event_type.as_deref().is_none_or(|t| t == data.event.event_type())
            && self.selector.as_deref().is_none_or(|s| s == data.selector)
    }
}

struct EventManagerInner {
    registrations: RwLock<Vec<Registration>>,
    next_id: AtomicU64,
    source: Observable<EventCallback>,
    subscription: Mutex<Option<Subscription>>,
}

/// Routes forwarded native events to callbacks registered per template
///
/// A callback registered without an event type or selector receives every
/// event of its template.
#[derive(Clone)]
pub struct EventManager {
    inner: Arc<EventManagerInner>,
}

impl fmt::Debug for EventManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventManager")
            .field("callbacks", &self.callback_count())
            .finish()
    }
}

impl EventManager {
    /// Listen to `source` for triggered events
    #[must_use]
    pub fn new(source: &Observable<EventCallback>) -> Self {
        let manager = Self {
            inner: Arc::new(EventManagerInner {
                registrations: RwLock::new(Vec::new()),
                next_id: AtomicU64::new(0),
                source: source.clone(),
                subscription: Mutex::new(None),
            }),
        };
        manager.listen();
        manager
    }

    /// Subscribe to the source unless already subscribed
    fn listen(&self) {
        let mut subscription = self.inner.subscription.lock();
        if subscription.is_some() {
            return;
        }
        let weak: Weak<EventManagerInner> = Arc::downgrade(&self.inner);
        *subscription = Some(self.inner.source.subscribe(move |data: &EventCallback| {
            if let Some(inner) = weak.upgrade() {
                Self { inner }.dispatch(data);
            }
        }));
    }

    /// Register `callback` for events of `template`
    ///
    /// `event_type` and `selector` narrow the events delivered; `None`
    /// matches everything. Registering after [`EventManager::dispose`]
    /// resumes listening to the source.
    pub fn register_callback<F>(
        &self,
        template: &str,
        callback: F,
        event_type: Option<&str>,
        selector: Option<&str>,
    ) -> CallbackId
    where
        F: Fn(&EventCallback) + Send + Sync + 'static,
    {
        self.listen();
        let id = CallbackId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        self.inner.registrations.write().push(Registration {
            id,
            template: template.to_string(),
            event_type: event_type.map(ToString::to_string),
            selector: selector.map(ToString::to_string),
            handler: Arc::new(callback),
        });
        trace!(template, ?event_type, ?selector, "event callback registered");
        id
    }

    /// Remove one callback; returns whether it was registered
    pub fn unregister_callback(&self, id: CallbackId) -> bool {
        let mut registrations = self.inner.registrations.write();
        let before = registrations.len();
        registrations.retain(|registration| registration.id != id);
        registrations.len() != before
    }

    /// Remove the callbacks of `template` registered with exactly these
    /// filters; a `None` argument matches any value
    ///
    /// Returns how many callbacks were removed.
    pub fn unregister_matching(&self, template: &str, event_type: Option<&str>, selector: Option<&str>) -> usize {
        let mut registrations = self.inner.registrations.write();
        let before = registrations.len();
        registrations.retain(|registration| {
            let matches = registration.template == template
                && event_type.is_none_or(|t| registration.event_type.as_deref() == Some(t))
                && selector.is_none_or(|s| registration.selector.as_deref() == Some(s));
            !matches
        });
        before - registrations.len()
    }

    /// Number of registered callbacks
    #[must_use]
    pub fn callback_count(&self) -> usize {
        self.inner.registrations.read().len()
    }

    /// Drop every callback and stop listening
    pub fn dispose(&self) {
        self.inner.registrations.write().clear();
        if let Some(subscription) = self.inner.subscription.lock().take() {
            self.inner.source.unsubscribe(subscription);
        }
    }

    fn dispatch(&self, data: &EventCallback) {
        let handlers: Vec<Handler> = self
            .inner
            .registrations
            .read()
            .iter()
            .filter(|registration| registration.matches(data))
            .map(|registration| Arc::clone(&registration.handler))
            .collect();
        for handler in handlers {
            handler(data);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TemplateConfig;
    use crate::dom::{Document, DomEvent};
    use crate::loader::MemoryLoader;
    use crate::template::{Template, TemplateContext};
    use std::sync::atomic::AtomicUsize;

    fn callback(template: &Template, event_type: &str, selector: &str) -> EventCallback {
        EventCallback {
            event: DomEvent::new(event_type),
            template: template.clone(),
            selector: selector.to_string(),
            payload: None,
        }
    }

    fn template(name: &str) -> Template {
        let context = TemplateContext::new(Document::new(), Arc::new(MemoryLoader::new()));
        Template::new(name, TemplateConfig::default(), &context)
    }

    fn counting(manager: &EventManager, name: &str, event_type: Option<&str>, selector: Option<&str>) -> Arc<AtomicUsize> {
        let count = Arc::new(AtomicUsize::new(0));
        let hits = Arc::clone(&count);
        manager.register_callback(
            name,
            move |_: &EventCallback| {
                hits.fetch_add(1, Ordering::SeqCst);
            },
            event_type,
            selector,
        );
        count
    }

    #[test]
    fn test_filters() {
        let source = Observable::new();
        let manager = EventManager::new(&source);
        let nav = template("navBar");

        let all = counting(&manager, "navBar", None, None);
        let clicks = counting(&manager, "navBar", Some("click"), None);
        let play = counting(&manager, "navBar", Some("click"), Some("#play"));
        let other = counting(&manager, "overlay", None, None);

        source.notify(&callback(&nav, "click", "#play"));
        source.notify(&callback(&nav, "click", "#stop"));
        source.notify(&callback(&nav, "pointerdown", "#play"));

        assert_eq!(all.load(Ordering::SeqCst), 3);
        assert_eq!(clicks.load(Ordering::SeqCst), 2);
        assert_eq!(play.load(Ordering::SeqCst), 1);
        assert_eq!(other.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_unregister() {
        let source = Observable::new();
        let manager = EventManager::new(&source);
        let id = manager.register_callback("main", |_: &EventCallback| {}, None, None);
        manager.register_callback("main", |_: &EventCallback| {}, Some("click"), Some(".btn"));
        manager.register_callback("main", |_: &EventCallback| {}, Some("click"), Some("#go"));
        manager.register_callback("main", |_: &EventCallback| {}, Some("keyup"), None);

        assert!(manager.unregister_callback(id));
        assert!(!manager.unregister_callback(id));
        assert_eq!(manager.unregister_matching("main", Some("click"), None), 2);
        assert_eq!(manager.unregister_matching("other", None, None), 0);
        assert_eq!(manager.callback_count(), 1);
    }

    #[test]
    fn test_dispose_stops_listening() {
        let source = Observable::new();
        let manager = EventManager::new(&source);
        let hits = counting(&manager, "main", None, None);
        assert_eq!(source.len(), 1);

        manager.dispose();
        assert!(source.is_empty());
        assert_eq!(manager.callback_count(), 0);

        source.notify(&callback(&template("main"), "click", "MAIN"));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_register_after_dispose_resumes_listening() {
        let source = Observable::new();
        let manager = EventManager::new(&source);
        manager.dispose();

        let hits = counting(&manager, "main", None, None);
        counting(&manager, "main", Some("click"), None);
        assert_eq!(source.len(), 1);

        source.notify(&callback(&template("main"), "click", "MAIN"));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
