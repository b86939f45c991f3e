//! Templates
//!
//! A [`Template`] owns the lifecycle of one named unit of markup: it resolves
//! its content once, compiles it with its parameters, attaches the result to
//! a parent element, toggles its visibility, forwards native events and
//! finally releases everything on disposal.
//!
//! ```text
//! Constructed -> ContentPending -> Loaded -> Attached <-> Shown/Hidden -> Disposed
//! ```
//!
//! Attaching is split in two phases. [`Template::attach`] inserts the markup
//! synchronously; [`Template::finalize_attach`] binds events and notifies
//! `on_appended`. [`Template::append_to`] runs the second phase on a later
//! scheduler tick, so sibling and child templates inserted in the same pass
//! are in the document before selectors are queried.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use template_tree::config::TemplateConfig;
//! use template_tree::dom::Document;
//! use template_tree::loader::MemoryLoader;
//! use template_tree::template::{Template, TemplateContext};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let document = Document::new();
//! let context = TemplateContext::new(document.clone(), Arc::new(MemoryLoader::new()));
//! let config = TemplateConfig::inline("<p>{{greeting}}</p>").with_param("greeting", "hello");
//!
//! let template = Template::new("greeter", config, &context);
//! template.load().await?;
//! template.attach(&document.body(), false);
//! template.finalize_attach();
//!
//! assert_eq!(document.body().inner_html(), "<p>hello</p>");
//! # Ok(())
//! # }
//! ```

mod compiler;
mod content;
mod events;
mod helpers;
mod merge;
mod naming;

pub use compiler::{CompileError, TemplateCompiler, NO_ESCAPE_PARAM};
pub use events::EventCallback;
pub use merge::deep_merge;
pub use naming::{name_to_tag, tag_to_name};

use futures_util::future::BoxFuture;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::TemplateConfig;
use crate::dom::{Document, Element, Fragment, ListenerId, NodeId};
use crate::error::TemplateError;
use crate::loader::{CancellationToken, FileLoader};
use crate::observable::Observable;

/// Custom show/hide strategy
///
/// Receives the template and completes when the transition is done.
pub type VisibilityFn = Box<dyn FnOnce(Template) -> BoxFuture<'static, ()> + Send>;

/// Collaborators shared by every template of a manager
#[derive(Clone)]
pub struct TemplateContext {
    document: Document,
    loader: Arc<dyn FileLoader>,
    compiler: TemplateCompiler,
}

impl fmt::Debug for TemplateContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateContext")
            .field("document", &self.document)
            .finish_non_exhaustive()
    }
}

impl TemplateContext {
    /// Context rendering into `document` and loading through `loader`
    #[must_use]
    pub fn new(document: Document, loader: Arc<dyn FileLoader>) -> Self {
        Self {
            document,
            loader,
            compiler: TemplateCompiler::new(),
        }
    }

    /// Use a specific compiler
    #[must_use]
    pub fn with_compiler(mut self, compiler: TemplateCompiler) -> Self {
        self.compiler = compiler;
        self
    }

    /// Target document
    #[must_use]
    pub const fn document(&self) -> &Document {
        &self.document
    }
}

/// Compiled markup ready for insertion
#[derive(Debug, Clone)]
enum Rendered {
    /// Strictly parsed markup; emptied by the first attach
    Fragment(Fragment),
    /// Permissive fallback: one element named after the template
    Wrapper(Element),
}

struct RegisteredEvent {
    element: Element,
    listener: ListenerId,
}

struct TemplateState {
    configuration: TemplateConfig,
    params_version: u64,
    html_template: Option<String>,
    raw_html: String,
    rendered: Option<Rendered>,
    added_nodes: Vec<NodeId>,
    parent: Option<Element>,
    is_loaded: bool,
    is_shown: bool,
    is_in_html_tree: bool,
    is_showing: bool,
    is_hiding: bool,
    disposed: bool,
    load_requests: Vec<CancellationToken>,
    registered_events: Vec<RegisteredEvent>,
}

struct TemplateInner {
    name: String,
    document: Document,
    loader: Arc<dyn FileLoader>,
    compiler: TemplateCompiler,
    state: Mutex<TemplateState>,
    on_loaded: Observable<Template>,
    on_appended: Observable<Template>,
    on_state_change: Observable<Template>,
    on_event_triggered: Observable<EventCallback>,
    on_params_updated: Observable<Template>,
    on_html_rendered: Observable<Template>,
}

/// One named template
///
/// Cloning is cheap: clones are handles to the same template.
#[derive(Clone)]
pub struct Template {
    inner: Arc<TemplateInner>,
}

impl PartialEq for Template {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Template {}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("Template")
            .field("name", &self.inner.name)
            .field("is_loaded", &state.is_loaded)
            .field("is_shown", &state.is_shown)
            .field("is_in_html_tree", &state.is_in_html_tree)
            .field("attached", &state.parent.is_some())
            .finish()
    }
}

impl Template {
    /// Create a template; nothing is loaded until [`Template::load`]
    pub fn new(name: impl Into<String>, configuration: TemplateConfig, context: &TemplateContext) -> Self {
        Self {
            inner: Arc::new(TemplateInner {
                name: name.into(),
                document: context.document.clone(),
                loader: Arc::clone(&context.loader),
                compiler: context.compiler.clone(),
                state: Mutex::new(TemplateState {
                    configuration,
                    params_version: 0,
                    html_template: None,
                    raw_html: String::new(),
                    rendered: None,
                    added_nodes: Vec::new(),
                    parent: None,
                    is_loaded: false,
                    is_shown: false,
                    is_in_html_tree: false,
                    is_showing: false,
                    is_hiding: false,
                    disposed: false,
                    load_requests: Vec::new(),
                    registered_events: Vec::new(),
                }),
                on_loaded: Observable::new(),
                on_appended: Observable::new(),
                on_state_change: Observable::new(),
                on_event_triggered: Observable::new(),
                on_params_updated: Observable::new(),
                on_html_rendered: Observable::new(),
            }),
        }
    }

    /// Template name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Document the template renders into
    #[must_use]
    pub fn document(&self) -> &Document {
        &self.inner.document
    }

    /// Current configuration, including the latest parameters
    #[must_use]
    pub fn configuration(&self) -> TemplateConfig {
        self.inner.state.lock().configuration.clone()
    }

    /// Current parameters
    #[must_use]
    pub fn params(&self) -> Value {
        Value::Object(self.inner.state.lock().configuration.params.clone())
    }

    /// Number of parameter updates applied so far
    #[must_use]
    pub fn params_version(&self) -> u64 {
        self.inner.state.lock().params_version
    }

    /// Markup produced by the last successful compile
    #[must_use]
    pub fn raw_html(&self) -> String {
        self.inner.state.lock().raw_html.clone()
    }

    /// Element the template is attached to
    #[must_use]
    pub fn parent(&self) -> Option<Element> {
        self.inner.state.lock().parent.clone()
    }

    /// Whether the initial load completed
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.inner.state.lock().is_loaded
    }

    /// Whether the last completed visibility change was a show
    ///
    /// This tracks [`Template::show`] and [`Template::hide`], not actual
    /// on-screen visibility.
    #[must_use]
    pub fn is_shown(&self) -> bool {
        self.inner.state.lock().is_shown
    }

    /// Whether the manager placed this template in its containment tree
    #[must_use]
    pub fn is_in_html_tree(&self) -> bool {
        self.inner.state.lock().is_in_html_tree
    }

    pub(crate) fn set_in_html_tree(&self, in_tree: bool) {
        self.inner.state.lock().is_in_html_tree = in_tree;
    }

    /// Whether [`Template::dispose`] has run
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.inner.state.lock().disposed
    }

    /// Number of native event bindings currently registered
    #[must_use]
    pub fn registered_event_count(&self) -> usize {
        self.inner.state.lock().registered_events.len()
    }

    /// Fired once when the initial load completes
    #[must_use]
    pub fn on_loaded(&self) -> &Observable<Self> {
        &self.inner.on_loaded
    }

    /// Fired after events are bound following an attach
    #[must_use]
    pub fn on_appended(&self) -> &Observable<Self> {
        &self.inner.on_appended
    }

    /// Fired when a show or hide completes
    #[must_use]
    pub fn on_state_change(&self) -> &Observable<Self> {
        &self.inner.on_state_change
    }

    /// Fired when a bound native event triggers
    #[must_use]
    pub fn on_event_triggered(&self) -> &Observable<EventCallback> {
        &self.inner.on_event_triggered
    }

    /// Fired after every parameter update
    #[must_use]
    pub fn on_params_updated(&self) -> &Observable<Self> {
        &self.inner.on_params_updated
    }

    /// Fired synchronously when markup is inserted into a parent
    #[must_use]
    pub fn on_html_rendered(&self) -> &Observable<Self> {
        &self.inner.on_html_rendered
    }

    /// Resolve the content and compile it
    ///
    /// Runs once: later calls after a successful load return immediately,
    /// and of several overlapping calls only the first to finish stores its
    /// result and notifies `on_loaded`.
    ///
    /// # Errors
    ///
    /// - [`TemplateError::ContentResolution`] if the content cannot be produced
    /// - [`TemplateError::Compile`] if the markup cannot be rendered
    /// - [`TemplateError::Cancelled`] if the template is disposed mid-load; no
    ///   notification is emitted in that case
    /// - [`TemplateError::Disposed`] if the template was already disposed
    pub async fn load(&self) -> Result<(), TemplateError> {
        let configuration = {
            let state = self.inner.state.lock();
            if state.disposed {
                return Err(TemplateError::Disposed(self.name().to_string()));
            }
            if state.is_loaded {
                return Ok(());
            }
            state.configuration.clone()
        };

        let markup = self.resolve_content(&configuration).await?;
        let (raw_html, rendered) = self.render(&markup, &configuration.params)?;

        {
            let mut state = self.inner.state.lock();
            if state.disposed {
                return Err(TemplateError::Cancelled(self.name().to_string()));
            }
            // an overlapping load finished first
            if state.is_loaded {
                return Ok(());
            }
            state.html_template = Some(markup);
            state.raw_html = raw_html;
            state.rendered = Some(rendered);
            state.is_loaded = true;
            state.is_shown = true;
        }

        debug!(template = %self.name(), "template loaded");
        self.inner.on_loaded.notify(self);
        Ok(())
    }

    /// Compile `markup`, then parse it strictly, falling back to a wrapper
    /// element holding the permissively parsed markup
    fn render(&self, markup: &str, params: &Map<String, Value>) -> Result<(String, Rendered), TemplateError> {
        let raw_html = self
            .inner
            .compiler
            .compile(markup, &Value::Object(params.clone()))
            .map_err(|source| TemplateError::Compile {
                name: self.name().to_string(),
                source,
            })?;

        let rendered = match self.inner.document.parse_fragment(&raw_html) {
            Ok(fragment) => Rendered::Fragment(fragment),
            Err(err) => {
                debug!(template = %self.name(), error = %err, "markup is not well formed; wrapping it");
                let wrapper = self.inner.document.create_element(&self.name().to_lowercase());
                wrapper.set_inner_html(&raw_html);
                Rendered::Wrapper(wrapper)
            }
        };
        Ok((raw_html, rendered))
    }

    /// Update the parameters and recompile
    ///
    /// With `append`, `params` is deep-merged into the current parameters;
    /// otherwise it replaces them. The original markup is recompiled (never
    /// re-fetched), and an attached template is re-attached to its parent
    /// with its event bindings renewed. Before the initial load only the
    /// parameters are stored.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Compile`] if the new parameters fail to
    /// render; the previous parameters and markup are kept. Returns
    /// [`TemplateError::Disposed`] after disposal.
    pub fn update_params(&self, params: Map<String, Value>, append: bool) -> Result<(), TemplateError> {
        let (current, markup) = {
            let state = self.inner.state.lock();
            if state.disposed {
                return Err(TemplateError::Disposed(self.name().to_string()));
            }
            (state.configuration.params.clone(), state.html_template.clone())
        };

        let merged = if append {
            match deep_merge(&Value::Object(current), &Value::Object(params)) {
                Value::Object(merged) => merged,
                _ => Map::new(),
            }
        } else {
            params
        };

        let rendered = markup
            .map(|markup| self.render(&markup, &merged))
            .transpose()?;

        let parent = {
            let mut state = self.inner.state.lock();
            state.configuration.params = merged;
            state.params_version += 1;
            if let Some((raw_html, rendered)) = rendered {
                state.raw_html = raw_html;
                state.rendered = Some(rendered);
            }
            state.parent.clone().filter(|_| state.html_template.is_some())
        };

        if let Some(parent) = parent {
            self.append_to(&parent, true);
        }
        self.inner.on_params_updated.notify(self);
        Ok(())
    }

    /// Recompile with the current parameters
    ///
    /// # Errors
    ///
    /// See [`Template::update_params`].
    pub fn redraw(&self) -> Result<(), TemplateError> {
        self.update_params(Map::new(), true)
    }

    /// Child template names referenced by this template's markup
    ///
    /// Every descendant element tag, converted to a template name, in
    /// document order with duplicates kept.
    #[must_use]
    pub fn child_elements(&self) -> Vec<String> {
        let elements = {
            let state = self.inner.state.lock();
            match (&state.rendered, &state.parent) {
                (Some(Rendered::Fragment(fragment)), _) if !fragment.is_empty() => fragment.descendants(),
                (Some(Rendered::Wrapper(wrapper)), _) => wrapper.descendants(),
                (_, Some(parent)) => parent.descendants(),
                _ => self
                    .inner
                    .document
                    .body()
                    .query_selector(&name_to_tag(self.name()))
                    .map(|element| element.descendants())
                    .unwrap_or_default(),
            }
        };
        elements
            .iter()
            .map(|element| tag_to_name(&element.local_name()))
            .collect()
    }

    /// Insert the compiled markup into `parent` (first attach phase)
    ///
    /// Does nothing and returns `false` if the template is already attached
    /// and `force_replace` is not set, or if it is disposed. A forced
    /// replace clears the previous parent and drops the existing event
    /// bindings. Notifies `on_html_rendered`.
    pub fn attach(&self, parent: &Element, force_replace: bool) -> bool {
        {
            let mut state = self.inner.state.lock();
            if state.disposed {
                return false;
            }
            if let Some(current) = state.parent.clone() {
                if !force_replace {
                    return false;
                }
                current.clear_children();
                events::remove_bindings(&mut state);
            }

            state.parent = Some(parent.clone());
            if let Some(id) = &state.configuration.id {
                parent.set_id(id);
            }

            let added = match &state.rendered {
                Some(Rendered::Fragment(fragment)) if !fragment.is_empty() => parent.append_fragment(fragment),
                Some(Rendered::Wrapper(wrapper)) => {
                    parent.append_child(wrapper);
                    vec![wrapper.node_id()]
                }
                _ => parent.insert_adjacent_html_beforeend(&state.raw_html),
            };
            state.added_nodes = added;
        }

        debug!(template = %self.name(), parent = ?parent, force_replace, "template attached");
        self.inner.on_html_rendered.notify(self);
        true
    }

    /// Bind events and notify `on_appended` (second attach phase)
    pub fn finalize_attach(&self) {
        if self.is_disposed() {
            return;
        }
        self.register_events();
        self.inner.on_appended.notify(self);
    }

    /// Attach to `parent`, deferring the second phase to a later tick
    ///
    /// Inside a Tokio runtime the second phase runs on a spawned task after
    /// the current task yields; outside one it runs immediately.
    pub fn append_to(&self, parent: &Element, force_replace: bool) {
        if !self.attach(parent, force_replace) {
            return;
        }
        let template = self.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    tokio::task::yield_now().await;
                    template.finalize_attach();
                });
            }
            Err(_) => template.finalize_attach(),
        }
    }

    /// Show the template
    ///
    /// Without a strategy the parent's `display` is set to `flex`. A call
    /// made while a hide is in flight is ignored.
    ///
    /// # Errors
    ///
    /// [`TemplateError::NotAttached`] when the default strategy is used on
    /// an unattached template, [`TemplateError::Disposed`] after disposal.
    pub async fn show(&self, visibility: Option<VisibilityFn>) -> Result<(), TemplateError> {
        self.change_visibility(visibility, true).await
    }

    /// Hide the template
    ///
    /// Without a strategy the parent's `display` is set to `none`. A call
    /// made while a show is in flight is ignored.
    ///
    /// # Errors
    ///
    /// See [`Template::show`].
    pub async fn hide(&self, visibility: Option<VisibilityFn>) -> Result<(), TemplateError> {
        self.change_visibility(visibility, false).await
    }

    async fn change_visibility(&self, visibility: Option<VisibilityFn>, show: bool) -> Result<(), TemplateError> {
        let parent = {
            let mut state = self.inner.state.lock();
            if state.disposed {
                return Err(TemplateError::Disposed(self.name().to_string()));
            }
            let opposing = if show { state.is_hiding } else { state.is_showing };
            if opposing {
                warn!(template = %self.name(), show, "visibility change suppressed; another is in flight");
                return Ok(());
            }
            if visibility.is_none() && state.parent.is_none() {
                return Err(TemplateError::NotAttached(self.name().to_string()));
            }
            if show {
                state.is_showing = true;
            } else {
                state.is_hiding = true;
            }
            state.parent.clone()
        };
        let in_flight = InFlight { template: self, show };

        match (visibility, parent) {
            (Some(strategy), _) => strategy(self.clone()).await,
            (None, Some(parent)) => parent.set_style("display", if show { "flex" } else { "none" }),
            (None, None) => {}
        }

        drop(in_flight);
        self.inner.state.lock().is_shown = show;
        self.inner.on_state_change.notify(self);
        Ok(())
    }

    /// Release everything the template owns
    ///
    /// Clears every notification channel, cancels pending loads, removes
    /// native event bindings and detaches the inserted markup. Safe to call
    /// more than once.
    pub fn dispose(&self) {
        let (requests, parent, added) = {
            let mut state = self.inner.state.lock();
            if state.disposed {
                return;
            }
            state.disposed = true;
            state.is_loaded = false;
            events::remove_bindings(&mut state);
            (
                std::mem::take(&mut state.load_requests),
                state.parent.take(),
                std::mem::take(&mut state.added_nodes),
            )
        };

        self.inner.on_loaded.clear();
        self.inner.on_appended.clear();
        self.inner.on_state_change.clear();
        self.inner.on_event_triggered.clear();
        self.inner.on_params_updated.clear();
        self.inner.on_html_rendered.clear();

        for request in requests {
            request.cancel();
        }
        if let Some(parent) = parent {
            parent.remove_children(&added);
        }
        debug!(template = %self.name(), "template disposed");
    }
}

/// Clears the in-flight show or hide flag, including when the visibility
/// future is dropped before completing
struct InFlight<'a> {
    template: &'a Template,
    show: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut state = self.template.inner.state.lock();
        if self.show {
            state.is_showing = false;
        } else {
            state.is_hiding = false;
        }
    }
}
