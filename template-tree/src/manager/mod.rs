//! Template manager
//!
//! The [`TemplateManager`] owns every template of one viewer. Initialising it
//! with a [`TemplatesConfig`] creates the templates, loads them concurrently,
//! infers the containment tree from the loaded markup and attaches the tree
//! into the container element parent first.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use template_tree::config::{TemplateConfig, TemplatesConfig};
//! use template_tree::dom::Document;
//! use template_tree::loader::MemoryLoader;
//! use template_tree::manager::TemplateManager;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let document = Document::new();
//! let manager = TemplateManager::builder(document.body())
//!     .loader(Arc::new(MemoryLoader::new()))
//!     .build();
//!
//! let templates = TemplatesConfig::new()
//!     .with("main", TemplateConfig::inline("<div><child-a></child-a></div>"))
//!     .with("childA", TemplateConfig::inline("<span>hi</span>"));
//!
//! let report = manager.init_templates(&templates).await?;
//! assert_eq!(report.tree.unwrap().names(), vec!["main", "childA"]);
//! # Ok(())
//! # }
//! ```

mod events;
mod tree;

pub use events::{CallbackId, EventManager};
pub use tree::{build_tree, TemplateNode};

use futures_util::future::join_all;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, info, warn};

use crate::config::TemplatesConfig;
use crate::dom::{Document, Element};
use crate::error::{TemplateError, TemplateManagerError};
use crate::loader::{FileLoader, HttpLoader};
use crate::observable::Observable;
use crate::template::{tag_to_name, EventCallback, Template, TemplateCompiler, TemplateContext};

/// Template name the containment tree starts from by default
pub const DEFAULT_ROOT_TEMPLATE: &str = "main";

/// Manager behaviour
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerSettings {
    /// Name of the template at the root of the containment tree
    pub root_template: String,

    /// Fail initialisation when any template fails to load instead of
    /// leaving it out of the tree
    pub fail_on_load_error: bool,

    /// Id of the container element hosts create for the tree
    pub container_id: Option<String>,
}

impl Default for ManagerSettings {
    fn default() -> Self {
        Self {
            root_template: DEFAULT_ROOT_TEMPLATE.to_string(),
            fail_on_load_error: false,
            container_id: None,
        }
    }
}

impl ManagerSettings {
    /// Create the container element under the document body
    ///
    /// The element receives `container_id` when one is configured.
    #[must_use]
    pub fn create_container(&self, document: &Document) -> Element {
        let container = document.create_element("div");
        if let Some(id) = &self.container_id {
            container.set_id(id);
        }
        document.body().append_child(&container);
        container
    }
}

/// Outcome of [`TemplateManager::init_templates`]
#[derive(Debug, Default)]
pub struct InitReport {
    /// Templates whose initial load succeeded, in configuration order
    pub loaded: Vec<String>,
    /// Templates whose initial load failed; they are left out of the tree
    pub failed: Vec<(String, TemplateError)>,
    /// Entries disabled in the configuration
    pub skipped: Vec<String>,
    /// Containment tree, if the root template loaded
    pub tree: Option<TemplateNode>,
}

impl InitReport {
    /// Whether every configured template loaded
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

struct ManagerInner {
    container: Element,
    context: TemplateContext,
    settings: ManagerSettings,
    templates: RwLock<Vec<Template>>,
    tree: RwLock<Option<TemplateNode>>,
    all_loaded_fired: AtomicBool,
    event_manager: EventManager,
    on_template_init: Observable<Template>,
    on_template_loaded: Observable<Template>,
    on_template_state_change: Observable<Template>,
    on_all_loaded: Observable<TemplateManager>,
    on_event_triggered: Observable<EventCallback>,
}

/// Owner of a forest of named templates
///
/// Cloning is cheap: clones are handles to the same manager.
#[derive(Clone)]
pub struct TemplateManager {
    inner: Arc<ManagerInner>,
}

impl fmt::Debug for TemplateManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateManager")
            .field("container", &self.inner.container)
            .field("templates", &self.template_names())
            .finish_non_exhaustive()
    }
}

/// Builder for [`TemplateManager`]
pub struct TemplateManagerBuilder {
    container: Element,
    loader: Option<Arc<dyn FileLoader>>,
    compiler: Option<TemplateCompiler>,
    settings: ManagerSettings,
}

impl fmt::Debug for TemplateManagerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateManagerBuilder")
            .field("container", &self.container)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl TemplateManagerBuilder {
    /// Load template content through `loader` (HTTP by default)
    #[must_use]
    pub fn loader(mut self, loader: Arc<dyn FileLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Compile with `compiler`
    #[must_use]
    pub fn compiler(mut self, compiler: TemplateCompiler) -> Self {
        self.compiler = Some(compiler);
        self
    }

    /// Apply `settings`
    #[must_use]
    pub fn settings(mut self, settings: ManagerSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Build the manager
    #[must_use]
    pub fn build(self) -> TemplateManager {
        let loader = self
            .loader
            .unwrap_or_else(|| Arc::new(HttpLoader::default()));
        let document = self.container.document().clone();
        let context = TemplateContext::new(document, loader)
            .with_compiler(self.compiler.unwrap_or_default());

        let on_event_triggered = Observable::new();
        let event_manager = EventManager::new(&on_event_triggered);

        TemplateManager {
            inner: Arc::new(ManagerInner {
                container: self.container,
                context,
                settings: self.settings,
                templates: RwLock::new(Vec::new()),
                tree: RwLock::new(None),
                all_loaded_fired: AtomicBool::new(false),
                event_manager,
                on_template_init: Observable::new(),
                on_template_loaded: Observable::new(),
                on_template_state_change: Observable::new(),
                on_all_loaded: Observable::new(),
                on_event_triggered,
            }),
        }
    }
}

impl TemplateManager {
    /// Manager attaching into `container` with default settings and the
    /// HTTP loader
    #[must_use]
    pub fn new(container: Element) -> Self {
        Self::builder(container).build()
    }

    /// Start configuring a manager attaching into `container`
    #[must_use]
    pub fn builder(container: Element) -> TemplateManagerBuilder {
        TemplateManagerBuilder {
            container,
            loader: None,
            compiler: None,
            settings: ManagerSettings::default(),
        }
    }

    /// Root container element
    #[must_use]
    pub fn container(&self) -> &Element {
        &self.inner.container
    }

    /// Active settings
    #[must_use]
    pub fn settings(&self) -> &ManagerSettings {
        &self.inner.settings
    }

    /// Event manager fed by every template's triggered events
    #[must_use]
    pub fn event_manager(&self) -> &EventManager {
        &self.inner.event_manager
    }

    /// Fired when a template is created
    #[must_use]
    pub fn on_template_init(&self) -> &Observable<Template> {
        &self.inner.on_template_init
    }

    /// Fired when any template finishes its initial load
    #[must_use]
    pub fn on_template_loaded(&self) -> &Observable<Template> {
        &self.inner.on_template_loaded
    }

    /// Fired when any template is shown or hidden
    #[must_use]
    pub fn on_template_state_change(&self) -> &Observable<Template> {
        &self.inner.on_template_state_change
    }

    /// Fired once per initialisation when every template in the tree is
    /// loaded and attached
    #[must_use]
    pub fn on_all_loaded(&self) -> &Observable<Self> {
        &self.inner.on_all_loaded
    }

    /// Fired when a native event bound by any template triggers
    #[must_use]
    pub fn on_event_triggered(&self) -> &Observable<EventCallback> {
        &self.inner.on_event_triggered
    }

    /// Create, load and attach the configured templates
    ///
    /// Disabled entries are skipped. Loads run concurrently and a failing
    /// template does not hold back the others: it is logged, reported in
    /// [`InitReport::failed`] and left out of the tree. The tree is then
    /// built from the root template and attached parent first.
    ///
    /// # Errors
    ///
    /// - [`TemplateManagerError::DuplicateTemplate`] if a configured name is
    ///   already managed; nothing is created in that case
    /// - [`TemplateManagerError::LoadFailed`] with the first failure, once
    ///   every load has settled, when `fail_on_load_error` is set
    pub async fn init_templates(&self, config: &TemplatesConfig) -> Result<InitReport, TemplateManagerError> {
        {
            let templates = self.inner.templates.read();
            if let Some((name, _)) = config
                .iter()
                .find(|(name, _)| templates.iter().any(|t| t.name() == *name))
            {
                return Err(TemplateManagerError::DuplicateTemplate(name.to_string()));
            }
        }
        self.inner.all_loaded_fired.store(false, Ordering::SeqCst);

        let mut report = InitReport {
            skipped: config.disabled().map(ToString::to_string).collect(),
            ..InitReport::default()
        };
        for name in &report.skipped {
            debug!(template = %name, "template disabled by configuration");
        }

        let created: Vec<Template> = config
            .iter()
            .map(|(name, template_config)| self.create_template(name, template_config.clone()))
            .collect();

        let results = join_all(created.iter().map(|template| async move { (template, template.load().await) })).await;
        for (template, result) in results {
            match result {
                Ok(()) => report.loaded.push(template.name().to_string()),
                Err(err) => {
                    warn!(template = %template.name(), error = %err, "template failed to load");
                    report.failed.push((template.name().to_string(), err));
                }
            }
        }

        if self.inner.settings.fail_on_load_error && !report.failed.is_empty() {
            let (_, err) = report.failed.swap_remove(0);
            return Err(TemplateManagerError::LoadFailed(err));
        }

        let tree = self.build_html_tree();
        report.tree.clone_from(&tree);
        match tree {
            Some(tree) => self.attach_node(&tree, None, &mut HashSet::new()),
            None => self.check_loaded_state(),
        }

        info!(
            loaded = report.loaded.len(),
            failed = report.failed.len(),
            skipped = report.skipped.len(),
            "templates initialised"
        );
        Ok(report)
    }

    fn create_template(&self, name: &str, config: crate::config::TemplateConfig) -> Template {
        let template = Template::new(name, config, &self.inner.context);

        let loaded = self.inner.on_template_loaded.clone();
        template.on_loaded().subscribe(move |t: &Template| loaded.notify(t));
        let state_change = self.inner.on_template_state_change.clone();
        template.on_state_change().subscribe(move |t: &Template| state_change.notify(t));
        let triggered = self.inner.on_event_triggered.clone();
        template
            .on_event_triggered()
            .subscribe(move |data: &EventCallback| triggered.notify(data));

        self.inner.templates.write().push(template.clone());
        self.inner.on_template_init.notify(&template);
        template
    }

    /// Recompute the containment tree over every loaded template and flag
    /// its members
    fn build_html_tree(&self) -> Option<TemplateNode> {
        let templates = self.templates();
        let children: HashMap<String, Vec<String>> = templates
            .iter()
            .filter(|template| template.is_loaded())
            .map(|template| (template.name().to_string(), template.child_elements()))
            .collect();

        let tree = build_tree(&self.inner.settings.root_template, &children);
        if let Some(tree) = &tree {
            let members = tree.names();
            for template in &templates {
                if members.contains(&template.name()) {
                    template.set_in_html_tree(true);
                }
            }
        }
        self.inner.tree.write().clone_from(&tree);
        tree
    }

    /// Attach `node` and its subtree
    ///
    /// Children are wired first: a child whose parent template is not yet
    /// attached waits for the parent's `on_appended` notification. A
    /// template that appears under several parents attaches only under its
    /// first occurrence in tree order.
    fn attach_node(&self, node: &TemplateNode, parent: Option<&Template>, wired: &mut HashSet<String>) {
        if !wired.insert(node.name.clone()) {
            return;
        }
        let Some(template) = self.get_template(&node.name) else {
            return;
        };
        for child in &node.children {
            self.attach_node(child, Some(&template), wired);
        }

        let manager = Arc::downgrade(&self.inner);
        let add_to_parent = {
            let template = template.clone();
            let parent = parent.cloned();
            move || {
                if let Some(manager) = upgrade(&manager) {
                    manager.add_to_parent(&template, parent.as_ref());
                }
            }
        };

        match parent {
            Some(parent) if parent.parent().is_none() => {
                parent.on_appended().subscribe(move |_: &Template| add_to_parent());
            }
            _ => add_to_parent(),
        }
    }

    fn add_to_parent(&self, template: &Template, parent: Option<&Template>) {
        let target = parent
            .and_then(Template::parent)
            .and_then(|host| host.find_descendant(|element| tag_to_name(&element.local_name()) == template.name()))
            .unwrap_or_else(|| self.inner.container.clone());
        template.append_to(&target, false);
        self.check_loaded_state();
    }

    /// Fire `on_all_loaded` if every template in the tree is loaded and
    /// attached (or nothing is managed); at most once per initialisation
    fn check_loaded_state(&self) {
        let templates = self.templates();
        let done = templates.is_empty()
            || templates
                .iter()
                .all(|template| !template.is_in_html_tree() || (template.is_loaded() && template.parent().is_some()));

        if done && !self.inner.all_loaded_fired.swap(true, Ordering::SeqCst) {
            debug!("all templates loaded");
            self.inner.on_all_loaded.notify(self);
        }
    }

    /// Template named `name`
    #[must_use]
    pub fn get_template(&self, name: &str) -> Option<Template> {
        self.inner
            .templates
            .read()
            .iter()
            .find(|template| template.name() == name)
            .cloned()
    }

    /// First `canvas` element under the container
    #[must_use]
    pub fn get_canvas(&self) -> Option<Element> {
        self.inner.container.query_selector("canvas")
    }

    /// Every managed template, in creation order
    #[must_use]
    pub fn templates(&self) -> Vec<Template> {
        self.inner.templates.read().clone()
    }

    /// Names of every managed template, in creation order
    #[must_use]
    pub fn template_names(&self) -> Vec<String> {
        self.inner
            .templates
            .read()
            .iter()
            .map(|template| template.name().to_string())
            .collect()
    }

    /// Containment tree computed by the last initialisation
    #[must_use]
    pub fn tree(&self) -> Option<TemplateNode> {
        self.inner.tree.read().clone()
    }

    /// Dispose and forget the template named `name`
    pub fn remove_template(&self, name: &str) -> Option<Template> {
        let removed = {
            let mut templates = self.inner.templates.write();
            let index = templates.iter().position(|template| template.name() == name)?;
            templates.remove(index)
        };
        removed.dispose();
        Some(removed)
    }

    /// Dispose every template, the event manager and all notification
    /// channels
    pub fn dispose(&self) {
        let templates = std::mem::take(&mut *self.inner.templates.write());
        for template in &templates {
            template.dispose();
        }
        self.inner.tree.write().take();
        self.inner.event_manager.dispose();

        self.inner.on_template_init.clear();
        self.inner.on_template_loaded.clear();
        self.inner.on_template_state_change.clear();
        self.inner.on_all_loaded.clear();
        self.inner.on_event_triggered.clear();
        debug!(templates = templates.len(), "template manager disposed");
    }
}

fn upgrade(inner: &Weak<ManagerInner>) -> Option<TemplateManager> {
    inner.upgrade().map(|inner| TemplateManager { inner })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TemplateConfig;
    use crate::loader::{LoadError, MemoryLoader, MockFileLoader};
    use std::sync::atomic::AtomicUsize;

    fn manager(document: &Document) -> TemplateManager {
        TemplateManager::builder(document.body())
            .loader(Arc::new(MemoryLoader::new()))
            .build()
    }

    fn all_loaded_counter(manager: &TemplateManager) -> Arc<AtomicUsize> {
        let count = Arc::new(AtomicUsize::new(0));
        let hits = Arc::clone(&count);
        manager.on_all_loaded().subscribe(move |_: &TemplateManager| {
            hits.fetch_add(1, Ordering::SeqCst);
        });
        count
    }

    async fn settle() {
        for _ in 0..16 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_empty_configuration_fires_all_loaded() {
        let document = Document::new();
        let manager = manager(&document);
        let fired = all_loaded_counter(&manager);

        let report = manager.init_templates(&TemplatesConfig::new()).await.unwrap();
        assert!(report.tree.is_none());
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_disabled_entries_are_skipped() {
        let document = Document::new();
        let manager = manager(&document);
        let mut templates = TemplatesConfig::new().with("main", TemplateConfig::inline("<div></div>"));
        templates.disable("loadingScreen");

        let report = manager.init_templates(&templates).await.unwrap();
        assert_eq!(report.skipped, vec!["loadingScreen".to_string()]);
        assert_eq!(manager.template_names(), vec!["main".to_string()]);
        assert!(manager.get_template("loadingScreen").is_none());
    }

    #[tokio::test]
    async fn test_notifications_are_forwarded() {
        let document = Document::new();
        let manager = manager(&document);
        let inits = Arc::new(AtomicUsize::new(0));
        let loads = Arc::new(AtomicUsize::new(0));
        let (i, l) = (Arc::clone(&inits), Arc::clone(&loads));
        manager.on_template_init().subscribe(move |_: &Template| {
            i.fetch_add(1, Ordering::SeqCst);
        });
        manager.on_template_loaded().subscribe(move |_: &Template| {
            l.fetch_add(1, Ordering::SeqCst);
        });

        let templates = TemplatesConfig::new()
            .with("main", TemplateConfig::inline("<div></div>"))
            .with("broken", TemplateConfig::located("#missing"));
        let report = manager.init_templates(&templates).await.unwrap();

        assert_eq!(inits.load(Ordering::SeqCst), 2);
        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert_eq!(report.loaded, vec!["main".to_string()]);
        assert_eq!(report.failed.len(), 1);
        assert!(!report.is_complete());
    }

    #[tokio::test]
    async fn test_failed_child_is_left_out_of_tree() {
        let document = Document::new();
        let mut loader = MockFileLoader::new();
        loader
            .expect_load()
            .returning(|location| Err(LoadError::NotFound(location.to_string())));
        let manager = TemplateManager::builder(document.body())
            .loader(Arc::new(loader))
            .build();
        let fired = all_loaded_counter(&manager);

        let templates = TemplatesConfig::new()
            .with("main", TemplateConfig::inline("<div><nav-bar></nav-bar></div>"))
            .with("navBar", TemplateConfig::located("/nav.html"));
        let report = manager.init_templates(&templates).await.unwrap();

        assert_eq!(report.tree.unwrap().names(), vec!["main"]);
        assert!(!manager.get_template("navBar").unwrap().is_in_html_tree());
        settle().await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fail_on_load_error() {
        let document = Document::new();
        let manager = TemplateManager::builder(document.body())
            .loader(Arc::new(MemoryLoader::new()))
            .settings(ManagerSettings {
                fail_on_load_error: true,
                ..ManagerSettings::default()
            })
            .build();

        let templates = TemplatesConfig::new()
            .with("main", TemplateConfig::inline("<div></div>"))
            .with("navBar", TemplateConfig::located("/nav.html"));
        let err = manager.init_templates(&templates).await.unwrap_err();
        assert!(matches!(
            err,
            TemplateManagerError::LoadFailed(ref source) if source.template_name() == "navBar"
        ));
        assert!(manager.get_template("main").unwrap().parent().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_names_are_rejected() {
        let document = Document::new();
        let manager = manager(&document);
        let templates = TemplatesConfig::new().with("main", TemplateConfig::inline("<div></div>"));
        manager.init_templates(&templates).await.unwrap();

        let again = templates.with("extra", TemplateConfig::inline("<p></p>"));
        assert!(matches!(
            manager.init_templates(&again).await,
            Err(TemplateManagerError::DuplicateTemplate(name)) if name == "main"
        ));
        assert_eq!(manager.template_names(), vec!["main".to_string()]);
    }

    #[tokio::test]
    async fn test_custom_root_template() {
        let document = Document::new();
        let manager = TemplateManager::builder(document.body())
            .loader(Arc::new(MemoryLoader::new()))
            .settings(ManagerSettings {
                root_template: "viewer".to_string(),
                ..ManagerSettings::default()
            })
            .build();

        let templates = TemplatesConfig::new()
            .with("viewer", TemplateConfig::inline("<section><canvas></canvas></section>"))
            .with("main", TemplateConfig::inline("<p>not the root</p>"));
        let report = manager.init_templates(&templates).await.unwrap();
        settle().await;

        assert_eq!(report.tree.unwrap().names(), vec!["viewer"]);
        assert!(manager.get_template("main").unwrap().parent().is_none());
        assert!(manager.get_canvas().is_some());
    }

    #[tokio::test]
    async fn test_shared_child_attaches_under_first_parent() {
        let document = Document::new();
        let manager = manager(&document);
        let fired = all_loaded_counter(&manager);

        let templates = TemplatesConfig::new()
            .with("main", TemplateConfig::inline("<div><left-panel></left-panel><right-panel></right-panel></div>"))
            .with("leftPanel", TemplateConfig::inline("<aside><tree-icon></tree-icon></aside>"))
            .with("rightPanel", TemplateConfig::inline("<aside><tree-icon></tree-icon></aside>"))
            .with("treeIcon", TemplateConfig::inline("<i>icon</i>"));
        let report = manager.init_templates(&templates).await.unwrap();
        settle().await;

        let tree = report.tree.unwrap();
        assert!(tree.find("leftPanel").unwrap().contains("treeIcon"));
        assert!(tree.find("rightPanel").unwrap().contains("treeIcon"));

        let icon = manager.get_template("treeIcon").unwrap();
        let host = icon.parent().unwrap();
        assert_eq!(host.local_name(), "tree-icon");
        assert!(document.body().query_selector("left-panel tree-icon i").is_some());
        assert!(document.body().query_selector("right-panel tree-icon i").is_none());
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_remove_template_disposes_it() {
        let document = Document::new();
        let manager = manager(&document);
        let templates = TemplatesConfig::new().with("main", TemplateConfig::inline("<div>x</div>"));
        manager.init_templates(&templates).await.unwrap();
        settle().await;

        let removed = manager.remove_template("main").unwrap();
        assert!(removed.is_disposed());
        assert!(manager.get_template("main").is_none());
        assert!(manager.remove_template("main").is_none());
        assert_eq!(document.body().inner_html(), "");
    }

    #[tokio::test]
    async fn test_dispose_clears_everything() {
        let document = Document::new();
        let manager = manager(&document);
        manager
            .event_manager()
            .register_callback("main", |_: &EventCallback| {}, None, None);
        let templates = TemplatesConfig::new().with("main", TemplateConfig::inline("<div></div>"));
        manager.init_templates(&templates).await.unwrap();
        let main = manager.get_template("main").unwrap();

        manager.dispose();
        assert!(main.is_disposed());
        assert!(manager.templates().is_empty());
        assert!(manager.tree().is_none());
        assert_eq!(manager.event_manager().callback_count(), 0);
        assert!(manager.on_all_loaded().is_empty());
        assert!(manager.on_event_triggered().is_empty());
    }

    #[tokio::test]
    async fn test_reinitialise_after_dispose_routes_events() {
        let document = Document::new();
        let manager = manager(&document);
        let templates = TemplatesConfig::new().with("main", TemplateConfig::inline("<button></button>").with_event("click"));
        manager.init_templates(&templates).await.unwrap();
        settle().await;
        manager.dispose();

        let hits = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&hits);
        manager.event_manager().register_callback(
            "main",
            move |_: &EventCallback| {
                seen.fetch_add(1, Ordering::SeqCst);
            },
            Some("click"),
            None,
        );
        manager.init_templates(&templates).await.unwrap();
        settle().await;

        document
            .body()
            .query_selector("button")
            .unwrap()
            .dispatch_event(crate::dom::DomEvent::new("click"));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_settings_create_container() {
        let document = Document::new();
        let settings = ManagerSettings {
            container_id: Some("viewer".to_string()),
            ..ManagerSettings::default()
        };
        let container = settings.create_container(&document);
        assert!(container.is_connected());
        assert_eq!(document.get_element_by_id("viewer"), Some(container));
    }
}
