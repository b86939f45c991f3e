//! template-tree: declarative template tree manager
//!
//! A viewer UI is described as a set of named HTML templates. Each template
//! is loaded from inline markup, a URL or a document element, compiled with
//! Handlebars against its parameters, and attached into a parent element.
//! Templates reference each other through custom elements: a template named
//! `navBar` is placed wherever another template renders `<nav-bar>`.
//!
//! # Design Principles
//!
//! 1. **Configuration drives structure**: the containment tree is inferred
//!    from the markup, never declared twice
//! 2. **Parents before children**: a child attaches only once its parent is
//!    in the document
//! 3. **Failures stay local**: a template that fails to load is left out of
//!    the tree without holding back the others
//!
//! # Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use template_tree::prelude::*;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> anyhow::Result<()> {
//! let document = Document::new();
//! let manager = TemplateManager::builder(document.body())
//!     .loader(Arc::new(MemoryLoader::new().with("/nav.html", "<nav>{{title}}</nav>")))
//!     .build();
//!
//! let templates = TemplatesConfig::new()
//!     .with("main", TemplateConfig::inline("<div><nav-bar></nav-bar></div>"))
//!     .with("navBar", TemplateConfig::located("/nav.html").with_param("title", "Viewer"));
//!
//! let report = manager.init_templates(&templates).await?;
//! assert!(report.is_complete());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod dom;
pub mod error;
pub mod loader;
pub mod manager;
pub mod observability;
pub mod observable;
pub mod template;

pub mod prelude {
    //! Convenience re-exports for common types and traits
    //!
    //! # Examples
    //!
    //! ```rust
    //! use template_tree::prelude::*;
    //! ```

    pub use crate::config::{EventConfig, TemplateConfig, TemplateTreeConfig, TemplatesConfig};
    pub use crate::dom::{Document, DomEvent, Element};
    pub use crate::error::{TemplateError, TemplateManagerError};
    pub use crate::loader::{FileLoader, FsLoader, HttpLoader, MemoryLoader};
    pub use crate::manager::{EventManager, ManagerSettings, TemplateManager, TemplateNode};
    pub use crate::observable::Observable;
    pub use crate::template::{EventCallback, Template, VisibilityFn};
}
