//! template-tree CLI library

#![forbid(unsafe_code)]
#![deny(clippy::all, clippy::pedantic, clippy::nursery)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

pub mod commands;

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use template_tree::config::TemplateTreeConfig;
use template_tree::dom::{Document, Element};
use template_tree::manager::{InitReport, TemplateManager};
use tokio::sync::Notify;

/// A configuration initialised into a fresh document
#[derive(Debug)]
pub struct Session {
    /// Document the templates were attached into
    pub document: Document,
    /// Root container element
    pub container: Element,
    /// Manager owning the templates
    pub manager: TemplateManager,
    /// Initialisation outcome
    pub report: InitReport,
    /// Whether every template in the tree was attached before the timeout
    pub all_loaded: bool,
}

impl Session {
    /// Markup of the root container
    #[must_use]
    pub fn html(&self) -> String {
        self.container.inner_html()
    }
}

/// Load the configuration at `path` and initialise it into a new document
///
/// # Errors
///
/// Returns an error if the configuration cannot be read, the loader cannot
/// be built, or initialisation fails.
pub async fn open(path: &Path, timeout: Duration) -> Result<Session> {
    let config = TemplateTreeConfig::load_from(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    run(config, timeout).await
}

/// Initialise `config` into a new document and wait for the tree to attach
///
/// # Errors
///
/// Returns an error if the loader cannot be built or initialisation fails.
pub async fn run(config: TemplateTreeConfig, timeout: Duration) -> Result<Session> {
    let loader = config
        .loader
        .build_loader()
        .context("Failed to build template loader")?;

    let document = Document::new();
    let container = config.manager.create_container(&document);
    let manager = TemplateManager::builder(container.clone())
        .loader(loader)
        .settings(config.manager)
        .build();

    let done = Arc::new(Notify::new());
    let signal = Arc::clone(&done);
    manager
        .on_all_loaded()
        .subscribe(move |_: &TemplateManager| signal.notify_one());

    let report = manager
        .init_templates(&config.templates)
        .await
        .context("Failed to initialise templates")?;
    let all_loaded = tokio::time::timeout(timeout, done.notified()).await.is_ok();

    Ok(Session {
        document,
        container,
        manager,
        report,
        all_loaded,
    })
}
