//! Configuration management for template-tree
//!
//! Configuration is merged from several sources with clear precedence:
//!
//! 1. Environment variables (highest priority, `TEMPLATE_TREE_` prefix, `__`
//!    for nesting)
//! 2. The configuration file (`.toml` or `.json`)
//! 3. Hardcoded defaults (fallback)
//!
//! # Example Configuration
//!
//! ```toml
//! [loader]
//! base_url = "https://viewer.example.com/templates/"
//! request_timeout_ms = 5000
//!
//! [manager]
//! root_template = "main"
//! fail_on_load_error = false
//!
//! [templates.main]
//! html = "<div><nav-bar></nav-bar><canvas></canvas></div>"
//!
//! [templates.navBar]
//! location = "/nav-bar.html"
//! params = { title = "Viewer" }
//! events = { pointerdown = { "#play" = true } }
//!
//! [templates]
//! loadingScreen = false
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use template_tree::config::TemplateTreeConfig;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = TemplateTreeConfig::load_from("./template-tree.toml")?;
//! let loader = config.loader.build_loader()?;
//! # Ok(())
//! # }
//! ```

mod templates;

pub use templates::{EventConfig, TemplateConfig, TemplatesConfig};

use figment::{
    providers::{Env, Format, Json, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::error::{ConfigError, LoadError};
use crate::loader::{FileLoader, FsLoader, HttpLoader};
use crate::manager::ManagerSettings;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "TEMPLATE_TREE_";

/// Complete template-tree configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplateTreeConfig {
    /// Where template content is loaded from
    #[serde(default)]
    pub loader: LoaderSettings,

    /// Manager behaviour
    #[serde(default)]
    pub manager: ManagerSettings,

    /// Named templates; `false` disables an entry
    #[serde(default)]
    pub templates: TemplatesConfig,
}

impl TemplateTreeConfig {
    /// Load configuration from a specific file
    ///
    /// The format follows the extension (`.toml` or `.json`). A missing file
    /// leaves the defaults in place; environment variables override both.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The extension is not a supported format
    /// - Default configuration cannot be serialized to TOML
    /// - The file contains invalid syntax
    /// - Configuration values fail type conversion
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let figment = Figment::new()
            // Start with defaults
            .merge(Toml::string(&toml::to_string(&Self::default())?));

        let figment = match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => figment.merge(Toml::file(path)),
            Some("json") => figment.merge(Json::file(path)),
            _ => return Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        };

        let config = figment
            // Environment variables override everything
            .merge(Env::prefixed(ENV_PREFIX).split("__").lowercase(true))
            .extract()?;
        Ok(config)
    }
}

/// Template loader settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderSettings {
    /// Base URL relative locations are fetched from; when unset templates
    /// are read from `template_dir`
    pub base_url: Option<String>,

    /// Directory templates are read from when no base URL is set
    pub template_dir: PathBuf,

    /// HTTP request timeout in milliseconds
    pub request_timeout_ms: u64,
}

impl Default for LoaderSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            template_dir: PathBuf::from("./templates"),
            request_timeout_ms: 30_000,
        }
    }
}

impl LoaderSettings {
    /// Request timeout as a [`Duration`]
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Build the loader these settings describe
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`] if the HTTP client cannot be built or the base
    /// URL is invalid.
    pub fn build_loader(&self) -> Result<Arc<dyn FileLoader>, LoadError> {
        match &self.base_url {
            Some(base_url) => {
                let loader = HttpLoader::new(self.request_timeout())?.with_base_url(base_url)?;
                Ok(Arc::new(loader))
            }
            None => Ok(Arc::new(FsLoader::new(&self.template_dir))),
        }
    }
}
