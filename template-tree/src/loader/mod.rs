//! Template content loading
//!
//! A [`FileLoader`] turns a location into markup. [`HttpLoader`] fetches over
//! the network, [`FsLoader`] reads from a template directory and
//! [`MemoryLoader`] serves content registered up front. Loads are made
//! cancelable with a [`CancellationToken`].

mod cancellation;
mod fs;
mod http;

pub use cancellation::CancellationToken;
pub use fs::FsLoader;
pub use http::HttpLoader;

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Why a location could not be loaded
#[derive(Debug, Error)]
pub enum LoadError {
    /// Transport failure
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status
    #[error("'{location}' returned status {status}")]
    Status {
        /// Requested location
        location: String,
        /// HTTP status code
        status: u16,
    },

    /// A relative location was given but no base URL is configured
    #[error("relative location '{0}' requires a base URL")]
    RelativeWithoutBase(String),

    /// The location could not be turned into a URL
    #[error("invalid URL '{location}': {reason}")]
    InvalidUrl {
        /// Offending location
        location: String,
        /// Parser message
        reason: String,
    },

    /// Filesystem failure
    #[error("failed to read '{location}': {source}")]
    Io {
        /// Requested location
        location: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Nothing is registered at this location
    #[error("no template at '{0}'")]
    NotFound(String),

    /// This loader cannot handle the location
    #[error("location '{0}' is not supported by this loader")]
    Unsupported(String),
}

/// Loads template markup from a location
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FileLoader: Send + Sync {
    /// Load the markup at `location`
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`] when the content cannot be produced.
    async fn load(&self, location: &str) -> Result<String, LoadError>;
}

/// Whether `location` should be fetched rather than looked up in the document
///
/// Absolute URLs and paths (`http...`, `/`, `./`, `../`) are fetched; anything
/// else is an element id.
#[must_use]
pub fn is_url(location: &str) -> bool {
    location.starts_with("http")
        || location.starts_with('/')
        || location.starts_with("./")
        || location.starts_with("../")
}

/// Loader serving markup registered in memory
///
/// Useful for embedding templates in a binary and for tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryLoader {
    /// Create an empty loader
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register markup at `location`, replacing any previous entry
    #[must_use]
    pub fn with(self, location: impl Into<String>, markup: impl Into<String>) -> Self {
        self.insert(location, markup);
        self
    }

    /// Register markup at `location`, replacing any previous entry
    pub fn insert(&self, location: impl Into<String>, markup: impl Into<String>) {
        self.entries.write().insert(location.into(), markup.into());
    }

    /// Number of registered locations
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether nothing is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[async_trait]
impl FileLoader for MemoryLoader {
    async fn load(&self, location: &str) -> Result<String, LoadError> {
        self.entries
            .read()
            .get(location)
            .cloned()
            .ok_or_else(|| LoadError::NotFound(location.to_string()))
    }
}
