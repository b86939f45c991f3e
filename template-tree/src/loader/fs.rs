//! Filesystem loader

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{FileLoader, LoadError};

/// Reads templates from a local directory
///
/// Locations are resolved relative to the template directory; a leading `/`
/// is treated as the directory root. Network URLs are not supported.
#[derive(Debug, Clone)]
pub struct FsLoader {
    root: PathBuf,
}

impl FsLoader {
    /// Create a loader rooted at `root`
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Template directory
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path a location maps to
    #[must_use]
    pub fn resolve(&self, location: &str) -> PathBuf {
        self.root.join(location.trim_start_matches('/'))
    }
}

#[async_trait]
impl FileLoader for FsLoader {
    async fn load(&self, location: &str) -> Result<String, LoadError> {
        if location.starts_with("http://") || location.starts_with("https://") {
            return Err(LoadError::Unsupported(location.to_string()));
        }
        let path = self.resolve(location);
        debug!(path = %path.display(), "reading template");
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| LoadError::Io {
                location: location.to_string(),
                source,
            })
    }
}
