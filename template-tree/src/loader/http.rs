//! Network loader

use async_trait::async_trait;
use reqwest::{Client, Url};
use std::time::Duration;
use tracing::debug;

use super::{FileLoader, LoadError};

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetches templates over HTTP(S)
///
/// Absolute `http(s)` locations are requested as-is; relative locations
/// (`/`, `./`, `../`) are joined to the configured base URL.
#[derive(Debug, Clone)]
pub struct HttpLoader {
    client: Client,
    base_url: Option<Url>,
}

impl Default for HttpLoader {
    fn default() -> Self {
        Self {
            client: Client::new(),
            base_url: None,
        }
    }
}

impl HttpLoader {
    /// Create a loader with the given request timeout and no base URL
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Http`] if the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self, LoadError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: None,
        })
    }

    /// Resolve relative locations against `base_url`
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::InvalidUrl`] if `base_url` is not an absolute URL.
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, LoadError> {
        let parsed = Url::parse(base_url).map_err(|err| LoadError::InvalidUrl {
            location: base_url.to_string(),
            reason: err.to_string(),
        })?;
        self.base_url = Some(parsed);
        Ok(self)
    }

    /// Configured base URL
    #[must_use]
    pub const fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    /// Turn a location into the URL that will be requested
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::RelativeWithoutBase`] for a relative location when
    /// no base URL is configured, or [`LoadError::InvalidUrl`] when the result
    /// is not a valid URL.
    pub fn resolve(&self, location: &str) -> Result<Url, LoadError> {
        let parsed = if location.starts_with("http") {
            Url::parse(location)
        } else {
            let Some(base) = &self.base_url else {
                return Err(LoadError::RelativeWithoutBase(location.to_string()));
            };
            base.join(location)
        };
        parsed.map_err(|err| LoadError::InvalidUrl {
            location: location.to_string(),
            reason: err.to_string(),
        })
    }
}

#[async_trait]
impl FileLoader for HttpLoader {
    async fn load(&self, location: &str) -> Result<String, LoadError> {
        let url = self.resolve(location)?;
        debug!(%url, "fetching template");

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::Status {
                location: location.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.text().await?)
    }
}
