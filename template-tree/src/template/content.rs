//! Content resolution

use std::sync::Arc;
use tracing::debug;

use super::Template;
use crate::config::TemplateConfig;
use crate::error::{ContentResolutionError, TemplateError};
use crate::loader::{is_url, CancellationToken};

impl Template {
    /// Produce the template markup from its configuration
    ///
    /// Inline `html` wins when no `location` is set. A URL location is
    /// fetched through the loader under a cancellation token registered on
    /// the template, anything else names a document element whose inner
    /// markup is used.
    pub(super) async fn resolve_content(
        &self,
        config: &TemplateConfig,
    ) -> Result<String, TemplateError> {
        let location = match (&config.html, config.location.as_deref()) {
            (Some(html), None) => return Ok(html.clone()),
            (_, Some(location)) if !location.is_empty() => location,
            _ => return Err(self.resolution_error(ContentResolutionError::MissingConfiguration)),
        };

        if is_url(location) {
            return self.fetch(location).await;
        }

        let id = location.strip_prefix('#').unwrap_or(location);
        self.inner
            .document
            .get_element_by_id(id)
            .map(|element| element.inner_html())
            .ok_or_else(|| {
                self.resolution_error(ContentResolutionError::ElementNotFound(id.to_string()))
            })
    }

    async fn fetch(&self, location: &str) -> Result<String, TemplateError> {
        let token = CancellationToken::new();
        {
            let mut state = self.inner.state.lock();
            if state.disposed {
                return Err(TemplateError::Cancelled(self.name().to_string()));
            }
            state.load_requests.push(token.clone());
        }

        debug!(template = %self.name(), location, "fetching template content");
        let loader = Arc::clone(&self.inner.loader);
        match token.run_until_cancelled(loader.load(location)).await {
            None => Err(TemplateError::Cancelled(self.name().to_string())),
            Some(Ok(markup)) => Ok(markup),
            Some(Err(source)) => Err(self.resolution_error(ContentResolutionError::Fetch {
                location: location.to_string(),
                source,
            })),
        }
    }

    fn resolution_error(&self, source: ContentResolutionError) -> TemplateError {
        TemplateError::ContentResolution {
            name: self.name().to_string(),
            source,
        }
    }
}
