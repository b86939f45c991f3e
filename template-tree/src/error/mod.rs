//! Error types and error handling
//!
//! Each layer owns its own error enum. The ones that cross module boundaries
//! live here; the leaf errors ([`ParseError`], [`LoadError`],
//! [`CompileError`]) are re-exported for convenience.

use thiserror::Error;

pub use crate::dom::ParseError;
pub use crate::loader::LoadError;
pub use crate::template::CompileError;

/// Why a template could not produce its markup
#[derive(Debug, Error)]
pub enum ContentResolutionError {
    /// Neither `html` nor `location` was configured
    #[error("no template configuration provided")]
    MissingConfiguration,

    /// The location pointed at a URL and the fetch failed
    #[error("failed to fetch '{location}': {source}")]
    Fetch {
        /// Location that was requested
        location: String,
        /// Underlying loader failure
        #[source]
        source: LoadError,
    },

    /// The location pointed at a document element that does not exist
    #[error("template element '#{0}' not found in document")]
    ElementNotFound(String),
}

/// Template lifecycle error
#[derive(Debug, Error)]
pub enum TemplateError {
    /// Content could not be resolved (no retry is attempted)
    #[error("template '{name}': {source}")]
    ContentResolution {
        /// Template name
        name: String,
        /// Resolution failure
        #[source]
        source: ContentResolutionError,
    },

    /// The resolved markup could not be rendered with the current parameters
    #[error("template '{name}': {source}")]
    Compile {
        /// Template name
        name: String,
        /// Render failure
        #[source]
        source: CompileError,
    },

    /// The template was disposed while its content was still loading
    #[error("template '{0}' was disposed while loading")]
    Cancelled(String),

    /// The template has already been disposed
    #[error("template '{0}' is disposed")]
    Disposed(String),

    /// The operation needs a parent element and the template has none
    #[error("template '{0}' is not attached to a parent element")]
    NotAttached(String),
}

impl TemplateError {
    /// Name of the template this error belongs to
    #[must_use]
    pub fn template_name(&self) -> &str {
        match self {
            Self::ContentResolution { name, .. } | Self::Compile { name, .. } => name,
            Self::Cancelled(name) | Self::Disposed(name) | Self::NotAttached(name) => name,
        }
    }
}

/// Template manager error
#[derive(Debug, Error)]
pub enum TemplateManagerError {
    /// A template with the same name is already managed
    #[error("template '{0}' is already registered")]
    DuplicateTemplate(String),

    /// A template failed its initial load and the manager is configured to fail fast
    #[error("initial load failed: {0}")]
    LoadFailed(#[source] TemplateError),
}

/// Configuration loading error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Figment could not extract the configuration
    #[error("Configuration error: {0}")]
    Extract(#[from] Box<figment::Error>),

    /// The built-in defaults could not be serialized
    #[error("failed to serialize default configuration: {0}")]
    Defaults(#[from] toml::ser::Error),

    /// The file extension is not one of the supported formats
    #[error("unsupported configuration format: {0}")]
    UnsupportedFormat(String),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Extract(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_name_is_reported() {
        let err = TemplateError::ContentResolution {
            name: "nav".to_string(),
            source: ContentResolutionError::ElementNotFound("nav-tpl".to_string()),
        };
        assert_eq!(err.template_name(), "nav");
        assert!(err.to_string().contains("#nav-tpl"));

        let err = TemplateError::NotAttached("overlay".to_string());
        assert_eq!(err.template_name(), "overlay");
    }

    #[test]
    fn test_manager_error_wraps_template_error() {
        let err = TemplateManagerError::LoadFailed(TemplateError::Cancelled("main".to_string()));
        assert!(err.to_string().contains("main"));
    }
}
