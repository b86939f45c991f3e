//! Markup compilation
//!
//! Templates are Handlebars markup rendered against the template's
//! parameters. Output is escaped unless the parameters carry
//! `noEscape: true`.

use handlebars::{Handlebars, RenderError};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

use super::helpers;

/// Parameter key that disables HTML escaping
pub const NO_ESCAPE_PARAM: &str = "noEscape";

/// Rendering failure
#[derive(Debug, Error)]
#[error("template rendering failed: {0}")]
pub struct CompileError(#[from] RenderError);

/// Handlebars renderer with the template helpers registered
///
/// Cloning is cheap; clones share the registries.
#[derive(Clone)]
pub struct TemplateCompiler {
    escaped: Arc<Handlebars<'static>>,
    raw: Arc<Handlebars<'static>>,
}

impl std::fmt::Debug for TemplateCompiler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateCompiler").finish_non_exhaustive()
    }
}

impl Default for TemplateCompiler {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateCompiler {
    /// Create a compiler with the standard helper set
    #[must_use]
    pub fn new() -> Self {
        let mut escaped = Handlebars::new();
        helpers::register(&mut escaped);

        let mut raw = Handlebars::new();
        raw.register_escape_fn(handlebars::no_escape);
        helpers::register(&mut raw);

        Self {
            escaped: Arc::new(escaped),
            raw: Arc::new(raw),
        }
    }

    /// Render `markup` with `params`
    ///
    /// Identical inputs always produce identical output.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError`] if the markup is not valid Handlebars or a
    /// helper fails.
    pub fn compile(&self, markup: &str, params: &Value) -> Result<String, CompileError> {
        let registry = if escaping_disabled(params) {
            &self.raw
        } else {
            &self.escaped
        };
        Ok(registry.render_template(markup, params)?)
    }
}

fn escaping_disabled(params: &Value) -> bool {
    params
        .get(NO_ESCAPE_PARAM)
        .is_some_and(helpers::is_truthy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_interpolation_is_escaped_by_default() {
        let compiler = TemplateCompiler::new();
        let html = compiler
            .compile("<p>{{text}}</p>", &json!({"text": "<b>&</b>"}))
            .unwrap();
        assert_eq!(html, "<p>&lt;b&gt;&amp;&lt;/b&gt;</p>");
    }

    #[test]
    fn test_no_escape_param() {
        let compiler = TemplateCompiler::new();
        let html = compiler
            .compile("<p>{{text}}</p>", &json!({"text": "<b>bold</b>", "noEscape": true}))
            .unwrap();
        assert_eq!(html, "<p><b>bold</b></p>");
    }

    #[test]
    fn test_missing_params_render_empty() {
        let compiler = TemplateCompiler::new();
        assert_eq!(compiler.compile("<i>{{nope}}</i>", &json!({})).unwrap(), "<i></i>");
        assert_eq!(compiler.compile("<i>{{nope}}</i>", &Value::Null).unwrap(), "<i></i>");
    }

    #[test]
    fn test_invalid_markup_is_an_error() {
        let compiler = TemplateCompiler::new();
        assert!(compiler.compile("{{#if x}}unclosed", &json!({})).is_err());
    }

    proptest! {
        #[test]
        fn prop_compile_is_deterministic(
            text in "[a-zA-Z0-9<>&\" ]{0,24}",
            total in any::<i32>(),
            visible in any::<bool>(),
        ) {
            let compiler = TemplateCompiler::new();
            let markup = r#"<div data-total="{{total}}">{{#if visible}}{{text}}{{else}}{{not visible}}{{/if}}{{add total 1}}</div>"#;
            let params = json!({"text": text, "total": total, "visible": visible});
            let first = compiler.compile(markup, &params).unwrap();
            let second = TemplateCompiler::new().compile(markup, &params).unwrap();
            prop_assert_eq!(first, second);
        }
    }
}
