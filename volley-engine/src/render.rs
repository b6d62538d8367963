//! Per-iteration template rendering

use crate::error::EngineError;
use handlebars::Handlebars;
use serde_json::Value;
use tracing::trace;
use volley_core::{RequestInfo, RequestTemplate, Variables};

/// Renders a merged template into concrete requests.
///
/// The merged template is serialized to JSON once; each iteration substitutes
/// `{{name}}` placeholders in that text against the iteration's variables and
/// re-parses the result. Rendering over the serialized text is what lets a
/// numeric variable land in a JSON number position unquoted.
pub struct TemplateRenderer {
    registry: Handlebars<'static>,
    template_json: String,
}

impl TemplateRenderer {
    /// Prepare a renderer for one template. The template is expected to have
    /// been merged with engine defaults already.
    pub fn new(template: &RequestTemplate) -> Result<Self, EngineError> {
        let template_json = serde_json::to_string(template)?;

        let mut registry = Handlebars::new();
        // Unknown variables are render errors, and values land in JSON text,
        // so HTML escaping must stay out of the way
        registry.set_strict_mode(true);
        registry.register_escape_fn(handlebars::no_escape);

        Ok(Self {
            registry,
            template_json,
        })
    }

    /// Render one request at the given global index.
    pub fn render(&self, idx: u64, variables: &mut Variables) -> Result<RequestInfo, EngineError> {
        variables.insert("idx".to_string(), Value::from(idx));

        let rendered = self
            .registry
            .render_template(&self.template_json, variables)
            .map_err(|e| EngineError::TemplateRender(e.to_string()))?;
        trace!(idx, rendered, "rendered request template");

        let mut request: RequestInfo = serde_json::from_str(&rendered).map_err(|e| {
            EngineError::TemplateRender(format!(
                "rendered template is not a valid request: {}",
                e
            ))
        })?;
        request.idx = idx;

        Ok(request)
    }
}
