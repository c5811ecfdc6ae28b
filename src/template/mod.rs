//! Status line templates.
//!
//! Rendering runs in a fixed order:
//!
//! 1. computed placeholders (`{{tokenCount}}` and friends) are replaced by
//!    literal text, reading the transcript at most once;
//! 2. `{{color:spec:text}}` directives are expanded to ANSI escapes;
//! 3. the result is rendered as Mustache against the context.

pub mod color;
pub mod functions;
pub mod mustache;

use serde_json::Value;
use thiserror::Error;

use crate::context::RenderContext;
use crate::transcript::TokenSource;
use functions::{ComputedFunction, TokenCache};

pub const DEFAULT_TEMPLATE: &str =
    "{{modelName}} | {{shortCwd}}{{#gitBranch}} ({{gitBranch}}){{/gitBranch}}";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("unclosed tag at {0}")]
    UnclosedTag(usize),

    #[error("unclosed section \"{name}\" at {position}")]
    UnclosedSection { name: String, position: usize },

    #[error("unopened section \"{name}\" at {position}")]
    UnopenedSection { name: String, position: usize },
}

/// True if the template references any computed placeholder.
pub fn uses_computed_functions(template: &str) -> bool {
    ComputedFunction::ALL
        .iter()
        .any(|function| template.contains(&function.placeholder()))
}

/// Render a template, resolving computed placeholders first.
///
/// `threshold` is the compaction threshold in tokens. The transcript path is
/// taken from the context's `transcriptPath` field.
pub fn render<S: TokenSource>(
    template: &str,
    context: &RenderContext,
    source: &S,
    threshold: u64,
) -> Result<String, TemplateError> {
    let transcript_path = context
        .get("transcriptPath")
        .and_then(Value::as_str)
        .unwrap_or("");
    let mut tokens = TokenCache::new(source, transcript_path, threshold);

    let mut resolved = template.to_string();
    for function in ComputedFunction::ALL {
        let placeholder = function.placeholder();
        if resolved.contains(&placeholder) {
            let value = function.evaluate(&mut tokens);
            resolved = resolved.replace(&placeholder, &value);
        }
    }

    render_sync(&resolved, context)
}

/// Render a template that needs no transcript access.
///
/// Computed placeholders are left to Mustache and therefore render empty.
pub fn render_sync(template: &str, context: &RenderContext) -> Result<String, TemplateError> {
    let colored = color::apply_directives(template);
    mustache::render(&colored, context)
}
