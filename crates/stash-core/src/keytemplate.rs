//! Cache key template evaluation.
//!
//! Templates reference build metadata with `{{ .Field }}` placeholders
//! (`Workflow`, `Branch`, `CommitHash`). Evaluation is deterministic and has
//! no side effects; a field the context does not know renders as the empty
//! string. Only structurally malformed placeholders are an error.

use crate::context::BuildContext;
use crate::error::{Error, Result};
use regex::Regex;

/// Evaluate a key template against the build context.
///
/// Keys are evaluated one per raw template line, in declaration order, and
/// that order must be preserved downstream: position encodes lookup priority.
pub fn evaluate(template: &str, ctx: &BuildContext) -> Result<String> {
    let re = Regex::new(r"\{\{\s*\.([A-Za-z][A-Za-z0-9_]*)\s*\}\}").unwrap();

    let rendered = re.replace_all(template, |caps: &regex::Captures| {
        let field = caps.get(1).map_or("", |m| m.as_str());
        ctx.field(field).unwrap_or_default().to_string()
    });

    // Anything brace-like left over means the placeholder syntax was broken
    // rather than merely referencing an unknown field.
    if rendered.contains("{{") || rendered.contains("}}") {
        return Err(Error::TemplateSyntax {
            template: template.to_string(),
            reason: "unbalanced or malformed '{{ ... }}' placeholder".to_string(),
        });
    }

    Ok(rendered.into_owned())
}
