//! Placeholder substitution engine for message templates

use lazy_static::lazy_static;
use regex::{Captures, Regex};

use super::types::TemplateData;

lazy_static! {
    /// `{FieldName}`: everything between a `{` and the next `}`
    static ref PLACEHOLDER: Regex = Regex::new(r"\{([^}]+)\}").unwrap();
}

/// Substitute `{FieldName}` placeholders with values resolved from `data`.
///
/// - No data: the template is returned verbatim.
/// - Unknown field: that placeholder is left as written, others still resolve.
/// - Unset optional value: empty string.
///
/// Substituted text is never scanned again, so values containing braces are
/// emitted literally.
pub fn render(template: &str, data: Option<&dyn TemplateData>) -> String {
    let Some(data) = data else {
        return template.to_string();
    };

    PLACEHOLDER
        .replace_all(template, |caps: &Captures| match data.field(&caps[1]) {
            Some(value) => value.render(),
            None => caps[0].to_string(),
        })
        .into_owned()
}
