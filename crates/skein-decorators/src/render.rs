//! `{{ name }}` placeholder renderer

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;
use skein_artifact::{RenderError, TemplateRenderer};

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_.]*)\s*\}\}").expect("valid placeholder pattern")
});

/// Substitutes `{{ name }}` with values from an object model
///
/// A name is first looked up as a flat key (node properties use dotted
/// keys such as `FileProperties.FileName`), then as a dotted path into
/// nested objects. Strings are inserted raw, other values as JSON.
#[derive(Debug, Clone, Copy)]
pub struct PlaceholderRenderer {
    strict: bool,
}

impl PlaceholderRenderer {
    /// Create renderer that fails on unresolved placeholders
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self { strict: true }
    }

    /// Create renderer that leaves unresolved placeholders untouched
    #[inline]
    #[must_use]
    pub fn lenient() -> Self {
        Self { strict: false }
    }
}

impl Default for PlaceholderRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateRenderer for PlaceholderRenderer {
    fn render(&self, template: &str, model: &Value) -> Result<String, RenderError> {
        let object = match model {
            Value::Object(map) => map,
            Value::Null => return self.render(template, &Value::Object(serde_json::Map::new())),
            other => {
                return Err(RenderError::InvalidModel(format!(
                    "expected object, got {}",
                    kind_of(other)
                )))
            }
        };

        let mut missing = None;
        let rendered = PLACEHOLDER.replace_all(template, |caps: &Captures<'_>| {
            let name = &caps[1];
            let found = object.get(name).or_else(|| lookup_path(model, name));
            match found {
                Some(Value::String(s)) => s.clone(),
                Some(value) => value.to_string(),
                None => {
                    missing.get_or_insert_with(|| name.to_string());
                    caps[0].to_string()
                }
            }
        });

        match missing {
            Some(name) if self.strict => Err(RenderError::Unresolved(name)),
            _ => Ok(rendered.into_owned()),
        }
    }
}

fn lookup_path<'a>(model: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(model, |value, segment| value.get(segment))
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
