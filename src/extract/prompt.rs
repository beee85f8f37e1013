use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").unwrap());

/// Raised when a template is rendered without a value for one of its variables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingVariable(pub String);

impl fmt::Display for MissingVariable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "missing value for prompt variable `{}`", self.0)
    }
}

impl Error for MissingVariable {}

/// A text template with `{name}` placeholders.
///
/// Substitution happens in a single pass, so braces inside substituted values
/// (JSON examples, user text) are never treated as placeholders.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: String,
    partials: HashMap<String, String>,
}

impl PromptTemplate {
    pub fn from_template(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            partials: HashMap::new(),
        }
    }

    /// Binds `name` permanently; later renders only need the remaining variables.
    pub fn partial(mut self, name: &str, value: impl Into<String>) -> Self {
        self.partials.insert(name.to_string(), value.into());
        self
    }

    /// Variables that still need a value at render time, in order of first use.
    pub fn input_variables(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for caps in PLACEHOLDER.captures_iter(&self.template) {
            let name = caps[1].to_string();
            if !self.partials.contains_key(&name) && !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }

    /// Renders the template with `vars` plus the partial bindings.
    pub fn format(&self, vars: &[(&str, &str)]) -> Result<String, MissingVariable> {
        let mut missing: Option<String> = None;
        let rendered = PLACEHOLDER.replace_all(&self.template, |caps: &Captures| {
            let name = &caps[1];
            if let Some((_, value)) = vars.iter().find(|(k, _)| *k == name) {
                return value.to_string();
            }
            if let Some(value) = self.partials.get(name) {
                return value.clone();
            }
            missing.get_or_insert_with(|| name.to_string());
            String::new()
        });

        match missing {
            Some(name) => Err(MissingVariable(name)),
            None => Ok(rendered.into_owned()),
        }
    }
}
