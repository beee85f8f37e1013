use serde_json::{Map, Value};

use super::normalize::{find_json_object, normalize_keys};
use super::types::ParseError;

/// One field the model is asked to produce
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseSchema {
    /// Canonical key in the parsed object
    pub name: String,
    /// Human-readable description shown to the model
    pub description: String,
    /// Type hint shown to the model
    pub type_hint: String,
}

impl ResponseSchema {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            type_hint: "integer".to_string(),
        }
    }
}

/// Alternative spellings models use for the canonical keys, as (alias, canonical).
pub const DEFAULT_ALIASES: &[(&str, &str)] = &[
    ("mine_count", "mines"),
    ("mines_count", "mines"),
    ("num_mines", "mines"),
    ("number_of_mines", "mines"),
    ("mine", "mines"),
    ("bombs", "mines"),
    ("cols", "columns"),
    ("num_columns", "columns"),
    ("number_of_columns", "columns"),
    ("width", "columns"),
    ("num_rows", "rows"),
    ("number_of_rows", "rows"),
    ("height", "rows"),
];

/// Parses model output into a key/value map that conforms to a declared schema.
#[derive(Debug, Clone)]
pub struct StructuredOutputParser {
    schemas: Vec<ResponseSchema>,
    aliases: Vec<(String, String)>,
}

impl StructuredOutputParser {
    /// Creates a parser for `schemas` with the default alias table.
    pub fn from_response_schemas(schemas: Vec<ResponseSchema>) -> Self {
        let aliases = DEFAULT_ALIASES
            .iter()
            .filter(|(_, canonical)| schemas.iter().any(|s| s.name == *canonical))
            .map(|(alias, canonical)| (alias.to_string(), canonical.to_string()))
            .collect();
        Self { schemas, aliases }
    }

    /// Adds an extra alias that normalizes to `canonical`.
    pub fn with_alias(mut self, alias: &str, canonical: &str) -> Self {
        self.aliases.push((alias.trim().to_lowercase(), canonical.to_string()));
        self
    }

    pub fn schemas(&self) -> &[ResponseSchema] {
        &self.schemas
    }

    /// Instructions telling the model how to shape its answer.
    pub fn get_format_instructions(&self) -> String {
        let fields = self
            .schemas
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let comma = if i + 1 < self.schemas.len() { "," } else { "" };
                format!("\t\"{}\": {}{}  // {}", s.name, s.type_hint, comma, s.description)
            })
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "The output should be a markdown code snippet formatted in the following schema, \
             including the leading and trailing \"```json\" and \"```\":\n\n```json\n{{\n{}\n}}\n```",
            fields
        )
    }

    /// Parses `text`, normalizes alias keys and checks every schema key is present.
    pub fn parse(&self, text: &str) -> Result<Map<String, Value>, ParseError> {
        let object = find_json_object(text).ok_or_else(|| ParseError::NoJson(preview(text)))?;

        let aliases: Vec<(&str, &str)> = self
            .aliases
            .iter()
            .map(|(a, c)| (a.as_str(), c.as_str()))
            .collect();
        let canonical: Vec<&str> = self.schemas.iter().map(|s| s.name.as_str()).collect();
        let normalized = normalize_keys(object, &aliases, &canonical);

        for schema in &self.schemas {
            if !normalized.contains_key(&schema.name) {
                return Err(ParseError::MissingKey {
                    key: schema.name.clone(),
                    got: Value::Object(normalized).to_string(),
                });
            }
        }
        Ok(normalized)
    }
}

/// First characters of a reply, for error messages.
fn preview(text: &str) -> String {
    const LIMIT: usize = 120;
    let trimmed = text.trim();
    match trimmed.char_indices().nth(LIMIT) {
        Some((cut, _)) => format!("{}...", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}
