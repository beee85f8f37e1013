use std::error::Error;
use std::sync::Arc;

use crate::config::Settings;
use crate::llm::{CompletionEngine, LlamaEngine};
use crate::logging::LogSink;
use crate::provision::Provisioner;
use super::prompt::PromptTemplate;
use super::schema::{ResponseSchema, StructuredOutputParser};
use super::types::Dimensions;

const DIMENSION_PROMPT: &str = "You are a game dimension generator for Minesweeper.
Extract grid dimensions and mine count.
Return only valid JSON with keys: \"rows\", \"columns\", \"mines\".
{format_instructions}
User request: {input}
Answer:";

/// Turns free-form requests into Minesweeper grid dimensions.
///
/// The prompt template and output parser are built once per generator; every
/// call to [`DimensionGenerator::generate_dimensions`] runs one completion.
pub struct DimensionGenerator {
    engine: Box<dyn CompletionEngine>,
    sink: Arc<dyn LogSink>,
    parser: StructuredOutputParser,
    prompt: PromptTemplate,
}

impl DimensionGenerator {
    /// Builds a generator over an already constructed engine.
    pub fn new(engine: Box<dyn CompletionEngine>, sink: Arc<dyn LogSink>) -> Self {
        let parser = StructuredOutputParser::from_response_schemas(vec![
            ResponseSchema::new("rows", "Number of rows in the grid."),
            ResponseSchema::new("columns", "Number of columns in the grid."),
            ResponseSchema::new("mines", "Number of mines."),
        ]);
        let prompt = PromptTemplate::from_template(DIMENSION_PROMPT)
            .partial("format_instructions", parser.get_format_instructions());

        Self {
            engine,
            sink,
            parser,
            prompt,
        }
    }

    /// Provisions the model described by `settings`, loads it and builds a generator.
    ///
    /// # Errors
    ///
    /// Fails when the model cannot be provisioned or loaded; a generator without
    /// a model is never returned.
    pub fn from_settings(
        settings: &Settings,
        provisioner: &Provisioner,
        sink: Arc<dyn LogSink>,
    ) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let model_path = provisioner.ensure(&settings.artifact_spec())?;
        sink.info(&format!("Initializing dimension generator with {}", model_path.display()));

        let engine = LlamaEngine::load(&model_path, &settings.inference).map_err(|e| {
            sink.error(&format!("Failed to load model: {}", e));
            e
        })?;
        Ok(Self::new(Box::new(engine), sink))
    }

    /// The prompt sent to the engine for `query`.
    pub fn render_prompt(&self, query: &str) -> Option<String> {
        match self.prompt.format(&[("input", query)]) {
            Ok(prompt) => Some(prompt),
            Err(e) => {
                self.sink.error(&format!("Prompt rendering failed: {}", e));
                None
            }
        }
    }

    /// Queries the model and returns the parsed dimensions.
    ///
    /// Any failure along the way (engine error, unparseable reply, invalid
    /// values) is logged and yields `None`.
    pub fn generate_dimensions(&mut self, query: &str) -> Option<Dimensions> {
        let prompt = self.render_prompt(query)?;

        let raw_output = match self.engine.complete(&prompt) {
            Ok(text) => text,
            Err(e) => {
                self.sink.error(&format!("Inference failed: {}", e));
                return None;
            }
        };

        let parsed = self
            .parser
            .parse(&raw_output)
            .and_then(|fields| Dimensions::from_fields(&fields));

        match parsed {
            Ok(dims) => {
                self.sink.info(&format!("Extracted game dimensions: {}", dims));
                Some(dims)
            }
            Err(e) => {
                self.sink.error(&format!("Parsing failed: {}", e));
                None
            }
        }
    }
}
