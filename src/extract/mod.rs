//! # Dimension Extraction
//!
//! Turns requests like "an expert board" or "10 10 15" into a validated
//! `Dimensions` record by prompting a completion engine and parsing its reply.
//!
//! ## Key Components
//!
//! - `DimensionGenerator`: the facade; one prompt per query, `None` on any failure
//! - `PromptTemplate`: fixed prompt with `{input}` and `{format_instructions}`
//! - `StructuredOutputParser`: pulls a JSON object out of the reply and normalizes
//!   alias keys (`mine_count` becomes `mines`, `cols` becomes `columns`, ...)
//! - `Dimensions`: the structured result, validated at the parse boundary

mod generator;
pub mod normalize;
mod prompt;
mod schema;
mod types;

pub use generator::DimensionGenerator;
pub use prompt::{MissingVariable, PromptTemplate};
pub use schema::{ResponseSchema, StructuredOutputParser, DEFAULT_ALIASES};
pub use types::{Dimensions, ParseError};
