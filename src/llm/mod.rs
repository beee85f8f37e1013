//! # Text Completion
//!
//! The dimension generator only needs one thing from a language model: turn a
//! prompt into text. [`CompletionEngine`] is that seam. [`LlamaEngine`] implements
//! it on top of `llama_cpp` for GGUF model files.

use std::error::Error;
use std::fmt;

pub mod engine;
pub mod session;

pub use engine::LlamaEngine;

/// Errors raised while loading a model or generating text
#[derive(Debug)]
pub enum EngineError {
    /// The model file is not something the engine can load
    InvalidModel(String),
    /// The backend refused to load the model
    Load(String),
    /// A session could not be created or fed the prompt
    Session(String),
    /// Sampling failed mid-generation
    Generation(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EngineError::InvalidModel(msg) => write!(f, "Invalid model file: {}", msg),
            EngineError::Load(msg) => write!(f, "Failed to load model: {}", msg),
            EngineError::Session(msg) => write!(f, "Session error: {}", msg),
            EngineError::Generation(msg) => write!(f, "Generation failed: {}", msg),
        }
    }
}

impl Error for EngineError {}

/// Anything that can complete a prompt synchronously.
pub trait CompletionEngine: Send {
    /// Generates a completion for `prompt` and returns the raw text.
    fn complete(&mut self, prompt: &str) -> Result<String, EngineError>;
}

impl<E: CompletionEngine + ?Sized> CompletionEngine for Box<E> {
    fn complete(&mut self, prompt: &str) -> Result<String, EngineError> {
        (**self).complete(prompt)
    }
}
