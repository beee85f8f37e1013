use llama_cpp::standard_sampler::StandardSampler;
use llama_cpp::{LlamaModel, SessionParams};
use tracing::{debug, info};

use crate::config::InferenceConfig;
use crate::llm::EngineError;

/// Session parameters derived from the inference settings.
pub fn session_params(config: &InferenceConfig) -> SessionParams {
    SessionParams {
        n_ctx: config.context_size,
        n_batch: config.batch_size,
        ..Default::default()
    }
}

/// Runs one prompt through a fresh session and returns the decoded completion.
///
/// A new session per prompt keeps queries independent: nothing from a previous
/// request remains in the context window.
///
/// # Arguments
///
/// * `model` - The loaded model
/// * `params` - Context and batch sizes for the session
/// * `prompt` - Fully rendered prompt text
/// * `max_tokens` - Upper bound on generated tokens
pub fn complete_once(
    model: &LlamaModel,
    params: SessionParams,
    prompt: &str,
    max_tokens: usize,
) -> Result<String, EngineError> {
    let mut session = model
        .create_session(params)
        .map_err(|e| EngineError::Session(format!("Failed to create LlamaSession: {}", e)))?;

    session
        .advance_context(prompt)
        .map_err(|e| EngineError::Session(format!("Failed to advance context: {}", e)))?;
    debug!("Context advanced with {} prompt bytes", prompt.len());

    let handle = session
        .start_completing_with(StandardSampler::default(), max_tokens)
        .map_err(|e| EngineError::Generation(e.to_string()))?;

    let mut response = String::new();
    let mut pieces = 0usize;
    for piece in handle.into_strings() {
        response.push_str(&piece);
        pieces += 1;
    }

    info!("Completion finished after {} tokens", pieces);
    Ok(response)
}
