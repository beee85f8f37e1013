use std::path::{Path, PathBuf};
use llama_cpp::{LlamaModel, LlamaParams};
use tracing::info;

use crate::config::InferenceConfig;
use crate::gguf::GgufHeader;
use crate::llm::session::{complete_once, session_params};
use crate::llm::{CompletionEngine, EngineError};

/// A GGUF model held in memory by llama.cpp.
///
/// The model is loaded once and kept for the lifetime of the engine. Inference
/// parameters are fixed at construction.
pub struct LlamaEngine {
    model: LlamaModel,
    model_path: PathBuf,
    config: InferenceConfig,
}

impl LlamaEngine {
    /// Loads the model at `model_path`.
    ///
    /// The GGUF header is checked first so that a wrong file (an HTML error page,
    /// a truncated download) fails with a readable message instead of inside
    /// llama.cpp.
    ///
    /// # Arguments
    ///
    /// * `model_path` - Path to a verified GGUF file
    /// * `config` - Context size, batch size, GPU offload and token limit
    pub fn load(model_path: &Path, config: &InferenceConfig) -> Result<Self, EngineError> {
        let header = GgufHeader::read_from_path(model_path)
            .map_err(|e| EngineError::InvalidModel(format!("{}: {}", model_path.display(), e)))?;
        info!(
            version = header.version,
            tensors = header.tensor_count,
            metadata = header.metadata_count,
            "GGUF header ok: {}",
            model_path.display()
        );

        let params = LlamaParams {
            n_gpu_layers: config.gpu_layers,
            use_mmap: config.use_mmap,
            ..Default::default()
        };
        info!(
            n_gpu_layers = config.gpu_layers,
            n_ctx = config.context_size,
            n_batch = config.batch_size,
            "Loading model via llama_cpp: {}",
            model_path.display()
        );

        let model = LlamaModel::load_from_file(model_path, params)
            .map_err(|e| EngineError::Load(e.to_string()))?;
        info!("LLM successfully loaded into RAM.");

        Ok(Self {
            model,
            model_path: model_path.to_path_buf(),
            config: config.clone(),
        })
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }
}

impl CompletionEngine for LlamaEngine {
    fn complete(&mut self, prompt: &str) -> Result<String, EngineError> {
        complete_once(
            &self.model,
            session_params(&self.config),
            prompt,
            self.config.max_tokens,
        )
    }
}
