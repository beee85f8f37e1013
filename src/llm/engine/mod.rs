mod engine;

pub use engine::LlamaEngine;
