mod header;

pub use header::{GgufError, GgufHeader, GGUF_MAGIC};
