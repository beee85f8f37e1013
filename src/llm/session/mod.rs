mod context;

pub use context::{complete_once, session_params};
