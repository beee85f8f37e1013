// Terminal display helpers
mod display;

// The chat loop itself
mod chat;

pub use chat::chat_loop;
pub use display::{dimensions_table, display_dimensions};
