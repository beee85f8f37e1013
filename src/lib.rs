//! # minemind
//!
//! Natural-language Minesweeper setup backed by a local language model.
//!
//! - [`provision`] fetches and verifies the GGUF model file
//! - [`llm`] loads it with llama.cpp and completes prompts
//! - [`extract`] prompts the model and parses its reply into [`extract::Dimensions`]
//! - [`chat`] and [`server`] are the interactive and HTTP front ends

pub mod chat;
pub mod config;
pub mod extract;
pub mod gguf;
pub mod llm;
pub mod logging;
pub mod provision;
pub mod server;
