pub mod engine;
pub mod protocol;

pub mod code_extractor;
pub mod llm_client;
pub mod prompt_builder;
pub mod render_runner;
pub mod session;
