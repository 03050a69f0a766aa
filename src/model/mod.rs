pub mod history_entry;
pub mod llm_decode;
pub mod message;
pub mod session_state;
