//! OpenAI-compatible completion client.
//!
//! Works with OpenAI and any endpoint speaking the `/chat/completions`
//! dialect. Non-streaming only — the reasoning loop is synchronous
//! call/return.

mod openai;

pub use openai::OpenAiClient;
