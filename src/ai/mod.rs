//! Draft generation: prompt construction, the completion client, reply
//! extraction and draft assembly.

pub mod drafts;
pub mod extract;
pub mod generator;
pub mod llm_client;
pub mod prompts;
pub mod wire;

#[cfg(test)]
pub(crate) mod testing;

pub use extract::{ExtractError, FieldMap};
pub use generator::DraftGenerator;
pub use llm_client::{create_completion_client, CompletionClient, Endpoint, HttpCompletionClient};
pub use prompts::{build_envelope, build_prompt, PromptEnvelope};
