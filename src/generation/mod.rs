//! Synthetic bundle generation through a text generation service.

mod bundle;
mod client;
mod extract;
mod prompt;
mod request;

pub use bundle::{BundleGenerator, GeneratedBundle, GenerationSummary};
#[cfg(feature = "openai-client")]
pub use client::OpenAiChatClient;
pub use client::{GenerationParams, TextGenerator};
pub use extract::extract_json;
pub use prompt::{GenerationPrompt, PromptBuilder};
pub use request::{GenerationRequest, ObservationCategory, ResourceOptions};
