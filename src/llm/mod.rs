//! LLM domain — prompt composition and the inference client.
//!
//! External code should only use the items exported here.
//!
//!   - types.rs    — request/selection types, relationship + tone enums
//!   - prompts.rs  — prompt text sections
//!   - compose.rs  — PromptComposer (request → prompt text + variant)
//!   - provider.rs — InferenceClient trait + errors
//!   - gemini.rs   — Gemini Flash implementation

mod compose;
pub mod gemini;
pub mod prompts;
pub mod provider;
pub mod types;

pub use compose::{ComposeError, PromptComposer, DEFAULT_LANGUAGE, MAX_IMAGES};
pub use gemini::{GeminiClient, GEMINI_MODEL};
pub use provider::{InferenceClient, InferenceError};
pub use types::{
    parse_label, resolve_selection, ComposedPrompt, ContactProfile, GenerationRequest,
    Relationship, ResolvedSelection, Tone, Variant,
};
