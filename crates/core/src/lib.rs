pub mod extract;
pub mod llm;
pub mod locale;
pub mod markers;
pub mod prompt;
pub mod reply;

pub use extract::ResponseExtractor;
pub use llm::{
    CompletionChoice, ConversationContext, GenerationConfig, ModelRuntime, RawCompletion, Role,
    RuntimeError, Turn, Usage,
};
pub use locale::Locale;
pub use prompt::{PromptBuilder, DEFAULT_HISTORY_LIMIT};
pub use reply::{ChatPipeline, Reply};
