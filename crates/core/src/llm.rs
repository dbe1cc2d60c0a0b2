use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::markers;

/// Speaker of a history turn. Anything other than `"user"` / `"assistant"`
/// is kept verbatim so the prompt builder can skip it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    User,
    Assistant,
    Other(String),
}

impl From<String> for Role {
    fn from(s: String) -> Self {
        match s.as_str() {
            "user" => Role::User,
            "assistant" => Role::Assistant,
            _ => Role::Other(s),
        }
    }
}

impl From<Role> for String {
    fn from(r: Role) -> Self {
        match r {
            Role::User => "user".to_string(),
            Role::Assistant => "assistant".to_string(),
            Role::Other(s) => s,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn user<S: Into<String>>(s: S) -> Self {
        Self {
            role: Role::User,
            content: s.into(),
        }
    }
    pub fn assistant<S: Into<String>>(s: S) -> Self {
        Self {
            role: Role::Assistant,
            content: s.into(),
        }
    }
}

/// One invocation's worth of input: the current message and the
/// chronological history (oldest first).
#[derive(Clone, Debug, Default)]
pub struct ConversationContext {
    pub message: String,
    pub history: Vec<Turn>,
}

impl ConversationContext {
    pub fn new<S: Into<String>>(message: S, history: Vec<Turn>) -> Self {
        Self {
            message: message.into(),
            history,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub max_tokens: u32,
    pub temperature: f32,
    /// Ordered; the engine halts before emitting any of these.
    pub stop_sequences: Vec<String>,
    pub echo: bool,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_tokens: 128,
            temperature: 0.7,
            stop_sequences: markers::stop_sequences(),
            echo: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompletionChoice {
    pub text: String,
    pub finish_reason: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Usage {
    pub prompt_tokens: Option<u32>,
    pub completion_tokens: Option<u32>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawCompletion {
    pub choices: Vec<CompletionChoice>,
    pub usage: Option<Usage>,
}

impl RawCompletion {
    pub fn from_text<S: Into<String>>(text: S) -> Self {
        Self {
            choices: vec![CompletionChoice {
                text: text.into(),
                finish_reason: None,
            }],
            usage: None,
        }
    }

    pub fn first(&self) -> Option<&CompletionChoice> {
        self.choices.first()
    }
}

#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("model load: {0}")] Load(String),
    #[error("timeout: {0}")] Timeout(String),
    #[error("network: {0}")] Network(String),
    #[error("decode: {0}")] Decode(String),
    #[error("protocol: {0}")] Protocol(String),
    #[error("other: {0}")] Other(String),
}

impl RuntimeError {
    /// True when the model never became usable, as opposed to a fault
    /// during generation.
    pub fn is_load(&self) -> bool {
        matches!(self, RuntimeError::Load(_))
    }
}

/// Text-completion capability of the local inference engine.
///
/// `Ok(None)` means the engine answered with nothing at all; callers treat
/// it like a completion with zero choices.
#[allow(async_fn_in_trait)]
pub trait ModelRuntime: Send + Sync {
    async fn complete(
        &self,
        prompt: &str,
        cfg: &GenerationConfig,
    ) -> Result<Option<RawCompletion>, RuntimeError>;
}
