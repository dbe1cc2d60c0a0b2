use tracing::{debug, error, info};

use crate::extract::ResponseExtractor;
use crate::llm::{ConversationContext, GenerationConfig, ModelRuntime, RuntimeError};
use crate::locale::Locale;
use crate::prompt::PromptBuilder;

/// The reply handed back to the caller. `fault` is set when `text` is a
/// fallback standing in for a failed model call.
#[derive(Debug)]
pub struct Reply {
    pub text: String,
    pub fault: Option<RuntimeError>,
}

/// Prompt assembly, one model call, and reply extraction.
///
/// The model handle is passed in per call; the pipeline itself holds no
/// engine state.
#[derive(Clone, Debug)]
pub struct ChatPipeline {
    prompt: PromptBuilder,
    extractor: ResponseExtractor,
    generation: GenerationConfig,
}

impl Default for ChatPipeline {
    fn default() -> Self {
        Self::for_locale(Locale::default())
    }
}

impl ChatPipeline {
    pub fn new(
        prompt: PromptBuilder,
        extractor: ResponseExtractor,
        generation: GenerationConfig,
    ) -> Self {
        Self {
            prompt,
            extractor,
            generation,
        }
    }

    pub fn for_locale(locale: Locale) -> Self {
        let generation = GenerationConfig::default();
        Self {
            prompt: PromptBuilder::new(locale),
            extractor: ResponseExtractor::for_generation(&generation, locale),
            generation,
        }
    }

    pub fn locale(&self) -> Locale {
        self.prompt.locale()
    }

    pub fn generation(&self) -> &GenerationConfig {
        &self.generation
    }

    pub fn prompt_builder(&self) -> &PromptBuilder {
        &self.prompt
    }

    pub fn extractor(&self) -> &ResponseExtractor {
        &self.extractor
    }

    /// Fallible generation step. Empty completions are not errors; only
    /// engine faults come back as `Err`.
    pub async fn generate<R: ModelRuntime>(
        &self,
        runtime: &R,
        ctx: &ConversationContext,
    ) -> Result<String, RuntimeError> {
        let prompt = self.prompt.build(&ctx.message, &ctx.history);
        debug!(target: "core::reply", "prompt built: history={} kept={} chars={}",
            ctx.history.len(), self.prompt.window(&ctx.history).len(), prompt.chars().count());

        let raw = runtime.complete(&prompt, &self.generation).await?;
        match raw.as_ref() {
            Some(r) => {
                let finish = r.first().and_then(|c| c.finish_reason.as_deref());
                let usage = r.usage.unwrap_or_default();
                debug!(target: "core::reply", "completion: choices={} finish={:?} prompt_tokens={:?} completion_tokens={:?}",
                    r.choices.len(), finish, usage.prompt_tokens, usage.completion_tokens);
            }
            None => info!(target: "core::reply", "engine returned no completion"),
        }
        Ok(self.extractor.extract(raw.as_ref()))
    }

    /// Like [`generate`](Self::generate) but always yields a usable reply,
    /// substituting the locale's fallback for any engine fault.
    pub async fn respond<R: ModelRuntime>(
        &self,
        runtime: &R,
        ctx: &ConversationContext,
    ) -> Reply {
        match self.generate(runtime, ctx).await {
            Ok(text) => Reply { text, fault: None },
            Err(e) => {
                let locale = self.locale();
                let text = if e.is_load() {
                    error!(target: "core::reply", "model unavailable: {}", e);
                    locale.model_unavailable()
                } else {
                    error!(target: "core::reply", "generation failed: {}", e);
                    locale.processing_error()
                };
                Reply {
                    text: text.to_string(),
                    fault: Some(e),
                }
            }
        }
    }
}
