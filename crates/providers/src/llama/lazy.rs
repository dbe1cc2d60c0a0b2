use chat_core::llm::{GenerationConfig, ModelRuntime, RawCompletion, RuntimeError};
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::llama::{client::LlamaClient, config::LlamaConfig};

/// Model handle that loads on first use and is then reused for the life of
/// the process. A failed load is not remembered; the next call tries again.
///
/// The engine is not reentrant, so a long-lived caller should serialize
/// `complete` calls on one handle.
pub struct LazyLlama {
    cfg: LlamaConfig,
    cell: OnceCell<LlamaClient>,
}

impl LazyLlama {
    pub fn new(cfg: LlamaConfig) -> Self {
        Self {
            cfg,
            cell: OnceCell::new(),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.initialized()
    }

    pub async fn handle(&self) -> Result<&LlamaClient, RuntimeError> {
        self.cell
            .get_or_try_init(|| async {
                info!(target: "providers::llama", "loading model from {}", self.cfg.base_url);
                LlamaClient::load(self.cfg.clone()).await.map_err(|e| {
                    warn!(target: "providers::llama", "model load failed: {}", e);
                    e
                })
            })
            .await
    }
}

#[allow(async_fn_in_trait)]
impl ModelRuntime for LazyLlama {
    async fn complete(
        &self,
        prompt: &str,
        cfg: &GenerationConfig,
    ) -> Result<Option<RawCompletion>, RuntimeError> {
        self.handle().await?.complete(prompt, cfg).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llama::client::test_server::{closed_port, serve};

    const OK_HEALTH: &str = r#"{"status":"ok"}"#;
    const HELLO: &str = r#"{"choices":[{"text":"hello","finish_reason":"stop"}]}"#;

    fn cfg(base: String) -> LlamaConfig {
        LlamaConfig {
            base_url: base,
            ..LlamaConfig::default()
        }
    }

    #[tokio::test]
    async fn nothing_is_loaded_until_first_use() {
        let lazy = LazyLlama::new(cfg(closed_port().await));
        assert!(!lazy.is_loaded());
        let err = lazy.complete("p", &GenerationConfig::default()).await.unwrap_err();
        assert!(err.is_load(), "{err}");
        assert!(!lazy.is_loaded());
    }

    #[tokio::test]
    async fn failed_load_is_retried_and_success_is_cached() {
        let (base, server) = serve(vec![
            (503, r#"{"error":"loading"}"#),
            (200, OK_HEALTH),
            (200, HELLO),
            (200, HELLO),
        ])
        .await;
        let lazy = LazyLlama::new(cfg(base));
        let generation = GenerationConfig::default();

        assert!(lazy.complete("p", &generation).await.unwrap_err().is_load());
        assert!(!lazy.is_loaded());

        let first = lazy.complete("p", &generation).await.unwrap().unwrap();
        assert_eq!(first.choices[0].text, "hello");
        assert!(lazy.is_loaded());

        lazy.complete("p", &generation).await.unwrap();
        let seen = server.await.unwrap();
        assert_eq!(seen.len(), 4);
        assert!(seen[0].starts_with("GET /health"));
        assert!(seen[1].starts_with("GET /health"));
        assert!(seen[2].starts_with("POST /v1/completions"));
        assert!(seen[3].starts_with("POST /v1/completions"));
    }
}
