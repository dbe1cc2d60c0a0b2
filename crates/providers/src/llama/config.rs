use std::{env, time::Duration};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Where the local inference server lives and how to talk to it.
#[derive(Clone, Debug, PartialEq)]
pub struct LlamaConfig {
    pub base_url: String,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub timeout: Duration,
    /// Check `/health` before the first completion so a missing or still
    /// loading model surfaces as a load failure.
    pub probe_health: bool,
}

impl Default for LlamaConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: None,
            api_key: None,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            probe_health: true,
        }
    }
}

impl LlamaConfig {
    pub fn apply_env(&mut self) {
        if let Ok(url) = env::var("CHAT_HANDLER_BASE_URL") {
            if !url.trim().is_empty() {
                self.base_url = url;
            }
        }
        if let Ok(m) = env::var("CHAT_HANDLER_MODEL") {
            self.model = Some(m).filter(|m| !m.trim().is_empty());
        }
        if let Ok(k) = env::var("CHAT_HANDLER_API_KEY") {
            self.api_key = Some(k).filter(|k| !k.trim().is_empty());
        }
    }
}
