use anyhow::Context;
use chat_core::{
    markers, ChatPipeline, GenerationConfig, Locale, PromptBuilder, ResponseExtractor,
    DEFAULT_HISTORY_LIMIT,
};
use directories::BaseDirs;
use serde::Deserialize;
use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};
use thiserror::Error;
use tracing::{debug, info};

use crate::llama::LlamaConfig;

/// Shape of `config.toml`. Every key is optional; absent keys keep their
/// defaults.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct FileConfig {
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub timeout_ms: Option<u64>,
    pub probe_health: Option<bool>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub stop_sequences: Option<Vec<String>>,
    pub leakage_markers: Option<Vec<String>>,
    pub history_limit: Option<usize>,
    pub locale: Option<Locale>,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Clone, Debug)]
pub struct Settings {
    pub runtime: LlamaConfig,
    pub generation: GenerationConfig,
    pub history_limit: usize,
    pub locale: Locale,
    /// Replaces the built-in leakage list when set. Stop sequences are still
    /// appended after it.
    pub leakage_markers: Option<Vec<String>>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            runtime: LlamaConfig::default(),
            generation: GenerationConfig::default(),
            history_limit: DEFAULT_HISTORY_LIMIT,
            locale: Locale::default(),
            leakage_markers: None,
        }
    }
}

impl Settings {
    /// Defaults, then the config file if there is one, then environment.
    pub fn from_env_and_file() -> anyhow::Result<Self> {
        let mut settings = match Self::config_path() {
            Some((path, explicit)) if explicit || path.exists() => {
                info!(target: "providers::config", "loading config from {}", path.display());
                Self::from_path(&path)
                    .with_context(|| format!("config file {}", path.display()))?
            }
            _ => {
                debug!(target: "providers::config", "no config file, using defaults");
                Self::default()
            }
        };
        settings.runtime.apply_env();
        Ok(settings)
    }

    /// Defaults plus environment, skipping the config file.
    pub fn from_env() -> Self {
        let mut settings = Self::default();
        settings.runtime.apply_env();
        settings
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let file: FileConfig = toml::from_str(text)?;
        let mut settings = Self::default();
        settings.apply(file)?;
        Ok(settings)
    }

    pub fn apply(&mut self, file: FileConfig) -> Result<(), ConfigError> {
        if let Some(url) = file.base_url {
            if url.trim().is_empty() {
                return Err(invalid("base_url", "must not be empty"));
            }
            self.runtime.base_url = url;
        }
        if let Some(m) = file.model {
            self.runtime.model = Some(m);
        }
        if let Some(k) = file.api_key {
            self.runtime.api_key = Some(k);
        }
        if let Some(t) = file.timeout_ms {
            if t == 0 {
                return Err(invalid("timeout_ms", "must be positive"));
            }
            self.runtime.timeout = Duration::from_millis(t);
        }
        if let Some(p) = file.probe_health {
            self.runtime.probe_health = p;
        }
        if let Some(n) = file.max_tokens {
            if n == 0 {
                return Err(invalid("max_tokens", "must be positive"));
            }
            self.generation.max_tokens = n;
        }
        if let Some(t) = file.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(invalid("temperature", format!("{} is outside 0.0..=2.0", t)));
            }
            self.generation.temperature = t;
        }
        if let Some(stops) = file.stop_sequences {
            self.generation.stop_sequences = stops.into_iter().filter(|s| !s.is_empty()).collect();
        }
        if let Some(m) = file.leakage_markers {
            self.leakage_markers = Some(m);
        }
        if let Some(h) = file.history_limit {
            self.history_limit = h;
        }
        if let Some(l) = file.locale {
            self.locale = l;
        }
        Ok(())
    }

    pub fn pipeline(&self) -> ChatPipeline {
        let prompt = PromptBuilder::new(self.locale).with_history_limit(self.history_limit);
        let extractor = match &self.leakage_markers {
            Some(base) => ResponseExtractor::new(
                markers::merge_markers(base.as_slice(), &self.generation.stop_sequences),
                self.locale,
            ),
            None => ResponseExtractor::for_generation(&self.generation, self.locale),
        };
        ChatPipeline::new(prompt, extractor, self.generation.clone())
    }

    /// `$CHAT_HANDLER_CONFIG` (explicit, must exist) or the per-user default.
    fn config_path() -> Option<(PathBuf, bool)> {
        if let Ok(p) = env::var("CHAT_HANDLER_CONFIG") {
            if !p.trim().is_empty() {
                return Some((PathBuf::from(p), true));
            }
        }
        let base = BaseDirs::new()?;
        let p = if cfg!(target_os = "windows") {
            base.home_dir().join(".chat-handler").join("config.toml")
        } else {
            base.config_dir().join("chat-handler").join("config.toml")
        };
        Some((p, false))
    }
}

fn invalid(key: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        key,
        reason: reason.into(),
    }
}
