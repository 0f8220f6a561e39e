// src/config/ai.rs
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path};
use tracing::warn;

pub const DEFAULT_AI_CONFIG_PATH: &str = "config/ai.json";
pub const ENV_AI_CONFIG_PATH: &str = "AI_CONFIG_PATH";

fn default_provider() -> String {
    "gemini".to_string()
}
fn default_api_key() -> String {
    "ENV".to_string()
}
fn default_connect_timeout_secs() -> u64 {
    4
}
fn default_timeout_secs() -> u64 {
    10
}
fn default_fallback_score() -> u8 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    #[serde(default)]
    pub enabled: bool,
    /// "gemini" | "openai" (case-insensitive)
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Provider model override; each provider has its own default.
    #[serde(default)]
    pub model: Option<String>,
    /// "ENV" means: read from GOOGLE_API_KEY / OPENAI_API_KEY (by provider)
    #[serde(default = "default_api_key")]
    pub api_key: String,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Upper bound for the whole request; the interactive cycle must not stall.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Counselor score used when the model call fails (clamped to 0..=3).
    #[serde(default = "default_fallback_score")]
    pub fallback_score: u8,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: default_provider(),
            model: None,
            api_key: default_api_key(),
            connect_timeout_secs: default_connect_timeout_secs(),
            timeout_secs: default_timeout_secs(),
            fallback_score: default_fallback_score(),
        }
    }
}

impl AiConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading AI config from {}", path.display()))?;
        let cfg: AiConfig = serde_json::from_str(&data)
            .with_context(|| format!("parsing AI config {}", path.display()))?;
        cfg.finalize()
    }

    /// Load using env var + fallbacks:
    /// 1) $AI_CONFIG_PATH (must exist)
    /// 2) config/ai.json
    /// 3) built-in defaults (AI disabled)
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = env::var(ENV_AI_CONFIG_PATH) {
            return Self::load_from_file(p);
        }
        let p = Path::new(DEFAULT_AI_CONFIG_PATH);
        if p.exists() {
            return Self::load_from_file(p);
        }
        Ok(Self::default())
    }

    /// Name of the env var holding the credential for the configured provider.
    pub fn api_key_env(&self) -> Option<&'static str> {
        match self.provider.as_str() {
            "gemini" => Some("GOOGLE_API_KEY"),
            "openai" => Some("OPENAI_API_KEY"),
            _ => None,
        }
    }

    fn finalize(mut self) -> Result<Self> {
        // Normalize provider
        self.provider = self.provider.trim().to_lowercase();

        // Resolve api key if "ENV". Only an enabled client needs the credential.
        // A missing key is not fatal: every call then fails with
        // MissingCredential and the fallback score applies.
        if self.api_key.trim().eq_ignore_ascii_case("env") {
            self.api_key = String::new();
            if self.enabled {
                let var = match self.api_key_env() {
                    Some(v) => v,
                    None => anyhow::bail!("Unsupported provider in config: {}", self.provider),
                };
                match env::var(var) {
                    Ok(key) if !key.trim().is_empty() => self.api_key = key.trim().to_string(),
                    _ => warn!(
                        provider = %self.provider,
                        "{var} is not set; counselor scoring will use the fallback score"
                    ),
                }
            }
        }

        // Sanitize numbers
        if self.connect_timeout_secs == 0 {
            self.connect_timeout_secs = default_connect_timeout_secs();
        }
        if self.timeout_secs == 0 {
            self.timeout_secs = default_timeout_secs();
        }
        self.fallback_score = self.fallback_score.min(3);

        Ok(self)
    }
}
