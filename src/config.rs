// src/config.rs

use std::{fs, path::Path};

use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmSection,
}

/// Which extraction backend handles document text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmBackend {
    /// Regex heuristics only — no model call.
    #[default]
    Heuristics,
    /// Local Ollama server, OpenAI-compatible endpoint.
    Ollama,
    /// Hosted OpenAI-compatible API; needs LLM_API_KEY.
    Remote,
}

#[derive(Debug, Default, Deserialize)]
pub struct LlmSection {
    #[serde(default)]
    pub backend: LlmBackend,
    #[serde(default)]
    pub ollama: OllamaConfig,
    #[serde(default)]
    pub remote: RemoteConfig,
}

#[derive(Debug, Deserialize)]
pub struct OllamaConfig {
    #[serde(default = "default_ollama_url")]
    pub base_url: String,
    #[serde(default = "default_ollama_model")]
    pub model: String,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: default_ollama_url(),
            model: default_ollama_model(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RemoteConfig {
    #[serde(default = "default_remote_url")]
    pub base_url: String,
    #[serde(default = "default_remote_model")]
    pub model: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: default_remote_url(),
            model: default_remote_model(),
        }
    }
}

fn default_ollama_url() -> String {
    "http://localhost:11434/v1".to_string()
}

fn default_ollama_model() -> String {
    "qwen2.5:7b".to_string()
}

fn default_remote_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_remote_model() -> String {
    "gpt-4o-mini".to_string()
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Box<dyn std::error::Error>> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_defaults_to_heuristics() {
        let cfg: Config = toml::from_str("").unwrap();
        assert_eq!(cfg.llm.backend, LlmBackend::Heuristics);
        assert_eq!(cfg.llm.ollama.base_url, "http://localhost:11434/v1");
    }

    #[test]
    fn test_backend_selection_parses() {
        let cfg: Config = toml::from_str(
            "[llm]\nbackend = \"ollama\"\n\n[llm.ollama]\nmodel = \"llama3.2\"\n",
        )
        .unwrap();
        assert_eq!(cfg.llm.backend, LlmBackend::Ollama);
        assert_eq!(cfg.llm.ollama.model, "llama3.2");
        // unset keys keep their defaults
        assert_eq!(cfg.llm.ollama.base_url, "http://localhost:11434/v1");
    }
}
