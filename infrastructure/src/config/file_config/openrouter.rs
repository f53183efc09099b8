//! Upstream endpoint configuration from TOML (`[openrouter]` section)

use serde::{Deserialize, Serialize};

pub const DEFAULT_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

/// Raw OpenRouter configuration from TOML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOpenRouterConfig {
    /// Chat completions endpoint
    pub api_url: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// Inline API key (prefer `api_key_env`)
    pub api_key: Option<String>,
    /// Sent as `HTTP-Referer` for attribution
    pub referer: Option<String>,
    /// Sent as `X-Title` for attribution
    pub app_title: Option<String>,
}

impl Default for FileOpenRouterConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key_env: "OPENROUTER_API_KEY".to_string(),
            api_key: None,
            referer: None,
            app_title: None,
        }
    }
}

impl FileOpenRouterConfig {
    /// Inline key first, then the configured environment variable.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| {
                std::env::var(&self.api_key_env)
                    .ok()
                    .filter(|k| !k.trim().is_empty())
            })
    }
}
