//! Configuration tree.
//!
//! Every section has serde defaults so an empty (or absent) TOML file yields
//! a runnable dev configuration. Secrets are never stored in the file — the
//! config names the env vars they are read from.

use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub callback: CallbackConfig,
    #[serde(default)]
    pub finalizer: FinalizerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

impl Config {
    /// Parse a TOML config string.
    pub fn from_toml(raw: &str) -> crate::error::Result<Self> {
        toml::from_str(raw).map_err(|e| crate::error::Error::Config(e.to_string()))
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Server
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "d_port")]
    pub port: u16,
    #[serde(default = "d_host")]
    pub host: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: d_port(),
            host: d_host(),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Session store
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Base URL of the remote session-state service. `None` means
    /// memory-only operation from the start.
    #[serde(default)]
    pub remote_url: Option<String>,
    #[serde(default = "d_store_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "d_3")]
    pub max_retries: u32,
    /// Retention window for every mutating session key.
    #[serde(default = "d_retention_secs")]
    pub retention_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            remote_url: None,
            timeout_ms: d_store_timeout_ms(),
            max_retries: d_3(),
            retention_secs: d_retention_secs(),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Reply generation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// OpenAI-compatible chat completions endpoint. `None` disables tier 1
    /// and replies come from the rule-based pools only.
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "d_model")]
    pub model: String,
    /// Env var holding the provider API key.
    #[serde(default = "d_gen_key_env")]
    pub api_key_env: String,
    /// Hard deadline for one generation attempt.
    #[serde(default = "d_gen_timeout_secs")]
    pub timeout_secs: u64,
    /// Conversation window passed to the provider (last N messages).
    #[serde(default = "d_window")]
    pub window: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            model: d_model(),
            api_key_env: d_gen_key_env(),
            timeout_secs: d_gen_timeout_secs(),
            window: d_window(),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Case delivery callback
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallbackConfig {
    #[serde(default = "d_callback_url")]
    pub url: String,
    #[serde(default = "d_callback_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "d_3")]
    pub max_retries: u32,
    #[serde(default = "d_backoff_ms")]
    pub initial_backoff_ms: u64,
}

impl Default for CallbackConfig {
    fn default() -> Self {
        Self {
            url: d_callback_url(),
            timeout_secs: d_callback_timeout_secs(),
            max_retries: d_3(),
            initial_backoff_ms: d_backoff_ms(),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Auto-finalizer
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalizerConfig {
    #[serde(default = "d_poll_secs")]
    pub poll_interval_secs: u64,
    /// Volume trigger: finalize once this many messages are stored.
    #[serde(default = "d_min_messages")]
    pub min_messages: usize,
    /// Idle trigger: finalize after this much silence.
    #[serde(default = "d_idle_secs")]
    pub idle_secs: i64,
}

impl Default for FinalizerConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: d_poll_secs(),
            min_messages: d_min_messages(),
            idle_secs: d_idle_secs(),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Auth
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Env var holding comma-separated accepted API keys.
    #[serde(default = "d_api_keys_env")]
    pub api_keys_env: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            api_keys_env: d_api_keys_env(),
        }
    }
}

// ── serde default helpers ────────────────────────────────────────────

fn d_port() -> u16 {
    8000
}
fn d_host() -> String {
    "0.0.0.0".to_owned()
}
fn d_store_timeout_ms() -> u64 {
    3000
}
fn d_3() -> u32 {
    3
}
fn d_retention_secs() -> u64 {
    7 * 24 * 3600
}
fn d_model() -> String {
    "gpt-4o-mini".to_owned()
}
fn d_gen_key_env() -> String {
    "BAITLINE_LLM_API_KEY".to_owned()
}
fn d_gen_timeout_secs() -> u64 {
    15
}
fn d_window() -> usize {
    8
}
fn d_callback_url() -> String {
    "https://hackathon.guvi.in/api/updateHoneyPotFinalResult".to_owned()
}
fn d_callback_timeout_secs() -> u64 {
    5
}
fn d_backoff_ms() -> u64 {
    1000
}
fn d_poll_secs() -> u64 {
    10
}
fn d_min_messages() -> usize {
    5
}
fn d_idle_secs() -> i64 {
    300
}
fn d_api_keys_env() -> String {
    "BAITLINE_API_KEYS".to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let cfg = Config::from_toml("").unwrap();
        assert_eq!(cfg.server.port, 8000);
        assert_eq!(cfg.finalizer.min_messages, 5);
        assert_eq!(cfg.callback.max_retries, 3);
        assert!(cfg.store.remote_url.is_none());
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let cfg = Config::from_toml("[finalizer]\nmin_messages = 2\n").unwrap();
        assert_eq!(cfg.finalizer.min_messages, 2);
        assert_eq!(cfg.finalizer.idle_secs, 300);
    }
}
