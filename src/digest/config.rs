use crate::digest::paths::default_digest_home;
use crate::error::DigestError;
use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

include!(concat!(env!("OUT_DIR"), "/env_allowlist.rs"));

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f64,
    pub request_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".to_string(),
            model: "gpt-4o-mini".to_string(),
            max_tokens: 500,
            temperature: 0.3,
            request_timeout_secs: 60,
        }
    }
}

impl ApiConfig {
    pub fn chat_completions_url(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        format!("{base}/v1/chat/completions")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    pub page_text_chars: usize,
    pub prompt_chars: usize,
    pub max_saved_summaries: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            page_text_chars: 5000,
            prompt_chars: 4000,
            max_saved_summaries: 50,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageConfig {
    /// Zero waits for the broker forever.
    pub reply_timeout_secs: u64,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            reply_timeout_secs: 90,
        }
    }
}

impl PageConfig {
    pub fn reply_timeout(&self) -> Option<Duration> {
        (self.reply_timeout_secs > 0).then(|| Duration::from_secs(self.reply_timeout_secs))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DigestConfig {
    pub api: ApiConfig,
    pub limits: LimitsConfig,
    pub page: PageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialDigestConfig {
    api: Option<ApiConfig>,
    limits: Option<LimitsConfig>,
    page: Option<PageConfig>,
}

fn env_or_f64(var: &str, fallback: f64) -> f64 {
    match env::var(var) {
        Ok(v) => v.trim().parse::<f64>().ok().unwrap_or(fallback),
        Err(_) => fallback,
    }
}

fn env_or_u64(var: &str, fallback: u64) -> u64 {
    match env::var(var) {
        Ok(v) => v.trim().parse::<u64>().ok().unwrap_or(fallback),
        Err(_) => fallback,
    }
}

fn env_or_u32(var: &str, fallback: u32) -> u32 {
    match env::var(var) {
        Ok(v) => v.trim().parse::<u32>().ok().unwrap_or(fallback),
        Err(_) => fallback,
    }
}

fn env_or_usize(var: &str, fallback: usize) -> usize {
    match env::var(var) {
        Ok(v) => v.trim().parse::<usize>().ok().unwrap_or(fallback),
        Err(_) => fallback,
    }
}

fn env_or_string(var: &str, fallback: &str) -> String {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => fallback.to_string(),
    }
}

fn validate(cfg: &DigestConfig) -> Result<()> {
    let invalid = |msg: &str| anyhow!(DigestError::InvalidConfig(msg.to_string()));

    if cfg.api.base_url.trim().is_empty() {
        return Err(invalid("api base url cannot be empty"));
    }
    if cfg.api.model.trim().is_empty() {
        return Err(invalid("api model cannot be empty"));
    }
    if cfg.api.max_tokens == 0 {
        return Err(invalid("api max_tokens must be >= 1"));
    }
    if !(0.0..=2.0).contains(&cfg.api.temperature) {
        return Err(invalid("api temperature must be within 0.0..=2.0"));
    }
    if cfg.limits.page_text_chars == 0 {
        return Err(invalid("page_text_chars must be >= 1"));
    }
    if cfg.limits.prompt_chars == 0 {
        return Err(invalid("prompt_chars must be >= 1"));
    }
    if cfg.limits.max_saved_summaries == 0 {
        return Err(invalid("max_saved_summaries must be >= 1"));
    }
    Ok(())
}

fn config_path_from(custom: Option<String>, digest_home: Option<PathBuf>) -> Option<PathBuf> {
    if let Some(custom) = custom {
        let trimmed = custom.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed));
        }
    }
    Some(digest_home?.join("digest.toml"))
}

/// `DIGEST_CONFIG_PATH`, else `digest.toml` inside the digest home.
pub fn resolve_config_path() -> Option<PathBuf> {
    config_path_from(
        env::var("DIGEST_CONFIG_PATH").ok(),
        default_digest_home().ok(),
    )
}

fn merge_toml(base: &mut DigestConfig, raw: &str, origin: &Path) -> Result<()> {
    let parsed: PartialDigestConfig = toml::from_str(raw).map_err(|err| {
        anyhow!(DigestError::InvalidConfig(format!(
            "failed to parse {}: {err}",
            origin.display()
        )))
    })?;
    if let Some(api) = parsed.api {
        base.api = api;
    }
    if let Some(limits) = parsed.limits {
        base.limits = limits;
    }
    if let Some(page) = parsed.page {
        base.page = page;
    }
    Ok(())
}

fn merge_file_config(base: &mut DigestConfig) -> Result<()> {
    let Some(path) = resolve_config_path() else {
        return Ok(());
    };
    if !path.exists() {
        return Ok(());
    }

    let raw = fs::read_to_string(&path)?;
    merge_toml(base, &raw, &path)
}

pub fn load_config() -> Result<DigestConfig> {
    let mut cfg = DigestConfig::default();
    merge_file_config(&mut cfg)?;

    cfg.api.base_url = env_or_string("DIGEST_API_BASE_URL", &cfg.api.base_url);
    cfg.api.model = env_or_string("DIGEST_MODEL", &cfg.api.model);
    cfg.api.max_tokens = env_or_u32("DIGEST_MAX_TOKENS", cfg.api.max_tokens);
    cfg.api.temperature = env_or_f64("DIGEST_TEMPERATURE", cfg.api.temperature);
    cfg.api.request_timeout_secs =
        env_or_u64("DIGEST_REQUEST_TIMEOUT_SECS", cfg.api.request_timeout_secs);
    cfg.limits.page_text_chars =
        env_or_usize("DIGEST_PAGE_TEXT_CHARS", cfg.limits.page_text_chars);
    cfg.limits.prompt_chars = env_or_usize("DIGEST_PROMPT_CHARS", cfg.limits.prompt_chars);
    cfg.limits.max_saved_summaries =
        env_or_usize("DIGEST_MAX_SAVED_SUMMARIES", cfg.limits.max_saved_summaries);
    cfg.page.reply_timeout_secs =
        env_or_u64("DIGEST_REPLY_TIMEOUT_SECS", cfg.page.reply_timeout_secs);

    validate(&cfg)?;
    Ok(cfg)
}

/// Recognised environment keys that are currently set.
pub fn env_overrides_set() -> Vec<String> {
    GENERATED_ENV_ALLOWLIST
        .iter()
        .filter(|key| env::var_os(key).is_some())
        .map(|key| key.to_string())
        .collect()
}
