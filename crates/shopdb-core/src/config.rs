//! Lightweight configuration loader and path helpers.
//!
//! Uses Figment to merge built-in defaults + `config.toml` + `config.<env>.toml`
//! + `APP_*` env vars (`__` separates nested keys, e.g. `APP_SEARCH__TOP_K`).
//! Provides helpers to expand `~` and `${VAR}` and to resolve relative paths
//! against a known base directory.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::from(Serialized::defaults(Settings::default())).merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.settings()?;
        Ok(config)
    }

    /// Wraps an already assembled figment, e.g. one built from TOML strings in tests.
    pub fn from_figment(figment: Figment) -> Self {
        Self { figment }
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    /// Typed, validated settings.
    pub fn settings(&self) -> anyhow::Result<Settings> {
        let settings: Settings = self
            .figment
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to extract settings: {}", e))?;
        settings.validate()?;
        Ok(settings)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data: DataSettings,
    pub index: IndexSettings,
    pub search: SearchSettings,
    pub chat: ChatSettings,
    pub responder: ResponderSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    pub catalog_dir: String,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self { catalog_dir: "data".to_string() }
    }
}

/// Term-weighting parameters of the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    pub max_features: usize,
    /// Minimum number of documents a term must occur in.
    pub min_df: usize,
    /// Maximum fraction of documents a term may occur in.
    pub max_df: f64,
    pub max_ngram: usize,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self { max_features: 15_000, min_df: 2, max_df: 0.9, max_ngram: 3 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub default_top_k: usize,
    pub max_top_k: usize,
    pub candidate_pool: usize,
    pub min_score: f32,
    pub per_page: usize,
    pub max_per_page: usize,
    pub strict_ranges: bool,
    pub recommend_min_score: f32,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            default_top_k: 10,
            max_top_k: 50,
            candidate_pool: 200,
            min_score: 0.05,
            per_page: 10,
            max_per_page: 100,
            strict_ranges: false,
            recommend_min_score: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatSettings {
    pub top_k: usize,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self { top_k: 3 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponderKind {
    Gemini,
    Noop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Casual,
    Formal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponderSettings {
    pub kind: ResponderKind,
    pub endpoint: String,
    pub model: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    pub timeout_secs: u64,
    pub retries: u32,
    pub retry_delay_ms: u64,
    pub tone: Tone,
}

impl Default for ResponderSettings {
    fn default() -> Self {
        Self {
            kind: ResponderKind::Gemini,
            endpoint: "https://generativelanguage.googleapis.com/v1beta/models".to_string(),
            model: "gemini-1.5-flash".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            timeout_secs: 30,
            retries: 2,
            retry_delay_ms: 5_000,
            tone: Tone::Casual,
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| -> Result<()> { Err(Error::InvalidConfig(msg)) };
        let ix = &self.index;
        if ix.min_df == 0 {
            return invalid("index.min_df must be at least 1".into());
        }
        if !(ix.max_df > 0.0 && ix.max_df <= 1.0) {
            return invalid(format!("index.max_df must be in (0, 1], got {}", ix.max_df));
        }
        if ix.max_ngram == 0 || ix.max_features == 0 {
            return invalid("index.max_ngram and index.max_features must be positive".into());
        }
        let s = &self.search;
        if s.default_top_k > s.max_top_k {
            return invalid(format!(
                "search.default_top_k ({}) exceeds search.max_top_k ({})",
                s.default_top_k, s.max_top_k
            ));
        }
        if !(0.0..=1.0).contains(&s.min_score) {
            return invalid(format!("search.min_score must be in [0, 1], got {}", s.min_score));
        }
        if s.per_page == 0 || s.max_per_page == 0 {
            return invalid("search.per_page and search.max_per_page must be positive".into());
        }
        Ok(())
    }

    /// Catalog directory with `~`/`$VAR` expanded, relative to `base`.
    pub fn catalog_dir(&self, base: &Path) -> PathBuf {
        resolve_with_base(base, &self.data.catalog_dir)
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    // Expand env vars first
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    // Expand ~ at start
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
