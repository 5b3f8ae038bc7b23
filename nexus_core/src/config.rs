//! Configuration for Nexus.
//!
//! Loaded from `~/.config/nexus/config.toml` (or `%APPDATA%\nexus\config.toml`),
//! then overridden from the environment. Every field has a default, so a
//! missing file is a valid configuration.

use crate::aggregator::Kind;
use crate::gemini::{
    GenerationOptions, DEFAULT_BASE_URL, DEFAULT_MAX_OUTPUT_TOKENS, DEFAULT_MODEL,
    DEFAULT_TEMPERATURE,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Default per-source timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Shared backend for the news, image, video and web sources
pub const DEFAULT_SEARCH_BASE_URL: &str = "https://nexus-search.onrender.com";

/// Default token lifetime (7 days)
pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 24 * 7;

const REDACTED: &str = "********";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid TOML in config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NexusConfig {
    pub gemini: GeminiConfig,
    pub search: SearchConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
        }
    }
}

impl GeminiConfig {
    pub fn generation_options(&self) -> GenerationOptions {
        GenerationOptions {
            temperature: self.temperature,
            max_output_tokens: self.max_output_tokens,
        }
    }
}

/// Per-source overrides. Unset fields fall back to the built-in source
/// settings returned by [`builtin_source`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

/// Fully resolved settings for one source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSettings {
    pub enabled: bool,
    pub base_url: String,
    pub path: String,
    pub limit: usize,
}

impl SourceSettings {
    fn new(base_url: &str, path: &str, limit: usize) -> Self {
        Self {
            enabled: true,
            base_url: base_url.to_string(),
            path: path.to_string(),
            limit,
        }
    }

    /// `base_url` + `path`, without doubled slashes.
    pub fn endpoint(&self) -> String {
        crate::utils::join_url(&self.base_url, &self.path)
    }
}

/// Built-in settings for each source kind.
pub fn builtin_source(kind: Kind, search_base_url: &str) -> SourceSettings {
    match kind {
        Kind::Encyclopedia => {
            SourceSettings::new("https://en.wikipedia.org", "/api/rest_v1/page/summary", 1)
        }
        Kind::Web => SourceSettings::new(search_base_url, "/api/searchWeb", 5),
        Kind::Dictionary => {
            SourceSettings::new("https://api.dictionaryapi.dev", "/api/v2/entries/en", 3)
        }
        Kind::News => SourceSettings::new(search_base_url, "/api/searchNews", 8),
        Kind::Image => SourceSettings::new(search_base_url, "/api/searchImages", 12),
        Kind::Video => SourceSettings::new(search_base_url, "/api/youtube/search", 6),
        // Music is routed through the text-generation client.
        Kind::Music => SourceSettings::new("", "", 8),
        Kind::Blog => SourceSettings::new("", "", 5),
        Kind::Synthesized => SourceSettings::new("", "", 1),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Per-source timeout in milliseconds
    pub timeout_ms: u64,
    /// Base URL of the news/image/video/web backend
    pub base_url: String,
    pub encyclopedia: SourceOverrides,
    pub web: SourceOverrides,
    pub dictionary: SourceOverrides,
    pub news: SourceOverrides,
    pub images: SourceOverrides,
    pub videos: SourceOverrides,
    pub music: SourceOverrides,
    pub blogs: SourceOverrides,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            base_url: DEFAULT_SEARCH_BASE_URL.to_string(),
            encyclopedia: SourceOverrides::default(),
            web: SourceOverrides::default(),
            dictionary: SourceOverrides::default(),
            news: SourceOverrides::default(),
            images: SourceOverrides::default(),
            videos: SourceOverrides::default(),
            music: SourceOverrides::default(),
            blogs: SourceOverrides::default(),
        }
    }
}

impl SearchConfig {
    fn overrides_for(&self, kind: Kind) -> Option<&SourceOverrides> {
        match kind {
            Kind::Encyclopedia => Some(&self.encyclopedia),
            Kind::Web => Some(&self.web),
            Kind::Dictionary => Some(&self.dictionary),
            Kind::News => Some(&self.news),
            Kind::Image => Some(&self.images),
            Kind::Video => Some(&self.videos),
            Kind::Music => Some(&self.music),
            Kind::Blog => Some(&self.blogs),
            Kind::Synthesized => None,
        }
    }

    /// Effective settings for a source: overrides first, then built-ins.
    pub fn source(&self, kind: Kind) -> SourceSettings {
        let builtin = builtin_source(kind, &self.base_url);
        let Some(o) = self.overrides_for(kind) else {
            return builtin;
        };
        SourceSettings {
            enabled: o.enabled.unwrap_or(builtin.enabled),
            base_url: o.base_url.clone().unwrap_or(builtin.base_url),
            path: o.path.clone().unwrap_or(builtin.path),
            limit: o.limit.unwrap_or(builtin.limit),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite file; defaults to `<data dir>/nexus/nexus.db`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl DatabaseConfig {
    pub fn resolved_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .or_else(|| dirs::home_dir().map(|p| p.join(".local").join("share")))
                .unwrap_or_else(|| PathBuf::from("."))
                .join("nexus")
                .join("nexus.db")
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_secret: Option<String>,
    pub token_ttl_hours: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_secret: None,
            token_ttl_hours: DEFAULT_TOKEN_TTL_HOURS,
        }
    }
}

impl NexusConfig {
    /// `~/.config/nexus/config.toml` on Unix, `%APPDATA%\nexus\config.toml` on Windows.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|p| p.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."))
            .join("nexus")
            .join("config.toml")
    }

    /// Load from `path` (or the default path), then apply the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::default_path);

        let mut config = match std::fs::read_to_string(&path) {
            Ok(raw) => {
                debug!(path = %path.display(), "Loaded config file");
                Self::from_toml_str(&raw)?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "No config file, using defaults");
                Self::default()
            }
            Err(source) => return Err(ConfigError::Io { path, source }),
        };

        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    /// Apply environment overrides through `lookup` (the process env in
    /// [`NexusConfig::load`], a map in tests).
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty("GEMINI_API_KEY").or_else(|| non_empty("GOOGLE_API_KEY")) {
            self.gemini.api_key = Some(key);
        }
        if let Some(model) = non_empty("NEXUS_GEMINI_MODEL") {
            self.gemini.model = model;
        }
        if let Some(base) = non_empty("NEXUS_SEARCH_BASE_URL") {
            self.search.base_url = base;
        }
        if let Some(path) = non_empty("NEXUS_DATABASE_PATH") {
            self.database.path = Some(PathBuf::from(path));
        }
        if let Some(secret) = non_empty("NEXUS_TOKEN_SECRET") {
            self.auth.token_secret = Some(secret);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.search.timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "search.timeout_ms must be greater than 0".into(),
            ));
        }
        if !(0.0..=2.0).contains(&self.gemini.temperature) {
            return Err(ConfigError::Invalid(
                "gemini.temperature must be between 0.0 and 2.0".into(),
            ));
        }
        if self.gemini.max_output_tokens == 0 {
            return Err(ConfigError::Invalid(
                "gemini.max_output_tokens must be greater than 0".into(),
            ));
        }
        if self.gemini.model.trim().is_empty() {
            return Err(ConfigError::Invalid("gemini.model must not be empty".into()));
        }
        for kind in Kind::source_kinds() {
            if self.search.source(*kind).limit == 0 {
                return Err(ConfigError::Invalid(format!(
                    "search.{} limit must be greater than 0",
                    kind
                )));
            }
        }
        if self.auth.token_ttl_hours <= 0 {
            return Err(ConfigError::Invalid(
                "auth.token_ttl_hours must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// Copy with every secret replaced, for display.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.gemini.api_key.is_some() {
            copy.gemini.api_key = Some(REDACTED.to_string());
        }
        if copy.auth.token_secret.is_some() {
            copy.auth.token_secret = Some(REDACTED.to_string());
        }
        copy
    }
}
