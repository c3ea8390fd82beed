//! Configuration module for filingrag.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file
//! - Environment variable overrides
//!
//! `--config <path>` picks the file; otherwise `.filingrag/settings.toml` is
//! searched from the current directory upwards.
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `FILINGRAG_` and use double
//! underscores to separate nested levels:
//! - `FILINGRAG_RETRIEVAL__TOP_K=8` sets `retrieval.top_k`
//! - `FILINGRAG_EMBEDDING__PROVIDER=hash` sets `embedding.provider`
//! - `FILINGRAG_CHUNKING__OVERLAP_CHARS=100` sets `chunking.overlap_chars`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::document::ChunkingConfig;
use crate::index::SimilarityMetric;

const CONFIG_DIR: &str = ".filingrag";
const CONFIG_FILE: &str = "settings.toml";
const ENV_PREFIX: &str = "FILINGRAG_";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Workspace root (directory containing `.filingrag`); detected when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_root: Option<PathBuf>,

    /// Directory holding named indexes, relative to the workspace root
    #[serde(default = "default_index_path")]
    pub index_path: PathBuf,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub extraction: ExtractionConfig,

    #[serde(default)]
    pub chunking: ChunkingConfig,

    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub generation: GenerationConfig,

    #[serde(default)]
    pub retrieval: RetrievalConfig,

    #[serde(default)]
    pub summary: SummaryConfig,
}

/// Log levels, globally and per target.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Level applied to every target without an override
    #[serde(default = "default_log_level")]
    pub default: String,

    /// Per-target overrides, e.g. `index = "debug"`
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ExtractionConfig {
    /// Case-insensitive phrases a page must contain to be kept
    #[serde(default = "default_keywords")]
    pub keywords: Vec<String>,

    /// Worker threads for page filtering and splitting
    #[serde(default = "default_worker_threads")]
    pub worker_threads: usize,
}

/// Which embedding backend to use.
#[derive(Debug, Default, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// OpenAI-compatible `/embeddings` endpoint
    #[default]
    OpenAi,
    /// Deterministic local feature hashing, no network
    Hash,
    /// Local ONNX model (requires the `local-embeddings` feature)
    FastEmbed,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub provider: EmbeddingProvider,

    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Vector dimension produced by the model
    #[serde(default = "default_embedding_dimension")]
    pub dimension: usize,

    #[serde(default = "default_api_base_url")]
    pub base_url: String,

    /// Name of the environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Texts per embedding request
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    #[serde(default = "default_embedding_timeout")]
    pub timeout_secs: u64,

    /// Reuse embeddings of previously seen texts
    #[serde(default = "default_true")]
    pub cache: bool,

    /// Cache directory (defaults to the user cache dir)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GenerationConfig {
    #[serde(default = "default_generation_model")]
    pub model: String,

    #[serde(default = "default_api_base_url")]
    pub base_url: String,

    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Temperature for retrieval-augmented answers
    #[serde(default = "default_rag_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_generation_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RetrievalConfig {
    /// Chunks retrieved per question
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Upper bound on the context block sent to the generator
    #[serde(default = "default_max_context_chars")]
    pub max_context_chars: usize,

    #[serde(default)]
    pub metric: SimilarityMetric,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SummaryConfig {
    /// Phrases that select chunks for the summary
    #[serde(default = "default_summary_keywords")]
    pub keywords: Vec<String>,

    #[serde(default = "default_max_paragraphs")]
    pub max_paragraphs: usize,

    #[serde(default = "default_summary_temperature")]
    pub temperature: f32,
}

// Default value functions
fn default_version() -> u32 {
    1
}
fn default_index_path() -> PathBuf {
    PathBuf::from(".filingrag/indexes")
}
fn default_log_level() -> String {
    "warn".to_string()
}
fn default_true() -> bool {
    true
}
fn default_worker_threads() -> usize {
    num_cpus::get()
}
fn default_keywords() -> Vec<String> {
    [
        "risk factors",
        "item 1a",
        "item 7",
        "management’s discussion",
        "footnotes",
        "note",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}
fn default_embedding_dimension() -> usize {
    1536
}
fn default_api_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}
fn default_batch_size() -> usize {
    64
}
fn default_embedding_timeout() -> u64 {
    60
}
fn default_generation_model() -> String {
    "gpt-4o".to_string()
}
fn default_rag_temperature() -> f32 {
    0.2
}
fn default_max_tokens() -> u32 {
    1024
}
fn default_generation_timeout() -> u64 {
    120
}
fn default_top_k() -> usize {
    5
}
fn default_max_context_chars() -> usize {
    12_000
}
fn default_summary_keywords() -> Vec<String> {
    ["management's discussion", "risk factors", "financial condition"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
fn default_max_paragraphs() -> usize {
    30
}
fn default_summary_temperature() -> f32 {
    0.1
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            workspace_root: None,
            index_path: default_index_path(),
            logging: LoggingConfig::default(),
            extraction: ExtractionConfig::default(),
            chunking: ChunkingConfig::default(),
            embedding: EmbeddingConfig::default(),
            generation: GenerationConfig::default(),
            retrieval: RetrievalConfig::default(),
            summary: SummaryConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: HashMap::new(),
        }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            keywords: default_keywords(),
            worker_threads: default_worker_threads(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::default(),
            model: default_embedding_model(),
            dimension: default_embedding_dimension(),
            base_url: default_api_base_url(),
            api_key_env: default_api_key_env(),
            batch_size: default_batch_size(),
            timeout_secs: default_embedding_timeout(),
            cache: true,
            cache_path: None,
        }
    }
}

impl EmbeddingConfig {
    /// Effective cache directory: configured path, else the user cache dir.
    pub fn effective_cache_path(&self) -> PathBuf {
        self.cache_path.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .map(|dir| dir.join("filingrag").join("embeddings"))
                .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join("cache").join("embeddings"))
        })
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: default_generation_model(),
            base_url: default_api_base_url(),
            api_key_env: default_api_key_env(),
            temperature: default_rag_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_generation_timeout(),
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            max_context_chars: default_max_context_chars(),
            metric: SimilarityMetric::default(),
        }
    }
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            keywords: default_summary_keywords(),
            max_paragraphs: default_max_paragraphs(),
            temperature: default_summary_temperature(),
        }
    }
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join(CONFIG_FILE));
        Self::load_from(config_path)
    }

    /// Load configuration from a specific file, still honoring env overrides
    ///
    /// Relative `index_path` and `embedding.cache_path` are resolved against
    /// the workspace root, so commands behave the same from any subdirectory.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        let path = path.as_ref();
        let mut settings: Settings = Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path))
            // Double underscore separates nesting; single underscores stay in field names
            .merge(Env::prefixed(ENV_PREFIX).map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
            .extract()
            .map_err(Box::new)?;

        if settings.workspace_root.is_none() {
            settings.workspace_root = Self::workspace_root_for(path);
        }
        settings.resolve_paths();
        Ok(settings)
    }

    /// Root owning the config file at `path`: the parent of `.filingrag`, or
    /// the file's own directory for a config kept elsewhere. `None` when that
    /// directory does not exist.
    fn workspace_root_for(path: &Path) -> Option<PathBuf> {
        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let dir = std::fs::canonicalize(dir).ok()?;
        if dir.file_name().is_some_and(|name| name == CONFIG_DIR) {
            dir.parent().map(Path::to_path_buf)
        } else {
            Some(dir)
        }
    }

    fn resolve_paths(&mut self) {
        let Some(root) = self.workspace_root.clone() else {
            return;
        };
        if self.index_path.is_relative() {
            self.index_path = root.join(&self.index_path);
        }
        if let Some(cache) = self.embedding.cache_path.as_mut().filter(|p| p.is_relative()) {
            *cache = root.join(&*cache);
        }
    }

    /// Find `.filingrag/settings.toml` from the current directory up to root
    fn find_workspace_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        for ancestor in current.ancestors() {
            let config_dir = ancestor.join(CONFIG_DIR);
            if config_dir.is_dir() {
                return Some(config_dir.join(CONFIG_FILE));
            }
        }

        None
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        let parent = path.as_ref().parent().ok_or("Invalid path")?;
        std::fs::create_dir_all(parent)?;

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }

    /// Create a default settings file in the current directory
    pub fn init_config_file(force: bool) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_path = PathBuf::from(CONFIG_DIR).join(CONFIG_FILE);

        if !force && config_path.exists() {
            return Err("Configuration file already exists. Use --force to overwrite".into());
        }

        Settings::default().save(&config_path)?;
        Ok(config_path)
    }

    /// Render the effective settings as TOML
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
