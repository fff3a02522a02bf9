use std::env;
use std::sync::OnceLock;
use thiserror::Error;

/// Errors raised while assembling configuration from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is absent.
    #[error("Environment variable {0} is not set")]
    Missing(&'static str),
    /// An environment variable holds a value that does not parse.
    #[error("Environment variable {0} has an invalid value")]
    Invalid(&'static str),
}

/// Runtime configuration for the pagechat service.
#[derive(Debug)]
pub struct Config {
    /// Base URL of the Qdrant instance holding passage vectors.
    pub qdrant_url: String,
    /// API key sent to Qdrant, when the instance requires one.
    pub qdrant_api_key: Option<String>,
    /// Prefix for the per-document collections created during a session.
    pub qdrant_collection_prefix: String,
    /// Backend that vectorizes passages and questions.
    pub embedding_provider: ModelProvider,
    /// Model name handed to the embedding backend.
    pub embedding_model: String,
    /// Width of the vectors the embedding model produces.
    pub embedding_dimension: usize,
    /// Backend that condenses and answers questions.
    pub chat_provider: ModelProvider,
    /// Model name handed to the chat backend.
    pub chat_model: String,
    /// Sampling temperature for chat completions.
    pub chat_temperature: f64,
    /// Number of passages retrieved per question.
    pub retrieval_top_k: usize,
    /// Base URL of the local Ollama runtime.
    pub ollama_url: String,
    /// Base URL of the OpenAI-compatible API.
    pub openai_base_url: String,
    /// API key for the OpenAI-compatible API, when a provider needs it.
    pub openai_api_key: Option<String>,
    /// Fixed passage token budget, overriding the automatic choice.
    pub passage_token_budget: Option<usize>,
    /// Fixed HTTP port, overriding the port scan.
    pub server_port: Option<u16>,
    /// Upper bound on accepted document upload size, in bytes.
    pub max_upload_bytes: usize,
}

/// Supported external model backends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModelProvider {
    /// Local Ollama runtime.
    Ollama,
    /// Hosted OpenAI-compatible API.
    OpenAI,
}

const DEFAULT_COLLECTION_PREFIX: &str = "pagechat";
const DEFAULT_CHAT_TEMPERATURE: f64 = 0.3;
const DEFAULT_RETRIEVAL_TOP_K: usize = 2;
const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";
const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

impl Config {
    /// Read every setting from the environment, applying defaults and bounds.
    pub fn from_env() -> Result<Self, ConfigError> {
        let embedding_dimension: usize = require_parsed("EMBEDDING_DIMENSION")?;
        if embedding_dimension == 0 {
            return Err(ConfigError::Invalid("EMBEDDING_DIMENSION"));
        }
        let retrieval_top_k =
            optional_parsed("RETRIEVAL_TOP_K")?.unwrap_or(DEFAULT_RETRIEVAL_TOP_K);
        if retrieval_top_k == 0 {
            return Err(ConfigError::Invalid("RETRIEVAL_TOP_K"));
        }

        Ok(Self {
            qdrant_url: require_env("QDRANT_URL")?,
            qdrant_api_key: optional_env("QDRANT_API_KEY"),
            qdrant_collection_prefix: optional_env("QDRANT_COLLECTION_PREFIX")
                .unwrap_or_else(|| DEFAULT_COLLECTION_PREFIX.to_string()),
            embedding_provider: require_parsed("EMBEDDING_PROVIDER")?,
            embedding_model: require_env("EMBEDDING_MODEL")?,
            embedding_dimension,
            chat_provider: require_parsed("CHAT_PROVIDER")?,
            chat_model: require_env("CHAT_MODEL")?,
            chat_temperature: optional_parsed("CHAT_TEMPERATURE")?
                .unwrap_or(DEFAULT_CHAT_TEMPERATURE)
                .clamp(0.0, 2.0),
            retrieval_top_k,
            ollama_url: optional_env("OLLAMA_URL")
                .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string()),
            openai_base_url: optional_env("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            openai_api_key: optional_env("OPENAI_API_KEY"),
            passage_token_budget: optional_parsed("PASSAGE_TOKEN_BUDGET")?,
            server_port: optional_parsed("SERVER_PORT")?,
            max_upload_bytes: optional_parsed("MAX_UPLOAD_BYTES")?
                .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
        })
    }
}

fn require_env(key: &'static str) -> Result<String, ConfigError> {
    env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or(ConfigError::Missing(key))
}

fn optional_env(key: &'static str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn require_parsed<T: std::str::FromStr>(key: &'static str) -> Result<T, ConfigError> {
    require_env(key)?
        .parse()
        .map_err(|_| ConfigError::Invalid(key))
}

fn optional_parsed<T: std::str::FromStr>(key: &'static str) -> Result<Option<T>, ConfigError> {
    optional_env(key)
        .map(|value| value.parse().map_err(|_| ConfigError::Invalid(key)))
        .transpose()
}

impl std::str::FromStr for ModelProvider {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "openai" => Ok(Self::OpenAI),
            _ => Err(()),
        }
    }
}

/// Configuration for the running process, set once during startup.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Borrow the installed configuration, panicking when startup has not run.
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("config is not initialized")
}

/// Read `.env` and the environment, then install the configuration.
pub fn init_config() {
    dotenvy::dotenv().ok();
    let config = Config::from_env().expect("Failed to load config from environment");
    tracing::debug!(
        qdrant_url = %config.qdrant_url,
        collection_prefix = %config.qdrant_collection_prefix,
        embedding_provider = ?config.embedding_provider,
        embedding_model = %config.embedding_model,
        chat_provider = ?config.chat_provider,
        chat_model = %config.chat_model,
        server_port = ?config.server_port,
        "Loaded configuration"
    );
    CONFIG.set(config).expect("Failed to set config");
}
