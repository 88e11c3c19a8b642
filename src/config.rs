use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{PulseError, Result};

/// Global pulse configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub fetch: FetchConfig,

    #[serde(default)]
    pub extract: ExtractConfig,

    #[serde(default)]
    pub score: ScoreConfig,

    #[serde(default)]
    pub run: RunConfig,

    #[serde(default)]
    pub collaborator: CollaboratorConfig,
}

/// HTTP fetch settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    pub user_agent: String,
    pub accept_language: String,
    /// Number of pages fetched (and extracted) in parallel
    pub concurrency: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 20,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
                         AppleWebKit/537.36 (KHTML, like Gecko) \
                         Chrome/120.0.0.0 Safari/537.36"
                .to_string(),
            accept_language: "en-US,en;q=0.9".to_string(),
            concurrency: 4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Minimum normalized characters for an extraction to count as success
    pub min_content_chars: usize,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self { min_content_chars: 300 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreConfig {
    /// Upper bound on sentences scored per job
    pub max_sentences: usize,
    pub top_topics: usize,
    pub top_words: usize,
    /// Sentences kept on each side of the evidence list
    pub evidence: usize,
    /// Documents at or below this length are ignored for topic extraction
    pub min_document_chars: usize,
    /// Vocabulary cap for topic extraction
    pub max_features: usize,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            max_sentences: 2000,
            top_topics: 12,
            top_words: 20,
            evidence: 5,
            min_document_chars: 50,
            max_features: 3000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub default_max_pages: usize,
    /// Largest `max_pages` the run trigger accepts
    pub max_pages_limit: usize,
    /// Characters of extracted text shown on each status preview card
    pub preview_chars: usize,
    /// How often the CLI polls the job status
    pub poll_interval_ms: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            default_max_pages: 12,
            max_pages_limit: 30,
            preview_chars: 300,
            poll_interval_ms: 250,
        }
    }
}

/// Settings for the text-generation collaborator (discovery and recommendations)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollaboratorConfig {
    /// Executable invoked for discovery and recommendations
    pub command: String,
    /// Turn budget for discovery, which needs web search
    pub max_turns: u32,
    pub allowed_tools: String,
}

impl Default for CollaboratorConfig {
    fn default() -> Self {
        Self {
            command: "claude".to_string(),
            max_turns: 5,
            allowed_tools: "WebSearch,WebFetch".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Self::from_toml(&content)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse configuration from TOML; missing sections and keys take defaults
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| PulseError::ConfigError(e.to_string()))?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    /// Get the config file path
    ///
    /// Supports PULSE_CONFIG environment variable for test isolation
    pub fn config_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var("PULSE_CONFIG") {
            return Ok(PathBuf::from(path));
        }
        let dirs = ProjectDirs::from("", "", "pulse")
            .ok_or_else(|| PulseError::ConfigError("Could not determine config directory".into()))?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    fn validate(&self) -> Result<()> {
        if self.fetch.concurrency == 0 {
            return Err(PulseError::ConfigError("fetch.concurrency must be at least 1".into()));
        }
        if self.fetch.timeout_secs == 0 {
            return Err(PulseError::ConfigError("fetch.timeout_secs must be at least 1".into()));
        }
        if self.extract.min_content_chars == 0 {
            return Err(PulseError::ConfigError(
                "extract.min_content_chars must be at least 1".into(),
            ));
        }
        if self.run.max_pages_limit == 0 || self.run.default_max_pages > self.run.max_pages_limit {
            return Err(PulseError::ConfigError(format!(
                "run.default_max_pages ({}) must be between 1 and run.max_pages_limit ({})",
                self.run.default_max_pages, self.run.max_pages_limit
            )));
        }
        Ok(())
    }
}
