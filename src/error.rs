use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PulseError {
    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Request failed: {0}")]
    Network(String),

    #[error("Blocked by anti-bot rules: {0}")]
    Blocked(String),

    #[error("Content too short or unextractable")]
    ContentTooShort,

    #[error("Upstream response did not match the expected format: {message}")]
    UpstreamFormat {
        message: String,
        /// Raw collaborator output, kept verbatim for diagnostics
        raw: String,
    },

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Missing credential: {0}")]
    MissingCredential(String),

    #[error("Claude CLI not installed: {0}")]
    ClaudeNotInstalled(String),

    #[error("Claude CLI failed: {0}")]
    ClaudeFailed(String),

    #[error("A run is already in progress for '{0}'")]
    RunInProgress(String),

    #[error("No report available: {0}")]
    ExportUnavailable(String),

    #[error("Run aborted: {0}")]
    Aborted(String),

    #[error("Run failed: {0}")]
    RunFailed(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl PulseError {
    /// Get an actionable hint for how to resolve this error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            PulseError::Network(_) => Some(
                "Check your internet connection, or try the page alone:\n  pulse extract <url>"
            ),
            PulseError::Blocked(_) => Some(
                "The site rejects automated requests; drop it from the candidate list"
            ),
            PulseError::ContentTooShort => Some(
                "The page is probably rendered with JavaScript or empty"
            ),
            PulseError::UpstreamFormat { .. } => Some(
                "The collaborator returned malformed output; retrying usually helps"
            ),
            PulseError::Validation(_) => Some(
                "Usage: pulse run \"<company>\" [--hint <text>] [--max-pages N]"
            ),
            PulseError::MissingCredential(_) | PulseError::ClaudeNotInstalled(_) => Some(
                "Install Claude CLI: curl -fsSL https://claude.ai/install.sh | bash\nOr pass candidate pages explicitly: pulse run \"<company>\" --url <url>"
            ),
            PulseError::ExportUnavailable(_) => Some(
                "Run a job to completion first: pulse run \"<company>\" --export report.txt"
            ),
            PulseError::ConfigError(_) | PulseError::TomlError(_) => Some(
                "Check the configuration with `pulse config`, or reset it with `pulse config --init`"
            ),
            _ => None,
        }
    }

    /// Whether retrying the same request may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PulseError::UpstreamFormat { .. }
                | PulseError::Network(_)
                | PulseError::ClaudeFailed(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, PulseError>;

/// Per-URL failure classes. These are recorded against the page and never
/// abort the job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Timeout, DNS, connection, or a non-2xx status other than 403
    Network,
    /// Explicit anti-bot rejection (HTTP 403)
    Blocked,
    /// Every extraction strategy fell under the minimum content length
    ContentTooShort,
}

impl FailureKind {
    /// Lift a recorded per-URL failure into the crate error type
    pub fn into_error(self, message: &str) -> PulseError {
        match self {
            FailureKind::Network => PulseError::Network(message.to_string()),
            FailureKind::Blocked => PulseError::Blocked(message.to_string()),
            FailureKind::ContentTooShort => PulseError::ContentTooShort,
        }
    }
}
