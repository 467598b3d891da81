use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use repoharvest_api::{ClientConfig, RetryConfig};

use crate::{export::ExportFormat, harvest::HarvestParams, Error, Result};

pub const TOKEN_ENV_VAR: &str = "GITHUB_TOKEN";

/// Main configuration structure
///
/// Loaded from a TOML file, then overridden by CLI flags.
/// Priority: CLI > File > Defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub github: GitHubConfig,
    #[serde(default)]
    pub harvest: HarvestConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Load config from the default location, or defaults if there's no file
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load config from an explicit path; a missing file means defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            Self::from_toml(&contents)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|e| Error::ConfigError(format!("Failed to parse config: {}", e)))
    }

    /// Get the config file path (XDG config dir on Unix, AppData on Windows)
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| Error::ConfigError("Could not find config directory".into()))?
            .join("repoharvest");

        Ok(config_dir.join("config.toml"))
    }

    /// Find the GitHub token, once, at startup
    ///
    /// Order: explicit token file, `token` in config, `GITHUB_TOKEN`,
    /// `token_file` in config. No token is a hard error.
    pub fn resolve_token(&self, token_file_override: Option<&Path>) -> Result<String> {
        let env_token = std::env::var(TOKEN_ENV_VAR).ok();
        self.resolve_token_with(token_file_override, env_token)
    }

    fn resolve_token_with(
        &self,
        token_file_override: Option<&Path>,
        env_token: Option<String>,
    ) -> Result<String> {
        if let Some(path) = token_file_override {
            return read_token_file(path);
        }

        let token = self
            .github
            .token
            .clone()
            .or(env_token)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        if let Some(token) = token {
            return Ok(token);
        }

        if let Some(ref path) = self.github.token_file {
            return read_token_file(path);
        }

        Err(Error::ConfigError(format!(
            "No GitHub token found. Set {}, add `token` to the [github] config section, or pass --token-file",
            TOKEN_ENV_VAR
        )))
    }

    /// Transport settings for the API client
    pub fn client_config(&self, token: String) -> ClientConfig {
        ClientConfig::new(token)
            .with_base_url(self.github.api_url.clone())
            .with_user_agent(self.github.user_agent.clone())
            .with_timeout(Duration::from_secs(self.github.timeout_secs))
    }

    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig::default().with_max_attempts(self.github.max_attempts)
    }

    pub fn harvest_params(&self) -> HarvestParams {
        HarvestParams {
            total_items: self.harvest.total_items,
            chunk_size: self.harvest.chunk_size,
            start_from_stars: self.harvest.start_from_stars,
        }
    }
}

fn read_token_file(path: &Path) -> Result<String> {
    let token = std::fs::read_to_string(path).map_err(|e| {
        Error::ConfigError(format!(
            "Could not read token file {}: {}",
            path.display(),
            e
        ))
    })?;

    let token = token.trim().to_string();
    if token.is_empty() {
        return Err(Error::ConfigError(format!(
            "Token file {} is empty",
            path.display()
        )));
    }
    Ok(token)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// GitHub personal access token
    /// Get one at https://github.com/settings/tokens
    pub token: Option<String>,

    /// File containing the token (first line, whitespace trimmed)
    pub token_file: Option<PathBuf>,

    /// API URL (for GitHub Enterprise)
    #[serde(default = "default_github_url")]
    pub api_url: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Attempts per request before giving up on it
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

fn default_github_url() -> String {
    repoharvest_api::http::GITHUB_API_BASE.to_string()
}

fn default_user_agent() -> String {
    repoharvest_api::http::DEFAULT_USER_AGENT.to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_max_attempts() -> u32 {
    5
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token: None,
            token_file: None,
            api_url: default_github_url(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout(),
            max_attempts: default_max_attempts(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarvestConfig {
    /// Most records to persist in one run
    #[serde(default = "default_total_items")]
    pub total_items: usize,

    /// Records per output file
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Only repositories with more stars than this
    #[serde(default = "default_start_from_stars")]
    pub start_from_stars: u64,
}

fn default_total_items() -> usize {
    200_000
}

fn default_chunk_size() -> usize {
    3_000
}

fn default_start_from_stars() -> u64 {
    100
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            total_items: default_total_items(),
            chunk_size: default_chunk_size(),
            start_from_stars: default_start_from_stars(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub directory: PathBuf,

    #[serde(default)]
    pub format: ExportFormat,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("data")
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_dir(),
            format: ExportFormat::default(),
        }
    }
}
