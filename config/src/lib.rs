//! Configuration loading for Tally.
//!
//! Read from `~/.tally/config.toml`; a missing file is not an error and
//! yields defaults (local backend, so the binary works out of the box).
//!
//! ```toml
//! [evaluator]
//! backend = "remote"
//! url = "http://127.0.0.1:8710"
//! timeout_secs = 30
//! max_retries = 2
//!
//! [app]
//! high_contrast = false
//! ```
//!
//! Environment overrides (applied after the file): `TALLY_EVALUATOR_URL`
//! and `TALLY_BACKEND`.

use std::{env, fs, path::Path, path::PathBuf, time::Duration};

use serde::Deserialize;

pub const URL_ENV_VAR: &str = "TALLY_EVALUATOR_URL";
pub const BACKEND_ENV_VAR: &str = "TALLY_BACKEND";

const DEFAULT_URL: &str = "http://127.0.0.1:8710";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_RETRIES: u32 = 2;

#[derive(Debug, Default, Deserialize)]
pub struct TallyConfig {
    pub evaluator: Option<EvaluatorConfig>,
    pub app: Option<AppConfig>,
}

#[derive(Debug, Default, Deserialize)]
pub struct EvaluatorConfig {
    pub backend: Option<Backend>,
    pub url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub max_retries: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    /// Enable a high-contrast color palette.
    #[serde(default)]
    pub high_contrast: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Remote,
    #[default]
    Local,
}

impl Backend {
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "remote" => Some(Backend::Remote),
            "local" => Some(Backend::Local),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Backend::Remote => "remote",
            Backend::Local => "local",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl ConfigError {
    #[must_use]
    pub fn path(&self) -> &PathBuf {
        match self {
            ConfigError::Read { path, .. } | ConfigError::Parse { path, .. } => path,
        }
    }
}

/// `~/.tally/config.toml`, or `None` when no home directory is available.
#[must_use]
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".tally").join("config.toml"))
}

impl TallyConfig {
    /// Load from the default location. `Ok(None)` when the file is absent.
    pub fn load() -> Result<Option<Self>, ConfigError> {
        match config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(None),
        }
    }

    /// Load from an explicit path. `Ok(None)` when the file is absent.
    pub fn load_from(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Some(config))
    }
}

/// Evaluator settings after applying file values and env overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluatorSettings {
    pub backend: Backend,
    pub url: String,
    pub timeout: Duration,
    pub max_retries: u32,
}

impl Default for EvaluatorSettings {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            url: DEFAULT_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl EvaluatorSettings {
    /// File values over defaults, then env overrides over file values.
    #[must_use]
    pub fn resolve(config: Option<&TallyConfig>) -> Self {
        let mut settings = Self::from_file(config.and_then(|c| c.evaluator.as_ref()));

        if let Ok(url) = env::var(URL_ENV_VAR)
            && !url.trim().is_empty()
        {
            settings.url = url.trim().to_string();
        }

        if let Ok(raw) = env::var(BACKEND_ENV_VAR) {
            match Backend::parse(&raw) {
                Some(backend) => settings.backend = backend,
                None => tracing::warn!("Unknown backend in {BACKEND_ENV_VAR}: {raw}"),
            }
        }

        settings
    }

    #[must_use]
    pub fn from_file(section: Option<&EvaluatorConfig>) -> Self {
        let defaults = Self::default();
        let Some(section) = section else {
            return defaults;
        };
        Self {
            backend: section.backend.unwrap_or(defaults.backend),
            url: section
                .url
                .as_deref()
                .map_or(defaults.url, |url| url.trim_end_matches('/').to_string()),
            timeout: section
                .timeout_secs
                .map_or(defaults.timeout, Duration::from_secs),
            max_retries: section.max_retries.unwrap_or(defaults.max_retries),
        }
    }
}
