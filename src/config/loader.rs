//! Locating and reading the TOML configuration file.

use std::path::{Path, PathBuf};

use super::TailorConfig;

/// File name looked up in the current directory.
pub const LOCAL_CONFIG_FILE: &str = ".resume-tailor.toml";

/// Environment variable naming a config file to use before any other.
pub const CONFIG_ENV_VAR: &str = "RESUME_TAILOR_CONFIG";

/// Finds the first existing config file among candidate locations.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    candidates: Vec<PathBuf>,
}

impl ConfigLoader {
    /// Candidates, highest priority first: `$RESUME_TAILOR_CONFIG`, then
    /// `./.resume-tailor.toml`, then `<config_dir>/resume-tailor/config.toml`.
    #[must_use]
    pub fn new() -> Self {
        let from_env = std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from);
        let user = dirs::config_dir().map(|dir| dir.join("resume-tailor").join("config.toml"));

        let candidates = from_env
            .into_iter()
            .chain(std::iter::once(PathBuf::from(LOCAL_CONFIG_FILE)))
            .chain(user)
            .collect();
        Self { candidates }
    }

    /// Only consider `path`.
    #[must_use]
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            candidates: vec![path],
        }
    }

    /// Load the first candidate that exists. Missing files are skipped and
    /// defaults are used when none exists.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file cannot be read or parsed.
    pub fn load(&self) -> Result<TailorConfig, ConfigError> {
        match self.find_config_file() {
            Some(path) => {
                tracing::debug!(path = %path.display(), "Loading config file");
                Self::load_from_path(&path)
            }
            None => {
                tracing::debug!(candidates = self.candidates.len(), "No config file found, using defaults");
                Ok(TailorConfig::default())
            }
        }
    }

    /// Load `path`, which must exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_path(path: &Path) -> Result<TailorConfig, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::ParseError {
            path: path.to_path_buf(),
            source,
        })
    }

    #[must_use]
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.candidates
    }

    /// The first candidate that exists on disk.
    #[must_use]
    pub fn find_config_file(&self) -> Option<PathBuf> {
        self.candidates.iter().find(|path| path.is_file()).cloned()
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors from reading the config file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
}
