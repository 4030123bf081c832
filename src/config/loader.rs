//! Configuration file loader.

use std::path::{Path, PathBuf};

use super::DelegateConfig;

/// Environment variable overriding the knowledge directory.
pub const ENV_KNOWLEDGE_DIR: &str = "ORCA_KNOWLEDGE_DIR";
/// Environment variable overriding the maximum context file count.
pub const ENV_MAX_FILES: &str = "ORCA_MAX_FILES";
/// Environment variable overriding the per-file byte ceiling.
pub const ENV_MAX_FILE_BYTES: &str = "ORCA_MAX_FILE_BYTES";
/// Environment variable overriding the runner executable.
pub const ENV_RUNNER: &str = "ORCA_RUNNER";

/// Configuration loader that searches multiple locations.
#[derive(Debug)]
pub struct ConfigLoader {
    /// Search paths in order of priority.
    search_paths: Vec<PathBuf>,
}

impl ConfigLoader {
    /// Create a new config loader with default search paths.
    #[must_use]
    pub fn new() -> Self {
        let mut search_paths = Vec::new();

        // 1. Current directory: .orca-delegate.toml
        search_paths.push(PathBuf::from(".orca-delegate.toml"));

        // 2. User config directory: ~/.config/orca-delegate/config.toml
        if let Some(config_dir) = dirs::config_dir() {
            search_paths.push(config_dir.join("orca-delegate").join("config.toml"));
        }

        Self { search_paths }
    }

    /// Create a config loader with a specific config file path.
    #[must_use]
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            search_paths: vec![path],
        }
    }

    /// Load configuration from the first available file, then apply
    /// environment overrides from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be parsed, or an
    /// override variable holds an invalid number.
    pub fn load(&self) -> Result<DelegateConfig, ConfigError> {
        let config = self.load_file()?;
        apply_env_overrides(config, |key| std::env::var(key).ok())
    }

    /// Load configuration from the first available file, or return defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be parsed.
    pub fn load_file(&self) -> Result<DelegateConfig, ConfigError> {
        for path in &self.search_paths {
            if path.exists() {
                tracing::debug!(path = %path.display(), "Loading config file");
                return Self::load_from_path(path);
            }
        }

        tracing::debug!("No config file found, using defaults");
        Ok(DelegateConfig::default())
    }

    fn load_from_path(path: &Path) -> Result<DelegateConfig, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the search paths for debugging.
    #[must_use]
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply `ORCA_*` overrides using `lookup` to read variables.
///
/// Empty values are ignored.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnv` when a numeric override does not parse.
pub fn apply_env_overrides<F>(
    mut config: DelegateConfig,
    lookup: F,
) -> Result<DelegateConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(dir) = get(ENV_KNOWLEDGE_DIR) {
        config.knowledge_dir = PathBuf::from(dir);
    }
    if let Some(value) = get(ENV_MAX_FILES) {
        config.max_files = parse_env(ENV_MAX_FILES, &value)?;
    }
    if let Some(value) = get(ENV_MAX_FILE_BYTES) {
        config.max_file_bytes = parse_env(ENV_MAX_FILE_BYTES, &value)?;
    }
    if let Some(program) = get(ENV_RUNNER) {
        config.runner.program = program;
    }

    Ok(config)
}

fn parse_env<T: std::str::FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        var,
        value: value.to_string(),
    })
}

/// Errors that can occur during configuration loading.
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

    #[error("Invalid value for {var}: {value:?}")]
    InvalidEnv { var: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_config_loader_default_paths() {
        let loader = ConfigLoader::new();
        assert!(!loader.search_paths().is_empty());
        assert!(loader.search_paths()[0].ends_with(".orca-delegate.toml"));
    }

    #[test]
    fn test_config_loader_returns_defaults_when_no_file() {
        let loader = ConfigLoader::with_path(PathBuf::from("/nonexistent/path.toml"));
        let config = loader.load_file().unwrap();
        assert_eq!(config.max_files, 5);
    }

    #[test]
    fn test_config_loader_reads_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "max_files = 9\nmax_file_bytes = 100\n").unwrap();

        let config = ConfigLoader::with_path(path).load_file().unwrap();
        assert_eq!(config.max_files, 9);
        assert_eq!(config.max_file_bytes, 100);
    }

    #[test]
    fn test_config_loader_parse_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "max_files = \"many\"").unwrap();

        let err = ConfigLoader::with_path(path).load_file().unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_env_overrides_apply() {
        let config = apply_env_overrides(
            DelegateConfig::default(),
            env(&[
                (ENV_KNOWLEDGE_DIR, "/tmp/kb"),
                (ENV_MAX_FILES, " 3 "),
                (ENV_MAX_FILE_BYTES, "2048"),
                (ENV_RUNNER, "openclaw"),
            ]),
        )
        .unwrap();

        assert_eq!(config.knowledge_dir, PathBuf::from("/tmp/kb"));
        assert_eq!(config.max_files, 3);
        assert_eq!(config.max_file_bytes, 2048);
        assert_eq!(config.runner.program, "openclaw");
    }

    #[test]
    fn test_env_overrides_ignore_empty() {
        let config =
            apply_env_overrides(DelegateConfig::default(), env(&[(ENV_MAX_FILES, "")])).unwrap();
        assert_eq!(config.max_files, 5);
    }

    #[test]
    fn test_env_overrides_reject_garbage() {
        let err = apply_env_overrides(
            DelegateConfig::default(),
            env(&[(ENV_MAX_FILE_BYTES, "lots")]),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidEnv {
                var: ENV_MAX_FILE_BYTES,
                ..
            }
        ));
    }
}
