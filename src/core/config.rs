//! Service configuration loaded from `coursekit.toml`.
//!
//! Lookup order: `--config <path>`, then `$COURSEKIT_CONFIG`, then
//! `./coursekit.toml`. An explicitly named file must exist; the implicit
//! default may be absent, in which case built-in defaults apply.
//!
//! ```toml
//! [server]
//! bind = "127.0.0.1:8080"
//!
//! [storage]
//! data_dir = "./storage"
//!
//! [log]
//! level = "info"
//!
//! [[auth.tokens]]
//! token = "change-me"
//! user = "admin"
//! ```

use crate::core::error::CoursekitError;
use crate::core::schemas;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "coursekit.toml";
pub const CONFIG_ENV_VAR: &str = "COURSEKIT_CONFIG";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub log: LogConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root for `courses/` and `progress.db`.
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("storage"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LogConfig {
    /// Fallback filter when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    pub tokens: Vec<TokenConfig>,
}

/// A bearer token and the user it authenticates.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TokenConfig {
    pub token: String,
    pub user: String,
}

impl Config {
    pub fn courses_dir(&self) -> PathBuf {
        self.storage.data_dir.join(schemas::COURSES_DIR)
    }

    /// Token -> user id lookup table.
    pub fn token_map(&self) -> HashMap<String, String> {
        self.auth
            .tokens
            .iter()
            .map(|t| (t.token.clone(), t.user.clone()))
            .collect()
    }

    pub fn validate(&self) -> Result<(), CoursekitError> {
        if self.server.bind.trim().is_empty() {
            return Err(CoursekitError::ConfigError(
                "server.bind cannot be empty".to_string(),
            ));
        }
        if self.storage.data_dir.as_os_str().is_empty() {
            return Err(CoursekitError::ConfigError(
                "storage.data_dir cannot be empty".to_string(),
            ));
        }
        for (idx, token) in self.auth.tokens.iter().enumerate() {
            if token.token.trim().is_empty() || token.user.trim().is_empty() {
                return Err(CoursekitError::ConfigError(format!(
                    "auth.tokens[{}] needs both a token and a user",
                    idx
                )));
            }
        }
        Ok(())
    }
}

pub fn parse_config(content: &str) -> Result<Config, CoursekitError> {
    let config: Config =
        toml::from_str(content).map_err(|e| CoursekitError::ConfigError(e.to_string()))?;
    config.validate()?;
    Ok(config)
}

/// Pick the config file to read. `Ok(None)` means "use defaults".
pub fn resolve_config_path(
    explicit: Option<&Path>,
    env_value: Option<String>,
    cwd: &Path,
) -> Result<Option<PathBuf>, CoursekitError> {
    let named = explicit
        .map(Path::to_path_buf)
        .or_else(|| env_value.filter(|v| !v.is_empty()).map(PathBuf::from));

    if let Some(path) = named {
        if !path.exists() {
            return Err(CoursekitError::ConfigError(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        return Ok(Some(path));
    }

    let default_path = cwd.join(DEFAULT_CONFIG_FILE);
    Ok(default_path.exists().then_some(default_path))
}

pub fn load_config(explicit: Option<&Path>) -> Result<Config, CoursekitError> {
    let cwd = std::env::current_dir()?;
    let env_value = std::env::var(CONFIG_ENV_VAR).ok();

    match resolve_config_path(explicit, env_value, &cwd)? {
        Some(path) => {
            let content = fs::read_to_string(&path).map_err(CoursekitError::IoError)?;
            parse_config(&content)
        }
        None => Ok(Config::default()),
    }
}
