//! Configuration file loading and data folder resolution
//!
//! Every setting resolves with the same priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. OS-dependent compiled default (fallback)
//!
//! Steps 1 and 2 are handled by each binary's `clap` arguments; this module
//! covers the TOML file and the compiled defaults.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "DONATE_CONFIG";

/// Contents of `config.toml`; every key is optional
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    pub port: Option<u16>,
    pub bind_address: Option<String>,
    pub data_folder: Option<PathBuf>,
    pub database_path: Option<PathBuf>,
    pub uploads_dir: Option<PathBuf>,
    pub session_ttl_minutes: Option<u32>,
    pub max_upload_bytes: Option<usize>,
    pub listener_buffer: Option<usize>,
}

impl TomlConfig {
    /// Parse TOML text
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Invalid config file: {}", e)))
    }

    /// Read and parse a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Cannot read config file {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
    }

    /// Locate and load the config file, or defaults when none exists
    ///
    /// An explicitly requested file that cannot be loaded is an error; a
    /// missing file in the standard locations is not.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        match find_config_file() {
            Some(path) => {
                debug!("Loading config file {}", path.display());
                Self::load(&path)
            }
            None => {
                warn!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }
}

/// Find the config file: `DONATE_CONFIG`, then the user, then the system location
pub fn find_config_file() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        return Some(PathBuf::from(path));
    }

    let user_config = dirs::config_dir().map(|d| d.join("donate").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(unix) {
        let system_config = PathBuf::from("/etc/donate/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// Resolve the data folder (database and uploads live underneath it)
pub fn resolve_data_folder(
    cli_arg: Option<&Path>,
    env_var_name: &str,
    file_value: Option<&Path>,
) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        return PathBuf::from(path);
    }

    // Priority 3: TOML config file
    if let Some(path) = file_value {
        return path.to_path_buf();
    }

    // Priority 4: OS-dependent compiled default
    default_data_folder()
}

/// OS-dependent default data folder
pub fn default_data_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/donate (or /var/lib/donate for system-wide)
        dirs::data_local_dir()
            .map(|d| d.join("donate"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/donate"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("donate"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/donate"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("donate"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\donate"))
    } else {
        PathBuf::from("./donate_data")
    }
}
