//! Config and data file locations.
//!
//! Priority for both directories:
//! 1. `--config-dir`
//! 2. `POSEFIELD_CONFIG_DIR`
//! 3. current directory, if it already holds a `posefield.json` or `posefield.log`
//! 4. platform directory from dirs-next (`~/.config/posefield`, `~/.local/share/posefield`, ...)

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

pub const APP_DIR: &str = "posefield";
pub const SETTINGS_FILE: &str = "posefield.json";
pub const LOG_FILE: &str = "posefield.log";
pub const CONFIG_DIR_ENV: &str = "POSEFIELD_CONFIG_DIR";

/// Overrides for the default application paths
#[derive(Debug, Clone, Default)]
pub struct PathConfig {
    pub config_dir: Option<PathBuf>,
}

impl PathConfig {
    /// CLI first, then the environment
    pub fn from_env_and_cli(cli_dir: Option<PathBuf>) -> Self {
        let config_dir = cli_dir.or_else(|| std::env::var(CONFIG_DIR_ENV).ok().map(PathBuf::from));
        Self { config_dir }
    }
}

pub fn config_file(name: &str, config: &PathConfig) -> PathBuf {
    config_dir(config).join(name)
}

pub fn data_file(name: &str, config: &PathConfig) -> PathBuf {
    data_dir(config).join(name)
}

/// Settings file: explicit path if given, else `posefield.json` in the config dir
pub fn settings_file(explicit: Option<&Path>, config: &PathConfig) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config_file(SETTINGS_FILE, config))
}

/// Create config and data directories if missing
pub fn ensure_dirs(config: &PathConfig) -> Result<()> {
    let config_dir = config_dir(config);
    let data_dir = data_dir(config);

    std::fs::create_dir_all(&config_dir)
        .with_context(|| format!("Failed to create config directory: {}", config_dir.display()))?;
    if data_dir != config_dir {
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;
    }
    Ok(())
}

fn has_local_files(dir: &Path) -> bool {
    [SETTINGS_FILE, LOG_FILE].iter().any(|f| dir.join(f).exists())
}

fn resolve(config: &PathConfig, platform: Option<PathBuf>) -> PathBuf {
    if let Some(dir) = &config.config_dir {
        return dir.clone();
    }
    if let Ok(current_dir) = std::env::current_dir()
        && has_local_files(&current_dir)
    {
        return current_dir;
    }
    platform.map(|dir| dir.join(APP_DIR)).unwrap_or_else(|| PathBuf::from("."))
}

fn config_dir(config: &PathConfig) -> PathBuf {
    resolve(config, dirs_next::config_dir())
}

fn data_dir(config: &PathConfig) -> PathBuf {
    resolve(config, dirs_next::data_dir())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_custom_dir_wins() {
        let config = PathConfig {
            config_dir: Some(PathBuf::from("/custom")),
        };
        assert_eq!(config_file("a.json", &config), PathBuf::from("/custom/a.json"));
        assert_eq!(data_file(LOG_FILE, &config), PathBuf::from("/custom/posefield.log"));
    }

    #[test]
    fn test_cli_over_env() {
        let config = PathConfig::from_env_and_cli(Some(PathBuf::from("/from-cli")));
        assert_eq!(config.config_dir, Some(PathBuf::from("/from-cli")));
    }

    #[test]
    fn test_settings_file_explicit() {
        let config = PathConfig {
            config_dir: Some(PathBuf::from("/custom")),
        };
        assert_eq!(
            settings_file(Some(Path::new("/tmp/mine.json")), &config),
            PathBuf::from("/tmp/mine.json")
        );
        assert_eq!(settings_file(None, &config), PathBuf::from("/custom/posefield.json"));
    }

    #[test]
    fn test_platform_default_names_app() {
        let path = config_file(SETTINGS_FILE, &PathConfig::default());
        assert!(path.to_string_lossy().contains(SETTINGS_FILE));
    }

    #[test]
    fn test_ensure_dirs_creates() {
        let dir = std::env::temp_dir().join("posefield_paths_test");
        let _ = std::fs::remove_dir_all(&dir);
        let config = PathConfig {
            config_dir: Some(dir.clone()),
        };
        ensure_dirs(&config).unwrap();
        assert!(dir.is_dir());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
