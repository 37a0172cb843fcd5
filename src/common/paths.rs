//! Configuration and data paths
//!
//! Uses the directories crate for platform-appropriate locations:
//! - Linux: `~/.config/api-e2e/`
//! - macOS: `~/Library/Application Support/api-e2e/`
//! - Windows: `%APPDATA%\api-e2e\`

use std::path::PathBuf;

/// Application name used for config and data directories
const APP_NAME: &str = "api-e2e";

/// Get the configuration directory path
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the configuration file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}

/// Default directory for user-supplied suite files
pub fn suites_dir() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("suites"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_path_ends_with_toml() {
        if let Some(path) = config_path() {
            assert_eq!(path.file_name().and_then(|n| n.to_str()), Some("config.toml"));
        }
    }

    #[test]
    fn test_suites_dir_is_under_config_dir() {
        if let (Some(config), Some(suites)) = (config_dir(), suites_dir()) {
            assert!(suites.starts_with(config));
        }
    }
}
