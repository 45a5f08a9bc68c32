//! Configuration loading from `~/.cityguide/config.toml` with defaults.

use cityguide_types::config::CityGuideConfig;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Load configuration from a TOML file, falling back to defaults.
///
/// Never fails: a missing, unreadable or unparsable file is logged and the
/// built-in agency is used instead.
pub fn load_config(path: Option<&Path>) -> CityGuideConfig {
    let config_path = path
        .map(|p| p.to_path_buf())
        .unwrap_or_else(default_config_path);

    if !config_path.exists() {
        info!(
            path = %config_path.display(),
            "Config file not found, using defaults"
        );
        return CityGuideConfig::default();
    }

    match std::fs::read_to_string(&config_path) {
        Ok(contents) => match toml::from_str::<CityGuideConfig>(&contents) {
            Ok(config) => {
                info!(path = %config_path.display(), "Loaded configuration");
                config
            }
            Err(e) => {
                warn!(
                    error = %e,
                    path = %config_path.display(),
                    "Failed to parse config, using defaults"
                );
                CityGuideConfig::default()
            }
        },
        Err(e) => {
            warn!(
                error = %e,
                path = %config_path.display(),
                "Failed to read config file, using defaults"
            );
            CityGuideConfig::default()
        }
    }
}

/// Default config location.
pub fn default_config_path() -> PathBuf {
    cityguide_home().join("config.toml")
}

/// Default City Guide home directory.
pub fn cityguide_home() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(".cityguide")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_config_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(Some(&dir.path().join("nope.toml")));
        assert_eq!(config, CityGuideConfig::default());
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(
            f,
            r#"
max_hops = 3

[cache]
enabled = false
"#
        )
        .unwrap();
        let config = load_config(Some(&path));
        assert_eq!(config.max_hops, 3);
        assert!(!config.cache.enabled);
        assert_eq!(config.entry_agent, "City Explorer");
    }

    #[test]
    fn test_load_config_invalid_toml_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "max_hops = \"many\"\n[[[").unwrap();
        assert_eq!(load_config(Some(&path)), CityGuideConfig::default());
    }

    #[test]
    fn test_default_path() {
        assert!(default_config_path().ends_with(".cityguide/config.toml"));
    }
}
