//! Configuration loading and validation.

mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return the default config.
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./mediaforge.toml",
        "~/.config/mediaforge/config.toml",
        "/etc/mediaforge/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration values.
pub fn validate_config(config: &Config) -> Result<()> {
    for (name, value) in [
        ("transcode.video_bitrate_film", &config.transcode.video_bitrate_film),
        ("transcode.video_bitrate_series", &config.transcode.video_bitrate_series),
        ("transcode.audio_bitrate", &config.transcode.audio_bitrate),
    ] {
        if value.trim().is_empty() {
            anyhow::bail!("{name} must not be empty");
        }
    }

    if config.conversion.max_parallel == 0 {
        anyhow::bail!("conversion.max_parallel must be at least 1");
    }

    if config.catalog.enabled && config.catalog.base_url.trim().is_empty() {
        anyhow::bail!("catalog.base_url is required when the catalog is enabled");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        validate_config(&config).unwrap();
    }

    #[test]
    fn empty_bitrate_rejected() {
        let mut config = Config::default();
        config.transcode.audio_bitrate = String::new();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn zero_parallelism_rejected() {
        let mut config = Config::default();
        config.conversion.max_parallel = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn enabled_catalog_needs_base_url() {
        let mut config = Config::default();
        config.catalog.enabled = true;
        assert!(validate_config(&config).is_err());
        config.catalog.base_url = "http://portal.local".into();
        validate_config(&config).unwrap();
    }

    #[test]
    fn parse_partial_toml() {
        let config: Config = toml::from_str(
            r#"
            [storage]
            db_path = "/var/lib/mediaforge/jobs.db"

            [transcode]
            video_bitrate_film = "6000k"

            [conversion]
            max_parallel = 4
            "#,
        )
        .unwrap();

        assert_eq!(
            config.storage.db_path.to_string_lossy(),
            "/var/lib/mediaforge/jobs.db"
        );
        assert_eq!(config.transcode.video_bitrate_film, "6000k");
        // Unspecified fields keep their defaults.
        assert_eq!(config.transcode.video_bitrate_series, "2048k");
        assert_eq!(config.conversion.max_parallel, 4);
        assert!(!config.catalog.enabled);
    }
}
