// Run configuration loaded from an optional TOML file

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::engine::{ConfigOverrides, Rational, UsageProfile};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Values layered over the codec's baseline config
    #[serde(default)]
    pub encoder: ConfigOverrides,

    #[serde(default)]
    pub limits: LimitsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Codec kind passed to interface resolution
    #[serde(default = "default_codec")]
    pub codec: String,

    /// Usage profile used to pick the baseline config
    #[serde(default = "default_usage")]
    pub usage: UsageProfile,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Cap on the encoder frame pool, in MiB (unlimited when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_limit_mb: Option<u64>,
}

fn default_codec() -> String {
    "baseline".to_string()
}

fn default_usage() -> UsageProfile {
    UsageProfile::Realtime
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            codec: default_codec(),
            usage: default_usage(),
        }
    }
}

impl LimitsConfig {
    pub fn memory_limit_bytes(&self) -> Option<u64> {
        self.memory_limit_mb.map(|mb| mb.saturating_mul(1024 * 1024))
    }
}

impl Config {
    /// Built-in config: the reference 640x480 @ 30 fps, 1000 kbps realtime run
    pub fn reference() -> Self {
        Self {
            defaults: DefaultsConfig::default(),
            encoder: ConfigOverrides {
                width: Some(640),
                height: Some(480),
                timebase: Some(Rational::per_second(30)),
                target_bitrate_kbps: Some(1000),
                ..Default::default()
            },
            limits: LimitsConfig::default(),
        }
    }

    /// Load config from a TOML file
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Serialize config as TOML
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.defaults.codec, "baseline");
        assert_eq!(config.defaults.usage, UsageProfile::Realtime);
        assert!(config.encoder.is_empty());
        assert_eq!(config.limits.memory_limit_mb, None);
        assert_eq!(config.limits.memory_limit_bytes(), None);
    }

    #[test]
    fn test_reference_config() {
        let config = Config::reference();
        assert_eq!(config.encoder.width, Some(640));
        assert_eq!(config.encoder.height, Some(480));
        assert_eq!(config.encoder.timebase, Some(Rational::new(1, 30)));
        assert_eq!(config.encoder.target_bitrate_kbps, Some(1000));
        assert_eq!(config.encoder.usage, None);
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::reference();
        let toml_str = config.to_toml_string().unwrap();
        assert!(toml_str.contains("timebase = \"1/30\""));

        // Should be able to deserialize back
        let deserialized: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(deserialized, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[encoder]\nwidth = 1280\n\n[limits]\nmemory_limit_mb = 64").unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.defaults, DefaultsConfig::default());
        assert_eq!(config.encoder.width, Some(1280));
        assert_eq!(config.encoder.height, None);
        assert_eq!(config.limits.memory_limit_bytes(), Some(64 * 1024 * 1024));
    }

    #[test]
    fn test_usage_aliases_in_file() {
        let config: Config = toml::from_str("[defaults]\nusage = \"best\"\ncodec = \"vp9\"").unwrap();
        assert_eq!(config.defaults.usage, UsageProfile::BestQuality);
        assert_eq!(config.defaults.codec, "vp9");
    }

    #[test]
    fn test_bad_file_reports_path() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[defaults]\nusage = \"fastest\"").unwrap();

        let err = Config::load_from(file.path()).unwrap_err();
        let message = format!("{:#}", err);
        assert!(message.contains("Failed to parse config file"));
        assert!(message.contains(&file.path().display().to_string()));
    }

    #[test]
    fn test_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load_from(&dir.path().join("missing.toml")).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to read config file"));
    }
}
